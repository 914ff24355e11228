//! Parent graph for work items
//!
//! Mirrors `parent_id` links as a directed graph (parent -> child) and guards
//! re-parenting so the links keep forming a forest. Uses petgraph for
//! reachability queries.

use petgraph::algo::has_path_connecting;
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::HashMap;
use thiserror::Error;

use super::id::ItemKey;
use super::item::WorkItem;

#[derive(Debug, Error, PartialEq)]
pub enum GraphError {
    #[error("Re-parenting would create a cycle: {0} under {1}")]
    CycleDetected(ItemKey, ItemKey),

    #[error("Item not found: {0}")]
    ItemNotFound(ItemKey),

    #[error("An item cannot be its own parent: {0}")]
    SelfParent(ItemKey),

    #[error("Parent {1} is not the same kind as {0}")]
    KindMismatch(ItemKey, ItemKey),
}

/// Parent/child links between items
#[derive(Debug, Default)]
pub struct ParentGraph {
    /// The underlying directed graph
    graph: DiGraph<ItemKey, ()>,

    /// Map from ItemKey to node index
    node_map: HashMap<ItemKey, NodeIndex>,
}

impl ParentGraph {
    fn new() -> Self {
        Self {
            graph: DiGraph::new(),
            node_map: HashMap::new(),
        }
    }

    /// Builds a graph from a collection of items.
    ///
    /// Links to parents outside the collection are ignored.
    pub fn from_items<'a>(items: impl IntoIterator<Item = &'a WorkItem>) -> Self {
        let mut graph = Self::new();

        let items: Vec<_> = items.into_iter().collect();
        for item in &items {
            graph.add_item(item.key());
        }

        for item in &items {
            if let Some(parent) = item.parent_key() {
                if let (Some(&p), Some(&c)) =
                    (graph.node_map.get(&parent), graph.node_map.get(&item.key()))
                {
                    graph.graph.add_edge(p, c, ());
                }
            }
        }

        graph
    }

    fn add_item(&mut self, key: ItemKey) {
        if !self.node_map.contains_key(&key) {
            let idx = self.graph.add_node(key.clone());
            self.node_map.insert(key, idx);
        }
    }

    fn index(&self, key: &ItemKey) -> Result<NodeIndex, GraphError> {
        self.node_map
            .get(key)
            .copied()
            .ok_or_else(|| GraphError::ItemNotFound(key.clone()))
    }

    /// Checks that `child` may be placed under `new_parent`.
    ///
    /// Detaching (`None`) is always allowed. The parent must exist, share the
    /// child's kind, and must not be the child or one of its descendants.
    pub fn check_reparent(
        &self,
        child: &ItemKey,
        new_parent: Option<&ItemKey>,
    ) -> Result<(), GraphError> {
        let child_idx = self.index(child)?;
        let Some(parent) = new_parent else {
            return Ok(());
        };

        if parent == child {
            return Err(GraphError::SelfParent(child.clone()));
        }
        if parent.kind != child.kind {
            return Err(GraphError::KindMismatch(child.clone(), parent.clone()));
        }

        let parent_idx = self.index(parent)?;
        if has_path_connecting(&self.graph, child_idx, parent_idx, None) {
            return Err(GraphError::CycleDetected(child.clone(), parent.clone()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::id::ItemKind;
    use crate::domain::item::fixtures::item;

    fn family() -> Vec<WorkItem> {
        let root = item(ItemKind::Activity, "Root");
        let child = item(ItemKind::Activity, "Child").with_parent(root.id.clone());
        let grandchild = item(ItemKind::Activity, "Grandchild").with_parent(child.id.clone());
        let other = item(ItemKind::Activity, "Other");
        vec![root, child, grandchild, other]
    }

    #[test]
    fn reparent_under_descendant_is_rejected() {
        let items = family();
        let graph = ParentGraph::from_items(&items);

        let result = graph.check_reparent(&items[0].key(), Some(&items[2].key()));
        assert!(matches!(result, Err(GraphError::CycleDetected(_, _))));
    }

    #[test]
    fn reparent_to_unrelated_item_is_allowed() {
        let items = family();
        let graph = ParentGraph::from_items(&items);

        assert!(graph
            .check_reparent(&items[1].key(), Some(&items[3].key()))
            .is_ok());
        assert!(graph.check_reparent(&items[1].key(), None).is_ok());
    }

    #[test]
    fn self_parent_rejected() {
        let items = family();
        let graph = ParentGraph::from_items(&items);

        let result = graph.check_reparent(&items[3].key(), Some(&items[3].key()));
        assert!(matches!(result, Err(GraphError::SelfParent(_))));
    }

    #[test]
    fn cross_kind_parent_rejected() {
        let mut items = family();
        let project = item(ItemKind::Project, "Project");
        items.push(project.clone());
        let graph = ParentGraph::from_items(&items);

        let result = graph.check_reparent(&items[3].key(), Some(&project.key()));
        assert!(matches!(result, Err(GraphError::KindMismatch(_, _))));
    }

    #[test]
    fn unknown_items_return_error() {
        let items = family();
        let graph = ParentGraph::from_items(&items);
        let stranger = item(ItemKind::Activity, "Stranger").key();

        assert!(matches!(
            graph.check_reparent(&stranger, None),
            Err(GraphError::ItemNotFound(_))
        ));
        assert!(matches!(
            graph.check_reparent(&items[0].key(), Some(&stranger)),
            Err(GraphError::ItemNotFound(_))
        ));
    }

    #[test]
    fn parents_outside_the_collection_are_ignored() {
        let items = family();
        let graph = ParentGraph::from_items(&items[1..]);

        // Child still points at Root, which is not loaded
        assert!(graph
            .check_reparent(&items[1].key(), Some(&items[3].key()))
            .is_ok());
        assert!(matches!(
            graph.check_reparent(&items[1].key(), Some(&items[2].key())),
            Err(GraphError::CycleDetected(_, _))
        ));
    }
}
