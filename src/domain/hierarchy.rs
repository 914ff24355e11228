//! Hierarchy resolution
//!
//! Rebuilds the whole family tree of an item: walk `parent_id` links up to
//! the top-level ancestor, then collect every descendant of that ancestor.
//! Parent links come from external data, so both walks track visited items
//! instead of trusting the links to form a tree.

use std::collections::{HashMap, HashSet};

use chrono::NaiveDate;
use serde::Serialize;

use super::error::WorkflowError;
use super::id::ItemKey;
use super::item::WorkItem;
use super::status::Status;

/// One item in a resolved tree
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChainNode {
    pub key: ItemKey,
    pub title: String,
    pub start_date: NaiveDate,
    pub status: Status,
    /// True for the item the tree was resolved for
    pub highlighted: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<ChainNode>,
}

impl ChainNode {
    fn leaf(item: &WorkItem, target: &ItemKey) -> Self {
        Self {
            key: item.key(),
            title: item.title.clone(),
            start_date: item.start_date,
            status: item.status(),
            highlighted: item.is(target),
            children: Vec::new(),
        }
    }

    /// Number of nodes in the tree
    pub fn len(&self) -> usize {
        1 + self.children.iter().map(ChainNode::len).sum::<usize>()
    }

    /// Pre-order traversal with depths
    pub fn walk(&self) -> Vec<(usize, &ChainNode)> {
        let mut out = Vec::new();
        let mut stack = vec![(0, self)];
        while let Some((depth, node)) = stack.pop() {
            out.push((depth, node));
            for child in node.children.iter().rev() {
                stack.push((depth + 1, child));
            }
        }
        out
    }
}

/// Resolves the tree that contains `key`, rooted at its top-level ancestor.
///
/// A parent id that does not resolve ends the upward walk. Siblings are
/// ordered by start date, then creation time.
pub fn resolve_chain(key: &ItemKey, items: &[WorkItem]) -> Result<ChainNode, WorkflowError> {
    let index: HashMap<ItemKey, &WorkItem> = items.iter().map(|i| (i.key(), i)).collect();

    let start = index
        .get(key)
        .copied()
        .ok_or_else(|| WorkflowError::UnknownItem(key.clone()))?;

    let mut visited = HashSet::from([start.key()]);
    let mut root = start;
    while let Some(parent_key) = root.parent_key() {
        let Some(parent) = index.get(&parent_key).copied() else {
            break;
        };
        if !visited.insert(parent_key) {
            return Err(WorkflowError::CyclicHierarchy(key.clone()));
        }
        root = parent;
    }

    let mut children: HashMap<ItemKey, Vec<&WorkItem>> = HashMap::new();
    for item in index.values().copied() {
        if let Some(parent_key) = item.parent_key() {
            children.entry(parent_key).or_default().push(item);
        }
    }
    for siblings in children.values_mut() {
        siblings.sort_by(|a, b| {
            a.start_date
                .cmp(&b.start_date)
                .then_with(|| a.created_at.cmp(&b.created_at))
                .then_with(|| a.id.cmp(&b.id))
        });
    }

    let mut seen = HashSet::new();
    Ok(build_tree(root, &children, key, &mut seen))
}

fn build_tree(
    item: &WorkItem,
    children: &HashMap<ItemKey, Vec<&WorkItem>>,
    target: &ItemKey,
    seen: &mut HashSet<ItemKey>,
) -> ChainNode {
    seen.insert(item.key());
    let mut node = ChainNode::leaf(item, target);

    if let Some(kids) = children.get(&item.key()) {
        for child in kids {
            if seen.contains(&child.key()) {
                continue;
            }
            node.children.push(build_tree(child, children, target, seen));
        }
    }

    node
}
