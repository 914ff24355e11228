//! Kanban ordering engine
//!
//! Each board column keeps its cards sorted by `kanban_order`, spaced in
//! steps of [`ORDER_STEP`]. Gestures are translated into the smallest batch
//! of order changes; cards whose position did not change are never re-sent.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::error::WorkflowError;
use super::history::Note;
use super::id::{ItemId, ItemKey, ItemKind};
use super::item::WorkItem;
use super::status::BaseStatus;
use super::workflow::{request_transition, TransitionOutcome};

/// Gap between consecutive cards after renumbering
pub const ORDER_STEP: i64 = 10;

/// A changed sort key for one item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderUpdate {
    pub id: ItemId,
    pub kind: ItemKind,
    pub new_order: i64,
}

impl OrderUpdate {
    pub fn key(&self) -> ItemKey {
        ItemKey::new(self.kind, self.id.clone())
    }
}

/// Items shown in `column`, in display order.
///
/// Equal orders fall back to creation order.
pub fn column_items(items: &[WorkItem], column: BaseStatus) -> Vec<&WorkItem> {
    let mut cards: Vec<_> = items.iter().filter(|i| i.column() == column).collect();
    cards.sort_by(|a, b| {
        a.kanban_order
            .cmp(&b.kanban_order)
            .then_with(|| a.created_at.cmp(&b.created_at))
            .then_with(|| a.id.cmp(&b.id))
    });
    cards
}

/// Order that places a new card at the end of `column`.
///
/// Saturates at `i64::MAX`; ties there fall back to creation order.
pub fn next_order(items: &[WorkItem], column: BaseStatus) -> i64 {
    items
        .iter()
        .filter(|i| i.column() == column)
        .map(|i| i.kanban_order)
        .max()
        .map(|max| max.saturating_add(ORDER_STEP))
        .unwrap_or(0)
}

/// Converts a pointer position into a drop index.
///
/// `midpoints` are the vertical midpoints of the remaining cards in display
/// order; the card lands before the first one whose midpoint is below the
/// pointer, or at the end.
pub fn drop_index_for_pointer(midpoints: &[f64], pointer: f64) -> usize {
    midpoints
        .iter()
        .position(|mid| *mid > pointer)
        .unwrap_or(midpoints.len())
}

/// Moves `dragged` to `drop_index` within `column` and returns the changed orders.
///
/// `drop_index` counts positions among the other cards of the column.
/// An unchanged position yields an empty batch.
pub fn reorder(
    items: &[WorkItem],
    column: BaseStatus,
    dragged: &ItemKey,
    drop_index: usize,
) -> Vec<OrderUpdate> {
    let mut cards = column_items(items, column);

    let Some(from) = cards.iter().position(|c| c.is(dragged)) else {
        debug!(item = %dragged, column = %column, "reorder ignored: item not in column");
        return Vec::new();
    };

    let card = cards.remove(from);
    let to = drop_index.min(cards.len());
    if to == from {
        return Vec::new();
    }
    cards.insert(to, card);

    cards
        .iter()
        .enumerate()
        .filter_map(|(position, card)| {
            let new_order = position as i64 * ORDER_STEP;
            (card.kanban_order != new_order).then(|| OrderUpdate {
                id: card.id.clone(),
                kind: card.kind,
                new_order,
            })
        })
        .collect()
}

/// Applies a committed batch to a snapshot
pub fn apply_batch(items: &mut [WorkItem], batch: &[OrderUpdate]) {
    for update in batch {
        if let Some(item) = items.iter_mut().find(|i| i.id == update.id && i.kind == update.kind) {
            item.kanban_order = update.new_order;
        }
    }
}

/// Result of dropping a card on a column
#[derive(Debug, Clone, PartialEq)]
pub enum MoveOutcome {
    /// Dropped in its own column; only positions changed
    Reordered(Vec<OrderUpdate>),
    /// Dropped in another column and the status change was accepted
    StatusChanged {
        key: ItemKey,
        transition: TransitionOutcome,
        batch: Vec<OrderUpdate>,
    },
    /// The drop was refused and nothing changed
    Rejected(WorkflowError),
}

impl MoveOutcome {
    /// Order changes to persist
    pub fn batch(&self) -> &[OrderUpdate] {
        match self {
            MoveOutcome::Reordered(batch) | MoveOutcome::StatusChanged { batch, .. } => batch,
            MoveOutcome::Rejected(_) => &[],
        }
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self, MoveOutcome::Rejected(_))
    }
}

/// Drops the card `key` on `target` and updates the snapshot.
///
/// Dropping on the card's own column reorders it to `drop_index`. Any other
/// column is a status change request; when accepted the card goes to the end
/// of the target column regardless of `drop_index`. Refused moves are not
/// errors: the card simply stays where it was.
pub fn cross_column_move(
    items: &mut [WorkItem],
    key: &ItemKey,
    target: BaseStatus,
    drop_index: usize,
    note: Note,
) -> MoveOutcome {
    let Some(pos) = items.iter().position(|i| i.is(key)) else {
        debug!(item = %key, "drop ignored: unknown item");
        return MoveOutcome::Rejected(WorkflowError::UnknownItem(key.clone()));
    };

    if items[pos].column() == target {
        let batch = reorder(items, target, key, drop_index);
        apply_batch(items, &batch);
        return MoveOutcome::Reordered(batch);
    }

    let new_order = next_order(items, target);
    let item = &mut items[pos];

    match request_transition(item, target, note) {
        Ok(transition) => {
            let mut batch = Vec::new();
            if item.kanban_order != new_order {
                item.kanban_order = new_order;
                batch.push(OrderUpdate {
                    id: item.id.clone(),
                    kind: item.kind,
                    new_order,
                });
            }
            MoveOutcome::StatusChanged {
                key: key.clone(),
                transition,
                batch,
            }
        }
        Err(err) => {
            debug!(item = %key, error = %err, "drop refused");
            MoveOutcome::Rejected(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::item::fixtures::card;
    use crate::domain::status::Status;

    fn board() -> Vec<WorkItem> {
        vec![card("A", 0), card("B", 10), card("C", 20)]
    }

    fn orders(items: &[WorkItem], column: BaseStatus) -> Vec<(String, i64)> {
        column_items(items, column)
            .into_iter()
            .map(|i| (i.title.clone(), i.kanban_order()))
            .collect()
    }

    fn start(item: &mut WorkItem) {
        request_transition(item, BaseStatus::InProgress, Note::default()).unwrap();
    }

    #[test]
    fn drag_last_card_to_top_shifts_everything() {
        let mut items = board();
        let c = items[2].key();

        let batch = reorder(&items, BaseStatus::NotStarted, &c, 0);

        let mut changed: Vec<_> = batch
            .iter()
            .map(|u| {
                let title = items.iter().find(|i| i.is(&u.key())).unwrap().title.clone();
                (title, u.new_order)
            })
            .collect();
        changed.sort();
        assert_eq!(
            changed,
            vec![("A".into(), 10), ("B".into(), 20), ("C".into(), 0)]
        );

        apply_batch(&mut items, &batch);
        assert_eq!(
            orders(&items, BaseStatus::NotStarted),
            vec![("C".into(), 0), ("A".into(), 10), ("B".into(), 20)]
        );
    }

    #[test]
    fn dropping_in_place_emits_nothing() {
        let items = board();
        for (index, item) in items.iter().enumerate() {
            assert!(reorder(&items, BaseStatus::NotStarted, &item.key(), index).is_empty());
        }
    }

    #[test]
    fn dropping_in_place_on_sparse_column_emits_nothing() {
        let items = vec![card("A", 5), card("B", 70)];
        assert!(reorder(&items, BaseStatus::NotStarted, &items[1].key(), 1).is_empty());
    }

    #[test]
    fn only_moved_cards_are_sent() {
        let items = vec![card("A", 0), card("B", 10), card("C", 20), card("D", 30)];

        // Swap B and C: A and D keep their orders
        let batch = reorder(&items, BaseStatus::NotStarted, &items[1].key(), 2);

        assert_eq!(batch.len(), 2);
        assert!(batch.iter().all(|u| u.key() != items[0].key()));
        assert!(batch.iter().all(|u| u.key() != items[3].key()));
    }

    #[test]
    fn drop_index_past_end_appends() {
        let mut items = board();
        let a = items[0].key();

        let batch = reorder(&items, BaseStatus::NotStarted, &a, 99);
        apply_batch(&mut items, &batch);

        assert_eq!(
            orders(&items, BaseStatus::NotStarted),
            vec![("B".into(), 0), ("C".into(), 10), ("A".into(), 20)]
        );
    }

    #[test]
    fn reorder_normalizes_gaps() {
        let mut items = vec![card("A", 3), card("B", 3), card("C", 250)];
        items[1].created_at = items[0].created_at + chrono::Duration::seconds(1);
        let c = items[2].key();

        let batch = reorder(&items, BaseStatus::NotStarted, &c, 1);
        apply_batch(&mut items, &batch);

        assert_eq!(
            orders(&items, BaseStatus::NotStarted),
            vec![("A".into(), 0), ("C".into(), 10), ("B".into(), 20)]
        );
    }

    #[test]
    fn ties_break_by_creation_order() {
        let mut items = vec![card("Later", 0), card("Earlier", 0)];
        items[1].created_at = items[0].created_at - chrono::Duration::seconds(5);

        let titles: Vec<_> = column_items(&items, BaseStatus::NotStarted)
            .into_iter()
            .map(|i| i.title.as_str())
            .collect();
        assert_eq!(titles, vec!["Earlier", "Later"]);
    }

    #[test]
    fn reorder_of_foreign_card_is_empty() {
        let mut items = board();
        start(&mut items[0]);
        let a = items[0].key();

        assert!(reorder(&items, BaseStatus::NotStarted, &a, 0).is_empty());
    }

    #[test]
    fn next_order_appends_or_starts_at_zero() {
        let items = board();
        assert_eq!(next_order(&items, BaseStatus::NotStarted), 30);
        assert_eq!(next_order(&items, BaseStatus::InProgress), 0);
    }

    #[test]
    fn next_order_saturates_near_the_limit() {
        let items = vec![card("A", i64::MAX - 3)];
        assert_eq!(next_order(&items, BaseStatus::NotStarted), i64::MAX);

        let mut items = vec![card("A", i64::MAX), card("B", i64::MAX)];
        items[1].created_at = items[0].created_at + chrono::Duration::seconds(1);
        let mut late = card("Late", 0);
        late.kanban_order = next_order(&items, BaseStatus::NotStarted);
        late.created_at = items[1].created_at + chrono::Duration::seconds(1);
        items.push(late);

        let titles: Vec<_> = column_items(&items, BaseStatus::NotStarted)
            .into_iter()
            .map(|i| i.title.as_str())
            .collect();
        assert_eq!(titles, vec!["A", "B", "Late"]);
    }

    #[test]
    fn pointer_maps_to_first_card_below() {
        let mids = [10.0, 30.0, 50.0];
        assert_eq!(drop_index_for_pointer(&mids, 0.0), 0);
        assert_eq!(drop_index_for_pointer(&mids, 31.0), 2);
        assert_eq!(drop_index_for_pointer(&mids, 80.0), 3);
        assert_eq!(drop_index_for_pointer(&[], 5.0), 0);
    }

    #[test]
    fn cross_column_move_appends_to_target() {
        let mut items = board();
        let mut started = card("Started", 40);
        start(&mut started);
        items.push(started);
        let b = items[1].key();

        let outcome = cross_column_move(&mut items, &b, BaseStatus::InProgress, 0, Note::default());

        match outcome {
            MoveOutcome::StatusChanged { transition, batch, .. } => {
                assert_eq!(transition, TransitionOutcome::Applied(BaseStatus::InProgress));
                assert_eq!(batch.len(), 1);
                assert_eq!(batch[0].new_order, 50);
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert_eq!(items[1].status(), Status::InProgress);
        assert_eq!(
            orders(&items, BaseStatus::InProgress),
            vec![("Started".into(), 40), ("B".into(), 50)]
        );
    }

    #[test]
    fn backward_drop_is_refused_without_changes() {
        let mut items = board();
        start(&mut items[0]);
        items[0].kanban_order = 0;
        let snapshot = items.clone();
        let a = items[0].key();

        let outcome = cross_column_move(&mut items, &a, BaseStatus::NotStarted, 0, Note::default());

        assert!(outcome.is_rejected());
        assert!(outcome.batch().is_empty());
        assert_eq!(items, snapshot);
    }

    #[test]
    fn workflow_drop_lands_in_requested_column() {
        let mut items = board();
        items[0].use_workflow = true;
        let a = items[0].key();

        let outcome = cross_column_move(&mut items, &a, BaseStatus::Completed, 0, Note::default());

        assert!(matches!(
            outcome,
            MoveOutcome::StatusChanged {
                transition: TransitionOutcome::Requested(BaseStatus::Completed),
                ..
            }
        ));
        assert_eq!(items[0].status(), Status::PendingApproval);
        assert_eq!(items[0].column(), BaseStatus::Completed);
        assert_eq!(items[0].kanban_order(), 0);
        assert!(outcome.batch().is_empty());
    }

    #[test]
    fn same_column_drop_reorders() {
        let mut items = board();
        let c = items[2].key();

        let outcome = cross_column_move(&mut items, &c, BaseStatus::NotStarted, 0, Note::default());

        assert_eq!(outcome.batch().len(), 3);
        assert_eq!(items[2].kanban_order(), 0);
        assert!(items.iter().all(|i| i.history().is_empty()));
    }

    #[test]
    fn unknown_card_is_refused() {
        let mut items = board();
        let stranger = card("Stranger", 0).key();

        let outcome =
            cross_column_move(&mut items, &stranger, BaseStatus::Completed, 0, Note::default());

        assert_eq!(
            outcome,
            MoveOutcome::Rejected(WorkflowError::UnknownItem(stranger))
        );
    }
}
