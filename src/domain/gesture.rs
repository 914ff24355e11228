//! Drag gesture lifecycle
//!
//! A drag starts with [`DragTracker::begin`], which marks the card as being
//! dragged and produces a [`GestureSession`] carrying an opaque payload. The
//! session ends by dropping it on a column, cancelling it, or simply letting
//! it go out of scope; in every case the dragging marker is cleared.

use std::cell::RefCell;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::error::WorkflowError;
use super::history::Note;
use super::id::{ItemId, ItemKey, ItemKind};
use super::item::WorkItem;
use super::ordering::{cross_column_move, MoveOutcome};
use super::status::BaseStatus;

/// Data carried by a drag from pick-up to drop
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DragPayload {
    pub id: ItemId,
    pub kind: ItemKind,
    /// Column the card was picked up from
    pub source: BaseStatus,
}

impl DragPayload {
    pub fn for_item(item: &WorkItem) -> Self {
        Self {
            id: item.id.clone(),
            kind: item.kind,
            source: item.column(),
        }
    }

    pub fn key(&self) -> ItemKey {
        ItemKey::new(self.kind, self.id.clone())
    }

    /// Serializes the payload. An encoding failure yields an empty payload,
    /// which the drop side rejects as malformed.
    pub fn encode(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }

    pub fn decode(raw: &str) -> Result<Self, WorkflowError> {
        serde_json::from_str(raw).map_err(|e| WorkflowError::MalformedGesturePayload(e.to_string()))
    }
}

#[derive(Debug, Default)]
struct DragState {
    generation: u64,
    active: Option<ItemKey>,
}

/// Tracks which card, if any, is currently being dragged.
///
/// Clones share state. Single-threaded by construction.
#[derive(Debug, Clone, Default)]
pub struct DragTracker {
    state: Rc<RefCell<DragState>>,
}

impl DragTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// The card being dragged right now
    pub fn dragging(&self) -> Option<ItemKey> {
        self.state.borrow().active.clone()
    }

    pub fn is_dragging(&self) -> bool {
        self.state.borrow().active.is_some()
    }

    /// Picks up `item`. A previous gesture still in flight is superseded.
    pub fn begin(&self, item: &WorkItem) -> GestureSession {
        let generation = {
            let mut state = self.state.borrow_mut();
            state.generation += 1;
            state.active = Some(item.key());
            state.generation
        };

        GestureSession {
            tracker: self.clone(),
            generation,
            dragged: item.key(),
            payload: DragPayload::for_item(item).encode(),
        }
    }
}

/// How a gesture ended
#[derive(Debug, Clone, PartialEq)]
pub enum GestureOutcome {
    /// The card was dropped on a column
    Dropped(MoveOutcome),
    /// The payload could not be read; nothing changed
    Aborted(WorkflowError),
    /// The drag was abandoned; nothing changed
    Cancelled,
}

impl GestureOutcome {
    /// True when the drop changed a status or an order
    pub fn changed_anything(&self) -> bool {
        match self {
            GestureOutcome::Dropped(outcome) if outcome.is_rejected() => false,
            GestureOutcome::Dropped(MoveOutcome::Reordered(batch)) => !batch.is_empty(),
            GestureOutcome::Dropped(_) => true,
            GestureOutcome::Aborted(_) | GestureOutcome::Cancelled => false,
        }
    }
}

/// One drag in flight. Dropping the session clears the dragging marker.
#[derive(Debug)]
pub struct GestureSession {
    tracker: DragTracker,
    generation: u64,
    dragged: ItemKey,
    payload: String,
}

impl GestureSession {
    /// The serialized payload to hand to the drop target
    pub fn payload(&self) -> &str {
        &self.payload
    }

    pub fn dragged(&self) -> &ItemKey {
        &self.dragged
    }

    /// Completes the drag on `column` using the payload delivered by the drop target
    pub fn drop_on(
        self,
        payload: &str,
        items: &mut [WorkItem],
        column: BaseStatus,
        drop_index: usize,
        note: Note,
    ) -> GestureOutcome {
        match DragPayload::decode(payload) {
            Ok(carried) => GestureOutcome::Dropped(cross_column_move(
                items,
                &carried.key(),
                column,
                drop_index,
                note,
            )),
            Err(err) => {
                warn!(item = %self.dragged, error = %err, "drag aborted");
                GestureOutcome::Aborted(err)
            }
        }
    }

    /// Abandons the drag, e.g. when released outside any column
    pub fn cancel(self) -> GestureOutcome {
        debug!(item = %self.dragged, "drag cancelled");
        GestureOutcome::Cancelled
    }
}

impl Drop for GestureSession {
    fn drop(&mut self) {
        let mut state = self.tracker.state.borrow_mut();
        if state.generation == self.generation {
            state.active = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::item::fixtures::card;
    use crate::domain::status::Status;

    #[test]
    fn session_marks_and_clears_on_drop() {
        let tracker = DragTracker::new();
        let mut items = vec![card("A", 0), card("B", 10)];

        let session = tracker.begin(&items[1]);
        assert_eq!(tracker.dragging(), Some(items[1].key()));

        let payload = session.payload().to_string();
        let outcome = session.drop_on(&payload, &mut items, BaseStatus::NotStarted, 0, Note::default());

        assert!(outcome.changed_anything());
        assert!(!tracker.is_dragging());
        assert_eq!(items[1].kanban_order(), 0);
    }

    #[test]
    fn malformed_payload_aborts_without_changes() {
        let tracker = DragTracker::new();
        let mut items = vec![card("A", 0), card("B", 10)];
        let snapshot = items.clone();

        let session = tracker.begin(&items[0]);
        let outcome = session.drop_on("{not json", &mut items, BaseStatus::InProgress, 0, Note::default());

        assert!(matches!(
            outcome,
            GestureOutcome::Aborted(WorkflowError::MalformedGesturePayload(_))
        ));
        assert!(!tracker.is_dragging());
        assert_eq!(items, snapshot);
    }

    #[test]
    fn cancel_clears_marker_and_changes_nothing() {
        let tracker = DragTracker::new();
        let items = vec![card("A", 0)];

        let session = tracker.begin(&items[0]);
        assert!(tracker.is_dragging());

        assert_eq!(session.cancel(), GestureOutcome::Cancelled);
        assert!(!tracker.is_dragging());
    }

    #[test]
    fn dropping_the_session_out_of_scope_clears_marker() {
        let tracker = DragTracker::new();
        let items = vec![card("A", 0)];

        {
            let _session = tracker.begin(&items[0]);
            assert!(tracker.is_dragging());
        }

        assert!(!tracker.is_dragging());
    }

    #[test]
    fn stale_session_does_not_clear_newer_drag() {
        let tracker = DragTracker::new();
        let items = vec![card("A", 0), card("B", 10)];

        let first = tracker.begin(&items[0]);
        let second = tracker.begin(&items[1]);
        drop(first);

        assert_eq!(tracker.dragging(), Some(items[1].key()));
        drop(second);
        assert!(!tracker.is_dragging());
    }

    #[test]
    fn refused_drop_still_ends_gesture() {
        let tracker = DragTracker::new();
        let mut items = vec![card("A", 0)];
        crate::domain::workflow::request_transition(
            &mut items[0],
            BaseStatus::Completed,
            Note::default(),
        )
        .unwrap();

        let session = tracker.begin(&items[0]);
        let payload = session.payload().to_string();
        let outcome = session.drop_on(&payload, &mut items, BaseStatus::InProgress, 0, Note::default());

        assert!(matches!(
            outcome,
            GestureOutcome::Dropped(MoveOutcome::Rejected(_))
        ));
        assert!(!outcome.changed_anything());
        assert!(!tracker.is_dragging());
        assert_eq!(items[0].status(), Status::Completed);
    }

    #[test]
    fn payload_roundtrip() {
        let item = card("A", 0);
        let payload = DragPayload::for_item(&item);

        let decoded = DragPayload::decode(&payload.encode()).unwrap();
        assert_eq!(decoded, payload);
        assert_eq!(decoded.key(), item.key());
        assert_eq!(decoded.source, BaseStatus::NotStarted);
    }
}
