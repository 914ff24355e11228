//! # Board engine
//!
//! Binds the pure domain rules to a [`Persistence`] collaborator.
//!
//! A [`Board`] holds the snapshot of one item kind. Each operation computes
//! its result on a copy, hands the change to the hooks, and only then
//! replaces the snapshot.
//!
//! ## Error recovery
//!
//! | Error | Where | Handling |
//! |-------|-------|----------|
//! | `InvalidTransition` | [`Board::change_status`] | returned to the caller |
//! | `InvalidTransition` | [`Board::drop_card`] | logged at debug, drop refused |
//! | `NoPendingApproval` | [`Board::resolve_approval`] | logged, `Ok(None)` |
//! | `CyclicHierarchy` | [`Board::chain`] | logged, `Ok(None)` |
//! | `MalformedGesturePayload` | [`Board::drop_card`] | logged, gesture aborted |

pub(crate) mod hooks;

pub use hooks::Persistence;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::domain::{
    apply_batch, column_items, next_order, reorder, request_transition, resolve_chain,
    ApprovalDecision, BaseStatus, ChainNode, DragTracker, GestureOutcome, GestureSession, ItemKey,
    ItemKind, MoveOutcome, Note, OrderUpdate, TransitionOutcome, WorkItem, WorkflowError,
};

#[derive(Debug, Error)]
pub enum BoardError {
    #[error(transparent)]
    Workflow(#[from] WorkflowError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl BoardError {
    /// The domain error, if this is one
    pub fn workflow(&self) -> Option<&WorkflowError> {
        match self {
            BoardError::Workflow(err) => Some(err),
            BoardError::Other(_) => None,
        }
    }
}

/// Snapshot of one item kind plus its storage hooks
pub struct Board<P: Persistence> {
    kind: ItemKind,
    items: Vec<WorkItem>,
    hooks: P,
    tracker: DragTracker,
}

impl<P: Persistence> Board<P> {
    /// Loads all items of `kind` through the hooks
    pub fn load(kind: ItemKind, hooks: P) -> Result<Self, BoardError> {
        let items = hooks.fetch_item_index(kind)?;
        debug!(kind = %kind, count = items.len(), "board loaded");

        Ok(Self {
            kind,
            items,
            hooks,
            tracker: DragTracker::new(),
        })
    }

    /// Re-reads the snapshot from storage
    pub fn refresh(&mut self) -> Result<(), BoardError> {
        self.items = self.hooks.fetch_item_index(self.kind)?;
        Ok(())
    }

    pub fn kind(&self) -> ItemKind {
        self.kind
    }

    pub fn items(&self) -> &[WorkItem] {
        &self.items
    }

    pub fn hooks(&self) -> &P {
        &self.hooks
    }

    pub fn tracker(&self) -> &DragTracker {
        &self.tracker
    }

    pub fn get(&self, key: &ItemKey) -> Option<&WorkItem> {
        self.items.iter().find(|i| i.is(key))
    }

    fn position(&self, key: &ItemKey) -> Result<usize, WorkflowError> {
        self.items
            .iter()
            .position(|i| i.is(key))
            .ok_or_else(|| WorkflowError::UnknownItem(key.clone()))
    }

    /// Cards of `column` in display order
    pub fn column(&self, column: BaseStatus) -> Vec<&WorkItem> {
        column_items(&self.items, column)
    }

    /// Places a freshly created item at the end of its column.
    ///
    /// The item is added to the snapshot only; creating it in storage is up
    /// to the caller.
    pub fn place_new(&mut self, mut item: WorkItem) -> &WorkItem {
        item.kanban_order = next_order(&self.items, item.column());
        self.items.push(item);
        &self.items[self.items.len() - 1]
    }

    /// Direct status edit. Rule violations are returned to the caller.
    pub fn change_status(
        &mut self,
        key: &ItemKey,
        target: BaseStatus,
        note: Note,
    ) -> Result<TransitionOutcome, BoardError> {
        let pos = self.position(key)?;
        let mut item = self.items[pos].clone();

        let outcome = request_transition(&mut item, target, note)?;
        self.hooks.request_status_change(&item, target)?;
        info!(item = %key, ?outcome, "status changed");

        self.items[pos] = item;
        Ok(outcome)
    }

    /// Resolves the pending approval of `key`.
    ///
    /// Returns the settled status, or `None` when nothing was pending.
    pub fn resolve_approval(
        &mut self,
        key: &ItemKey,
        decision: ApprovalDecision,
        note: Note,
    ) -> Result<Option<BaseStatus>, BoardError> {
        let pos = self.position(key)?;
        let mut item = self.items[pos].clone();

        let settled = match crate::domain::resolve_approval(&mut item, decision, note.clone()) {
            Ok(settled) => settled,
            Err(err @ WorkflowError::NoPendingApproval(_)) => {
                warn!(item = %key, error = %err, "approval ignored");
                return Ok(None);
            }
            Err(err) => return Err(err.into()),
        };

        self.hooks.record_approval_decision(&item, decision, &note)?;
        info!(item = %key, ?decision, settled = %settled, "approval resolved");

        self.items[pos] = item;
        Ok(Some(settled))
    }

    /// Moves `key` to `drop_index` within `column` and persists the changed orders
    pub fn reorder(
        &mut self,
        column: BaseStatus,
        key: &ItemKey,
        drop_index: usize,
    ) -> Result<Vec<OrderUpdate>, BoardError> {
        let batch = reorder(&self.items, column, key, drop_index);
        if !batch.is_empty() {
            self.hooks.commit_order_batch(&batch)?;
            apply_batch(&mut self.items, &batch);
        }
        Ok(batch)
    }

    /// Picks up a card
    pub fn begin_drag(&self, key: &ItemKey) -> Result<GestureSession, BoardError> {
        let pos = self.position(key)?;
        if self.tracker.is_dragging() {
            debug!(item = %key, "previous drag superseded");
        }
        Ok(self.tracker.begin(&self.items[pos]))
    }

    /// Completes a drag on `column`.
    ///
    /// Refused drops and unreadable payloads are not errors: they are logged
    /// and reported in the outcome. Only storage failures are returned as `Err`.
    /// A status change stays in the snapshot once its write succeeded, even
    /// if the order batch that follows fails.
    pub fn drop_card(
        &mut self,
        session: GestureSession,
        payload: &str,
        column: BaseStatus,
        drop_index: usize,
        note: Note,
    ) -> Result<GestureOutcome, BoardError> {
        let mut next = self.items.clone();
        let outcome = session.drop_on(payload, &mut next, column, drop_index, note);

        match &outcome {
            GestureOutcome::Dropped(MoveOutcome::StatusChanged {
                key,
                transition,
                batch,
            }) => {
                let pos = self.position(key)?;
                self.hooks
                    .request_status_change(&next[pos], transition.target())?;
                info!(item = %key, outcome = ?transition, "card moved");

                // Storage already holds the new status, keep the snapshot in step
                self.items = next;
                if !batch.is_empty() {
                    self.hooks.commit_order_batch(batch)?;
                }
            }
            GestureOutcome::Dropped(MoveOutcome::Reordered(batch)) => {
                if !batch.is_empty() {
                    self.hooks.commit_order_batch(batch)?;
                    self.items = next;
                }
            }
            GestureOutcome::Dropped(MoveOutcome::Rejected(err)) => {
                debug!(error = %err, "drop refused");
            }
            GestureOutcome::Aborted(_) | GestureOutcome::Cancelled => {}
        }

        debug!(changed = outcome.changed_anything(), "drop finished");
        Ok(outcome)
    }

    /// Abandons a drag without touching the board
    pub fn cancel_drag(&self, session: GestureSession) -> GestureOutcome {
        session.cancel()
    }

    /// The family tree containing `key`, or `None` when the links loop
    pub fn chain(&self, key: &ItemKey) -> Result<Option<ChainNode>, BoardError> {
        match resolve_chain(key, &self.items) {
            Ok(tree) => Ok(Some(tree)),
            Err(err @ WorkflowError::CyclicHierarchy(_)) => {
                warn!(item = %key, error = %err, "hierarchy not shown");
                Ok(None)
            }
            Err(err) => Err(err.into()),
        }
    }
}
