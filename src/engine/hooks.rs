//! Persistence collaborator
//!
//! The board never performs I/O itself. Every accepted change is handed to a
//! [`Persistence`] implementation before it is applied to the in-memory
//! snapshot, so a failed write leaves the snapshot as it was.

use anyhow::Result;

use crate::domain::{ApprovalDecision, BaseStatus, ItemKind, Note, OrderUpdate, WorkItem};

/// Storage hooks used by [`super::Board`]
pub trait Persistence {
    /// Persists an accepted status change. `item` already reflects the change.
    fn request_status_change(&mut self, item: &WorkItem, target: BaseStatus) -> Result<()>;

    /// Persists a batch of changed sort keys
    fn commit_order_batch(&mut self, batch: &[OrderUpdate]) -> Result<()>;

    /// Persists a resolved approval. `item` already reflects the decision.
    fn record_approval_decision(
        &mut self,
        item: &WorkItem,
        decision: ApprovalDecision,
        note: &Note,
    ) -> Result<()>;

    /// Loads every item of `kind`
    fn fetch_item_index(&self, kind: ItemKind) -> Result<Vec<WorkItem>>;
}
