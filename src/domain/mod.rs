//! Domain models for flowboard
//!
//! Contains the workflow rules, board ordering and hierarchy logic without
//! any I/O concerns.

mod error;
mod gesture;
mod graph;
mod hierarchy;
mod history;
mod id;
mod item;
mod ordering;
mod status;
mod views;
mod workflow;


pub use error::{TransitionRule, WorkflowError};
pub use gesture::{DragPayload, DragTracker, GestureOutcome, GestureSession};
pub use graph::{GraphError, ParentGraph};
pub use hierarchy::{resolve_chain, ChainNode};
pub use history::{History, HistoryEntry, Note};
pub use id::{IdError, ItemId, ItemKey, ItemKind};
pub use item::{Priority, WorkItem};
pub use ordering::{
    apply_batch, column_items, cross_column_move, drop_index_for_pointer, next_order, reorder,
    MoveOutcome, OrderUpdate, ORDER_STEP,
};
pub use status::{ApprovalDecision, ApprovalStatus, BaseStatus, Status, WorkflowState};
pub use views::{
    approval_inbox, completed_items, delegated_by, CompletedItem, DelegatedItem, PendingApproval,
};
pub use workflow::{allowed_targets, check_transition, request_transition, resolve_approval, TransitionOutcome};
