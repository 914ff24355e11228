//! Flowboard - kanban boards with approval workflows
//!
//! Work is organised as projects, activities and actions. Each item moves
//! through `not_started`, `in_progress` and `completed`, optionally routed
//! through an approver, and is placed on a kanban board whose card order is
//! kept in sparse sort keys.
//!
//! - [`domain`] holds the pure rules: status machine, ordering, drag
//!   gestures, hierarchy and read-only views.
//! - [`engine`] binds those rules to a [`engine::Persistence`] collaborator.
//! - [`storage`] is the JSONL-backed store and configuration.
//! - [`cli`] is the `flow` command and its interactive board.

pub mod cli;
pub mod domain;
pub mod engine;
pub mod storage;

pub use domain::{BaseStatus, ItemKey, ItemKind, Status, WorkItem};
pub use engine::Board;
