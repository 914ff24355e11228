//! Errors raised by the workflow core

use serde::Serialize;
use std::fmt;
use thiserror::Error;

use super::id::ItemKey;
use super::status::{BaseStatus, Status};

/// Which lifecycle rule rejected a transition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionRule {
    /// Completed items never change status again
    Terminal,
    /// The target is already the item's effective status
    NoOp,
    /// Statuses only move forward
    Backward,
    /// A request is already waiting for a decision
    AwaitingApproval,
}

impl fmt::Display for TransitionRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TransitionRule::Terminal => "completed items cannot change status",
            TransitionRule::NoOp => "item is already in that status",
            TransitionRule::Backward => "status cannot move backward",
            TransitionRule::AwaitingApproval => "a status change is already awaiting approval",
        })
    }
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum WorkflowError {
    #[error("Cannot move {key} from {from} to {to}: {rule}")]
    InvalidTransition {
        key: ItemKey,
        from: Status,
        to: BaseStatus,
        rule: TransitionRule,
    },

    #[error("No approval is pending for {0}")]
    NoPendingApproval(ItemKey),

    #[error("Parent chain of {0} contains a cycle")]
    CyclicHierarchy(ItemKey),

    #[error("Malformed drag payload: {0}")]
    MalformedGesturePayload(String),

    #[error("Item not found: {0}")]
    UnknownItem(ItemKey),
}

impl WorkflowError {
    /// The rule behind an invalid transition, if this is one
    pub fn rule(&self) -> Option<TransitionRule> {
        match self {
            WorkflowError::InvalidTransition { rule, .. } => Some(*rule),
            _ => None,
        }
    }
}
