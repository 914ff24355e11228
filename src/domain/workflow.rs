//! Status/approval state machine
//!
//! Transitions only move forward through the base lifecycle and Completed is
//! absorbing. Items that use the workflow do not change status directly:
//! a request puts them into pending approval, and a decision either applies
//! the requested status or reverts to the underlying one.
//!
//! Every operation validates before mutating, so a failed call leaves the
//! item untouched.

use chrono::Utc;
use serde::Serialize;

use super::error::{TransitionRule, WorkflowError};
use super::history::{HistoryEntry, Note};
use super::item::WorkItem;
use super::status::{ApprovalDecision, BaseStatus, WorkflowState};

/// What a successful transition request did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "status", rename_all = "snake_case")]
pub enum TransitionOutcome {
    /// The status changed immediately
    Applied(BaseStatus),
    /// The status change is waiting for approval
    Requested(BaseStatus),
}

impl TransitionOutcome {
    pub fn target(&self) -> BaseStatus {
        match self {
            TransitionOutcome::Applied(s) | TransitionOutcome::Requested(s) => *s,
        }
    }
}

/// Checks whether `item` may move to `target` without touching it
pub fn check_transition(item: &WorkItem, target: BaseStatus) -> Result<(), WorkflowError> {
    let reject = |rule| {
        Err(WorkflowError::InvalidTransition {
            key: item.key(),
            from: item.status(),
            to: target,
            rule,
        })
    };

    let current = item.underlying_status();
    if current.is_terminal() {
        return reject(TransitionRule::Terminal);
    }
    if target == item.column() {
        return reject(TransitionRule::NoOp);
    }
    if item.workflow().is_pending() {
        return reject(TransitionRule::AwaitingApproval);
    }
    if target.rank() < current.rank() {
        return reject(TransitionRule::Backward);
    }
    Ok(())
}

/// Statuses the item may currently be moved to
pub fn allowed_targets(item: &WorkItem) -> Vec<BaseStatus> {
    BaseStatus::ALL
        .into_iter()
        .filter(|target| check_transition(item, *target).is_ok())
        .collect()
}

/// Requests a move to `target`.
///
/// Without the workflow the status is applied at once. With it, the item
/// enters pending approval and keeps its current base status underneath.
pub fn request_transition(
    item: &mut WorkItem,
    target: BaseStatus,
    note: Note,
) -> Result<TransitionOutcome, WorkflowError> {
    check_transition(item, target)?;

    let now = Utc::now();
    let outcome = if item.use_workflow {
        item.workflow = WorkflowState::Pending {
            underlying: item.underlying_status(),
            requested: target,
        };
        item.history
            .append(HistoryEntry::requested(target, note, now));
        TransitionOutcome::Requested(target)
    } else {
        let decision = match item.workflow {
            WorkflowState::Settled { decision, .. } => decision,
            WorkflowState::Pending { .. } => None,
        };
        item.workflow = WorkflowState::Settled {
            status: target,
            decision,
        };
        item.history.append(HistoryEntry::applied(target, note, now));
        TransitionOutcome::Applied(target)
    };

    item.touch();
    Ok(outcome)
}

/// Resolves a pending approval and returns the status the item settled in
pub fn resolve_approval(
    item: &mut WorkItem,
    decision: ApprovalDecision,
    note: Note,
) -> Result<BaseStatus, WorkflowError> {
    let (underlying, requested) = match item.workflow {
        WorkflowState::Pending {
            underlying,
            requested,
        } => (underlying, requested),
        WorkflowState::Settled { .. } => return Err(WorkflowError::NoPendingApproval(item.key())),
    };

    let settled = match decision {
        ApprovalDecision::Approved => requested,
        ApprovalDecision::Rejected => underlying,
    };

    item.workflow = WorkflowState::Settled {
        status: settled,
        decision: Some(decision),
    };
    item.history
        .append(HistoryEntry::decided(settled, decision, note, Utc::now()));
    item.touch();

    Ok(settled)
}
