//! Status and approval types
//!
//! The three base statuses form a forward-only lifecycle:
//! not_started → in_progress → completed. Completed is absorbing.
//!
//! Approval is modelled as an overlay on top of the base status. An item is
//! either settled in a base status, or pending approval for a requested
//! target while remembering the status it would revert to.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A confirmed lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum BaseStatus {
    #[default]
    NotStarted,
    InProgress,
    Completed,
}

impl BaseStatus {
    /// All base statuses in lifecycle (and board column) order
    pub const ALL: [BaseStatus; 3] = [
        BaseStatus::NotStarted,
        BaseStatus::InProgress,
        BaseStatus::Completed,
    ];

    /// Position in the lifecycle; transitions may only increase it
    pub fn rank(&self) -> u8 {
        match self {
            BaseStatus::NotStarted => 0,
            BaseStatus::InProgress => 1,
            BaseStatus::Completed => 2,
        }
    }

    /// Returns true for the absorbing status
    pub fn is_terminal(&self) -> bool {
        matches!(self, BaseStatus::Completed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BaseStatus::NotStarted => "not_started",
            BaseStatus::InProgress => "in_progress",
            BaseStatus::Completed => "completed",
        }
    }

    /// Human-readable column title
    pub fn title(&self) -> &'static str {
        match self {
            BaseStatus::NotStarted => "Not Started",
            BaseStatus::InProgress => "In Progress",
            BaseStatus::Completed => "Completed",
        }
    }
}

impl fmt::Display for BaseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BaseStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "not_started" | "todo" => Ok(BaseStatus::NotStarted),
            "in_progress" | "doing" | "started" => Ok(BaseStatus::InProgress),
            "completed" | "done" => Ok(BaseStatus::Completed),
            other => Err(format!(
                "Unknown status '{}' (expected not_started, in_progress or completed)",
                other
            )),
        }
    }
}

/// The displayed status, including the approval overlay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    NotStarted,
    InProgress,
    Completed,
    PendingApproval,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::NotStarted => "not_started",
            Status::InProgress => "in_progress",
            Status::Completed => "completed",
            Status::PendingApproval => "pending_approval",
        }
    }
}

impl From<BaseStatus> for Status {
    fn from(status: BaseStatus) -> Self {
        match status {
            BaseStatus::NotStarted => Status::NotStarted,
            BaseStatus::InProgress => Status::InProgress,
            BaseStatus::Completed => Status::Completed,
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of an approval request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalDecision {
    Approved,
    Rejected,
}

impl fmt::Display for ApprovalDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ApprovalDecision::Approved => "approved",
            ApprovalDecision::Rejected => "rejected",
        })
    }
}

/// Flat approval status, derived from [`WorkflowState`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalStatus {
    None,
    Pending,
    Approved,
    Rejected,
}

impl fmt::Display for ApprovalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ApprovalStatus::None => "none",
            ApprovalStatus::Pending => "pending",
            ApprovalStatus::Approved => "approved",
            ApprovalStatus::Rejected => "rejected",
        })
    }
}

/// Status and approval state of an item as one tagged value.
///
/// `Pending` is the only way to express "pending approval", so the pending
/// status, pending approval and a present requested status cannot disagree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum WorkflowState {
    /// No approval outstanding; `decision` is the most recent resolution, if any
    Settled {
        status: BaseStatus,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        decision: Option<ApprovalDecision>,
    },
    /// Waiting for a decision on `requested`; `underlying` is the rollback target
    Pending {
        underlying: BaseStatus,
        requested: BaseStatus,
    },
}

impl Default for WorkflowState {
    fn default() -> Self {
        WorkflowState::Settled {
            status: BaseStatus::NotStarted,
            decision: None,
        }
    }
}

impl WorkflowState {
    pub fn status(&self) -> Status {
        match self {
            WorkflowState::Settled { status, .. } => (*status).into(),
            WorkflowState::Pending { .. } => Status::PendingApproval,
        }
    }

    /// Last confirmed base status
    pub fn underlying(&self) -> BaseStatus {
        match self {
            WorkflowState::Settled { status, .. } => *status,
            WorkflowState::Pending { underlying, .. } => *underlying,
        }
    }

    pub fn requested(&self) -> Option<BaseStatus> {
        match self {
            WorkflowState::Settled { .. } => None,
            WorkflowState::Pending { requested, .. } => Some(*requested),
        }
    }

    pub fn approval_status(&self) -> ApprovalStatus {
        match self {
            WorkflowState::Pending { .. } => ApprovalStatus::Pending,
            WorkflowState::Settled { decision: None, .. } => ApprovalStatus::None,
            WorkflowState::Settled {
                decision: Some(ApprovalDecision::Approved),
                ..
            } => ApprovalStatus::Approved,
            WorkflowState::Settled {
                decision: Some(ApprovalDecision::Rejected),
                ..
            } => ApprovalStatus::Rejected,
        }
    }

    /// The status used for grouping: the requested target while pending
    pub fn column(&self) -> BaseStatus {
        self.requested().unwrap_or_else(|| self.underlying())
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, WorkflowState::Pending { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ranks_follow_lifecycle_order() {
        let ranks: Vec<_> = BaseStatus::ALL.iter().map(|s| s.rank()).collect();
        assert_eq!(ranks, vec![0, 1, 2]);
        assert!(BaseStatus::Completed.is_terminal());
        assert!(!BaseStatus::InProgress.is_terminal());
    }

    #[test]
    fn parse_status_aliases() {
        assert_eq!("todo".parse::<BaseStatus>().unwrap(), BaseStatus::NotStarted);
        assert_eq!(
            "in-progress".parse::<BaseStatus>().unwrap(),
            BaseStatus::InProgress
        );
        assert_eq!("Done".parse::<BaseStatus>().unwrap(), BaseStatus::Completed);
        assert!("blocked".parse::<BaseStatus>().is_err());
    }

    #[test]
    fn default_state_is_not_started_without_approval() {
        let state = WorkflowState::default();
        assert_eq!(state.status(), Status::NotStarted);
        assert_eq!(state.approval_status(), ApprovalStatus::None);
        assert_eq!(state.requested(), None);
    }

    #[test]
    fn pending_state_exposes_overlay() {
        let state = WorkflowState::Pending {
            underlying: BaseStatus::InProgress,
            requested: BaseStatus::Completed,
        };

        assert_eq!(state.status(), Status::PendingApproval);
        assert_eq!(state.approval_status(), ApprovalStatus::Pending);
        assert_eq!(state.underlying(), BaseStatus::InProgress);
        assert_eq!(state.requested(), Some(BaseStatus::Completed));
        assert_eq!(state.column(), BaseStatus::Completed);
    }

    #[test]
    fn settled_state_reports_last_decision() {
        let state = WorkflowState::Settled {
            status: BaseStatus::InProgress,
            decision: Some(ApprovalDecision::Rejected),
        };

        assert_eq!(state.approval_status(), ApprovalStatus::Rejected);
        assert_eq!(state.column(), BaseStatus::InProgress);
    }

    #[test]
    fn state_serializes_with_phase_tag() {
        let state = WorkflowState::Pending {
            underlying: BaseStatus::NotStarted,
            requested: BaseStatus::InProgress,
        };
        let json = serde_json::to_value(state).unwrap();

        assert_eq!(
            json,
            serde_json::json!({
                "phase": "pending",
                "underlying": "not_started",
                "requested": "in_progress"
            })
        );

        let settled: WorkflowState =
            serde_json::from_str(r#"{"phase":"settled","status":"completed"}"#).unwrap();
        assert_eq!(settled.status(), Status::Completed);
        assert_eq!(settled.approval_status(), ApprovalStatus::None);
    }
}
