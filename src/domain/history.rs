//! Append-only history of status and approval events
//!
//! Entries are recorded by the workflow state machine and never edited.
//! Queries scan newest-first through [`History::most_recent`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::status::{ApprovalDecision, BaseStatus, Status};

/// Optional attachment to a transition or decision
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_url: Option<String>,
}

impl Note {
    pub fn new(comment: Option<String>, file_url: Option<String>) -> Self {
        Self { comment, file_url }
    }

    pub fn comment(comment: impl Into<String>) -> Self {
        Self {
            comment: Some(comment.into()),
            file_url: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.comment.is_none() && self.file_url.is_none()
    }
}

/// One recorded status/approval event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub date: DateTime<Utc>,

    pub status: Status,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requested_status: Option<BaseStatus>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approval_decision: Option<ApprovalDecision>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_url: Option<String>,
}

impl HistoryEntry {
    /// A status applied directly (no approval involved)
    pub fn applied(status: BaseStatus, note: Note, date: DateTime<Utc>) -> Self {
        Self {
            date,
            status: status.into(),
            requested_status: None,
            approval_decision: None,
            comment: note.comment,
            file_url: note.file_url,
        }
    }

    /// An approval request for `requested`
    pub fn requested(requested: BaseStatus, note: Note, date: DateTime<Utc>) -> Self {
        Self {
            date,
            status: Status::PendingApproval,
            requested_status: Some(requested),
            approval_decision: None,
            comment: note.comment,
            file_url: note.file_url,
        }
    }

    /// A resolved approval, recording the status the item settled in
    pub fn decided(
        status: BaseStatus,
        decision: ApprovalDecision,
        note: Note,
        date: DateTime<Utc>,
    ) -> Self {
        Self {
            date,
            status: status.into(),
            requested_status: None,
            approval_decision: Some(decision),
            comment: note.comment,
            file_url: note.file_url,
        }
    }
}

/// Ordered history of an item, oldest first
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct History(Vec<HistoryEntry>);

impl History {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Appends an entry. Only the state machine records events.
    pub(crate) fn append(&mut self, entry: HistoryEntry) {
        self.0.push(entry);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates oldest first
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &HistoryEntry> {
        self.0.iter()
    }

    pub fn last(&self) -> Option<&HistoryEntry> {
        self.0.last()
    }

    /// Returns the newest entry matching `predicate`
    pub fn most_recent<P>(&self, predicate: P) -> Option<&HistoryEntry>
    where
        P: Fn(&HistoryEntry) -> bool,
    {
        self.0.iter().rev().find(|entry| predicate(entry))
    }

    /// When the item last reached Completed.
    ///
    /// Prefers an approved completion; items outside the workflow never carry
    /// a decision, so any completion entry is accepted as a fallback.
    pub fn completion_date(&self) -> Option<DateTime<Utc>> {
        self.most_recent(|e| {
            e.status == Status::Completed
                && e.approval_decision == Some(ApprovalDecision::Approved)
        })
        .or_else(|| self.most_recent(|e| e.status == Status::Completed))
        .map(|e| e.date)
    }

    /// When the most recent approval was requested
    pub fn approval_requested_at(&self) -> Option<DateTime<Utc>> {
        self.most_recent(|e| e.status == Status::PendingApproval)
            .map(|e| e.date)
    }

    /// The most recent resolved approval
    pub fn last_decision(&self) -> Option<&HistoryEntry> {
        self.most_recent(|e| e.approval_decision.is_some())
    }
}

impl<'a> IntoIterator for &'a History {
    type Item = &'a HistoryEntry;
    type IntoIter = std::slice::Iter<'a, HistoryEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
