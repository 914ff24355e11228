//! Work item domain model
//!
//! Work items are projects, activities and actions. Items of the same kind
//! can nest through `parent_id`. Status and board position are only changed
//! by the workflow state machine and the ordering engine.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::history::History;
use super::id::{ItemId, ItemKey, ItemKind};
use super::status::{ApprovalStatus, BaseStatus, Status, WorkflowState};

/// Priority of a work item
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "low" => Ok(Priority::Low),
            "medium" | "normal" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            other => Err(format!(
                "Unknown priority '{}' (expected low, medium or high)",
                other
            )),
        }
    }
}

/// A project, activity or action
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkItem {
    /// Hash part of the identity
    pub id: ItemId,

    /// Kind part of the identity
    pub kind: ItemKind,

    /// Human-readable title
    pub title: String,

    /// User responsible for the item
    pub responsible: String,

    /// User who approves status changes when the workflow is enabled
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approver: Option<String>,

    pub start_date: NaiveDate,

    pub end_date: NaiveDate,

    #[serde(default)]
    pub priority: Priority,

    /// Route status changes through approval
    #[serde(default)]
    pub use_workflow: bool,

    /// Parent item of the same kind
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<ItemId>,

    /// Sort key within the item's board column
    #[serde(default)]
    pub(crate) kanban_order: i64,

    #[serde(default)]
    pub(crate) workflow: WorkflowState,

    #[serde(default, skip_serializing_if = "History::is_empty")]
    pub(crate) history: History,

    /// Optional description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// When the item was created
    pub created_at: DateTime<Utc>,

    /// When the item was last updated
    pub updated_at: DateTime<Utc>,
}

impl WorkItem {
    /// Creates a new item in `not_started` with no approval history
    pub fn new(
        kind: ItemKind,
        title: impl Into<String>,
        responsible: impl Into<String>,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Self {
        let now = Utc::now();
        let title = title.into();
        Self {
            id: ItemId::new(&title, now),
            kind,
            title,
            responsible: responsible.into(),
            approver: None,
            start_date,
            end_date,
            priority: Priority::default(),
            use_workflow: false,
            parent_id: None,
            kanban_order: 0,
            workflow: WorkflowState::default(),
            history: History::new(),
            description: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_approver(mut self, approver: impl Into<String>) -> Self {
        self.approver = Some(approver.into());
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_workflow(mut self, use_workflow: bool) -> Self {
        self.use_workflow = use_workflow;
        self
    }

    pub fn with_parent(mut self, parent_id: ItemId) -> Self {
        self.parent_id = Some(parent_id);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// The `(kind, id)` identity
    pub fn key(&self) -> ItemKey {
        ItemKey::new(self.kind, self.id.clone())
    }

    /// Returns true if this item has the given identity
    pub fn is(&self, key: &ItemKey) -> bool {
        self.kind == key.kind && self.id == key.id
    }

    /// Identity of the parent item, which always shares this item's kind
    pub fn parent_key(&self) -> Option<ItemKey> {
        self.parent_id
            .as_ref()
            .map(|id| ItemKey::new(self.kind, id.clone()))
    }

    pub fn workflow(&self) -> &WorkflowState {
        &self.workflow
    }

    pub fn status(&self) -> Status {
        self.workflow.status()
    }

    pub fn underlying_status(&self) -> BaseStatus {
        self.workflow.underlying()
    }

    pub fn requested_status(&self) -> Option<BaseStatus> {
        self.workflow.requested()
    }

    pub fn approval_status(&self) -> ApprovalStatus {
        self.workflow.approval_status()
    }

    /// The board column this item is displayed in
    pub fn column(&self) -> BaseStatus {
        self.workflow.column()
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn kanban_order(&self) -> i64 {
        self.kanban_order
    }

    /// Returns true once the item has been confirmed completed
    pub fn is_completed(&self) -> bool {
        self.underlying_status().is_terminal()
    }

    /// Moves the item under `parent`, or detaches it. Callers validate the
    /// new link with `ParentGraph::check_reparent` first.
    pub fn set_parent(&mut self, parent: Option<ItemId>) {
        self.parent_id = parent;
        self.updated_at = Utc::now();
    }

    pub(crate) fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    #[test]
    fn new_item_starts_unstarted_without_approval() {
        let item = project("Launch");

        assert_eq!(item.status(), Status::NotStarted);
        assert_eq!(item.underlying_status(), BaseStatus::NotStarted);
        assert_eq!(item.approval_status(), ApprovalStatus::None);
        assert_eq!(item.requested_status(), None);
        assert!(item.history().is_empty());
        assert!(!item.use_workflow);
    }

    #[test]
    fn parent_key_shares_kind() {
        let parent = item(ItemKind::Action, "Parent");
        let child = item(ItemKind::Action, "Child").with_parent(parent.id.clone());

        assert_eq!(child.parent_key(), Some(parent.key()));
        assert!(parent.parent_key().is_none());
    }

    #[test]
    fn builder_sets_optional_fields() {
        let item = project("Audit")
            .with_approver("omid")
            .with_priority(Priority::High)
            .with_workflow(true)
            .with_description("Yearly audit");

        assert_eq!(item.approver.as_deref(), Some("omid"));
        assert_eq!(item.priority, Priority::High);
        assert!(item.use_workflow);
        assert_eq!(item.description.as_deref(), Some("Yearly audit"));
    }

    #[test]
    fn priority_parses() {
        assert_eq!("HIGH".parse::<Priority>().unwrap(), Priority::High);
        assert!("urgent".parse::<Priority>().is_err());
        assert!(Priority::High > Priority::Low);
    }

    #[test]
    fn serde_roundtrip() {
        let mut item = project("Roundtrip").with_approver("omid");
        item.kanban_order = 30;

        let json = serde_json::to_string(&item).unwrap();
        let parsed: WorkItem = serde_json::from_str(&json).unwrap();

        assert_eq!(item, parsed);
    }

    #[test]
    fn minimal_json_uses_defaults() {
        let json = r#"{
            "id": "1234567",
            "kind": "activity",
            "title": "Imported",
            "responsible": "sara",
            "start_date": "2025-01-01",
            "end_date": "2025-02-01",
            "created_at": "2025-01-01T00:00:00Z",
            "updated_at": "2025-01-01T00:00:00Z"
        }"#;

        let item: WorkItem = serde_json::from_str(json).unwrap();
        assert_eq!(item.kind, ItemKind::Activity);
        assert_eq!(item.priority, Priority::Medium);
        assert_eq!(item.kanban_order(), 0);
        assert_eq!(item.status(), Status::NotStarted);
        assert_eq!(item.key().to_string(), "a-1234567");
    }
}
