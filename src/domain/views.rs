//! Read-only views over item collections
//!
//! Pure filters and sorts; nothing here mutates an item.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::id::ItemKey;
use super::item::WorkItem;
use super::status::BaseStatus;

/// An item whose parent belongs to someone else's responsibility
#[derive(Debug, Clone, Serialize)]
pub struct DelegatedItem<'a> {
    #[serde(flatten)]
    pub item: &'a WorkItem,
    pub parent_title: String,
}

/// Items whose parent is the responsibility of `user`, newest first
pub fn delegated_by<'a>(user: &str, items: &'a [WorkItem]) -> Vec<DelegatedItem<'a>> {
    let index: HashMap<ItemKey, &WorkItem> = items.iter().map(|i| (i.key(), i)).collect();

    let mut delegated: Vec<_> = items
        .iter()
        .filter_map(|item| {
            let parent = index.get(&item.parent_key()?)?;
            (parent.responsible == user).then(|| DelegatedItem {
                item,
                parent_title: parent.title.clone(),
            })
        })
        .collect();

    delegated.sort_by(|a, b| b.item.created_at.cmp(&a.item.created_at));
    delegated
}

/// A confirmed-completed item with the date it was completed
#[derive(Debug, Clone, Serialize)]
pub struct CompletedItem<'a> {
    #[serde(flatten)]
    pub item: &'a WorkItem,
    pub completed_at: Option<DateTime<Utc>>,
}

/// Completed items, most recently completed first.
///
/// Items without a completion entry in their history sort last.
pub fn completed_items(items: &[WorkItem]) -> Vec<CompletedItem<'_>> {
    let mut done: Vec<_> = items
        .iter()
        .filter(|i| i.underlying_status() == BaseStatus::Completed)
        .map(|item| CompletedItem {
            item,
            completed_at: item.history().completion_date(),
        })
        .collect();

    done.sort_by(|a, b| b.completed_at.cmp(&a.completed_at));
    done
}

/// A pending approval waiting on a user
#[derive(Debug, Clone, Serialize)]
pub struct PendingApproval<'a> {
    #[serde(flatten)]
    pub item: &'a WorkItem,
    pub requested: BaseStatus,
    pub requested_at: Option<DateTime<Utc>>,
}

/// Pending approvals assigned to `user`, oldest request first
pub fn approval_inbox<'a>(user: &str, items: &'a [WorkItem]) -> Vec<PendingApproval<'a>> {
    let mut pending: Vec<_> = items
        .iter()
        .filter(|i| i.approver.as_deref() == Some(user))
        .filter_map(|item| {
            Some(PendingApproval {
                item,
                requested: item.requested_status()?,
                requested_at: item.history().approval_requested_at(),
            })
        })
        .collect();

    pending.sort_by(|a, b| {
        a.requested_at
            .cmp(&b.requested_at)
            .then_with(|| a.item.created_at.cmp(&b.item.created_at))
    });
    pending
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::history::{HistoryEntry, Note};
    use crate::domain::id::ItemKind;
    use crate::domain::item::fixtures::{item, project};
    use crate::domain::status::{ApprovalDecision, WorkflowState};
    use crate::domain::workflow::{request_transition, resolve_approval};
    use chrono::Duration;

    #[test]
    fn delegated_lists_children_of_users_items() {
        let mine = item(ItemKind::Activity, "Mine");
        let mut theirs = item(ItemKind::Activity, "Theirs");
        theirs.responsible = "omid".into();

        let mut first = item(ItemKind::Activity, "First").with_parent(mine.id.clone());
        first.responsible = "lena".into();
        let mut second = item(ItemKind::Activity, "Second").with_parent(mine.id.clone());
        second.created_at = first.created_at + Duration::seconds(10);
        let other = item(ItemKind::Activity, "Other").with_parent(theirs.id.clone());

        let items = vec![mine, theirs, first, second, other];
        let view = delegated_by("sara", &items);

        let titles: Vec<_> = view.iter().map(|d| d.item.title.as_str()).collect();
        assert_eq!(titles, vec!["Second", "First"]);
        assert!(view.iter().all(|d| d.parent_title == "Mine"));
    }

    #[test]
    fn delegated_ignores_unresolved_parents() {
        let gone = item(ItemKind::Action, "Gone");
        let orphan = item(ItemKind::Action, "Orphan").with_parent(gone.id.clone());

        assert!(delegated_by("sara", &[orphan]).is_empty());
    }

    fn completed_on(title: &str, date: DateTime<Utc>) -> WorkItem {
        let mut item = project(title);
        item.workflow = WorkflowState::Settled {
            status: BaseStatus::Completed,
            decision: None,
        };
        item.history
            .append(HistoryEntry::applied(BaseStatus::Completed, Note::default(), date));
        item
    }

    fn requested_on(title: &str, approver: &str, target: BaseStatus, date: DateTime<Utc>) -> WorkItem {
        let mut item = project(title).with_workflow(true).with_approver(approver);
        item.workflow = WorkflowState::Pending {
            underlying: BaseStatus::NotStarted,
            requested: target,
        };
        item.history
            .append(HistoryEntry::requested(target, Note::default(), date));
        item
    }

    #[test]
    fn completed_sorted_most_recent_first() {
        let now = Utc::now();
        let items = vec![
            completed_on("Early", now - Duration::hours(2)),
            project("Open"),
            completed_on("Late", now),
        ];
        let view = completed_items(&items);

        let titles: Vec<_> = view.iter().map(|c| c.item.title.as_str()).collect();
        assert_eq!(titles, vec!["Late", "Early"]);
        assert!(view.iter().all(|c| c.completed_at.is_some()));
    }

    #[test]
    fn pending_completion_is_not_completed() {
        let mut item = project("Waiting").with_workflow(true);
        request_transition(&mut item, BaseStatus::Completed, Note::default()).unwrap();

        assert!(completed_items(std::slice::from_ref(&item)).is_empty());

        resolve_approval(&mut item, ApprovalDecision::Approved, Note::default()).unwrap();
        assert_eq!(completed_items(std::slice::from_ref(&item)).len(), 1);
    }

    #[test]
    fn inbox_lists_pending_requests_for_approver() {
        let now = Utc::now();
        let first = requested_on("First", "omid", BaseStatus::InProgress, now - Duration::minutes(5));
        let second = requested_on("Second", "omid", BaseStatus::Completed, now);
        let elsewhere = requested_on("Elsewhere", "lena", BaseStatus::InProgress, now);
        let idle = project("Idle").with_workflow(true).with_approver("omid");

        let items = vec![second, idle, elsewhere, first];
        let inbox = approval_inbox("omid", &items);

        let titles: Vec<_> = inbox.iter().map(|p| p.item.title.as_str()).collect();
        assert_eq!(titles, vec!["First", "Second"]);
        assert_eq!(inbox[1].requested, BaseStatus::Completed);
    }

    #[test]
    fn resolved_requests_leave_the_inbox() {
        let mut item = project("Quick").with_workflow(true).with_approver("omid");
        request_transition(&mut item, BaseStatus::InProgress, Note::default()).unwrap();
        assert_eq!(approval_inbox("omid", std::slice::from_ref(&item)).len(), 1);

        resolve_approval(&mut item, ApprovalDecision::Rejected, Note::default()).unwrap();
        assert!(approval_inbox("omid", std::slice::from_ref(&item)).is_empty());
    }
}
