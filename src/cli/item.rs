//! Item CLI commands

use anyhow::{bail, Result};
use chrono::{NaiveDate, Utc};
use clap::{Args, Subcommand};
use serde_json::json;

use super::output::Output;
use crate::domain::{
    allowed_targets, ApprovalDecision, BaseStatus, ItemKey, ItemKind, Note, ParentGraph, Priority,
    TransitionOutcome, WorkItem,
};
use crate::engine::Board;
use crate::storage::Project;

/// Optional comment and attachment for a status change or decision
#[derive(Args, Debug, Default)]
pub struct NoteArgs {
    /// Comment recorded in the item history
    #[arg(long, short = 'm')]
    pub comment: Option<String>,

    /// Link to an attached file
    #[arg(long)]
    pub file_url: Option<String>,
}

impl From<NoteArgs> for Note {
    fn from(args: NoteArgs) -> Self {
        Note::new(args.comment, args.file_url)
    }
}

#[derive(Subcommand)]
pub enum ItemCommands {
    /// Create an item
    ///
    /// Examples:
    ///   flow item add "Website relaunch"
    ///   flow item add --kind action --parent x-1a2b3c4 "Draft copy"
    Add {
        /// Item title
        title: String,

        /// Item kind (project, activity, action)
        #[arg(long, short)]
        kind: Option<ItemKind>,

        /// Responsible user (defaults to the current user)
        #[arg(long)]
        responsible: Option<String>,

        /// User who approves status changes
        #[arg(long)]
        approver: Option<String>,

        /// Start date (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        start: Option<NaiveDate>,

        /// End date (YYYY-MM-DD, defaults to the start date)
        #[arg(long)]
        end: Option<NaiveDate>,

        /// Priority (low, medium, high)
        #[arg(long)]
        priority: Option<Priority>,

        /// Route status changes through approval
        #[arg(long, conflicts_with = "no_workflow")]
        workflow: bool,

        /// Apply status changes directly
        #[arg(long)]
        no_workflow: bool,

        /// Parent item key (same kind)
        #[arg(long)]
        parent: Option<ItemKey>,

        /// Description
        #[arg(long, short)]
        description: Option<String>,
    },

    /// List items of one kind
    List {
        /// Item kind (defaults to the configured kind)
        #[arg(long, short)]
        kind: Option<ItemKind>,

        /// Only items shown in this column
        #[arg(long)]
        column: Option<BaseStatus>,

        /// Only items waiting for approval
        #[arg(long)]
        pending: bool,
    },

    /// Show item details and history
    Show {
        /// Item key
        key: ItemKey,
    },

    /// Change an item's status
    Move {
        /// Item key
        key: ItemKey,

        /// Target status (not_started, in_progress, completed)
        status: BaseStatus,

        #[command(flatten)]
        note: NoteArgs,
    },

    /// Approve a pending status change
    Approve {
        /// Item key
        key: ItemKey,

        #[command(flatten)]
        note: NoteArgs,
    },

    /// Reject a pending status change
    Reject {
        /// Item key
        key: ItemKey,

        #[command(flatten)]
        note: NoteArgs,
    },

    /// Move an item under another parent, or detach it
    Reparent {
        /// Item key
        key: ItemKey,

        /// New parent key (omit to detach)
        parent: Option<ItemKey>,
    },
}

pub fn run(cmd: ItemCommands, output: &Output) -> Result<()> {
    match cmd {
        ItemCommands::Add {
            title,
            kind,
            responsible,
            approver,
            start,
            end,
            priority,
            workflow,
            no_workflow,
            parent,
            description,
        } => {
            let project = Project::open_current()?;
            let settings = &project.config().project;

            let kind = kind.unwrap_or(settings.default_kind);
            let start = start.unwrap_or_else(|| Utc::now().date_naive());
            let end = end.unwrap_or(start);
            if end < start {
                bail!("End date {} is before start date {}", end, start);
            }

            let use_workflow = if workflow {
                true
            } else if no_workflow {
                false
            } else {
                settings.use_workflow
            };

            let mut item = WorkItem::new(
                kind,
                title,
                responsible.unwrap_or_else(|| project.config().user_name()),
                start,
                end,
            )
            .with_priority(priority.unwrap_or(settings.default_priority))
            .with_workflow(use_workflow);

            if let Some(approver) = approver {
                item = item.with_approver(approver);
            }
            if let Some(description) = description {
                item = item.with_description(description);
            }

            let mut board = Board::load(kind, project.item_store())?;

            if let Some(parent) = parent {
                if parent.kind != kind {
                    bail!("Parent {} is not a {}", parent, kind);
                }
                if board.get(&parent).is_none() {
                    bail!("Parent not found: {}", parent);
                }
                item = item.with_parent(parent.id);
            }

            let item = board.place_new(item).clone();
            board.hooks().append(&item)?;

            if output.is_json() {
                output.data(&summary(&item));
            } else {
                output.success(&format!("Created {}: {} - {}", kind, item.key(), item.title));
            }
            Ok(())
        }
        ItemCommands::List {
            kind,
            column,
            pending,
        } => {
            let project = Project::open_current()?;
            let kind = kind.unwrap_or(project.config().project.default_kind);
            let items = project.item_store().read_kind(kind)?;

            let mut shown: Vec<_> = items
                .iter()
                .filter(|i| column.map_or(true, |c| i.column() == c))
                .filter(|i| !pending || i.workflow().is_pending())
                .collect();
            shown.sort_by(|a, b| a.created_at.cmp(&b.created_at));

            if output.is_json() {
                let rows: Vec<_> = shown.iter().map(|i| summary(i)).collect();
                output.data(&rows);
            } else if shown.is_empty() {
                println!("No {} items", kind);
            } else {
                println!("{:<12} {:<18} {:<10} {:<10} TITLE", "KEY", "STATUS", "PRIORITY", "OWNER");
                println!("{}", "-".repeat(72));
                for item in shown {
                    println!(
                        "{:<12} {:<18} {:<10} {:<10} {}",
                        item.key().to_string(),
                        status_label(item),
                        item.priority.to_string(),
                        item.responsible,
                        item.title
                    );
                }
            }
            Ok(())
        }
        ItemCommands::Show { key } => show_item(output, &key),
        ItemCommands::Move { key, status, note } => {
            let project = Project::open_current()?;
            let mut board = Board::load(key.kind, project.item_store())?;

            let outcome = board.change_status(&key, status, note.into())?;

            if output.is_json() {
                output.data(&json!({
                    "key": key.to_string(),
                    "outcome": outcome,
                }));
            } else {
                match outcome {
                    TransitionOutcome::Applied(status) => {
                        output.success(&format!("{} is now {}", key, status))
                    }
                    TransitionOutcome::Requested(status) => output.success(&format!(
                        "Requested approval to move {} to {}",
                        key, status
                    )),
                }
            }
            Ok(())
        }
        ItemCommands::Approve { key, note } => decide(output, &key, ApprovalDecision::Approved, note),
        ItemCommands::Reject { key, note } => decide(output, &key, ApprovalDecision::Rejected, note),
        ItemCommands::Reparent { key, parent } => reparent(output, &key, parent.as_ref()),
    }
}

/// Compact JSON view of an item
pub(super) fn summary(item: &WorkItem) -> serde_json::Value {
    json!({
        "key": item.key().to_string(),
        "title": item.title,
        "status": item.status(),
        "column": item.column(),
        "requested_status": item.requested_status(),
        "approval_status": item.approval_status(),
        "responsible": item.responsible,
        "approver": item.approver,
        "priority": item.priority,
        "use_workflow": item.use_workflow,
        "parent": item.parent_key().map(|p| p.to_string()),
        "kanban_order": item.kanban_order(),
        "start_date": item.start_date,
        "end_date": item.end_date,
    })
}

/// Status text for tables, e.g. `pending → completed`
pub(super) fn status_label(item: &WorkItem) -> String {
    match item.requested_status() {
        Some(requested) => format!("pending → {}", requested),
        None => item.status().to_string(),
    }
}

fn show_item(output: &Output, key: &ItemKey) -> Result<()> {
    let project = Project::open_current()?;
    let item = project
        .item_store()
        .get(key)?
        .ok_or_else(|| anyhow::anyhow!("Item not found: {}", key))?;

    let targets = allowed_targets(&item);

    if output.is_json() {
        let mut data = summary(&item);
        data["description"] = json!(item.description);
        data["allowed_targets"] = json!(targets);
        data["history"] = json!(item.history());
        data["decided_at"] = json!(item.history().last_decision().map(|e| e.date));
        data["created_at"] = json!(item.created_at);
        data["updated_at"] = json!(item.updated_at);
        output.data(&data);
        return Ok(());
    }

    println!("{}: {}", item.kind, item.key());
    println!("Title: {}", item.title);
    println!("Status: {}", status_label(&item));
    match item.history().last_decision() {
        Some(entry) => println!(
            "Approval: {} on {}",
            item.approval_status(),
            entry.date.format("%Y-%m-%d")
        ),
        None => println!("Approval: {}", item.approval_status()),
    }
    println!("Responsible: {}", item.responsible);
    if let Some(approver) = &item.approver {
        println!("Approver: {}", approver);
    }
    println!("Priority: {}", item.priority);
    println!("Dates: {} .. {}", item.start_date, item.end_date);
    println!("Workflow: {}", if item.use_workflow { "approval" } else { "direct" });
    if let Some(parent) = item.parent_key() {
        println!("Parent: {}", parent);
    }

    if let Some(desc) = &item.description {
        println!("\nDescription:");
        println!("{}", desc);
    }

    if !item.history().is_empty() {
        println!("\nHistory:");
        for entry in item.history() {
            let mut line = format!("  {}  {}", entry.date.format("%Y-%m-%d %H:%M"), entry.status);
            if let Some(requested) = entry.requested_status {
                line.push_str(&format!(" → {}", requested));
            }
            if let Some(decision) = entry.approval_decision {
                line.push_str(&format!(" ({})", decision));
            }
            if let Some(comment) = &entry.comment {
                line.push_str(&format!(": {}", comment));
            }
            if let Some(url) = &entry.file_url {
                line.push_str(&format!(" [{}]", url));
            }
            println!("{}", line);
        }
    }

    output.blank();
    if targets.is_empty() {
        println!("No status changes available");
    } else {
        let names: Vec<_> = targets.iter().map(|t| t.as_str()).collect();
        println!("Can move to: {}", names.join(", "));
    }

    Ok(())
}

fn decide(
    output: &Output,
    key: &ItemKey,
    decision: ApprovalDecision,
    note: NoteArgs,
) -> Result<()> {
    let project = Project::open_current()?;
    let mut board = Board::load(key.kind, project.item_store())?;

    match board.resolve_approval(key, decision, note.into())? {
        Some(settled) => {
            if output.is_json() {
                output.data(&json!({
                    "key": key.to_string(),
                    "decision": decision,
                    "status": settled,
                }));
            } else {
                output.success(&format!("{} {}: now {}", decision_verb(decision), key, settled));
            }
        }
        None => output.notice(&format!("No approval is pending for {}", key)),
    }
    Ok(())
}

fn decision_verb(decision: ApprovalDecision) -> &'static str {
    match decision {
        ApprovalDecision::Approved => "Approved",
        ApprovalDecision::Rejected => "Rejected",
    }
}

fn reparent(output: &Output, key: &ItemKey, parent: Option<&ItemKey>) -> Result<()> {
    let project = Project::open_current()?;
    let store = project.item_store();
    let items = store.read_kind(key.kind)?;

    let graph = ParentGraph::from_items(&items);
    graph.check_reparent(key, parent)?;

    let mut item = items
        .into_iter()
        .find(|i| i.is(key))
        .ok_or_else(|| anyhow::anyhow!("Item not found: {}", key))?;
    item.set_parent(parent.map(|p| p.id.clone()));
    store.update(&item)?;

    if output.is_json() {
        output.data(&json!({
            "key": key.to_string(),
            "parent": parent.map(|p| p.to_string()),
        }));
    } else {
        match parent {
            Some(parent) => output.success(&format!("{} is now under {}", key, parent)),
            None => output.success(&format!("{} is now top-level", key)),
        }
    }
    Ok(())
}
