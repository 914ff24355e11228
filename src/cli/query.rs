//! Query commands: hierarchy, delegation, completion and approvals

use anyhow::Result;
use serde_json::json;

use super::item::status_label;
use super::output::Output;
use crate::domain::{approval_inbox, completed_items, delegated_by, ItemKey, ItemKind, WorkItem};
use crate::engine::Board;
use crate::storage::Project;

/// Shows the family tree that contains `key`
pub fn tree(output: &Output, key: &ItemKey) -> Result<()> {
    let project = Project::open_current()?;
    let board = Board::load(key.kind, project.item_store())?;

    let Some(tree) = board.chain(key)? else {
        if output.is_json() {
            output.data(&json!(null));
        } else {
            println!("No hierarchy to show for {}", key);
        }
        return Ok(());
    };

    if output.is_json() {
        output.data(&tree);
        return Ok(());
    }

    for (depth, node) in tree.walk() {
        let marker = if node.highlighted { ">" } else { " " };
        println!(
            "{} {}{}  {}  [{}, starts {}]",
            marker,
            "  ".repeat(depth),
            node.key,
            node.title,
            node.status,
            node.start_date
        );
    }
    println!("{} items", tree.len());

    Ok(())
}

fn all_items(project: &Project) -> Result<Vec<WorkItem>> {
    Ok(project.item_store().read_all()?.into_values().collect())
}

/// Items under parents the user is responsible for
pub fn delegated(output: &Output, user: Option<String>) -> Result<()> {
    let project = Project::open_current()?;
    let user = user.unwrap_or_else(|| project.config().user_name());
    let items = all_items(&project)?;
    let view = delegated_by(&user, &items);

    if output.is_json() {
        output.data(&view);
    } else if view.is_empty() {
        println!("Nothing delegated by {}", user);
    } else {
        println!("{:<12} {:<18} {:<10} {:<24} TITLE", "KEY", "STATUS", "OWNER", "PARENT");
        println!("{}", "-".repeat(80));
        for entry in &view {
            println!(
                "{:<12} {:<18} {:<10} {:<24} {}",
                entry.item.key().to_string(),
                status_label(entry.item),
                entry.item.responsible,
                entry.parent_title,
                entry.item.title
            );
        }
    }

    Ok(())
}

/// Completed items, most recent first
pub fn completed(output: &Output, kind: Option<ItemKind>) -> Result<()> {
    let project = Project::open_current()?;
    let mut items = all_items(&project)?;
    if let Some(kind) = kind {
        items.retain(|i| i.kind == kind);
    }
    let view = completed_items(&items);

    if output.is_json() {
        output.data(&view);
    } else if view.is_empty() {
        println!("No completed items");
    } else {
        println!("{:<12} {:<18} TITLE", "KEY", "COMPLETED");
        println!("{}", "-".repeat(60));
        for entry in &view {
            let when = entry
                .completed_at
                .map(|d| d.format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_else(|| "-".to_string());
            println!("{:<12} {:<18} {}", entry.item.key().to_string(), when, entry.item.title);
        }
    }

    Ok(())
}

/// Approval requests waiting on the user, oldest first
pub fn inbox(output: &Output, user: Option<String>) -> Result<()> {
    let project = Project::open_current()?;
    let user = user.unwrap_or_else(|| project.config().user_name());
    let items = all_items(&project)?;
    let view = approval_inbox(&user, &items);

    if output.is_json() {
        output.data(&view);
    } else if view.is_empty() {
        println!("No approvals waiting for {}", user);
    } else {
        println!("{:<12} {:<14} {:<18} TITLE", "KEY", "REQUESTED", "SINCE");
        println!("{}", "-".repeat(64));
        for entry in &view {
            let since = entry
                .requested_at
                .map(|d| d.format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_else(|| "-".to_string());
            println!(
                "{:<12} {:<14} {:<18} {}",
                entry.item.key().to_string(),
                entry.requested.as_str(),
                since,
                entry.item.title
            );
        }
    }

    Ok(())
}
