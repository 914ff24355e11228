//! Kanban board CLI commands

use anyhow::{anyhow, Result};
use clap::Subcommand;
use serde_json::json;

use super::item::{status_label, summary, NoteArgs};
use super::output::Output;
use crate::domain::{BaseStatus, GestureOutcome, ItemKey, ItemKind, MoveOutcome, OrderUpdate};
use crate::engine::Board;
use crate::storage::Project;

#[derive(Subcommand)]
pub enum BoardCommands {
    /// Show the board columns
    Show {
        /// Item kind (defaults to the configured kind)
        #[arg(long, short)]
        kind: Option<ItemKind>,

        /// Include the Completed column even when hidden in config
        #[arg(long)]
        all: bool,
    },

    /// Move a card to a position within its own column
    Reorder {
        /// Item key
        key: ItemKey,

        /// Position among the other cards of the column (0 = top)
        index: usize,
    },

    /// Drag a card onto a column
    ///
    /// Dropping on the card's own column reorders it. Dropping on another
    /// column requests a status change and appends the card to that column.
    /// Refused moves leave the card where it was.
    Drop {
        /// Item key
        key: ItemKey,

        /// Target column (not_started, in_progress, completed)
        column: BaseStatus,

        /// Position among the other cards when staying in the same column
        #[arg(long, default_value = "0")]
        index: usize,

        #[command(flatten)]
        note: NoteArgs,
    },
}

pub fn run(cmd: BoardCommands, output: &Output) -> Result<()> {
    match cmd {
        BoardCommands::Show { kind, all } => show(output, kind, all),
        BoardCommands::Reorder { key, index } => {
            let project = Project::open_current()?;
            let mut board = Board::load(key.kind, project.item_store())?;
            let column = board
                .get(&key)
                .map(|i| i.column())
                .ok_or_else(|| anyhow!("Item not found: {}", key))?;

            let batch = board.reorder(column, &key, index)?;
            report_batch(output, &key, &batch);
            Ok(())
        }
        BoardCommands::Drop {
            key,
            column,
            index,
            note,
        } => {
            let project = Project::open_current()?;
            let mut board = Board::load(key.kind, project.item_store())?;

            let session = board.begin_drag(&key)?;
            let payload = session.payload().to_string();
            let outcome = board.drop_card(session, &payload, column, index, note.into())?;

            match outcome {
                GestureOutcome::Dropped(MoveOutcome::StatusChanged {
                    transition, batch, ..
                }) => {
                    if output.is_json() {
                        output.data(&json!({
                            "key": key.to_string(),
                            "moved": true,
                            "outcome": transition,
                            "updates": batch,
                        }));
                    } else {
                        let item = board.get(&key).ok_or_else(|| anyhow!("Item not found: {}", key))?;
                        output.success(&format!("Moved {} to {} ({})", key, column, status_label(item)));
                    }
                }
                GestureOutcome::Dropped(MoveOutcome::Reordered(batch)) => {
                    report_batch(output, &key, &batch)
                }
                GestureOutcome::Dropped(MoveOutcome::Rejected(_))
                | GestureOutcome::Aborted(_)
                | GestureOutcome::Cancelled => {
                    if output.is_json() {
                        output.data(&json!({
                            "key": key.to_string(),
                            "moved": false,
                        }));
                    } else {
                        output.success(&format!("{} stays where it was", key));
                    }
                }
            }
            Ok(())
        }
    }
}

fn report_batch(output: &Output, key: &ItemKey, batch: &[OrderUpdate]) {
    if output.is_json() {
        output.data(&json!({
            "key": key.to_string(),
            "moved": !batch.is_empty(),
            "updates": batch,
        }));
    } else if batch.is_empty() {
        output.success(&format!("{} is already at that position", key));
    } else {
        output.success(&format!("Reordered {} ({} cards updated)", key, batch.len()));
    }
}

fn show(output: &Output, kind: Option<ItemKind>, all: bool) -> Result<()> {
    let project = Project::open_current()?;
    let settings = &project.config().project;
    let kind = kind.unwrap_or(settings.default_kind);
    let board = Board::load(kind, project.item_store())?;

    let columns: Vec<_> = BaseStatus::ALL
        .into_iter()
        .filter(|c| all || settings.board.show_completed || !c.is_terminal())
        .collect();

    if output.is_json() {
        let mut data = serde_json::Map::new();
        for column in &columns {
            let cards: Vec<_> = board.column(*column).into_iter().map(summary).collect();
            data.insert(column.as_str().to_string(), json!(cards));
        }
        output.data(&data);
        return Ok(());
    }

    for (n, column) in columns.iter().enumerate() {
        if n > 0 {
            output.blank();
        }
        let cards = board.column(*column);
        println!("{} ({})", column.title(), cards.len());
        println!("{}", "-".repeat(40));
        for card in cards {
            let marker = if card.workflow().is_pending() { "?" } else { " " };
            println!("{} {:<12} {}", marker, card.key().to_string(), card.title);
        }
    }

    Ok(())
}
