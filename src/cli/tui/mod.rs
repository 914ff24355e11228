//! Interactive kanban board
//!
//! Cards are moved with the keyboard (pick a card up, carry it to a column,
//! drop it) or dragged with the mouse. Drops go through the same board engine as `flow board drop`,
//! so refused moves leave the card where it was.

mod app;
mod event;
mod ui;
mod utils;
mod views;

use std::panic::{self, AssertUnwindSafe};

use anyhow::{anyhow, Result};
use tracing::debug;

use crate::domain::ItemKind;
use crate::engine::Board;
use crate::storage::Project;
use app::App;
use event::EventHandler;

/// Launch the board for `kind` (defaults to the configured kind)
pub fn run(kind: Option<ItemKind>) -> Result<()> {
    let project = Project::open_current()?;
    let settings = &project.config().project;
    let kind = kind.unwrap_or(settings.default_kind);
    let show_completed = settings.board.show_completed;

    debug!(%kind, "starting board");
    let board = Board::load(kind, project.item_store())?;
    let mut app = App::new(board, show_completed);

    let mut terminal = ui::init_terminal()?;
    let events = EventHandler::new(250);

    // Restore the terminal even if the app panics
    let result = panic::catch_unwind(AssertUnwindSafe(|| app.run(&mut terminal, events)));

    let restore_result = ui::restore_terminal();

    match result {
        Ok(inner_result) => {
            restore_result?;
            inner_result
        }
        Err(panic_payload) => {
            let _ = restore_result;
            if let Some(s) = panic_payload.downcast_ref::<&str>() {
                Err(anyhow!("Board panicked: {}", s))
            } else if let Some(s) = panic_payload.downcast_ref::<String>() {
                Err(anyhow!("Board panicked: {}", s))
            } else {
                Err(anyhow!("Board panicked with unknown error"))
            }
        }
    }
}
