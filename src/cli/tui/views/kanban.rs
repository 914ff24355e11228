//! Kanban view: cards grouped by board column

use ratatui::{
    prelude::*,
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
};

use crate::cli::tui::app::App;
use crate::cli::tui::utils::truncate_str;
use crate::domain::{BaseStatus, WorkItem};
use crate::engine::Persistence;

/// Splits the screen into the board and the status bar
fn split_main(area: Rect) -> (Rect, Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(10),   // Board
            Constraint::Length(3), // Status bar
        ])
        .split(area);
    (chunks[0], chunks[1])
}

/// Screen areas of `count` board columns, left to right
pub fn column_areas(area: Rect, count: usize) -> Vec<Rect> {
    let (board, _) = split_main(area);
    let constraints: Vec<_> = (0..count)
        .map(|_| Constraint::Ratio(1, count as u32))
        .collect();
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints(constraints)
        .split(board)
        .to_vec()
}

/// Screen row of the card at `index` in a column drawn in `area`
pub fn card_row(area: Rect, index: usize) -> u16 {
    area.y.saturating_add(1).saturating_add(index as u16)
}

/// Draw the kanban layout
pub fn draw<P: Persistence>(frame: &mut Frame, app: &App<P>) {
    let area = frame.area();
    let columns = app.columns();

    for (column, rect) in columns.iter().zip(column_areas(area, columns.len())) {
        draw_column(frame, app, *column, rect);
    }

    let (_, status_bar) = split_main(area);
    draw_status_bar(frame, app, status_bar);
}

fn column_color(column: BaseStatus) -> Color {
    match column {
        BaseStatus::NotStarted => Color::Green,
        BaseStatus::InProgress => Color::Yellow,
        BaseStatus::Completed => Color::DarkGray,
    }
}

fn card_line(card: &WorkItem, carried: bool, width: usize) -> String {
    let marker = if carried {
        "[*]"
    } else if card.workflow().is_pending() {
        "[?]"
    } else if card.is_completed() {
        "[x]"
    } else {
        "[ ]"
    };
    format!("{} {}", marker, truncate_str(&card.title, width))
}

fn draw_column<P: Persistence>(frame: &mut Frame, app: &App<P>, column: BaseStatus, area: Rect) {
    let cards = app.board().column(column);
    let carried = app.carried_key();
    let focused = app.focused_column() == column;
    let color = column_color(column);
    let width = (area.width as usize).saturating_sub(8);

    let items: Vec<ListItem> = cards
        .iter()
        .map(|card| {
            let is_carried = carried.as_ref().is_some_and(|k| card.is(k));
            let style = if is_carried {
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
            } else if card.workflow().is_pending() {
                Style::default().fg(Color::Magenta)
            } else {
                Style::default().fg(color)
            };
            ListItem::new(card_line(card, is_carried, width)).style(style)
        })
        .collect();

    let border_style = if focused {
        Style::default().fg(color).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(color)
    };

    let title = format!("{} ({})", column.title(), cards.len());
    let list = List::new(items)
        .block(
            Block::default()
                .title(title)
                .borders(Borders::ALL)
                .border_style(border_style),
        )
        .highlight_symbol("> ");

    let mut state = ListState::default();
    if focused && !cards.is_empty() {
        state.select(Some(app.selected_index(column).min(cards.len() - 1)));
    }

    frame.render_stateful_widget(list, area, &mut state);
}

fn draw_status_bar<P: Persistence>(frame: &mut Frame, app: &App<P>, area: Rect) {
    let (content, style) = match app.carrying() {
        Some(carry) => (
            format!(
                "Carrying from {}: h/l pick column, space drops, Esc cancels",
                carry.source.title()
            ),
            Style::default().fg(Color::Cyan),
        ),
        None => {
            let msg = app
                .status_message()
                .unwrap_or("[space]pick up [J/K]reorder [a]pprove [x]reject [c]ompleted [r]efresh [q]uit");
            (msg.to_string(), Style::default())
        }
    };

    let hidden = if app.show_completed() { "" } else { " (completed hidden)" };
    let status_text = format!("Flowboard [{}{}] {}", app.board().kind(), hidden, content);

    let paragraph = Paragraph::new(status_text)
        .style(style)
        .block(Block::default().borders(Borders::ALL));

    frame.render_widget(paragraph, area);
}
