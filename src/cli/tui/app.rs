//! TUI application state and logic

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use ratatui::prelude::*;

use super::event::{Event, EventHandler};
use super::ui::Terminal;
use super::views::kanban;
use crate::domain::{
    drop_index_for_pointer, ApprovalDecision, BaseStatus, GestureOutcome, GestureSession, ItemKey,
    MoveOutcome, Note, WorkItem,
};
use crate::engine::{Board, Persistence};

/// A card picked up and carried between columns
pub struct Carry {
    session: GestureSession,
    /// Column the card came from
    pub source: BaseStatus,
}

/// Application state
pub struct App<P: Persistence> {
    board: Board<P>,
    show_completed: bool,

    /// Index into [`App::columns`] of the focused column
    focus: usize,
    /// Selected card in each column
    selected: [usize; 3],

    carry: Option<Carry>,
    status_message: Option<String>,
    should_quit: bool,

    /// Screen area of the last frame, for mouse hit-testing
    area: Rect,
}

impl<P: Persistence> App<P> {
    pub fn new(board: Board<P>, show_completed: bool) -> Self {
        Self {
            board,
            show_completed,
            focus: 0,
            selected: [0; 3],
            carry: None,
            status_message: None,
            should_quit: false,
            area: Rect::default(),
        }
    }

    /// Main loop
    pub fn run(&mut self, terminal: &mut Terminal, events: EventHandler) -> Result<()> {
        while !self.should_quit() {
            let frame = terminal.draw(|frame| self.draw(frame))?;
            self.area = frame.area;

            match events.next()? {
                Event::Key(key) => self.handle_key(key)?,
                Event::Mouse(mouse) => self.handle_mouse(mouse)?,
                Event::Resize | Event::Tick => {}
            }
        }

        Ok(())
    }

    fn draw(&self, frame: &mut Frame) {
        kanban::draw(frame, self);
    }

    pub fn board(&self) -> &Board<P> {
        &self.board
    }

    /// Columns currently on screen
    pub fn columns(&self) -> Vec<BaseStatus> {
        BaseStatus::ALL
            .into_iter()
            .filter(|c| self.show_completed || !c.is_terminal())
            .collect()
    }

    pub fn focused_column(&self) -> BaseStatus {
        let columns = self.columns();
        columns[self.focus.min(columns.len() - 1)]
    }

    /// Selected card index in `column`
    pub fn selected_index(&self, column: BaseStatus) -> usize {
        self.selected[column.rank() as usize]
    }

    pub fn selected_card(&self) -> Option<&WorkItem> {
        let column = self.focused_column();
        self.board
            .column(column)
            .get(self.selected_index(column))
            .copied()
    }

    pub fn carrying(&self) -> Option<&Carry> {
        self.carry.as_ref()
    }

    pub fn carried_key(&self) -> Option<ItemKey> {
        self.board.tracker().dragging()
    }

    pub fn status_message(&self) -> Option<&str> {
        self.status_message.as_deref()
    }

    pub fn show_completed(&self) -> bool {
        self.show_completed
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    /// Handle key events
    pub fn handle_key(&mut self, key: KeyEvent) -> Result<()> {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.cancel_carry();
            self.should_quit = true;
            return Ok(());
        }

        if self.carry.is_some() {
            self.handle_carry_key(key)
        } else {
            self.handle_normal_key(key)
        }
    }

    /// Handle mouse events: a left press picks a card up, the release drops it
    pub fn handle_mouse(&mut self, mouse: MouseEvent) -> Result<()> {
        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) if self.carry.is_none() => {
                let Some((focus, area)) = self.column_at(mouse.column, mouse.row) else {
                    return Ok(());
                };
                let column = self.columns()[focus];
                let len = self.board.column(column).len();
                let Some(index) = (0..len).find(|i| kanban::card_row(area, *i) == mouse.row) else {
                    return Ok(());
                };

                self.focus = focus;
                self.selected[column.rank() as usize] = index;
                self.pick_up()
            }
            MouseEventKind::Up(MouseButton::Left) if self.carry.is_some() => {
                match self.column_at(mouse.column, mouse.row) {
                    Some((focus, area)) => {
                        let column = self.columns()[focus];
                        let index = self.pointer_index(column, area, mouse.row);
                        self.focus = focus;
                        self.drop_carried_at(column, index)
                    }
                    None => {
                        self.cancel_carry();
                        self.status_message = Some("Drag cancelled".to_string());
                        Ok(())
                    }
                }
            }
            _ => Ok(()),
        }
    }

    /// Index into [`App::columns`] and screen area of the column under a cell
    fn column_at(&self, x: u16, y: u16) -> Option<(usize, Rect)> {
        kanban::column_areas(self.area, self.columns().len())
            .into_iter()
            .enumerate()
            .find(|(_, a)| x >= a.x && x < a.right() && y >= a.y && y < a.bottom())
    }

    /// Drop index for a pointer on `row`, measured against the cards left in `column`
    fn pointer_index(&self, column: BaseStatus, area: Rect, row: u16) -> usize {
        let carried = self.carried_key();
        let midpoints: Vec<f64> = self
            .board
            .column(column)
            .iter()
            .enumerate()
            .filter(|(_, card)| !carried.as_ref().is_some_and(|k| card.is(k)))
            .map(|(i, _)| f64::from(kanban::card_row(area, i)) + 0.5)
            .collect();

        // The pointer sits on the top edge of its cell
        drop_index_for_pointer(&midpoints, f64::from(row))
    }

    fn handle_normal_key(&mut self, key: KeyEvent) -> Result<()> {
        match key.code {
            KeyCode::Char('q') => self.should_quit = true,

            KeyCode::Char('h') | KeyCode::Left => self.focus_prev(),
            KeyCode::Char('l') | KeyCode::Right => self.focus_next(),
            KeyCode::Char('j') | KeyCode::Down => self.select_next(),
            KeyCode::Char('k') | KeyCode::Up => self.select_prev(),

            KeyCode::Char('J') => self.shift_selected(1)?,
            KeyCode::Char('K') => self.shift_selected(-1)?,

            KeyCode::Char(' ') | KeyCode::Enter => self.pick_up()?,

            KeyCode::Char('a') => self.decide(ApprovalDecision::Approved)?,
            KeyCode::Char('x') => self.decide(ApprovalDecision::Rejected)?,

            KeyCode::Char('c') => {
                self.show_completed = !self.show_completed;
                self.clamp_focus();
            }
            KeyCode::Char('r') => {
                self.board.refresh()?;
                self.clamp_selection();
                self.status_message = Some("Reloaded".to_string());
            }

            KeyCode::Char('?') => {
                self.status_message = Some(
                    "h/l:column j/k:card space:pick up J/K:reorder a:approve x:reject c:completed q:quit"
                        .to_string(),
                );
            }

            _ => {}
        }

        Ok(())
    }

    fn handle_carry_key(&mut self, key: KeyEvent) -> Result<()> {
        match key.code {
            KeyCode::Char('h') | KeyCode::Left => self.focus_prev(),
            KeyCode::Char('l') | KeyCode::Right => self.focus_next(),
            KeyCode::Char('j') | KeyCode::Down => self.select_next(),
            KeyCode::Char('k') | KeyCode::Up => self.select_prev(),
            KeyCode::Char(' ') | KeyCode::Enter => self.drop_carried()?,
            KeyCode::Esc | KeyCode::Char('q') => {
                self.cancel_carry();
                self.status_message = Some("Drag cancelled".to_string());
            }
            _ => {}
        }

        Ok(())
    }

    fn focus_next(&mut self) {
        let count = self.columns().len();
        self.focus = (self.focus + 1) % count;
    }

    fn focus_prev(&mut self) {
        let count = self.columns().len();
        self.focus = (self.focus + count - 1) % count;
    }

    fn select_next(&mut self) {
        let column = self.focused_column();
        let len = self.board.column(column).len();
        if len > 0 {
            let slot = &mut self.selected[column.rank() as usize];
            *slot = (*slot + 1) % len;
        }
    }

    fn select_prev(&mut self) {
        let column = self.focused_column();
        let len = self.board.column(column).len();
        if len > 0 {
            let slot = &mut self.selected[column.rank() as usize];
            *slot = if *slot == 0 { len - 1 } else { *slot - 1 };
        }
    }

    fn clamp_focus(&mut self) {
        let count = self.columns().len();
        if self.focus >= count {
            self.focus = count - 1;
        }
    }

    fn clamp_selection(&mut self) {
        for column in BaseStatus::ALL {
            let len = self.board.column(column).len();
            let slot = &mut self.selected[column.rank() as usize];
            *slot = (*slot).min(len.saturating_sub(1));
        }
    }

    /// Moves the selected card one slot up or down within its column
    fn shift_selected(&mut self, delta: isize) -> Result<()> {
        let Some(card) = self.selected_card().map(|c| c.key()) else {
            return Ok(());
        };
        let column = self.focused_column();
        let current = self.selected_index(column);
        let target = current.saturating_add_signed(delta);

        let batch = self.board.reorder(column, &card, target)?;
        if !batch.is_empty() {
            let len = self.board.column(column).len();
            self.selected[column.rank() as usize] = target.min(len.saturating_sub(1));
        }
        Ok(())
    }

    fn pick_up(&mut self) -> Result<()> {
        let Some(card) = self.selected_card().map(|c| c.key()) else {
            return Ok(());
        };
        let source = self.focused_column();
        let session = self.board.begin_drag(&card)?;
        self.status_message = Some(format!("Carrying {}", card));
        self.carry = Some(Carry { session, source });
        Ok(())
    }

    /// Keyboard drop: the selected slot of the focused column is the drop index
    fn drop_carried(&mut self) -> Result<()> {
        let column = self.focused_column();
        let index = self.selected_index(column);
        self.drop_carried_at(column, index)
    }

    fn drop_carried_at(&mut self, column: BaseStatus, index: usize) -> Result<()> {
        let Some(Carry { session, source }) = self.carry.take() else {
            return Ok(());
        };
        let dragged = session.dragged().clone();
        let payload = session.payload().to_string();

        let outcome = self
            .board
            .drop_card(session, &payload, column, index, Note::default())?;

        self.status_message = Some(match &outcome {
            GestureOutcome::Dropped(MoveOutcome::StatusChanged { transition, .. }) => {
                format!("{} -> {:?}", dragged, transition)
            }
            GestureOutcome::Dropped(MoveOutcome::Reordered(batch)) if batch.is_empty() => {
                format!("{} did not move", dragged)
            }
            GestureOutcome::Dropped(MoveOutcome::Reordered(_)) => {
                format!("Reordered {}", dragged)
            }
            GestureOutcome::Dropped(MoveOutcome::Rejected(_)) | GestureOutcome::Aborted(_) => {
                format!("{} stays in {}", dragged, source.title())
            }
            GestureOutcome::Cancelled => "Drag cancelled".to_string(),
        });

        self.follow(&dragged);
        Ok(())
    }

    fn cancel_carry(&mut self) {
        if let Some(carry) = self.carry.take() {
            self.board.cancel_drag(carry.session);
        }
    }

    /// Focuses and selects `key` wherever it ended up
    fn follow(&mut self, key: &ItemKey) {
        self.clamp_selection();
        let Some(column) = self.board.get(key).map(|i| i.column()) else {
            return;
        };
        if let Some(pos) = self.columns().iter().position(|c| *c == column) {
            self.focus = pos;
        }
        if let Some(index) = self.board.column(column).iter().position(|i| i.is(key)) {
            self.selected[column.rank() as usize] = index;
        }
    }

    fn decide(&mut self, decision: ApprovalDecision) -> Result<()> {
        let Some(card) = self.selected_card().map(|c| c.key()) else {
            return Ok(());
        };

        self.status_message = Some(
            match self.board.resolve_approval(&card, decision, Note::default())? {
                Some(settled) => format!("{}: {}", card, settled),
                None => format!("Nothing pending for {}", card),
            },
        );
        self.follow(&card);
        Ok(())
    }
}
