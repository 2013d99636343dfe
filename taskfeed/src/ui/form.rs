//! New-task input line with its submit button.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::Span,
    widgets::{Block, Borders, Paragraph},
};

use crate::form::TaskBoard;
use crate::ui::theme::{MUTED, PRIMARY};

pub fn draw_form(f: &mut ratatui::Frame<'_>, area: Rect, board: &TaskBoard) {
    let button_w = board.button.label().chars().count() as u16 + 4;
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(10), Constraint::Length(button_w)])
        .split(area);

    let input = if board.input.is_empty() {
        Span::styled(
            "Enter a new task, or /done ID, /rm ID",
            Style::default().fg(MUTED),
        )
    } else {
        Span::raw(board.input.clone())
    };
    f.render_widget(
        Paragraph::new(input).block(Block::default().borders(Borders::ALL).title("New Task")),
        cols[0],
    );

    let style = if board.button.is_disabled() {
        Style::default().fg(MUTED)
    } else {
        Style::default().fg(PRIMARY).add_modifier(Modifier::BOLD)
    };
    f.render_widget(
        Paragraph::new(Span::styled(board.button.label().to_string(), style))
            .centered()
            .block(Block::default().borders(Borders::ALL)),
        cols[1],
    );
}
