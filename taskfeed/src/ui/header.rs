//! Top header with server address and the connection indicator.

use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};

use crate::dashboard::ConnectionIndicator;
use crate::ui::theme::{DANGER, MUTED, SUCCESS};

pub fn indicator_span(ind: &ConnectionIndicator) -> Span<'static> {
    let color = match ind.connected() {
        Some(true) => SUCCESS,
        Some(false) => DANGER,
        None => MUTED,
    };
    Span::styled(
        format!(" {} {} ", ind.icon(), ind.label()),
        Style::default().bg(color).add_modifier(Modifier::BOLD),
    )
}

pub fn draw_header(
    f: &mut ratatui::Frame<'_>,
    area: Rect,
    server: &str,
    status: Option<&ConnectionIndicator>,
) {
    let mut spans = Vec::new();
    if let Some(ind) = status {
        spans.push(indicator_span(ind));
        spans.push(Span::raw(" "));
    }
    spans.push(Span::raw(format!(
        "taskfeed — {server}  (Enter: submit, Ctrl-R: refresh, Esc: quit)"
    )));
    f.render_widget(
        Paragraph::new(Line::from(spans)).block(Block::default().borders(Borders::BOTTOM)),
        area,
    );
}
