//! Activity feed panel, newest entry on top.

use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem},
};

use crate::feed::{ActivityFeed, WAITING_TEXT};
use crate::ui::theme::MUTED;
use crate::ui::util::{cell_width, truncate_end};

pub fn draw_feed(f: &mut ratatui::Frame<'_>, area: Rect, feed: &ActivityFeed) {
    let block = Block::default().borders(Borders::ALL).title("Live Activity");
    let width = area.width.saturating_sub(2) as usize;

    let items: Vec<ListItem> = if feed.has_placeholder() {
        vec![ListItem::new(Line::from(Span::styled(
            WAITING_TEXT,
            Style::default().fg(MUTED).add_modifier(Modifier::ITALIC),
        )))]
    } else {
        feed.entries()
            .map(|e| {
                let time_w = cell_width(&e.time) + 1;
                let msg = truncate_end(&e.message, width.saturating_sub(time_w).max(4));
                ListItem::new(Line::from(vec![
                    Span::raw(msg),
                    Span::raw(" "),
                    Span::styled(e.time.clone(), Style::default().fg(MUTED)),
                ]))
            })
            .collect()
    };
    f.render_widget(List::new(items).block(block), area);
}
