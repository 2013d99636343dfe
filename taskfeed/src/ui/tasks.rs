//! Task list panel; flashes briefly after each swap.

use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem},
};

use crate::form::TaskBoard;
use crate::ui::theme::{HIGHLIGHT, MUTED, SUCCESS};

pub fn draw_tasks(f: &mut ratatui::Frame<'_>, area: Rect, board: &TaskBoard, highlighted: bool) {
    let mut block = Block::default()
        .borders(Borders::ALL)
        .title(format!("Tasks ({})", board.count_label()));
    if highlighted {
        block = block.border_style(Style::default().fg(HIGHLIGHT));
    }

    let items: Vec<ListItem> = if board.list().items.is_empty() {
        vec![ListItem::new(Span::styled(
            "No tasks yet",
            Style::default().fg(MUTED),
        ))]
    } else {
        board
            .list()
            .items
            .iter()
            .map(|t| {
                let id = t.id.map(|i| format!("#{i:<4}")).unwrap_or_else(|| "     ".into());
                let (mark, style) = if t.completed {
                    (
                        "✔ ",
                        Style::default()
                            .fg(SUCCESS)
                            .add_modifier(Modifier::CROSSED_OUT),
                    )
                } else {
                    ("• ", Style::default())
                };
                ListItem::new(Line::from(vec![
                    Span::styled(id, Style::default().fg(MUTED)),
                    Span::raw(mark),
                    Span::styled(t.title.clone(), style),
                ]))
            })
            .collect()
    };
    f.render_widget(List::new(items).block(block), area);
}
