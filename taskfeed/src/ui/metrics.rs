//! CPU and memory readouts.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};

use crate::dashboard::{MetricReading, MetricsDisplay};
use crate::ui::theme::{cpu_color, memory_color, MUTED};

fn readout(
    label: &str,
    reading: Option<&MetricReading>,
    color: impl Fn(&MetricReading) -> Color,
) -> Paragraph<'static> {
    let value = match reading {
        Some(r) => Span::styled(
            r.text.clone(),
            Style::default().fg(color(r)).add_modifier(Modifier::BOLD),
        ),
        None => Span::styled("--", Style::default().fg(MUTED)),
    };
    Paragraph::new(vec![
        Line::from(value),
        Line::from(Span::styled(label.to_string(), Style::default().fg(MUTED))),
    ])
    .centered()
}

pub fn draw_metrics(f: &mut ratatui::Frame<'_>, area: Rect, m: &MetricsDisplay) {
    let block = Block::default().borders(Borders::ALL).title("System");
    let inner = block.inner(area);
    f.render_widget(block, area);

    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(inner);
    f.render_widget(
        readout("CPU %", m.cpu.as_ref(), |r| cpu_color(r.emphasis)),
        cols[0],
    );
    f.render_widget(
        readout("Memory %", m.memory.as_ref(), |r| memory_color(r.emphasis)),
        cols[1],
    );
}
