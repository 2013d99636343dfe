//! Small UI helpers: truncation by terminal cells.

use ratatui::text::Span;

/// Display width in terminal cells; wide glyphs such as emoji count as two.
pub fn cell_width(s: &str) -> usize {
    Span::raw(s).width()
}

pub fn truncate_end(s: &str, max: usize) -> String {
    if cell_width(s) <= max {
        return s.to_string();
    }
    if max <= 3 {
        return "...".into();
    }
    let budget = max - 3;
    let mut used = 0;
    let mut kept = String::new();
    let mut buf = [0u8; 4];
    for c in s.chars() {
        let w = cell_width(c.encode_utf8(&mut buf));
        if used + w > budget {
            break;
        }
        used += w;
        kept.push(c);
    }
    format!("{kept}...")
}
