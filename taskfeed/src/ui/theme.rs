//! Shared UI theme constants.

use ratatui::style::Color;

use crate::dashboard::Emphasis;

pub const PRIMARY: Color = Color::Rgb(13, 110, 253);
pub const SUCCESS: Color = Color::Rgb(25, 135, 84);
pub const DANGER: Color = Color::Rgb(220, 53, 69);
pub const MUTED: Color = Color::Rgb(108, 117, 125);

// Task list flash after a swap
pub const HIGHLIGHT: Color = Color::Rgb(255, 243, 205);

pub fn cpu_color(e: Emphasis) -> Color {
    match e {
        Emphasis::Warning => DANGER,
        Emphasis::Normal => PRIMARY,
    }
}

pub fn memory_color(e: Emphasis) -> Color {
    match e {
        Emphasis::Warning => DANGER,
        Emphasis::Normal => SUCCESS,
    }
}
