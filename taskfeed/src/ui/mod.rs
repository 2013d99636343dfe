//! UI module root: exposes drawing functions for individual panels.

pub mod feed;
pub mod form;
pub mod header;
pub mod metrics;
pub mod tasks;
pub mod theme;
pub mod util;
