//! Library entry for taskfeed: exposes modules for the binary and for tests.

pub mod app;
pub mod client;
pub mod dashboard;
pub mod feed;
pub mod form;
pub mod logging;
pub mod profiles;
pub mod sse;
pub mod tasks;
pub mod transport;
pub mod types;
pub mod ui;
