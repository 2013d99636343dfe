//! Bounded, most-recent-first activity feed.

use std::collections::VecDeque;

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeZone};

use crate::types::Activity;

pub const FEED_CAPACITY: usize = 10;
pub const WAITING_TEXT: &str = "Waiting for activity...";
pub const DEFAULT_TIME_FORMAT: &str = "%H:%M:%S";

pub fn push_front_capped<T>(dq: &mut VecDeque<T>, v: T, cap: usize) {
    dq.push_front(v);
    if dq.len() > cap {
        dq.pop_back();
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedEntry {
    pub message: String,
    pub time: String,
}

#[derive(Debug, Clone)]
pub struct ActivityFeed {
    entries: VecDeque<FeedEntry>,
    placeholder: bool,
}

impl ActivityFeed {
    /// Empty feed showing the "waiting" placeholder.
    pub fn new() -> Self {
        Self {
            entries: VecDeque::with_capacity(FEED_CAPACITY + 1),
            placeholder: true,
        }
    }

    pub fn push(&mut self, entry: FeedEntry) {
        self.placeholder = false;
        push_front_capped(&mut self.entries, entry, FEED_CAPACITY);
    }

    pub fn entries(&self) -> impl Iterator<Item = &FeedEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn has_placeholder(&self) -> bool {
        self.placeholder
    }
}

impl Default for ActivityFeed {
    fn default() -> Self {
        Self::new()
    }
}

pub fn entry_for(activity: &Activity, time_format: &str) -> FeedEntry {
    FeedEntry {
        message: activity.message.clone(),
        time: format_time_of_day(&activity.timestamp, &Local, time_format),
    }
}

/// Render a server timestamp as a time of day in `tz`.
///
/// Offsets are honoured; timestamps without one are taken as local to `tz`,
/// and a bare date means midnight UTC. Anything else shows "Invalid Date".
pub fn format_time_of_day<Tz>(ts: &str, tz: &Tz, fmt: &str) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    let ts = ts.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(ts) {
        return dt.with_timezone(tz).format(fmt).to_string();
    }
    for pattern in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(ts, pattern) {
            if let Some(dt) = tz.from_local_datetime(&naive).earliest() {
                return dt.format(fmt).to_string();
            }
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(ts, "%Y-%m-%d") {
        if let Some(naive) = date.and_hms_opt(0, 0, 0) {
            return naive.and_utc().with_timezone(tz).format(fmt).to_string();
        }
    }
    "Invalid Date".into()
}
