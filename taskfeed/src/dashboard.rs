//! Screen state driven by the update channel: connection indicator,
//! activity feed and the two metric readouts.
//!
//! A panel that is switched off in the layout is `None`; renderers that
//! target it report `RenderError::MissingTarget` instead of updating.

use chrono::format::{Item, StrftimeItems};
use serde::Deserialize;
use thiserror::Error;

use crate::feed::{entry_for, ActivityFeed, DEFAULT_TIME_FORMAT};
use crate::types::{Activity, SystemMetrics};

pub const WARNING_THRESHOLD: f64 = 80.0;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("could not find the {0} panel")]
    MissingTarget(&'static str),
    #[error("malformed {kind} payload: {source}")]
    BadData {
        kind: &'static str,
        source: serde_json::Error,
    },
}

/// Which panels exist on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, serde::Serialize)]
#[serde(default)]
pub struct Panels {
    pub status: bool,
    pub activity: bool,
    pub metrics: bool,
}

impl Default for Panels {
    fn default() -> Self {
        Self {
            status: true,
            activity: true,
            metrics: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Emphasis {
    Normal,
    Warning,
}

impl Emphasis {
    pub fn for_percent(v: f64) -> Self {
        if v > WARNING_THRESHOLD {
            Emphasis::Warning
        } else {
            Emphasis::Normal
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MetricReading {
    pub text: String,
    pub emphasis: Emphasis,
}

impl MetricReading {
    pub fn from_percent(v: f64) -> Self {
        Self {
            text: format!("{}%", one_decimal(v)),
            emphasis: Emphasis::for_percent(v),
        }
    }
}

/// One decimal place, exact ties rounded away from zero.
///
/// `{:.1}` already rounds on the exact binary value; only true ties (x.x5
/// held exactly, i.e. quarters) need nudging off its half-to-even rule.
fn one_decimal(v: f64) -> String {
    let quarters = v * 4.0;
    if quarters.fract() == 0.0 && quarters % 2.0 != 0.0 {
        return format!("{:.1}", v + 0.05f64.copysign(v));
    }
    format!("{v:.1}")
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetricsDisplay {
    pub cpu: Option<MetricReading>,
    pub memory: Option<MetricReading>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConnectionIndicator {
    // None until the first open/error
    connected: Option<bool>,
}

impl ConnectionIndicator {
    pub fn set(&mut self, connected: bool) {
        self.connected = Some(connected);
    }

    pub fn connected(&self) -> Option<bool> {
        self.connected
    }

    pub fn label(&self) -> &'static str {
        match self.connected {
            Some(true) => "Connected",
            Some(false) => "Disconnected",
            None => "Connecting...",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self.connected {
            Some(true) => "📶",
            Some(false) => "🚫",
            None => "…",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Dashboard {
    pub status: Option<ConnectionIndicator>,
    pub feed: Option<ActivityFeed>,
    pub metrics: Option<MetricsDisplay>,
    time_format: String,
}

impl Dashboard {
    pub fn new(panels: Panels) -> Self {
        Self {
            status: panels.status.then(ConnectionIndicator::default),
            feed: panels.activity.then(ActivityFeed::new),
            metrics: panels.metrics.then(MetricsDisplay::default),
            time_format: DEFAULT_TIME_FORMAT.into(),
        }
    }

    /// Invalid strftime patterns fall back to the default.
    pub fn with_time_format(mut self, fmt: impl Into<String>) -> Self {
        let fmt = fmt.into();
        if StrftimeItems::new(&fmt).any(|i| matches!(i, Item::Error)) {
            tracing::warn!(%fmt, "invalid time format, using {DEFAULT_TIME_FORMAT}");
        } else {
            self.time_format = fmt;
        }
        self
    }

    pub fn time_format(&self) -> &str {
        &self.time_format
    }

    /// Idempotent; a missing indicator is silently skipped.
    pub fn set_connected(&mut self, connected: bool) {
        if let Some(status) = self.status.as_mut() {
            status.set(connected);
        }
    }

    pub fn render_activity(&mut self, activity: &Activity) -> Result<(), RenderError> {
        let feed = self
            .feed
            .as_mut()
            .ok_or(RenderError::MissingTarget("activity feed"))?;
        feed.push(entry_for(activity, &self.time_format));
        Ok(())
    }

    pub fn render_metrics(&mut self, m: &SystemMetrics) -> Result<(), RenderError> {
        let display = self
            .metrics
            .as_mut()
            .ok_or(RenderError::MissingTarget("system metrics"))?;
        display.cpu = Some(MetricReading::from_percent(m.cpu_percent));
        display.memory = Some(MetricReading::from_percent(m.memory_percent));
        Ok(())
    }
}

impl Default for Dashboard {
    fn default() -> Self {
        Self::new(Panels::default())
    }
}
