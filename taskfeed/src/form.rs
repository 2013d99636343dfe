//! New-task form and the request lifecycle around task-list requests:
//! busy button while a request is in flight, form reset on success, and a
//! short highlight whenever the task list is swapped.

use std::time::{Duration, Instant};

use crate::tasks::{count_label, TaskList, TaskRequest};

pub const SUBMIT_LABEL: &str = "Add Task";
pub const BUSY_LABEL: &str = "Loading...";
pub const HIGHLIGHT_FOR: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitButton {
    label: String,
    // label to restore once the request finishes
    saved: Option<String>,
    disabled: bool,
}

impl SubmitButton {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            saved: None,
            disabled: false,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    fn busy(&mut self) {
        if self.saved.is_none() {
            self.saved = Some(std::mem::replace(&mut self.label, BUSY_LABEL.into()));
        }
        self.disabled = true;
    }

    fn restore(&mut self) {
        if let Some(orig) = self.saved.take() {
            self.label = orig;
        }
        self.disabled = false;
    }
}

/// What the request lifecycle reports after a request completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestOutcome {
    pub successful: bool,
    pub status: Option<u16>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwapTarget {
    TaskList,
    Other,
}

/// Parse the input line: `/done N`, `/rm N` (or `/delete N`), otherwise a new task title.
pub fn parse_command(input: &str) -> Option<TaskRequest> {
    let line = input.trim();
    if line.is_empty() {
        return None;
    }
    let mut words = line.split_whitespace();
    let head = words.next()?;
    let id = words.next().and_then(|w| w.parse::<u64>().ok());
    match head {
        "/done" | "/complete" => id.map(TaskRequest::Complete),
        "/rm" | "/delete" => id.map(TaskRequest::Delete),
        "/refresh" => Some(TaskRequest::Refresh),
        _ if head.starts_with('/') => None,
        _ => Some(TaskRequest::Add(line.to_string())),
    }
}

#[derive(Debug, Clone)]
pub struct TaskBoard {
    pub input: String,
    pub button: SubmitButton,
    list: TaskList,
    count: String,
    highlight_until: Option<Instant>,
    in_flight: usize,
}

impl Default for TaskBoard {
    fn default() -> Self {
        Self {
            input: String::new(),
            button: SubmitButton::new(SUBMIT_LABEL),
            list: TaskList::default(),
            count: count_label(0),
            highlight_until: None,
            in_flight: 0,
        }
    }
}

impl TaskBoard {
    pub fn list(&self) -> &TaskList {
        &self.list
    }

    pub fn count_label(&self) -> &str {
        &self.count
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    pub fn is_highlighted(&self, now: Instant) -> bool {
        self.highlight_until.is_some_and(|until| now < until)
    }

    pub fn before_request(&mut self, _req: &TaskRequest) {
        self.in_flight += 1;
        self.button.busy();
    }

    pub fn after_request(&mut self, req: &TaskRequest, outcome: RequestOutcome) {
        self.in_flight = self.in_flight.saturating_sub(1);
        if self.in_flight == 0 {
            self.button.restore();
        }
        if req.from_form() && outcome.successful && outcome.status == Some(200) {
            self.input.clear();
        }
    }

    /// Replace the task list with a freshly fetched one.
    pub fn swap(&mut self, list: TaskList, now: Instant) {
        self.list = list;
        self.after_swap(SwapTarget::TaskList, now);
    }

    pub fn after_swap(&mut self, target: SwapTarget, now: Instant) {
        self.count = count_label(self.list.count());
        if target == SwapTarget::TaskList {
            self.highlight_until = Some(now + HIGHLIGHT_FOR);
        }
    }
}
