//! Task list endpoints. Every call answers with the rendered task-list
//! fragment, which is scraped into `TaskList` for the terminal.

use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::StatusCode;
use thiserror::Error;
use tracing::debug;
use url::Url;

use crate::transport::{endpoint, TransportError};

pub const TASKS_PATH: &str = "/tasks";

#[derive(Debug, Error)]
pub enum TaskError {
    #[error(transparent)]
    Url(#[from] TransportError),
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server answered {0}")]
    Status(StatusCode),
}

impl TaskError {
    pub fn status(&self) -> Option<u16> {
        match self {
            TaskError::Status(s) => Some(s.as_u16()),
            TaskError::Http(e) => e.status().map(|s| s.as_u16()),
            TaskError::Url(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskRequest {
    Refresh,
    Add(String),
    Complete(u64),
    Delete(u64),
}

impl TaskRequest {
    /// Requests that come from the new-task form.
    pub fn from_form(&self) -> bool {
        matches!(self, TaskRequest::Add(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskItem {
    pub id: Option<u64>,
    pub title: String,
    pub completed: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskList {
    pub items: Vec<TaskItem>,
}

static OPEN_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"<[a-zA-Z][\w-]*\b[^>]*\bclass\s*=\s*"([^"]*)"[^>]*>"#).unwrap());
static TASK_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?:/tasks/|data-task-id="|id="task-)(\d+)"#).unwrap());
static TITLE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"class\s*=\s*"[^"]*\btask-title\b[^"]*"[^>]*>([^<]*)<"#).unwrap()
});
static BUTTON: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)<button\b.*?</button>").unwrap());
static TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<[^>]*>").unwrap());

fn has_class(classes: &str, name: &str) -> bool {
    classes.split_whitespace().any(|c| c == name)
}

fn decode_entities(s: &str) -> String {
    s.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#x27;", "'")
        .replace("&amp;", "&")
}

impl TaskList {
    /// Scrape task items out of a task-list fragment.
    pub fn parse(html: &str) -> Self {
        let starts: Vec<(usize, bool)> = OPEN_TAG
            .captures_iter(html)
            .filter_map(|c| {
                let (tag, classes) = (c.get(0)?, c.get(1)?.as_str());
                has_class(classes, "task-item")
                    .then(|| (tag.start(), has_class(classes, "completed")))
            })
            .collect();

        let mut items = Vec::with_capacity(starts.len());
        for (i, &(start, completed)) in starts.iter().enumerate() {
            let end = starts.get(i + 1).map(|s| s.0).unwrap_or(html.len());
            let seg = &html[start..end];
            let id = TASK_ID
                .captures(seg)
                .and_then(|c| c[1].parse::<u64>().ok());
            let title = TITLE
                .captures(seg)
                .map(|c| c[1].trim().to_string())
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| first_text(seg));
            items.push(TaskItem {
                id,
                title: decode_entities(&title),
                completed,
            });
        }
        debug!(count = items.len(), "parsed task list");
        Self { items }
    }

    pub fn count(&self) -> usize {
        self.items.len()
    }
}

fn first_text(seg: &str) -> String {
    let without_buttons = BUTTON.replace_all(seg, "\n");
    let text = TAG.replace_all(&without_buttons, "\n");
    text.lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .unwrap_or_default()
        .to_string()
}

pub fn count_label(n: usize) -> String {
    format!("{n} task{}", if n == 1 { "" } else { "s" })
}

#[derive(Debug, Clone)]
pub struct TaskApi {
    client: reqwest::Client,
    base: String,
}

impl TaskApi {
    pub fn new(client: reqwest::Client, base: &str) -> Result<Self, TaskError> {
        // validate once up front
        endpoint(base, TASKS_PATH)?;
        Ok(Self {
            client,
            base: base.to_string(),
        })
    }

    fn url(&self, path: &str) -> Result<Url, TaskError> {
        Ok(endpoint(&self.base, path)?)
    }

    pub async fn send(&self, req: &TaskRequest) -> Result<(u16, TaskList), TaskError> {
        let builder = match req {
            TaskRequest::Refresh => self.client.get(self.url(TASKS_PATH)?),
            TaskRequest::Add(title) => self
                .client
                .post(self.url(TASKS_PATH)?)
                .form(&[("title", title.as_str())]),
            TaskRequest::Complete(id) => self
                .client
                .put(self.url(&format!("{TASKS_PATH}/{id}/complete"))?),
            TaskRequest::Delete(id) => self.client.delete(self.url(&format!("{TASKS_PATH}/{id}"))?),
        };
        let resp = builder.send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(TaskError::Status(status));
        }
        let html = resp.text().await?;
        Ok((status.as_u16(), TaskList::parse(&html)))
    }

    pub async fn fetch_list(&self) -> Result<TaskList, TaskError> {
        self.send(&TaskRequest::Refresh).await.map(|(_, l)| l)
    }
}
