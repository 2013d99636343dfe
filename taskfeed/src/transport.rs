//! Update channel transport: the `Transport` seam plus the SSE-over-HTTP implementation.

use std::{fs, path::Path};

use futures_util::StreamExt;
use reqwest::header::{ACCEPT, CACHE_CONTROL, CONTENT_TYPE};
use thiserror::Error;
use tokio::{sync::mpsc::UnboundedSender, task::JoinHandle};
use tracing::{debug, warn};
use url::Url;

use crate::sse::SseDecoder;

/// Path of the update stream, relative to the server base URL.
pub const EVENTS_PATH: &str = "/events";

pub type ChannelId = u64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelEvent {
    Opened,
    Message(String),
    Error(String),
}

/// Where a transport reports what happens on one channel.
#[derive(Debug, Clone)]
pub struct EventSink {
    id: ChannelId,
    tx: UnboundedSender<(ChannelId, ChannelEvent)>,
}

impl EventSink {
    pub fn new(id: ChannelId, tx: UnboundedSender<(ChannelId, ChannelEvent)>) -> Self {
        Self { id, tx }
    }

    pub fn id(&self) -> ChannelId {
        self.id
    }

    /// Returns false once the owning client is gone.
    pub fn send(&self, ev: ChannelEvent) -> bool {
        self.tx.send((self.id, ev)).is_ok()
    }
}

/// A live channel. Closing (or dropping) it stops the underlying connection.
#[derive(Debug)]
pub struct ChannelHandle {
    id: ChannelId,
    task: Option<JoinHandle<()>>,
}

impl ChannelHandle {
    pub fn new(id: ChannelId, task: Option<JoinHandle<()>>) -> Self {
        Self { id, task }
    }

    pub fn id(&self) -> ChannelId {
        self.id
    }

    pub fn close(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl Drop for ChannelHandle {
    fn drop(&mut self) {
        self.close();
    }
}

pub trait Transport {
    /// Open a channel; every event it produces goes to `sink`.
    fn open(&self, sink: EventSink) -> ChannelHandle;
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("invalid server url {0:?}: {1}")]
    Url(String, url::ParseError),
    #[error("reading CA certificate {path}: {source}")]
    CaRead {
        path: String,
        source: std::io::Error,
    },
    #[error("building http client: {0}")]
    Client(#[from] reqwest::Error),
}

/// Resolve a path against the server base URL.
pub fn endpoint(base: &str, path: &str) -> Result<Url, TransportError> {
    let parsed = Url::parse(base).map_err(|e| TransportError::Url(base.to_string(), e))?;
    parsed
        .join(path)
        .map_err(|e| TransportError::Url(base.to_string(), e))
}

/// Build the shared reqwest client, trusting an extra CA when given.
pub fn build_http_client(tls_ca: Option<&str>) -> Result<reqwest::Client, TransportError> {
    let mut builder = reqwest::Client::builder();
    if let Some(path) = tls_ca {
        let pem = fs::read(Path::new(path)).map_err(|source| TransportError::CaRead {
            path: path.to_string(),
            source,
        })?;
        builder = builder.add_root_certificate(reqwest::Certificate::from_pem(&pem)?);
    }
    Ok(builder.build()?)
}

#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    url: Url,
}

impl HttpTransport {
    pub fn new(client: reqwest::Client, base: &str) -> Result<Self, TransportError> {
        Ok(Self {
            client,
            url: endpoint(base, EVENTS_PATH)?,
        })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }
}

impl Transport for HttpTransport {
    fn open(&self, sink: EventSink) -> ChannelHandle {
        let id = sink.id();
        let client = self.client.clone();
        let url = self.url.clone();
        let task = tokio::spawn(async move {
            let reason = stream_events(&client, &url, &sink).await;
            sink.send(ChannelEvent::Error(reason));
        });
        ChannelHandle::new(id, Some(task))
    }
}

// Runs one connection to completion. Returns why it ended; a stream
// ending is an error too, since the server never closes it on purpose.
async fn stream_events(client: &reqwest::Client, url: &Url, sink: &EventSink) -> String {
    let resp = match client
        .get(url.clone())
        .header(ACCEPT, "text/event-stream")
        .header(CACHE_CONTROL, "no-cache")
        .send()
        .await
    {
        Ok(r) => r,
        Err(e) => return format!("connect: {e}"),
    };

    if !resp.status().is_success() {
        return format!("unexpected status {}", resp.status());
    }
    let is_stream = resp
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.starts_with("text/event-stream"))
        .unwrap_or(false);
    if !is_stream {
        return "response is not text/event-stream".into();
    }

    if !sink.send(ChannelEvent::Opened) {
        return "client gone".into();
    }

    let mut decoder = SseDecoder::new();
    let mut body = resp.bytes_stream();
    while let Some(chunk) = body.next().await {
        let chunk = match chunk {
            Ok(c) => c,
            Err(e) => {
                warn!(channel = sink.id(), "update stream read failed: {e}");
                return format!("read: {e}");
            }
        };
        for ev in decoder.push(&chunk) {
            if !ev.is_message() {
                debug!(channel = sink.id(), event = %ev.event, "ignoring named event");
                continue;
            }
            if !sink.send(ChannelEvent::Message(ev.data)) {
                return "client gone".into();
            }
        }
    }
    "stream ended".into()
}
