//! Live update client: owns the update channel, reconnects after errors and
//! dispatches each message to the dashboard through a handler table.

use std::collections::{HashMap, VecDeque};

use serde_json::Value;
use tokio::{
    sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender},
    time::{sleep_until, Duration, Instant},
};
use tracing::{debug, error, info, warn};

use crate::dashboard::{Dashboard, RenderError};
use crate::transport::{ChannelEvent, ChannelHandle, ChannelId, EventSink, Transport};
use crate::types::{Activity, Envelope, SystemMetrics};

pub const RECONNECT_DELAY: Duration = Duration::from_secs(3);
/// Most events one `pump` call handles before yielding back to the UI loop.
pub const PUMP_BATCH: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    /// Not started yet.
    Idle,
    Connecting,
    Open,
    Closed,
}

pub type Handler = fn(&mut Dashboard, Value) -> Result<(), RenderError>;

/// Message `type` → handler.
pub struct HandlerTable {
    routes: HashMap<&'static str, Handler>,
}

impl HandlerTable {
    pub fn empty() -> Self {
        Self {
            routes: HashMap::new(),
        }
    }

    pub fn standard() -> Self {
        let mut t = Self::empty();
        t.insert("activity", on_activity);
        t.insert("system_metrics", on_system_metrics);
        // the task list refreshes through its own requests, not this channel
        t.insert("task_update", ignore);
        t.insert("heartbeat", ignore);
        t
    }

    pub fn insert(&mut self, kind: &'static str, handler: Handler) {
        self.routes.insert(kind, handler);
    }

    pub fn get(&self, kind: &str) -> Option<Handler> {
        self.routes.get(kind).copied()
    }
}

impl Default for HandlerTable {
    fn default() -> Self {
        Self::standard()
    }
}

fn on_activity(view: &mut Dashboard, data: Value) -> Result<(), RenderError> {
    let a: Activity = serde_json::from_value(data).map_err(|source| RenderError::BadData {
        kind: "activity",
        source,
    })?;
    view.render_activity(&a)
}

fn on_system_metrics(view: &mut Dashboard, data: Value) -> Result<(), RenderError> {
    let m: SystemMetrics = serde_json::from_value(data).map_err(|source| RenderError::BadData {
        kind: "system_metrics",
        source,
    })?;
    view.render_metrics(&m)
}

fn ignore(_: &mut Dashboard, _: Value) -> Result<(), RenderError> {
    Ok(())
}

/// What became of one inbound message.
#[derive(Debug)]
pub enum Dispatch {
    Handled(String),
    Malformed,
    Unrecognized(String),
    Failed(String, RenderError),
}

pub struct LiveUpdateClient<T: Transport> {
    transport: T,
    handlers: HandlerTable,
    tx: UnboundedSender<(ChannelId, ChannelEvent)>,
    rx: UnboundedReceiver<(ChannelId, ChannelEvent)>,
    channel: Option<ChannelHandle>,
    state: ChannelState,
    next_id: ChannelId,
    // fire times of scheduled reconnects, oldest first; never cancelled
    reconnects: VecDeque<Instant>,
    reconnect_delay: Duration,
}

impl<T: Transport> LiveUpdateClient<T> {
    pub fn new(transport: T) -> Self {
        Self::with_handlers(transport, HandlerTable::standard())
    }

    pub fn with_handlers(transport: T, handlers: HandlerTable) -> Self {
        let (tx, rx) = unbounded_channel();
        Self {
            transport,
            handlers,
            tx,
            rx,
            channel: None,
            state: ChannelState::Idle,
            next_id: 0,
            reconnects: VecDeque::new(),
            reconnect_delay: RECONNECT_DELAY,
        }
    }

    pub fn state(&self) -> ChannelState {
        self.state
    }

    pub fn channel_id(&self) -> Option<ChannelId> {
        self.channel.as_ref().map(|c| c.id())
    }

    pub fn pending_reconnects(&self) -> usize {
        self.reconnects.len()
    }

    /// Open a fresh channel, abandoning the previous one.
    pub fn start(&mut self) {
        self.next_id += 1;
        let id = self.next_id;
        let sink = EventSink::new(id, self.tx.clone());
        let handle = self.transport.open(sink);
        if let Some(mut old) = self.channel.replace(handle) {
            debug!(old = old.id(), new = id, "replacing update channel");
            old.close();
        }
        self.state = ChannelState::Connecting;
        info!(channel = id, "opening update channel");
    }

    /// Close the channel for good; pending reconnects die with it.
    pub fn stop(&mut self) {
        if let Some(mut ch) = self.channel.take() {
            ch.close();
        }
        self.reconnects.clear();
        self.state = ChannelState::Closed;
        info!("update channel closed");
    }

    /// Handle what is ready right now without waiting, at most `PUMP_BATCH`.
    pub fn pump(&mut self, view: &mut Dashboard) -> usize {
        let mut n = 0;
        while n < PUMP_BATCH {
            if self.fire_due_reconnect() {
                n += 1;
                continue;
            }
            match self.rx.try_recv() {
                Ok((id, ev)) => {
                    self.handle_event(view, id, ev);
                    n += 1;
                }
                Err(_) => break,
            }
        }
        n
    }

    /// Wait for the next channel event or reconnect timer and handle it.
    pub async fn next(&mut self, view: &mut Dashboard) {
        let deadline = self.reconnects.front().copied();
        let timer = async move {
            match deadline {
                Some(at) => sleep_until(at).await,
                None => std::future::pending::<()>().await,
            }
        };
        tokio::select! {
            Some((id, ev)) = self.rx.recv() => self.handle_event(view, id, ev),
            _ = timer => {
                self.fire_due_reconnect();
            }
        }
    }

    fn fire_due_reconnect(&mut self) -> bool {
        match self.reconnects.front() {
            Some(at) if *at <= Instant::now() => {
                self.reconnects.pop_front();
                if self.state == ChannelState::Closed {
                    return true;
                }
                info!("reconnecting update channel");
                self.start();
                true
            }
            _ => false,
        }
    }

    pub fn handle_event(&mut self, view: &mut Dashboard, id: ChannelId, ev: ChannelEvent) {
        if self.state == ChannelState::Closed {
            return;
        }
        let current = self.channel_id() == Some(id);
        match ev {
            ChannelEvent::Opened if current => {
                self.state = ChannelState::Open;
                view.set_connected(true);
            }
            ChannelEvent::Error(reason) if current => {
                error!(channel = id, "update channel error: {reason}");
                self.state = ChannelState::Connecting;
                view.set_connected(false);
                self.reconnects.push_back(Instant::now() + self.reconnect_delay);
            }
            // a replaced channel's queued messages still count as delivered
            ChannelEvent::Message(payload) => {
                self.handle_message(view, &payload);
            }
            other => debug!(channel = id, ?other, "event from abandoned channel"),
        }
    }

    pub fn handle_message(&self, view: &mut Dashboard, payload: &str) -> Dispatch {
        let env = match Envelope::parse(payload) {
            Ok(e) => e,
            Err(_) => {
                warn!("received non-JSON message: {payload}");
                return Dispatch::Malformed;
            }
        };
        debug!(kind = %env.kind, "received update");
        let Some(handler) = self.handlers.get(&env.kind) else {
            info!(kind = %env.kind, "unknown event type");
            return Dispatch::Unrecognized(env.kind);
        };
        match handler(view, env.data) {
            Ok(()) => Dispatch::Handled(env.kind),
            Err(e) => {
                error!(kind = %env.kind, "{e}");
                Dispatch::Failed(env.kind, e)
            }
        }
    }
}
