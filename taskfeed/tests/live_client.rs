//! LiveUpdateClient behaviour against a scripted transport.
use std::sync::{Arc, Mutex};

use chrono::Local;
use taskfeed::client::{ChannelState, Dispatch, LiveUpdateClient, PUMP_BATCH, RECONNECT_DELAY};
use taskfeed::dashboard::{Dashboard, Emphasis, MetricsDisplay, Panels, RenderError};
use taskfeed::feed::{format_time_of_day, FeedEntry, DEFAULT_TIME_FORMAT, FEED_CAPACITY};
use taskfeed::transport::{ChannelEvent, ChannelHandle, EventSink, Transport};
use tokio::time::{advance, Duration};

#[derive(Clone, Default)]
struct FakeTransport {
    sinks: Arc<Mutex<Vec<EventSink>>>,
}

impl FakeTransport {
    fn opened(&self) -> usize {
        self.sinks.lock().unwrap().len()
    }

    fn sink(&self, n: usize) -> EventSink {
        self.sinks.lock().unwrap()[n].clone()
    }

    fn latest(&self) -> EventSink {
        self.sinks.lock().unwrap().last().cloned().expect("a channel")
    }
}

impl Transport for FakeTransport {
    fn open(&self, sink: EventSink) -> ChannelHandle {
        let id = sink.id();
        self.sinks.lock().unwrap().push(sink);
        ChannelHandle::new(id, None)
    }
}

type Snapshot = (Vec<FeedEntry>, bool, Option<MetricsDisplay>, Option<Option<bool>>);

fn snapshot(d: &Dashboard) -> Snapshot {
    let feed = d.feed.as_ref().unwrap();
    (
        feed.entries().cloned().collect(),
        feed.has_placeholder(),
        d.metrics.clone(),
        d.status.map(|s| s.connected()),
    )
}

fn started() -> (FakeTransport, LiveUpdateClient<FakeTransport>, Dashboard) {
    let fake = FakeTransport::default();
    let mut client = LiveUpdateClient::new(fake.clone());
    client.start();
    (fake, client, Dashboard::default())
}

fn activity(msg: &str) -> String {
    format!(
        r#"{{"type":"activity","data":{{"message":"{msg}","timestamp":"2024-01-01T10:00:00Z"}}}}"#
    )
}

#[test]
fn start_opens_one_channel_in_connecting_state() {
    let (fake, client, _) = started();
    assert_eq!(fake.opened(), 1);
    assert_eq!(client.state(), ChannelState::Connecting);
    assert_eq!(client.channel_id(), Some(fake.sink(0).id()));
}

#[tokio::test]
async fn opened_sets_indicator_connected() {
    let (fake, mut client, mut view) = started();
    fake.latest().send(ChannelEvent::Opened);
    client.pump(&mut view);
    assert_eq!(client.state(), ChannelState::Open);
    assert_eq!(view.status.unwrap().label(), "Connected");
}

#[tokio::test]
async fn activity_message_renders_and_clears_placeholder() {
    let (fake, mut client, mut view) = started();
    assert!(view.feed.as_ref().unwrap().has_placeholder());
    fake.latest()
        .send(ChannelEvent::Message(activity("Task X completed")));
    client.pump(&mut view);

    let feed = view.feed.as_ref().unwrap();
    assert!(!feed.has_placeholder());
    let first = feed.entries().next().unwrap();
    assert_eq!(first.message, "Task X completed");
    assert_eq!(
        first.time,
        format_time_of_day("2024-01-01T10:00:00Z", &Local, DEFAULT_TIME_FORMAT)
    );
    assert_ne!(first.time, "Invalid Date");
}

#[tokio::test]
async fn metrics_message_sets_values_and_emphasis() {
    let (fake, mut client, mut view) = started();
    fake.latest().send(ChannelEvent::Message(
        r#"{"type":"system_metrics","data":{"cpu_percent":92.3,"memory_percent":45.0}}"#.into(),
    ));
    client.pump(&mut view);

    let m = view.metrics.as_ref().unwrap();
    let cpu = m.cpu.as_ref().unwrap();
    let mem = m.memory.as_ref().unwrap();
    assert_eq!(cpu.text, "92.3%");
    assert_eq!(cpu.emphasis, Emphasis::Warning);
    assert_eq!(mem.text, "45.0%");
    assert_eq!(mem.emphasis, Emphasis::Normal);
}

#[test]
fn emphasis_is_independent_per_metric() {
    let (_, client, mut view) = started();
    client.handle_message(
        &mut view,
        r#"{"type":"system_metrics","data":{"cpu_percent":80.0,"memory_percent":80.5}}"#,
    );
    let m = view.metrics.as_ref().unwrap();
    assert_eq!(m.cpu.as_ref().unwrap().emphasis, Emphasis::Normal);
    assert_eq!(m.memory.as_ref().unwrap().emphasis, Emphasis::Warning);
}

#[test]
fn heartbeat_and_task_update_change_nothing() {
    let (_, client, mut view) = started();
    let before = snapshot(&view);
    for payload in [
        r#"{"type":"heartbeat","data":{}}"#,
        r#"{"type":"task_update","data":{"id":1}}"#,
    ] {
        assert!(matches!(
            client.handle_message(&mut view, payload),
            Dispatch::Handled(_)
        ));
    }
    assert_eq!(snapshot(&view), before);
}

#[test]
fn malformed_payload_is_dropped() {
    let (_, client, mut view) = started();
    let before = snapshot(&view);
    assert!(matches!(
        client.handle_message(&mut view, "not json at all"),
        Dispatch::Malformed
    ));
    assert_eq!(snapshot(&view), before);
}

#[test]
fn unknown_type_is_ignored() {
    let (_, client, mut view) = started();
    let before = snapshot(&view);
    match client.handle_message(&mut view, r#"{"type":"confetti","data":{}}"#) {
        Dispatch::Unrecognized(kind) => assert_eq!(kind, "confetti"),
        other => panic!("unexpected {other:?}"),
    }
    assert_eq!(snapshot(&view), before);
}

#[test]
fn eleven_activities_keep_latest_ten() {
    let (_, client, mut view) = started();
    for i in 1..=11 {
        client.handle_message(&mut view, &activity(&format!("event {i}")));
    }
    let msgs: Vec<String> = view
        .feed
        .as_ref()
        .unwrap()
        .entries()
        .map(|e| e.message.clone())
        .collect();
    assert_eq!(msgs.len(), FEED_CAPACITY);
    let expected: Vec<String> = (2..=11).rev().map(|i| format!("event {i}")).collect();
    assert_eq!(msgs, expected);
}

#[test]
fn feed_never_exceeds_capacity() {
    let (_, client, mut view) = started();
    for i in 0..57 {
        client.handle_message(&mut view, &activity(&format!("e{i}")));
        assert!(view.feed.as_ref().unwrap().len() <= FEED_CAPACITY);
    }
}

#[test]
fn metrics_without_target_fail_softly() {
    let fake = FakeTransport::default();
    let client = LiveUpdateClient::new(fake);
    let mut view = Dashboard::new(Panels {
        metrics: false,
        ..Panels::default()
    });
    let out = client.handle_message(
        &mut view,
        r#"{"type":"system_metrics","data":{"cpu_percent":1.0,"memory_percent":2.0}}"#,
    );
    assert!(matches!(
        out,
        Dispatch::Failed(_, RenderError::MissingTarget(_))
    ));
}

#[test]
fn activity_without_feed_fails_softly() {
    let fake = FakeTransport::default();
    let client = LiveUpdateClient::new(fake);
    let mut view = Dashboard::new(Panels {
        activity: false,
        ..Panels::default()
    });
    view.set_connected(true);
    let status_before = view.status;
    let metrics_before = view.metrics.clone();

    let out = client.handle_message(&mut view, &activity("Task X completed"));
    assert!(matches!(
        out,
        Dispatch::Failed(ref kind, RenderError::MissingTarget(_)) if kind == "activity"
    ));
    assert!(view.feed.is_none());
    assert_eq!(view.status, status_before);
    assert_eq!(view.metrics, metrics_before);

    // later messages still render
    let out = client.handle_message(
        &mut view,
        r#"{"type":"system_metrics","data":{"cpu_percent":10.0,"memory_percent":20.0}}"#,
    );
    assert!(matches!(out, Dispatch::Handled(_)));
    assert_eq!(
        view.metrics.as_ref().unwrap().cpu.as_ref().unwrap().text,
        "10.0%"
    );
}

#[tokio::test]
async fn pump_handles_a_bounded_batch() {
    let (fake, mut client, mut view) = started();
    let sink = fake.latest();
    for _ in 0..PUMP_BATCH + 44 {
        sink.send(ChannelEvent::Message(
            r#"{"type":"heartbeat","data":{}}"#.into(),
        ));
    }
    assert_eq!(client.pump(&mut view), PUMP_BATCH);
    assert_eq!(client.pump(&mut view), 44);
    assert_eq!(client.pump(&mut view), 0);
}

#[test]
fn metrics_with_missing_field_do_not_update() {
    let (_, client, mut view) = started();
    let out = client.handle_message(
        &mut view,
        r#"{"type":"system_metrics","data":{"cpu_percent":1.0}}"#,
    );
    assert!(matches!(out, Dispatch::Failed(_, RenderError::BadData { .. })));
    assert_eq!(view.metrics, Some(MetricsDisplay::default()));
}

#[tokio::test(start_paused = true)]
async fn error_schedules_exactly_one_reconnect_after_delay() {
    let (fake, mut client, mut view) = started();
    fake.latest().send(ChannelEvent::Opened);
    fake.latest().send(ChannelEvent::Error("boom".into()));
    client.pump(&mut view);

    assert_eq!(view.status.unwrap().label(), "Disconnected");
    assert_eq!(client.pending_reconnects(), 1);
    assert_eq!(client.state(), ChannelState::Connecting);

    advance(RECONNECT_DELAY - Duration::from_millis(1)).await;
    client.pump(&mut view);
    assert_eq!(fake.opened(), 1);

    advance(Duration::from_millis(1)).await;
    client.pump(&mut view);
    assert_eq!(fake.opened(), 2);
    assert_eq!(client.pending_reconnects(), 0);
    assert_eq!(client.channel_id(), Some(fake.sink(1).id()));

    // the new channel comes up normally
    fake.latest().send(ChannelEvent::Opened);
    client.pump(&mut view);
    assert_eq!(view.status.unwrap().label(), "Connected");
}

#[tokio::test(start_paused = true)]
async fn late_timer_opens_a_redundant_channel() {
    let (fake, mut client, mut view) = started();
    fake.latest().send(ChannelEvent::Error("first".into()));
    client.pump(&mut view);
    advance(Duration::from_secs(1)).await;
    fake.sink(0).send(ChannelEvent::Error("second".into()));
    client.pump(&mut view);
    assert_eq!(client.pending_reconnects(), 2);

    advance(Duration::from_secs(2)).await;
    client.pump(&mut view);
    assert_eq!(fake.opened(), 2);
    fake.latest().send(ChannelEvent::Opened);
    client.pump(&mut view);
    assert_eq!(client.state(), ChannelState::Open);

    // the second timer still fires and replaces the healthy channel
    advance(Duration::from_secs(1)).await;
    client.pump(&mut view);
    assert_eq!(fake.opened(), 3);
    assert_eq!(client.state(), ChannelState::Connecting);
}

#[tokio::test(start_paused = true)]
async fn events_from_abandoned_channel_do_not_reschedule() {
    let (fake, mut client, mut view) = started();
    let old = fake.latest();
    old.send(ChannelEvent::Error("boom".into()));
    client.pump(&mut view);
    advance(RECONNECT_DELAY).await;
    client.pump(&mut view);
    assert_eq!(fake.opened(), 2);

    old.send(ChannelEvent::Error("late".into()));
    old.send(ChannelEvent::Opened);
    client.pump(&mut view);
    assert_eq!(client.pending_reconnects(), 0);
    assert_eq!(view.status.unwrap().label(), "Disconnected");
}

#[tokio::test(start_paused = true)]
async fn next_waits_for_the_reconnect_timer() {
    let (fake, mut client, mut view) = started();
    fake.latest().send(ChannelEvent::Error("boom".into()));
    client.next(&mut view).await;
    assert_eq!(client.pending_reconnects(), 1);

    let before = tokio::time::Instant::now();
    client.next(&mut view).await;
    assert_eq!(fake.opened(), 2);
    assert!(tokio::time::Instant::now() - before >= RECONNECT_DELAY);
}

#[tokio::test(start_paused = true)]
async fn stop_closes_and_cancels_pending_work() {
    let (fake, mut client, mut view) = started();
    fake.latest().send(ChannelEvent::Error("boom".into()));
    client.pump(&mut view);
    client.stop();
    assert_eq!(client.state(), ChannelState::Closed);
    assert_eq!(client.channel_id(), None);
    assert_eq!(client.pending_reconnects(), 0);

    fake.sink(0).send(ChannelEvent::Message(activity("after close")));
    advance(RECONNECT_DELAY * 2).await;
    client.pump(&mut view);
    assert_eq!(fake.opened(), 1);
    assert!(view.feed.as_ref().unwrap().has_placeholder());
}
