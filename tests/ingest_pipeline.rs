//! End-to-end tests of the ingestion pipeline over scripted sources.
//!
//! These drive the full read -> frame -> parse -> dispatch path without a
//! real collection process, exercising discovery, ordering, and the
//! lossy-drop policy for malformed lines.

use std::sync::Arc;

use futures::StreamExt;
use gpuwatch::{FieldSchema, MonitorError, MonitorEvent, ScriptedSource, Session};

fn test_schema() -> Arc<FieldSchema> {
    init_tracing();
    Arc::new(FieldSchema::new(["index", "name", "memory.used", "memory.total"]).unwrap())
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn session_over(chunks: Vec<&'static [u8]>) -> Session {
    Session::with_source(ScriptedSource::new(chunks), test_schema())
}

#[tokio::test]
async fn discovery_across_chunks_split_mid_line() {
    // Two devices, second line split across the chunk boundary
    let mut session =
        session_over(vec![&b"0, Card A, 500, 8000\n1, Card B,"[..], &b" 200, 4000\n"[..]]);

    match session.next().await.unwrap() {
        MonitorEvent::DeviceRegistered { slot, record } => {
            assert_eq!(slot, 0);
            assert_eq!(record.get("index"), Some("0"));
            assert_eq!(record.get("name"), Some("Card A"));
            assert_eq!(record.get("memory.used"), Some("500"));
        }
        other => panic!("expected first registration, got {other:?}"),
    }

    match session.next().await.unwrap() {
        MonitorEvent::DeviceRegistered { slot, record } => {
            assert_eq!(slot, 1);
            assert_eq!(record.get("index"), Some("1"));
            assert_eq!(record.get("memory.total"), Some("4000"));
        }
        other => panic!("expected second registration, got {other:?}"),
    }
}

#[tokio::test]
async fn second_tick_updates_without_reregistering() {
    let mut session = session_over(vec![
        &b"0, Card A, 500, 8000\n1, Card B, 200, 4000\n"[..],
        &b"0, Card A, 600, 8000\n"[..],
    ]);

    assert!(session.next().await.unwrap().is_registration());
    assert!(session.next().await.unwrap().is_registration());

    match session.next().await.unwrap() {
        MonitorEvent::DeviceUpdated { slot, record } => {
            assert_eq!(slot, 0);
            assert_eq!(record.get("memory.used"), Some("600"));
            assert_eq!(record.memory_percent(), 7);
        }
        other => panic!("expected update for slot 0, got {other:?}"),
    }
}

#[tokio::test]
async fn malformed_index_is_dropped_without_event() {
    let mut session = session_over(vec![
        &b"garbage,,,\n"[..],
        &b"0, Card A, 500, 8000\n"[..],
    ]);

    // The garbage line produces nothing; the next event is the first
    // registration, still at slot 0.
    match session.next().await.unwrap() {
        MonitorEvent::DeviceRegistered { slot, record } => {
            assert_eq!(slot, 0);
            assert_eq!(record.get("name"), Some("Card A"));
        }
        other => panic!("expected registration at slot 0, got {other:?}"),
    }
}

#[tokio::test]
async fn stream_end_without_shutdown_yields_one_closed_event() {
    let mut session = session_over(vec![]);

    match session.next().await.unwrap() {
        MonitorEvent::Closed { error } => {
            assert!(matches!(error, MonitorError::StreamClosed { .. }));
        }
        other => panic!("expected closed event, got {other:?}"),
    }

    // Exactly one terminal notification, then the stream ends.
    assert!(session.next().await.is_none());
}

#[tokio::test]
async fn registration_precedes_updates_and_slots_stay_stable() {
    // Indices appear out of numeric order; slots follow discovery order.
    let mut session = session_over(vec![
        &b"2, Card C, 1, 10\n0, Card A, 2, 10\n2, Card C, 3, 10\n0, Card A, 4, 10\n2, Card C, 5, 10\n"[..],
    ]);

    let mut registered_slots = Vec::new();
    let mut events = Vec::new();
    while let Some(event) = session.next().await {
        if event.is_closed() {
            break;
        }
        if event.is_registration() {
            registered_slots.push(event.slot().unwrap());
        } else {
            // Ordering law: an update may only address a registered slot
            assert!(
                registered_slots.contains(&event.slot().unwrap()),
                "update for slot {} before its registration",
                event.slot().unwrap()
            );
        }
        events.push((event.is_registration(), event.slot().unwrap()));
    }

    // Device 2 discovered first -> slot 0; device 0 -> slot 1
    assert_eq!(registered_slots, vec![0, 1]);
    assert_eq!(
        events,
        vec![(true, 0), (true, 1), (false, 0), (false, 1), (false, 0)]
    );
}

#[tokio::test]
async fn blank_separator_lines_produce_no_events() {
    let mut session = session_over(vec![&b"\n\n0, Card A, 500, 8000\n\n"[..]]);

    assert!(session.next().await.unwrap().is_registration());
    // Next event is the terminal close, not anything from the blanks.
    assert!(session.next().await.unwrap().is_closed());
}

#[tokio::test]
async fn slow_consumer_sees_every_event_in_order() {
    // More lines than the channel capacity, consumed with a delay: the
    // dispatcher must block rather than drop or reorder.
    let mut payload = String::new();
    for tick in 0..100 {
        payload.push_str(&format!("0, Card A, {tick}, 8000\n1, Card B, {tick}, 4000\n"));
    }
    let chunks: Vec<Vec<u8>> = vec![payload.into_bytes()];
    let mut session = Session::with_source(ScriptedSource::new(chunks), test_schema());

    let mut seen = Vec::new();
    while let Some(event) = session.next().await {
        if event.is_closed() {
            break;
        }
        if seen.len() % 10 == 0 {
            tokio::time::sleep(std::time::Duration::from_millis(2)).await;
        }
        let used = event.record().unwrap().get("memory.used").unwrap().to_string();
        seen.push((event.slot().unwrap(), used));
    }

    assert_eq!(seen.len(), 200);
    for (i, (slot, used)) in seen.iter().enumerate() {
        assert_eq!(*slot, i % 2);
        assert_eq!(used, &format!("{}", i / 2));
    }
}

#[tokio::test]
async fn shutdown_wins_over_a_ready_chunk() {
    // Data is immediately available, but shutdown is requested before the
    // ingest task gets to run: nothing may be dispatched once the request
    // is observable.
    let mut session = session_over(vec![&b"0, Card A, 500, 8000\n"[..]]);

    session.shutdown().await;
    assert!(session.next().await.is_none());
}

#[tokio::test]
async fn shutdown_before_any_device_is_safe_and_idempotent() {
    // One chunk held behind a long pace keeps the read pending forever.
    let mut session = Session::with_source(
        ScriptedSource::new(vec![&b"0, Card A, 1, 10\n"[..]])
            .paced(std::time::Duration::from_secs(60)),
        test_schema(),
    );

    assert!(!session.is_shutdown());
    session.shutdown().await;
    assert!(session.is_shutdown());
    // Idempotent: a second request is a no-op.
    session.shutdown().await;

    // No events were dispatched after the request.
    assert!(session.next().await.is_none());
}
