mod common;

use std::thread;
use std::time::{Duration, Instant};

use common::RecordingHost;
use softinput_core::{
    session_channel, BeginSessionInfo, ChannelConsumer, Config, EditorAction, FieldKind,
    InputType, InputView, ProducerEvent,
};

/// Poll `done` until it holds, failing the test after a few seconds.
fn wait_until(mut done: impl FnMut() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while !done() {
        assert!(Instant::now() < deadline, "timed out waiting for the UI thread");
        thread::sleep(Duration::from_millis(1));
    }
}

#[test]
fn test_producer_drives_session_from_another_thread() {
    let (requester, dispatcher) = session_channel();
    let (consumer, events) = ChannelConsumer::channel();

    let producer = thread::spawn(move || {
        requester.open_session("12", FieldKind::UnsignedInteger);
        let mut mirror = String::from("12");

        let session = match events.recv().unwrap() {
            ProducerEvent::SessionOpened {
                session,
                field_kind,
            } => {
                assert_eq!(field_kind, FieldKind::UnsignedInteger);
                session
            }
            other => panic!("unexpected event {other:?}"),
        };

        loop {
            match events.recv().unwrap() {
                ProducerEvent::EditBatchDelivered { session: s, batch } => {
                    assert_eq!(s, session);
                    batch.apply_to(&mut mirror).unwrap();
                }
                ProducerEvent::SessionEnded { session: s } => {
                    assert_eq!(s, session);
                    break;
                }
                other => panic!("unexpected event {other:?}"),
            }
        }

        requester.close_session();
        mirror
    });

    let mut view = InputView::new(RecordingHost::default(), consumer, Config::default());
    wait_until(|| {
        dispatcher.drain_into(&mut view);
        view.controller().is_open()
    });

    let controller = view.controller_mut();
    controller.commit_text("3a4", 1).unwrap();
    controller.perform_editor_action(EditorAction::Done).unwrap();

    wait_until(|| {
        dispatcher.drain_into(&mut view);
        !view.controller().is_open()
    });

    let mirror = producer.join().unwrap();
    assert_eq!(mirror, "1234");
    assert_eq!(view.controller().host().focus_requests, 1);
    assert_eq!(view.controller().host().focus_releases, 1);
}

#[test]
fn test_commands_drain_in_send_order() {
    let (requester, dispatcher) = session_channel();
    let (consumer, events) = ChannelConsumer::channel();
    let mut view = InputView::new(RecordingHost::default(), consumer, Config::default());

    let other = requester.clone();
    thread::spawn(move || {
        other.open_session("a", FieldKind::Text);
        other.open_session("1.5", FieldKind::Float);
        other.close_session();
    })
    .join()
    .unwrap();

    assert_eq!(dispatcher.drain_into(&mut view), 3);
    assert!(!view.controller().is_open());

    let kinds: Vec<FieldKind> = events
        .try_iter()
        .filter_map(|event| match event {
            ProducerEvent::SessionOpened { field_kind, .. } => Some(field_kind),
            _ => None,
        })
        .collect();
    assert_eq!(kinds, vec![FieldKind::Text, FieldKind::Float]);
    assert_eq!(view.controller().host().focus_releases, 2);
}

#[test]
fn test_bad_wire_kind_is_refused_before_sending() {
    let (requester, dispatcher) = session_channel();
    let (consumer, _events) = ChannelConsumer::channel();
    let mut view = InputView::new(RecordingHost::default(), consumer, Config::default());

    assert!(requester.open_session_raw("x", 42).is_err());
    assert_eq!(dispatcher.drain_into(&mut view), 0);
    assert!(!view.controller().is_open());
}

#[test]
fn test_connection_requests_reuse_live_session() {
    let (consumer, _events) = ChannelConsumer::channel();
    let mut view = InputView::new(RecordingHost::default(), consumer, Config::default());
    assert_eq!(view.on_create_input_connection(), None);

    view.begin_input_session(BeginSessionInfo::new("12", FieldKind::UnsignedInteger))
        .unwrap();
    let first = view.on_create_input_connection().unwrap();
    let second = view.on_create_input_connection().unwrap();
    assert_eq!(first, second);
    assert_eq!(first.input_type, InputType::UnsignedNumber);
    assert_eq!((first.initial_sel_start, first.initial_sel_end), (2, 2));
    assert_eq!(first.ime_action, EditorAction::Done);
    assert_eq!(first.hint_locale, "en");

    assert!(view.end_input_session().is_some());
    assert_eq!(view.on_create_input_connection(), None);
    assert!(view.end_input_session().is_none());
}
