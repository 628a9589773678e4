use std::time::{Duration, Instant};

use speech_panel::panel::{ChoiceList, Controls, StatusReporter, StatusTimeouts};
use speech_panel::tts::{EngineState, ErrorReason};

const TIMEOUTS: StatusTimeouts = StatusTimeouts {
    message: Duration::from_millis(2000),
    error: Duration::from_millis(5000),
};

#[test]
fn test_state_messages() {
    let now = Instant::now();
    let mut status = StatusReporter::new(TIMEOUTS);
    assert_eq!(None, status.message());

    status.on_state_changed(EngineState::Speaking, now);
    assert_eq!(Some("Speech started..."), status.message());
    assert_eq!(Some(now + TIMEOUTS.message), status.deadline());
    assert_eq!(
        Controls {
            pause: true,
            resume: false,
            stop: true,
        },
        status.controls()
    );

    status.on_state_changed(EngineState::Paused, now);
    assert_eq!(Some("Speech paused..."), status.message());
    assert_eq!(
        Controls {
            pause: false,
            resume: true,
            stop: true,
        },
        status.controls()
    );

    status.on_state_changed(EngineState::Ready, now);
    assert_eq!(Some("Speech stopped..."), status.message());
    assert_eq!(Controls::default(), status.controls());
}

#[test]
fn test_speaking_and_back_to_ready() {
    let now = Instant::now();
    let mut status = StatusReporter::new(TIMEOUTS);

    status.on_state_changed(EngineState::Ready, now);
    assert_eq!(Some("Speech stopped..."), status.message());
    assert_eq!(Controls::default(), status.controls());

    status.on_state_changed(EngineState::Speaking, now);
    assert_eq!(Some("Speech started..."), status.message());
    assert_eq!(
        Controls {
            pause: true,
            resume: false,
            stop: true,
        },
        status.controls()
    );

    status.on_state_changed(EngineState::Ready, now);
    assert_eq!(Some("Speech stopped..."), status.message());
    assert_eq!(Controls::default(), status.controls());
}

#[test]
fn test_error_state_uses_last_error() {
    let now = Instant::now();
    let mut status = StatusReporter::new(TIMEOUTS);

    status.on_state_changed(EngineState::Error, now);
    assert_eq!(Some(StatusReporter::UNKNOWN_ERROR), status.message());
    assert_eq!(Some(now + TIMEOUTS.error), status.deadline());

    status.on_error(ErrorReason::Playback, "audio device is gone", now);
    assert_eq!(Some("audio device is gone"), status.message());
    status.on_state_changed(EngineState::Ready, now);
    status.on_state_changed(EngineState::Error, now);
    assert_eq!(Some("audio device is gone"), status.message());
    assert_eq!(Some("audio device is gone"), status.last_error());
    assert_eq!(Controls::default(), status.controls());
}

#[test]
fn test_other_states_hide_the_message() {
    let now = Instant::now();
    let mut status = StatusReporter::default();
    status.on_state_changed(EngineState::Speaking, now);
    status.on_state_changed(EngineState::Synthesizing, now);
    assert_eq!(None, status.message());
    assert_eq!(None, status.deadline());
}

#[test]
fn test_messages_expire() {
    let start = Instant::now();
    let mut status = StatusReporter::new(TIMEOUTS);
    status.on_state_changed(EngineState::Speaking, start);

    assert!(!status.expire(start + Duration::from_millis(1999)));
    assert_eq!(Some("Speech started..."), status.message());

    // A new message restarts the timer.
    status.on_state_changed(EngineState::Ready, start + Duration::from_millis(1500));
    assert!(!status.expire(start + Duration::from_millis(2500)));
    assert!(status.expire(start + Duration::from_millis(3500)));
    assert_eq!(None, status.message());
    assert!(!status.expire(start + Duration::from_millis(9000)));
}

#[test]
fn test_blocked_selections_are_not_reported() {
    let mut list = ChoiceList::new();
    {
        let mut blocked = list.block_signals();
        blocked.push("one", 1);
        blocked.push("two", 2);
        blocked.select(1);
    }
    assert_eq!(Some(&2), list.current_value());
    assert!(list.take_changes().is_empty());

    assert!(list.select(0));
    assert!(list.select(0));
    assert!(!list.select(5));
    assert_eq!(vec![0], list.take_changes());
    assert_eq!(vec!["one", "two"], list.labels().collect::<Vec<_>>());
}

#[test]
fn test_nested_blockers_restore_the_outer_state() {
    let mut list = ChoiceList::new();
    list.push("a", 'a');
    list.push("b", 'b');
    list.take_changes();
    {
        let mut outer = list.block_signals();
        {
            let mut inner = outer.block_signals();
            inner.select(1);
        }
        outer.select(0);
    }
    assert!(list.take_changes().is_empty());

    list.clear();
    assert_eq!(None, list.current_index());
    list.push("c", 'c');
    assert_eq!(Some(0), list.current_index());
    assert_eq!(vec![0], list.take_changes());
}
