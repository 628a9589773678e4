use std::time::{Duration, Instant};

use crate::tts::{EngineState, ErrorReason};

/// How long status messages stay visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusTimeouts {
    /// For messages about state changes.
    pub message: Duration,
    /// For error messages.
    pub error: Duration,
}

impl Default for StatusTimeouts {
    fn default() -> Self {
        Self {
            message: Duration::from_millis(2000),
            error: Duration::from_millis(5000),
        }
    }
}

/// Which of the playback buttons are enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Controls {
    #[allow(missing_docs)]
    pub pause: bool,
    #[allow(missing_docs)]
    pub resume: bool,
    #[allow(missing_docs)]
    pub stop: bool,
}

impl Controls {
    fn for_state(state: EngineState) -> Self {
        Self {
            pause: state == EngineState::Speaking,
            resume: state == EngineState::Paused,
            stop: matches!(state, EngineState::Speaking | EngineState::Paused),
        }
    }
}

/// Turns engine state changes and errors into a transient status message and the enabled state
/// of the playback buttons.
///
/// Only one message is shown at a time. Every new message replaces the previous one and restarts
/// the timer that hides it.
#[derive(Debug, Clone)]
pub struct StatusReporter {
    timeouts: StatusTimeouts,
    message: Option<String>,
    deadline: Option<Instant>,
    last_error: Option<String>,
    controls: Controls,
}

impl StatusReporter {
    /// Fallback message for an error state that was not preceded by an error event.
    pub const UNKNOWN_ERROR: &'static str = "Speech error!";

    #[allow(missing_docs)]
    pub fn new(timeouts: StatusTimeouts) -> Self {
        Self {
            timeouts,
            message: None,
            deadline: None,
            last_error: None,
            controls: Controls::default(),
        }
    }

    /// The message currently shown, if any.
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// When the current message will be hidden.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    #[allow(missing_docs)]
    pub fn controls(&self) -> Controls {
        self.controls
    }

    /// The text of the most recent error event.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Reacts to the engine moving to another state.
    pub fn on_state_changed(&mut self, state: EngineState, now: Instant) {
        match state {
            EngineState::Speaking => self.show("Speech started...", self.timeouts.message, now),
            EngineState::Paused => self.show("Speech paused...", self.timeouts.message, now),
            EngineState::Ready => self.show("Speech stopped...", self.timeouts.message, now),
            EngineState::Error => {
                let message =
                    self.last_error.clone().unwrap_or_else(|| Self::UNKNOWN_ERROR.to_string());
                self.show(message, self.timeouts.error, now);
            }
            EngineState::Synthesizing => self.hide(),
        }
        self.controls = Controls::for_state(state);
    }

    /// Shows the error reported by the engine and remembers it for the error state that usually
    /// follows.
    pub fn on_error(&mut self, _reason: ErrorReason, message: &str, now: Instant) {
        self.last_error = Some(message.to_string());
        self.show(message, self.timeouts.error, now);
    }

    /// Hides the message if its time is up. Returns whether a message was hidden.
    pub fn expire(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if deadline <= now => {
                self.hide();
                true
            }
            _ => false,
        }
    }

    fn show<S: Into<String>>(&mut self, message: S, timeout: Duration, now: Instant) {
        self.message = Some(message.into());
        self.deadline = Some(now + timeout);
    }

    fn hide(&mut self) {
        self.message = None;
        self.deadline = None;
    }
}

impl Default for StatusReporter {
    fn default() -> Self {
        Self::new(StatusTimeouts::default())
    }
}
