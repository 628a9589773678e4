use strum_macros::{Display, IntoStaticStr};

use crate::Locale;

/// What the engine is currently doing.
#[derive(Debug, Hash, PartialEq, Eq, Clone, Copy, Default, Display, IntoStaticStr)]
pub enum EngineState {
    /// Idle and ready to speak.
    #[default]
    Ready,
    /// Speaking an utterance.
    Speaking,
    /// Paused in the middle of an utterance.
    Paused,
    /// Rendering speech without playing it, e.g. to a file.
    Synthesizing,
    /// The engine failed; an [`EngineEvent::ErrorOccurred`] carries the details.
    Error,
}

/// Which stage of speech synthesis an error belongs to.
#[derive(Debug, Hash, PartialEq, Eq, Clone, Copy, Display, IntoStaticStr)]
pub enum ErrorReason {
    /// The engine could not be set up.
    Initialization,
    /// The engine rejected a setting, such as a locale or a voice.
    Configuration,
    /// The text could not be processed.
    Input,
    /// The audio could not be rendered or played.
    Playback,
}

/// A notification emitted by an engine handle.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    /// The engine moved to another state.
    StateChanged(EngineState),
    /// The engine switched to another locale, either on request or on its own.
    LocaleChanged(Locale),
    /// The engine failed. It usually moves to [`EngineState::Error`] right after.
    ErrorOccurred {
        #[allow(missing_docs)]
        reason: ErrorReason,
        /// Human-readable description of the failure.
        message: String,
    },
}

/// The handler an engine calls for every event it emits.
///
/// Engines may call the handler from the thread that drives them or from a thread of their own,
/// and they may call it while one of their methods is still running. Handlers should queue the
/// event and return rather than act on the engine.
pub trait EventHandler: Send {
    /// Called when the engine emits an event.
    fn on_event(&self, event: EngineEvent);
}

impl<F: Fn(EngineEvent) + Send> EventHandler for F {
    fn on_event(&self, event: EngineEvent) {
        self(event)
    }
}
