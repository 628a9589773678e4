//! Speech engines and the contract the panel uses to talk to them.
//!
//! An [`Engine`] is a live connection to one speech synthesizer. A [`Backend`] knows which
//! engines are installed and constructs handles for them. Engines report what they are doing
//! through [`EngineEvent`]s delivered to the [`EventHandler`] they were subscribed with.

use std::fmt::{self, Display};
use std::str::FromStr;

use crate::{Locale, Result};

mod espeak;
mod event;
mod markup;
pub mod memory;
mod platform;
#[cfg(windows)]
mod sapi;
mod types;
mod voice;

pub use self::espeak::EspeakEngine;
pub use self::event::{EngineEvent, EngineState, ErrorReason, EventHandler};
pub use self::markup::SpeechMarkup;
pub use self::platform::PlatformBackend;
#[cfg(windows)]
#[cfg_attr(docsrs, doc(cfg(windows)))]
pub use self::sapi::SapiEngine;
pub use self::types::{BoundaryHint, Pitch, Rate, Volume};
pub use self::voice::{Voice, VoiceAge, VoiceGender};

/// Names an engine to construct.
#[derive(Debug, Hash, PartialEq, Eq, Clone, Default)]
pub enum EngineId {
    /// Let the platform choose.
    #[default]
    Default,
    /// An engine listed by [`Backend::available_engines`].
    Named(String),
}

impl EngineId {
    /// The sentinel name of the platform default engine.
    pub const DEFAULT: &'static str = "default";

    /// The name under which the engine is listed.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Default => Self::DEFAULT,
            Self::Named(name) => name,
        }
    }
}

impl From<&str> for EngineId {
    fn from(name: &str) -> Self {
        if name.is_empty() || name.eq_ignore_ascii_case(Self::DEFAULT) {
            Self::Default
        } else {
            Self::Named(name.to_string())
        }
    }
}

impl FromStr for EngineId {
    type Err = std::convert::Infallible;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(s.into())
    }
}

impl Display for EngineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A live connection to one speech synthesizer.
///
/// Queries return what the engine currently offers and never fail; an engine that can't answer
/// returns an empty list. Commands return an error if the engine rejected them.
///
/// Speech is asynchronous: [`say`](Engine::say) returns as soon as the utterance has been handed
/// to the synthesizer, and completion is reported by a [`EngineEvent::StateChanged`] event.
pub trait Engine {
    /// The name under which the engine is listed.
    fn name(&self) -> &str;

    /// What the engine is currently doing.
    fn state(&self) -> EngineState;

    /// The locales the engine can speak.
    fn available_locales(&self) -> Vec<Locale>;

    /// The locale the engine currently speaks, if any.
    fn locale(&self) -> Option<Locale>;

    /// Switches the engine to the given locale. On success the engine emits
    /// [`EngineEvent::LocaleChanged`].
    fn set_locale(&mut self, locale: &Locale) -> Result<()>;

    /// The voices the engine offers for its current locale.
    fn available_voices(&self) -> Vec<Voice>;

    /// The voice the engine currently speaks with, if any.
    fn voice(&self) -> Option<Voice>;

    /// Switches the engine to the given voice.
    fn set_voice(&mut self, voice: &Voice) -> Result<()>;

    /// Sets the rate of speech.
    fn set_rate(&mut self, rate: Rate) -> Result<()>;

    /// Sets the voice pitch.
    fn set_pitch(&mut self, pitch: Pitch) -> Result<()>;

    /// Sets the speech volume.
    fn set_volume(&mut self, volume: Volume) -> Result<()>;

    /// Starts speaking the given text.
    fn say(&mut self, text: &str) -> Result<()>;

    /// Stops speaking and discards the rest of the utterance.
    fn stop(&mut self, hint: BoundaryHint) -> Result<()>;

    /// Pauses the utterance being spoken.
    fn pause(&mut self, hint: BoundaryHint) -> Result<()>;

    /// Resumes a paused utterance.
    fn resume(&mut self) -> Result<()>;

    /// Installs the handler to call for every event the engine emits, replacing any previous one.
    fn subscribe(&mut self, handler: Box<dyn EventHandler>);

    /// Removes the event handler. The engine emits no events after this returns.
    fn unsubscribe(&mut self);

    /// Gives engines that have to poll their synthesizer a chance to emit pending events.
    fn pump(&mut self) {}
}

/// Lists and constructs speech engines.
pub trait Backend {
    /// The names of the engines that can be constructed, not including
    /// [`EngineId::DEFAULT`].
    fn available_engines(&self) -> Vec<String>;

    /// Constructs a new handle for the given engine.
    fn create(&self, id: &EngineId) -> Result<Box<dyn Engine>>;
}

/// The handle that stands in for an engine that could not be constructed.
///
/// It offers no locales or voices, and ignores every command.
#[derive(Debug, Clone)]
pub struct UnusableEngine {
    name: String,
}

impl UnusableEngine {
    /// Creates the stand-in for the named engine.
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
        }
    }
}

impl Engine for UnusableEngine {
    fn name(&self) -> &str {
        &self.name
    }

    fn state(&self) -> EngineState {
        EngineState::Error
    }

    fn available_locales(&self) -> Vec<Locale> {
        Vec::new()
    }

    fn locale(&self) -> Option<Locale> {
        None
    }

    fn set_locale(&mut self, _locale: &Locale) -> Result<()> {
        Ok(())
    }

    fn available_voices(&self) -> Vec<Voice> {
        Vec::new()
    }

    fn voice(&self) -> Option<Voice> {
        None
    }

    fn set_voice(&mut self, _voice: &Voice) -> Result<()> {
        Ok(())
    }

    fn set_rate(&mut self, _rate: Rate) -> Result<()> {
        Ok(())
    }

    fn set_pitch(&mut self, _pitch: Pitch) -> Result<()> {
        Ok(())
    }

    fn set_volume(&mut self, _volume: Volume) -> Result<()> {
        Ok(())
    }

    fn say(&mut self, _text: &str) -> Result<()> {
        Ok(())
    }

    fn stop(&mut self, _hint: BoundaryHint) -> Result<()> {
        Ok(())
    }

    fn pause(&mut self, _hint: BoundaryHint) -> Result<()> {
        Ok(())
    }

    fn resume(&mut self) -> Result<()> {
        Ok(())
    }

    fn subscribe(&mut self, _handler: Box<dyn EventHandler>) {}

    fn unsubscribe(&mut self) {}
}
