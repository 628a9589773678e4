#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! A small text-to-speech control panel.
//!
//! # Features
//!
//! The panel lets a user type some text, pick a speech engine, a locale and a voice, tune the
//! rate, pitch and volume of the speech, and play it through the speech synthesis subsystem of the
//! operating system. The synthesis itself is delegated to a speech engine; this crate is concerned
//! with keeping the user's choices consistent with what the engine actually does.
//!
//! ## Speech engines
//!
//! The [tts] module defines the contract every speech engine implements: the [`Engine`] handle
//! and the [`Backend`] that lists and constructs engines. Two platform engines are provided:
//! Microsoft SAPI on Windows and the `espeak-ng` command line synthesizer everywhere else. The
//! in-memory engine in [`tts::memory`] implements the same contract without producing any sound.
//!
//! ## Selection reconciliation
//!
//! The [panel] module keeps three dependent choice lists (engine, locale, voice) in step with the
//! live engine handle. Selecting an engine replaces the handle and rebuilds the locale list;
//! selecting a locale pushes it to the handle, which answers with a locale-changed event that in
//! turn rebuilds the voice list. Engine state changes and errors are turned into transient status
//! messages and button states.
//!
//! ## Console
//!
//! The [console] module drives a [`Panel`](panel::Panel) from line-oriented text commands on a
//! single-threaded Tokio runtime. It is what the `speech-panel` binary runs.
//!
//! # Engine Handles and Events
//!
//! Exactly one engine handle is alive at a time, and it is exclusively owned by the
//! [`Reconciler`](panel::Reconciler). Events are not delivered to the panel directly: the handle
//! pushes them onto a queue, tagged with the generation of the handle that produced them. When the
//! handle is replaced, the old one is unsubscribed and dropped, and anything it queued before that
//! is discarded instead of being applied to the new selection state.

use tts::ErrorReason;

pub mod console;
pub mod locale;
pub mod panel;
pub mod tts;

#[cfg(windows)]
mod com_util;

pub use locale::Locale;
pub use tts::{Backend, Engine};

/// The error type returned by speech engines and the panel.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The speech engine could not be reached or constructed.
    #[error("speech engine unavailable: {0}")]
    Unavailable(String),
    /// The engine does not support the requested operation.
    #[error("{0} is not supported by this engine")]
    Unsupported(&'static str),
    /// The engine reported a failure while carrying out a request.
    #[error("{message}")]
    Backend {
        /// Which stage of speech synthesis failed.
        reason: ErrorReason,
        /// Human-readable description of the failure.
        message: String,
    },
    /// A string could not be parsed as a locale code.
    #[error("invalid locale code: {0:?}")]
    InvalidLocale(String),
    /// An I/O error, typically from spawning or talking to a synthesizer process.
    #[error(transparent)]
    Io(#[from] std::io::Error),
    /// An error returned by a SAPI call.
    #[cfg(windows)]
    #[error(transparent)]
    Sapi(#[from] windows::core::Error),
}

impl Error {
    /// Returns the stage of speech synthesis this error belongs to.
    pub fn reason(&self) -> ErrorReason {
        match self {
            Self::Unavailable(_) => ErrorReason::Initialization,
            Self::Unsupported(_) | Self::InvalidLocale(_) => ErrorReason::Configuration,
            Self::Backend {
                reason,
                ..
            } => *reason,
            Self::Io(_) => ErrorReason::Playback,
            #[cfg(windows)]
            Self::Sapi(_) => ErrorReason::Playback,
        }
    }
}

/// The type returned by speech engine functions and methods.
pub type Result<T> = std::result::Result<T, Error>;

/// Initializes COM on the current thread, so that the SAPI engine can be used from it. This
/// function must be called by every thread that intends to use SAPI.
#[cfg(windows)]
pub fn initialize() -> Result<()> {
    unsafe { windows::Win32::System::Com::CoInitialize(std::ptr::null()) }?;
    Ok(())
}

/// Deinitializes COM for the current thread. This function must be called for every thread that
/// called `initialize()`, the same number of times.
#[cfg(windows)]
pub fn finalize() {
    unsafe { windows::Win32::System::Com::CoUninitialize() }
}
