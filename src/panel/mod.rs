//! The controller behind the panel: choice lists, selection reconciliation and status reporting.
//!
//! A [`Panel`] plays the part of the window. It owns a [`Reconciler`], which keeps the engine,
//! locale and voice choices consistent with the live engine handle, and a [`StatusReporter`],
//! which turns engine state changes into status messages and button states. User selections go
//! through the choice lists, so that the reconciler never sees the selections it makes itself
//! while rebuilding them.

use std::time::Instant;

use crate::tts::{Backend, EngineEvent, EngineId};
use crate::Locale;

mod choice;
mod reconciler;
mod status;

pub use choice::{ChoiceList, SignalBlocker};
pub use reconciler::{Envelope, Reconciler, Sliders};
pub use status::{Controls, StatusReporter, StatusTimeouts};

/// The initial configuration of a panel.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// The engine to select once the engines have been listed.
    pub engine: EngineId,
    /// The locale to fall back to when an engine doesn't report one. Defaults to the system
    /// locale.
    pub locale: Option<Locale>,
    /// Rate slider position, from -10 to 10.
    pub rate: i32,
    /// Pitch slider position, from -10 to 10.
    pub pitch: i32,
    /// Volume slider position, from 0 to 100.
    pub volume: i32,
    #[allow(missing_docs)]
    pub timeouts: StatusTimeouts,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            engine: EngineId::Default,
            locale: None,
            rate: 0,
            pitch: 0,
            volume: 70,
            timeouts: StatusTimeouts::default(),
        }
    }
}

/// Ties the choice lists, the engine and the status reporter together.
pub struct Panel<B: Backend> {
    reconciler: Reconciler<B>,
    status: StatusReporter,
    initial_engine: EngineId,
}

impl<B: Backend> Panel<B> {
    /// Creates a panel with empty choices. Nothing is asked of the backend until
    /// [`start`](Panel::start) is called.
    pub fn new(backend: B, settings: &Settings) -> Self {
        Self {
            reconciler: Reconciler::new(backend, settings),
            status: StatusReporter::new(settings.timeouts),
            initial_engine: settings.engine.clone(),
        }
    }

    /// Lists the available engines and selects the configured one.
    pub fn start(&mut self) {
        let initial = self.initial_engine.clone();
        self.reconciler.populate_engines(&initial);
    }

    /// Selects the engine at the given index, as if the user picked it. Returns `false` if there
    /// is no such engine.
    pub fn choose_engine(&mut self, index: usize) -> bool {
        let chosen = self.reconciler.engines_mut().select(index);
        self.dispatch_selections();
        chosen
    }

    /// Selects the locale at the given index, as if the user picked it. Returns `false` if there
    /// is no such locale.
    ///
    /// The voices are rebuilt when the engine's answer is processed by
    /// [`process_events`](Panel::process_events).
    pub fn choose_locale(&mut self, index: usize) -> bool {
        let chosen = self.reconciler.locales_mut().select(index);
        self.dispatch_selections();
        chosen
    }

    /// Selects the voice at the given index, as if the user picked it. Returns `false` if there
    /// is no such voice.
    pub fn choose_voice(&mut self, index: usize) -> bool {
        let chosen = self.reconciler.voices_mut().select(index);
        self.dispatch_selections();
        chosen
    }

    /// Handles every event queued so far. Returns how many were handled.
    pub fn process_events(&mut self, now: Instant) -> usize {
        let mut handled = 0;
        while let Some(envelope) = self.reconciler.try_next_event() {
            self.handle_event(envelope, now);
            handled += 1;
        }
        handled
    }

    /// Waits for the next event of the live engine.
    pub async fn next_event(&mut self) -> Option<Envelope> {
        self.reconciler.next_event().await
    }

    /// Routes an engine event to the reconciler or the status reporter.
    pub fn handle_event(&mut self, envelope: Envelope, now: Instant) {
        if !self.reconciler.is_current(&envelope) {
            return;
        }
        match envelope.event() {
            EngineEvent::LocaleChanged(locale) => self.reconciler.on_locale_changed(locale.clone()),
            EngineEvent::StateChanged(state) => self.status.on_state_changed(*state, now),
            EngineEvent::ErrorOccurred {
                reason,
                message,
            } => self.status.on_error(*reason, message, now),
        }
        self.dispatch_selections();
    }

    /// Hides the status message if its time is up. Returns whether a message was hidden.
    pub fn expire_status(&mut self, now: Instant) -> bool {
        self.status.expire(now)
    }

    #[allow(missing_docs)]
    pub fn speak(&mut self, text: &str) {
        self.reconciler.speak(text);
    }

    #[allow(missing_docs)]
    pub fn stop(&mut self) {
        self.reconciler.stop();
    }

    #[allow(missing_docs)]
    pub fn pause(&mut self) {
        self.reconciler.pause();
    }

    #[allow(missing_docs)]
    pub fn resume(&mut self) {
        self.reconciler.resume();
    }

    #[allow(missing_docs)]
    pub fn set_rate(&mut self, position: i32) {
        self.reconciler.set_rate(position);
    }

    #[allow(missing_docs)]
    pub fn set_pitch(&mut self, position: i32) {
        self.reconciler.set_pitch(position);
    }

    #[allow(missing_docs)]
    pub fn set_volume(&mut self, position: i32) {
        self.reconciler.set_volume(position);
    }

    /// Lets the engine emit events it has to poll for.
    pub fn pump(&mut self) {
        self.reconciler.pump();
    }

    #[allow(missing_docs)]
    pub fn reconciler(&self) -> &Reconciler<B> {
        &self.reconciler
    }

    #[allow(missing_docs)]
    pub fn status(&self) -> &StatusReporter {
        &self.status
    }

    /// Hands user selections queued in the choice lists to the reconciler.
    fn dispatch_selections(&mut self) {
        for index in self.reconciler.engines_mut().take_changes() {
            if let Some(id) = self.reconciler.engines().value(index).cloned() {
                self.reconciler.select_engine(&id);
            }
        }
        for index in self.reconciler.locales_mut().take_changes() {
            if let Some(locale) = self.reconciler.locales().value(index).cloned() {
                self.reconciler.select_locale(&locale);
            }
        }
        for index in self.reconciler.voices_mut().take_changes() {
            self.reconciler.select_voice(index);
        }
    }
}
