//! An engine that lives entirely in memory.
//!
//! The in-memory engine implements the full [`Engine`] contract without producing any sound. It
//! speaks the locales and voices it was configured with, emits the same events a real engine
//! would, and records every command it receives. The [`MemoryBackend`] that creates it keeps an
//! eye on every handle it ever constructed, so the handles can be inspected and driven from the
//! outside, e.g. to finish an utterance or to fire an event at a handle that should be gone.

use std::sync::{Arc, Mutex, MutexGuard};

use crate::{Error, Locale, Result};

use super::{
    Backend, BoundaryHint, Engine, EngineEvent, EngineId, EngineState, ErrorReason, EventHandler,
    Pitch, Rate, Voice, Volume,
};

/// A command received by an in-memory engine.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    #[allow(missing_docs)]
    SetLocale(Locale),
    /// Carries the identifier of the voice.
    SetVoice(String),
    #[allow(missing_docs)]
    SetRate(Rate),
    #[allow(missing_docs)]
    SetPitch(Pitch),
    #[allow(missing_docs)]
    SetVolume(Volume),
    #[allow(missing_docs)]
    Say(String),
    #[allow(missing_docs)]
    Stop(BoundaryHint),
    #[allow(missing_docs)]
    Pause(BoundaryHint),
    #[allow(missing_docs)]
    Resume,
}

/// Describes the locales and voices an in-memory engine offers.
#[derive(Debug, Clone)]
pub struct MemoryEngineSpec {
    name: String,
    locales: Vec<(Locale, Vec<Voice>)>,
    initial_locale: Option<Locale>,
    finish_on_pump: bool,
}

impl MemoryEngineSpec {
    /// Creates an engine description with no locales.
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            locales: Vec::new(),
            initial_locale: None,
            finish_on_pump: false,
        }
    }

    /// Adds a locale together with the voices the engine offers for it.
    pub fn locale(mut self, locale: Locale, voices: Vec<Voice>) -> Self {
        self.locales.push((locale, voices));
        self
    }

    /// Sets the locale a new handle starts with. The first locale is used if this is not called.
    pub fn initial_locale(mut self, locale: Locale) -> Self {
        self.initial_locale = Some(locale);
        self
    }

    /// Makes the engine finish every utterance the next time it is pumped.
    pub fn finish_on_pump(mut self) -> Self {
        self.finish_on_pump = true;
        self
    }

    fn voices_for(&self, locale: Option<&Locale>) -> Vec<Voice> {
        locale
            .and_then(|locale| self.locales.iter().find(|(l, _)| l == locale))
            .map(|(_, voices)| voices.clone())
            .unwrap_or_default()
    }
}

struct HandleState {
    alive: bool,
    subscribed: bool,
    state: EngineState,
    locale: Option<Locale>,
    voice: Option<Voice>,
    handler: Option<Box<dyn EventHandler>>,
}

impl HandleState {
    fn emit(&self, event: EngineEvent) {
        if let Some(handler) = &self.handler {
            handler.on_event(event);
        }
    }

    fn transition(&mut self, state: EngineState) {
        if self.state != state {
            self.state = state;
            self.emit(EngineEvent::StateChanged(state));
        }
    }
}

#[derive(Default)]
struct Shared {
    handles: Vec<Arc<Mutex<HandleState>>>,
    calls: Vec<Call>,
    failing_engines: Vec<String>,
    command_failure: Option<String>,
    keep_handlers: bool,
}

/// Constructs [`MemoryEngine`]s and keeps track of them.
///
/// Clones share the same state, so a test can keep a clone while handing another to the code
/// under test.
#[derive(Clone)]
pub struct MemoryBackend {
    default_engine: MemoryEngineSpec,
    engines: Vec<MemoryEngineSpec>,
    shared: Arc<Mutex<Shared>>,
}

impl MemoryBackend {
    /// Creates a backend whose default engine is described by the given spec, and which lists no
    /// other engines.
    pub fn new(default_engine: MemoryEngineSpec) -> Self {
        Self {
            default_engine,
            engines: Vec::new(),
            shared: Arc::new(Mutex::new(Shared::default())),
        }
    }

    /// Adds a named engine to the list of available engines.
    pub fn with_engine(mut self, engine: MemoryEngineSpec) -> Self {
        self.engines.push(engine);
        self
    }

    /// Makes every future attempt to construct the named engine fail.
    pub fn fail_construction<S: Into<String>>(&self, name: S) {
        self.lock().failing_engines.push(name.into());
    }

    /// Makes every command fail with the given message, or stop failing if `None`.
    pub fn fail_commands(&self, message: Option<&str>) {
        self.lock().command_failure = message.map(str::to_string);
    }

    /// Makes handles keep their event handler after they are unsubscribed or dropped, like a
    /// synthesizer thread that still has a callback in flight.
    pub fn keep_handlers(&self) {
        self.lock().keep_handlers = true;
    }

    /// The number of handles constructed so far.
    pub fn constructed(&self) -> usize {
        self.lock().handles.len()
    }

    /// The number of handles that have not been dropped yet.
    pub fn live_handles(&self) -> usize {
        self.lock().handles.iter().filter(|h| lock_handle(h).alive).count()
    }

    /// Whether the handle constructed `index`-th has an event handler installed.
    pub fn is_subscribed(&self, index: usize) -> bool {
        self.lock().handles.get(index).map_or(false, |h| lock_handle(h).subscribed)
    }

    /// Every command received by any handle, in order.
    pub fn calls(&self) -> Vec<Call> {
        self.lock().calls.clone()
    }

    /// Forgets the commands received so far.
    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }

    /// Fires an event at the handler of the handle constructed `index`-th, if it still has one.
    pub fn emit(&self, index: usize, event: EngineEvent) {
        let handle = self.lock().handles.get(index).cloned();
        if let Some(handle) = handle {
            lock_handle(&handle).emit(event);
        }
    }

    /// Finishes the utterance of the most recently constructed handle that is still alive.
    pub fn finish(&self) {
        let handle = self.lock().handles.iter().rev().find(|h| lock_handle(h).alive).cloned();
        if let Some(handle) = handle {
            let mut handle = lock_handle(&handle);
            if matches!(handle.state, EngineState::Speaking | EngineState::Paused) {
                handle.transition(EngineState::Ready);
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, Shared> {
        self.shared.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn lock_handle(handle: &Mutex<HandleState>) -> MutexGuard<'_, HandleState> {
    handle.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl Backend for MemoryBackend {
    fn available_engines(&self) -> Vec<String> {
        self.engines.iter().map(|spec| spec.name.clone()).collect()
    }

    fn create(&self, id: &EngineId) -> Result<Box<dyn Engine>> {
        let spec = match id {
            EngineId::Default => &self.default_engine,
            EngineId::Named(name) => self
                .engines
                .iter()
                .find(|spec| &spec.name == name)
                .ok_or_else(|| Error::Unavailable(format!("no engine named {}", name)))?,
        };

        let mut shared = self.lock();
        if shared.failing_engines.iter().any(|name| name == id.as_str()) {
            return Err(Error::Unavailable(format!("{} failed to start", id)));
        }

        let locale = spec
            .initial_locale
            .clone()
            .or_else(|| spec.locales.first().map(|(locale, _)| locale.clone()));
        let voice = spec.voices_for(locale.as_ref()).into_iter().next();
        let state = Arc::new(Mutex::new(HandleState {
            alive: true,
            subscribed: false,
            state: EngineState::Ready,
            locale,
            voice,
            handler: None,
        }));
        shared.handles.push(state.clone());

        Ok(Box::new(MemoryEngine {
            spec: spec.clone(),
            state,
            shared: self.shared.clone(),
        }))
    }
}

/// An engine handle created by a [`MemoryBackend`].
pub struct MemoryEngine {
    spec: MemoryEngineSpec,
    state: Arc<Mutex<HandleState>>,
    shared: Arc<Mutex<Shared>>,
}

impl MemoryEngine {
    fn handle(&self) -> MutexGuard<'_, HandleState> {
        lock_handle(&self.state)
    }

    fn record(&self, call: Call) -> Result<()> {
        let mut shared = self.shared.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        shared.calls.push(call);
        match &shared.command_failure {
            Some(message) => Err(Error::Backend {
                reason: ErrorReason::Playback,
                message: message.clone(),
            }),
            None => Ok(()),
        }
    }

    fn keeps_handlers(&self) -> bool {
        self.shared.lock().unwrap_or_else(|poisoned| poisoned.into_inner()).keep_handlers
    }
}

impl Engine for MemoryEngine {
    fn name(&self) -> &str {
        &self.spec.name
    }

    fn state(&self) -> EngineState {
        self.handle().state
    }

    fn available_locales(&self) -> Vec<Locale> {
        self.spec.locales.iter().map(|(locale, _)| locale.clone()).collect()
    }

    fn locale(&self) -> Option<Locale> {
        self.handle().locale.clone()
    }

    fn set_locale(&mut self, locale: &Locale) -> Result<()> {
        self.record(Call::SetLocale(locale.clone()))?;
        if !self.spec.locales.iter().any(|(l, _)| l == locale) {
            return Err(Error::Backend {
                reason: ErrorReason::Configuration,
                message: format!("{} does not speak {}", self.spec.name, locale),
            });
        }
        let voice = self.spec.voices_for(Some(locale)).into_iter().next();
        let mut handle = self.handle();
        handle.locale = Some(locale.clone());
        handle.voice = voice;
        handle.emit(EngineEvent::LocaleChanged(locale.clone()));
        Ok(())
    }

    fn available_voices(&self) -> Vec<Voice> {
        let locale = self.handle().locale.clone();
        self.spec.voices_for(locale.as_ref())
    }

    fn voice(&self) -> Option<Voice> {
        self.handle().voice.clone()
    }

    fn set_voice(&mut self, voice: &Voice) -> Result<()> {
        self.record(Call::SetVoice(voice.id().to_string()))?;
        if !self.available_voices().iter().any(|v| v.id() == voice.id()) {
            return Err(Error::Backend {
                reason: ErrorReason::Configuration,
                message: format!("{} has no voice {}", self.spec.name, voice.id()),
            });
        }
        self.handle().voice = Some(voice.clone());
        Ok(())
    }

    fn set_rate(&mut self, rate: Rate) -> Result<()> {
        self.record(Call::SetRate(rate))
    }

    fn set_pitch(&mut self, pitch: Pitch) -> Result<()> {
        self.record(Call::SetPitch(pitch))
    }

    fn set_volume(&mut self, volume: Volume) -> Result<()> {
        self.record(Call::SetVolume(volume))
    }

    fn say(&mut self, text: &str) -> Result<()> {
        self.record(Call::Say(text.to_string()))?;
        self.handle().transition(EngineState::Speaking);
        Ok(())
    }

    fn stop(&mut self, hint: BoundaryHint) -> Result<()> {
        self.record(Call::Stop(hint))?;
        let mut handle = self.handle();
        if matches!(handle.state, EngineState::Speaking | EngineState::Paused) {
            handle.transition(EngineState::Ready);
        }
        Ok(())
    }

    fn pause(&mut self, hint: BoundaryHint) -> Result<()> {
        self.record(Call::Pause(hint))?;
        let mut handle = self.handle();
        if handle.state == EngineState::Speaking {
            handle.transition(EngineState::Paused);
        }
        Ok(())
    }

    fn resume(&mut self) -> Result<()> {
        self.record(Call::Resume)?;
        let mut handle = self.handle();
        if handle.state == EngineState::Paused {
            handle.transition(EngineState::Speaking);
        }
        Ok(())
    }

    fn subscribe(&mut self, handler: Box<dyn EventHandler>) {
        let mut handle = self.handle();
        handle.handler = Some(handler);
        handle.subscribed = true;
    }

    fn unsubscribe(&mut self) {
        let keep = self.keeps_handlers();
        let mut handle = self.handle();
        handle.subscribed = false;
        if !keep {
            handle.handler = None;
        }
    }

    fn pump(&mut self) {
        if self.spec.finish_on_pump {
            let mut handle = self.handle();
            if handle.state == EngineState::Speaking {
                handle.transition(EngineState::Ready);
            }
        }
    }
}

impl Drop for MemoryEngine {
    fn drop(&mut self) {
        let keep = self.keeps_handlers();
        let mut handle = self.handle();
        handle.alive = false;
        if !keep {
            handle.handler = None;
        }
    }
}
