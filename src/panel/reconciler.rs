use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tracing::{debug, info, warn};

use crate::tts::{
    Backend, BoundaryHint, Engine, EngineEvent, EngineId, EngineState, Pitch, Rate,
    UnusableEngine, Voice, Volume,
};
use crate::{Locale, Result};

use super::{ChoiceList, Settings};

/// An engine event, tagged with the generation of the handle that emitted it.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    generation: u64,
    event: EngineEvent,
}

impl Envelope {
    /// The generation of the handle that emitted the event.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    #[allow(missing_docs)]
    pub fn event(&self) -> &EngineEvent {
        &self.event
    }
}

/// Slider positions for rate, pitch and volume.
///
/// These belong to the panel, not to the engine, and are pushed to every new handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sliders {
    #[allow(missing_docs)]
    pub rate: i32,
    #[allow(missing_docs)]
    pub pitch: i32,
    #[allow(missing_docs)]
    pub volume: i32,
}

/// Keeps the engine, locale and voice choices consistent with the live engine handle.
///
/// The reconciler owns the only engine handle. Selecting an engine tears the old handle down and
/// rebuilds the locale choices from the new one. Selecting a locale only pushes it to the handle;
/// the voice choices are rebuilt when the handle answers with a locale-changed event, which is
/// also how a handle's own choice of locale is picked up.
///
/// Events reach the reconciler through a queue. The owner drains it with
/// [`try_next_event`](Reconciler::try_next_event) or [`next_event`](Reconciler::next_event) and
/// passes locale changes back to [`on_locale_changed`](Reconciler::on_locale_changed). Events
/// queued by a handle that has since been replaced are never returned.
pub struct Reconciler<B: Backend> {
    backend: B,
    engine: Option<Box<dyn Engine>>,
    generation: u64,
    engines: ChoiceList<EngineId>,
    locales: ChoiceList<Locale>,
    voices: ChoiceList<Voice>,
    current_locale: Locale,
    sliders: Sliders,
    tx: UnboundedSender<Envelope>,
    rx: UnboundedReceiver<Envelope>,
}

impl<B: Backend> Reconciler<B> {
    /// Creates a reconciler with empty choices and no engine handle. Call
    /// [`populate_engines`](Reconciler::populate_engines) to list the engines and select one.
    pub fn new(backend: B, settings: &Settings) -> Self {
        let (tx, rx) = unbounded_channel();
        Self {
            backend,
            engine: None,
            generation: 0,
            engines: ChoiceList::new(),
            locales: ChoiceList::new(),
            voices: ChoiceList::new(),
            current_locale: settings.locale.clone().unwrap_or_else(Locale::system),
            sliders: Sliders {
                rate: settings.rate.clamp(Rate::SLIDER_MIN, Rate::SLIDER_MAX),
                pitch: settings.pitch.clamp(Pitch::SLIDER_MIN, Pitch::SLIDER_MAX),
                volume: settings.volume.clamp(Volume::SLIDER_MIN, Volume::SLIDER_MAX),
            },
            tx,
            rx,
        }
    }

    /// Lists the available engines, with the platform default first, and selects the given one.
    /// If it is not listed, the platform default is selected instead.
    pub fn populate_engines(&mut self, initial: &EngineId) {
        let available = self.backend.available_engines();
        {
            let mut engines = self.engines.block_signals();
            engines.clear();
            engines.push("Default", EngineId::Default);
            for name in available {
                engines.push(name.clone(), EngineId::Named(name));
            }
        }
        debug!("Listed {} engines", self.engines.len());

        let initial = match self.engines.position(|id| id == initial) {
            Some(_) => initial.clone(),
            None => {
                warn!("Engine {} is not available, using the default", initial);
                EngineId::Default
            }
        };
        self.select_engine(&initial);
    }

    /// Replaces the engine handle with a new one for the given engine and rebuilds the locale
    /// and voice choices from it.
    ///
    /// If the engine cannot be constructed, an error is reported and an unusable stand-in is
    /// installed in its place, which offers no locales and ignores every command.
    pub fn select_engine(&mut self, id: &EngineId) {
        if let Some(mut old) = self.engine.take() {
            old.unsubscribe();
            drop(old);
        }
        self.generation += 1;

        let mut engine = match self.backend.create(id) {
            Ok(engine) => engine,
            Err(err) => {
                warn!("Cannot start engine {}: {}", id, err);
                self.post(EngineEvent::ErrorOccurred {
                    reason: err.reason(),
                    message: err.to_string(),
                });
                Box::new(UnusableEngine::new(id.as_str()))
            }
        };
        info!("Selected engine {} (generation {})", engine.name(), self.generation);

        let tx = self.tx.clone();
        let generation = self.generation;
        engine.subscribe(Box::new(move |event: EngineEvent| {
            // The receiver lives as long as the reconciler, which outlives the handle.
            let _ = tx.send(Envelope {
                generation,
                event,
            });
        }));

        if let Some(index) = self.engines.position(|engine_id| engine_id == id) {
            self.engines.block_signals().select(index);
        }

        {
            let mut locales = self.locales.block_signals();
            locales.clear();
            for locale in engine.available_locales() {
                locales.push(locale.display_name(), locale);
            }
        }
        debug!("Listed {} locales for {}", self.locales.len(), engine.name());
        self.engine = Some(engine);

        self.apply_sliders();

        let locale = self.engine.as_ref().and_then(|engine| engine.locale()).or_else(|| {
            self.locales.position(|l| *l == self.current_locale).map(|_| self.current_locale.clone())
        });
        match locale {
            Some(locale) => self.on_locale_changed(locale),
            None => {
                self.locales.block_signals().clear_selection();
                self.voices.block_signals().clear();
            }
        }
    }

    /// Asks the engine to switch to the given locale. The voice choices are rebuilt once the
    /// engine confirms the switch with a locale-changed event.
    pub fn select_locale(&mut self, locale: &Locale) {
        debug!("Requesting locale {}", locale);
        let result = self.with_engine(|engine| engine.set_locale(locale));
        if result.is_err() {
            self.restore_locale_selection();
        }
        self.check(result);
    }

    /// Brings the locale and voice choices in line with the locale the engine switched to.
    pub fn on_locale_changed(&mut self, locale: Locale) {
        {
            let mut locales = self.locales.block_signals();
            match locales.position(|l| *l == locale) {
                Some(index) => {
                    locales.select(index);
                }
                None => locales.clear_selection(),
            }
        }

        let (available, current) = match &self.engine {
            Some(engine) => (engine.available_voices(), engine.voice()),
            None => (Vec::new(), None),
        };
        {
            let mut voices = self.voices.block_signals();
            voices.clear();
            for voice in available {
                let label = match voice.display_name(locale.language_name()) {
                    Some(label) => label,
                    None => continue,
                };
                let is_current = current.as_ref().map_or(false, |c| c.id() == voice.id());
                voices.push(label, voice);
                if is_current {
                    let index = voices.len() - 1;
                    voices.select(index);
                }
            }
        }
        debug!("Listed {} voices for {}", self.voices.len(), locale);
        self.current_locale = locale;
    }

    /// Switches the engine to the voice at the given index of the voice choices.
    pub fn select_voice(&mut self, index: usize) {
        let voice = match self.voices.value(index) {
            Some(voice) => voice.clone(),
            None => {
                warn!("No voice at index {}", index);
                return;
            }
        };
        debug!("Requesting voice {}", voice.id());
        let result = self.with_engine(|engine| engine.set_voice(&voice));
        if result.is_err() {
            self.restore_voice_selection();
        }
        self.check(result);
    }

    /// Speaks the given text, stopping whatever is being spoken first.
    pub fn speak(&mut self, text: &str) {
        let result = self.with_engine(|engine| {
            if matches!(engine.state(), EngineState::Speaking | EngineState::Paused) {
                engine.stop(BoundaryHint::Immediate)?;
            }
            engine.say(text)
        });
        self.check(result);
    }

    #[allow(missing_docs)]
    pub fn stop(&mut self) {
        let result = self.with_engine(|engine| engine.stop(BoundaryHint::Immediate));
        self.check(result);
    }

    #[allow(missing_docs)]
    pub fn pause(&mut self) {
        let result = self.with_engine(|engine| engine.pause(BoundaryHint::Immediate));
        self.check(result);
    }

    #[allow(missing_docs)]
    pub fn resume(&mut self) {
        let result = self.with_engine(|engine| engine.resume());
        self.check(result);
    }

    /// Moves the rate slider and applies the new rate.
    pub fn set_rate(&mut self, position: i32) {
        self.sliders.rate = position.clamp(Rate::SLIDER_MIN, Rate::SLIDER_MAX);
        let rate = Rate::from_slider(self.sliders.rate);
        let result = self.with_engine(|engine| engine.set_rate(rate));
        self.check(result);
    }

    /// Moves the pitch slider and applies the new pitch.
    pub fn set_pitch(&mut self, position: i32) {
        self.sliders.pitch = position.clamp(Pitch::SLIDER_MIN, Pitch::SLIDER_MAX);
        let pitch = Pitch::from_slider(self.sliders.pitch);
        let result = self.with_engine(|engine| engine.set_pitch(pitch));
        self.check(result);
    }

    /// Moves the volume slider and applies the new volume.
    pub fn set_volume(&mut self, position: i32) {
        self.sliders.volume = position.clamp(Volume::SLIDER_MIN, Volume::SLIDER_MAX);
        let volume = Volume::from_slider(self.sliders.volume);
        let result = self.with_engine(|engine| engine.set_volume(volume));
        self.check(result);
    }

    /// Lets the engine emit events it has to poll for.
    pub fn pump(&mut self) {
        if let Some(engine) = self.engine.as_mut() {
            engine.pump();
        }
    }

    /// Returns the next queued event of the current handle without waiting.
    pub fn try_next_event(&mut self) -> Option<Envelope> {
        while let Ok(envelope) = self.rx.try_recv() {
            if self.is_current(&envelope) {
                return Some(envelope);
            }
        }
        None
    }

    /// Waits for the next event of the current handle.
    pub async fn next_event(&mut self) -> Option<Envelope> {
        loop {
            let envelope = self.rx.recv().await?;
            if self.is_current(&envelope) {
                return Some(envelope);
            }
        }
    }

    /// Whether the event was emitted by the current handle. Events of replaced handles are
    /// logged and should be dropped.
    pub fn is_current(&self, envelope: &Envelope) -> bool {
        if envelope.generation == self.generation {
            true
        } else {
            debug!(
                "Discarding {:?} from generation {} (current is {})",
                envelope.event, envelope.generation, self.generation
            );
            false
        }
    }

    /// The live engine handle, if an engine has been selected.
    pub fn engine(&self) -> Option<&dyn Engine> {
        self.engine.as_deref()
    }

    /// How many engine handles have been installed so far.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    #[allow(missing_docs)]
    pub fn engines(&self) -> &ChoiceList<EngineId> {
        &self.engines
    }

    #[allow(missing_docs)]
    pub fn locales(&self) -> &ChoiceList<Locale> {
        &self.locales
    }

    #[allow(missing_docs)]
    pub fn voices(&self) -> &ChoiceList<Voice> {
        &self.voices
    }

    pub(super) fn engines_mut(&mut self) -> &mut ChoiceList<EngineId> {
        &mut self.engines
    }

    pub(super) fn locales_mut(&mut self) -> &mut ChoiceList<Locale> {
        &mut self.locales
    }

    pub(super) fn voices_mut(&mut self) -> &mut ChoiceList<Voice> {
        &mut self.voices
    }

    /// The locale the engine last switched to, or the system locale before any engine did.
    pub fn current_locale(&self) -> &Locale {
        &self.current_locale
    }

    #[allow(missing_docs)]
    pub fn sliders(&self) -> Sliders {
        self.sliders
    }

    /// Points the locale choice back at the engine's locale after it rejected another one.
    fn restore_locale_selection(&mut self) {
        let actual = self.engine.as_ref().and_then(|engine| engine.locale());
        let mut locales = self.locales.block_signals();
        match actual.and_then(|actual| locales.position(|l| *l == actual)) {
            Some(index) => {
                locales.select(index);
            }
            None => locales.clear_selection(),
        }
    }

    /// Points the voice choice back at the engine's voice after it rejected another one.
    fn restore_voice_selection(&mut self) {
        let actual = self.engine.as_ref().and_then(|engine| engine.voice());
        let mut voices = self.voices.block_signals();
        match actual.and_then(|actual| voices.position(|v| v.id() == actual.id())) {
            Some(index) => {
                voices.select(index);
            }
            None => voices.clear_selection(),
        }
    }

    fn apply_sliders(&mut self) {
        let Sliders {
            rate,
            pitch,
            volume,
        } = self.sliders;
        let result = self.with_engine(|engine| {
            engine.set_rate(Rate::from_slider(rate))?;
            engine.set_pitch(Pitch::from_slider(pitch))?;
            engine.set_volume(Volume::from_slider(volume))
        });
        self.check(result);
    }

    fn with_engine<F: FnOnce(&mut dyn Engine) -> Result<()>>(&mut self, f: F) -> Result<()> {
        match self.engine.as_deref_mut() {
            Some(engine) => f(engine),
            None => Ok(()),
        }
    }

    /// Turns a failed engine command into an error event of the current handle.
    fn check(&self, result: Result<()>) {
        if let Err(err) = result {
            warn!("Engine command failed: {}", err);
            self.post(EngineEvent::ErrorOccurred {
                reason: err.reason(),
                message: err.to_string(),
            });
        }
    }

    fn post(&self, event: EngineEvent) {
        let _ = self.tx.send(Envelope {
            generation: self.generation,
            event,
        });
    }
}
