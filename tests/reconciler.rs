use std::time::Instant;

use speech_panel::panel::{Panel, Reconciler, Settings};
use speech_panel::tts::memory::{Call, MemoryBackend, MemoryEngineSpec};
use speech_panel::tts::{
    BoundaryHint, EngineEvent, EngineId, EngineState, Pitch, Rate, Voice, VoiceAge, VoiceGender,
    Volume,
};
use speech_panel::Locale;

fn en_us() -> Locale {
    Locale::new("en", Some("US"))
}

fn fr_fr() -> Locale {
    Locale::new("fr", Some("FR"))
}

fn de_de() -> Locale {
    Locale::new("de", Some("DE"))
}

fn voice(id: &str, name: &str, gender: VoiceGender, age: VoiceAge) -> Voice {
    Voice::new(name, gender, age).with_id(id)
}

fn default_engine() -> MemoryEngineSpec {
    MemoryEngineSpec::new("memory")
        .locale(
            en_us(),
            vec![
                voice("en+klatt", "English+Klatt", VoiceGender::Unknown, VoiceAge::Other),
                voice("en", "English", VoiceGender::Unknown, VoiceAge::Other),
                voice("en+grandma", "English+grandma", VoiceGender::Unknown, VoiceAge::Senior),
            ],
        )
        .locale(
            fr_fr(),
            vec![
                voice("fr+1", "French+Marie", VoiceGender::Female, VoiceAge::Adult),
                voice("fr+2", "French+Paul", VoiceGender::Male, VoiceAge::Adult),
            ],
        )
}

fn backend() -> MemoryBackend {
    MemoryBackend::new(default_engine())
        .with_engine(MemoryEngineSpec::new("german").locale(de_de(), vec![]))
}

fn settings() -> Settings {
    Settings {
        locale: Some(en_us()),
        ..Settings::default()
    }
}

fn labels<T>(list: &speech_panel::panel::ChoiceList<T>) -> Vec<String> {
    list.labels().map(str::to_string).collect()
}

fn started_panel(backend: &MemoryBackend) -> Panel<MemoryBackend> {
    let mut panel = Panel::new(backend.clone(), &settings());
    panel.start();
    panel.process_events(Instant::now());
    panel
}

/// Feeds locale changes back to a bare reconciler, like the panel does.
fn drain(reconciler: &mut Reconciler<MemoryBackend>) {
    while let Some(envelope) = reconciler.try_next_event() {
        if let EngineEvent::LocaleChanged(locale) = envelope.event() {
            reconciler.on_locale_changed(locale.clone());
        }
    }
}

#[test]
fn test_startup_selects_the_default_engine() {
    let backend = backend();
    let panel = started_panel(&backend);
    let reconciler = panel.reconciler();

    assert_eq!(1, backend.constructed());
    assert_eq!(1, backend.live_handles());
    assert!(backend.is_subscribed(0));

    assert_eq!(vec!["Default", "german"], labels(reconciler.engines()));
    assert_eq!(Some(&EngineId::Default), reconciler.engines().current_value());

    assert_eq!(
        vec!["English (United States)", "French (France)"],
        labels(reconciler.locales())
    );
    assert_eq!(Some(&en_us()), reconciler.locales().current_value());

    // "English" alone derives to nothing and is left out.
    assert_eq!(vec!["Klatt", "grandma - Female - Senior"], labels(reconciler.voices()));
    assert_eq!(Some(0), reconciler.voices().current_index());
    assert_eq!(None, panel.status().message());
}

#[test]
fn test_locale_selection_goes_through_the_engine() {
    let backend = backend();
    let mut panel = started_panel(&backend);
    backend.clear_calls();

    assert!(panel.choose_locale(1));
    assert_eq!(vec![Call::SetLocale(fr_fr())], backend.calls());
    // The voices follow only once the engine confirms.
    assert_eq!(2, panel.reconciler().voices().len());
    assert_eq!(&en_us(), panel.reconciler().current_locale());

    assert_eq!(1, panel.process_events(Instant::now()));
    let reconciler = panel.reconciler();
    assert_eq!(Some(1), reconciler.locales().current_index());
    assert_eq!(&fr_fr(), reconciler.current_locale());
    assert_eq!(vec!["Marie - Female - Adult", "Paul - Male - Adult"], labels(reconciler.voices()));
    assert_eq!(Some("fr+1"), reconciler.voices().current_value().map(Voice::id));

    // Rebuilding the lists must not echo back as user selections.
    assert_eq!(vec![Call::SetLocale(fr_fr())], backend.calls());
}

#[test]
fn test_voice_selection_pushes_the_stored_voice() {
    let backend = backend();
    let mut panel = started_panel(&backend);
    backend.clear_calls();

    assert!(panel.choose_voice(1));
    assert!(!panel.choose_voice(7));
    assert_eq!(vec![Call::SetVoice("en+grandma".to_string())], backend.calls());
    assert_eq!(
        Some("en+grandma"),
        panel.reconciler().engine().and_then(|engine| engine.voice()).as_ref().map(Voice::id)
    );
}

#[test]
fn test_engine_switch_replaces_the_handle() {
    let backend = backend();
    let mut panel = started_panel(&backend);
    panel.set_rate(3);
    panel.set_pitch(-2);
    panel.set_volume(40);
    backend.clear_calls();

    assert!(panel.choose_engine(1));
    panel.process_events(Instant::now());

    assert_eq!(2, backend.constructed());
    assert_eq!(1, backend.live_handles());
    assert!(!backend.is_subscribed(0));
    assert!(backend.is_subscribed(1));
    assert_eq!(2, panel.reconciler().generation());

    let reconciler = panel.reconciler();
    assert_eq!(Some(1), reconciler.engines().current_index());
    assert_eq!(vec!["German (Germany)"], labels(reconciler.locales()));
    assert_eq!(Some(&de_de()), reconciler.locales().current_value());
    assert!(reconciler.voices().is_empty());
    assert_eq!(None, reconciler.voices().current_index());

    assert_eq!(
        vec![
            Call::SetRate(Rate::new(0.3)),
            Call::SetPitch(Pitch::new(-0.2)),
            Call::SetVolume(Volume::new(0.4)),
        ],
        backend.calls()
    );
}

#[test]
fn test_reselecting_an_engine_rebuilds_the_same_lists() {
    let backend = backend();
    let mut reconciler = Reconciler::new(backend.clone(), &settings());
    reconciler.populate_engines(&EngineId::Default);
    drain(&mut reconciler);
    let locales = labels(reconciler.locales());
    let voices = labels(reconciler.voices());

    reconciler.select_engine(&EngineId::Default);
    drain(&mut reconciler);

    assert_eq!(2, backend.constructed());
    assert_eq!(1, backend.live_handles());
    assert_eq!(locales, labels(reconciler.locales()));
    assert_eq!(voices, labels(reconciler.voices()));
}

#[test]
fn test_events_of_replaced_handles_are_discarded() {
    let backend = backend();
    backend.keep_handlers();
    let mut panel = started_panel(&backend);
    assert!(panel.choose_engine(1));

    // The first handle still has a callback in flight.
    backend.emit(0, EngineEvent::LocaleChanged(fr_fr()));
    backend.emit(0, EngineEvent::StateChanged(EngineState::Speaking));
    assert_eq!(0, panel.process_events(Instant::now()));

    assert_eq!(vec!["German (Germany)"], labels(panel.reconciler().locales()));
    assert_eq!(&de_de(), panel.reconciler().current_locale());
    assert_eq!(None, panel.status().message());

    backend.emit(1, EngineEvent::StateChanged(EngineState::Speaking));
    assert_eq!(1, panel.process_events(Instant::now()));
    assert_eq!(Some("Speech started..."), panel.status().message());
}

#[test]
fn test_failed_construction_leaves_an_unusable_engine() {
    let backend = backend();
    backend.fail_construction("german");
    let mut panel = started_panel(&backend);
    backend.clear_calls();

    assert!(panel.choose_engine(1));
    panel.process_events(Instant::now());

    assert_eq!(0, backend.live_handles());
    let reconciler = panel.reconciler();
    assert_eq!(Some("german"), reconciler.engine().map(|engine| engine.name()));
    assert_eq!(Some(EngineState::Error), reconciler.engine().map(|engine| engine.state()));
    assert!(reconciler.locales().is_empty());
    assert!(reconciler.voices().is_empty());
    assert_eq!(Some("speech engine unavailable: german failed to start"), panel.status().message());

    panel.speak("nothing happens");
    panel.pause();
    assert!(backend.calls().is_empty());

    assert!(panel.choose_engine(0));
    panel.process_events(Instant::now());
    assert_eq!(1, backend.live_handles());
    assert_eq!(2, panel.reconciler().locales().len());
}

#[test]
fn test_unknown_initial_engine_falls_back_to_default() {
    let backend = backend();
    let mut panel = Panel::new(
        backend.clone(),
        &Settings {
            engine: EngineId::from("festival"),
            ..settings()
        },
    );
    panel.start();

    assert_eq!(1, backend.constructed());
    assert_eq!(Some(&EngineId::Default), panel.reconciler().engines().current_value());
}

#[test]
fn test_default_engine_alone_with_no_voices() {
    let backend = MemoryBackend::new(
        MemoryEngineSpec::new("silent").locale(en_us(), vec![]).locale(fr_fr(), vec![]),
    );
    let mut panel = started_panel(&backend);

    assert_eq!(vec!["Default"], labels(panel.reconciler().engines()));
    assert_eq!(2, panel.reconciler().locales().len());
    assert!(panel.reconciler().voices().is_empty());

    assert!(panel.choose_locale(1));
    panel.process_events(Instant::now());
    assert!(panel.reconciler().voices().is_empty());
    assert_eq!(None, panel.reconciler().voices().current_index());
}

#[test]
fn test_speaking_stops_the_previous_utterance() {
    let backend = backend();
    let mut panel = started_panel(&backend);
    backend.clear_calls();

    panel.speak("first");
    panel.speak("second");
    assert_eq!(
        vec![
            Call::Say("first".to_string()),
            Call::Stop(BoundaryHint::Immediate),
            Call::Say("second".to_string()),
        ],
        backend.calls()
    );

    let now = Instant::now();
    assert_eq!(3, panel.process_events(now));
    assert_eq!(Some("Speech started..."), panel.status().message());
}

#[test]
fn test_state_changes_drive_the_status() {
    let backend = backend();
    let mut panel = started_panel(&backend);
    let now = Instant::now();
    let mut messages = Vec::new();

    panel.speak("hello");
    panel.process_events(now);
    messages.push(panel.status().message().map(str::to_string));
    assert!(panel.status().controls().pause);

    panel.pause();
    panel.process_events(now);
    messages.push(panel.status().message().map(str::to_string));
    assert!(panel.status().controls().resume);

    panel.resume();
    backend.finish();
    panel.process_events(now);
    messages.push(panel.status().message().map(str::to_string));
    assert!(!panel.status().controls().stop);

    assert_eq!(
        vec![
            Some("Speech started...".to_string()),
            Some("Speech paused...".to_string()),
            Some("Speech stopped...".to_string()),
        ],
        messages
    );
}

#[test]
fn test_failed_commands_are_reported_as_errors() {
    let backend = backend();
    let mut panel = started_panel(&backend);
    backend.fail_commands(Some("the synthesizer crashed"));

    panel.speak("hello");
    panel.process_events(Instant::now());

    assert_eq!(Some("the synthesizer crashed"), panel.status().message());
    assert_eq!(Some("the synthesizer crashed"), panel.status().last_error());
    assert_eq!(1, backend.live_handles());
}

#[test]
fn test_rejected_locale_keeps_the_engine_locale_selected() {
    let backend = backend();
    let mut panel = started_panel(&backend);
    backend.fail_commands(Some("rejected"));

    assert!(panel.choose_locale(1));
    panel.process_events(Instant::now());

    let reconciler = panel.reconciler();
    let actual = reconciler.engine().and_then(|engine| engine.locale());
    assert_eq!(Some(en_us()), actual);
    assert_eq!(actual.as_ref(), reconciler.locales().current_value());
    assert_eq!(vec!["Klatt", "grandma - Female - Senior"], labels(reconciler.voices()));
    assert_eq!(Some("rejected"), panel.status().message());

    // Restoring the selection is not a user selection of its own.
    backend.fail_commands(None);
    backend.clear_calls();
    panel.process_events(Instant::now());
    assert!(backend.calls().is_empty());
}

#[test]
fn test_rejected_voice_keeps_the_engine_voice_selected() {
    let backend = backend();
    let mut panel = started_panel(&backend);
    backend.fail_commands(Some("rejected"));

    assert!(panel.choose_voice(1));
    panel.process_events(Instant::now());

    let reconciler = panel.reconciler();
    let actual = reconciler.engine().and_then(|engine| engine.voice());
    assert_eq!(Some("en+klatt"), actual.as_ref().map(Voice::id));
    assert_eq!(
        actual.as_ref().map(Voice::id),
        reconciler.voices().current_value().map(Voice::id)
    );
    assert_eq!(Some("rejected"), panel.status().message());
}
