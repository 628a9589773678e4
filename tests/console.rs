use std::time::Duration;

use speech_panel::console::Console;
use speech_panel::panel::{Panel, Settings, StatusTimeouts};
use speech_panel::tts::memory::{Call, MemoryBackend, MemoryEngineSpec};
use speech_panel::tts::{BoundaryHint, Voice, VoiceAge, VoiceGender};
use speech_panel::Locale;

fn backend() -> MemoryBackend {
    MemoryBackend::new(
        MemoryEngineSpec::new("memory")
            .locale(
                Locale::new("en", Some("GB")),
                vec![Voice::new("English+f2", VoiceGender::Female, VoiceAge::Adult)
                    .with_id("en-gb+f2")],
            )
            .locale(
                Locale::new("de", Some("DE")),
                vec![Voice::new("German", VoiceGender::Male, VoiceAge::Other).with_id("de")],
            )
            .finish_on_pump(),
    )
}

fn console(backend: &MemoryBackend) -> Console<MemoryBackend, Vec<u8>> {
    let settings = Settings {
        locale: Some(Locale::new("en", Some("GB"))),
        timeouts: StatusTimeouts {
            message: Duration::from_millis(100),
            error: Duration::from_millis(500),
        },
        ..Settings::default()
    };
    Console::new(Panel::new(backend.clone(), &settings), Vec::new())
        .with_pump_interval(Duration::from_millis(10))
}

#[tokio::test(start_paused = true)]
async fn test_console_lists_choices_after_the_banner() {
    let backend = backend();
    let mut console = console(&backend);
    console.run(&b"quit\nsay never spoken\n"[..]).await.unwrap();

    let output = String::from_utf8(console.into_output()).unwrap();
    let banner = output.find("Type `help`").unwrap();
    let engines = output.find("Engines:").unwrap();
    assert!(banner < engines);
    assert!(output.contains("* 1) Default [default]"));
    assert!(output.contains("* 1) English (United Kingdom) [en_GB]"));
    assert!(output.contains("  2) German (Germany) [de_DE]"));
    assert!(output.contains("* 1) f2 - Female - Adult [en-gb+f2]"));
    assert!(!backend.calls().iter().any(|call| matches!(call, Call::Say(_))));
}

#[tokio::test(start_paused = true)]
async fn test_console_drives_the_panel() {
    let backend = backend();
    let mut console = console(&backend);
    let input = b"locale de_DE\nvoices\nrate 4\nrate 11\nsay hallo\nvolume loud\nbogus\n";
    console.run(&input[..]).await.unwrap();

    let reconciler = console.panel().reconciler();
    assert_eq!(Some(&Locale::new("de", Some("DE"))), reconciler.locales().current_value());
    assert_eq!(4, reconciler.sliders().rate);

    let calls = backend.calls();
    assert!(calls.contains(&Call::SetLocale(Locale::new("de", Some("DE")))));
    assert!(calls.contains(&Call::Say("hallo".to_string())));

    let output = String::from_utf8(console.into_output()).unwrap();
    assert!(output.contains("The rate must be a whole number from -10 to 10"));
    assert!(output.contains("The volume must be a whole number from 0 to 100"));
    assert!(output.contains("Unknown command: bogus"));
}

#[tokio::test(start_paused = true)]
async fn test_status_messages_follow_the_engine() {
    let backend = backend();
    let mut console = console(&backend);
    let (mut writer, reader) = tokio::io::duplex(64);

    let session = async {
        use tokio::io::AsyncWriteExt;
        writer.write_all(b"say hello\n").await.unwrap();
        // Long enough for the utterance to finish and both messages to expire.
        tokio::time::sleep(Duration::from_millis(400)).await;
        writer.write_all(b"stop\nquit\n").await.unwrap();
    };
    let (result, ()) = tokio::join!(console.run(reader), session);
    result.unwrap();

    assert_eq!(None, console.panel().status().message());
    // The final stop found nothing to stop.
    assert_eq!(Some(&Call::Stop(BoundaryHint::Immediate)), backend.calls().last());

    let output = String::from_utf8(console.into_output()).unwrap();
    let started = output.find("[status] Speech started...").unwrap();
    let stopped = output.find("[status] Speech stopped...").unwrap();
    assert!(started < stopped);
}

#[tokio::test(start_paused = true)]
async fn test_repeated_error_is_printed_each_time() {
    let backend = backend();
    backend.fail_commands(Some("boom"));
    let mut console = console(&backend);
    let (mut writer, reader) = tokio::io::duplex(64);

    let session = async {
        use tokio::io::AsyncWriteExt;
        writer.write_all(b"say a\n").await.unwrap();
        // The first message is still up when the second one arrives.
        tokio::time::sleep(Duration::from_millis(50)).await;
        writer.write_all(b"say b\n").await.unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        writer.write_all(b"quit\n").await.unwrap();
    };
    let (result, ()) = tokio::join!(console.run(reader), session);
    result.unwrap();

    assert_eq!(Some("boom"), console.panel().status().message());
    let output = String::from_utf8(console.into_output()).unwrap();
    assert_eq!(2, output.matches("[status] boom").count());
}
