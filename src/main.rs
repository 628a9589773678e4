use std::error::Error;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use speech_panel::console::Console;
use speech_panel::panel::{Panel, Settings, StatusTimeouts};
use speech_panel::tts::{EngineId, PlatformBackend};

/// Type some text, pick an engine, a locale and a voice, and hear it spoken.
#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Engine to select at startup ("default" for the platform default).
    #[arg(long, env = "SPEECH_PANEL_ENGINE", default_value = EngineId::DEFAULT)]
    engine: EngineId,

    /// Initial rate slider position.
    #[arg(long, env = "SPEECH_PANEL_RATE", default_value_t = 0,
          value_parser = clap::value_parser!(i32).range(-10..=10))]
    rate: i32,

    /// Initial pitch slider position.
    #[arg(long, env = "SPEECH_PANEL_PITCH", default_value_t = 0,
          value_parser = clap::value_parser!(i32).range(-10..=10))]
    pitch: i32,

    /// Initial volume slider position.
    #[arg(long, env = "SPEECH_PANEL_VOLUME", default_value_t = 70,
          value_parser = clap::value_parser!(i32).range(0..=100))]
    volume: i32,

    /// How long status messages stay visible, in milliseconds.
    #[arg(long, env = "SPEECH_PANEL_STATUS_MS", default_value_t = 2000)]
    status_ms: u64,

    /// How long error messages stay visible, in milliseconds.
    #[arg(long, env = "SPEECH_PANEL_ERROR_MS", default_value_t = 5000)]
    error_ms: u64,

    /// Log filter, e.g. "debug" or "speech_panel=trace". Overrides RUST_LOG.
    #[arg(long, env = "SPEECH_PANEL_LOG")]
    log: Option<String>,

    /// The espeak-ng program to run.
    #[arg(long, env = "ESPEAK_NG", default_value = PlatformBackend::DEFAULT_ESPEAK_PROGRAM)]
    espeak: PathBuf,
}

impl Args {
    fn settings(&self) -> Settings {
        Settings {
            engine: self.engine.clone(),
            locale: None,
            rate: self.rate,
            pitch: self.pitch,
            volume: self.volume,
            timeouts: StatusTimeouts {
                message: Duration::from_millis(self.status_ms),
                error: Duration::from_millis(self.error_ms),
            },
        }
    }
}

fn init_tracing(directive: Option<&str>) -> Result<(), Box<dyn Error>> {
    let filter = match directive {
        Some(directive) => EnvFilter::try_new(directive)?,
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
    };
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    init_tracing(args.log.as_deref())?;

    #[cfg(windows)]
    speech_panel::initialize()?;

    let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build()?;
    let panel = Panel::new(PlatformBackend::new(&args.espeak), &args.settings());
    let mut console = Console::new(panel, std::io::stdout());
    let result = runtime.block_on(console.run(tokio::io::stdin()));

    // The engine handle has to go before COM does.
    drop(console);
    #[cfg(windows)]
    speech_panel::finalize();

    Ok(result?)
}
