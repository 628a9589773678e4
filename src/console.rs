//! A line-oriented text front end for the panel.
//!
//! The console reads one command per line and prints the choice lists and status messages as
//! they change. It runs on a single-threaded Tokio runtime: user commands, engine events, engine
//! polling and the status timer are all handled by one loop, one at a time.
//!
//! The engines are listed only after the banner has been printed, so that a slow backend doesn't
//! keep the console from showing up.

use std::io::{self, Write};
use std::time::{Duration, Instant};

use futures::StreamExt;
use tokio::io::AsyncRead;
use tokio_util::codec::{FramedRead, LinesCodec};
use tracing::debug;

use crate::panel::{ChoiceList, Panel};
use crate::tts::{Backend, EngineId, Pitch, Rate, Volume};
use crate::{Locale, Result};

const HELP: &str = "\
Commands:
  say <text>        speak the text, interrupting any speech in progress
  stop | pause | resume
  engines           list the engines;   engine <n|name> selects one
  locales           list the locales;   locale <n|code> selects one
  voices            list the voices;    voice <n> selects one
  rate <n>          -10..10
  pitch <n>         -10..10
  volume <n>        0..100
  status            show the status message and the playback buttons
  help              show this text
  quit              exit (so does end of input)";

/// How often engines that have to be polled are pumped, unless configured otherwise.
pub const DEFAULT_PUMP_INTERVAL: Duration = Duration::from_millis(50);

/// Drives a [`Panel`] from text commands.
pub struct Console<B: Backend, W: Write> {
    panel: Panel<B>,
    out: W,
    pump_interval: Duration,
}

impl<B: Backend, W: Write> Console<B, W> {
    /// Creates a console that prints to the given writer.
    pub fn new(panel: Panel<B>, out: W) -> Self {
        Self {
            panel,
            out,
            pump_interval: DEFAULT_PUMP_INTERVAL,
        }
    }

    /// Sets how often the engine is pumped.
    pub fn with_pump_interval(mut self, interval: Duration) -> Self {
        self.pump_interval = interval;
        self
    }

    #[allow(missing_docs)]
    pub fn panel(&self) -> &Panel<B> {
        &self.panel
    }

    /// Consumes the console and returns what it printed to.
    pub fn into_output(self) -> W {
        self.out
    }

    /// Runs commands read from the given input until `quit` or the end of input.
    pub async fn run<R: AsyncRead + Unpin>(&mut self, input: R) -> Result<()> {
        writeln!(self.out, "speech-panel {}", env!("CARGO_PKG_VERSION"))?;
        writeln!(self.out, "Type `help` for a list of commands.")?;

        tokio::task::yield_now().await;
        self.panel.start();
        self.print_engines()?;
        self.print_locales()?;
        self.print_voices()?;

        let mut lines = FramedRead::new(input, LinesCodec::new());
        let mut pump = tokio::time::interval(self.pump_interval);
        let hide_timer = tokio::time::sleep(Duration::ZERO);
        tokio::pin!(hide_timer);

        loop {
            let deadline = self.panel.status().deadline();
            if let Some(deadline) = deadline {
                hide_timer.as_mut().reset(tokio::time::Instant::from_std(deadline));
            }

            tokio::select! {
                line = lines.next() => match line {
                    Some(Ok(line)) => {
                        if !self.execute(&line)? {
                            break;
                        }
                    }
                    Some(Err(err)) => {
                        return Err(io::Error::new(io::ErrorKind::InvalidData, err).into());
                    }
                    None => break,
                },
                Some(envelope) = self.panel.next_event() => {
                    self.panel.handle_event(envelope, now());
                }
                _ = pump.tick() => self.panel.pump(),
                _ = &mut hide_timer, if deadline.is_some() => {
                    if self.panel.expire_status(deadline.unwrap_or_else(now)) {
                        debug!("Status message hidden");
                    }
                }
            }

            // Every message shown restarts the hide timer, even one with the same text.
            let status = self.panel.status();
            if let Some(message) = status.message() {
                if status.deadline() != deadline {
                    writeln!(self.out, "[status] {}", message)?;
                }
            }
        }
        Ok(())
    }

    /// Executes one command. Returns `false` if the console should quit.
    pub fn execute(&mut self, line: &str) -> Result<bool> {
        let line = line.trim();
        let (command, arg) = match line.split_once(char::is_whitespace) {
            Some((command, arg)) => (command, arg.trim()),
            None => (line, ""),
        };

        match command {
            "" => {}
            "quit" | "exit" => return Ok(false),
            "help" => writeln!(self.out, "{}", HELP)?,
            "say" => self.panel.speak(arg),
            "stop" => self.panel.stop(),
            "pause" => self.panel.pause(),
            "resume" => self.panel.resume(),
            "engines" => self.print_engines()?,
            "locales" => self.print_locales()?,
            "voices" => self.print_voices()?,
            "engine" => {
                let engines = self.panel.reconciler().engines();
                let id = EngineId::from(arg);
                let index = parse_index(arg, engines.len())
                    .or_else(|| engines.position(|engine| *engine == id));
                match index {
                    Some(index) => {
                        self.panel.choose_engine(index);
                        self.print_locales()?;
                        self.print_voices()?;
                    }
                    None => writeln!(self.out, "No such engine: {}", arg)?,
                }
            }
            "locale" => {
                let locales = self.panel.reconciler().locales();
                let index = parse_index(arg, locales.len()).or_else(|| {
                    let code = arg.parse::<Locale>().ok()?;
                    locales.position(|locale| *locale == code)
                });
                match index {
                    Some(index) => {
                        self.panel.choose_locale(index);
                    }
                    None => writeln!(self.out, "No such locale: {}", arg)?,
                }
            }
            "voice" => match parse_index(arg, self.panel.reconciler().voices().len()) {
                Some(index) => {
                    self.panel.choose_voice(index);
                }
                None => writeln!(self.out, "No such voice: {}", arg)?,
            },
            "rate" => match parse_slider(arg, Rate::SLIDER_MIN, Rate::SLIDER_MAX) {
                Some(position) => self.panel.set_rate(position),
                None => self.print_range("rate", Rate::SLIDER_MIN, Rate::SLIDER_MAX)?,
            },
            "pitch" => match parse_slider(arg, Pitch::SLIDER_MIN, Pitch::SLIDER_MAX) {
                Some(position) => self.panel.set_pitch(position),
                None => self.print_range("pitch", Pitch::SLIDER_MIN, Pitch::SLIDER_MAX)?,
            },
            "volume" => match parse_slider(arg, Volume::SLIDER_MIN, Volume::SLIDER_MAX) {
                Some(position) => self.panel.set_volume(position),
                None => self.print_range("volume", Volume::SLIDER_MIN, Volume::SLIDER_MAX)?,
            },
            "status" => self.print_status()?,
            _ => writeln!(self.out, "Unknown command: {} (try `help`)", command)?,
        }
        Ok(true)
    }

    fn print_engines(&mut self) -> Result<()> {
        let engines = self.panel.reconciler().engines();
        print_choices(&mut self.out, "Engines", engines, |id| id.to_string())
    }

    fn print_locales(&mut self) -> Result<()> {
        let locales = self.panel.reconciler().locales();
        print_choices(&mut self.out, "Locales", locales, |locale| locale.code())
    }

    fn print_voices(&mut self) -> Result<()> {
        let voices = self.panel.reconciler().voices();
        print_choices(&mut self.out, "Voices", voices, |voice| voice.id().to_string())
    }

    fn print_range(&mut self, name: &str, min: i32, max: i32) -> Result<()> {
        writeln!(self.out, "The {} must be a whole number from {} to {}", name, min, max)?;
        Ok(())
    }

    fn print_status(&mut self) -> Result<()> {
        let status = self.panel.status();
        let controls = status.controls();
        let sliders = self.panel.reconciler().sliders();
        writeln!(self.out, "Status: {}", status.message().unwrap_or("-"))?;
        writeln!(
            self.out,
            "Buttons: pause={} resume={} stop={}",
            on_off(controls.pause),
            on_off(controls.resume),
            on_off(controls.stop)
        )?;
        writeln!(
            self.out,
            "Rate: {}  Pitch: {}  Volume: {}",
            sliders.rate, sliders.pitch, sliders.volume
        )?;
        Ok(())
    }
}

fn print_choices<T, W: Write, F: Fn(&T) -> String>(
    out: &mut W,
    title: &str,
    list: &ChoiceList<T>,
    detail: F,
) -> Result<()> {
    writeln!(out, "{}:", title)?;
    if list.is_empty() {
        writeln!(out, "  (none)")?;
    }
    for (index, (label, value)) in list.labels().zip(list.values()).enumerate() {
        let marker = if list.current_index() == Some(index) { '*' } else { ' ' };
        writeln!(out, "{} {}) {} [{}]", marker, index + 1, label, detail(value))?;
    }
    Ok(())
}

/// The current time on the runtime's clock, which tests may pause.
fn now() -> Instant {
    tokio::time::Instant::now().into_std()
}

fn on_off(enabled: bool) -> &'static str {
    if enabled {
        "on"
    } else {
        "off"
    }
}

/// Parses a one-based list position.
fn parse_index(arg: &str, len: usize) -> Option<usize> {
    match arg.parse::<usize>() {
        Ok(position) if position >= 1 && position <= len => Some(position - 1),
        _ => None,
    }
}

fn parse_slider(arg: &str, min: i32, max: i32) -> Option<i32> {
    arg.parse::<i32>().ok().filter(|value| (min..=max).contains(value))
}
