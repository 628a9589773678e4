use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, Command, Stdio};
use std::thread::{self, JoinHandle};

use tracing::{debug, warn};

use crate::{Error, Locale, Result};

use super::{
    BoundaryHint, Engine, EngineEvent, EngineState, ErrorReason, EventHandler, Pitch, Rate, Voice,
    VoiceAge, VoiceGender, Volume,
};

/// The name under which the espeak-ng engine is listed.
pub(crate) const ENGINE_NAME: &str = "espeak";

const DEFAULT_WPM: f64 = 175.0;
const MIN_WPM: f64 = 80.0;
const MAX_WPM: f64 = 450.0;

#[derive(Debug, Clone, PartialEq)]
struct ListedVoice {
    language: String,
    gender: VoiceGender,
    age: VoiceAge,
    name: String,
    file: String,
}

/// Parses the table printed by `espeak-ng --voices`.
fn parse_voice_table(output: &str) -> Vec<ListedVoice> {
    output
        .lines()
        .skip(1)
        .filter_map(|line| {
            let mut columns = line.split_whitespace();
            let _priority = columns.next()?;
            let language = columns.next()?;
            let (age, gender) = columns.next()?.split_once('/')?;
            let name = columns.next()?;
            let file = columns.next()?;
            Some(ListedVoice {
                language: language.to_string(),
                gender: match gender {
                    "M" => VoiceGender::Male,
                    "F" => VoiceGender::Female,
                    _ => VoiceGender::Unknown,
                },
                age: age.parse::<u32>().map_or(VoiceAge::Other, age_group),
                name: name.replace('_', " "),
                file: file.to_string(),
            })
        })
        .collect()
}

fn age_group(years: u32) -> VoiceAge {
    match years {
        0..=12 => VoiceAge::Child,
        13..=19 => VoiceAge::Teenager,
        20..=59 => VoiceAge::Adult,
        _ => VoiceAge::Senior,
    }
}

fn listed_locale(voice: &ListedVoice) -> Option<Locale> {
    let locale: Locale = voice.language.parse().ok()?;
    let language_name = voice.name.split(" (").next().unwrap_or_default().to_string();
    Some(Locale::with_names(locale.language(), locale.region(), language_name, None))
}

fn words_per_minute(rate: Rate) -> u32 {
    let rate = rate.value();
    let wpm = if rate < 0.0 {
        DEFAULT_WPM + rate * (DEFAULT_WPM - MIN_WPM)
    } else {
        DEFAULT_WPM + rate * (MAX_WPM - DEFAULT_WPM)
    };
    wpm.round() as u32
}

fn pitch_level(pitch: Pitch) -> u32 {
    (50.0 + pitch.value() * 49.0).round() as u32
}

fn amplitude(volume: Volume) -> u32 {
    (volume.value() * 100.0).round() as u32
}

fn run(program: &Path, arg: &str) -> Result<String> {
    let output = Command::new(program).arg(arg).stdin(Stdio::null()).output()?;
    if !output.status.success() {
        return Err(Error::Unavailable(format!(
            "{} {} exited with {}",
            program.display(),
            arg,
            output.status
        )));
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Writes the text to the synthesizer's stdin on a thread of its own, so that a long text or a
/// synthesizer that stops reading never holds up the caller. Closing stdin ends the utterance.
fn feed(mut stdin: ChildStdin, text: String) -> io::Result<JoinHandle<()>> {
    thread::Builder::new().name("espeak-stdin".to_string()).spawn(move || {
        if let Err(err) = stdin.write_all(text.as_bytes()) {
            // The process was killed or exited early.
            debug!("espeak-ng stopped reading its input: {}", err);
        }
    })
}

/// Returns whether the given espeak-ng executable can be run.
pub(crate) fn is_available(program: &Path) -> bool {
    run(program, "--version").is_ok()
}

/// An engine that speaks by running the `espeak-ng` command line synthesizer.
///
/// Every utterance is a separate `espeak-ng` process. The engine has to be [pumped](Engine::pump)
/// to notice that a process finished. Pausing is not supported.
pub struct EspeakEngine {
    program: PathBuf,
    locales: Vec<(Locale, Vec<ListedVoice>)>,
    variants: Vec<ListedVoice>,
    locale: Option<Locale>,
    voice: Option<Voice>,
    rate: Rate,
    pitch: Pitch,
    volume: Volume,
    state: EngineState,
    child: Option<Child>,
    handler: Option<Box<dyn EventHandler>>,
}

impl EspeakEngine {
    /// Lists the voices of the given `espeak-ng` executable and creates an engine speaking the
    /// system locale, or the first listed locale if the system locale is not available.
    pub fn new<P: Into<PathBuf>>(program: P) -> Result<Self> {
        let program = program.into();
        let voices = parse_voice_table(&run(&program, "--voices")?);
        let variants = match run(&program, "--voices=variant") {
            Ok(output) => parse_voice_table(&output),
            Err(err) => {
                warn!("Cannot list espeak-ng variants: {}", err);
                Vec::new()
            }
        };

        let mut locales: Vec<(Locale, Vec<ListedVoice>)> = Vec::new();
        for voice in voices {
            let locale = match listed_locale(&voice) {
                Some(locale) => locale,
                None => continue,
            };
            match locales.iter_mut().find(|(l, _)| *l == locale) {
                Some((_, listed)) => listed.push(voice),
                None => locales.push((locale, vec![voice])),
            }
        }
        debug!("espeak-ng offers {} locales and {} variants", locales.len(), variants.len());

        let system = Locale::system();
        let locale = locales
            .iter()
            .map(|(locale, _)| locale)
            .find(|locale| **locale == system)
            .or_else(|| locales.iter().map(|(l, _)| l).find(|l| l.language() == system.language()))
            .or_else(|| locales.first().map(|(l, _)| l))
            .cloned();

        let mut engine = Self {
            program,
            locales,
            variants,
            locale,
            voice: None,
            rate: Rate::default(),
            pitch: Pitch::default(),
            volume: Volume::default(),
            state: EngineState::Ready,
            child: None,
            handler: None,
        };
        engine.voice = engine.available_voices().into_iter().next();
        Ok(engine)
    }

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

    fn fail(&mut self, message: String) {
        warn!("{}", message);
        self.emit(EngineEvent::ErrorOccurred {
            reason: ErrorReason::Playback,
            message,
        });
        self.transition(EngineState::Error);
    }

    fn kill_child(&mut self) {
        if let Some(mut child) = self.child.take() {
            // Fails only if the process already exited.
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}

impl Engine for EspeakEngine {
    fn name(&self) -> &str {
        ENGINE_NAME
    }

    fn state(&self) -> EngineState {
        self.state
    }

    fn available_locales(&self) -> Vec<Locale> {
        self.locales.iter().map(|(locale, _)| locale.clone()).collect()
    }

    fn locale(&self) -> Option<Locale> {
        self.locale.clone()
    }

    fn set_locale(&mut self, locale: &Locale) -> Result<()> {
        if !self.locales.iter().any(|(l, _)| l == locale) {
            return Err(Error::Backend {
                reason: ErrorReason::Configuration,
                message: format!("espeak-ng does not speak {}", locale.display_name()),
            });
        }
        self.locale = Some(locale.clone());
        self.voice = self.available_voices().into_iter().next();
        self.emit(EngineEvent::LocaleChanged(locale.clone()));
        Ok(())
    }

    fn available_voices(&self) -> Vec<Voice> {
        let (locale, listed) = match self
            .locale
            .as_ref()
            .and_then(|locale| self.locales.iter().find(|(l, _)| l == locale))
        {
            Some(entry) => entry,
            None => return Vec::new(),
        };

        let mut voices: Vec<Voice> = listed
            .iter()
            .map(|voice| {
                Voice::new(voice.name.clone(), voice.gender, voice.age)
                    .with_id(voice.language.clone())
                    .with_language(locale.code())
            })
            .collect();
        if let Some(base) = listed.first() {
            for variant in &self.variants {
                let variant_id = variant.file.rsplit('/').next().unwrap_or(&variant.file);
                voices.push(
                    Voice::new(
                        format!("{}+{}", locale.language_name(), variant.name),
                        variant.gender,
                        variant.age,
                    )
                    .with_id(format!("{}+{}", base.language, variant_id))
                    .with_language(locale.code()),
                );
            }
        }
        voices
    }

    fn voice(&self) -> Option<Voice> {
        self.voice.clone()
    }

    fn set_voice(&mut self, voice: &Voice) -> Result<()> {
        self.voice = Some(voice.clone());
        Ok(())
    }

    fn set_rate(&mut self, rate: Rate) -> Result<()> {
        self.rate = rate;
        Ok(())
    }

    fn set_pitch(&mut self, pitch: Pitch) -> Result<()> {
        self.pitch = pitch;
        Ok(())
    }

    fn set_volume(&mut self, volume: Volume) -> Result<()> {
        self.volume = volume;
        Ok(())
    }

    fn say(&mut self, text: &str) -> Result<()> {
        self.kill_child();

        let mut command = Command::new(&self.program);
        if let Some(voice) = &self.voice {
            command.arg("-v").arg(voice.id());
        }
        command
            .arg("-s")
            .arg(words_per_minute(self.rate).to_string())
            .arg("-p")
            .arg(pitch_level(self.pitch).to_string())
            .arg("-a")
            .arg(amplitude(self.volume).to_string())
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null());
        debug!("Running {:?}", command);

        let mut child = command.spawn()?;
        if let Some(stdin) = child.stdin.take() {
            if let Err(err) = feed(stdin, text.to_string()) {
                let _ = child.kill();
                let _ = child.wait();
                return Err(err.into());
            }
        }
        self.child = Some(child);
        self.transition(EngineState::Speaking);
        Ok(())
    }

    fn stop(&mut self, _hint: BoundaryHint) -> Result<()> {
        self.kill_child();
        if self.state == EngineState::Speaking {
            self.transition(EngineState::Ready);
        }
        Ok(())
    }

    fn pause(&mut self, _hint: BoundaryHint) -> Result<()> {
        Err(Error::Unsupported("pausing"))
    }

    fn resume(&mut self) -> Result<()> {
        Err(Error::Unsupported("resuming"))
    }

    fn subscribe(&mut self, handler: Box<dyn EventHandler>) {
        self.handler = Some(handler);
    }

    fn unsubscribe(&mut self) {
        self.handler = None;
    }

    fn pump(&mut self) {
        let status = match self.child.as_mut().map(Child::try_wait) {
            Some(Ok(Some(status))) => status,
            Some(Ok(None)) | None => return,
            Some(Err(err)) => {
                self.child = None;
                self.fail(format!("Lost track of espeak-ng: {}", err));
                return;
            }
        };
        self.child = None;
        if status.success() {
            self.transition(EngineState::Ready);
        } else {
            self.fail(format!("espeak-ng exited with {}", status));
        }
    }
}

impl Drop for EspeakEngine {
    fn drop(&mut self) {
        self.handler = None;
        self.kill_child();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VOICES: &str = "\
Pty Language       Age/Gender VoiceName          File                 Other Languages
 5  af              --/M      Afrikaans          gmw/af
 5  en-gb           --/M      English_(Great_Britain) gmw/en           (en 2)
 5  en-us           --/F      English_(America)  gmw/en-US            (en 3)
 5  en-us           70/M      English_(America,_old) gmw/en-US-old
";

    #[test]
    fn parses_voice_table() {
        let voices = parse_voice_table(VOICES);
        assert_eq!(voices.len(), 4);
        assert_eq!(voices[1].language, "en-gb");
        assert_eq!(voices[1].name, "English (Great Britain)");
        assert_eq!(voices[1].file, "gmw/en");
        assert_eq!(voices[2].gender, VoiceGender::Female);
        assert_eq!(voices[2].age, VoiceAge::Other);
        assert_eq!(voices[3].age, VoiceAge::Senior);
    }

    #[test]
    fn derives_locale_names_from_voice_names() {
        let voices = parse_voice_table(VOICES);
        let locale = listed_locale(&voices[2]).unwrap();
        assert_eq!(locale.code(), "en_US");
        assert_eq!(locale.language_name(), "English");
    }

    #[test]
    fn skips_malformed_lines() {
        let voices = parse_voice_table("header\n\n 5 xx\n 5 en --/M English gmw/en\n");
        assert_eq!(voices.len(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn feeding_a_process_that_does_not_read_returns_at_once() {
        use std::time::{Duration, Instant};

        let mut child = Command::new("sh")
            .arg("-c")
            .arg("exec sleep 3")
            .stdin(Stdio::piped())
            .spawn()
            .unwrap();
        let stdin = child.stdin.take().unwrap();

        let start = Instant::now();
        let writer = feed(stdin, "a".repeat(1 << 20)).unwrap();
        assert!(start.elapsed() < Duration::from_secs(1));

        child.kill().unwrap();
        child.wait().unwrap();
        writer.join().unwrap();
    }

    #[test]
    fn maps_settings_to_command_line_scales() {
        assert_eq!(words_per_minute(Rate::new(0.0)), 175);
        assert_eq!(words_per_minute(Rate::new(-1.0)), 80);
        assert_eq!(words_per_minute(Rate::new(1.0)), 450);
        assert_eq!(pitch_level(Pitch::new(0.0)), 50);
        assert_eq!(pitch_level(Pitch::new(1.0)), 99);
        assert_eq!(amplitude(Volume::new(0.7)), 70);
    }
}
