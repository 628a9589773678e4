use windows as Windows;
use Windows::core::IntoParam;
use Windows::Win32::Foundation::PWSTR;
use Windows::Win32::Media::Speech::{
    IEnumSpObjectTokens, ISpObjectToken, ISpObjectTokenCategory, ISpVoice, SpObjectToken,
    SpObjectTokenCategory, SpVoice, SPF_ASYNC, SPF_IS_XML, SPF_PARSE_SAPI, SPF_PURGEBEFORESPEAK,
    SPVOICESTATUS,
};
use Windows::Win32::System::Com::{CoCreateInstance, CLSCTX_ALL};

use tracing::{debug, warn};

use crate::com_util::{
    lcid_to_locale, locale_to_lcid, next_obj, opt_str_param, out_to_ret, ComString,
};
use crate::{Error, Locale, Result};

use super::{
    BoundaryHint, Engine, EngineEvent, EngineState, ErrorReason, EventHandler, Pitch, Rate,
    SpeechMarkup, Voice, VoiceAge, VoiceGender, Volume,
};

/// The name under which the SAPI engine is listed.
pub(crate) const ENGINE_NAME: &str = "sapi";

const VOICES_CATEGORY: &str = r"HKEY_LOCAL_MACHINE\SOFTWARE\Microsoft\Speech\Voices";
const SPRS_IS_SPEAKING: u32 = 2;

struct Token {
    intf: ISpObjectToken,
}

impl Token {
    fn new<'s, S: IntoParam<'s, PWSTR>>(id: S) -> Result<Self> {
        let intf: ISpObjectToken = unsafe { CoCreateInstance(&SpObjectToken, None, CLSCTX_ALL) }?;
        unsafe { intf.SetId(None, id, false) }?;
        Ok(Token {
            intf,
        })
    }

    fn id(&self) -> Result<String> {
        let id = unsafe { ComString::from_raw(self.intf.GetId()?) };
        Ok(id.to_string_lossy())
    }

    fn attr(&self, name: &str) -> Option<String> {
        let attrs = unsafe { self.intf.OpenKey("Attributes") }.ok()?;
        let value = unsafe { ComString::from_raw(attrs.GetStringValue(name).ok()?) };
        Some(value.to_string_lossy())
    }

    /// The first locale listed in the `Language` attribute, e.g. `409;9`.
    fn locale(&self) -> Option<Locale> {
        let language = self.attr("Language")?;
        let lcid = u32::from_str_radix(language.split(';').next()?.trim(), 16).ok()?;
        lcid_to_locale(lcid)
    }

    fn to_voice(&self) -> Option<Voice> {
        let name = self.attr("Name")?;
        let gender = self.attr("Gender").map_or(VoiceGender::Unknown, |g| {
            VoiceGender::parse_lenient(&g)
        });
        let age = self.attr("Age").map_or(VoiceAge::Other, |a| VoiceAge::parse_lenient(&a));
        let mut voice = Voice::new(name, gender, age).with_id(self.id().ok()?);
        if let Some(locale) = self.locale() {
            voice = voice.with_language(locale.code());
        }
        Some(voice)
    }
}

fn installed_voices(locale: Option<&Locale>) -> Result<Vec<Token>> {
    let category: ISpObjectTokenCategory =
        unsafe { CoCreateInstance(&SpObjectTokenCategory, None, CLSCTX_ALL) }?;
    unsafe { category.SetId(VOICES_CATEGORY, false) }?;

    let required = locale
        .and_then(locale_to_lcid)
        .map(|lcid| format!("language={:x}", lcid))
        .unwrap_or_default();
    let tokens: IEnumSpObjectTokens =
        unsafe { category.EnumTokens(required.as_str(), opt_str_param(None::<&str>).abi()) }?;

    let mut result = Vec::new();
    while let Some(intf) = unsafe { next_obj(&tokens, IEnumSpObjectTokens::Next) }? {
        result.push(Token {
            intf,
        });
    }
    Ok(result)
}

/// An engine that speaks through the Microsoft Speech API.
///
/// COM must have been initialized on the thread that creates and uses the engine (see
/// [`initialize`](crate::initialize)). The engine has to be [pumped](Engine::pump) to notice
/// that an utterance finished.
pub struct SapiEngine {
    intf: ISpVoice,
    locale: Option<Locale>,
    pitch: Pitch,
    state: EngineState,
    handler: Option<Box<dyn EventHandler>>,
}

impl SapiEngine {
    /// Creates an engine speaking with the default SAPI voice.
    pub fn new() -> Result<Self> {
        let intf: ISpVoice = unsafe { CoCreateInstance(&SpVoice, None, CLSCTX_ALL) }?;
        let locale = unsafe { intf.GetVoice() }.ok().and_then(|intf| {
            Token {
                intf,
            }
            .locale()
        });
        Ok(Self {
            intf,
            locale,
            pitch: Pitch::default(),
            state: EngineState::Ready,
            handler: None,
        })
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

    fn is_speaking(&self) -> Result<bool> {
        let status: SPVOICESTATUS =
            unsafe { out_to_ret(|out| self.intf.GetStatus(out, std::ptr::null_mut())) }?;
        Ok(status.dwRunningState == SPRS_IS_SPEAKING)
    }
}

impl Engine for SapiEngine {
    fn name(&self) -> &str {
        ENGINE_NAME
    }

    fn state(&self) -> EngineState {
        self.state
    }

    fn available_locales(&self) -> Vec<Locale> {
        let tokens = match installed_voices(None) {
            Ok(tokens) => tokens,
            Err(err) => {
                warn!("Cannot enumerate SAPI voices: {}", err);
                return Vec::new();
            }
        };
        let mut locales: Vec<Locale> = Vec::new();
        for locale in tokens.iter().filter_map(Token::locale) {
            if !locales.contains(&locale) {
                locales.push(locale);
            }
        }
        locales
    }

    fn locale(&self) -> Option<Locale> {
        self.locale.clone()
    }

    fn set_locale(&mut self, locale: &Locale) -> Result<()> {
        let token = installed_voices(Some(locale))?.into_iter().next().ok_or_else(|| {
            Error::Backend {
                reason: ErrorReason::Configuration,
                message: format!("No SAPI voice speaks {}", locale.display_name()),
            }
        })?;
        unsafe { self.intf.SetVoice(token.intf) }?;
        self.locale = Some(locale.clone());
        self.emit(EngineEvent::LocaleChanged(locale.clone()));
        Ok(())
    }

    fn available_voices(&self) -> Vec<Voice> {
        match installed_voices(self.locale.as_ref()) {
            Ok(tokens) => tokens.iter().filter_map(Token::to_voice).collect(),
            Err(err) => {
                warn!("Cannot enumerate SAPI voices: {}", err);
                Vec::new()
            }
        }
    }

    fn voice(&self) -> Option<Voice> {
        let intf = unsafe { self.intf.GetVoice() }.ok()?;
        Token {
            intf,
        }
        .to_voice()
    }

    fn set_voice(&mut self, voice: &Voice) -> Result<()> {
        let token = Token::new(voice.id())?;
        unsafe { self.intf.SetVoice(token.intf) }?;
        Ok(())
    }

    fn set_rate(&mut self, rate: Rate) -> Result<()> {
        unsafe { self.intf.SetRate(rate.to_slider()) }?;
        Ok(())
    }

    fn set_pitch(&mut self, pitch: Pitch) -> Result<()> {
        // SAPI has no default pitch; it is applied to every utterance as markup.
        self.pitch = pitch;
        Ok(())
    }

    fn set_volume(&mut self, volume: Volume) -> Result<()> {
        unsafe { self.intf.SetVolume(volume.to_slider() as u16) }?;
        Ok(())
    }

    fn say(&mut self, text: &str) -> Result<()> {
        let flags = SPF_ASYNC.0 | SPF_PURGEBEFORESPEAK.0;
        if self.pitch == Pitch::default() {
            unsafe { self.intf.Speak(text, flags as _) }?;
        } else {
            let xml = SpeechMarkup::new()
                .start_pitch(self.pitch)
                .say(text)
                .finish()
                .map_err(|err| Error::Backend {
                    reason: ErrorReason::Input,
                    message: err.to_string(),
                })?;
            debug!("Speaking {}", xml);
            unsafe { self.intf.Speak(xml.as_str(), (flags | SPF_IS_XML.0 | SPF_PARSE_SAPI.0) as _) }?;
        }
        self.transition(EngineState::Speaking);
        Ok(())
    }

    fn stop(&mut self, _hint: BoundaryHint) -> Result<()> {
        if self.state == EngineState::Paused {
            unsafe { self.intf.Resume() }?;
        }
        unsafe { self.intf.Speak("", (SPF_ASYNC.0 | SPF_PURGEBEFORESPEAK.0) as _) }?;
        if matches!(self.state, EngineState::Speaking | EngineState::Paused) {
            self.transition(EngineState::Ready);
        }
        Ok(())
    }

    fn pause(&mut self, _hint: BoundaryHint) -> Result<()> {
        if self.state == EngineState::Speaking {
            unsafe { self.intf.Pause() }?;
            self.transition(EngineState::Paused);
        }
        Ok(())
    }

    fn resume(&mut self) -> Result<()> {
        if self.state == EngineState::Paused {
            unsafe { self.intf.Resume() }?;
            self.transition(EngineState::Speaking);
        }
        Ok(())
    }

    fn subscribe(&mut self, handler: Box<dyn EventHandler>) {
        self.handler = Some(handler);
    }

    fn unsubscribe(&mut self) {
        self.handler = None;
    }

    fn pump(&mut self) {
        if self.state != EngineState::Speaking {
            return;
        }
        match self.is_speaking() {
            Ok(true) => {}
            Ok(false) => self.transition(EngineState::Ready),
            Err(err) => {
                self.emit(EngineEvent::ErrorOccurred {
                    reason: ErrorReason::Playback,
                    message: err.to_string(),
                });
                self.transition(EngineState::Error);
            }
        }
    }
}
