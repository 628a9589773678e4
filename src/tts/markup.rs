use xml::writer::{Error as XmlError, XmlEvent};
use xml::{EmitterConfig, EventWriter};

use super::{Pitch, Rate, Volume};

/// Builds speech as SAPI XML markup, so that settings the synthesizer has no direct setter for
/// can be applied to a single utterance.
///
/// ```
/// # use speech_panel::tts::{Pitch, SpeechMarkup};
/// let xml = SpeechMarkup::new().start_pitch(Pitch::new(0.5)).say("hello").finish().unwrap();
/// assert_eq!(xml, r#"<pitch absmiddle="5">hello</pitch>"#);
/// ```
pub struct SpeechMarkup {
    writer: EventWriter<Vec<u8>>,
    open: Vec<&'static str>,
    error: Option<XmlError>,
}

impl SpeechMarkup {
    /// Creates an empty piece of markup.
    pub fn new() -> Self {
        Self {
            writer: EventWriter::new_with_config(
                Vec::new(),
                EmitterConfig::new()
                    .keep_element_names_stack(false)
                    .write_document_declaration(false),
            ),
            open: Vec::new(),
            error: None,
        }
    }

    /// Starts a section spoken at the given pitch, mapped to SAPI's [-10, 10] scale.
    pub fn start_pitch(self, pitch: Pitch) -> Self {
        let value = pitch.to_slider().to_string();
        self.start_element("pitch", "absmiddle", &value)
    }

    /// Starts a section spoken at the given rate, mapped to SAPI's [-10, 10] scale.
    pub fn start_rate(self, rate: Rate) -> Self {
        let value = rate.to_slider().to_string();
        self.start_element("rate", "absspeed", &value)
    }

    /// Starts a section spoken at the given volume, mapped to SAPI's [0, 100] scale.
    pub fn start_volume(self, volume: Volume) -> Self {
        let value = volume.to_slider().to_string();
        self.start_element("volume", "level", &value)
    }

    /// Appends text to speak. Markup characters in the text are escaped.
    pub fn say<S: AsRef<str>>(mut self, text: S) -> Self {
        let result = self.writer.write(XmlEvent::characters(text.as_ref()));
        self.keep_error(result);
        self
    }

    /// Ends the most recently started section.
    pub fn end(mut self) -> Self {
        if let Some(name) = self.open.pop() {
            let result = self.writer.write(XmlEvent::end_element().name(name));
            self.keep_error(result);
        }
        self
    }

    /// Ends every open section and returns the markup.
    pub fn finish(mut self) -> Result<String, XmlError> {
        while !self.open.is_empty() {
            self = self.end();
        }
        if let Some(err) = self.error {
            return Err(err);
        }
        // The emitter only ever writes UTF-8.
        Ok(String::from_utf8_lossy(&self.writer.into_inner()).into_owned())
    }

    fn start_element(mut self, name: &'static str, attr: &str, value: &str) -> Self {
        let result = self.writer.write(XmlEvent::start_element(name).attr(attr, value));
        self.keep_error(result);
        self.open.push(name);
        self
    }

    fn keep_error(&mut self, result: Result<(), XmlError>) {
        if let Err(err) = result {
            self.error.get_or_insert(err);
        }
    }
}

impl Default for SpeechMarkup {
    fn default() -> Self {
        Self::new()
    }
}
