use std::str::FromStr;

use strum_macros::{Display, EnumString, IntoStaticStr};

/// The age of a voice, as reported by the engine.
#[derive(Debug, Hash, PartialEq, Eq, Clone, Copy, Default, Display, EnumString, IntoStaticStr)]
#[strum(ascii_case_insensitive)]
pub enum VoiceAge {
    #[allow(missing_docs)]
    Child,
    #[allow(missing_docs)]
    #[strum(to_string = "Teenager", serialize = "Teen")]
    Teenager,
    #[allow(missing_docs)]
    Adult,
    #[allow(missing_docs)]
    Senior,
    /// The engine did not say, or the age fits none of the other categories.
    #[default]
    Other,
}

/// The gender of a voice, as reported by the engine.
#[derive(Debug, Hash, PartialEq, Eq, Clone, Copy, Default, Display, EnumString, IntoStaticStr)]
#[strum(ascii_case_insensitive)]
pub enum VoiceGender {
    #[allow(missing_docs)]
    Male,
    #[allow(missing_docs)]
    Female,
    /// The engine did not say, or described the voice as neutral.
    #[default]
    #[strum(to_string = "Unknown", serialize = "Neutral")]
    Unknown,
}

impl VoiceAge {
    /// Parses an engine-supplied age attribute, mapping anything unrecognized to `Other`.
    pub fn parse_lenient(s: &str) -> Self {
        Self::from_str(s.trim()).unwrap_or_default()
    }

    fn label(self) -> Option<&'static str> {
        match self {
            Self::Other => None,
            other => Some(other.into()),
        }
    }
}

impl VoiceGender {
    /// Parses an engine-supplied gender attribute, mapping anything unrecognized to `Unknown`.
    pub fn parse_lenient(s: &str) -> Self {
        Self::from_str(s.trim()).unwrap_or_default()
    }

    /// Best-effort guess of the gender from the text of a voice identifier.
    ///
    /// `female` is checked before `male`, since the former contains the latter.
    pub fn infer_from(identifier: &str) -> Self {
        let identifier = identifier.to_lowercase();
        if identifier.contains("female") || identifier.contains("grandma") {
            Self::Female
        } else if identifier.contains("male") || identifier.contains("grandpa") {
            Self::Male
        } else {
            Self::Unknown
        }
    }

    fn label(self) -> Option<&'static str> {
        match self {
            Self::Unknown => None,
            other => Some(other.into()),
        }
    }
}

/// A synthetic voice offered by an engine.
///
/// The identifier is opaque and only meaningful to the engine that listed the voice. Voices are
/// compared by identifier when matching them against the engine's current voice.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Voice {
    id: String,
    name: String,
    gender: VoiceGender,
    age: VoiceAge,
    language: Option<String>,
}

impl Voice {
    /// Creates a voice whose name doubles as its identifier.
    pub fn new<S: Into<String>>(name: S, gender: VoiceGender, age: VoiceAge) -> Self {
        let name = name.into();
        Self {
            id: name.clone(),
            name,
            gender,
            age,
            language: None,
        }
    }

    /// Replaces the engine-specific identifier of the voice.
    pub fn with_id<S: Into<String>>(mut self, id: S) -> Self {
        self.id = id.into();
        self
    }

    /// Attaches the locale code of the language the voice speaks.
    pub fn with_language<S: Into<String>>(mut self, language: S) -> Self {
        self.language = Some(language.into());
        self
    }

    /// The engine-specific identifier of the voice.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The raw name of the voice, as the engine reports it.
    pub fn name(&self) -> &str {
        &self.name
    }

    #[allow(missing_docs)]
    pub fn gender(&self) -> VoiceGender {
        self.gender
    }

    #[allow(missing_docs)]
    pub fn age(&self) -> VoiceAge {
        self.age
    }

    /// The locale code of the language the voice speaks, if the engine reported one.
    pub fn language(&self) -> Option<&str> {
        self.language.as_deref()
    }

    /// Derives the label under which the voice is listed for a locale whose language is called
    /// `language_name`.
    ///
    /// The language name and a following `+` are stripped from the front of the voice name, along
    /// with surrounding whitespace. If the engine doesn't know the gender, it is guessed from what
    /// is left of the name. The remaining name, the gender and the age are joined with `" - "`,
    /// leaving out any part that is empty or unknown. Returns `None` if nothing is left to show.
    ///
    /// ```
    /// # use speech_panel::tts::{Voice, VoiceAge, VoiceGender};
    /// let voice = Voice::new("English+grandma", VoiceGender::Unknown, VoiceAge::Other);
    /// assert_eq!(voice.display_name("English").as_deref(), Some("grandma - Female"));
    /// ```
    pub fn display_name(&self, language_name: &str) -> Option<String> {
        let mut name = self.name.as_str();
        if !language_name.is_empty() {
            if let Some(rest) = name.strip_prefix(language_name) {
                name = rest.strip_prefix('+').unwrap_or(rest);
            }
        }
        let name = name.trim();

        let gender = match self.gender {
            VoiceGender::Unknown => VoiceGender::infer_from(name),
            known => known,
        };

        let parts: Vec<&str> = [Some(name), gender.label(), self.age.label()]
            .into_iter()
            .flatten()
            .filter(|part| !part.is_empty())
            .collect();
        if parts.is_empty() {
            None
        } else {
            Some(parts.join(" - "))
        }
    }
}
