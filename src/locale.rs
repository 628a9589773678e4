//! Language and region pairs that select pronunciation and vocabulary.

use std::fmt::{self, Display};
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use crate::{Error, Result};

const LANGUAGES: &[(&str, &str)] = &[
    ("af", "Afrikaans"),
    ("ar", "Arabic"),
    ("bg", "Bulgarian"),
    ("ca", "Catalan"),
    ("cs", "Czech"),
    ("cy", "Welsh"),
    ("da", "Danish"),
    ("de", "German"),
    ("el", "Greek"),
    ("en", "English"),
    ("eo", "Esperanto"),
    ("es", "Spanish"),
    ("et", "Estonian"),
    ("eu", "Basque"),
    ("fa", "Persian"),
    ("fi", "Finnish"),
    ("fr", "French"),
    ("ga", "Irish"),
    ("he", "Hebrew"),
    ("hi", "Hindi"),
    ("hr", "Croatian"),
    ("hu", "Hungarian"),
    ("id", "Indonesian"),
    ("is", "Icelandic"),
    ("it", "Italian"),
    ("ja", "Japanese"),
    ("ko", "Korean"),
    ("la", "Latin"),
    ("lt", "Lithuanian"),
    ("lv", "Latvian"),
    ("nb", "Norwegian Bokmål"),
    ("nl", "Dutch"),
    ("pl", "Polish"),
    ("pt", "Portuguese"),
    ("ro", "Romanian"),
    ("ru", "Russian"),
    ("sk", "Slovak"),
    ("sl", "Slovenian"),
    ("sr", "Serbian"),
    ("sv", "Swedish"),
    ("sw", "Swahili"),
    ("th", "Thai"),
    ("tr", "Turkish"),
    ("uk", "Ukrainian"),
    ("vi", "Vietnamese"),
    ("zh", "Chinese"),
];

const REGIONS: &[(&str, &str)] = &[
    ("AR", "Argentina"),
    ("AT", "Austria"),
    ("AU", "Australia"),
    ("BE", "Belgium"),
    ("BR", "Brazil"),
    ("CA", "Canada"),
    ("CH", "Switzerland"),
    ("CN", "China"),
    ("CZ", "Czechia"),
    ("DE", "Germany"),
    ("DK", "Denmark"),
    ("ES", "Spain"),
    ("FI", "Finland"),
    ("FR", "France"),
    ("GB", "United Kingdom"),
    ("HK", "Hong Kong"),
    ("IE", "Ireland"),
    ("IN", "India"),
    ("IT", "Italy"),
    ("JP", "Japan"),
    ("KR", "South Korea"),
    ("MX", "Mexico"),
    ("NL", "Netherlands"),
    ("NO", "Norway"),
    ("NZ", "New Zealand"),
    ("PL", "Poland"),
    ("PT", "Portugal"),
    ("RS", "Serbia"),
    ("RU", "Russia"),
    ("SE", "Sweden"),
    ("TW", "Taiwan"),
    ("UA", "Ukraine"),
    ("US", "United States"),
    ("ZA", "South Africa"),
];

fn lookup(table: &[(&str, &'static str)], code: &str) -> Option<&'static str> {
    table.iter().find(|(c, _)| *c == code).map(|(_, name)| *name)
}

/// A language, optionally narrowed down to a region.
///
/// Two locales are equal when their canonical codes (see [`code`](Locale::code)) are equal. The
/// display names take no part in the comparison.
#[derive(Debug, Clone)]
pub struct Locale {
    language: String,
    region: Option<String>,
    language_name: String,
    region_name: Option<String>,
}

impl Locale {
    /// Creates a locale from ISO 639 language and ISO 3166 region codes, looking up their
    /// English names in a built-in table. Unknown codes are used as their own names.
    pub fn new(language: &str, region: Option<&str>) -> Self {
        let language = language.to_ascii_lowercase();
        let region = region.filter(|r| !r.is_empty()).map(str::to_ascii_uppercase);
        let language_name = lookup(LANGUAGES, &language)
            .map(str::to_string)
            .unwrap_or_else(|| language.clone());
        let region_name = region
            .as_deref()
            .map(|r| lookup(REGIONS, r).map(str::to_string).unwrap_or_else(|| r.to_string()));
        Self {
            language,
            region,
            language_name,
            region_name,
        }
    }

    /// Creates a locale with display names supplied by the caller, e.g. by the operating system.
    pub fn with_names(
        language: &str,
        region: Option<&str>,
        language_name: String,
        region_name: Option<String>,
    ) -> Self {
        let mut locale = Self::new(language, region);
        if !language_name.is_empty() {
            locale.language_name = language_name;
        }
        if locale.region.is_some() {
            if let Some(region_name) = region_name.filter(|n| !n.is_empty()) {
                locale.region_name = Some(region_name);
            }
        }
        locale
    }

    /// Returns the platform's default locale.
    ///
    /// On Windows this is the user default locale. Elsewhere it is taken from the first non-empty
    /// of `LC_ALL`, `LC_MESSAGES` and `LANG`, ignoring the `C` and `POSIX` pseudo-locales. If none
    /// of those yields a locale, `en_US` is returned.
    pub fn system() -> Self {
        platform_default().unwrap_or_else(|| Self::new("en", Some("US")))
    }

    /// The lowercase ISO 639 language code, e.g. `en`.
    pub fn language(&self) -> &str {
        &self.language
    }

    /// The uppercase ISO 3166 region code, e.g. `US`, if the locale has one.
    pub fn region(&self) -> Option<&str> {
        self.region.as_deref()
    }

    /// The name of the language, e.g. `English`.
    pub fn language_name(&self) -> &str {
        &self.language_name
    }

    /// The name of the region, e.g. `United States`.
    pub fn region_name(&self) -> Option<&str> {
        self.region_name.as_deref()
    }

    /// The canonical code of the locale: `en_US`, or `en` if it has no region.
    pub fn code(&self) -> String {
        match &self.region {
            Some(region) => format!("{}_{}", self.language, region),
            None => self.language.clone(),
        }
    }

    /// The label under which the locale is listed, e.g. `English (United States)`.
    pub fn display_name(&self) -> String {
        match &self.region_name {
            Some(region_name) => format!("{} ({})", self.language_name, region_name),
            None => self.language_name.clone(),
        }
    }
}

impl PartialEq for Locale {
    fn eq(&self, other: &Self) -> bool {
        self.language == other.language && self.region == other.region
    }
}

impl Eq for Locale {}

impl Hash for Locale {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.language.hash(state);
        self.region.hash(state);
    }
}

impl Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.code())
    }
}

impl FromStr for Locale {
    type Err = Error;

    /// Parses `en`, `en_US`, `en-us` or `en_US.UTF-8@euro`.
    fn from_str(s: &str) -> Result<Self> {
        let code = s.split(['.', '@']).next().unwrap_or_default().trim();
        let mut parts = code.split(['_', '-']);
        let language = parts.next().unwrap_or_default();
        if language.is_empty() || !language.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(Error::InvalidLocale(s.to_string()));
        }
        let region = parts.next();
        if let Some(region) = region {
            if !region.chars().all(|c| c.is_ascii_alphanumeric()) {
                return Err(Error::InvalidLocale(s.to_string()));
            }
        }
        Ok(Self::new(language, region))
    }
}

#[cfg(windows)]
fn platform_default() -> Option<Locale> {
    crate::com_util::user_default_locale()
}

#[cfg(not(windows))]
fn platform_default() -> Option<Locale> {
    ["LC_ALL", "LC_MESSAGES", "LANG"]
        .iter()
        .filter_map(|var| std::env::var(var).ok())
        .find(|value| !value.is_empty())
        .filter(|value| value != "C" && value != "POSIX" && !value.starts_with("C."))
        .and_then(|value| value.parse().ok())
}
