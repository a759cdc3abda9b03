//! ISO 639 language codes and their English names.
//!
//! Covers the languages books are commonly tagged with; codes outside the
//! table are dropped.

/// `(ISO 639-2 code, ISO 639-1 code, English name)`.
const LANGUAGES: &[(&str, &str, &str)] = &[
    ("ara", "ar", "Arabic"),
    ("bul", "bg", "Bulgarian"),
    ("cat", "ca", "Catalan"),
    ("ces", "cs", "Czech"),
    ("dan", "da", "Danish"),
    ("deu", "de", "German"),
    ("ell", "el", "Greek, Modern (1453-)"),
    ("eng", "en", "English"),
    ("epo", "eo", "Esperanto"),
    ("est", "et", "Estonian"),
    ("eus", "eu", "Basque"),
    ("fas", "fa", "Persian"),
    ("fin", "fi", "Finnish"),
    ("fra", "fr", "French"),
    ("gle", "ga", "Irish"),
    ("glg", "gl", "Galician"),
    ("heb", "he", "Hebrew"),
    ("hin", "hi", "Hindi"),
    ("hrv", "hr", "Croatian"),
    ("hun", "hu", "Hungarian"),
    ("ind", "id", "Indonesian"),
    ("isl", "is", "Icelandic"),
    ("ita", "it", "Italian"),
    ("jpn", "ja", "Japanese"),
    ("kor", "ko", "Korean"),
    ("lat", "la", "Latin"),
    ("lav", "lv", "Latvian"),
    ("lit", "lt", "Lithuanian"),
    ("nld", "nl", "Dutch"),
    ("nor", "no", "Norwegian"),
    ("pol", "pl", "Polish"),
    ("por", "pt", "Portuguese"),
    ("ron", "ro", "Romanian"),
    ("rus", "ru", "Russian"),
    ("slk", "sk", "Slovak"),
    ("slv", "sl", "Slovenian"),
    ("spa", "es", "Spanish"),
    ("srp", "sr", "Serbian"),
    ("swe", "sv", "Swedish"),
    ("tha", "th", "Thai"),
    ("tur", "tr", "Turkish"),
    ("ukr", "uk", "Ukrainian"),
    ("vie", "vi", "Vietnamese"),
    ("zho", "zh", "Chinese"),
];

/// Bibliographic codes some catalogs still use.
const ALTERNATE_CODES: &[(&str, &str)] = &[
    ("chi", "zho"),
    ("cze", "ces"),
    ("dut", "nld"),
    ("fre", "fra"),
    ("ger", "deu"),
    ("gre", "ell"),
    ("per", "fas"),
    ("rum", "ron"),
    ("slo", "slk"),
];

/// The three-letter code for a language code or English name.
#[must_use]
pub fn canonicalize(value: &str) -> Option<&'static str> {
    let value = value.trim().to_lowercase();
    if value.is_empty() {
        return None;
    }
    let value = ALTERNATE_CODES
        .iter()
        .find(|(alt, _)| *alt == value)
        .map_or(value.as_str(), |(_, code)| code);
    LANGUAGES
        .iter()
        .find(|(three, two, name)| {
            *three == value || *two == value || name.to_lowercase() == value
        })
        .map(|(three, _, _)| *three)
}

/// The English name for a language code.
#[must_use]
pub fn name_for(code: &str) -> Option<&'static str> {
    let code = canonicalize(code)?;
    LANGUAGES
        .iter()
        .find(|(three, _, _)| *three == code)
        .map(|(_, _, name)| *name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_codes() {
        assert_eq!(canonicalize("en"), Some("eng"));
        assert_eq!(canonicalize("ENG"), Some("eng"));
        assert_eq!(canonicalize("French"), Some("fra"));
        assert_eq!(canonicalize("ger"), Some("deu"));
        assert_eq!(canonicalize("klingon"), None);
    }

    #[test]
    fn names() {
        assert_eq!(name_for("deu"), Some("German"));
        assert_eq!(name_for("xx"), None);
    }
}
