//! Supported output languages

/// A selectable output language
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Language {
    /// Short code used on the wire ("en", "ta", "hi")
    pub code: &'static str,
    /// Full name, used in translation prompts
    pub name: &'static str,
    /// Locale tag handed to speech output
    pub speech_tag: &'static str,
}

pub const LANGUAGES: [Language; 3] = [
    Language { code: "en", name: "English", speech_tag: "en-US" },
    Language { code: "ta", name: "Tamil", speech_tag: "ta-IN" },
    Language { code: "hi", name: "Hindi", speech_tag: "hi-IN" },
];

pub fn lookup(code: &str) -> Option<&'static Language> {
    LANGUAGES.iter().find(|l| l.code == code)
}

/// Full language name, or the raw code when unrecognised
pub fn language_name(code: &str) -> &str {
    lookup(code).map_or(code, |l| l.name)
}

/// Speech locale tag, or the raw code when unrecognised
pub fn speech_tag(code: &str) -> &str {
    lookup(code).map_or(code, |l| l.speech_tag)
}
