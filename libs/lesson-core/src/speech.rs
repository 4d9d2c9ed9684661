//! Speech language policy: supported languages, voice choice and recognition failures.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Capabilities of one speech language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SpeechLanguage {
    pub code: &'static str,
    pub name: &'static str,
    pub recognition: bool,
    pub synthesis: bool,
}

const fn language(
    code: &'static str,
    name: &'static str,
    recognition: bool,
    synthesis: bool,
) -> SpeechLanguage {
    SpeechLanguage {
        code,
        name,
        recognition,
        synthesis,
    }
}

/// Languages the player knows how to speak and listen to.
pub const SUPPORTED_LANGUAGES: &[SpeechLanguage] = &[
    language("en-US", "English (US)", true, true),
    language("en-GB", "English (UK)", true, true),
    language("es-ES", "Spanish (Spain)", true, true),
    language("fr-FR", "French (France)", true, true),
    language("de-DE", "German", true, true),
    language("it-IT", "Italian", true, true),
    language("pt-BR", "Portuguese (Brazil)", true, true),
    language("ru-RU", "Russian", true, true),
    language("zh-CN", "Chinese (China)", true, true),
    language("ja-JP", "Japanese", true, true),
    language("ko-KR", "Korean", true, true),
    language("ar", "Arabic (Saudi Arabia)", false, true),
    language("hi-IN", "Hindi", false, true),
];

/// Look up a language by exact code.
pub fn find_language(code: &str) -> Option<&'static SpeechLanguage> {
    SUPPORTED_LANGUAGES.iter().find(|l| l.code == code)
}

/// Whether speech recognition is available for a language.
pub fn supports_recognition(code: &str) -> bool {
    find_language(code).is_some_and(|l| l.recognition)
}

/// Primary subtag, e.g. `es` for `es-ES`.
pub fn language_prefix(code: &str) -> &str {
    code.split('-').next().unwrap_or(code)
}

/// A synthesis voice offered by the platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Voice {
    pub name: String,
    pub lang: String,
}

impl Voice {
    pub fn new(name: impl Into<String>, lang: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            lang: lang.into(),
        }
    }
}

/// Pick the voice for a language: exact code first, then same primary subtag.
///
/// Microsoft voices are skipped. `None` means playback should be skipped.
pub fn select_voice<'a>(voices: &'a [Voice], code: &str) -> Option<&'a Voice> {
    let prefix = language_prefix(code);
    let usable = |v: &&Voice| !v.name.contains("Microsoft");

    voices
        .iter()
        .filter(usable)
        .find(|v| v.lang == code)
        .or_else(|| voices.iter().filter(usable).find(|v| v.lang.starts_with(prefix)))
}

/// Speaking rate: slower for Japanese, Chinese and Korean.
pub fn speaking_rate(code: &str) -> f32 {
    match code {
        "ja-JP" | "zh-CN" | "ko-KR" => 0.8,
        _ => 1.0,
    }
}

/// Failure reported by a speech recognition engine.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecognitionError {
    #[error("No speech was detected")]
    NoSpeech,

    #[error("No microphone was found")]
    AudioCapture,

    #[error("Permission to use microphone was denied")]
    NotAllowed,

    #[error("Listening was aborted")]
    Aborted,

    #[error("Network communication failed")]
    Network,

    #[error("Speech recognition is not available")]
    ServiceNotAllowed,

    #[error("Language {0} is not supported for recognition")]
    LanguageNotSupported(String),

    #[error("Error occurred during speech recognition: {0}")]
    Other(String),
}

impl RecognitionError {
    /// Map an engine error code (`no-speech`, `not-allowed`, ...) to a kind.
    pub fn from_code(code: &str, language: &str) -> Self {
        match code {
            "no-speech" => Self::NoSpeech,
            "audio-capture" => Self::AudioCapture,
            "not-allowed" => Self::NotAllowed,
            "aborted" => Self::Aborted,
            "network" => Self::Network,
            "service-not-allowed" => Self::ServiceNotAllowed,
            "language-not-supported" => Self::LanguageNotSupported(language.to_string()),
            other => Self::Other(other.to_string()),
        }
    }

    /// Engine error code for this kind.
    pub fn code(&self) -> &str {
        match self {
            Self::NoSpeech => "no-speech",
            Self::AudioCapture => "audio-capture",
            Self::NotAllowed => "not-allowed",
            Self::Aborted => "aborted",
            Self::Network => "network",
            Self::ServiceNotAllowed => "service-not-allowed",
            Self::LanguageNotSupported(_) => "language-not-supported",
            Self::Other(code) => code,
        }
    }
}
