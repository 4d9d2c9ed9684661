//! Terminal speech adapters.
//!
//! `ConsoleSynthesizer` prints what would be spoken with the chosen voice;
//! `TypedRecognizer` takes the next typed line as the transcript.

use async_trait::async_trait;
use lesson_core::speech::{self, RecognitionError, Voice, SUPPORTED_LANGUAGES};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::oneshot;

use crate::adapters::{SpeechRecognizer, SpeechSynthesizer};

/// Synthesizer that writes utterances to stdout.
pub struct ConsoleSynthesizer {
    voices: Vec<Voice>,
}

impl ConsoleSynthesizer {
    pub fn new(voices: Vec<Voice>) -> Self {
        Self { voices }
    }

    /// One voice per language in the catalog that supports synthesis.
    pub fn with_catalog_voices() -> Self {
        Self::new(
            SUPPORTED_LANGUAGES
                .iter()
                .filter(|l| l.synthesis)
                .map(|l| Voice::new(format!("Console {}", l.name), l.code))
                .collect(),
        )
    }
}

#[async_trait]
impl SpeechSynthesizer for ConsoleSynthesizer {
    async fn speak(&self, text: &str, language: &str) -> bool {
        let Some(voice) = speech::select_voice(&self.voices, language) else {
            tracing::warn!("No suitable voice found for {}. Speech skipped.", language);
            return false;
        };

        let rate = speech::speaking_rate(language);
        tracing::debug!(voice = %voice.name, rate, "speaking");
        println!("  🔊 {}  ({}, rate {:.1})", text, voice.name, rate);
        true
    }

    fn cancel(&self) {
        tracing::trace!("speech cancelled");
    }
}

/// Recognizer fed by the terminal: the next line typed while listening is the transcript.
pub struct TypedRecognizer {
    pending: Mutex<Option<oneshot::Sender<String>>>,
    timeout: Duration,
}

impl TypedRecognizer {
    pub fn new(timeout: Duration) -> Self {
        Self {
            pending: Mutex::new(None),
            timeout,
        }
    }

    fn pending(&self) -> MutexGuard<'_, Option<oneshot::Sender<String>>> {
        self.pending.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Whether a capture is waiting for a line.
    pub fn is_listening(&self) -> bool {
        self.pending().is_some()
    }

    /// Hand a typed line to the waiting capture. Returns `false` if nothing was listening.
    pub fn provide(&self, line: &str) -> bool {
        match self.pending().take() {
            Some(tx) => tx.send(line.to_string()).is_ok(),
            None => false,
        }
    }
}

#[async_trait]
impl SpeechRecognizer for TypedRecognizer {
    async fn recognize(&self, language: &str) -> Result<String, RecognitionError> {
        if !speech::supports_recognition(language) {
            return Err(RecognitionError::LanguageNotSupported(language.to_string()));
        }

        let (tx, rx) = oneshot::channel();
        *self.pending() = Some(tx);

        match tokio::time::timeout(self.timeout, rx).await {
            Ok(Ok(line)) if !line.trim().is_empty() => Ok(line.trim().to_string()),
            Ok(Ok(_)) => Err(RecognitionError::NoSpeech),
            Ok(Err(_)) => Err(RecognitionError::Aborted),
            Err(_) => {
                self.pending().take();
                Err(RecognitionError::NoSpeech)
            }
        }
    }

    fn stop(&self) {
        self.pending().take();
    }
}
