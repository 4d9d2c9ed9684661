//! Collaborator contracts the lesson session depends on.
//!
//! Speech engines, the progress service and the lesson store are process-wide
//! resources owned outside the session; the session only sees these traits.

use async_trait::async_trait;
use lesson_core::player::Notice;
use lesson_core::speech::RecognitionError;
use lesson_core::{Lesson, LessonError, Player, PlayerError};
use thiserror::Error;

use crate::api::ApiError;

/// Text-to-speech engine. Only one utterance plays at a time.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Speak `text` in `language`. Returns `false` when no voice fits and playback was skipped.
    async fn speak(&self, text: &str, language: &str) -> bool;

    /// Stop the current utterance, if any.
    fn cancel(&self);
}

/// Single-shot speech-to-text engine. Only one capture runs at a time.
#[async_trait]
pub trait SpeechRecognizer: Send + Sync {
    async fn recognize(&self, language: &str) -> Result<String, RecognitionError>;

    /// Stop the current capture, if any.
    fn stop(&self);
}

/// Completion sink errors.
#[derive(Debug, Error)]
pub enum CompletionError {
    #[error("{0}")]
    Rejected(String),

    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Progress service that records finished lessons.
#[async_trait]
pub trait CompletionSink: Send + Sync {
    async fn complete(&self, lesson_id: i64, experience: u32) -> Result<(), CompletionError>;
}

/// Lesson loading errors.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("lesson file error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Lesson(#[from] LessonError),
}

/// Read-only supplier of lessons.
#[async_trait]
pub trait LessonSource: Send + Sync {
    async fn fetch_lesson(&self, lesson_id: i64) -> Result<Lesson, SourceError>;
}

/// Where learner-visible messages go.
pub trait NoticeSink: Send + Sync {
    fn notify(&self, notice: &Notice);

    /// A command could not be applied.
    fn rejected(&self, _error: &PlayerError) {}

    /// The session state changed and may need redrawing.
    fn refresh(&self, _player: &Player) {}
}
