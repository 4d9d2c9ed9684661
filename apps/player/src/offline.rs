//! Adapters for playing lessons without the lesson API.

use async_trait::async_trait;
use lesson_core::{parser, Lesson};
use std::path::PathBuf;

use crate::adapters::{CompletionError, CompletionSink, LessonSource, SourceError};

/// Reads a lesson payload from a JSON file on disk.
pub struct FileLessonSource {
    path: PathBuf,
}

impl FileLessonSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Load and validate the lesson in the file.
    pub async fn load(&self) -> Result<Lesson, SourceError> {
        tracing::debug!(path = %self.path.display(), "reading lesson file");
        let content = tokio::fs::read_to_string(&self.path).await?;
        Ok(parser::parse(&content)?)
    }
}

#[async_trait]
impl LessonSource for FileLessonSource {
    /// The file holds one lesson; a different requested id is logged and ignored.
    async fn fetch_lesson(&self, lesson_id: i64) -> Result<Lesson, SourceError> {
        let lesson = self.load().await?;
        if lesson.id != lesson_id {
            tracing::warn!(
                requested = lesson_id,
                found = lesson.id,
                "lesson file holds a different lesson"
            );
        }
        Ok(lesson)
    }
}

/// Completion sink that only records the result in the log.
#[derive(Debug, Default)]
pub struct LoggedCompletion;

#[async_trait]
impl CompletionSink for LoggedCompletion {
    async fn complete(&self, lesson_id: i64, experience: u32) -> Result<(), CompletionError> {
        tracing::info!(lesson_id, experience, "lesson completion recorded offline");
        Ok(())
    }
}
