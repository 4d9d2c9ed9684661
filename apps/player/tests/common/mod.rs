//! Shared fakes and fixtures for the player integration tests.
//!
//! The fakes record every call so tests can assert on what the session did
//! after it has finished.

#![allow(dead_code)]

pub mod fixtures;

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use lesson_core::player::Notice;
use lesson_core::speech::RecognitionError;
use lesson_core::{Lesson, PlayerError, PlayerSettings};
use tokio::task::JoinHandle;

use lesson_player::adapters::{
    CompletionError, CompletionSink, NoticeSink, SpeechRecognizer, SpeechSynthesizer,
};
use lesson_player::session::{Adapters, LessonSession, SessionHandle, SessionOutcome};

/// Synthesizer that remembers what it was asked to say.
#[derive(Default)]
pub struct FakeSynth {
    pub spoken: Mutex<Vec<(String, String)>>,
    pub cancels: Mutex<usize>,
}

impl FakeSynth {
    pub fn spoken_texts(&self) -> Vec<String> {
        self.spoken.lock().unwrap().iter().map(|(t, _)| t.clone()).collect()
    }
}

#[async_trait]
impl SpeechSynthesizer for FakeSynth {
    async fn speak(&self, text: &str, language: &str) -> bool {
        self.spoken
            .lock()
            .unwrap()
            .push((text.to_string(), language.to_string()));
        true
    }

    fn cancel(&self) {
        *self.cancels.lock().unwrap() += 1;
    }
}

/// Recognizer that plays back scripted results after a fixed delay.
pub struct FakeRecognizer {
    results: Mutex<VecDeque<Result<String, RecognitionError>>>,
    delay: Duration,
    pub languages: Mutex<Vec<String>>,
    pub stops: Mutex<usize>,
}

impl FakeRecognizer {
    pub fn new(delay: Duration, results: Vec<Result<String, RecognitionError>>) -> Self {
        Self {
            results: Mutex::new(results.into()),
            delay,
            languages: Mutex::new(Vec::new()),
            stops: Mutex::new(0),
        }
    }

    pub fn stop_count(&self) -> usize {
        *self.stops.lock().unwrap()
    }
}

#[async_trait]
impl SpeechRecognizer for FakeRecognizer {
    async fn recognize(&self, language: &str) -> Result<String, RecognitionError> {
        self.languages.lock().unwrap().push(language.to_string());
        tokio::time::sleep(self.delay).await;
        self.results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(RecognitionError::NoSpeech))
    }

    fn stop(&self) {
        *self.stops.lock().unwrap() += 1;
    }
}

/// Completion sink with scripted outcomes. Succeeds once the script runs out.
#[derive(Default)]
pub struct FakeCompletion {
    script: Mutex<VecDeque<Result<(), String>>>,
    pub calls: Mutex<Vec<(i64, u32)>>,
}

impl FakeCompletion {
    pub fn scripted(script: Vec<Result<(), String>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<(i64, u32)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionSink for FakeCompletion {
    async fn complete(&self, lesson_id: i64, experience: u32) -> Result<(), CompletionError> {
        self.calls.lock().unwrap().push((lesson_id, experience));
        match self.script.lock().unwrap().pop_front() {
            Some(Err(message)) => Err(CompletionError::Rejected(message)),
            _ => Ok(()),
        }
    }
}

/// Notice sink that keeps everything it was shown.
#[derive(Default)]
pub struct RecordingNotices {
    pub notices: Mutex<Vec<Notice>>,
    pub rejections: Mutex<Vec<PlayerError>>,
}

impl RecordingNotices {
    pub fn notices(&self) -> Vec<Notice> {
        self.notices.lock().unwrap().clone()
    }

    pub fn rejections(&self) -> Vec<PlayerError> {
        self.rejections.lock().unwrap().clone()
    }

    pub fn streaks(&self) -> Vec<u32> {
        self.notices()
            .into_iter()
            .filter_map(|n| match n {
                Notice::Streak { count } => Some(count),
                _ => None,
            })
            .collect()
    }
}

impl NoticeSink for RecordingNotices {
    fn notify(&self, notice: &Notice) {
        self.notices.lock().unwrap().push(notice.clone());
    }

    fn rejected(&self, error: &PlayerError) {
        self.rejections.lock().unwrap().push(error.clone());
    }
}

/// Fakes wired into one session, kept around for assertions.
pub struct TestContext {
    pub synth: Arc<FakeSynth>,
    pub recognizer: Arc<FakeRecognizer>,
    pub completion: Arc<FakeCompletion>,
    pub notices: Arc<RecordingNotices>,
}

impl TestContext {
    pub fn new(recognizer: FakeRecognizer, completion: FakeCompletion) -> Self {
        Self {
            synth: Arc::new(FakeSynth::default()),
            recognizer: Arc::new(recognizer),
            completion: Arc::new(completion),
            notices: Arc::new(RecordingNotices::default()),
        }
    }

    /// No speech input expected and completion always succeeds.
    pub fn silent() -> Self {
        Self::new(
            FakeRecognizer::new(Duration::from_millis(100), Vec::new()),
            FakeCompletion::default(),
        )
    }

    pub fn adapters(&self) -> Adapters {
        Adapters {
            synthesizer: self.synth.clone(),
            recognizer: self.recognizer.clone(),
            completion: self.completion.clone(),
            notices: self.notices.clone(),
        }
    }

    /// Start a session on its own task.
    pub fn spawn(&self, lesson: Lesson) -> (SessionHandle, JoinHandle<SessionOutcome>) {
        let session = LessonSession::new(lesson, PlayerSettings::default(), self.adapters())
            .expect("fixture lesson should be valid");
        let handle = session.handle();
        (handle, tokio::spawn(session.run()))
    }
}

/// Let the session work through everything already due, then advance the clock.
pub async fn wait(ms: u64) {
    tokio::time::sleep(Duration::from_millis(ms)).await;
}
