//! Lesson session runtime.
//!
//! Drives a [`Player`] from a single event loop: learner commands, timer
//! firings and recognition results are queued on one channel and applied one
//! at a time. Effects returned by the player are executed against the
//! injected adapters. Timers and recognition captures run as spawned tasks
//! that report back through the same channel and are aborted on close.

use std::collections::VecDeque;
use std::sync::Arc;

use lesson_core::player::{Candidate, Effect, Notice, Ticket};
use lesson_core::speech::RecognitionError;
use lesson_core::{Lesson, LessonError, LessonSummary, Player, PlayerError, PlayerSettings};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::Instrument;
use uuid::Uuid;

use crate::adapters::{CompletionSink, NoticeSink, SpeechRecognizer, SpeechSynthesizer};

/// Something the learner asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Typed translation for a word exercise.
    Answer(String),
    /// 0-based image option.
    Pick(usize),
    Word(String),
    Translation(String),
    /// Typed stand-in for a spoken answer.
    Transcript(String),
    /// Play arbitrary text in the lesson language.
    Say(String),
    Record,
    CancelRecording,
    Replay,
    RetryCompletion,
    Close,
}

#[derive(Debug)]
enum SessionEvent {
    Command(Command),
    TimerFired(Ticket),
    Recognized(Ticket, Result<String, RecognitionError>),
}

/// How a session ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionOutcome {
    /// The progress service accepted the lesson.
    Completed(LessonSummary),
    /// The learner left before completion was recorded.
    Abandoned(LessonSummary),
}

/// Adapters a session runs against.
#[derive(Clone)]
pub struct Adapters {
    pub synthesizer: Arc<dyn SpeechSynthesizer>,
    pub recognizer: Arc<dyn SpeechRecognizer>,
    pub completion: Arc<dyn CompletionSink>,
    pub notices: Arc<dyn NoticeSink>,
}

/// Sends commands into a running session.
#[derive(Clone)]
pub struct SessionHandle {
    tx: mpsc::UnboundedSender<SessionEvent>,
}

impl SessionHandle {
    /// Returns `false` once the session has ended.
    pub fn send(&self, command: Command) -> bool {
        self.tx.send(SessionEvent::Command(command)).is_ok()
    }
}

/// One play-through of a lesson.
pub struct LessonSession {
    id: Uuid,
    player: Player,
    adapters: Adapters,
    tx: mpsc::UnboundedSender<SessionEvent>,
    rx: mpsc::UnboundedReceiver<SessionEvent>,
    timer: Option<JoinHandle<()>>,
    recognition: Option<JoinHandle<()>>,
    speech: Option<JoinHandle<()>>,
    completed: Option<LessonSummary>,
}

impl LessonSession {
    /// Open a session. Fails if the lesson cannot be played.
    pub fn new(
        lesson: Lesson,
        settings: PlayerSettings,
        adapters: Adapters,
    ) -> Result<Self, LessonError> {
        let player = Player::new(lesson, settings)?;
        let (tx, rx) = mpsc::unbounded_channel();

        Ok(Self {
            id: Uuid::new_v4(),
            player,
            adapters,
            tx,
            rx,
            timer: None,
            recognition: None,
            speech: None,
            completed: None,
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    pub fn handle(&self) -> SessionHandle {
        SessionHandle {
            tx: self.tx.clone(),
        }
    }

    /// Run until the lesson is completed or closed.
    pub async fn run(mut self) -> SessionOutcome {
        let span = tracing::info_span!(
            "lesson",
            lesson_id = self.player.lesson().id,
            session = %self.id
        );

        async move {
            tracing::info!(
                title = %self.player.lesson().title,
                exercises = self.player.total_exercises(),
                "lesson opened"
            );

            let start = self.player.start();
            self.execute(start).await;

            while !self.player.is_closed() {
                let Some(event) = self.rx.recv().await else {
                    break;
                };
                self.dispatch(event).await;
            }

            self.shutdown();
            self.outcome()
        }
        .instrument(span)
        .await
    }

    async fn dispatch(&mut self, event: SessionEvent) {
        let effects = match event {
            SessionEvent::Command(command) => match self.apply(command) {
                Ok(effects) => effects,
                Err(error) => {
                    tracing::debug!(%error, "command rejected");
                    self.adapters.notices.rejected(&error);
                    return;
                }
            },
            SessionEvent::TimerFired(ticket) => {
                self.timer = None;
                self.player.timer_fired(ticket)
            }
            SessionEvent::Recognized(ticket, result) => {
                self.recognition = None;
                if let Err(error) = &result {
                    tracing::warn!(code = error.code(), "speech recognition failed");
                }
                self.player.recognition_finished(ticket, result)
            }
        };

        self.execute(effects).await;
        self.adapters.notices.refresh(&self.player);
    }

    fn apply(&mut self, command: Command) -> Result<Vec<Effect>, PlayerError> {
        match command {
            Command::Answer(text) => self.player.select_answer(Candidate::Text(text)),
            Command::Pick(index) => self.player.select_answer(Candidate::Image(index)),
            Command::Transcript(text) => self.player.select_answer(Candidate::Transcript(text)),
            Command::Word(word) => self.player.select_word(&word),
            Command::Translation(translation) => self.player.select_translation(&translation),
            Command::Say(text) => self.player.speak(&text),
            Command::Record => self.player.start_recording(),
            Command::CancelRecording => Ok(self.player.cancel_recording()),
            Command::Replay => self.player.replay(),
            Command::RetryCompletion => self.player.retry_finalize(),
            Command::Close => {
                tracing::info!("lesson closed by learner");
                Ok(self.player.close())
            }
        }
    }

    async fn execute(&mut self, effects: Vec<Effect>) {
        let mut queue: VecDeque<Effect> = effects.into();

        while let Some(effect) = queue.pop_front() {
            tracing::trace!(?effect, "executing");
            match effect {
                Effect::Speak { text, language } => {
                    let synthesizer = self.adapters.synthesizer.clone();
                    self.speech = Some(tokio::spawn(async move {
                        if !synthesizer.speak(&text, &language).await {
                            tracing::debug!(%language, "no voice available, playback skipped");
                        }
                    }));
                }
                Effect::CancelSpeech => {
                    self.adapters.synthesizer.cancel();
                    abort(&mut self.speech);
                }
                Effect::StartRecognition { ticket, language } => {
                    let recognizer = self.adapters.recognizer.clone();
                    let tx = self.tx.clone();
                    self.recognition = Some(tokio::spawn(async move {
                        let result = recognizer.recognize(&language).await;
                        let _ = tx.send(SessionEvent::Recognized(ticket, result));
                    }));
                }
                Effect::StopRecognition => {
                    self.adapters.recognizer.stop();
                    abort(&mut self.recognition);
                }
                Effect::ScheduleTimer { ticket, delay } => {
                    abort(&mut self.timer);
                    let tx = self.tx.clone();
                    self.timer = Some(tokio::spawn(async move {
                        tokio::time::sleep(delay).await;
                        let _ = tx.send(SessionEvent::TimerFired(ticket));
                    }));
                }
                Effect::CancelTimer => abort(&mut self.timer),
                Effect::Finalize {
                    lesson_id,
                    experience,
                } => {
                    let follow_up = self.finalize(lesson_id, experience).await;
                    queue.extend(follow_up);
                }
                Effect::Notify(notice) => {
                    if let Notice::LessonCompleted { summary } = &notice {
                        self.completed = Some(summary.clone());
                    }
                    self.adapters.notices.notify(&notice);
                }
            }
        }
    }

    async fn finalize(&mut self, lesson_id: i64, experience: u32) -> Vec<Effect> {
        tracing::info!(experience, "reporting lesson completion");

        let result = match self.adapters.completion.complete(lesson_id, experience).await {
            Ok(()) => self.player.completion_succeeded(),
            Err(error) => {
                tracing::warn!(%error, "lesson completion failed");
                self.player.completion_failed(error.to_string())
            }
        };

        result.unwrap_or_else(|error| {
            tracing::debug!(%error, "completion result ignored");
            Vec::new()
        })
    }

    fn shutdown(&mut self) {
        abort(&mut self.timer);
        abort(&mut self.recognition);
        abort(&mut self.speech);
    }

    fn outcome(&self) -> SessionOutcome {
        match &self.completed {
            Some(summary) => {
                tracing::info!(experience = summary.experience, "lesson completed");
                SessionOutcome::Completed(summary.clone())
            }
            None => SessionOutcome::Abandoned(self.player.summary()),
        }
    }
}

fn abort(task: &mut Option<JoinHandle<()>>) {
    if let Some(handle) = task.take() {
        handle.abort();
    }
}
