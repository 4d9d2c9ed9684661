//! Exercise player state machine.
//!
//! The player owns the session state of one lesson play-through. It never
//! touches a clock, a speaker or a microphone: every operation mutates the
//! session and returns the [`Effect`]s the runtime has to carry out. Timers
//! and recognition requests are identified by [`Ticket`]s so a late timer or
//! transcript can be recognised and dropped.
//!
//! ```text
//! Presenting(i) --answer--> Feedback(verdict) --timer--> Presenting(i + 1)
//!                                              \--timer--> Completing --ok--> Closed
//! ```

use crate::error::{LessonError, PlayerError};
use crate::matching::{grade_pronunciation, grade_translation, is_valid_pair};
use crate::parser;
use crate::scoring::{experience_earned, LessonSummary};
use crate::speech::RecognitionError;
use crate::types::{
    AnswerRecord, Exercise, ExerciseKind, Lesson, MatchPair, PlayerSettings, Verdict,
};
use chrono::Utc;
use serde::Serialize;
use std::time::Duration;

/// Answer recorded for a finished matching exercise.
pub const MATCHING_COMPLETE_ANSWER: &str = "complete";

/// Where the player is in the lesson.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Phase {
    /// Waiting for input on the exercise at `index`.
    Presenting { index: usize },
    /// Exercise resolved; the advance timer is pending.
    Feedback { index: usize, verdict: Verdict },
    /// All exercises resolved; waiting for the completion sink.
    Completing,
    Closed,
}

/// Identifies one timer or one recognition request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Ticket(pub u64);

/// Learner-visible message.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Notice {
    Streak { count: u32 },
    RecognitionFailed { error: RecognitionError },
    CompletionFailed { message: String },
    LessonCompleted { summary: LessonSummary },
}

/// Work the runtime must perform on behalf of the player.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "effect", rename_all = "snake_case")]
pub enum Effect {
    Speak { text: String, language: String },
    CancelSpeech,
    StartRecognition { ticket: Ticket, language: String },
    StopRecognition,
    /// Replaces any pending timer.
    ScheduleTimer { ticket: Ticket, delay: Duration },
    CancelTimer,
    Finalize { lesson_id: i64, experience: u32 },
    Notify(Notice),
}

/// A single-shot answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Candidate {
    /// Typed translation for a word exercise.
    Text(String),
    /// Index into the image options.
    Image(usize),
    /// Speech transcript for a pronunciation exercise.
    Transcript(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TimerAction {
    ClearFeedback,
    Advance,
}

/// Session state of one lesson play-through.
#[derive(Debug)]
pub struct Player {
    lesson: Lesson,
    settings: PlayerSettings,
    phase: Phase,
    score: u32,
    streak: u32,
    best_streak: u32,
    answers: Vec<AnswerRecord>,
    matched: Vec<MatchPair>,
    selected_word: Option<String>,
    selected_translation: Option<String>,
    feedback: Option<Verdict>,
    recording: Option<Ticket>,
    recognition_error: Option<RecognitionError>,
    completion_in_flight: bool,
    completion_error: Option<String>,
    pending: Option<(Ticket, TimerAction)>,
    next_ticket: u64,
}

impl Player {
    /// Open a session. Malformed lessons are rejected before any state exists.
    pub fn new(lesson: Lesson, settings: PlayerSettings) -> Result<Self, LessonError> {
        parser::validate(&lesson)?;

        Ok(Self {
            lesson,
            settings,
            phase: Phase::Presenting { index: 0 },
            score: 0,
            streak: 0,
            best_streak: 0,
            answers: Vec::new(),
            matched: Vec::new(),
            selected_word: None,
            selected_translation: None,
            feedback: None,
            recording: None,
            recognition_error: None,
            completion_in_flight: false,
            completion_error: None,
            pending: None,
            next_ticket: 0,
        })
    }

    /// Effects for presenting the first exercise.
    pub fn start(&self) -> Vec<Effect> {
        match self.phase {
            Phase::Presenting { index } => self.presentation_effects(index),
            _ => Vec::new(),
        }
    }

    pub fn lesson(&self) -> &Lesson {
        &self.lesson
    }

    pub fn settings(&self) -> &PlayerSettings {
        &self.settings
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_closed(&self) -> bool {
        self.phase == Phase::Closed
    }

    /// Index of the exercise being presented or showing feedback.
    pub fn index(&self) -> Option<usize> {
        match self.phase {
            Phase::Presenting { index } | Phase::Feedback { index, .. } => Some(index),
            Phase::Completing | Phase::Closed => None,
        }
    }

    pub fn current_exercise(&self) -> Option<&Exercise> {
        self.index().and_then(|i| self.lesson.exercises.get(i))
    }

    pub fn total_exercises(&self) -> usize {
        self.lesson.exercises.len()
    }

    /// Percentage of exercises already behind the learner.
    pub fn progress_percent(&self) -> u32 {
        let done = match self.phase {
            Phase::Presenting { index } | Phase::Feedback { index, .. } => index,
            Phase::Completing | Phase::Closed => self.total_exercises(),
        };
        (done * 100 / self.total_exercises().max(1)) as u32
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn streak(&self) -> u32 {
        self.streak
    }

    pub fn best_streak(&self) -> u32 {
        self.best_streak
    }

    pub fn answers(&self) -> &[AnswerRecord] {
        &self.answers
    }

    pub fn matched_pairs(&self) -> &[MatchPair] {
        &self.matched
    }

    pub fn selected_word(&self) -> Option<&str> {
        self.selected_word.as_deref()
    }

    pub fn selected_translation(&self) -> Option<&str> {
        self.selected_translation.as_deref()
    }

    pub fn feedback(&self) -> Option<Verdict> {
        self.feedback
    }

    pub fn is_recording(&self) -> bool {
        self.recording.is_some()
    }

    pub fn recognition_error(&self) -> Option<&RecognitionError> {
        self.recognition_error.as_ref()
    }

    pub fn completion_error(&self) -> Option<&str> {
        self.completion_error.as_deref()
    }

    pub fn summary(&self) -> LessonSummary {
        LessonSummary::from_answers(
            self.lesson.id,
            self.total_exercises(),
            &self.answers,
            self.score,
            self.best_streak,
        )
    }

    /// Answer a single-shot exercise.
    pub fn select_answer(&mut self, candidate: Candidate) -> Result<Vec<Effect>, PlayerError> {
        let index = self.presenting_index()?;
        let exercise = &self.lesson.exercises[index];
        let kind = exercise.kind();

        match candidate {
            Candidate::Text(text) => {
                expect_kind(kind, ExerciseKind::WordWithAudio)?;
                let correct = grade_translation(&text, &exercise.translation).is_correct;
                let delay = self.settings.answer_delay();
                Ok(self.resolve(index, text, correct, delay))
            }
            Candidate::Image(choice) => {
                expect_kind(kind, ExerciseKind::ImageSelection)?;
                let images = exercise.images();
                let option = images.get(choice).ok_or(PlayerError::NoSuchOption {
                    index: choice,
                    count: images.len(),
                })?;
                let answer = option.url.clone();
                let correct = option.is_correct;
                let delay = self.settings.answer_delay();
                Ok(self.resolve(index, answer, correct, delay))
            }
            Candidate::Transcript(transcript) => {
                expect_kind(kind, ExerciseKind::Pronunciation)?;
                if self.recording.is_some() {
                    return Err(PlayerError::RecordingInProgress);
                }
                Ok(self.judge_transcript(index, &transcript))
            }
        }
    }

    /// Ask the recognizer for one transcript of the current pronunciation exercise.
    pub fn start_recording(&mut self) -> Result<Vec<Effect>, PlayerError> {
        let index = self.presenting_index()?;
        expect_kind(self.lesson.exercises[index].kind(), ExerciseKind::Pronunciation)?;
        if self.recording.is_some() {
            return Err(PlayerError::RecordingInProgress);
        }

        let ticket = self.issue_ticket();
        self.recording = Some(ticket);
        self.recognition_error = None;

        Ok(vec![
            Effect::StopRecognition,
            Effect::StartRecognition {
                ticket,
                language: self.lesson.speech_language().to_string(),
            },
        ])
    }

    /// Stop the in-flight recording; its result will be discarded.
    pub fn cancel_recording(&mut self) -> Vec<Effect> {
        match self.recording.take() {
            Some(_) => vec![Effect::StopRecognition],
            None => Vec::new(),
        }
    }

    /// Deliver the result of a recognition request.
    ///
    /// Results for cancelled or superseded requests, or arriving after close, are ignored.
    pub fn recognition_finished(
        &mut self,
        ticket: Ticket,
        result: Result<String, RecognitionError>,
    ) -> Vec<Effect> {
        if self.is_closed() || self.recording != Some(ticket) {
            return Vec::new();
        }
        self.recording = None;

        match result {
            Err(error) => {
                self.recognition_error = Some(error.clone());
                vec![Effect::Notify(Notice::RecognitionFailed { error })]
            }
            Ok(transcript) => match self.phase {
                Phase::Presenting { index } => self.judge_transcript(index, &transcript),
                _ => Vec::new(),
            },
        }
    }

    /// Select the word side of a matching pair.
    pub fn select_word(&mut self, word: &str) -> Result<Vec<Effect>, PlayerError> {
        let index = self.matching_index()?;
        let selectable = self.lesson.exercises[index]
            .pairs()
            .iter()
            .any(|p| p.word == word && !self.matched.contains(p));
        if !selectable {
            return Err(PlayerError::NotSelectable(word.to_string()));
        }

        self.selected_word = Some(word.to_string());
        Ok(self.check_match(index))
    }

    /// Select the translation side of a matching pair.
    pub fn select_translation(&mut self, translation: &str) -> Result<Vec<Effect>, PlayerError> {
        let index = self.matching_index()?;
        let selectable = self.lesson.exercises[index]
            .pairs()
            .iter()
            .any(|p| p.translation == translation && !self.matched.contains(p));
        if !selectable {
            return Err(PlayerError::NotSelectable(translation.to_string()));
        }

        self.selected_translation = Some(translation.to_string());
        Ok(self.check_match(index))
    }

    /// Play `text` in the lesson language, interrupting any current playback.
    pub fn speak(&self, text: &str) -> Result<Vec<Effect>, PlayerError> {
        if self.is_closed() {
            return Err(PlayerError::Closed);
        }
        Ok(vec![
            Effect::CancelSpeech,
            Effect::Speak {
                text: text.to_string(),
                language: self.lesson.speech_language().to_string(),
            },
        ])
    }

    /// Play the current exercise's word again.
    pub fn replay(&self) -> Result<Vec<Effect>, PlayerError> {
        let exercise = self.current_exercise().ok_or(PlayerError::NotAcceptingInput)?;
        if exercise.word.trim().is_empty() {
            return Ok(Vec::new());
        }
        self.speak(&exercise.word)
    }

    /// Apply a timer that the runtime scheduled earlier.
    pub fn timer_fired(&mut self, ticket: Ticket) -> Vec<Effect> {
        if self.is_closed() {
            return Vec::new();
        }
        let action = match self.pending {
            Some((pending, action)) if pending == ticket => action,
            _ => return Vec::new(),
        };
        self.pending = None;
        self.feedback = None;

        match action {
            TimerAction::ClearFeedback => Vec::new(),
            TimerAction::Advance => self.advance(),
        }
    }

    /// Re-send the completion request after a failure.
    pub fn retry_finalize(&mut self) -> Result<Vec<Effect>, PlayerError> {
        match self.phase {
            Phase::Closed => Err(PlayerError::Closed),
            Phase::Completing if !self.completion_in_flight => Ok(self.finalize_lesson()),
            _ => Err(PlayerError::NotCompleting),
        }
    }

    /// The completion sink accepted the lesson. Session state is released.
    pub fn completion_succeeded(&mut self) -> Result<Vec<Effect>, PlayerError> {
        if self.phase != Phase::Completing {
            return Err(PlayerError::NotCompleting);
        }
        let summary = self.summary();

        self.phase = Phase::Closed;
        self.completion_in_flight = false;
        self.completion_error = None;
        self.answers.clear();
        self.matched.clear();
        self.score = 0;
        self.streak = 0;

        Ok(vec![Effect::Notify(Notice::LessonCompleted { summary })])
    }

    /// The completion sink failed. The session stays open for a retry.
    pub fn completion_failed(
        &mut self,
        message: impl Into<String>,
    ) -> Result<Vec<Effect>, PlayerError> {
        if self.phase != Phase::Completing {
            return Err(PlayerError::NotCompleting);
        }
        let message = message.into();
        self.completion_in_flight = false;
        self.completion_error = Some(message.clone());
        Ok(vec![Effect::Notify(Notice::CompletionFailed { message })])
    }

    /// User exit. Pending timers and recordings become no-ops.
    pub fn close(&mut self) -> Vec<Effect> {
        if self.is_closed() {
            return Vec::new();
        }
        self.phase = Phase::Closed;
        self.pending = None;
        self.feedback = None;
        self.completion_in_flight = false;

        let mut effects = vec![Effect::CancelTimer];
        if self.recording.take().is_some() {
            effects.push(Effect::StopRecognition);
        }
        effects.push(Effect::CancelSpeech);
        effects
    }

    fn presenting_index(&self) -> Result<usize, PlayerError> {
        match self.phase {
            Phase::Presenting { index } => Ok(index),
            Phase::Closed => Err(PlayerError::Closed),
            _ => Err(PlayerError::NotAcceptingInput),
        }
    }

    fn matching_index(&self) -> Result<usize, PlayerError> {
        let index = self.presenting_index()?;
        expect_kind(self.lesson.exercises[index].kind(), ExerciseKind::Matching)?;
        Ok(index)
    }

    fn issue_ticket(&mut self) -> Ticket {
        self.next_ticket += 1;
        Ticket(self.next_ticket)
    }

    fn schedule(&mut self, action: TimerAction, delay: Duration) -> Effect {
        let ticket = self.issue_ticket();
        self.pending = Some((ticket, action));
        Effect::ScheduleTimer { ticket, delay }
    }

    fn reward_correct(&mut self, points: u32) {
        self.score += points;
        self.streak += 1;
        self.best_streak = self.best_streak.max(self.streak);
    }

    fn record(&mut self, exercise_id: i64, answer: String, is_correct: bool) {
        self.answers.push(AnswerRecord {
            exercise_id,
            answer,
            is_correct,
            answered_at: Utc::now(),
        });
    }

    /// Record a single-shot answer and schedule the advance.
    fn resolve(
        &mut self,
        index: usize,
        answer: String,
        correct: bool,
        delay: Duration,
    ) -> Vec<Effect> {
        let exercise = &self.lesson.exercises[index];
        let exercise_id = exercise.id;
        let points = self.settings.rewards.points_for(exercise);

        self.record(exercise_id, answer, correct);
        let mut effects = Vec::new();
        if correct {
            self.reward_correct(points);
            effects.push(Effect::Notify(Notice::Streak { count: self.streak }));
        } else {
            self.streak = 0;
        }

        let verdict = Verdict::from_correct(correct);
        self.feedback = Some(verdict);
        self.phase = Phase::Feedback { index, verdict };
        effects.push(self.schedule(TimerAction::Advance, delay));
        effects
    }

    /// A wrong transcript does not resolve the exercise; the learner tries again.
    fn judge_transcript(&mut self, index: usize, transcript: &str) -> Vec<Effect> {
        let exercise = &self.lesson.exercises[index];
        let result = grade_pronunciation(
            transcript,
            &exercise.word,
            self.settings.similarity_threshold,
        );
        let delay = self.settings.spoken_delay();

        if result.is_correct {
            return self.resolve(index, result.expected, true, delay);
        }

        self.streak = 0;
        self.feedback = Some(Verdict::Incorrect);
        vec![self.schedule(TimerAction::ClearFeedback, delay)]
    }

    fn check_match(&mut self, index: usize) -> Vec<Effect> {
        let (word, translation) = match (&self.selected_word, &self.selected_translation) {
            (Some(w), Some(t)) => (w.clone(), t.clone()),
            _ => return Vec::new(),
        };
        self.selected_word = None;
        self.selected_translation = None;

        let exercise = &self.lesson.exercises[index];
        let delay = self.settings.matching_delay();

        if !is_valid_pair(exercise.pairs(), &word, &translation) {
            self.streak = 0;
            self.feedback = Some(Verdict::Incorrect);
            return vec![self.schedule(TimerAction::ClearFeedback, delay)];
        }

        let exercise_id = exercise.id;
        let total_pairs = exercise.pairs().len();
        let points = self.settings.rewards.points_for_pair(exercise, self.matched.len());

        self.matched.push(MatchPair { word, translation });
        self.reward_correct(points);
        let mut effects = vec![Effect::Notify(Notice::Streak { count: self.streak })];

        if self.matched.len() == total_pairs {
            self.record(exercise_id, MATCHING_COMPLETE_ANSWER.to_string(), true);
            self.feedback = Some(Verdict::Correct);
            self.phase = Phase::Feedback {
                index,
                verdict: Verdict::Correct,
            };
            effects.push(self.schedule(TimerAction::Advance, delay));
        }
        effects
    }

    fn advance(&mut self) -> Vec<Effect> {
        let next = match self.phase {
            Phase::Feedback { index, .. } => index + 1,
            _ => return Vec::new(),
        };

        self.matched.clear();
        self.selected_word = None;
        self.selected_translation = None;
        self.recognition_error = None;

        if next < self.total_exercises() {
            self.phase = Phase::Presenting { index: next };
            self.presentation_effects(next)
        } else {
            self.phase = Phase::Completing;
            self.finalize_lesson()
        }
    }

    fn finalize_lesson(&mut self) -> Vec<Effect> {
        let correct = self.answers.iter().filter(|a| a.is_correct).count();
        self.completion_in_flight = true;
        self.completion_error = None;
        vec![Effect::Finalize {
            lesson_id: self.lesson.id,
            experience: experience_earned(correct, self.total_exercises()),
        }]
    }

    fn presentation_effects(&self, index: usize) -> Vec<Effect> {
        let exercise = &self.lesson.exercises[index];
        if !exercise.kind().is_spoken() {
            return Vec::new();
        }
        vec![
            Effect::CancelSpeech,
            Effect::Speak {
                text: exercise.word.clone(),
                language: self.lesson.speech_language().to_string(),
            },
        ]
    }
}

fn expect_kind(actual: ExerciseKind, expected: ExerciseKind) -> Result<(), PlayerError> {
    if actual == expected {
        Ok(())
    } else {
        Err(PlayerError::WrongExerciseKind {
            expected: expected.as_str(),
            actual,
        })
    }
}
