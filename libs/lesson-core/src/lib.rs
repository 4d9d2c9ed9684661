//! Core lesson library shared by every lesson player front end.
//!
//! Provides:
//! - Lesson loader and validation for API payloads
//! - Answer grading (exact translations, Dice similarity for speech, matching pairs)
//! - Exercise player state machine (pure, effect-returning)
//! - Speech language policy (voices, rates, recognition failures)
//! - Shared types (Lesson, Exercise, AnswerRecord, PlayerSettings, etc.)

pub mod error;
pub mod matching;
pub mod parser;
pub mod player;
pub mod scoring;
pub mod speech;
pub mod types;

pub use error::{LessonError, PlayerError, Result};
pub use matching::{
    dice_coefficient, grade_pronunciation, grade_translation, is_valid_pair, MatchResult,
};
pub use parser::parse;
pub use player::{Candidate, Effect, Notice, Phase, Player, Ticket};
pub use scoring::{experience_earned, LessonSummary};
pub use speech::{select_voice, speaking_rate, RecognitionError, Voice};
pub use types::{
    AnswerRecord, Exercise, ExerciseBody, ExerciseKind, ImageOption, Language, Lesson, MatchPair,
    PlayerSettings, RawLesson, RewardTable, Verdict,
};
