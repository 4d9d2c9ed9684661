//! Error types for lesson-core.

use thiserror::Error;

use crate::types::ExerciseKind;

/// Result type alias using LessonError.
pub type Result<T> = std::result::Result<T, LessonError>;

/// Errors that can occur while loading a lesson definition.
///
/// All of these are fatal: a lesson that fails validation never starts a session.
#[derive(Debug, Error)]
pub enum LessonError {
    #[error("invalid lesson JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("lesson {lesson} has no exercises")]
    NoExercises { lesson: i64 },

    #[error("exercise {exercise} is missing required field `{field}`")]
    MissingField { exercise: i64, field: &'static str },

    #[error("exercise {exercise} has unknown type `{value}`")]
    UnknownExerciseType { exercise: i64, value: String },

    #[error("duplicate exercise ID {exercise}")]
    DuplicateExercise { exercise: i64 },

    #[error("exercise {exercise} needs at least {min} images, found {found}")]
    TooFewImages { exercise: i64, min: usize, found: usize },

    #[error("exercise {exercise} must mark exactly one image as correct, found {found}")]
    CorrectImageCount { exercise: i64, found: usize },

    #[error("exercise {exercise} needs at least {min} matching pairs, found {found}")]
    TooFewPairs { exercise: i64, min: usize, found: usize },

    #[error("exercise {exercise} repeats matching entry `{value}`")]
    DuplicatePairEntry { exercise: i64, value: String },
}

/// Operations rejected by the exercise player.
///
/// These never end the session; the caller reports them and waits for the next input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlayerError {
    #[error("the lesson is not accepting input right now")]
    NotAcceptingInput,

    #[error("operation needs a {expected} exercise, current exercise is {actual}")]
    WrongExerciseKind {
        expected: &'static str,
        actual: ExerciseKind,
    },

    #[error("a recording is already in progress")]
    RecordingInProgress,

    #[error("image option {index} does not exist ({count} options)")]
    NoSuchOption { index: usize, count: usize },

    #[error("`{0}` is not part of this exercise or is already matched")]
    NotSelectable(String),

    #[error("the lesson is not waiting for completion")]
    NotCompleting,

    #[error("the lesson is closed")]
    Closed,
}
