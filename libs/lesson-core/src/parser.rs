//! Lesson loader for API payloads.
//!
//! # Format
//! ```json
//! {
//!   "id": 7,
//!   "title": "Animals",
//!   "unit": { "language": { "name": "Spanish", "code": "es", "speech_recognition_code": "es-ES" } },
//!   "exercises": [
//!     { "id": 1, "exercise_type": "word_with_audio", "order": 0, "word": "perro", "translation": "dog" },
//!     { "id": 2, "exercise_type": "matching", "order": 1, "word": "Match the animals",
//!       "options": [{ "word": "gato", "translation": "cat" }, { "word": "pez", "translation": "fish" }] }
//!   ]
//! }
//! ```
//!
//! Validation happens here so a malformed lesson never reaches the player.

use crate::error::{LessonError, Result};
use crate::types::{
    Exercise, ExerciseBody, ExerciseKind, ImageOption, Lesson, MatchPair, RawExercise, RawLesson,
};
use std::collections::HashSet;

const MIN_IMAGES: usize = 2;
const MIN_PAIRS: usize = 2;

/// Parse lesson JSON and validate it.
pub fn parse(content: &str) -> Result<Lesson> {
    let raw: RawLesson = serde_json::from_str(content)?;
    from_raw(raw)
}

/// Convert an already-deserialized lesson and validate it.
///
/// Exercises are ordered by their `order` field; ties keep payload order.
pub fn from_raw(raw: RawLesson) -> Result<Lesson> {
    let mut raw_exercises = raw.exercises;
    raw_exercises.sort_by_key(|e| e.order);

    let exercises = raw_exercises
        .into_iter()
        .map(build_exercise)
        .collect::<Result<Vec<_>>>()?;

    let lesson = Lesson {
        id: raw.id,
        title: raw.title.trim().to_string(),
        language: raw.unit.and_then(|u| u.language),
        exercises,
    };
    validate(&lesson)?;
    Ok(lesson)
}

/// Check that a lesson can be played.
pub fn validate(lesson: &Lesson) -> Result<()> {
    if lesson.exercises.is_empty() {
        return Err(LessonError::NoExercises { lesson: lesson.id });
    }

    let mut seen_ids = HashSet::new();
    for exercise in &lesson.exercises {
        if !seen_ids.insert(exercise.id) {
            return Err(LessonError::DuplicateExercise {
                exercise: exercise.id,
            });
        }
        validate_exercise(exercise)?;
    }
    Ok(())
}

/// Matching exercises carry their content in the pairs; `word` is only an optional prompt.
fn validate_exercise(exercise: &Exercise) -> Result<()> {
    let id = exercise.id;

    match &exercise.body {
        ExerciseBody::WordWithAudio | ExerciseBody::Pronunciation => {
            require_word(exercise)?;
            require_translation(exercise)
        }
        ExerciseBody::ImageSelection { images } => {
            require_word(exercise)?;
            require_translation(exercise)?;
            validate_images(images, id)
        }
        ExerciseBody::Matching { pairs } => validate_pairs(pairs, id),
    }
}

fn require_word(exercise: &Exercise) -> Result<()> {
    if exercise.word.trim().is_empty() {
        return Err(LessonError::MissingField {
            exercise: exercise.id,
            field: "word",
        });
    }
    Ok(())
}

fn require_translation(exercise: &Exercise) -> Result<()> {
    if exercise.translation.trim().is_empty() {
        return Err(LessonError::MissingField {
            exercise: exercise.id,
            field: "translation",
        });
    }
    Ok(())
}

fn validate_images(images: &[ImageOption], exercise: i64) -> Result<()> {
    if images.len() < MIN_IMAGES {
        return Err(LessonError::TooFewImages {
            exercise,
            min: MIN_IMAGES,
            found: images.len(),
        });
    }
    if images.iter().any(|img| img.url.trim().is_empty()) {
        return Err(LessonError::MissingField {
            exercise,
            field: "images.url",
        });
    }

    let correct = images.iter().filter(|img| img.is_correct).count();
    if correct != 1 {
        return Err(LessonError::CorrectImageCount {
            exercise,
            found: correct,
        });
    }
    Ok(())
}

fn validate_pairs(pairs: &[MatchPair], exercise: i64) -> Result<()> {
    if pairs.len() < MIN_PAIRS {
        return Err(LessonError::TooFewPairs {
            exercise,
            min: MIN_PAIRS,
            found: pairs.len(),
        });
    }

    let mut words = HashSet::new();
    let mut translations = HashSet::new();
    for pair in pairs {
        if pair.word.trim().is_empty() {
            return Err(LessonError::MissingField {
                exercise,
                field: "options.word",
            });
        }
        if pair.translation.trim().is_empty() {
            return Err(LessonError::MissingField {
                exercise,
                field: "options.translation",
            });
        }
        if !words.insert(pair.word.as_str()) {
            return Err(LessonError::DuplicatePairEntry {
                exercise,
                value: pair.word.clone(),
            });
        }
        if !translations.insert(pair.translation.as_str()) {
            return Err(LessonError::DuplicatePairEntry {
                exercise,
                value: pair.translation.clone(),
            });
        }
    }
    Ok(())
}

fn build_exercise(raw: RawExercise) -> Result<Exercise> {
    let kind = ExerciseKind::from_str(&raw.exercise_type).ok_or_else(|| {
        LessonError::UnknownExerciseType {
            exercise: raw.id,
            value: raw.exercise_type.clone(),
        }
    })?;

    let body = match kind {
        ExerciseKind::WordWithAudio => ExerciseBody::WordWithAudio,
        ExerciseKind::Pronunciation => ExerciseBody::Pronunciation,
        ExerciseKind::ImageSelection => ExerciseBody::ImageSelection {
            images: raw
                .images
                .into_iter()
                .map(|img| ImageOption {
                    url: img.url.trim().to_string(),
                    is_correct: img.is_correct,
                })
                .collect(),
        },
        ExerciseKind::Matching => ExerciseBody::Matching {
            pairs: raw
                .options
                .into_iter()
                .map(|opt| MatchPair::new(opt.word.trim(), opt.translation.trim()))
                .collect(),
        },
    };

    Ok(Exercise {
        id: raw.id,
        word: trimmed(raw.word),
        translation: trimmed(raw.translation),
        audio_url: raw
            .audio_url
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty()),
        xp_reward: raw.xp_reward,
        body,
    })
}

fn trimmed(value: Option<String>) -> String {
    value.map(|v| v.trim().to_string()).unwrap_or_default()
}
