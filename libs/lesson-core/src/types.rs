//! Core types for the lesson player.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Speech language used when a lesson carries no language information.
pub const DEFAULT_SPEECH_LANGUAGE: &str = "en-US";

/// Interaction mode of an exercise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExerciseKind {
    WordWithAudio,
    ImageSelection,
    Pronunciation,
    Matching,
}

impl ExerciseKind {
    /// Get the wire name of the exercise type.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::WordWithAudio => "word_with_audio",
            Self::ImageSelection => "image_selection",
            Self::Pronunciation => "pronunciation",
            Self::Matching => "matching",
        }
    }

    /// Parse from the wire name.
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "word_with_audio" => Some(Self::WordWithAudio),
            "image_selection" => Some(Self::ImageSelection),
            "pronunciation" => Some(Self::Pronunciation),
            "matching" => Some(Self::Matching),
            _ => None,
        }
    }

    /// Whether a spoken prompt is part of this exercise.
    pub fn is_spoken(&self) -> bool {
        matches!(self, Self::WordWithAudio | Self::Pronunciation)
    }
}

impl fmt::Display for ExerciseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One choice of an image selection exercise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageOption {
    pub url: String,
    pub is_correct: bool,
}

/// A word and the translation it must be matched with.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MatchPair {
    pub word: String,
    pub translation: String,
}

impl MatchPair {
    pub fn new(word: impl Into<String>, translation: impl Into<String>) -> Self {
        Self {
            word: word.into(),
            translation: translation.into(),
        }
    }
}

/// Variant-specific payload of an exercise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "exercise_type", rename_all = "snake_case")]
pub enum ExerciseBody {
    WordWithAudio,
    ImageSelection { images: Vec<ImageOption> },
    Pronunciation,
    Matching { pairs: Vec<MatchPair> },
}

/// A validated exercise. Read-only once a session starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exercise {
    pub id: i64,
    pub word: String,
    pub translation: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_url: Option<String>,
    /// Points for resolving the exercise correctly. Matching exercises spread it over
    /// their pairs. Falls back to the reward table.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub xp_reward: Option<u32>,
    #[serde(flatten)]
    pub body: ExerciseBody,
}

impl Exercise {
    pub fn kind(&self) -> ExerciseKind {
        match self.body {
            ExerciseBody::WordWithAudio => ExerciseKind::WordWithAudio,
            ExerciseBody::ImageSelection { .. } => ExerciseKind::ImageSelection,
            ExerciseBody::Pronunciation => ExerciseKind::Pronunciation,
            ExerciseBody::Matching { .. } => ExerciseKind::Matching,
        }
    }

    /// Image options, empty for other kinds.
    pub fn images(&self) -> &[ImageOption] {
        match &self.body {
            ExerciseBody::ImageSelection { images } => images,
            _ => &[],
        }
    }

    /// Matching pairs, empty for other kinds.
    pub fn pairs(&self) -> &[MatchPair] {
        match &self.body {
            ExerciseBody::Matching { pairs } => pairs,
            _ => &[],
        }
    }
}

/// Language a lesson teaches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Language {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speech_recognition_code: Option<String>,
}

/// A validated lesson: ordered exercises plus language metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lesson {
    pub id: i64,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<Language>,
    pub exercises: Vec<Exercise>,
}

impl Lesson {
    /// BCP 47 code used for speech synthesis and recognition.
    pub fn speech_language(&self) -> &str {
        self.language
            .as_ref()
            .and_then(|l| l.speech_recognition_code.as_deref())
            .filter(|code| !code.trim().is_empty())
            .unwrap_or(DEFAULT_SPEECH_LANGUAGE)
    }
}

/// Lesson exactly as the REST API returns it (unvalidated).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawLesson {
    pub id: i64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub unit: Option<RawUnit>,
    #[serde(default)]
    pub exercises: Vec<RawExercise>,
}

/// Unit wrapper that carries the lesson language.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawUnit {
    #[serde(default)]
    pub language: Option<Language>,
}

/// Exercise exactly as the REST API returns it (unvalidated).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawExercise {
    pub id: i64,
    pub exercise_type: String,
    #[serde(default)]
    pub order: i64,
    #[serde(default)]
    pub word: Option<String>,
    #[serde(default)]
    pub translation: Option<String>,
    #[serde(default)]
    pub audio_url: Option<String>,
    #[serde(default)]
    pub xp_reward: Option<u32>,
    #[serde(default)]
    pub images: Vec<RawImage>,
    #[serde(default)]
    pub options: Vec<RawPair>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawImage {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub is_correct: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawPair {
    #[serde(default)]
    pub word: String,
    #[serde(default)]
    pub translation: String,
}

/// Outcome shown to the learner after an answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Correct,
    Incorrect,
}

impl Verdict {
    pub fn from_correct(correct: bool) -> Self {
        if correct {
            Self::Correct
        } else {
            Self::Incorrect
        }
    }

    pub fn is_correct(self) -> bool {
        self == Self::Correct
    }
}

/// One resolved exercise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerRecord {
    pub exercise_id: i64,
    pub answer: String,
    pub is_correct: bool,
    pub answered_at: DateTime<Utc>,
}

/// Default points per exercise type, used when an exercise has no `xp_reward`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardTable {
    pub word_with_audio: u32,
    pub image_selection: u32,
    pub pronunciation: u32,
    /// Points per matched pair.
    pub matching_pair: u32,
}

impl Default for RewardTable {
    fn default() -> Self {
        Self {
            word_with_audio: 10,
            image_selection: 10,
            pronunciation: 10,
            matching_pair: 5,
        }
    }
}

impl RewardTable {
    /// Points for a correct single-shot answer, or for one pair of a matching
    /// exercise without its own reward.
    pub fn points_for(&self, exercise: &Exercise) -> u32 {
        exercise.xp_reward.unwrap_or(match exercise.kind() {
            ExerciseKind::WordWithAudio => self.word_with_audio,
            ExerciseKind::ImageSelection => self.image_selection,
            ExerciseKind::Pronunciation => self.pronunciation,
            ExerciseKind::Matching => self.matching_pair,
        })
    }

    /// Points for the pair matched after `already_matched` others.
    ///
    /// An exercise `xp_reward` is split across the pairs so the whole exercise
    /// pays exactly that much; the remainder goes to the last pairs.
    pub fn points_for_pair(&self, exercise: &Exercise, already_matched: usize) -> u32 {
        let pairs = exercise.pairs().len() as u32;
        match exercise.xp_reward {
            Some(total) if pairs > 0 => {
                let base = total / pairs;
                let remainder = total % pairs;
                let position = already_matched as u32;
                if position >= pairs - remainder {
                    base + 1
                } else {
                    base
                }
            }
            _ => self.matching_pair,
        }
    }
}

/// Tunables of the exercise player.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerSettings {
    /// Pronunciation is correct when similarity is strictly above this value.
    pub similarity_threshold: f64,
    /// Feedback dwell for word and image answers.
    pub answer_delay_ms: u64,
    /// Feedback dwell for spoken answers.
    pub spoken_delay_ms: u64,
    /// Feedback dwell for matching pairs and matching completion.
    pub matching_delay_ms: u64,
    pub rewards: RewardTable,
}

impl Default for PlayerSettings {
    fn default() -> Self {
        Self {
            similarity_threshold: 0.7,
            answer_delay_ms: 500,
            spoken_delay_ms: 1500,
            matching_delay_ms: 1000,
            rewards: RewardTable::default(),
        }
    }
}

impl PlayerSettings {
    pub fn answer_delay(&self) -> Duration {
        Duration::from_millis(self.answer_delay_ms)
    }

    pub fn spoken_delay(&self) -> Duration {
        Duration::from_millis(self.spoken_delay_ms)
    }

    pub fn matching_delay(&self) -> Duration {
        Duration::from_millis(self.matching_delay_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exercise(body: ExerciseBody, xp_reward: Option<u32>) -> Exercise {
        Exercise {
            id: 1,
            word: "casa".into(),
            translation: "house".into(),
            audio_url: None,
            xp_reward,
            body,
        }
    }

    #[test]
    fn exercise_kind_round_trips_wire_names() {
        for kind in [
            ExerciseKind::WordWithAudio,
            ExerciseKind::ImageSelection,
            ExerciseKind::Pronunciation,
            ExerciseKind::Matching,
        ] {
            assert_eq!(ExerciseKind::from_str(kind.as_str()), Some(kind));
        }
        assert_eq!(ExerciseKind::from_str("fill_in_blank"), None);
    }

    #[test]
    fn reward_falls_back_to_table() {
        let table = RewardTable::default();
        assert_eq!(table.points_for(&exercise(ExerciseBody::WordWithAudio, None)), 10);
        assert_eq!(
            table.points_for(&exercise(ExerciseBody::Matching { pairs: vec![] }, None)),
            5
        );
        assert_eq!(table.points_for(&exercise(ExerciseBody::Pronunciation, Some(15))), 15);
    }

    #[test]
    fn matching_reward_is_split_across_pairs() {
        let table = RewardTable::default();
        let pairs = vec![
            MatchPair::new("gato", "cat"),
            MatchPair::new("pez", "fish"),
            MatchPair::new("perro", "dog"),
        ];

        let rewarded = exercise(ExerciseBody::Matching { pairs: pairs.clone() }, Some(20));
        let points: Vec<u32> = (0..3).map(|i| table.points_for_pair(&rewarded, i)).collect();
        assert_eq!(points, vec![6, 7, 7]);
        assert_eq!(points.iter().sum::<u32>(), 20);

        let plain = exercise(ExerciseBody::Matching { pairs }, None);
        assert_eq!(table.points_for_pair(&plain, 0), 5);
        assert_eq!(table.points_for_pair(&plain, 2), 5);
    }

    #[test]
    fn speech_language_defaults_to_english() {
        let mut lesson = Lesson {
            id: 1,
            title: "Basics".into(),
            language: None,
            exercises: vec![],
        };
        assert_eq!(lesson.speech_language(), "en-US");

        lesson.language = Some(Language {
            id: Some(3),
            name: "Spanish".into(),
            code: "es".into(),
            speech_recognition_code: Some("es-ES".into()),
        });
        assert_eq!(lesson.speech_language(), "es-ES");
    }

    #[test]
    fn exercise_serializes_with_flat_type_tag() {
        let json = serde_json::to_value(exercise(ExerciseBody::Pronunciation, None)).unwrap();
        assert_eq!(json["exercise_type"], "pronunciation");
        assert_eq!(json["word"], "casa");
    }
}
