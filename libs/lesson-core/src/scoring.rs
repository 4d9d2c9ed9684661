//! Lesson scoring.

use crate::types::AnswerRecord;
use serde::{Deserialize, Serialize};

/// Experience reported to the progress service for a finished lesson.
///
/// `floor(correct / total * 100)`, computed in integers so 1 of 3 yields 33.
pub fn experience_earned(correct: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    let correct = correct.min(total);
    (correct * 100 / total) as u32
}

/// End-of-lesson numbers shown to the learner and sent to the completion sink.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LessonSummary {
    pub lesson_id: i64,
    pub total_exercises: usize,
    pub correct_answers: usize,
    pub score: u32,
    pub best_streak: u32,
    pub experience: u32,
}

impl LessonSummary {
    pub fn from_answers(
        lesson_id: i64,
        total_exercises: usize,
        answers: &[AnswerRecord],
        score: u32,
        best_streak: u32,
    ) -> Self {
        let correct_answers = answers.iter().filter(|a| a.is_correct).count();
        Self {
            lesson_id,
            total_exercises,
            correct_answers,
            score,
            best_streak,
            experience: experience_earned(correct_answers, total_exercises),
        }
    }
}
