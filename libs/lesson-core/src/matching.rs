//! Answer grading rules.
//!
//! Every rule is a pure function of the submitted answer and the exercise definition.

use crate::types::MatchPair;
use serde::{Deserialize, Serialize};

/// Result of grading a submitted answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    /// Whether the answer is considered correct.
    pub is_correct: bool,
    /// Similarity score between 0.0 and 1.0.
    pub similarity: f64,
    /// Submitted answer as it was compared.
    pub submitted: String,
    /// Expected answer as it was compared.
    pub expected: String,
}

/// Grade a typed translation. Only an exact match is correct.
pub fn grade_translation(answer: &str, translation: &str) -> MatchResult {
    let is_correct = answer == translation;
    MatchResult {
        is_correct,
        similarity: if is_correct { 1.0 } else { 0.0 },
        submitted: answer.to_string(),
        expected: translation.to_string(),
    }
}

/// Grade a speech transcript against the target word.
///
/// Both sides are lower-cased; the answer is correct when the Dice similarity
/// is strictly greater than `threshold`.
pub fn grade_pronunciation(transcript: &str, word: &str, threshold: f64) -> MatchResult {
    let submitted = transcript.to_lowercase();
    let expected = word.to_lowercase();
    let similarity = dice_coefficient(&submitted, &expected);

    MatchResult {
        is_correct: similarity > threshold,
        similarity,
        submitted,
        expected,
    }
}

/// Whether `word` and `translation` form one of the defined pairs.
pub fn is_valid_pair(pairs: &[MatchPair], word: &str, translation: &str) -> bool {
    pairs
        .iter()
        .any(|p| p.word == word && p.translation == translation)
}

/// Dice coefficient over character bigrams (0.0 to 1.0).
///
/// Whitespace is ignored. Identical strings score 1.0; strings shorter than
/// two characters that are not identical score 0.0. Repeated bigrams only
/// match as often as they occur in both strings.
pub fn dice_coefficient(a: &str, b: &str) -> f64 {
    strsim::sorensen_dice(a, b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_dice_coefficient() {
        assert_eq!(dice_coefficient("", ""), 1.0);
        assert_eq!(dice_coefficient("perro", "perro"), 1.0);
        assert_eq!(dice_coefficient("a", "b"), 0.0);
        assert_eq!(dice_coefficient("abc", "xyz"), 0.0);
        // pe er ro vs pe er rr ro
        assert!((dice_coefficient("pero", "perro") - 6.0 / 7.0).abs() < 1e-12);
    }

    #[test]
    fn test_dice_ignores_whitespace() {
        assert_eq!(dice_coefficient("buenos dias", "buenosdias"), 1.0);
    }

    #[test]
    fn test_dice_counts_repeated_bigrams_once_each() {
        // "aaaa" has three "aa" bigrams, "aa" only one
        assert!((dice_coefficient("aaaa", "aa") - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_grade_translation_is_exact() {
        assert!(grade_translation("house", "house").is_correct);
        assert!(!grade_translation("House", "house").is_correct);
        assert!(!grade_translation("house ", "house").is_correct);
    }

    #[test]
    fn test_pronunciation_identical_is_correct() {
        let result = grade_pronunciation("Perro", "perro", 0.7);
        assert!(result.is_correct);
        assert_eq!(result.similarity, 1.0);
        assert_eq!(result.submitted, "perro");
    }

    #[test]
    fn test_pronunciation_dissimilar_is_incorrect() {
        let result = grade_pronunciation("gato", "perro", 0.7);
        assert!(!result.is_correct);
        assert_eq!(result.similarity, 0.0);
    }

    #[test]
    fn test_pronunciation_threshold_is_exclusive() {
        // 7 shared bigrams out of 10 + 10 gives exactly 0.7
        let at_boundary = grade_pronunciation("abcdefghxyz", "abcdefghijk", 0.7);
        assert_eq!(at_boundary.similarity, 0.7);
        assert!(!at_boundary.is_correct);

        // 8 shared bigrams gives 0.8
        let above = grade_pronunciation("abcdefghixz", "abcdefghijk", 0.7);
        assert!(above.similarity > 0.7);
        assert!(above.is_correct);
    }

    #[test]
    fn test_valid_pair_requires_both_sides() {
        let pairs = vec![MatchPair::new("gato", "cat"), MatchPair::new("perro", "dog")];
        assert!(is_valid_pair(&pairs, "gato", "cat"));
        assert!(!is_valid_pair(&pairs, "gato", "dog"));
        assert!(!is_valid_pair(&pairs, "pez", "fish"));
    }
}
