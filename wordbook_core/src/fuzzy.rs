//! Typed answer checking for spelling questions

use strsim::{levenshtein, normalized_levenshtein, jaro_winkler};

/// Result of checking a typed answer
#[derive(Debug, Clone, PartialEq)]
pub struct TypedAnswer {
    pub is_correct: bool,
    pub similarity_score: f64,
    pub feedback: String,
}

/// Case-insensitive, trimmed exact comparison. Similarity only shapes the
/// feedback; a near miss is still wrong.
pub fn check_typed_answer(user_input: &str, expected: &str) -> TypedAnswer {
    let input_normalized = user_input.trim().to_lowercase();
    let expected_normalized = expected.trim().to_lowercase();

    if input_normalized == expected_normalized {
        return TypedAnswer {
            is_correct: true,
            similarity_score: 1.0,
            feedback: "Correct! ✓".to_string(),
        };
    }

    let levenshtein_sim = normalized_levenshtein(&input_normalized, &expected_normalized);
    let jaro_sim = jaro_winkler(&input_normalized, &expected_normalized);

    // Jaro-Winkler weights a shared prefix
    let similarity = levenshtein_sim * 0.4 + jaro_sim * 0.6;

    let feedback = if similarity >= 0.8 {
        let distance = levenshtein(&input_normalized, &expected_normalized);
        format!("Almost! {} characters off. Expected: '{}'", distance, expected)
    } else {
        format!("Incorrect. Expected: '{}'", expected)
    };

    TypedAnswer {
        is_correct: false,
        similarity_score: similarity,
        feedback,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ignores_case_and_surrounding_whitespace() {
        let answer = check_typed_answer("  Apple \n", "apple");
        assert!(answer.is_correct);
        assert_eq!(answer.similarity_score, 1.0);
    }

    #[test]
    fn near_miss_is_still_wrong() {
        let answer = check_typed_answer("aple", "apple");
        assert!(!answer.is_correct);
        assert!(answer.feedback.starts_with("Almost! 1 characters off"));
    }

    #[test]
    fn unrelated_input_is_plainly_incorrect() {
        let answer = check_typed_answer("zebra", "apple");
        assert!(!answer.is_correct);
        assert!(answer.feedback.starts_with("Incorrect."));
    }

    #[test]
    fn inner_whitespace_matters() {
        assert!(!check_typed_answer("ice cream", "icecream").is_correct);
    }
}
