//! Question Data Model
//!
//! Typed records flowing through the generation pipeline: parsed model
//! output on one side, materialized question-bank entities on the other.

use serde::{Deserialize, Serialize};

use crate::types::{QuizError, Result};

// =============================================================================
// Parsed Model Output
// =============================================================================

/// One multiple-choice question as parsed from model output.
///
/// Invariant: `correct_answer_index < answers.len()` and `answers.len() >= 2`.
/// Construct via [`ParsedQuestion::new`] to enforce it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedQuestion {
    /// Question text
    pub stem: String,
    /// Ordered answer options
    pub answers: Vec<String>,
    /// Index into `answers` of the single correct option
    #[serde(rename = "correctAnswerIndex")]
    pub correct_answer_index: usize,
}

impl ParsedQuestion {
    /// Build a question, validating the index and answer-count invariants.
    pub fn new(stem: String, answers: Vec<String>, correct_answer_index: usize) -> Result<Self> {
        if answers.len() < 2 {
            return Err(QuizError::parse(format!(
                "question '{}' has {} answers, need at least 2",
                stem,
                answers.len()
            )));
        }
        if correct_answer_index >= answers.len() {
            return Err(QuizError::parse(format!(
                "correctAnswerIndex {} out of range for {} answers",
                correct_answer_index,
                answers.len()
            )));
        }
        Ok(Self {
            stem,
            answers,
            correct_answer_index,
        })
    }
}

/// Tags extracted for one question. Order preserved, duplicates and empty
/// strings removed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedTagSet {
    pub tags: Vec<String>,
}

impl ParsedTagSet {
    /// Normalize a raw tag list: trim, drop empties, dedupe preserving order.
    pub fn from_raw(raw: impl IntoIterator<Item = String>) -> Self {
        let mut tags: Vec<String> = Vec::new();
        for tag in raw {
            let tag = tag.trim();
            if !tag.is_empty() && !tags.iter().any(|t| t == tag) {
                tags.push(tag.to_string());
            }
        }
        Self { tags }
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }
}

// =============================================================================
// Generation Outcome
// =============================================================================

/// Terminal result of the retry loop for one content unit.
#[derive(Debug)]
pub enum GenerationOutcome<T> {
    /// Parser produced a validated payload
    Success(T),
    /// Attempts exhausted or a fatal provider error occurred; the diagnostic
    /// is materialized as a placeholder so the failure stays visible
    GivingUp {
        attempts_made: usize,
        message: String,
    },
}

impl<T> GenerationOutcome<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }
}

// =============================================================================
// Materialized Entities (sink input shapes)
// =============================================================================

/// One answer option with its grading weight.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightedAnswer {
    pub text: String,
    /// 1.0 for the single correct answer, 0.0 for all others
    pub weight: f32,
}

/// Multiple-choice question entity as submitted to the question sink.
#[derive(Debug, Clone)]
pub struct MultipleChoiceQuestion {
    /// Zero-padded sequence name within the batch ("001", "002", ...)
    pub name: String,
    pub stem: String,
    pub answers: Vec<WeightedAnswer>,
    /// Single-select (one correct answer)
    pub single: bool,
    /// Shuffle answer order on display
    pub shuffle_answers: bool,
}

impl MultipleChoiceQuestion {
    /// Convert a parsed question, assigning full weight to the correct
    /// answer and zero to the rest.
    pub fn from_parsed(name: impl Into<String>, parsed: &ParsedQuestion) -> Self {
        let answers = parsed
            .answers
            .iter()
            .enumerate()
            .map(|(i, text)| WeightedAnswer {
                text: text.clone(),
                weight: if i == parsed.correct_answer_index {
                    1.0
                } else {
                    0.0
                },
            })
            .collect();

        Self {
            name: name.into(),
            stem: parsed.stem.clone(),
            answers,
            single: true,
            shuffle_answers: true,
        }
    }
}

/// Zero-padded question name within a batch: 1 -> "001".
pub fn question_name(sequence: usize) -> String {
    format!("{:03}", sequence)
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parsed_question_valid() {
        let q = ParsedQuestion::new(
            "What is 2+2?".into(),
            vec!["4".into(), "5".into(), "6".into(), "7".into()],
            0,
        )
        .unwrap();
        assert_eq!(q.answers.len(), 4);
        assert_eq!(q.correct_answer_index, 0);
    }

    #[test]
    fn test_parsed_question_index_out_of_range() {
        let result = ParsedQuestion::new("stem".into(), vec!["a".into(), "b".into()], 2);
        assert!(matches!(result, Err(QuizError::Parse(_))));
    }

    #[test]
    fn test_parsed_question_too_few_answers() {
        let result = ParsedQuestion::new("stem".into(), vec!["only one".into()], 0);
        assert!(matches!(result, Err(QuizError::Parse(_))));
    }

    #[test]
    fn test_tag_set_normalization() {
        let tags = ParsedTagSet::from_raw(vec![
            " biology ".to_string(),
            "".to_string(),
            "plants".to_string(),
            "biology".to_string(),
        ]);
        assert_eq!(tags.tags, vec!["biology", "plants"]);
    }

    #[test]
    fn test_materialize_weights() {
        let parsed = ParsedQuestion::new(
            "What is the function of mitochondria?".into(),
            vec![
                "Energy production".into(),
                "Protein synthesis".into(),
                "Waste removal".into(),
                "Storage".into(),
            ],
            0,
        )
        .unwrap();

        let entity = MultipleChoiceQuestion::from_parsed(question_name(1), &parsed);
        assert_eq!(entity.name, "001");
        assert!(entity.single);
        assert!(entity.shuffle_answers);

        let full_weight: Vec<_> = entity.answers.iter().filter(|a| a.weight == 1.0).collect();
        assert_eq!(full_weight.len(), 1);
        assert_eq!(full_weight[0].text, "Energy production");
        assert!(
            entity
                .answers
                .iter()
                .filter(|a| a.weight == 0.0)
                .count()
                == 3
        );
    }

    #[test]
    fn test_question_name_padding() {
        assert_eq!(question_name(1), "001");
        assert_eq!(question_name(42), "042");
        assert_eq!(question_name(100), "100");
    }
}
