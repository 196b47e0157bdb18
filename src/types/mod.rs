//! Core Types
//!
//! Shared data model and the unified error type.

pub mod error;
pub mod question;

pub use error::{QuizError, Result};
pub use question::{
    GenerationOutcome, MultipleChoiceQuestion, ParsedQuestion, ParsedTagSet, WeightedAnswer,
    question_name,
};
