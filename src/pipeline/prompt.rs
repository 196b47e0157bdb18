//! Prompt Templates
//!
//! Prompts pin the output contract the parser depends on: JSON array,
//! fixed key names, four answers, one correct. Question language follows
//! the source material; tags are always English.

use crate::constants::generation::{ANSWERS_PER_QUESTION, TAGGING_TEMPERATURE};
use crate::provider::GenerationRequest;

/// System prompt for the tagging assistant.
pub const TAGGING_SYSTEM_PROMPT: &str = "You are a tagging assistant. Your task is to extract \
    a list of the most important tags for the given content. All tags shall be given in English.";

fn output_contract() -> String {
    format!(
        "Each question shall have {} answers and only 1 correct answer. \
         Return the questions as a JSON array of objects. \
         Name the keys \"stem\", \"answers\", \"correctAnswerIndex\". \
         The output shall only contain the JSON, nothing else.",
        ANSWERS_PER_QUESTION
    )
}

/// Prompt for generating questions from inlined text content.
pub fn generation_prompt(content: &str, question_count: usize) -> String {
    format!(
        "Create {} multiple choice questions on the following content. \
         Questions should be in the same language as the content. {}\n\n{}",
        question_count,
        output_contract(),
        content
    )
}

/// Prompt for generating questions from an attached file.
pub fn file_generation_prompt(question_count: usize) -> String {
    format!(
        "Create {} multiple choice questions on the content of the attached file. \
         Questions should be in the same language as the file content. {}",
        question_count,
        output_contract()
    )
}

/// Build the tagging request for one question's text. Deterministic
/// output wanted, so temperature is pinned to zero.
pub fn tagging_request(question_text: &str) -> GenerationRequest {
    let user = format!(
        "Extract tags for the following quiz question and return them as JSON \
         in the form {{\"tags\": [...]}}:\n\n{}",
        question_text
    );
    GenerationRequest::with_system(TAGGING_SYSTEM_PROMPT, user, TAGGING_TEMPERATURE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generation_prompt_carries_contract_and_content() {
        let prompt = generation_prompt("The mitochondria is the powerhouse.", 10);
        assert!(prompt.contains("Create 10 multiple choice questions"));
        assert!(prompt.contains("\"correctAnswerIndex\""));
        assert!(prompt.contains("4 answers"));
        assert!(prompt.ends_with("The mitochondria is the powerhouse."));
    }

    #[test]
    fn test_file_prompt_references_attachment() {
        let prompt = file_generation_prompt(5);
        assert!(prompt.contains("Create 5 multiple choice questions"));
        assert!(prompt.contains("attached file"));
    }

    #[test]
    fn test_tagging_request_shape() {
        let request = tagging_request("What is photosynthesis?");
        assert_eq!(request.temperature, 0.0);
        assert_eq!(request.messages[0].role, "system");
        assert!(request.messages[0].content.contains("tagging assistant"));
        assert!(request.messages[1].content.contains("What is photosynthesis?"));
    }
}
