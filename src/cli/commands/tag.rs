//! Tag Command
//!
//! Reads questions from a JSON file and assigns English topic tags to the
//! ones that have none. Results are printed as JSON so they can be piped
//! onward.

use std::path::Path;

use console::style;
use serde::Deserialize;

use crate::config::ConfigLoader;
use crate::credentials::CredentialStore;
use crate::pipeline::tagging::{MemoryTagSink, TaggableQuestion, Tagger};
use crate::provider::{ProviderConfig, create_provider};
use crate::types::{QuizError, Result};

/// Input record shape for the tag command.
#[derive(Debug, Deserialize)]
struct QuestionRecord {
    id: u64,
    #[serde(default)]
    name: String,
    text: String,
    #[serde(default)]
    answers: Vec<String>,
    #[serde(default)]
    tags: Vec<String>,
}

pub async fn run(input: &Path) -> Result<()> {
    let config = ConfigLoader::load()?;
    let store = CredentialStore::from_config(&config.llm);
    let credentials = store.resolve(0, 0).ok_or(QuizError::CredentialMissing)?;
    let provider = create_provider(ProviderConfig::from_parts(&config.llm, credentials))?;

    let raw = std::fs::read_to_string(input)?;
    let records: Vec<QuestionRecord> = serde_json::from_str(&raw)?;
    let questions: Vec<TaggableQuestion> = records
        .into_iter()
        .map(|r| TaggableQuestion {
            id: r.id,
            name: if r.name.is_empty() {
                r.id.to_string()
            } else {
                r.name
            },
            text: r.text,
            answers: r.answers,
            existing_tags: r.tags,
        })
        .collect();

    let sink = MemoryTagSink::new();
    let summary = Tagger::new(provider).tag_questions(&questions, &sink).await;

    let assigned = sink.assigned();
    if !assigned.is_empty() {
        let output: Vec<_> = assigned
            .iter()
            .map(|(id, tags)| serde_json::json!({"id": id, "tags": tags}))
            .collect();
        println!("{}", serde_json::to_string_pretty(&output)?);
    }

    println!();
    println!(
        "{} tagged, {} skipped, {} failed",
        style(summary.tagged).green().bold(),
        style(summary.skipped).yellow(),
        style(summary.failed).red()
    );
    Ok(())
}
