//! Question Tagging
//!
//! Assigns English topic tags to existing questions. Each question is one
//! deterministic model call (temperature zero) over its stripped text plus
//! answers. Questions that already carry tags are skipped untouched, and
//! a failure on one question never stops the rest.

use std::sync::Mutex;

use tracing::{debug, info, warn};

use super::prompt::tagging_request;
use crate::parse::parse_tags;
use crate::provider::SharedProvider;
use crate::types::Result;

/// A question eligible for tagging.
#[derive(Debug, Clone)]
pub struct TaggableQuestion {
    pub id: u64,
    pub name: String,
    /// Question text, possibly containing HTML markup
    pub text: String,
    pub answers: Vec<String>,
    pub existing_tags: Vec<String>,
}

/// Destination for assigned tags.
pub trait TagSink: Send + Sync {
    fn assign_tags(&self, question_id: u64, tags: &[String]) -> Result<()>;
}

/// In-memory tag sink for the CLI and tests.
#[derive(Debug, Default)]
pub struct MemoryTagSink {
    assigned: Mutex<Vec<(u64, Vec<String>)>>,
}

impl MemoryTagSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn assigned(&self) -> Vec<(u64, Vec<String>)> {
        self.assigned.lock().expect("tag sink lock").clone()
    }
}

impl TagSink for MemoryTagSink {
    fn assign_tags(&self, question_id: u64, tags: &[String]) -> Result<()> {
        self.assigned
            .lock()
            .expect("tag sink lock")
            .push((question_id, tags.to_vec()));
        Ok(())
    }
}

/// Counts for one tagging run.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct TagSummary {
    pub tagged: usize,
    pub skipped: usize,
    pub failed: usize,
}

// =============================================================================
// HTML Stripping
// =============================================================================

/// Remove HTML tags from question text. Markup adds nothing for the model
/// and wastes prompt space. Unterminated tags drop the trailing fragment.
pub fn strip_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_tag = false;
    for c in text.chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            c if !in_tag => out.push(c),
            _ => {}
        }
    }
    out
}

fn question_body(question: &TaggableQuestion) -> String {
    let mut body = strip_html(&question.text);
    for answer in &question.answers {
        body.push_str("\n- ");
        body.push_str(&strip_html(answer));
    }
    body
}

// =============================================================================
// Tagger
// =============================================================================

/// Tags questions through one provider.
pub struct Tagger {
    provider: SharedProvider,
}

impl Tagger {
    pub fn new(provider: SharedProvider) -> Self {
        Self { provider }
    }

    /// Tag every untagged question, writing results through the sink.
    pub async fn tag_questions(
        &self,
        questions: &[TaggableQuestion],
        sink: &dyn TagSink,
    ) -> TagSummary {
        let mut summary = TagSummary::default();

        for question in questions {
            if !question.existing_tags.is_empty() {
                debug!(question = %question.name, "Already tagged, skipping");
                summary.skipped += 1;
                continue;
            }

            match self.tag_one(question, sink).await {
                Ok(tags) => {
                    debug!(question = %question.name, ?tags, "Tagged");
                    summary.tagged += 1;
                }
                Err(e) => {
                    warn!(question = %question.name, error = %e, "Tagging failed");
                    summary.failed += 1;
                }
            }
        }

        info!(
            tagged = summary.tagged,
            skipped = summary.skipped,
            failed = summary.failed,
            "Tagging run finished"
        );
        summary
    }

    async fn tag_one(
        &self,
        question: &TaggableQuestion,
        sink: &dyn TagSink,
    ) -> Result<Vec<String>> {
        let request = tagging_request(&question_body(question));
        let raw = self.provider.generate(&request).await?;
        let tags = parse_tags(&raw)?;
        sink.assign_tags(question.id, &tags.tags)?;
        Ok(tags.tags)
    }
}

// =============================================================================
// Tests
// =============================================================================
