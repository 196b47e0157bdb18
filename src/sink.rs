//! Question Sink Boundary
//!
//! Materialized questions leave the pipeline through the [`QuestionSink`]
//! trait: create a category, then write questions (or placeholder notes)
//! into it. The pipeline never talks to a question bank directly, so any
//! backing store can sit behind this seam. [`MemorySink`] is the built-in
//! implementation used by the CLI and by tests.

use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Local};

use crate::extract::ResourceRef;
use crate::types::{MultipleChoiceQuestion, Result};

/// A question category created for one generation batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    pub id: u64,
    pub context_id: u64,
    pub name: String,
}

/// A placeholder note recorded when generation for a unit fails.
#[derive(Debug, Clone)]
pub struct Note {
    pub id: u64,
    pub category_id: u64,
    pub title: String,
    pub body: String,
}

/// Destination for materialized questions.
pub trait QuestionSink: Send + Sync {
    /// Create the category that will hold this batch's questions.
    fn create_category(&self, context_id: u64, name: &str) -> Result<Category>;

    /// Write one question into a category, returning its id.
    fn create_question(&self, category: &Category, question: &MultipleChoiceQuestion)
    -> Result<u64>;

    /// Record a visible placeholder for a failed unit, returning its id.
    fn create_note(&self, category: &Category, title: &str, body: &str) -> Result<u64>;
}

/// Names listed in the category summary before eliding the rest.
const CATEGORY_NAME_CAP: usize = 5;

/// Batch category name: timestamp plus the comma-joined resource names.
pub fn batch_category_name(resources: &[ResourceRef], now: DateTime<Local>) -> String {
    let summary = if resources.is_empty() {
        "no resources".to_string()
    } else {
        let mut names: Vec<&str> = resources
            .iter()
            .take(CATEGORY_NAME_CAP)
            .map(|r| r.display_name.as_str())
            .collect();
        let elided = resources.len().saturating_sub(CATEGORY_NAME_CAP);
        let more;
        if elided > 0 {
            more = format!("+{} more", elided);
            names.push(&more);
        }
        names.join(", ")
    };
    format!(
        "Generated {} from {}",
        now.format("%Y-%m-%d %H:%M"),
        summary
    )
}

// =============================================================================
// In-memory Sink
// =============================================================================

/// Thread-safe in-memory sink. The CLI drains it after a run to print the
/// generated questions; tests inspect it directly.
#[derive(Debug, Default)]
pub struct MemorySink {
    next_id: AtomicU64,
    categories: Mutex<Vec<Category>>,
    questions: Mutex<Vec<(u64, MultipleChoiceQuestion)>>,
    notes: Mutex<Vec<Note>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    fn allocate_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn categories(&self) -> Vec<Category> {
        self.categories.lock().expect("sink lock").clone()
    }

    /// Questions written to one category, in insertion order.
    pub fn questions_in(&self, category_id: u64) -> Vec<MultipleChoiceQuestion> {
        self.questions
            .lock()
            .expect("sink lock")
            .iter()
            .filter(|(cat, _)| *cat == category_id)
            .map(|(_, q)| q.clone())
            .collect()
    }

    pub fn notes(&self) -> Vec<Note> {
        self.notes.lock().expect("sink lock").clone()
    }

    pub fn question_count(&self) -> usize {
        self.questions.lock().expect("sink lock").len()
    }
}

impl QuestionSink for MemorySink {
    fn create_category(&self, context_id: u64, name: &str) -> Result<Category> {
        let category = Category {
            id: self.allocate_id(),
            context_id,
            name: name.to_string(),
        };
        self.categories
            .lock()
            .expect("sink lock")
            .push(category.clone());
        Ok(category)
    }

    fn create_question(
        &self,
        category: &Category,
        question: &MultipleChoiceQuestion,
    ) -> Result<u64> {
        let id = self.allocate_id();
        self.questions
            .lock()
            .expect("sink lock")
            .push((category.id, question.clone()));
        Ok(id)
    }

    fn create_note(&self, category: &Category, title: &str, body: &str) -> Result<u64> {
        let id = self.allocate_id();
        self.notes.lock().expect("sink lock").push(Note {
            id,
            category_id: category.id,
            title: title.to_string(),
            body: body.to_string(),
        });
        Ok(id)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ParsedQuestion, question_name};
    use chrono::TimeZone;

    #[test]
    fn test_category_name_joins_resource_names() {
        let now = Local.with_ymd_and_hms(2026, 8, 25, 14, 30, 0).unwrap();

        let one = vec![ResourceRef::new(1, "/tmp/lecture.pdf", "lecture.pdf")];
        assert_eq!(
            batch_category_name(&one, now),
            "Generated 2026-08-25 14:30 from lecture.pdf"
        );

        let many = vec![
            ResourceRef::new(1, "/tmp/a.pdf", "a.pdf"),
            ResourceRef::new(2, "/tmp/b.txt", "b.txt"),
            ResourceRef::new(3, "/tmp/c.txt", "c.txt"),
        ];
        assert_eq!(
            batch_category_name(&many, now),
            "Generated 2026-08-25 14:30 from a.pdf, b.txt, c.txt"
        );
    }

    #[test]
    fn test_category_name_caps_long_batches() {
        let now = Local.with_ymd_and_hms(2026, 8, 25, 14, 30, 0).unwrap();
        let many: Vec<ResourceRef> = (1..=7)
            .map(|i| ResourceRef::new(i, format!("/tmp/f{}.txt", i), format!("f{}.txt", i)))
            .collect();
        assert_eq!(
            batch_category_name(&many, now),
            "Generated 2026-08-25 14:30 from f1.txt, f2.txt, f3.txt, f4.txt, f5.txt, +2 more"
        );
    }

    #[test]
    fn test_memory_sink_round_trip() {
        let sink = MemorySink::new();
        let category = sink.create_category(77, "Generated batch").unwrap();
        assert_eq!(category.context_id, 77);

        let parsed = ParsedQuestion::new(
            "stem".into(),
            vec!["a".into(), "b".into(), "c".into(), "d".into()],
            2,
        )
        .unwrap();
        let question = MultipleChoiceQuestion::from_parsed(question_name(1), &parsed);
        sink.create_question(&category, &question).unwrap();
        sink.create_note(&category, "Issue during question generation", "details")
            .unwrap();

        assert_eq!(sink.questions_in(category.id).len(), 1);
        assert_eq!(sink.questions_in(category.id)[0].name, "001");
        assert_eq!(sink.notes().len(), 1);
        assert_eq!(sink.notes()[0].category_id, category.id);
    }
}
