//! Generation Pipeline
//!
//! Orchestrates one batch: resolve credentials, create the batch category,
//! then process each resource strictly in order. Per resource the steps
//! are extract, optionally upload, generate with retries, materialize.
//! A failed resource produces a placeholder note and the batch moves on;
//! only a missing credential aborts before any work starts.
//!
//! Uploaded files are provider-side state the batch owns: whatever the
//! generation outcome, an uploaded file is deleted exactly once before
//! the next resource is touched.

mod prompt;
mod retry;
pub mod tagging;

pub use prompt::{
    TAGGING_SYSTEM_PROMPT, file_generation_prompt, generation_prompt, tagging_request,
};
pub use retry::{RetryController, RetryPolicy};

use std::sync::Arc;

use chrono::Local;
use tracing::{info, warn};

use crate::config::{Config, GenerationConfig};
use crate::credentials::CredentialStore;
use crate::extract::{ContentKind, ContentUnit, ResourceRef, extract};
use crate::parse::parse_questions;
use crate::provider::{
    GenerationRequest, ProviderConfig, RemoteFileHandle, SharedProvider, create_provider,
};
use crate::sink::{Category, QuestionSink, batch_category_name};
use crate::types::{
    GenerationOutcome, MultipleChoiceQuestion, QuizError, Result, question_name,
};

/// Title of the placeholder note written when a unit fails.
pub const PLACEHOLDER_TITLE: &str = "Issue during question generation";

// =============================================================================
// Batch Types
// =============================================================================

/// One unit of work: the resources to generate questions from, plus the
/// identifiers that drive credential resolution and category placement.
#[derive(Debug, Clone)]
pub struct GenerationBatch {
    pub resources: Vec<ResourceRef>,
    pub course_id: u64,
    pub user_id: u64,
    pub context_id: u64,
}

impl GenerationBatch {
    pub fn new(resources: Vec<ResourceRef>, course_id: u64, user_id: u64, context_id: u64) -> Self {
        Self {
            resources,
            course_id,
            user_id,
            context_id,
        }
    }
}

/// Outcome for one resource in the batch.
#[derive(Debug)]
pub enum UnitOutcome {
    /// Questions materialized into the batch category
    Generated { count: usize },
    /// Resource skipped before generation (missing file)
    Skipped { reason: String },
    /// Generation failed; a placeholder note was written
    Failed { message: String },
}

/// Per-resource result record.
#[derive(Debug)]
pub struct UnitReport {
    pub resource_id: u64,
    pub display_name: String,
    pub outcome: UnitOutcome,
}

/// Result of one batch run.
#[derive(Debug)]
pub struct BatchReport {
    pub category: Category,
    pub units: Vec<UnitReport>,
}

impl BatchReport {
    pub fn generated_total(&self) -> usize {
        self.units
            .iter()
            .map(|u| match u.outcome {
                UnitOutcome::Generated { count } => count,
                _ => 0,
            })
            .sum()
    }

    pub fn failed_count(&self) -> usize {
        self.units
            .iter()
            .filter(|u| matches!(u.outcome, UnitOutcome::Failed { .. }))
            .count()
    }
}

// =============================================================================
// Pipeline
// =============================================================================

/// The batch generation pipeline.
pub struct Pipeline {
    provider: SharedProvider,
    sink: Arc<dyn QuestionSink>,
    generation: GenerationConfig,
    temperature: f32,
}

impl Pipeline {
    pub fn new(
        provider: SharedProvider,
        sink: Arc<dyn QuestionSink>,
        generation: GenerationConfig,
        temperature: f32,
    ) -> Self {
        Self {
            provider,
            sink,
            generation,
            temperature,
        }
    }

    /// Build a pipeline for one batch. Credential resolution happens here,
    /// before any provider is constructed: no credential, no network.
    pub fn for_batch(
        store: &CredentialStore,
        config: &Config,
        sink: Arc<dyn QuestionSink>,
        batch: &GenerationBatch,
    ) -> Result<Self> {
        let credentials = store
            .resolve(batch.course_id, batch.user_id)
            .ok_or(QuizError::CredentialMissing)?;
        let provider = create_provider(ProviderConfig::from_parts(&config.llm, credentials))?;
        Ok(Self::new(
            provider,
            sink,
            config.generation.clone(),
            config.llm.temperature,
        ))
    }

    /// Run the batch sequentially. Returns a report covering every
    /// resource; per-unit failures are recorded, never propagated.
    pub async fn run(&self, batch: &GenerationBatch) -> Result<BatchReport> {
        let name = batch_category_name(&batch.resources, Local::now());
        let category = self.sink.create_category(batch.context_id, &name)?;

        info!(
            category = %category.name,
            resources = batch.resources.len(),
            provider = self.provider.name(),
            model = self.provider.model(),
            "Starting generation batch"
        );

        let mut units = Vec::with_capacity(batch.resources.len());
        for resource in &batch.resources {
            let outcome = self.process_resource(resource, &category).await;
            units.push(UnitReport {
                resource_id: resource.id,
                display_name: resource.display_name.clone(),
                outcome,
            });
        }

        let report = BatchReport { category, units };
        info!(
            generated = report.generated_total(),
            failed = report.failed_count(),
            "Batch finished"
        );
        Ok(report)
    }

    async fn process_resource(&self, resource: &ResourceRef, category: &Category) -> UnitOutcome {
        let unit = match extract(resource) {
            Ok(Some(unit)) => unit,
            Ok(None) => {
                return UnitOutcome::Skipped {
                    reason: format!("file not found: {}", resource.path.display()),
                };
            }
            Err(e) => return self.record_failure(category, e.to_string()),
        };

        // Stage the upload first so a failure short-circuits before any
        // generation attempt is spent.
        let uploaded = match self.upload_if_needed(&unit).await {
            Ok(handle) => handle,
            Err(e) => return self.record_failure(category, e.to_string()),
        };

        let request = self.build_request(&unit, uploaded.as_ref());
        let controller =
            RetryController::new(self.provider.as_ref(), RetryPolicy::from_config(&self.generation));
        let outcome = controller.run(&request, parse_questions).await;

        // The staged temp copy is still alive here, so the provider-side
        // file it was uploaded from has been fully consumed.
        if let Some(handle) = &uploaded {
            self.cleanup_upload(handle).await;
        }

        match outcome {
            GenerationOutcome::Success(questions) => {
                self.materialize(category, &questions)
            }
            GenerationOutcome::GivingUp {
                attempts_made,
                message,
            } => {
                warn!(
                    resource = %unit.display_name,
                    attempts_made,
                    "Giving up on resource"
                );
                self.record_failure(category, message)
            }
        }
    }

    async fn upload_if_needed(&self, unit: &ContentUnit) -> Result<Option<RemoteFileHandle>> {
        match unit.upload_path() {
            Some(path) => {
                let handle = self
                    .provider
                    .upload_file(path, &unit.display_name, self.provider.file_purpose())
                    .await?;
                Ok(Some(handle))
            }
            None => Ok(None),
        }
    }

    fn build_request(
        &self,
        unit: &ContentUnit,
        uploaded: Option<&RemoteFileHandle>,
    ) -> GenerationRequest {
        match (&unit.kind, uploaded) {
            (ContentKind::InlineText(text), _) => GenerationRequest::user(
                generation_prompt(text, self.generation.question_count),
                self.temperature,
            ),
            (ContentKind::RemoteUpload(_), Some(handle)) => GenerationRequest::user(
                file_generation_prompt(self.generation.question_count),
                self.temperature,
            )
            .with_attachment(handle.id.clone()),
            // Upload is staged before generation, so this arm is unreachable
            // in practice; fall back to the file prompt without attachment.
            (ContentKind::RemoteUpload(_), None) => GenerationRequest::user(
                file_generation_prompt(self.generation.question_count),
                self.temperature,
            ),
        }
    }

    async fn cleanup_upload(&self, handle: &RemoteFileHandle) {
        if let Err(e) = self.provider.delete_file(handle).await {
            // Leaked provider-side files are logged, never fatal
            warn!(file_id = %handle.id, error = %e, "Failed to delete uploaded file");
        }
    }

    fn materialize(
        &self,
        category: &Category,
        questions: &[crate::types::ParsedQuestion],
    ) -> UnitOutcome {
        let mut count = 0;
        for (i, parsed) in questions.iter().enumerate() {
            let question = MultipleChoiceQuestion::from_parsed(question_name(i + 1), parsed);
            match self.sink.create_question(category, &question) {
                Ok(_) => count += 1,
                Err(e) => {
                    warn!(name = %question.name, error = %e, "Failed to store question");
                }
            }
        }
        UnitOutcome::Generated { count }
    }

    fn record_failure(&self, category: &Category, message: String) -> UnitOutcome {
        if let Err(e) = self.sink.create_note(category, PLACEHOLDER_TITLE, &message) {
            warn!(error = %e, "Failed to write placeholder note");
        }
        UnitOutcome::Failed { message }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LlmConfig;
    use crate::credentials::StoredCredential;
    use crate::provider::{FileMetadata, LlmProvider};
    use crate::sink::MemorySink;
    use async_trait::async_trait;
    use std::path::Path;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const VALID_QUESTIONS: &str = r#"[
        {"stem": "Q1?", "answers": ["a", "b", "c", "d"], "correctAnswerIndex": 0},
        {"stem": "Q2?", "answers": ["a", "b", "c", "d"], "correctAnswerIndex": 3}
    ]"#;

    struct MockProvider {
        generate_script: Mutex<Vec<Result<String>>>,
        uploads: AtomicUsize,
        deletes: AtomicUsize,
    }

    impl MockProvider {
        fn new(mut script: Vec<Result<String>>) -> Arc<Self> {
            script.reverse();
            Arc::new(Self {
                generate_script: Mutex::new(script),
                uploads: AtomicUsize::new(0),
                deletes: AtomicUsize::new(0),
            })
        }

        fn always(response: &str, copies: usize) -> Arc<Self> {
            Self::new((0..copies).map(|_| Ok(response.to_string())).collect())
        }
    }

    #[async_trait]
    impl LlmProvider for MockProvider {
        async fn get_token(&self) -> Result<String> {
            Ok("tok".to_string())
        }

        async fn generate(&self, _request: &GenerationRequest) -> Result<String> {
            self.generate_script
                .lock()
                .unwrap()
                .pop()
                .unwrap_or_else(|| Ok("unscripted".to_string()))
        }

        async fn upload_file(
            &self,
            _path: &Path,
            _display_name: &str,
            _purpose: &str,
        ) -> Result<RemoteFileHandle> {
            self.uploads.fetch_add(1, Ordering::SeqCst);
            Ok(RemoteFileHandle::new("file-1"))
        }

        async fn delete_file(&self, _handle: &RemoteFileHandle) -> Result<()> {
            self.deletes.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn list_files(&self) -> Result<Vec<RemoteFileHandle>> {
            Ok(vec![])
        }

        async fn file_info(&self, handle: &RemoteFileHandle) -> Result<FileMetadata> {
            Ok(FileMetadata {
                id: handle.id.clone(),
                filename: None,
                bytes: None,
                purpose: None,
                created_at: None,
            })
        }

        fn name(&self) -> &'static str {
            "mock"
        }

        fn model(&self) -> &str {
            "mock-model"
        }

        fn file_purpose(&self) -> &'static str {
            "general"
        }
    }

    fn pipeline_with(provider: Arc<MockProvider>, sink: Arc<MemorySink>) -> Pipeline {
        let generation = GenerationConfig {
            retry_pause_ms: 1,
            ..GenerationConfig::default()
        };
        Pipeline::new(provider, sink, generation, 0.7)
    }

    fn text_resource(dir: &tempfile::TempDir, id: u64, name: &str) -> ResourceRef {
        let path = dir.path().join(name);
        std::fs::write(&path, "lecture content").unwrap();
        ResourceRef::new(id, path, name)
    }

    fn binary_resource(dir: &tempfile::TempDir, id: u64, name: &str) -> ResourceRef {
        let path = dir.path().join(name);
        std::fs::write(&path, [0u8, 1, 2, 3]).unwrap();
        ResourceRef::new(id, path, name)
    }

    #[tokio::test]
    async fn test_inline_resource_generates_questions() {
        let dir = tempfile::tempdir().unwrap();
        let provider = MockProvider::always(VALID_QUESTIONS, 1);
        let sink = Arc::new(MemorySink::new());
        let pipeline = pipeline_with(provider.clone(), sink.clone());

        let batch = GenerationBatch::new(vec![text_resource(&dir, 1, "notes.txt")], 1, 1, 10);
        let report = pipeline.run(&batch).await.unwrap();

        assert_eq!(report.generated_total(), 2);
        let questions = sink.questions_in(report.category.id);
        assert_eq!(questions[0].name, "001");
        assert_eq!(questions[1].name, "002");
        assert!(sink.notes().is_empty());
        // Inline content never touches the file store
        assert_eq!(provider.uploads.load(Ordering::SeqCst), 0);
        assert_eq!(provider.deletes.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_upload_deleted_after_success() {
        let dir = tempfile::tempdir().unwrap();
        let provider = MockProvider::always(VALID_QUESTIONS, 1);
        let sink = Arc::new(MemorySink::new());
        let pipeline = pipeline_with(provider.clone(), sink);

        let batch = GenerationBatch::new(vec![binary_resource(&dir, 1, "scan.png")], 1, 1, 10);
        pipeline.run(&batch).await.unwrap();

        assert_eq!(provider.uploads.load(Ordering::SeqCst), 1);
        assert_eq!(provider.deletes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_upload_deleted_after_exhaustion() {
        let dir = tempfile::tempdir().unwrap();
        let provider = MockProvider::always("not json at all", 5);
        let sink = Arc::new(MemorySink::new());
        let pipeline = pipeline_with(provider.clone(), sink.clone());

        let batch = GenerationBatch::new(vec![binary_resource(&dir, 1, "scan.png")], 1, 1, 10);
        let report = pipeline.run(&batch).await.unwrap();

        assert_eq!(report.failed_count(), 1);
        // Cleanup is exactly-once even when every attempt failed to parse
        assert_eq!(provider.uploads.load(Ordering::SeqCst), 1);
        assert_eq!(provider.deletes.load(Ordering::SeqCst), 1);
        assert_eq!(sink.notes().len(), 1);
        assert_eq!(sink.notes()[0].title, PLACEHOLDER_TITLE);
    }

    #[tokio::test]
    async fn test_failed_unit_does_not_abort_batch() {
        let dir = tempfile::tempdir().unwrap();
        let provider = MockProvider::new(vec![
            Err(QuizError::Api {
                provider: "mock",
                status: 500,
                body: "server error".to_string(),
            }),
            Ok(VALID_QUESTIONS.to_string()),
        ]);
        let sink = Arc::new(MemorySink::new());
        let pipeline = pipeline_with(provider, sink.clone());

        let batch = GenerationBatch::new(
            vec![
                text_resource(&dir, 1, "broken.txt"),
                text_resource(&dir, 2, "fine.txt"),
            ],
            1,
            1,
            10,
        );
        let report = pipeline.run(&batch).await.unwrap();

        assert_eq!(report.units.len(), 2);
        assert!(matches!(report.units[0].outcome, UnitOutcome::Failed { .. }));
        assert!(matches!(
            report.units[1].outcome,
            UnitOutcome::Generated { count: 2 }
        ));
        assert_eq!(sink.notes().len(), 1);
    }

    #[tokio::test]
    async fn test_missing_file_skipped() {
        let provider = MockProvider::always(VALID_QUESTIONS, 1);
        let sink = Arc::new(MemorySink::new());
        let pipeline = pipeline_with(provider, sink.clone());

        let batch = GenerationBatch::new(
            vec![ResourceRef::new(1, "/does/not/exist.txt", "exist.txt")],
            1,
            1,
            10,
        );
        let report = pipeline.run(&batch).await.unwrap();

        assert!(matches!(report.units[0].outcome, UnitOutcome::Skipped { .. }));
        // Skips are silent in the category, unlike failures
        assert!(sink.notes().is_empty());
    }

    #[tokio::test]
    async fn test_missing_credential_blocks_pipeline() {
        let store = CredentialStore::new(None);
        let config = Config {
            llm: LlmConfig::default(),
            ..Config::default()
        };
        let batch = GenerationBatch::new(vec![], 1, 1, 10);

        let result = Pipeline::for_batch(
            &store,
            &config,
            Arc::new(MemorySink::new()),
            &batch,
        );
        assert!(matches!(result, Err(QuizError::CredentialMissing)));
    }
}
