//! QuizForge - LLM-Backed Quiz Question Generator
//!
//! Generates multiple-choice questions from course materials using an LLM
//! provider (GigaChat or OpenAI), materializes them into question-bank
//! categories, and assigns topic tags to existing questions.
//!
//! ## Core Features
//!
//! - **Provider Abstraction**: one trait over GigaChat OAuth and OpenAI
//!   key auth, including remote file storage
//! - **Content Extraction**: inline text for text-bearing formats, staged
//!   temporary copies with guaranteed cleanup for everything else
//! - **Layered Parsing**: fence stripping plus a balanced-delimiter scan
//!   recovers JSON from noisy model output
//! - **Bounded Retries**: unparseable output is re-sampled up to a cap;
//!   provider errors fail fast
//! - **Failure Isolation**: a failed resource leaves a visible placeholder
//!   note and never aborts the batch
//!
//! ## Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use quizforge::{
//!     ConfigLoader, CredentialStore, GenerationBatch, MemorySink, Pipeline,
//! };
//! use quizforge::extract::ResourceRef;
//!
//! let config = ConfigLoader::load()?;
//! let store = CredentialStore::from_config(&config.llm);
//! let sink = Arc::new(MemorySink::new());
//! let batch = GenerationBatch::new(
//!     vec![ResourceRef::new(1, "lecture.txt", "lecture.txt")],
//!     course_id,
//!     user_id,
//!     context_id,
//! );
//! let pipeline = Pipeline::for_batch(&store, &config, sink.clone(), &batch)?;
//! let report = pipeline.run(&batch).await?;
//! ```
//!
//! ## Modules
//!
//! - [`provider`]: LLM provider trait, GigaChat and OpenAI backends
//! - [`pipeline`]: batch orchestration, retries, prompts, tagging
//! - [`extract`]: content extraction and upload staging
//! - [`parse`]: model output recovery and validation
//! - [`sink`]: question sink boundary and in-memory implementation
//! - [`config`]: layered configuration
//! - [`credentials`]: two-tier credential resolution

pub mod cli;
pub mod config;
pub mod constants;
pub mod credentials;
pub mod extract;
pub mod parse;
pub mod pipeline;
pub mod provider;
pub mod sink;
pub mod types;

// =============================================================================
// Core Re-exports
// =============================================================================

// Configuration
pub use config::{Config, ConfigLoader, GenerationConfig, LlmConfig, ProviderKind};

// Error Types
pub use types::{QuizError, Result};

// Credentials
pub use credentials::{CredentialStore, Credentials, StoredCredential};

// Providers
pub use provider::{
    GenerationRequest, LlmProvider, ProviderConfig, RemoteFileHandle, SharedProvider,
    create_provider,
};

// Pipeline
pub use pipeline::{BatchReport, GenerationBatch, Pipeline, RetryController, RetryPolicy};

// Sink
pub use sink::{Category, MemorySink, QuestionSink};
