//! LLM Provider Abstraction
//!
//! Defines the [`LlmProvider`] trait covering the four provider-side
//! capabilities the pipeline needs: token acquisition, chat-style
//! generation, and remote file upload/delete (plus list/info for
//! housekeeping). Each concrete provider implements the same interface and
//! is selected by configuration, so the generation pipeline is written
//! once.
//!
//! Tokens are deliberately not cached: every generation, upload, list and
//! delete operation re-resolves a fresh token. This trades a little
//! efficiency for simplicity and rules out stale-token failures in
//! long-running batch jobs.
//!
//! ## Modules
//!
//! - `gigachat`: OAuth client-credentials exchange + GigaChat API
//! - `openai`: static bearer key + OpenAI API

mod gigachat;
mod openai;

pub use gigachat::GigaChatProvider;
pub use openai::OpenAiProvider;

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use crate::config::{LlmConfig, ProviderKind};
use crate::credentials::Credentials;
use crate::types::Result;

// =============================================================================
// Provider Configuration
// =============================================================================

/// Runtime configuration for a concrete provider, assembled from the
/// loaded [`LlmConfig`] and the resolved credentials. Secrets live in
/// `SecretString` and are redacted in debug output.
#[derive(Clone)]
pub struct ProviderConfig {
    pub kind: ProviderKind,
    /// Long-lived secret: Basic credential (GigaChat) or API key (OpenAI)
    pub secret: SecretString,
    /// Model name; `None` selects the provider default
    pub model: Option<String>,
    /// OAuth scope string
    pub scope: String,
    /// OAuth token endpoint override
    pub auth_url: Option<String>,
    /// API base URL override
    pub api_base: Option<String>,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Upload timeout in seconds
    pub upload_timeout_secs: u64,
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("kind", &self.kind)
            .field("secret", &"[REDACTED]")
            .field("model", &self.model)
            .field("scope", &self.scope)
            .field("auth_url", &self.auth_url)
            .field("api_base", &self.api_base)
            .field("timeout_secs", &self.timeout_secs)
            .field("upload_timeout_secs", &self.upload_timeout_secs)
            .finish()
    }
}

impl ProviderConfig {
    /// Combine loaded settings with resolved credentials. A course-level
    /// model override wins over the site-wide one.
    pub fn from_parts(llm: &LlmConfig, credentials: Credentials) -> Self {
        Self {
            kind: llm.provider,
            secret: credentials.secret,
            model: credentials.model.or_else(|| llm.model.clone()),
            scope: llm.scope.clone(),
            auth_url: llm.auth_url.clone(),
            api_base: llm.api_base.clone(),
            timeout_secs: llm.timeout_secs,
            upload_timeout_secs: llm.upload_timeout_secs,
        }
    }
}

// =============================================================================
// Request Types
// =============================================================================

/// One chat message
#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// A chat-completion request. Immutable once built; the retry controller
/// re-submits the same request on every attempt.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    /// Provider file ids attached to the request
    pub attachments: Vec<String>,
    pub max_tokens: Option<u32>,
}

impl GenerationRequest {
    /// Single user message
    pub fn user(prompt: impl Into<String>, temperature: f32) -> Self {
        Self {
            messages: vec![ChatMessage::user(prompt)],
            temperature,
            attachments: Vec::new(),
            max_tokens: None,
        }
    }

    /// System + user message pair
    pub fn with_system(
        system: impl Into<String>,
        user: impl Into<String>,
        temperature: f32,
    ) -> Self {
        Self {
            messages: vec![ChatMessage::system(system), ChatMessage::user(user)],
            temperature,
            attachments: Vec::new(),
            max_tokens: None,
        }
    }

    pub fn with_attachment(mut self, file_id: impl Into<String>) -> Self {
        self.attachments.push(file_id.into());
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

// =============================================================================
// File Store Types
// =============================================================================

/// Opaque handle to a file stored on the provider side. Owned by the
/// provider; the uploader must delete it after use.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteFileHandle {
    pub id: String,
    #[serde(default)]
    pub purpose: Option<String>,
}

impl RemoteFileHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            purpose: None,
        }
    }
}

/// Metadata returned by the file info endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct FileMetadata {
    pub id: String,
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub bytes: Option<u64>,
    #[serde(default)]
    pub purpose: Option<String>,
    #[serde(default)]
    pub created_at: Option<i64>,
}

// =============================================================================
// LLM Provider Trait
// =============================================================================

/// Shared provider type used across the pipeline.
pub type SharedProvider = Arc<dyn LlmProvider>;

/// Capability interface implemented by every concrete provider.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Obtain a short-lived bearer token for the next API call. Fresh per
    /// invocation; never cached.
    async fn get_token(&self) -> Result<String>;

    /// Submit a chat-completion request and return the raw model output
    /// (`choices[0].message.content`), unparsed.
    async fn generate(&self, request: &GenerationRequest) -> Result<String>;

    /// Upload a local file to provider storage.
    async fn upload_file(
        &self,
        path: &Path,
        display_name: &str,
        purpose: &str,
    ) -> Result<RemoteFileHandle>;

    /// Delete an uploaded file. Callers that uploaded a file must invoke
    /// this exactly once, whatever the generation outcome.
    async fn delete_file(&self, handle: &RemoteFileHandle) -> Result<()>;

    /// List files currently stored on the provider side.
    async fn list_files(&self) -> Result<Vec<RemoteFileHandle>>;

    /// Fetch metadata for one stored file.
    async fn file_info(&self, handle: &RemoteFileHandle) -> Result<FileMetadata>;

    /// Provider name for logging
    fn name(&self) -> &'static str;

    /// Model name currently in use
    fn model(&self) -> &str;

    /// Purpose tag sent with file uploads
    fn file_purpose(&self) -> &'static str;
}

/// Create a shared provider from configuration
pub fn create_provider(config: ProviderConfig) -> Result<SharedProvider> {
    match config.kind {
        ProviderKind::Gigachat => Ok(Arc::new(GigaChatProvider::new(config)?)),
        ProviderKind::Openai => Ok(Arc::new(OpenAiProvider::new(config)?)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::{CredentialStore, StoredCredential};

    #[test]
    fn test_request_builders() {
        let request = GenerationRequest::user("prompt", 0.7)
            .with_attachment("file-1")
            .with_max_tokens(2000);
        assert_eq!(request.messages.len(), 1);
        assert_eq!(request.messages[0].role, "user");
        assert_eq!(request.attachments, vec!["file-1"]);
        assert_eq!(request.max_tokens, Some(2000));

        let request = GenerationRequest::with_system("you are a tagger", "tag this", 0.0);
        assert_eq!(request.messages[0].role, "system");
        assert_eq!(request.messages[1].role, "user");
        assert!(request.attachments.is_empty());
    }

    #[test]
    fn test_provider_config_model_precedence() {
        let mut llm = LlmConfig::default();
        llm.model = Some("site-model".to_string());

        let mut store = CredentialStore::new(Some(StoredCredential::new("site-secret")));
        store.set_course_credential(
            1,
            1,
            StoredCredential::new("course-secret").with_model("course-model"),
        );

        let config = ProviderConfig::from_parts(&llm, store.resolve(1, 1).unwrap());
        assert_eq!(config.model.as_deref(), Some("course-model"));

        let config = ProviderConfig::from_parts(&llm, store.resolve(2, 2).unwrap());
        assert_eq!(config.model.as_deref(), Some("site-model"));
    }

    #[test]
    fn test_provider_config_debug_redacts() {
        let llm = LlmConfig::default();
        let store = CredentialStore::new(Some(StoredCredential::new("super-secret")));
        let config = ProviderConfig::from_parts(&llm, store.resolve(1, 1).unwrap());
        assert!(!format!("{:?}", config).contains("super-secret"));
    }
}
