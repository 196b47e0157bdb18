//! Configuration Types
//!
//! All configuration structures with sensible defaults.
//! Supports global (~/.config/quizforge/) and project (quizforge.toml)
//! level configuration. The whole object is built once and injected into
//! the pipeline at construction time; nothing reads ambient state later.

use serde::{Deserialize, Serialize};

use crate::constants::{generation, gigachat, network};

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Configuration version
    pub version: String,

    /// LLM provider settings
    pub llm: LlmConfig,

    /// Generation pipeline settings
    pub generation: GenerationConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            llm: LlmConfig::default(),
            generation: GenerationConfig::default(),
        }
    }
}

impl Config {
    /// Validate configuration values are within acceptable ranges.
    /// Returns `QuizError::Config` on validation failure.
    pub fn validate(&self) -> crate::types::Result<()> {
        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(crate::types::QuizError::Config(format!(
                "temperature must be between 0.0 and 2.0, got {}",
                self.llm.temperature
            )));
        }

        if self.llm.timeout_secs == 0 {
            return Err(crate::types::QuizError::Config(
                "timeout_secs must be greater than 0".to_string(),
            ));
        }

        if self.generation.max_attempts == 0 {
            return Err(crate::types::QuizError::Config(
                "max_attempts must be greater than 0".to_string(),
            ));
        }

        if self.generation.question_count == 0 {
            return Err(crate::types::QuizError::Config(
                "question_count must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

// =============================================================================
// Provider Selection
// =============================================================================

/// Which LLM provider backs the pipeline
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[default]
    Gigachat,
    Openai,
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderKind::Gigachat => write!(f, "gigachat"),
            ProviderKind::Openai => write!(f, "openai"),
        }
    }
}

impl std::str::FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "gigachat" => Ok(ProviderKind::Gigachat),
            "openai" => Ok(ProviderKind::Openai),
            _ => Err(format!(
                "Unknown provider: {}. Valid values: gigachat, openai",
                s
            )),
        }
    }
}

// =============================================================================
// LLM Configuration
// =============================================================================

/// Provider settings.
///
/// Note: the auth secret is handled securely - it is never serialized to
/// output and is redacted in debug output. The provider converts it to
/// SecretString internally for runtime protection.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Provider kind: "gigachat" or "openai"
    pub provider: ProviderKind,

    /// Model name (provider-specific; falls back to the provider default)
    pub model: Option<String>,

    /// Site-wide auth secret (Basic credential for GigaChat, API key for
    /// OpenAI). Course-level credentials shadow this, see
    /// [`crate::credentials::CredentialStore`].
    /// Never serialized to output for security.
    #[serde(skip_serializing)]
    pub secret: Option<String>,

    /// OAuth scope string sent in the token exchange
    pub scope: String,

    /// OAuth token endpoint (for custom deployments)
    pub auth_url: Option<String>,

    /// API base URL (for custom endpoints)
    pub api_base: Option<String>,

    /// Request timeout in seconds
    pub timeout_secs: u64,

    /// Upload timeout in seconds (file-heavy calls need longer)
    pub upload_timeout_secs: u64,

    /// Temperature for question generation
    pub temperature: f32,
}

impl std::fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmConfig")
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("secret", &self.secret.as_ref().map(|_| "[REDACTED]"))
            .field("scope", &self.scope)
            .field("auth_url", &self.auth_url)
            .field("api_base", &self.api_base)
            .field("timeout_secs", &self.timeout_secs)
            .field("upload_timeout_secs", &self.upload_timeout_secs)
            .field("temperature", &self.temperature)
            .finish()
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::Gigachat,
            model: None,
            secret: None,
            scope: gigachat::OAUTH_SCOPE.to_string(),
            auth_url: None,
            api_base: None,
            timeout_secs: network::DEFAULT_TIMEOUT_SECS,
            upload_timeout_secs: network::UPLOAD_TIMEOUT_SECS,
            temperature: generation::GENERATION_TEMPERATURE,
        }
    }
}

// =============================================================================
// Generation Configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Questions requested per content unit
    pub question_count: usize,

    /// Maximum generation attempts per content unit
    pub max_attempts: usize,

    /// Fixed pause between retry attempts (milliseconds)
    pub retry_pause_ms: u64,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            question_count: generation::DEFAULT_QUESTION_COUNT,
            max_attempts: generation::MAX_ATTEMPTS,
            retry_pause_ms: generation::RETRY_PAUSE_MS,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.version, "1.0");
        assert_eq!(config.llm.provider, ProviderKind::Gigachat);
        assert_eq!(config.generation.question_count, 10);
        assert_eq!(config.generation.max_attempts, 5);
        config.validate().unwrap();
    }

    #[test]
    fn test_validate_rejects_bad_temperature() {
        let mut config = Config::default();
        config.llm.temperature = 3.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_attempts() {
        let mut config = Config::default();
        config.generation.max_attempts = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_provider_kind_parse() {
        assert_eq!(
            "gigachat".parse::<ProviderKind>().unwrap(),
            ProviderKind::Gigachat
        );
        assert_eq!(
            "OpenAI".parse::<ProviderKind>().unwrap(),
            ProviderKind::Openai
        );
        assert!("claude".parse::<ProviderKind>().is_err());
    }

    #[test]
    fn test_secret_redacted_in_debug() {
        let config = LlmConfig {
            secret: Some("very-secret".to_string()),
            ..Default::default()
        };
        let debug = format!("{:?}", config);
        assert!(!debug.contains("very-secret"));
        assert!(debug.contains("[REDACTED]"));
    }
}
