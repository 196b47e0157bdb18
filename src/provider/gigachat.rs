//! GigaChat API Provider
//!
//! Bearer tokens come from an OAuth client-credentials exchange: a POST to
//! the token endpoint with `Basic` authorization built from the long-lived
//! secret, a fixed scope string in the form body, and a fresh per-request
//! correlation UUID in the `RqUID` header. Every API operation re-resolves
//! its own token.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};
use uuid::Uuid;

use super::{
    ChatMessage, FileMetadata, GenerationRequest, LlmProvider, ProviderConfig, RemoteFileHandle,
};
use crate::constants::{gigachat as defaults, network};
use crate::types::{QuizError, Result};

/// GigaChat provider with secure secret handling
pub struct GigaChatProvider {
    secret: SecretString,
    scope: String,
    auth_url: String,
    api_base: String,
    model: String,
    client: reqwest::Client,
    token_client: reqwest::Client,
    upload_client: reqwest::Client,
}

impl std::fmt::Debug for GigaChatProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GigaChatProvider")
            .field("secret", &"[REDACTED]")
            .field("scope", &self.scope)
            .field("auth_url", &self.auth_url)
            .field("api_base", &self.api_base)
            .field("model", &self.model)
            .finish()
    }
}

fn build_client(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| QuizError::Config(format!("Failed to create HTTP client: {}", e)))
}

impl GigaChatProvider {
    pub fn new(config: ProviderConfig) -> Result<Self> {
        let auth_url = config
            .auth_url
            .unwrap_or_else(|| defaults::OAUTH_URL.to_string());
        let api_base = config
            .api_base
            .unwrap_or_else(|| defaults::API_BASE.to_string());
        let model = config
            .model
            .unwrap_or_else(|| defaults::DEFAULT_MODEL.to_string());

        Ok(Self {
            secret: config.secret,
            scope: config.scope,
            auth_url,
            api_base,
            model,
            client: build_client(Duration::from_secs(config.timeout_secs))?,
            token_client: build_client(Duration::from_secs(network::TOKEN_TIMEOUT_SECS))?,
            upload_client: build_client(Duration::from_secs(config.upload_timeout_secs))?,
        })
    }

    fn files_url(&self) -> String {
        format!("{}/files", self.api_base)
    }
}

#[async_trait]
impl LlmProvider for GigaChatProvider {
    async fn get_token(&self) -> Result<String> {
        // Fresh correlation id per exchange, as the endpoint requires
        let request_id = Uuid::new_v4();

        debug!(rquid = %request_id, "Requesting GigaChat access token");

        let response = self
            .token_client
            .post(&self.auth_url)
            .header("Content-Type", "application/x-www-form-urlencoded")
            .header("Accept", "application/json")
            .header("RqUID", request_id.to_string())
            .header(
                "Authorization",
                format!("Basic {}", self.secret.expose_secret()),
            )
            .body(format!("scope={}", self.scope))
            .send()
            .await
            .map_err(|e| QuizError::network("token exchange", &e))?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            return Err(QuizError::TokenStatus {
                status: status.as_u16(),
            });
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| QuizError::network("token exchange", &e))?;

        body.get("access_token")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or(QuizError::TokenMissing)
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<String> {
        info!(model = %self.model, temperature = request.temperature, "Generating with GigaChat");

        let token = self.get_token().await?;
        let url = format!("{}/chat/completions", self.api_base);
        let body = ChatCompletionRequest {
            model: &self.model,
            messages: &request.messages,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
            attachments: &request.attachments,
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&token)
            .header("Accept", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| QuizError::network("chat completion", &e))?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            return Err(QuizError::Api {
                provider: "gigachat",
                status: status.as_u16(),
                body,
            });
        }

        let completion: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| QuizError::network("chat completion", &e))?;

        completion
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or(QuizError::InvalidResponse {
                provider: "gigachat",
                message: "missing choices[0].message.content".to_string(),
            })
    }

    async fn upload_file(
        &self,
        path: &Path,
        display_name: &str,
        purpose: &str,
    ) -> Result<RemoteFileHandle> {
        let token = self.get_token().await?;

        info!(file = %path.display(), purpose, "Uploading file to GigaChat storage");

        let bytes = tokio::fs::read(path).await?;
        let mime = mime_guess::from_path(path).first_or_octet_stream();
        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(display_name.to_string())
            .mime_str(mime.essence_str())
            .map_err(|e| QuizError::Config(format!("invalid mime type: {}", e)))?;
        let form = reqwest::multipart::Form::new()
            .text("purpose", purpose.to_string())
            .part("file", part);

        let response = self
            .upload_client
            .post(self.files_url())
            .bearer_auth(&token)
            .multipart(form)
            .send()
            .await
            .map_err(|e| QuizError::network("file upload", &e))?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            return Err(QuizError::Upload {
                status: status.as_u16(),
            });
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| QuizError::network("file upload", &e))?;

        let id = body
            .get("id")
            .and_then(Value::as_str)
            .ok_or(QuizError::InvalidResponse {
                provider: "gigachat",
                message: "upload response has no id".to_string(),
            })?;

        Ok(RemoteFileHandle {
            id: id.to_string(),
            purpose: Some(purpose.to_string()),
        })
    }

    async fn delete_file(&self, handle: &RemoteFileHandle) -> Result<()> {
        let token = self.get_token().await?;

        // GigaChat deletes via POST to a /delete sub-path
        let url = format!("{}/{}/delete", self.files_url(), handle.id);

        debug!(file_id = %handle.id, "Deleting file from GigaChat storage");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&token)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| QuizError::network("file delete", &e))?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            return Err(QuizError::FileOperation {
                op: "delete",
                status: status.as_u16(),
            });
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| QuizError::network("file delete", &e))?;

        // API versions disagree on the ack shape; accept either key
        if body.get("deleted").is_none() && body.get("id").is_none() {
            return Err(QuizError::InvalidResponse {
                provider: "gigachat",
                message: "delete response has neither deleted nor id".to_string(),
            });
        }

        Ok(())
    }

    async fn list_files(&self) -> Result<Vec<RemoteFileHandle>> {
        let token = self.get_token().await?;

        let response = self
            .client
            .get(self.files_url())
            .bearer_auth(&token)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| QuizError::network("file list", &e))?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            return Err(QuizError::FileOperation {
                op: "list",
                status: status.as_u16(),
            });
        }

        let body: FileListResponse = response
            .json()
            .await
            .map_err(|e| QuizError::network("file list", &e))?;

        Ok(body.data)
    }

    async fn file_info(&self, handle: &RemoteFileHandle) -> Result<FileMetadata> {
        let token = self.get_token().await?;
        let url = format!("{}/{}", self.files_url(), handle.id);

        let response = self
            .client
            .get(&url)
            .bearer_auth(&token)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| QuizError::network("file info", &e))?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            return Err(QuizError::FileOperation {
                op: "info",
                status: status.as_u16(),
            });
        }

        response
            .json()
            .await
            .map_err(|_| QuizError::InvalidResponse {
                provider: "gigachat",
                message: "file info response has no id".to_string(),
            })
    }

    fn name(&self) -> &'static str {
        "gigachat"
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn file_purpose(&self) -> &'static str {
        defaults::FILE_PURPOSE
    }
}

// Request/Response types

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "<[_]>::is_empty")]
    attachments: &'a [String],
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FileListResponse {
    data: Vec<RemoteFileHandle>,
}

// =============================================================================
// Tests
// =============================================================================
