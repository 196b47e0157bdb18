//! OpenAI API Provider
//!
//! OpenAI authenticates with a static bearer key, so token acquisition is
//! the identity: [`LlmProvider::get_token`] hands back the configured key
//! and every request sends it as `Authorization: Bearer`. File storage
//! uses the `/files` endpoints with the `assistants` purpose.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use super::{
    ChatMessage, FileMetadata, GenerationRequest, LlmProvider, ProviderConfig, RemoteFileHandle,
};
use crate::constants::openai as defaults;
use crate::types::{QuizError, Result};

/// OpenAI provider with secure key handling
pub struct OpenAiProvider {
    api_key: SecretString,
    api_base: String,
    model: String,
    client: reqwest::Client,
    upload_client: reqwest::Client,
}

impl std::fmt::Debug for OpenAiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiProvider")
            .field("api_key", &"[REDACTED]")
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

impl OpenAiProvider {
    pub fn new(config: ProviderConfig) -> Result<Self> {
        let api_base = config
            .api_base
            .unwrap_or_else(|| defaults::API_BASE.to_string());
        let model = config
            .model
            .unwrap_or_else(|| defaults::DEFAULT_MODEL.to_string());

        Ok(Self {
            api_key: config.secret,
            api_base,
            model,
            client: build_client(Duration::from_secs(config.timeout_secs))?,
            upload_client: build_client(Duration::from_secs(config.upload_timeout_secs))?,
        })
    }

    fn files_url(&self) -> String {
        format!("{}/files", self.api_base)
    }
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    async fn get_token(&self) -> Result<String> {
        // Static credential, no exchange step
        Ok(self.api_key.expose_secret().to_string())
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<String> {
        info!(model = %self.model, temperature = request.temperature, "Generating with OpenAI");

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
            .json(&body)
            .send()
            .await
            .map_err(|e| QuizError::network("chat completion", &e))?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            return Err(QuizError::Api {
                provider: "openai",
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
                provider: "openai",
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

        info!(file = %path.display(), purpose, "Uploading file to OpenAI storage");

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
                provider: "openai",
                message: "upload response has no id".to_string(),
            })?;

        Ok(RemoteFileHandle {
            id: id.to_string(),
            purpose: Some(purpose.to_string()),
        })
    }

    async fn delete_file(&self, handle: &RemoteFileHandle) -> Result<()> {
        let token = self.get_token().await?;
        let url = format!("{}/{}", self.files_url(), handle.id);

        debug!(file_id = %handle.id, "Deleting file from OpenAI storage");

        let response = self
            .client
            .delete(&url)
            .bearer_auth(&token)
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

        if body.get("deleted").is_none() && body.get("id").is_none() {
            return Err(QuizError::InvalidResponse {
                provider: "openai",
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
                provider: "openai",
                message: "file info response has no id".to_string(),
            })
    }

    fn name(&self) -> &'static str {
        "openai"
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProviderKind;
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider_for(server: &MockServer) -> OpenAiProvider {
        OpenAiProvider::new(ProviderConfig {
            kind: ProviderKind::Openai,
            secret: SecretString::from("sk-test-key"),
            model: None,
            scope: String::new(),
            auth_url: None,
            api_base: Some(server.uri()),
            timeout_secs: 5,
            upload_timeout_secs: 5,
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_get_token_is_the_api_key() {
        let server = MockServer::start().await;
        let token = provider_for(&server).get_token().await.unwrap();
        assert_eq!(token, "sk-test-key");
    }

    #[tokio::test]
    async fn test_default_model_when_unset() {
        let server = MockServer::start().await;
        assert_eq!(provider_for(&server).model(), defaults::DEFAULT_MODEL);
    }

    #[tokio::test]
    async fn test_generate_sends_bearer_key() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("Authorization", "Bearer sk-test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {"role": "assistant", "content": "ok"}}]
            })))
            .mount(&server)
            .await;

        let raw = provider_for(&server)
            .generate(&GenerationRequest::user("make questions", 0.7))
            .await
            .unwrap();
        assert_eq!(raw, "ok");
    }

    #[tokio::test]
    async fn test_delete_uses_http_delete() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/files/file-3"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"id": "file-3", "deleted": true})),
            )
            .mount(&server)
            .await;

        provider_for(&server)
            .delete_file(&RemoteFileHandle::new("file-3"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_file_info() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/files/file-3"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "file-3", "filename": "notes.pdf", "bytes": 1024, "purpose": "assistants"
            })))
            .mount(&server)
            .await;

        let info = provider_for(&server)
            .file_info(&RemoteFileHandle::new("file-3"))
            .await
            .unwrap();
        assert_eq!(info.id, "file-3");
        assert_eq!(info.filename.as_deref(), Some("notes.pdf"));
    }
}
