//! GeminiProvider -- concrete [`LlmProvider`] implementation for Google Gemini.
//!
//! Sends non-streaming requests to the Gemini `generateContent` endpoint.
//! The whole stored conversation is sent as `contents`, with the stored
//! `assistant` role mapped to Gemini's `model` role.
//!
//! The API key is wrapped in [`secrecy::SecretString`] and is never logged
//! or included in `Debug` output.

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};

use parley_core::llm::provider::LlmProvider;
use parley_types::chat::MessageRole;
use parley_types::llm::{CompletionRequest, CompletionResponse, LlmError};

use super::types::{GeminiContent, GeminiPart, GeminiRequest, GeminiResponse};

/// Google Gemini LLM provider.
///
/// Holds a pooled `reqwest::Client`; the configured timeout is the only
/// bound on how long a chat request waits for the model.
pub struct GeminiProvider {
    client: reqwest::Client,
    api_key: SecretString,
    base_url: String,
    model: String,
}

impl GeminiProvider {
    /// Create a new Gemini provider.
    ///
    /// A leading `models/` on the model name is accepted and stripped.
    pub fn new(api_key: SecretString, model: &str, timeout: Duration) -> Result<Self, LlmError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LlmError::Provider {
                message: format!("failed to create HTTP client: {e}"),
            })?;

        Ok(Self {
            client,
            api_key,
            base_url: "https://generativelanguage.googleapis.com".to_string(),
            model: model.trim_start_matches("models/").to_string(),
        })
    }

    /// Override the base URL (useful for testing or proxies).
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    fn url(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        )
    }

    /// Convert a generic [`CompletionRequest`] into a [`GeminiRequest`].
    fn to_gemini_request(request: &CompletionRequest) -> GeminiRequest {
        let contents = request
            .messages
            .iter()
            .map(|m| GeminiContent {
                role: Some(
                    match m.role {
                        MessageRole::User => "user",
                        MessageRole::Assistant => "model",
                    }
                    .to_string(),
                ),
                parts: vec![GeminiPart {
                    text: Some(m.content.clone()),
                }],
            })
            .collect();

        GeminiRequest { contents }
    }
}

/// Pull the reply text out of a raw `generateContent` body.
///
/// Tries the first candidate's text parts, then the candidate's plain
/// `output` field, and finally falls back to the raw JSON itself so a
/// successful call always yields some reply.
pub(crate) fn extract_reply(raw: &serde_json::Value, parsed: Option<&GeminiResponse>) -> String {
    if let Some(parsed) = parsed {
        if let Some(candidate) = parsed.candidates.first() {
            if let Some(text) = candidate.text() {
                return text;
            }
            if let Some(output) = candidate.output.as_deref().filter(|o| !o.is_empty()) {
                return output.to_string();
            }
            tracing::warn!(
                finish_reason = candidate.finish_reason.as_deref().unwrap_or("unknown"),
                "Gemini candidate carried no text"
            );
        }
    }

    tracing::warn!("Gemini response had no reply text; returning raw body");
    raw.to_string()
}

// GeminiProvider intentionally does NOT derive Debug; the key lives in a
// SecretString and the rest is not useful in logs.

impl LlmProvider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    fn model(&self) -> &str {
        &self.model
    }

    #[tracing::instrument(
        name = "gemini.generate_content",
        skip(self, request),
        fields(
            gen_ai.provider.name = "gemini",
            gen_ai.request.model = %self.model,
            turns = request.messages.len(),
        )
    )]
    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let body = Self::to_gemini_request(request);

        let response = self
            .client
            .post(self.url())
            .header("x-goog-api-key", self.api_key.expose_secret())
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::Provider {
                message: format!("HTTP request failed: {e}"),
            })?;

        let status = response.status();
        if !status.is_success() {
            let retry_after_ms = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
                .map(|secs| secs.saturating_mul(1000));
            let error_body = response.text().await.unwrap_or_default();
            return Err(match status.as_u16() {
                401 | 403 => LlmError::AuthenticationFailed,
                429 => LlmError::RateLimited { retry_after_ms },
                _ => LlmError::Provider {
                    message: format!("HTTP {status}: {error_body}"),
                },
            });
        }

        let raw: serde_json::Value = response.json().await.map_err(|e| {
            LlmError::Deserialization(format!("failed to parse response: {e}"))
        })?;

        let parsed = serde_json::from_value::<GeminiResponse>(raw.clone()).ok();
        let model = parsed
            .as_ref()
            .and_then(|p| p.model_version.clone())
            .unwrap_or_else(|| self.model.clone());

        Ok(CompletionResponse {
            content: extract_reply(&raw, parsed.as_ref()),
            model,
        })
    }
}
