//! LLM provider implementations.
//!
//! Contains the Gemini implementation of the [`LlmProvider`] trait defined in
//! `parley-core`, and a factory ([`create_provider`]) that builds it from
//! [`GeminiConfig`] plus the resolved API key.
//!
//! [`LlmProvider`]: parley_core::llm::provider::LlmProvider

pub mod gemini;

use std::time::Duration;

use secrecy::SecretString;

use parley_core::llm::box_provider::BoxLlmProvider;
use parley_core::llm::provider::LlmProvider;
use parley_types::config::GeminiConfig;
use parley_types::llm::LlmError;

use self::gemini::GeminiProvider;

/// Create a [`BoxLlmProvider`] from a [`GeminiConfig`].
///
/// Returns `Ok(None)` when no API key is available. The server still starts
/// in that case; chat requests fail with a missing-credential error while
/// the session endpoints keep working.
///
/// # Errors
///
/// Returns an error if the HTTP client cannot be constructed.
pub fn create_provider(
    config: &GeminiConfig,
    api_key: Option<SecretString>,
) -> Result<Option<BoxLlmProvider>, LlmError> {
    let Some(key) = api_key else {
        tracing::error!("GEMINI_API_KEY is not set; chat requests will fail until it is configured");
        return Ok(None);
    };

    let provider = GeminiProvider::new(key, &config.model, Duration::from_secs(config.timeout_secs))?
        .with_base_url(config.base_url.clone());

    tracing::info!(model = %provider.model(), "Gemini provider configured");
    Ok(Some(BoxLlmProvider::new(provider)))
}
