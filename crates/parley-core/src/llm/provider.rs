//! LlmProvider trait definition.
//!
//! This is the abstraction the external model adapter implements. Uses
//! RPITIT for `complete`; see `BoxLlmProvider` for dynamic dispatch.

use parley_types::llm::{CompletionRequest, CompletionResponse, LlmError};

/// Trait for LLM provider backends.
///
/// A provider turns an ordered conversation into a single reply, or a typed
/// failure. Any fallback logic for oddly shaped upstream responses belongs
/// in the implementation, not in callers.
///
/// Implementations live in parley-infra (e.g., `GeminiProvider`).
pub trait LlmProvider: Send + Sync {
    /// Human-readable provider name (e.g., "gemini").
    fn name(&self) -> &str;

    /// Model identifier requests are sent to.
    fn model(&self) -> &str;

    /// Send a completion request and receive the full response.
    fn complete(
        &self,
        request: &CompletionRequest,
    ) -> impl std::future::Future<Output = Result<CompletionResponse, LlmError>> + Send;
}
