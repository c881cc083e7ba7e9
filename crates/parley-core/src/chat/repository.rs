//! ChatRepository trait definition.
//!
//! Provides session CRUD and append/read operations for messages.
//! Uses native async fn in traits (RPITIT, Rust 2024 edition).

use parley_types::chat::{ChatMessage, ChatSession, NewMessage, SessionId, SessionSummary};
use parley_types::error::RepositoryError;

/// Repository trait for chat session and message persistence.
///
/// Implementations live in parley-infra (e.g., `SqliteChatRepository`).
/// Every method is a single committed mutation or read; there is no
/// transaction spanning calls.
pub trait ChatRepository: Send + Sync {
    /// Insert a new session row.
    fn create_session(
        &self,
        session: &ChatSession,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Get a session by id.
    fn get_session(
        &self,
        session_id: &SessionId,
    ) -> impl std::future::Future<Output = Result<Option<ChatSession>, RepositoryError>> + Send;

    /// List all sessions, most recently created first.
    fn list_sessions(
        &self,
    ) -> impl std::future::Future<Output = Result<Vec<SessionSummary>, RepositoryError>> + Send;

    /// Set a session's title.
    ///
    /// An unknown id is a silent no-op that still returns `Ok`.
    fn rename_session(
        &self,
        session_id: &SessionId,
        title: &str,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Delete a session's messages, then the session row.
    fn delete_session(
        &self,
        session_id: &SessionId,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Current title of a session, or `None` if it does not exist.
    fn get_session_title(
        &self,
        session_id: &SessionId,
    ) -> impl std::future::Future<Output = Result<Option<String>, RepositoryError>> + Send;

    /// Append a message; storage assigns the ordering id.
    ///
    /// Returns `RepositoryError::NotFound` when the session does not exist.
    fn append_message(
        &self,
        message: &NewMessage,
    ) -> impl std::future::Future<Output = Result<ChatMessage, RepositoryError>> + Send;

    /// All messages of a session ordered by id ascending.
    ///
    /// Unknown or empty sessions yield an empty vector.
    fn get_history(
        &self,
        session_id: &SessionId,
    ) -> impl std::future::Future<Output = Result<Vec<ChatMessage>, RepositoryError>> + Send;

    /// Number of messages stored for a session.
    fn count_messages(
        &self,
        session_id: &SessionId,
    ) -> impl std::future::Future<Output = Result<u64, RepositoryError>> + Send;
}
