//! Chat service orchestrating session lifecycle and the chat turn pipeline.
//!
//! `ChatService` sequences storage writes, the one-time auto title, the
//! external model call, and reply persistence. Each step commits on its
//! own: a failure after the user message is stored leaves that message in
//! place with no reply, and nothing is retried or rolled back.

use chrono::Utc;
use tracing::{debug, error, info, warn};

use parley_types::chat::{
    ChatSession, HistoryEntry, MessageRole, NewMessage, SessionId, SessionSummary,
};
use parley_types::error::{ChatError, RepositoryError};
use parley_types::llm::CompletionRequest;

use crate::chat::assembler::assemble_conversation;
use crate::chat::repository::ChatRepository;
use crate::chat::title::{make_title, should_auto_title};
use crate::llm::box_provider::BoxLlmProvider;

/// Orchestrates chat sessions and chat turns.
///
/// Generic over `ChatRepository` to maintain clean architecture
/// (parley-core never depends on parley-infra). The model provider is
/// optional: without a credential the service still serves every session
/// operation, but `chat` fails with `CredentialMissing`.
pub struct ChatService<C: ChatRepository> {
    chat_repo: C,
    provider: Option<BoxLlmProvider>,
}

impl<C: ChatRepository> ChatService<C> {
    /// Create a new chat service from a repository and an optional provider.
    pub fn new(chat_repo: C, provider: Option<BoxLlmProvider>) -> Self {
        Self {
            chat_repo,
            provider,
        }
    }

    /// Access the chat repository.
    pub fn chat_repo(&self) -> &C {
        &self.chat_repo
    }

    /// Whether an external model is configured.
    pub fn has_provider(&self) -> bool {
        self.provider.is_some()
    }

    // --- Session lifecycle ---

    /// Create a new session titled "Untitled".
    pub async fn create_session(&self) -> Result<ChatSession, RepositoryError> {
        let session = ChatSession::new_untitled(Utc::now());
        self.chat_repo.create_session(&session).await?;
        info!(session_id = %session.id, "Session created");
        Ok(session)
    }

    /// List sessions, most recently created first.
    pub async fn list_sessions(&self) -> Result<Vec<SessionSummary>, RepositoryError> {
        self.chat_repo.list_sessions().await
    }

    /// Rename a session. Unknown ids are accepted and ignored.
    pub async fn rename_session(
        &self,
        session_id: &SessionId,
        title: &str,
    ) -> Result<(), RepositoryError> {
        self.chat_repo.rename_session(session_id, title).await?;
        info!(session_id = %session_id, "Session renamed");
        Ok(())
    }

    /// Delete a session together with all of its messages.
    pub async fn delete_session(&self, session_id: &SessionId) -> Result<(), RepositoryError> {
        self.chat_repo.delete_session(session_id).await?;
        info!(session_id = %session_id, "Session deleted");
        Ok(())
    }

    /// Ordered `{role, content}` history of a session.
    pub async fn get_history(
        &self,
        session_id: &SessionId,
    ) -> Result<Vec<HistoryEntry>, RepositoryError> {
        let messages = self.chat_repo.get_history(session_id).await?;
        Ok(messages.into_iter().map(HistoryEntry::from).collect())
    }

    // --- Chat turn ---

    /// Run one chat turn and return the assistant's reply.
    ///
    /// Both the user message and the reply are stored with the timestamp
    /// taken when the turn starts.
    pub async fn chat(
        &self,
        session_id: Option<&str>,
        message: Option<&str>,
    ) -> Result<String, ChatError> {
        let (session_id, message) = match (session_id, message) {
            (Some(sid), Some(msg)) if !sid.is_empty() && !msg.is_empty() => {
                (SessionId::from(sid), msg)
            }
            _ => {
                return Err(ChatError::Validation(
                    "session_id and message required".to_string(),
                ));
            }
        };

        let timestamp = Utc::now();

        self.chat_repo
            .append_message(&NewMessage {
                session_id: session_id.clone(),
                role: MessageRole::User,
                content: message.to_string(),
                timestamp,
            })
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => ChatError::SessionNotFound,
                other => ChatError::Storage(other),
            })?;

        let current_title = self.chat_repo.get_session_title(&session_id).await?;
        if should_auto_title(current_title.as_deref()) {
            let title = make_title(Some(message));
            self.chat_repo.rename_session(&session_id, &title).await?;
            debug!(session_id = %session_id, title = %title, "Session auto-titled");
        }

        let Some(provider) = &self.provider else {
            warn!(session_id = %session_id, "Chat requested but no model credential is configured");
            return Err(ChatError::CredentialMissing);
        };

        let history = self.chat_repo.get_history(&session_id).await?;
        let request = CompletionRequest {
            messages: assemble_conversation(&history),
        };

        let response = provider.complete(&request).await.map_err(|e| {
            error!(
                session_id = %session_id,
                provider = provider.name(),
                model = provider.model(),
                error = %e,
                "Model call failed"
            );
            ChatError::from(e)
        })?;

        self.chat_repo
            .append_message(&NewMessage {
                session_id: session_id.clone(),
                role: MessageRole::Assistant,
                content: response.content.clone(),
                timestamp,
            })
            .await?;

        info!(
            session_id = %session_id,
            message_count = history.len() + 1,
            model = %response.model,
            "Chat turn completed"
        );

        Ok(response.content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::{Arc, Mutex};

    use parley_types::chat::ChatMessage;
    use parley_types::llm::{CompletionResponse, LlmError};

    use crate::llm::provider::LlmProvider;

    /// In-memory `ChatRepository` mirroring the SQLite semantics.
    #[derive(Default)]
    struct MemoryChatRepository {
        sessions: Mutex<Vec<ChatSession>>,
        messages: Mutex<Vec<ChatMessage>>,
    }

    impl ChatRepository for MemoryChatRepository {
        async fn create_session(&self, session: &ChatSession) -> Result<(), RepositoryError> {
            self.sessions.lock().unwrap().push(session.clone());
            Ok(())
        }

        async fn get_session(
            &self,
            session_id: &SessionId,
        ) -> Result<Option<ChatSession>, RepositoryError> {
            Ok(self
                .sessions
                .lock()
                .unwrap()
                .iter()
                .find(|s| &s.id == session_id)
                .cloned())
        }

        async fn list_sessions(&self) -> Result<Vec<SessionSummary>, RepositoryError> {
            Ok(self
                .sessions
                .lock()
                .unwrap()
                .iter()
                .rev()
                .cloned()
                .map(SessionSummary::from)
                .collect())
        }

        async fn rename_session(
            &self,
            session_id: &SessionId,
            title: &str,
        ) -> Result<(), RepositoryError> {
            for s in self.sessions.lock().unwrap().iter_mut() {
                if &s.id == session_id {
                    s.title = title.to_string();
                }
            }
            Ok(())
        }

        async fn delete_session(&self, session_id: &SessionId) -> Result<(), RepositoryError> {
            self.messages
                .lock()
                .unwrap()
                .retain(|m| &m.session_id != session_id);
            self.sessions
                .lock()
                .unwrap()
                .retain(|s| &s.id != session_id);
            Ok(())
        }

        async fn get_session_title(
            &self,
            session_id: &SessionId,
        ) -> Result<Option<String>, RepositoryError> {
            Ok(self.get_session(session_id).await?.map(|s| s.title))
        }

        async fn append_message(
            &self,
            message: &NewMessage,
        ) -> Result<ChatMessage, RepositoryError> {
            if self.get_session(&message.session_id).await?.is_none() {
                return Err(RepositoryError::NotFound);
            }
            let mut messages = self.messages.lock().unwrap();
            let stored = ChatMessage {
                id: messages.len() as i64 + 1,
                session_id: message.session_id.clone(),
                role: message.role,
                content: message.content.clone(),
                timestamp: message.timestamp,
            };
            messages.push(stored.clone());
            Ok(stored)
        }

        async fn get_history(
            &self,
            session_id: &SessionId,
        ) -> Result<Vec<ChatMessage>, RepositoryError> {
            Ok(self
                .messages
                .lock()
                .unwrap()
                .iter()
                .filter(|m| &m.session_id == session_id)
                .cloned()
                .collect())
        }

        async fn count_messages(&self, session_id: &SessionId) -> Result<u64, RepositoryError> {
            Ok(self.get_history(session_id).await?.len() as u64)
        }
    }

    /// Replies with a fixed string and records how many turns it was sent.
    struct FixedProvider {
        reply: String,
        seen_turns: Arc<Mutex<Vec<usize>>>,
    }

    impl FixedProvider {
        fn new(reply: &str) -> Self {
            Self {
                reply: reply.to_string(),
                seen_turns: Arc::new(Mutex::new(Vec::new())),
            }
        }
    }

    impl LlmProvider for FixedProvider {
        fn name(&self) -> &str {
            "fixed"
        }

        fn model(&self) -> &str {
            "fixed-model"
        }

        async fn complete(
            &self,
            request: &CompletionRequest,
        ) -> Result<CompletionResponse, LlmError> {
            self.seen_turns
                .lock()
                .unwrap()
                .push(request.messages.len());
            Ok(CompletionResponse {
                content: self.reply.clone(),
                model: "fixed-model".to_string(),
            })
        }
    }

    struct FailingProvider;

    impl LlmProvider for FailingProvider {
        fn name(&self) -> &str {
            "failing"
        }

        fn model(&self) -> &str {
            "failing-model"
        }

        async fn complete(
            &self,
            _request: &CompletionRequest,
        ) -> Result<CompletionResponse, LlmError> {
            Err(LlmError::Provider {
                message: "HTTP 503: unavailable".to_string(),
            })
        }
    }

    fn service_with(provider: Option<BoxLlmProvider>) -> ChatService<MemoryChatRepository> {
        ChatService::new(MemoryChatRepository::default(), provider)
    }

    #[tokio::test]
    async fn test_chat_stores_turn_and_titles_session() {
        let service = service_with(Some(BoxLlmProvider::new(FixedProvider::new("hello"))));
        let session = service.create_session().await.unwrap();

        let reply = service
            .chat(Some(session.id.as_str()), Some("hi"))
            .await
            .unwrap();
        assert_eq!(reply, "hello");

        let history = service.get_history(&session.id).await.unwrap();
        assert_eq!(
            history,
            vec![
                HistoryEntry {
                    role: MessageRole::User,
                    content: "hi".to_string()
                },
                HistoryEntry {
                    role: MessageRole::Assistant,
                    content: "hello".to_string()
                },
            ]
        );

        let sessions = service.list_sessions().await.unwrap();
        assert_eq!(sessions[0].title, "Hi");
    }

    #[tokio::test]
    async fn test_turn_messages_share_timestamp() {
        let service = service_with(Some(BoxLlmProvider::new(FixedProvider::new("ok"))));
        let session = service.create_session().await.unwrap();
        service
            .chat(Some(session.id.as_str()), Some("first"))
            .await
            .unwrap();

        let stored = service.chat_repo().get_history(&session.id).await.unwrap();
        assert_eq!(stored.len(), 2);
        assert_eq!(stored[0].timestamp, stored[1].timestamp);
    }

    #[tokio::test]
    async fn test_auto_title_fires_once() {
        let service = service_with(Some(BoxLlmProvider::new(FixedProvider::new("ok"))));
        let session = service.create_session().await.unwrap();

        service
            .chat(Some(session.id.as_str()), Some("first question about lifetimes here"))
            .await
            .unwrap();
        let title = service
            .chat_repo()
            .get_session_title(&session.id)
            .await
            .unwrap();
        assert_eq!(title.as_deref(), Some("First question about lifetimes"));

        service
            .chat(Some(session.id.as_str()), Some("second message entirely different"))
            .await
            .unwrap();
        let title = service
            .chat_repo()
            .get_session_title(&session.id)
            .await
            .unwrap();
        assert_eq!(title.as_deref(), Some("First question about lifetimes"));
    }

    #[tokio::test]
    async fn test_manual_rename_blocks_auto_title() {
        let service = service_with(Some(BoxLlmProvider::new(FixedProvider::new("ok"))));
        let session = service.create_session().await.unwrap();
        service
            .rename_session(&session.id, "My chat")
            .await
            .unwrap();

        service
            .chat(Some(session.id.as_str()), Some("hello there"))
            .await
            .unwrap();

        let title = service
            .chat_repo()
            .get_session_title(&session.id)
            .await
            .unwrap();
        assert_eq!(title.as_deref(), Some("My chat"));
    }

    #[tokio::test]
    async fn test_full_history_is_sent_each_turn() {
        let provider = FixedProvider::new("ok");
        let seen_turns = Arc::clone(&provider.seen_turns);
        let service = service_with(Some(BoxLlmProvider::new(provider)));
        let session = service.create_session().await.unwrap();

        for msg in ["one", "two", "three"] {
            service
                .chat(Some(session.id.as_str()), Some(msg))
                .await
                .unwrap();
        }

        assert_eq!(*seen_turns.lock().unwrap(), vec![1, 3, 5]);

        let history = service.get_history(&session.id).await.unwrap();
        assert_eq!(history.len(), 6);
        assert_eq!(history[4].content, "three");
    }

    #[tokio::test]
    async fn test_validation_rejects_missing_fields_without_side_effects() {
        let service = service_with(Some(BoxLlmProvider::new(FixedProvider::new("ok"))));
        let session = service.create_session().await.unwrap();

        for (sid, msg) in [
            (None, Some("hi")),
            (Some(session.id.as_str()), None),
            (Some(""), Some("hi")),
            (Some(session.id.as_str()), Some("")),
        ] {
            let err = service.chat(sid, msg).await.unwrap_err();
            assert!(matches!(err, ChatError::Validation(_)));
        }

        let count = service
            .chat_repo()
            .count_messages(&session.id)
            .await
            .unwrap();
        assert_eq!(count, 0);
        let title = service
            .chat_repo()
            .get_session_title(&session.id)
            .await
            .unwrap();
        assert_eq!(title.as_deref(), Some("Untitled"));
    }

    #[tokio::test]
    async fn test_missing_credential_keeps_user_message() {
        let service = service_with(None);
        assert!(!service.has_provider());
        let session = service.create_session().await.unwrap();

        let err = service
            .chat(Some(session.id.as_str()), Some("hi"))
            .await
            .unwrap_err();
        assert!(matches!(err, ChatError::CredentialMissing));

        let history = service.get_history(&session.id).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].role, MessageRole::User);
        assert_eq!(history[0].content, "hi");

        // Title assignment happens before the credential check
        let title = service
            .chat_repo()
            .get_session_title(&session.id)
            .await
            .unwrap();
        assert_eq!(title.as_deref(), Some("Hi"));
    }

    #[tokio::test]
    async fn test_model_failure_leaves_dangling_user_turn() {
        let service = service_with(Some(BoxLlmProvider::new(FailingProvider)));
        let session = service.create_session().await.unwrap();

        let err = service
            .chat(Some(session.id.as_str()), Some("hi"))
            .await
            .unwrap_err();
        match err {
            ChatError::ExternalService(msg) => assert!(msg.contains("HTTP 503")),
            other => panic!("expected ExternalService, got {other:?}"),
        }

        let history = service.get_history(&session.id).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].role, MessageRole::User);
    }

    #[tokio::test]
    async fn test_chat_on_unknown_session() {
        let service = service_with(Some(BoxLlmProvider::new(FixedProvider::new("ok"))));
        let err = service
            .chat(Some("no-such-session"), Some("hi"))
            .await
            .unwrap_err();
        assert!(matches!(err, ChatError::SessionNotFound));
    }

    #[tokio::test]
    async fn test_delete_session_removes_messages() {
        let service = service_with(Some(BoxLlmProvider::new(FixedProvider::new("ok"))));
        let session = service.create_session().await.unwrap();
        service
            .chat(Some(session.id.as_str()), Some("hi"))
            .await
            .unwrap();

        service.delete_session(&session.id).await.unwrap();

        let count = service
            .chat_repo()
            .count_messages(&session.id)
            .await
            .unwrap();
        assert_eq!(count, 0);
        assert!(service.list_sessions().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_history_of_unknown_session_is_empty() {
        let service = service_with(None);
        let history = service
            .get_history(&SessionId::from("missing"))
            .await
            .unwrap();
        assert!(history.is_empty());
    }
}
