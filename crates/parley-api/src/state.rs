//! Application state wiring storage and the model provider together.
//!
//! `ChatService` is generic over its repository; AppState pins it to the
//! SQLite implementation.

use std::sync::Arc;

use secrecy::SecretString;

use parley_core::chat::service::ChatService;
use parley_infra::llm::create_provider;
use parley_infra::sqlite::chat::SqliteChatRepository;
use parley_infra::sqlite::pool::DatabasePool;
use parley_types::config::GeminiConfig;

/// Concrete chat service pinned to the infra implementation.
pub type ConcreteChatService = ChatService<SqliteChatRepository>;

/// Shared application state handed to every HTTP handler.
#[derive(Clone)]
pub struct AppState {
    pub chat_service: Arc<ConcreteChatService>,
    pub db_pool: DatabasePool,
}

impl AppState {
    /// Connect to the database (running migrations) and build the chat service.
    ///
    /// A missing API key is not fatal; the chat endpoint reports it per request.
    pub async fn init(
        database_url: &str,
        gemini: &GeminiConfig,
        api_key: Option<SecretString>,
    ) -> anyhow::Result<Self> {
        let db_pool = DatabasePool::new(database_url).await?;
        let provider = create_provider(gemini, api_key)?;

        let chat_repo = SqliteChatRepository::new(db_pool.clone());
        Ok(Self::new(ChatService::new(chat_repo, provider), db_pool))
    }

    pub fn new(chat_service: ConcreteChatService, db_pool: DatabasePool) -> Self {
        Self {
            chat_service: Arc::new(chat_service),
            db_pool,
        }
    }
}
