//! Axum router configuration with middleware.
//!
//! Chat routes are under `/api/`; `/` and `/health` are liveness checks.
//! Middleware: CORS, tracing.

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::http::handlers;
use crate::state::AppState;

/// Build the complete API router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        // Sessions
        .route("/new_session", post(handlers::session::new_session))
        .route("/sessions", get(handlers::session::list_sessions))
        .route("/rename_session", post(handlers::session::rename_session))
        .route("/delete_session", post(handlers::session::delete_session))
        .route("/history/{session_id}", get(handlers::session::get_history))
        // Chat
        .route("/chat", post(handlers::chat::chat));

    Router::new()
        .nest("/api", api_routes)
        .route("/", get(index))
        .route("/health", get(health_check))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// GET / - Plain-text liveness string.
async fn index() -> &'static str {
    "Parley backend running"
}

/// GET /health - Simple health check endpoint.
async fn health_check() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    use axum::body::Body;
    use axum::http::{header, Method, Request, StatusCode};
    use serde_json::{json, Value};
    use tempfile::TempDir;
    use tower::ServiceExt;

    use parley_core::chat::service::ChatService;
    use parley_core::llm::box_provider::BoxLlmProvider;
    use parley_core::llm::provider::LlmProvider;
    use parley_infra::sqlite::chat::SqliteChatRepository;
    use parley_infra::sqlite::pool::{default_database_url, DatabasePool};
    use parley_types::llm::{CompletionRequest, CompletionResponse, LlmError};

    /// Always answers "hello".
    struct HelloProvider;

    impl LlmProvider for HelloProvider {
        fn name(&self) -> &str {
            "stub"
        }

        fn model(&self) -> &str {
            "stub-model"
        }

        async fn complete(
            &self,
            _request: &CompletionRequest,
        ) -> Result<CompletionResponse, LlmError> {
            Ok(CompletionResponse {
                content: "hello".to_string(),
                model: "stub-model".to_string(),
            })
        }
    }

    async fn test_router(provider: Option<BoxLlmProvider>) -> (Router, TempDir) {
        let dir = TempDir::new().unwrap();
        let pool = DatabasePool::new(&default_database_url(dir.path()))
            .await
            .unwrap();
        let service = ChatService::new(SqliteChatRepository::new(pool.clone()), provider);
        (build_router(AppState::new(service, pool)), dir)
    }

    async fn send(router: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };
        (status, value)
    }

    async fn new_session(router: &Router) -> String {
        let (status, body) = send(router, Method::POST, "/api/new_session", None).await;
        assert_eq!(status, StatusCode::OK);
        body["session_id"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn chat_turn_stores_reply_and_titles_session() {
        let (router, _dir) = test_router(Some(BoxLlmProvider::new(HelloProvider))).await;
        let sid = new_session(&router).await;

        let (status, body) = send(
            &router,
            Method::POST,
            "/api/chat",
            Some(json!({ "session_id": sid, "message": "hi" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "reply": "hello" }));

        let (_, history) = send(&router, Method::GET, &format!("/api/history/{sid}"), None).await;
        assert_eq!(
            history,
            json!([
                { "role": "user", "content": "hi" },
                { "role": "assistant", "content": "hello" }
            ])
        );

        let (_, sessions) = send(&router, Method::GET, "/api/sessions", None).await;
        assert_eq!(sessions, json!([{ "id": sid, "title": "Hi" }]));
    }

    #[tokio::test]
    async fn chat_without_credential_keeps_user_message() {
        let (router, _dir) = test_router(None).await;
        let sid = new_session(&router).await;

        let (status, body) = send(
            &router,
            Method::POST,
            "/api/chat",
            Some(json!({ "session_id": sid, "message": "hi" })),
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({ "error": "Gemini API key missing" }));

        let (_, history) = send(&router, Method::GET, &format!("/api/history/{sid}"), None).await;
        assert_eq!(history, json!([{ "role": "user", "content": "hi" }]));
    }

    #[tokio::test]
    async fn chat_missing_fields_is_bad_request() {
        let (router, _dir) = test_router(Some(BoxLlmProvider::new(HelloProvider))).await;

        for body in [json!({}), json!({ "session_id": "abc" }), json!({ "message": "hi" })] {
            let (status, response) = send(&router, Method::POST, "/api/chat", Some(body)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(response, json!({ "error": "session_id and message required" }));
        }
    }

    #[tokio::test]
    async fn chat_unknown_session_is_not_found() {
        let (router, _dir) = test_router(Some(BoxLlmProvider::new(HelloProvider))).await;

        let (status, body) = send(
            &router,
            Method::POST,
            "/api/chat",
            Some(json!({ "session_id": "no-such-session", "message": "hi" })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({ "error": "session not found" }));

        let (_, history) =
            send(&router, Method::GET, "/api/history/no-such-session", None).await;
        assert_eq!(history, json!([]));
    }

    #[tokio::test]
    async fn malformed_json_is_bad_request() {
        let (router, _dir) = test_router(None).await;

        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/rename_session")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let response = router.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn sessions_list_newest_first() {
        let (router, _dir) = test_router(None).await;
        let a = new_session(&router).await;
        let b = new_session(&router).await;

        let (status, sessions) = send(&router, Method::GET, "/api/sessions", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            sessions,
            json!([
                { "id": b, "title": "Untitled" },
                { "id": a, "title": "Untitled" }
            ])
        );
    }

    #[tokio::test]
    async fn rename_and_delete_session() {
        let (router, _dir) = test_router(Some(BoxLlmProvider::new(HelloProvider))).await;
        let sid = new_session(&router).await;

        let (status, body) = send(
            &router,
            Method::POST,
            "/api/rename_session",
            Some(json!({ "session_id": sid, "title": "Trip planning" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "ok": true }));

        // Manual title survives the first message
        send(
            &router,
            Method::POST,
            "/api/chat",
            Some(json!({ "session_id": sid, "message": "hi" })),
        )
        .await;
        let (_, sessions) = send(&router, Method::GET, "/api/sessions", None).await;
        assert_eq!(sessions, json!([{ "id": sid, "title": "Trip planning" }]));

        let (status, body) = send(
            &router,
            Method::POST,
            "/api/delete_session",
            Some(json!({ "session_id": sid })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "ok": true }));

        let (_, sessions) = send(&router, Method::GET, "/api/sessions", None).await;
        assert_eq!(sessions, json!([]));
        let (_, history) = send(&router, Method::GET, &format!("/api/history/{sid}"), None).await;
        assert_eq!(history, json!([]));
    }

    #[tokio::test]
    async fn rename_unknown_session_is_ok() {
        let (router, _dir) = test_router(None).await;

        let (status, body) = send(
            &router,
            Method::POST,
            "/api/rename_session",
            Some(json!({ "session_id": "ghost", "title": "Nope" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "ok": true }));
    }

    #[tokio::test]
    async fn liveness_endpoints() {
        let (router, _dir) = test_router(None).await;

        let (status, body) = send(&router, Method::GET, "/", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!("Parley backend running"));

        let (status, body) = send(&router, Method::GET, "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }
}
