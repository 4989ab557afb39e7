//! Axum HTTP server exposing the relay.
//!
//! | Route | Description |
//! |-------|-------------|
//! | `POST /askGemini` | Explain one value (`{promptKey?, prompt, modelOverride?}`) |
//! | `POST /generateAll` | Explain a batch (`{jsonArray, models, modelSwitchLimit}`) |
//! | `GET /health` | Liveness probe |
//! | anything else | Static files from `static_dir`, when configured |

mod routes;

use axum::extract::DefaultBodyLimit;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::config::RelayConfig;
use crate::relay::Relay;
use crate::Error;

/// Shared state for all handlers.
pub struct AppState {
    pub relay: Relay,
}

/// JSON error body: `{"error": "..."}`.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        if err.is_client_error() {
            Self::bad_request(err.message())
        } else {
            tracing::error!(error = %err, "Request failed");
            Self {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                message: err.to_string(),
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(serde_json::json!({ "error": self.message })),
        )
            .into_response()
    }
}

/// Build the router. `static_dir` becomes the fallback service.
pub fn build_router(relay: Relay, body_limit_bytes: usize, static_dir: Option<PathBuf>) -> Router {
    let state = Arc::new(AppState { relay });

    let api = Router::new()
        .route("/askGemini", post(routes::ask_gemini))
        .route("/generateAll", post(routes::generate_all))
        .route("/health", get(routes::health))
        .layer(DefaultBodyLimit::max(body_limit_bytes))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    match static_dir {
        Some(dir) => api.fallback_service(tower_http::services::ServeDir::new(dir)),
        None => api,
    }
}

/// Bind and serve until Ctrl-C.
pub async fn start_server(config: &RelayConfig, relay: Relay) -> crate::Result<()> {
    let app = build_router(relay, config.body_limit_bytes, config.static_dir.clone());
    let addr = config.listen_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {addr}");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Failed to install Ctrl-C handler");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorContext;

    #[test]
    fn test_client_errors_map_to_400_without_context() {
        let err = Error::invalid_input_with_context(
            "Model list is required.",
            ErrorContext::new().with_field_path("models"),
        );
        let api: ApiError = err.into();
        assert_eq!(api.status, StatusCode::BAD_REQUEST);
        assert_eq!(api.message, "Model list is required.");
    }

    #[test]
    fn test_other_errors_map_to_500() {
        let err = Error::Io(std::io::Error::new(std::io::ErrorKind::Other, "disk full"));
        let api: ApiError = err.into();
        assert_eq!(api.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(api.message.contains("disk full"));
    }
}
