mod error;
mod tokens;

use axum::{Json, Router, routing::get};
use std::sync::Arc;

use crate::db::Database;
use crate::jwt::JwtConfig;

pub use error::ApiError;
pub use tokens::TokensState;

/// Create the API router.
pub fn create_api_router(db: Database, jwt: Arc<JwtConfig>, secure_cookies: bool) -> Router {
    let tokens_state = tokens::TokensState {
        db,
        jwt,
        secure_cookies,
    };

    Router::new()
        .route("/health", get(health))
        .merge(tokens::router(tokens_state))
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}
