//! API routes

pub mod chat;
pub mod error;
pub mod files;
pub mod health;
pub mod vector_stores;

use axum::{
    middleware,
    routing::{delete, get, post},
    Router,
};

use crate::middleware::{auth_middleware, logging_middleware};
use crate::state::AppState;

pub use error::ApiError;

/// Create the main API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // OpenAI-compatible endpoints
        .route("/v1/chat/completions", post(chat::chat_completions))
        // Vector stores
        .route(
            "/v1/vector_stores",
            post(vector_stores::create_vector_store).get(vector_stores::list_vector_stores),
        )
        .route("/v1/vector_stores/:id", get(vector_stores::get_vector_store))
        .route(
            "/v1/vector_stores/:id",
            delete(vector_stores::delete_vector_store),
        )
        .route(
            "/v1/vector_stores/:id/search",
            post(vector_stores::search_vector_store),
        )
        // Files
        .route("/v1/files", post(files::upload_file).get(files::list_files))
        .route("/v1/files/:id", get(files::get_file))
        .route("/v1/files/:id", delete(files::delete_file))
        // Health endpoint
        .route("/health", get(health::health_check))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ))
        .layer(middleware::from_fn(logging_middleware))
        .with_state(state)
}
