//! API routes for the RAG server

pub mod chat;

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};

use crate::server::state::AppState;

/// Build all API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/chat", post(chat::chat))
        .route("/info", get(info))
}

/// API info endpoint
async fn info(State(state): State<AppState>) -> Json<Value> {
    let index = state.index();
    Json(json!({
        "name": "play-rag",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Question answering over Romeo and Juliet with act/scene-aware retrieval",
        "endpoints": {
            "POST /chat": "Answer a question, streamed as plain text",
            "GET /health": "Liveness",
            "GET /ready": "503 until the corpus is indexed",
            "GET /info": "This document"
        },
        "index": {
            "entries": index.len(),
            "dimension": index.dimension(),
            "reranking": index.can_rerank()
        },
        "models": state.config().models
    }))
}
