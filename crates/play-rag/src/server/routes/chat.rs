//! Chat endpoint: retrieve, then stream a grounded answer

use axum::{
    body::Body,
    extract::State,
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use std::time::Instant;
use uuid::Uuid;

use crate::error::Result;
use crate::generation::collect_answer;
use crate::server::state::AppState;
use crate::types::RagRequest;

const TEXT_PLAIN: &str = "text/plain; charset=utf-8";

/// POST /chat - Answer a question about the play
pub async fn chat(
    State(state): State<AppState>,
    Json(request): Json<RagRequest>,
) -> Result<Response> {
    request.validate()?;
    let start = Instant::now();
    let request_id = Uuid::new_v4();

    tracing::info!(%request_id, "Query: \"{}\"", request.query);

    let results = state.index().query(&request.search_query()).await?;
    tracing::debug!(
        %request_id,
        "Retrieved {} results in {}ms",
        results.len(),
        start.elapsed().as_millis()
    );

    let model = request.generation_options.model_id;
    let stream = state.generator().generate(&request.query, &results, model)?;

    if request.generation_options.return_stream {
        return Ok(([(header::CONTENT_TYPE, TEXT_PLAIN)], Body::from_stream(stream)).into_response());
    }

    let answer = collect_answer(stream).await?;
    tracing::info!(%request_id, "Answered with {} in {}ms", model, start.elapsed().as_millis());
    Ok(([(header::CONTENT_TYPE, TEXT_PLAIN)], answer).into_response())
}
