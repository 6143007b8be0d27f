//! `/health` and `/ask` handlers

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};

use crate::server::state::AppState;
use crate::types::{AskRequest, HealthResponse, ModelResponse};

/// Routes served by the API
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/ask", post(ask))
}

/// GET /health - liveness plus index reachability
///
/// Always 200; an unreachable index only flips `qdrant` to false.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let qdrant = match state.store().health_check().await {
        Ok(reachable) => reachable,
        Err(e) => {
            tracing::warn!("Vector index health check failed: {}", e);
            false
        }
    };

    Json(HealthResponse {
        ok: true,
        qdrant,
        reranker: state.answer_service().context_builder().reranker().is_available(),
        ollama_model: state.llm().model().to_string(),
        embed_model: state.embedder().model().to_string(),
    })
}

/// POST /ask - answer a question from the indexed corpus
///
/// The body is always a response-shaped object, including for `k` of 0,
/// which retrieves nothing and gets the no-context answer.
pub async fn ask(
    State(state): State<AppState>,
    Json(request): Json<AskRequest>,
) -> Json<ModelResponse> {
    let k = request.k_or(state.config().retrieval.top_k);

    tracing::info!("Ask: \"{}\" (k={})", request.q, k);

    let response = match state.answer_service().answer(&request.q, k).await {
        Ok(response) => response,
        Err(e) => {
            tracing::error!("Retrieval failed: {}", e);
            ModelResponse::message(format!("Retrieval failed: {}", e))
        }
    };

    Json(response)
}
