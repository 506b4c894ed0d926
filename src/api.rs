use axum::{
    extract::{rejection::JsonRejection, Json, State},
    routing::post,
    Router,
};
use serde::{Deserialize, Serialize};
use tracing::{info, info_span, Instrument};
use uuid::Uuid;

use crate::{app_state::AppState, error::RagError, models::RagAnswer, rag};

// --- Payloads y Respuestas de la API ---

#[derive(Deserialize)]
pub struct RagQueryPayload {
    question: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct RagQueryResponse {
    response: String,
    metadata_title: String,
    excerpt: String,
}

impl From<RagAnswer> for RagQueryResponse {
    fn from(answer: RagAnswer) -> Self {
        Self {
            response: answer.response,
            metadata_title: answer.metadata_title,
            excerpt: answer.excerpt,
        }
    }
}

// --- Router ---

pub fn create_router(app_state: AppState) -> Router {
    Router::new()
        .route("/rag-qa", post(rag_qa_handler))
        .with_state(app_state)
}

// --- Handlers ---

#[axum::debug_handler]
async fn rag_qa_handler(
    State(state): State<AppState>,
    payload: Result<Json<RagQueryPayload>, JsonRejection>,
) -> Result<Json<RagQueryResponse>, RagError> {
    let Json(payload) = payload.map_err(|e| RagError::BadRequest(e.body_text()))?;
    let question = payload
        .question
        .filter(|q| !q.trim().is_empty())
        .ok_or_else(|| RagError::BadRequest("Falta el campo 'question'".to_string()))?;

    // Todo lo que se loguea a partir de aquí lleva el request_id.
    let span = info_span!("rag_qa", request_id = %Uuid::new_v4());
    async move {
        info!("Pregunta recibida: {question}");
        rag::rag_query(&state, &question)
            .await
            .inspect_err(RagError::log)
    }
    .instrument(span)
    .await
    .map(|answer| Json(answer.into()))
}
