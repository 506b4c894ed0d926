//! Errores del flujo de consulta RAG y su traducción a respuestas HTTP.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

/// Fallos posibles de una consulta, uno por etapa del flujo.
#[derive(Debug, Error)]
pub enum RagError {
    #[error("Petición inválida: {0}")]
    BadRequest(String),

    #[error("Error obteniendo artículos del API de contenidos: {0}")]
    Fetch(String),

    #[error("Contenido de artículo mal formado: {0}")]
    Format(String),

    #[error("No hay documentos que indexar")]
    NoDocuments,

    #[error("Error generando embeddings: {0}")]
    Embedding(String),

    #[error("Error en la búsqueda por similitud: {0}")]
    Search(String),

    #[error("Error del proveedor de chat: {0}")]
    Completion(String),
}

impl RagError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Deja constancia del fallo en el span actual (el de la petición).
    pub fn log(&self) {
        if self.status_code().is_server_error() {
            error!("Consulta RAG fallida: {self}");
        } else {
            warn!("Consulta RAG rechazada: {self}");
        }
    }
}

impl IntoResponse for RagError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
