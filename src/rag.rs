//! Consulta RAG sobre los artículos del API de contenidos.
//!
//! Flujo (cada etapa devuelve `Result`, sólo una cadena completa llega a la respuesta):
//!   1. Descarga de artículos y aplanado a `Document`s.
//!   2. Índice vectorial en memoria, nuevo en cada petición.
//!   3. Búsqueda por similitud con la pregunta tal cual; sólo el mejor resultado.
//!   4. El LLM responde con el contenido completo del documento como contexto.
//!   5. Se devuelve la respuesta, el título del documento y un extracto recortado.

use tracing::{info, warn};

use crate::{
    app_state::AppState,
    error::RagError,
    ingest,
    models::RagAnswer,
    vector_store::VectorIndex,
};

/// Instrucción fija que precede al contexto en el mensaje de sistema.
pub const SYSTEM_INSTRUCTION: &str = "please keep the response very short.";

pub async fn rag_query(state: &AppState, question: &str) -> Result<RagAnswer, RagError> {
    info!("Obteniendo artículos...");
    let documents = ingest::fetch_documents(&state.http, &state.config).await?;

    let index = match VectorIndex::build(documents, &state.embedder).await {
        Ok(index) => index,
        Err(RagError::NoDocuments) => {
            warn!("Ningún artículo con texto que indexar");
            return Ok(RagAnswer::no_relevant_content());
        }
        Err(e) => return Err(e),
    };

    let Some(hit) = index
        .search(question, 1)
        .await?
        .into_iter()
        .next()
    else {
        warn!("La búsqueda no devolvió resultados");
        return Ok(RagAnswer::no_relevant_content());
    };
    info!(score = hit.score, "Mejor documento: '{}'", hit.document.source);

    let system_prompt = build_system_prompt(&hit.document.page_content);
    let response = state
        .chat
        .complete(&system_prompt, question)
        .await
        .map_err(|e| RagError::Completion(e.to_string()))?;

    Ok(RagAnswer {
        response,
        excerpt: truncate_chars(&hit.document.page_content, state.config.excerpt_max_chars),
        metadata_title: hit.document.source,
    })
}

pub fn build_system_prompt(context: &str) -> String {
    format!("{SYSTEM_INSTRUCTION} {context}")
}

/// Recorta a `max_chars` caracteres (no bytes).
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}
