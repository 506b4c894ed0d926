//! Modelos de dominio (artículos del API de contenidos, documentos indexables
//! y la respuesta de una consulta).

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Artículo tal y como lo devuelve el API de contenidos.
/// Ambos campos pueden faltar o venir a `null`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ArticleRecord {
    #[serde(default)]
    pub title: Option<String>,
    /// Lista de bloques de texto enriquecido. Se conserva como `Value` para
    /// poder tratar cada bloque mal formado por separado.
    #[serde(default)]
    pub body: Option<Value>,
}

/// Bloque de primer nivel del cuerpo de un artículo (párrafo, lista, ...).
#[derive(Debug, Clone, Deserialize)]
pub struct ContentBlock {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub children: Vec<InlineNode>,
}

/// Nodo hijo de un bloque. Sólo nos interesa su texto.
#[derive(Debug, Clone, Deserialize)]
pub struct InlineNode {
    #[serde(default)]
    pub text: Option<String>,
}

/// Unidad normalizada que se indexa: texto plano + título del artículo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub page_content: String,
    pub source: String,
}

/// Resultado de una consulta RAG.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RagAnswer {
    pub response: String,
    pub metadata_title: String,
    pub excerpt: String,
}

impl RagAnswer {
    pub const NO_RELEVANT_CONTENT: &'static str =
        "No se encontró información relevante en los artículos para responder a esta pregunta.";

    /// Respuesta cuando no hay ningún documento con el que contestar.
    pub fn no_relevant_content() -> Self {
        Self {
            response: Self::NO_RELEVANT_CONTENT.to_string(),
            metadata_title: String::new(),
            excerpt: String::new(),
        }
    }
}
