//! Aplanado del cuerpo de texto enriquecido de un artículo a texto plano.
//!
//! Sólo los bloques `paragraph` aportan texto (el del primer hijo). Las listas
//! se reconocen pero todavía no se aplanan; el resto de tipos se ignoran.

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::{error::RagError, models::ContentBlock};

/// Separador entre párrafos del texto resultante.
pub const PARAGRAPH_SEPARATOR: &str = "\n\n";

/// Formatea el campo `body` de un artículo. Un cuerpo ausente o `null` da
/// texto vacío; cualquier cosa que no sea una lista de bloques es un error.
pub fn format_body(body: Option<&Value>) -> Result<String, RagError> {
    match body {
        None | Some(Value::Null) => Ok(String::new()),
        Some(Value::Array(blocks)) => Ok(format_content(blocks)),
        Some(other) => Err(RagError::Format(format!(
            "el campo 'body' debe ser una lista de bloques, se recibió {}",
            json_kind(other)
        ))),
    }
}

/// Une el texto de los párrafos con una línea en blanco, en su orden original.
/// Los bloques mal formados se omiten con un aviso.
pub fn format_content(blocks: &[Value]) -> String {
    let mut paragraphs: Vec<String> = Vec::new();

    for (idx, raw) in blocks.iter().enumerate() {
        let block = match ContentBlock::deserialize(raw) {
            Ok(block) => block,
            Err(e) => {
                warn!("Bloque {idx} mal formado, se omite: {e}");
                continue;
            }
        };

        match block.kind.as_str() {
            "paragraph" => match block.children.into_iter().next().and_then(|c| c.text) {
                Some(text) => paragraphs.push(text),
                None => warn!("Párrafo {idx} sin texto en su primer hijo, se omite"),
            },
            "list" => debug!("Bloque {idx} de tipo 'list' sin aplanar"),
            other => debug!("Bloque {idx} de tipo '{other}' ignorado"),
        }
    }

    paragraphs.join(PARAGRAPH_SEPARATOR)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "un booleano",
        Value::Number(_) => "un número",
        Value::String(_) => "una cadena",
        Value::Array(_) => "una lista",
        Value::Object(_) => "un objeto",
    }
}
