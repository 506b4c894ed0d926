//! Índice vectorial en memoria para los documentos de una consulta, sobre el
//! `InMemoryVectorStore` de Rig.
//!
//! API pública:
//!   - `VectorIndex::build(documents, &Arc<dyn Embedder>)`
//!   - `VectorIndex::search(&str, usize)`.
//!
//! El índice se construye de cero en cada petición y se descarta al terminar,
//! así que siempre refleja exactamente los artículos recién obtenidos.

use std::{future::Future, sync::Arc};

use rig::{
    embeddings::{Embedding, EmbeddingError, EmbeddingModel},
    vector_store::{
        in_memory_store::{InMemoryVectorIndex, InMemoryVectorStore},
        VectorSearchRequest, VectorStoreIndex,
    },
    wasm_compat::WasmCompatSend,
    OneOrMany,
};
use tracing::{debug, info};

use crate::{error::RagError, llm::Embedder, models::Document};

/// Resultado de una búsqueda: puntuación coseno y documento.
#[derive(Debug, Clone)]
pub struct SearchHit {
    pub score: f64,
    pub document: Document,
}

/// Adapta un [`Embedder`] al `EmbeddingModel` de Rig. El índice sólo lo usa
/// para embeber la pregunta, así que siempre pasa por `embed_query`.
#[derive(Clone)]
struct QueryEmbeddingModel {
    embedder: Arc<dyn Embedder>,
    ndims: usize,
}

impl EmbeddingModel for QueryEmbeddingModel {
    const MAX_DOCUMENTS: usize = 1;

    fn ndims(&self) -> usize {
        self.ndims
    }

    fn embed_texts(
        &self,
        texts: impl IntoIterator<Item = String> + WasmCompatSend,
    ) -> impl Future<Output = Result<Vec<Embedding>, EmbeddingError>> + WasmCompatSend {
        let texts: Vec<String> = texts.into_iter().collect();
        let embedder = self.embedder.clone();
        let ndims = self.ndims;

        async move {
            let mut embeddings = Vec::with_capacity(texts.len());
            for document in texts {
                let vec = embedder
                    .embed_query(&document)
                    .await
                    .map_err(|e| EmbeddingError::ProviderError(e.to_string()))?;
                if vec.len() != ndims {
                    return Err(EmbeddingError::ProviderError(format!(
                        "El embedding de la query tiene {} dimensiones, el índice {ndims}",
                        vec.len()
                    )));
                }
                embeddings.push(Embedding { document, vec });
            }
            Ok(embeddings)
        }
    }
}

pub struct VectorIndex {
    index: InMemoryVectorIndex<QueryEmbeddingModel, Document>,
}

impl VectorIndex {
    /// Calcula los embeddings de `documents` y construye el índice.
    ///
    /// Los documentos sin texto no aportan nada a la búsqueda y se descartan.
    /// Si no queda ninguno se devuelve `RagError::NoDocuments`.
    pub async fn build(
        documents: Vec<Document>,
        embedder: &Arc<dyn Embedder>,
    ) -> Result<Self, RagError> {
        let total = documents.len();
        let documents: Vec<Document> = documents
            .into_iter()
            .filter(|d| !d.page_content.trim().is_empty())
            .collect();

        if documents.is_empty() {
            return Err(RagError::NoDocuments);
        }
        if documents.len() < total {
            debug!("{} documentos sin texto descartados", total - documents.len());
        }

        let texts: Vec<String> = documents.iter().map(|d| d.page_content.clone()).collect();
        let vectors = embedder
            .embed_documents(texts)
            .await
            .map_err(|e| RagError::Embedding(e.to_string()))?;

        if vectors.len() != documents.len() {
            return Err(RagError::Embedding(format!(
                "Número de embeddings ({}) distinto al número de documentos ({})",
                vectors.len(),
                documents.len()
            )));
        }

        let ndims = vectors[0].len();
        if ndims == 0 || vectors.iter().any(|v| v.len() != ndims) {
            return Err(RagError::Embedding(
                "Los embeddings devueltos tienen dimensiones inconsistentes".to_string(),
            ));
        }

        // La posición de llegada es el id: sirve para desempatar.
        let entries = documents
            .into_iter()
            .zip(vectors)
            .enumerate()
            .map(|(position, (document, vec))| {
                let embedding = Embedding {
                    document: document.page_content.clone(),
                    vec,
                };
                (position, document, OneOrMany::one(embedding))
            });
        let store = InMemoryVectorStore::from_documents_with_ids(entries);
        info!("Índice en memoria con {} documentos ({ndims} dims)", store.len());

        let model = QueryEmbeddingModel {
            embedder: embedder.clone(),
            ndims,
        };
        Ok(Self {
            index: store.index(model),
        })
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Busca los `top_k` documentos más parecidos a `query`, ordenados por
    /// similitud descendente (a igual puntuación, por orden de llegada).
    ///
    /// El store de Rig no garantiza cuál entra si el corte de `top_k` cae
    /// entre empatados.
    pub async fn search(&self, query: &str, top_k: usize) -> Result<Vec<SearchHit>, RagError> {
        let request = VectorSearchRequest::builder()
            .query(query)
            .samples(top_k as u64)
            .build()
            .map_err(|e| RagError::Search(e.to_string()))?;

        let mut ranked: Vec<(f64, usize, Document)> = self
            .index
            .top_n::<Document>(request)
            .await
            .map_err(|e| RagError::Search(e.to_string()))?
            .into_iter()
            .map(|(score, id, document)| (score, id.parse().unwrap_or(usize::MAX), document))
            .collect();

        ranked.sort_by(|a, b| {
            b.0.partial_cmp(&a.0)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.1.cmp(&b.1))
        });

        Ok(ranked
            .into_iter()
            .map(|(score, _, document)| SearchHit { score, document })
            .collect())
    }
}
