//! Abstracción sobre Rig para trabajar con distintos proveedores de LLM.
//!
//! El flujo RAG sólo conoce los traits [`Embedder`] y [`ChatModel`];
//! [`LlmManager`] los implementa para Cohere y OpenAI.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use rig::client::{CompletionClient, EmbeddingsClient};
use rig::completion::Prompt;
use rig::embeddings::EmbeddingModel;
use rig::providers::{cohere, openai};

use crate::config::{AppConfig, LlmProvider};

/// Convierte textos en vectores. Los documentos y las búsquedas se embeben
/// por separado porque algunos modelos (Cohere v3) los tratan distinto.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Un vector por documento, en el mismo orden.
    async fn embed_documents(&self, texts: Vec<String>) -> Result<Vec<Vec<f64>>>;

    /// Vector de la pregunta con la que se busca en el índice.
    async fn embed_query(&self, text: &str) -> Result<Vec<f64>>;
}

/// Uso que se le va a dar a un embedding.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EmbeddingPurpose {
    Document,
    Query,
}

impl EmbeddingPurpose {
    /// Valor de `input_type` que espera Cohere.
    pub fn cohere_input_type(self) -> &'static str {
        match self {
            Self::Document => "search_document",
            Self::Query => "search_query",
        }
    }
}

/// Modelo de chat: un mensaje de sistema y otro de usuario, devuelve texto.
#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn complete(&self, system: &str, user: &str) -> Result<String>;
}

/// Gestor de LLMs y embeddings.
#[derive(Clone)]
pub struct LlmManager {
    pub provider: LlmProvider,
    pub embedding_model: String,
    pub chat_model: String,
    api_key: String,
}

impl std::fmt::Debug for LlmManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmManager")
            .field("provider", &self.provider)
            .field("embedding_model", &self.embedding_model)
            .field("chat_model", &self.chat_model)
            .finish_non_exhaustive()
    }
}

impl LlmManager {
    /// Construye el manager a partir de la configuración.
    pub fn from_config(cfg: &AppConfig) -> Result<Self> {
        if cfg.llm_api_key.trim().is_empty() {
            return Err(anyhow!(
                "Falta la credencial del proveedor LLM ({})",
                cfg.llm_provider.api_key_var()
            ));
        }
        Ok(Self {
            provider: cfg.llm_provider.clone(),
            embedding_model: cfg.llm_embedding_model.clone(),
            chat_model: cfg.llm_chat_model.clone(),
            api_key: cfg.llm_api_key.clone(),
        })
    }

    async fn embed(&self, texts: Vec<String>, purpose: EmbeddingPurpose) -> Result<Vec<Vec<f64>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let model_name = self.embedding_model.as_str();
        match self.provider {
            LlmProvider::Cohere => {
                let client = cohere::Client::new(&self.api_key);
                let model = client.embedding_model(model_name, purpose.cohere_input_type());
                embed_with(model, texts).await
            }
            LlmProvider::OpenAI => {
                let client = openai::Client::new(&self.api_key);
                embed_with(EmbeddingsClient::embedding_model(&client, model_name), texts).await
            }
        }
    }
}

#[async_trait]
impl Embedder for LlmManager {
    async fn embed_documents(&self, texts: Vec<String>) -> Result<Vec<Vec<f64>>> {
        self.embed(texts, EmbeddingPurpose::Document).await
    }

    async fn embed_query(&self, text: &str) -> Result<Vec<f64>> {
        self.embed(vec![text.to_string()], EmbeddingPurpose::Query)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("No se pudo generar embedding de la query"))
    }
}

#[async_trait]
impl ChatModel for LlmManager {
    async fn complete(&self, system: &str, user: &str) -> Result<String> {
        let model_name = self.chat_model.as_str();
        let answer = match self.provider {
            LlmProvider::Cohere => {
                let client = cohere::Client::new(&self.api_key);
                let agent = client.agent(model_name).preamble(system).build();
                agent.prompt(user).await?
            }
            LlmProvider::OpenAI => {
                let client = openai::Client::new(&self.api_key);
                let agent = client.agent(model_name).preamble(system).build();
                agent.prompt(user).await?
            }
        };
        Ok(answer)
    }
}

/// Embeddings en bloque, comprobando que hay uno por texto.
async fn embed_with<M: EmbeddingModel>(model: M, texts: Vec<String>) -> Result<Vec<Vec<f64>>> {
    let expected = texts.len();
    let embeddings = model.embed_texts(texts).await?;

    if embeddings.len() != expected {
        return Err(anyhow!(
            "Número de embeddings ({}) distinto al número de textos ({})",
            embeddings.len(),
            expected
        ));
    }

    Ok(embeddings.into_iter().map(|e| e.vec).collect())
}
