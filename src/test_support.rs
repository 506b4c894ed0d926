//! Utilidades de test: un API de contenidos falso servido con axum y dobles
//! de los traits del LLM que no salen a la red.

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use axum::{
    extract::Query,
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde_json::Value;
use url::Url;

use crate::{
    app_state::AppState,
    config::{AppConfig, LlmProvider},
    llm::{ChatModel, Embedder},
    models::Document,
};

pub const TEST_TOKEN: &str = "test-token";

pub fn test_config(content_api_url: &str) -> AppConfig {
    AppConfig {
        server_addr: "127.0.0.1:0".to_string(),
        llm_provider: LlmProvider::Cohere,
        llm_api_key: "co-test-key".to_string(),
        llm_embedding_model: "embed-english-v3.0".to_string(),
        llm_chat_model: "command-r".to_string(),
        content_api_url: Url::parse(content_api_url).unwrap(),
        content_api_token: TEST_TOKEN.to_string(),
        content_api_timeout: Duration::from_secs(5),
        content_api_max_retries: 2,
        content_api_retry_backoff: Duration::from_millis(1),
        excerpt_max_chars: 200,
    }
}

pub fn test_state(content_api_url: &str, chat: Arc<dyn ChatModel>) -> AppState {
    AppState::new(test_config(content_api_url), Arc::new(KeywordEmbedder::default()), chat).unwrap()
}

pub fn doc(source: &str, page_content: &str) -> Document {
    Document {
        page_content: page_content.to_string(),
        source: source.to_string(),
    }
}

// --- API de contenidos falso ---

/// Comportamiento del API falso: responde `payload` tras `failures` 503.
#[derive(Clone)]
pub struct ContentApi {
    payload: Value,
    failures: usize,
}

impl ContentApi {
    pub fn ok(payload: Value) -> Self {
        Self { payload, failures: 0 }
    }

    pub fn flaky(failures: usize, payload: Value) -> Self {
        Self { payload, failures }
    }
}

pub struct SpawnedApi {
    pub url: Url,
    pub hits: Arc<AtomicUsize>,
}

/// Levanta el API falso en un puerto libre. Exige el token de test y
/// `populate=*`, como el API real.
pub async fn spawn_content_api(api: ContentApi) -> SpawnedApi {
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = hits.clone();

    let handler = move |headers: HeaderMap, Query(params): Query<HashMap<String, String>>| {
        let api = api.clone();
        let counter = counter.clone();
        async move {
            let seen = counter.fetch_add(1, Ordering::SeqCst);
            let expected = format!("Bearer {TEST_TOKEN}");
            let auth = headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok());

            if auth != Some(expected.as_str()) {
                return StatusCode::UNAUTHORIZED.into_response();
            }
            if params.get("populate").map(String::as_str) != Some("*") {
                return (StatusCode::BAD_REQUEST, "populate=* requerido").into_response();
            }
            if seen < api.failures {
                return StatusCode::SERVICE_UNAVAILABLE.into_response();
            }
            Json(api.payload).into_response()
        }
    };

    let app = Router::new().route("/api/articles", get(handler));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    SpawnedApi {
        url: Url::parse(&format!("http://{addr}")).unwrap(),
        hits,
    }
}

// --- Dobles del LLM ---

const VOCABULARY: &[&str] = &["sign", "step", "billing", "invoice", "password", "account"];

/// Embedding de bolsa de palabras sobre un vocabulario fijo. Registra qué
/// textos llegan como documentos y cuáles como búsqueda.
#[derive(Default)]
pub struct KeywordEmbedder {
    document_batches: Mutex<Vec<Vec<String>>>,
    queries: Mutex<Vec<String>>,
}

impl KeywordEmbedder {
    /// La última componente es constante para que ningún vector sea nulo.
    fn vector(text: &str) -> Vec<f64> {
        let lower = text.to_lowercase();
        VOCABULARY
            .iter()
            .map(|word| lower.matches(word).count() as f64)
            .chain(std::iter::once(0.01))
            .collect()
    }

    pub fn document_batches(&self) -> Vec<Vec<String>> {
        self.document_batches.lock().unwrap().clone()
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl Embedder for KeywordEmbedder {
    async fn embed_documents(&self, texts: Vec<String>) -> Result<Vec<Vec<f64>>> {
        let vectors = texts.iter().map(|t| Self::vector(t)).collect();
        self.document_batches.lock().unwrap().push(texts);
        Ok(vectors)
    }

    async fn embed_query(&self, text: &str) -> Result<Vec<f64>> {
        self.queries.lock().unwrap().push(text.to_string());
        Ok(Self::vector(text))
    }
}

/// Embedder que falla. Por defecto falla todo; las variantes dejan pasar los
/// documentos y fallan (o devuelven un vector corto) en la búsqueda.
#[derive(Default)]
pub struct FailingEmbedder {
    documents_ok: bool,
    short_queries: bool,
}

impl FailingEmbedder {
    pub fn queries_only() -> Self {
        Self {
            documents_ok: true,
            short_queries: false,
        }
    }

    pub fn short_queries() -> Self {
        Self {
            documents_ok: true,
            short_queries: true,
        }
    }
}

#[async_trait]
impl Embedder for FailingEmbedder {
    async fn embed_documents(&self, texts: Vec<String>) -> Result<Vec<Vec<f64>>> {
        if !self.documents_ok {
            return Err(anyhow!("proveedor de embeddings caído"));
        }
        Ok(texts.iter().map(|_| vec![1.0, 0.0, 0.0]).collect())
    }

    async fn embed_query(&self, _text: &str) -> Result<Vec<f64>> {
        if self.short_queries {
            return Ok(vec![1.0]);
        }
        Err(anyhow!("proveedor de embeddings caído"))
    }
}

/// Modelo de chat que registra cada llamada y contesta con su contexto.
#[derive(Default)]
pub struct RecordingChat {
    calls: Mutex<Vec<(String, String)>>,
    fail: bool,
}

impl RecordingChat {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatModel for RecordingChat {
    async fn complete(&self, system: &str, user: &str) -> Result<String> {
        self.calls
            .lock()
            .unwrap()
            .push((system.to_string(), user.to_string()));
        if self.fail {
            return Err(anyhow!("429 Too Many Requests"));
        }
        Ok(format!("Respuesta breve. {system}"))
    }
}
