//! Carga y gestión de configuración de la aplicación (API de contenidos + LLM).

use std::{env, str::FromStr, time::Duration};

use anyhow::{anyhow, Context, Result};
use url::Url;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LlmProvider {
    Cohere,
    OpenAI,
}

impl LlmProvider {
    /// Variable de entorno que contiene la credencial del proveedor.
    pub fn api_key_var(&self) -> &'static str {
        match self {
            Self::Cohere => "COHERE_API_KEY",
            Self::OpenAI => "OPENAI_API_KEY",
        }
    }

    fn default_embedding_model(&self) -> &'static str {
        match self {
            Self::Cohere => "embed-english-v3.0",
            Self::OpenAI => "text-embedding-3-small",
        }
    }

    fn default_chat_model(&self) -> &'static str {
        match self {
            Self::Cohere => "command-r",
            Self::OpenAI => "gpt-4o-mini",
        }
    }
}

impl FromStr for LlmProvider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "cohere" => Ok(Self::Cohere),
            "openai" => Ok(Self::OpenAI),
            other => Err(anyhow!("Proveedor LLM no soportado: {other}")),
        }
    }
}

/// Configuración completa de la aplicación.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub server_addr: String,

    pub llm_provider: LlmProvider,
    pub llm_api_key: String,
    pub llm_embedding_model: String,
    pub llm_chat_model: String,

    pub content_api_url: Url,
    pub content_api_token: String,
    pub content_api_timeout: Duration,
    pub content_api_max_retries: u32,
    pub content_api_retry_backoff: Duration,

    /// Máximo de caracteres del extracto devuelto al cliente.
    pub excerpt_max_chars: usize,
}

impl AppConfig {
    /// Carga la configuración desde variables de entorno (usando .env si existe).
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Igual que `from_env`, pero leyendo los valores de `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let required = |key: &str| var(key).ok_or_else(|| anyhow!("Falta {key} en el entorno"));

        let server_addr = var("SERVER_ADDR").unwrap_or_else(|| "127.0.0.1:5000".to_string());

        let llm_provider: LlmProvider = var("LLM_PROVIDER")
            .unwrap_or_else(|| "cohere".to_string())
            .parse()?;
        let llm_api_key = required(llm_provider.api_key_var())?;
        let llm_embedding_model = var("LLM_EMBEDDING_MODEL")
            .unwrap_or_else(|| llm_provider.default_embedding_model().to_string());
        let llm_chat_model = var("LLM_CHAT_MODEL")
            .unwrap_or_else(|| llm_provider.default_chat_model().to_string());

        let raw_url = required("CONTENT_API_URL")?;
        let content_api_url = Url::parse(&raw_url)
            .with_context(|| format!("CONTENT_API_URL no es una URL válida: {raw_url}"))?;
        if !matches!(content_api_url.scheme(), "http" | "https") {
            return Err(anyhow!(
                "CONTENT_API_URL debe usar http o https: {raw_url}"
            ));
        }
        let content_api_token = required("CONTENT_API_TOKEN")?;

        let content_api_timeout =
            Duration::from_secs(parse_or(&var, "CONTENT_API_TIMEOUT_SECS", 30)?);
        let content_api_max_retries = parse_or(&var, "CONTENT_API_MAX_RETRIES", 2)?;
        let content_api_retry_backoff =
            Duration::from_millis(parse_or(&var, "CONTENT_API_RETRY_BACKOFF_MS", 250)?);
        let excerpt_max_chars = parse_or(&var, "RAG_EXCERPT_CHARS", 200)?;

        Ok(Self {
            server_addr,
            llm_provider,
            llm_api_key,
            llm_embedding_model,
            llm_chat_model,
            content_api_url,
            content_api_token,
            content_api_timeout,
            content_api_max_retries,
            content_api_retry_backoff,
            excerpt_max_chars,
        })
    }
}

fn parse_or<T, F>(var: &F, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match var(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow!("Valor inválido para {key} ('{raw}'): {e}")),
        None => Ok(default),
    }
}
