//! Ingesta de artículos desde el API de contenidos y su conversión a
//! `Document`s listos para indexar.

use std::time::Duration;

use reqwest::{header::AUTHORIZATION, StatusCode};
use serde_json::Value;
use tracing::{info, warn};
use url::Url;

use crate::{
    config::AppConfig,
    error::RagError,
    formatter,
    models::{ArticleRecord, Document},
};

/// Techo de espera entre reintentos.
const MAX_BACKOFF: Duration = Duration::from_secs(5);

/// Fallo de un intento de descarga, clasificado para decidir si se reintenta.
#[derive(Debug)]
enum FetchFailure {
    Transient(String),
    Permanent(String),
}

impl std::fmt::Display for FetchFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Transient(msg) | Self::Permanent(msg) => f.write_str(msg),
        }
    }
}

/// Obtiene los artículos y los convierte en documentos (título como `source`).
pub async fn fetch_documents(
    http: &reqwest::Client,
    cfg: &AppConfig,
) -> Result<Vec<Document>, RagError> {
    let articles = fetch_articles(http, cfg).await?;
    articles.into_iter().map(article_to_document).collect()
}

pub fn article_to_document(article: ArticleRecord) -> Result<Document, RagError> {
    let source = article.title.unwrap_or_default();
    let page_content = formatter::format_body(article.body.as_ref()).map_err(|e| match e {
        RagError::Format(msg) => RagError::Format(format!("artículo '{source}': {msg}")),
        other => other,
    })?;
    Ok(Document { page_content, source })
}

/// Descarga la lista completa de artículos (una sola página), reintentando
/// los fallos transitorios con espera exponencial.
pub async fn fetch_articles(
    http: &reqwest::Client,
    cfg: &AppConfig,
) -> Result<Vec<ArticleRecord>, RagError> {
    let url = articles_url(&cfg.content_api_url);
    let mut attempt: u32 = 0;

    loop {
        match fetch_once(http, &url, &cfg.content_api_token).await {
            Ok(articles) => {
                info!("Obtenidos {} artículos de {}", articles.len(), url);
                return Ok(articles);
            }
            Err(FetchFailure::Transient(msg)) if attempt < cfg.content_api_max_retries => {
                attempt += 1;
                let delay = backoff_delay(cfg.content_api_retry_backoff, attempt);
                warn!(
                    "Fallo transitorio obteniendo artículos ({msg}); reintento {attempt}/{} en {:?}",
                    cfg.content_api_max_retries, delay
                );
                tokio::time::sleep(delay).await;
            }
            Err(failure) => return Err(RagError::Fetch(failure.to_string())),
        }
    }
}

/// `<base>/api/articles?populate=*`, respetando una posible ruta en la base.
pub fn articles_url(base: &Url) -> Url {
    let mut url = base.clone();
    {
        let path = url.path().trim_end_matches('/').to_string();
        url.set_path(&format!("{path}/api/articles"));
    }
    url.set_query(None);
    url.query_pairs_mut().append_pair("populate", "*");
    url
}

/// Espera antes del reintento `attempt` (1, 2, ...): base·2^(attempt-1), con techo.
fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
    base.saturating_mul(factor).min(MAX_BACKOFF)
}

async fn fetch_once(
    http: &reqwest::Client,
    url: &Url,
    token: &str,
) -> Result<Vec<ArticleRecord>, FetchFailure> {
    let response = http
        .get(url.clone())
        .header(AUTHORIZATION, format!("Bearer {token}"))
        .send()
        .await
        .map_err(|e| classify_send_error(url, &e))?;

    let status = response.status();
    if !status.is_success() {
        let msg = format!("el API de contenidos respondió {status}");
        return Err(if is_transient_status(status) {
            FetchFailure::Transient(msg)
        } else {
            FetchFailure::Permanent(msg)
        });
    }

    let payload: Value = response
        .json()
        .await
        .map_err(|e| FetchFailure::Permanent(format!("respuesta no es JSON válido: {e}")))?;

    parse_articles(payload).map_err(FetchFailure::Permanent)
}

/// Sólo se reintenta si no llegó a abrirse la conexión o si se agotó el
/// tiempo; una conexión cortada a medias o una petición mal construida no.
fn classify_send_error(url: &Url, e: &reqwest::Error) -> FetchFailure {
    let msg = format!("error de red contra {url}: {e}");
    if e.is_connect() || e.is_timeout() {
        FetchFailure::Transient(msg)
    } else {
        FetchFailure::Permanent(msg)
    }
}

fn is_transient_status(status: StatusCode) -> bool {
    status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS
}

/// Extrae la lista bajo la clave `data`.
fn parse_articles(mut payload: Value) -> Result<Vec<ArticleRecord>, String> {
    let data = payload
        .get_mut("data")
        .map(Value::take)
        .ok_or_else(|| "la respuesta no contiene la clave 'data'".to_string())?;

    serde_json::from_value(data).map_err(|e| format!("'data' no es una lista de artículos: {e}"))
}
