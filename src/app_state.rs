use std::sync::Arc;

use anyhow::Result;

use crate::{
    config::AppConfig,
    llm::{ChatModel, Embedder},
};

/// Estado compartido por los handlers. Todo es inmutable: cada petición
/// construye y descarta su propio índice.
#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub http: reqwest::Client,
    pub embedder: Arc<dyn Embedder>,
    pub chat: Arc<dyn ChatModel>,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        embedder: Arc<dyn Embedder>,
        chat: Arc<dyn ChatModel>,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.content_api_timeout)
            .build()?;
        Ok(Self {
            config,
            http,
            embedder,
            chat,
        })
    }
}
