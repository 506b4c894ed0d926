// Módulos de la aplicación
mod api;
mod app_state;
mod config;
mod error;
mod formatter;
mod ingest;
mod llm;
mod models;
mod rag;
mod vector_store;

#[cfg(test)]
mod test_support;

use std::sync::Arc;

use anyhow::Context;
use axum::Router;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::app_state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Cargar .env e inicializar logging
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // 2. Cargar configuración (la falta de credenciales es fatal)
    let cfg = config::AppConfig::from_env().context("Error al cargar la configuración")?;
    info!(
        "Proveedor LLM: {:?} (embeddings: {}, chat: {})",
        cfg.llm_provider, cfg.llm_embedding_model, cfg.llm_chat_model
    );
    info!("API de contenidos: {}", cfg.content_api_url);

    // 3. Inicializar gestor de LLMs; hace de embedder y de modelo de chat
    let llm_manager =
        Arc::new(llm::LlmManager::from_config(&cfg).context("Error inicializando LLM Manager")?);

    // 4. Crear estado compartido de la aplicación
    let app_state = AppState::new(cfg, llm_manager.clone(), llm_manager)
        .context("Error creando el cliente HTTP")?;

    // 5. Configurar el router de la API
    let app = Router::new()
        .merge(api::create_router(app_state.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );

    // 6. Iniciar el servidor
    let server_addr = &app_state.config.server_addr;
    let listener = tokio::net::TcpListener::bind(server_addr)
        .await
        .with_context(|| format!("No se pudo escuchar en {server_addr}"))?;
    info!("🚀 Servidor escuchando en http://{}", server_addr);

    // Apagado ordenado con Ctrl-C.
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            info!("Señal de apagado recibida, iniciando cierre del servidor.");
        })
        .await?;

    info!("✅ Servidor cerrado correctamente.");
    Ok(())
}
