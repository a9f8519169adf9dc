//src/main.rs

use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

mod common;
mod config;
mod db;
mod docs;
mod handlers;
mod middleware;
mod models;
mod routes;
mod services;

#[cfg(test)]
mod testing;

use crate::config::{AppState, Settings};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logger: RUST_LOG manda, com um padrão razoável
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .compact()
        .init();

    let settings = Settings::from_env();
    let bind_addr = settings.bind_addr.clone();

    // Backend ausente não impede o start-up: o painel mostra a tela de configuração
    let app_state = AppState::new(settings).await?;

    // Contexto de sessão: recupera a sessão guardada e assina as mudanças
    app_state.session.initialize();

    let app = routes::app(app_state.clone());

    // Inicia o servidor
    let listener = TcpListener::bind(&bind_addr).await?;
    let local_addr = listener.local_addr()?;
    tracing::info!("🚀 Servidor escutando em {}", local_addr);
    if !local_addr.ip().is_loopback() {
        tracing::warn!(%local_addr, "⚠️ painel exposto fora do loopback: qualquer cliente age como o operador logado");
    }

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    app_state.session.dispose();
    tracing::info!("👋 Servidor encerrado");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
