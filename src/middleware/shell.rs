// src/middleware/shell.rs

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};

use crate::{config::AppState, models::views::ConfigurationErrorView, routes::paths};

// Rotas que continuam respondendo mesmo com o backend mal configurado
fn is_public(path: &str) -> bool {
    matches!(path, paths::SIGN_IN | paths::GYM_DETAILS | paths::HEALTH) || path.starts_with(paths::DOCS_PREFIX)
}

/// Erro de configuração (ou timeout da inicialização) derruba o painel inteiro
/// numa tela única, menos nas rotas públicas.
pub async fn configuration_gate(State(app_state): State<AppState>, request: Request, next: Next) -> Response {
    if is_public(request.uri().path()) {
        return next.run(request).await;
    }

    let error = app_state.session.snapshot().error;
    match error {
        Some(message) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ConfigurationErrorView::new(message)),
        )
            .into_response(),
        None => next.run(request).await,
    }
}
