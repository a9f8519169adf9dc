// src/handlers/auth.rs

use std::time::Duration;

use axum::{
    extract::State,
    response::{IntoResponse, Redirect, Response},
    Json,
};
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::guards::landing_path,
    models::{
        auth::{SignInPayload, SignInResponse},
        views::{PublicPage, SessionStatus},
    },
    routes::paths,
};

// Quanto esperar a assinatura carregar perfil e academia depois do login
const SIGN_IN_SETTLE_BOUND: Duration = Duration::from_secs(10);

const RESTRICTED_PORTAL: &str = "This portal is restricted to gym partners. Please contact support for access.";

pub async fn sign_in_page(State(app_state): State<AppState>) -> Response {
    let state = app_state.session.snapshot();
    if state.loading || state.user.is_none() {
        return Json(PublicPage::SIGN_IN).into_response();
    }
    match landing_path(&state) {
        Some(path) => Redirect::to(path).into_response(),
        None => Json(PublicPage::SIGN_IN).into_response(),
    }
}

#[utoipa::path(
    post,
    path = "/signin",
    tag = "Auth",
    request_body = SignInPayload,
    responses(
        (status = 200, description = "Login aceito; destino do painel", body = SignInResponse),
        (status = 400, description = "Formulário inválido"),
        (status = 401, description = "Credenciais inválidas"),
        (status = 403, description = "Papel sem acesso ao painel"),
        (status = 503, description = "Backend não configurado")
    )
)]
pub async fn sign_in(
    State(app_state): State<AppState>,
    Json(payload): Json<SignInPayload>,
) -> Result<Json<SignInResponse>, AppError> {
    payload.validate()?;

    let session = &app_state.session;
    if let Some(message) = session.snapshot().error {
        return Err(AppError::Configuration(message));
    }

    // 1. Backend verifica as credenciais
    let user = session.sign_in(payload.email.trim(), &payload.password).await?;

    // 2. A assinatura carrega perfil e academia
    let Some(state) = session.wait_for_identity(user.id, SIGN_IN_SETTLE_BOUND).await else {
        return Err(AppError::InternalServerError(anyhow::anyhow!(
            "profile lookup did not settle after sign-in"
        )));
    };
    if let Some(message) = state.error {
        return Err(AppError::Configuration(message));
    }

    // 3. Só parceiros entram
    match landing_path(&state) {
        Some(path) => {
            tracing::info!(user_id = %user.id, redirect = path, "✅ partner signed in");
            Ok(Json(SignInResponse {
                redirect: path.to_string(),
            }))
        }
        None => {
            tracing::warn!(
                user_id = %user.id,
                role = ?state.role().map(|r| r.to_string()),
                lookup_error = ?state.lookup_error,
                "sign-in refused, role has no dashboard access"
            );
            session.sign_out().await;
            Err(AppError::PermissionDenied(RESTRICTED_PORTAL.to_string()))
        }
    }
}

pub async fn sign_out(State(app_state): State<AppState>) -> Redirect {
    app_state.session.sign_out().await;
    Redirect::to(paths::SIGN_IN)
}

#[utoipa::path(
    get,
    path = "/api/session",
    tag = "Auth",
    responses(
        (status = 200, description = "Estado atual da sessão do painel", body = SessionStatus)
    )
)]
pub async fn session_status(State(app_state): State<AppState>) -> Json<SessionStatus> {
    let state = app_state.session.snapshot();
    Json(SessionStatus::from(&state))
}

/// Recarrega perfil e academia do usuário atual (no-op sem login).
#[utoipa::path(
    post,
    path = "/api/session/refresh",
    tag = "Auth",
    responses(
        (status = 200, description = "Estado da sessão depois de recarregar perfil e academia", body = SessionStatus)
    )
)]
pub async fn refresh_session(State(app_state): State<AppState>) -> Json<SessionStatus> {
    app_state.session.refresh_profile().await;
    let state = app_state.session.snapshot();
    Json(SessionStatus::from(&state))
}
