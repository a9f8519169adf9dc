// src/middleware/guards.rs
//
// Guards de rota do painel. As decisões são funções puras sobre um snapshot do
// `SessionState`; os middlewares só traduzem a decisão para HTTP.

use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
    Json,
};
use axum_extra::headers::{HeaderMapExt, UserAgent};

use crate::{
    config::AppState,
    middleware::auth::CurrentIdentity,
    models::views::{LoadingView, PublicPage},
    routes::paths,
    services::session::SessionState,
};

// Segundos sugeridos ao cliente enquanto a sessão carrega
const LOADING_RETRY_AFTER: &str = "1";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardOutcome {
    Loading,
    RedirectSignIn,
    Unauthorized,
    /// Papel não-admin tentando entrar numa rota de admin: força logout.
    SecurityAlert,
    RedirectAddGym,
    Render,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Guard {
    Admin,
    AddGym,
    Protected,
}

impl Guard {
    pub fn evaluate(self, state: &SessionState) -> GuardOutcome {
        match self {
            Guard::Admin => admin_guard(state),
            Guard::AddGym => add_gym_guard(state),
            Guard::Protected => protected_guard(state),
        }
    }

    fn loading_message(self) -> &'static str {
        match self {
            Guard::Admin => "Verifying access...",
            Guard::AddGym | Guard::Protected => "Loading...",
        }
    }
}

pub fn admin_guard(state: &SessionState) -> GuardOutcome {
    if state.loading {
        return GuardOutcome::Loading;
    }
    if state.user.is_none() {
        return GuardOutcome::RedirectSignIn;
    }
    // Perfil ausente com a sessão já assentada não pode virar espera eterna
    let Some(role) = state.role() else {
        return GuardOutcome::Unauthorized;
    };
    if !role.is_admin() {
        return GuardOutcome::SecurityAlert;
    }
    GuardOutcome::Render
}

pub fn add_gym_guard(state: &SessionState) -> GuardOutcome {
    if state.loading {
        return GuardOutcome::Loading;
    }
    if state.user.is_none() {
        return GuardOutcome::RedirectSignIn;
    }
    if !state.has_valid_role() {
        return GuardOutcome::Unauthorized;
    }
    GuardOutcome::Render
}

pub fn protected_guard(state: &SessionState) -> GuardOutcome {
    match add_gym_guard(state) {
        GuardOutcome::Render => {
            let needs_gym = state.role().is_some_and(|r| r.requires_gym());
            if needs_gym && state.gym.is_none() {
                GuardOutcome::RedirectAddGym
            } else {
                GuardOutcome::Render
            }
        }
        other => other,
    }
}

/// Destino depois do login; `None` quando o papel não dá acesso ao painel.
pub fn landing_path(state: &SessionState) -> Option<&'static str> {
    match protected_guard(state) {
        GuardOutcome::Render => Some(paths::HOME),
        GuardOutcome::RedirectAddGym => Some(paths::ADD_GYM),
        _ => None,
    }
}

// ---
// Middlewares
// ---
pub async fn require_admin(State(app_state): State<AppState>, request: Request, next: Next) -> Response {
    enforce(Guard::Admin, app_state, request, next).await
}

pub async fn require_valid_role(State(app_state): State<AppState>, request: Request, next: Next) -> Response {
    enforce(Guard::AddGym, app_state, request, next).await
}

pub async fn require_dashboard_access(
    State(app_state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    enforce(Guard::Protected, app_state, request, next).await
}

async fn enforce(guard: Guard, app_state: AppState, mut request: Request, next: Next) -> Response {
    let state = app_state.session.snapshot();

    match guard.evaluate(&state) {
        GuardOutcome::Render => match CurrentIdentity::from_state(&state) {
            Some(identity) => {
                request.extensions_mut().insert(identity);
                next.run(request).await
            }
            None => Redirect::to(paths::UNAUTHORIZED).into_response(),
        },
        GuardOutcome::Loading => (
            StatusCode::SERVICE_UNAVAILABLE,
            [(header::RETRY_AFTER, LOADING_RETRY_AFTER)],
            Json(LoadingView {
                status: "loading",
                message: guard.loading_message(),
            }),
        )
            .into_response(),
        GuardOutcome::RedirectSignIn => Redirect::to(paths::SIGN_IN).into_response(),
        GuardOutcome::Unauthorized => Redirect::to(paths::UNAUTHORIZED).into_response(),
        GuardOutcome::RedirectAddGym => Redirect::to(paths::ADD_GYM).into_response(),
        GuardOutcome::SecurityAlert => {
            let user_agent = request
                .headers()
                .typed_get::<UserAgent>()
                .map(|ua| ua.to_string());
            tracing::warn!(
                user_id = ?state.user.as_ref().map(|u| u.id),
                role = ?state.role().map(|r| r.to_string()),
                path = %request.uri().path(),
                user_agent = ?user_agent,
                "🚨 SECURITY ALERT: non-admin user attempted to access an admin route"
            );

            app_state.session.sign_out().await;

            (StatusCode::FORBIDDEN, Json(PublicPage::SECURITY_ALERT)).into_response()
        }
    }
}
