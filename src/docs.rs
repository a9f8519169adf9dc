// src/docs.rs

use axum::Json;
use utoipa::OpenApi;

use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Auth ---
        handlers::auth::sign_in,
        handlers::auth::session_status,
        handlers::auth::refresh_session,

        // --- Gyms ---
        handlers::gyms::create_gym,
    ),
    components(
        schemas(
            // --- Auth ---
            models::auth::AuthUser,
            models::auth::SignInPayload,
            models::auth::SignInResponse,
            models::views::SessionStatus,

            // --- Perfil / Navegação ---
            models::profile::Profile,
            models::nav::NavItem,

            // --- Gyms ---
            models::gym::GymTier,
            models::gym::GymStatus,
            models::gym::Gym,
            models::gym::CreateGymPayload,
        )
    ),
    tags(
        (name = "Auth", description = "Login, logout e estado da sessão do painel"),
        (name = "Gyms", description = "Cadastro de academias parceiras")
    )
)]
pub struct ApiDoc;

pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
