// src/middleware/auth.rs

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::{
    common::error::AppError,
    models::{auth::AuthUser, gym::Gym, profile::Profile},
    services::session::SessionState,
};

/// Identidade já liberada por um guard: usuário, perfil e (talvez) academia.
///
/// Os guards inserem este valor nas extensions da requisição quando o
/// resultado é `Render`; handlers protegidos o recebem como extrator.
#[derive(Debug, Clone)]
pub struct CurrentIdentity {
    pub user: AuthUser,
    pub profile: Profile,
    pub gym: Option<Gym>,
}

impl CurrentIdentity {
    pub fn from_state(state: &SessionState) -> Option<Self> {
        Some(CurrentIdentity {
            user: state.user.clone()?,
            profile: state.profile.clone()?,
            gym: state.gym.clone(),
        })
    }
}

impl<S> FromRequestParts<S> for CurrentIdentity
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentIdentity>()
            .cloned()
            .ok_or(AppError::InvalidToken)
    }
}
