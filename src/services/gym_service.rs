// src/services/gym_service.rs

use validator::Validate;

use crate::{
    common::error::AppError,
    db::GymRepository,
    models::gym::{CreateGymPayload, Gym},
    services::session::SessionContext,
};

const SLUG_TAKEN: &str = "A gym with this slug already exists. Please choose a different slug.";
const PERMISSION_DENIED: &str = "Permission denied. Please check your account permissions.";

#[derive(Clone)]
pub struct GymService {
    gym_repo: GymRepository,
    session: SessionContext,
}

impl GymService {
    pub fn new(gym_repo: GymRepository, session: SessionContext) -> Self {
        Self { gym_repo, session }
    }

    /// Cadastra a academia do operador logado (sempre como 'pending') e
    /// atualiza o contexto para que os guards enxerguem a academia nova.
    /// O limite de uma academia por dono é garantido pelo backend.
    pub async fn register_gym(&self, payload: CreateGymPayload) -> Result<Gym, AppError> {
        // 1. Validar o formulário
        payload.validate()?;

        // 2. Quem está cadastrando
        let state = self.session.snapshot();
        let (Some(user), Some(session)) = (state.user, state.session) else {
            return Err(AppError::InvalidToken);
        };

        // 3. Normalizar e inserir
        let row = payload.into_row(user.id)?;
        let gym = self
            .gym_repo
            .create(&row, &session.access_token)
            .await
            .map_err(|e| match e {
                AppError::Conflict(_) => AppError::Conflict(SLUG_TAKEN.to_string()),
                AppError::PermissionDenied(_) => {
                    AppError::PermissionDenied(PERMISSION_DENIED.to_string())
                }
                other => other,
            })?;

        tracing::info!(gym_id = %gym.id, slug = ?gym.slug, owner_id = %user.id, "✅ gym registered, pending approval");

        // 4. Falha ao recarregar não desfaz o cadastro (refresh_gym só registra o erro)
        self.session.refresh_gym().await;

        Ok(gym)
    }
}
