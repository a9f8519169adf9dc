// src/handlers/gyms.rs

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::auth::CurrentIdentity,
    models::{
        gym::{CreateGymPayload, Gym},
        nav::DashboardPage,
        views::{PageView, PublicPage},
    },
};

pub async fn add_gym_page(identity: CurrentIdentity) -> Json<PageView> {
    Json(PageView::new(DashboardPage::AddGym, &identity))
}

#[utoipa::path(
    post,
    path = "/add-gym",
    tag = "Gyms",
    request_body = CreateGymPayload,
    responses(
        (status = 201, description = "Academia cadastrada, aguardando aprovação", body = Gym),
        (status = 400, description = "Formulário inválido"),
        (status = 403, description = "Sem permissão para cadastrar"),
        (status = 409, description = "Slug já utilizado")
    )
)]
pub async fn create_gym(
    State(app_state): State<AppState>,
    _identity: CurrentIdentity,
    Json(payload): Json<CreateGymPayload>,
) -> Result<impl IntoResponse, AppError> {
    let gym = app_state.gym_service.register_gym(payload).await?;
    Ok((StatusCode::CREATED, Json(gym)))
}

pub async fn gym_details() -> Json<PublicPage> {
    Json(PublicPage::GYM_DETAILS)
}
