// src/handlers/pages.rs

use axum::{extract::State, response::Redirect, Json};

use crate::{
    config::AppState,
    middleware::auth::CurrentIdentity,
    models::{
        nav::DashboardPage,
        views::{PageView, PublicPage},
    },
    routes::paths,
};

fn render(page: DashboardPage, identity: &CurrentIdentity) -> Json<PageView> {
    Json(PageView::new(page, identity))
}

// --- Páginas do painel (atrás do guard de acesso) ---
pub async fn overview(identity: CurrentIdentity) -> Json<PageView> {
    render(DashboardPage::Overview, &identity)
}

pub async fn today(identity: CurrentIdentity) -> Json<PageView> {
    render(DashboardPage::Today, &identity)
}

pub async fn schedule(identity: CurrentIdentity) -> Json<PageView> {
    render(DashboardPage::Schedule, &identity)
}

pub async fn passes(identity: CurrentIdentity) -> Json<PageView> {
    render(DashboardPage::Passes, &identity)
}

pub async fn bundles(identity: CurrentIdentity) -> Json<PageView> {
    render(DashboardPage::Bundles, &identity)
}

pub async fn payouts(identity: CurrentIdentity) -> Json<PageView> {
    render(DashboardPage::Payouts, &identity)
}

pub async fn staff(identity: CurrentIdentity) -> Json<PageView> {
    render(DashboardPage::Staff, &identity)
}

pub async fn settings(identity: CurrentIdentity) -> Json<PageView> {
    render(DashboardPage::Settings, &identity)
}

// Qualquer caminho desconhecido volta para a visão geral
pub async fn fallback() -> Redirect {
    Redirect::to(paths::HOME)
}

// --- Páginas públicas ---
pub async fn unauthorized() -> Json<PublicPage> {
    Json(PublicPage::UNAUTHORIZED)
}

/// Quem cai aqui é deslogado, tenha vindo do guard de admin ou não.
pub async fn security_alert(State(app_state): State<AppState>) -> Json<PublicPage> {
    if app_state.session.snapshot().user.is_some() {
        app_state.session.sign_out().await;
    }
    Json(PublicPage::SECURITY_ALERT)
}

pub async fn legacy_gym_addition() -> Redirect {
    Redirect::to(paths::ADD_GYM)
}
