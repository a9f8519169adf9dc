// src/routes.rs

use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};

use crate::{
    config::AppState,
    docs, handlers,
    middleware::{
        guards::{require_admin, require_dashboard_access, require_valid_role},
        shell::configuration_gate,
    },
    models::nav::DashboardPage,
};

pub mod paths {
    pub const HOME: &str = "/";
    pub const SIGN_IN: &str = "/signin";
    pub const SIGN_OUT: &str = "/signout";
    pub const UNAUTHORIZED: &str = "/unauthorized";
    pub const SECURITY_ALERT: &str = "/security-alert";
    pub const GYM_DETAILS: &str = "/gym-details";
    pub const LEGACY_GYM_ADDITION: &str = "/gym-addition";
    pub const ADD_GYM: &str = "/add-gym";
    pub const ADMIN: &str = "/admin";
    pub const SESSION: &str = "/api/session";
    pub const SESSION_REFRESH: &str = "/api/session/refresh";
    pub const HEALTH: &str = "/api/health";
    pub const DOCS_PREFIX: &str = "/api/docs";
    pub const OPENAPI_JSON: &str = "/api/docs/openapi.json";
}

pub fn app(app_state: AppState) -> Router {
    // Rotas públicas
    let public_routes = Router::new()
        .route(
            paths::SIGN_IN,
            get(handlers::auth::sign_in_page).post(handlers::auth::sign_in),
        )
        .route(paths::SIGN_OUT, post(handlers::auth::sign_out))
        .route(paths::SESSION, get(handlers::auth::session_status))
        .route(paths::SESSION_REFRESH, post(handlers::auth::refresh_session))
        .route(paths::UNAUTHORIZED, get(handlers::pages::unauthorized))
        .route(paths::SECURITY_ALERT, get(handlers::pages::security_alert))
        .route(paths::GYM_DETAILS, get(handlers::gyms::gym_details))
        .route(paths::LEGACY_GYM_ADDITION, get(handlers::pages::legacy_gym_addition))
        .route(paths::HEALTH, get(|| async { "OK" }))
        .route(paths::OPENAPI_JSON, get(docs::openapi_json));

    // Cadastro de academia: basta um papel válido
    let add_gym_routes = Router::new()
        .route(
            paths::ADD_GYM,
            get(handlers::gyms::add_gym_page).post(handlers::gyms::create_gym),
        )
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            require_valid_role,
        ));

    // Painel: papel válido e, para donos, academia cadastrada.
    // O fallback fica aqui para que caminhos desconhecidos passem pelo mesmo guard.
    let dashboard_routes = Router::new()
        .route(DashboardPage::Overview.path(), get(handlers::pages::overview))
        .route(DashboardPage::Today.path(), get(handlers::pages::today))
        .route(DashboardPage::Schedule.path(), get(handlers::pages::schedule))
        .route(DashboardPage::Passes.path(), get(handlers::pages::passes))
        .route(DashboardPage::Bundles.path(), get(handlers::pages::bundles))
        .route(DashboardPage::Payouts.path(), get(handlers::pages::payouts))
        .route(DashboardPage::Staff.path(), get(handlers::pages::staff))
        .route(DashboardPage::Settings.path(), get(handlers::pages::settings))
        .fallback(handlers::pages::fallback)
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            require_dashboard_access,
        ));

    let admin_routes = Router::new()
        .route(paths::ADMIN, get(handlers::admin::overview))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            require_admin,
        ));

    // Combina tudo; o portão de configuração envolve o app inteiro
    Router::new()
        .merge(public_routes)
        .merge(add_gym_routes)
        .merge(dashboard_routes)
        .merge(admin_routes)
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            configuration_gate,
        ))
        .with_state(app_state)
}

#[cfg(test)]
#[path = "routes_test.rs"]
mod tests;
