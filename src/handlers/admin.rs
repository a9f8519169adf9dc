// src/handlers/admin.rs

use axum::Json;
use serde::Serialize;

use crate::{middleware::auth::CurrentIdentity, models::nav::{self, NavItem}};

#[derive(Debug, Serialize)]
pub struct AdminOverview {
    pub page: &'static str,
    pub title: &'static str,
    pub user_email: Option<String>,
    pub role: String,
    pub navigation: Vec<NavItem>,
}

pub async fn overview(identity: CurrentIdentity) -> Json<AdminOverview> {
    let role = &identity.profile.role;
    Json(AdminOverview {
        page: "admin",
        title: "Admin",
        user_email: identity.user.email.clone(),
        role: role.to_string(),
        navigation: nav::visible_items(Some(role), identity.gym.is_some()),
    })
}
