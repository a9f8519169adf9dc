// src/models/views.rs
//
// Modelos de visão servidos pelas rotas de página. O layout visual fica no
// cliente; aqui vai só o que cada tela precisa saber.

use serde::Serialize;
use utoipa::ToSchema;

use crate::config::SETUP_INSTRUCTIONS;
use crate::middleware::auth::CurrentIdentity;
use crate::models::nav::{self, DashboardPage, NavItem};
use crate::services::session::SessionState;

// Casca comum das páginas protegidas (barra lateral + barra superior)
#[derive(Debug, Serialize)]
pub struct DashboardLayout {
    pub gym_name: String,
    pub user_email: Option<String>,
    pub role: String,
    pub navigation: Vec<NavItem>,
}

impl DashboardLayout {
    pub fn for_identity(identity: &CurrentIdentity) -> Self {
        let gym_name = identity
            .gym
            .as_ref()
            .map(|g| g.name.clone())
            .unwrap_or_else(|| "Gym".to_string());

        DashboardLayout {
            gym_name,
            user_email: identity.user.email.clone(),
            role: identity.profile.role.to_string(),
            navigation: nav::visible_items(Some(&identity.profile.role), identity.gym.is_some()),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PageView {
    pub page: &'static str,
    pub title: &'static str,
    pub layout: DashboardLayout,
}

impl PageView {
    pub fn new(page: DashboardPage, identity: &CurrentIdentity) -> Self {
        PageView {
            page: page.slug(),
            title: page.label(),
            layout: DashboardLayout::for_identity(identity),
        }
    }
}

// Telas públicas (login, acesso negado, alerta de segurança, detalhes da academia)
#[derive(Debug, Serialize)]
pub struct PublicPage {
    pub page: &'static str,
    pub title: &'static str,
    pub message: &'static str,
}

impl PublicPage {
    pub const SIGN_IN: PublicPage = PublicPage {
        page: "signin",
        title: "Partner Portal",
        message: "Sign in to manage your gym",
    };

    pub const UNAUTHORIZED: PublicPage = PublicPage {
        page: "unauthorized",
        title: "Access Denied",
        message: "This portal is for gym partners only. If you believe this is a mistake, please contact support.",
    };

    pub const SECURITY_ALERT: PublicPage = PublicPage {
        page: "security-alert",
        title: "Security Alert",
        message: "You do not have the necessary administrative privileges to access this page. This attempt has been logged and you have been signed out.",
    };

    pub const GYM_DETAILS: PublicPage = PublicPage {
        page: "gym-details",
        title: "Gym Details",
        message: "Public gym information",
    };
}

#[derive(Debug, Serialize)]
pub struct LoadingView {
    pub status: &'static str,
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
pub struct ConfigurationErrorView {
    pub status: &'static str,
    pub title: &'static str,
    pub message: String,
    pub remediation: Vec<&'static str>,
}

impl ConfigurationErrorView {
    pub fn new(message: String) -> Self {
        ConfigurationErrorView {
            status: "error",
            title: "Configuration Error",
            message,
            remediation: SETUP_INSTRUCTIONS.to_vec(),
        }
    }
}

// Estado público da sessão (GET /api/session)
#[derive(Debug, Serialize, ToSchema)]
pub struct SessionStatus {
    pub loading: bool,
    pub error: Option<String>,
    pub authenticated: bool,
    pub email: Option<String>,
    #[schema(example = "gym_owner")]
    pub role: Option<String>,
    pub has_valid_role: bool,
    pub has_gym: bool,
    pub lookup_error: Option<String>,
}

impl From<&SessionState> for SessionStatus {
    fn from(state: &SessionState) -> Self {
        SessionStatus {
            loading: state.loading,
            error: state.error.clone(),
            authenticated: state.user.is_some(),
            email: state.user.as_ref().and_then(|u| u.email.clone()),
            role: state.role().map(|r| r.to_string()),
            has_valid_role: state.has_valid_role(),
            has_gym: state.gym.is_some(),
            lookup_error: state.lookup_error.clone(),
        }
    }
}
