// src/config.rs

use std::{path::PathBuf, sync::Arc, time::Duration};

use sqlx::postgres::PgPoolOptions;

use crate::{
    db::{GymRepository, PgTableClient, PostgrestClient, ProfileRepository, TableApi},
    services::{
        auth::{AuthApi, GoTrueClient, SessionStore},
        gym_service::GymService,
        session::{SessionContext, SessionOptions, DEFAULT_INIT_TIMEOUT},
    },
};

pub const MISSING_BACKEND_MESSAGE: &str = "Supabase is not configured. Please set SUPABASE_URL and SUPABASE_ANON_KEY in your .env file.";

/// Linhas mostradas na tela de erro de configuração.
pub const SETUP_INSTRUCTIONS: [&str; 3] = [
    "SUPABASE_URL=your_project_url",
    "SUPABASE_ANON_KEY=your_anon_key",
    "Get these values from your Supabase project: Settings -> API",
];

// O cliente é criado mesmo sem configuração; o erro aparece para o usuário
const PLACEHOLDER_URL: &str = "https://placeholder.supabase.co";
const PLACEHOLDER_KEY: &str = "placeholder-key";

/// Só loopback por padrão: quem alcança a porta age como o operador logado.
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendSettings {
    pub url: String,
    pub anon_key: String,
}

#[derive(Debug, Clone)]
pub struct Settings {
    /// `None` quando SUPABASE_URL/SUPABASE_ANON_KEY faltam.
    pub backend: Option<BackendSettings>,
    pub jwt_secret: Option<String>,
    pub database_url: Option<String>,
    pub session_file: PathBuf,
    pub bind_addr: String,
    pub auth_init_timeout: Duration,
}

impl Settings {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let backend = match (non_empty("SUPABASE_URL"), non_empty("SUPABASE_ANON_KEY")) {
            (Some(url), Some(anon_key)) => Some(BackendSettings { url, anon_key }),
            _ => None,
        };

        let auth_init_timeout = non_empty("AUTH_INIT_TIMEOUT_SECS")
            .and_then(|v| match v.parse::<u64>() {
                Ok(secs) if secs > 0 => Some(Duration::from_secs(secs)),
                _ => {
                    tracing::warn!(value = %v, "invalid AUTH_INIT_TIMEOUT_SECS, using default");
                    None
                }
            })
            .unwrap_or(DEFAULT_INIT_TIMEOUT);

        Self {
            backend,
            jwt_secret: non_empty("SUPABASE_JWT_SECRET"),
            database_url: non_empty("DATABASE_URL"),
            session_file: non_empty("SESSION_FILE")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(".partner-session.json")),
            bind_addr: non_empty("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
            auth_init_timeout,
        }
    }

    pub fn configuration_error(&self) -> Option<String> {
        self.backend
            .is_none()
            .then(|| MISSING_BACKEND_MESSAGE.to_string())
    }
}

#[derive(Clone)]
pub struct AppState {
    pub session: SessionContext,
    pub gym_service: GymService,
}

impl AppState {
    pub async fn new(settings: Settings) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()?;

        let (url, anon_key) = match &settings.backend {
            Some(backend) => (backend.url.as_str(), backend.anon_key.as_str()),
            None => {
                tracing::error!("⚠️ SUPABASE_URL and SUPABASE_ANON_KEY must be set in environment variables!");
                (PLACEHOLDER_URL, PLACEHOLDER_KEY)
            }
        };

        let auth: Arc<dyn AuthApi> = Arc::new(GoTrueClient::new(
            http.clone(),
            url,
            anon_key,
            SessionStore::new(&settings.session_file),
        ));

        // Conexão direta só faz sentido com o segredo do JWT (RLS precisa das claims verificadas)
        let tables: Arc<dyn TableApi> = match (&settings.database_url, &settings.jwt_secret) {
            (Some(database_url), Some(jwt_secret)) => {
                let pool = PgPoolOptions::new()
                    .max_connections(5)
                    .acquire_timeout(Duration::from_secs(3))
                    .connect_lazy(database_url)?;
                tracing::info!("✅ Usando conexão direta com o Postgres do backend");
                Arc::new(PgTableClient::new(pool, jwt_secret.clone()))
            }
            (Some(_), None) => {
                tracing::warn!("DATABASE_URL set without SUPABASE_JWT_SECRET, falling back to the REST API");
                Arc::new(PostgrestClient::new(http, url, anon_key))
            }
            _ => Arc::new(PostgrestClient::new(http, url, anon_key)),
        };

        Ok(Self::from_parts(settings, auth, tables))
    }

    // --- Monta o gráfico de dependências ---
    pub fn from_parts(settings: Settings, auth: Arc<dyn AuthApi>, tables: Arc<dyn TableApi>) -> Self {
        let profile_repo = ProfileRepository::new(tables.clone());
        let gym_repo = GymRepository::new(tables);

        let session = SessionContext::new(
            auth,
            profile_repo,
            gym_repo.clone(),
            SessionOptions {
                init_timeout: settings.auth_init_timeout,
                configuration_error: settings.configuration_error(),
            },
        );
        let gym_service = GymService::new(gym_repo, session.clone());

        Self {
            session,
            gym_service,
        }
    }
}
