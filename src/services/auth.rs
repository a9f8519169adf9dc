// src/services/auth.rs

use std::path::PathBuf;
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::StatusCode;
use serde::Deserialize;
use tokio::io::AsyncWriteExt;
use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;

use crate::{
    common::error::AppError,
    models::auth::{AuthEvent, Session, TokenResponse},
};

// Renova o token um pouco antes de expirar
const REFRESH_MARGIN_SECS: i64 = 60;
const REFRESH_RETRY: Duration = Duration::from_secs(30);
const EVENT_CAPACITY: usize = 16;

/// Contrato de credenciais/sessão do backend.
#[async_trait]
pub trait AuthApi: Send + Sync {
    async fn sign_in_with_password(&self, email: &str, password: &str)
        -> Result<Session, AppError>;

    /// Sessão guardada, renovada se necessário; `None` quando não há login.
    async fn get_session(&self) -> Result<Option<Session>, AppError>;

    async fn sign_out(&self) -> Result<(), AppError>;

    fn subscribe(&self) -> broadcast::Receiver<AuthEvent>;

    /// Para tarefas de fundo (renovação de token) no encerramento.
    fn shutdown(&self) {}
}

// ---
// Credenciais persistidas entre execuções do painel
// ---
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub async fn load(&self) -> Result<Option<Session>, AppError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => match serde_json::from_slice(&bytes) {
                Ok(session) => Ok(Some(session)),
                Err(e) => {
                    tracing::warn!(path = %self.path.display(), error = %e, "stored session is unreadable, ignoring it");
                    Ok(None)
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(io_error(e)),
        }
    }

    /// Grava com permissão 0600: o arquivo carrega o refresh token.
    pub async fn save(&self, session: &Session) -> Result<(), AppError> {
        let bytes = serde_json::to_vec(session)?;

        let mut options = tokio::fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        options.mode(0o600);

        let mut file = options.open(&self.path).await.map_err(io_error)?;
        // Arquivo criado por uma versão anterior pode estar aberto para o grupo
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            file.set_permissions(std::fs::Permissions::from_mode(0o600))
                .await
                .map_err(io_error)?;
        }
        file.write_all(&bytes).await.map_err(io_error)?;
        file.flush().await.map_err(io_error)
    }

    pub async fn clear(&self) -> Result<(), AppError> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(io_error(e)),
        }
    }
}

fn io_error(e: std::io::Error) -> AppError {
    anyhow::Error::from(e).into()
}

// Corpo de erro da API de autenticação (formatos antigo e novo)
#[derive(Debug, Default, Deserialize)]
struct AuthErrorBody {
    #[serde(default)]
    error_description: Option<String>,
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error_code: Option<String>,
}

impl AuthErrorBody {
    fn message(self) -> Option<String> {
        self.error_description.or(self.msg).or(self.message)
    }
}

// ---
// Cliente da API de autenticação (`/auth/v1`)
// ---
#[derive(Clone)]
pub struct GoTrueClient {
    inner: Arc<Inner>,
}

struct Inner {
    http: reqwest::Client,
    auth_url: String,
    anon_key: String,
    store: SessionStore,
    current: Mutex<Option<Session>>,
    events: broadcast::Sender<AuthEvent>,
    refresh_task: StdMutex<Option<JoinHandle<()>>>,
}

impl GoTrueClient {
    pub fn new(http: reqwest::Client, base_url: &str, anon_key: &str, store: SessionStore) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            inner: Arc::new(Inner {
                http,
                auth_url: format!("{}/auth/v1", base_url.trim_end_matches('/')),
                anon_key: anon_key.to_string(),
                store,
                current: Mutex::new(None),
                events,
                refresh_task: StdMutex::new(None),
            }),
        }
    }

    async fn request_token(&self, grant_type: &str, body: serde_json::Value) -> Result<Session, AppError> {
        let response = self
            .inner
            .http
            .post(format!("{}/token", self.inner.auth_url))
            .query(&[("grant_type", grant_type)])
            .header("apikey", &self.inner.anon_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            let token: TokenResponse = response.json().await?;
            return Ok(token.into_session());
        }

        let body = response.text().await.unwrap_or_default();
        let error: AuthErrorBody = serde_json::from_str(&body).unwrap_or_default();
        let code = error.error_code.clone();
        let message = error.message();

        match status {
            // Credencial ou refresh token recusado
            StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED if grant_type == "refresh_token" => {
                Err(AppError::InvalidToken)
            }
            StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED => Err(AppError::InvalidCredentials(
                message.unwrap_or_else(|| "Invalid email or password".to_string()),
            )),
            _ => Err(AppError::from_backend_code(
                status.as_u16(),
                code.as_deref(),
                message.unwrap_or(body),
            )),
        }
    }

    async fn refresh(&self, refresh_token: &str) -> Result<Session, AppError> {
        self.request_token(
            "refresh_token",
            serde_json::json!({ "refresh_token": refresh_token }),
        )
        .await
    }

    // Guarda a sessão em memória e em disco e (re)inicia a renovação automática
    async fn install(&self, session: &Session) {
        *self.inner.current.lock().await = Some(session.clone());
        if let Err(e) = self.inner.store.save(session).await {
            tracing::warn!(error = %e, "could not persist session");
        }
        self.restart_auto_refresh();
    }

    // Uma sessão instalada enquanto o disco era lido (login concorrente) é mais nova e fica
    async fn adopt(&self, session: Session) -> Session {
        {
            let mut current = self.inner.current.lock().await;
            if let Some(newer) = current.clone().filter(|c| !c.is_expired(Utc::now().timestamp())) {
                tracing::debug!("a newer session was installed during recovery, keeping it");
                return newer;
            }
            *current = Some(session.clone());
        }
        if let Err(e) = self.inner.store.save(&session).await {
            tracing::warn!(error = %e, "could not persist session");
        }
        self.restart_auto_refresh();
        session
    }

    async fn forget(&self) {
        *self.inner.current.lock().await = None;
        if let Err(e) = self.inner.store.clear().await {
            tracing::warn!(error = %e, "could not clear stored session");
        }
    }

    fn restart_auto_refresh(&self) {
        let client = self.clone();
        let handle = tokio::spawn(async move { client.auto_refresh_loop().await });
        if let Ok(mut slot) = self.inner.refresh_task.lock() {
            if let Some(previous) = slot.replace(handle) {
                previous.abort();
            }
        }
    }

    fn stop_auto_refresh(&self) {
        if let Ok(mut slot) = self.inner.refresh_task.lock() {
            if let Some(handle) = slot.take() {
                handle.abort();
            }
        }
    }

    async fn auto_refresh_loop(self) {
        loop {
            let Some(session) = self.inner.current.lock().await.clone() else {
                return;
            };

            let wait = session.seconds_until_refresh(Utc::now().timestamp(), REFRESH_MARGIN_SECS);
            tokio::time::sleep(Duration::from_secs(wait)).await;

            match self.refresh(&session.refresh_token).await {
                Ok(renewed) => {
                    *self.inner.current.lock().await = Some(renewed.clone());
                    if let Err(e) = self.inner.store.save(&renewed).await {
                        tracing::warn!(error = %e, "could not persist refreshed session");
                    }
                    tracing::debug!(user_id = %renewed.user.id, "access token refreshed");
                    let _ = self.inner.events.send(AuthEvent::TokenRefreshed(renewed));
                }
                Err(AppError::InvalidToken) => {
                    tracing::warn!(user_id = %session.user.id, "refresh token rejected, signing out");
                    self.forget().await;
                    let _ = self.inner.events.send(AuthEvent::SignedOut);
                    return;
                }
                Err(e) => {
                    tracing::warn!(error = %e, "token refresh failed, retrying");
                    tokio::time::sleep(REFRESH_RETRY).await;
                }
            }
        }
    }
}

#[async_trait]
impl AuthApi for GoTrueClient {
    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Session, AppError> {
        let session = self
            .request_token(
                "password",
                serde_json::json!({ "email": email, "password": password }),
            )
            .await?;

        self.install(&session).await;
        tracing::info!(user_id = %session.user.id, "signed in");
        let _ = self.inner.events.send(AuthEvent::SignedIn(session.clone()));
        Ok(session)
    }

    async fn get_session(&self) -> Result<Option<Session>, AppError> {
        let now = Utc::now().timestamp();

        if let Some(current) = self.inner.current.lock().await.clone() {
            if !current.is_expired(now) {
                return Ok(Some(current));
            }
        }

        let Some(stored) = self.inner.store.load().await? else {
            return Ok(None);
        };

        if stored.seconds_until_refresh(now, REFRESH_MARGIN_SECS) > 0 {
            return Ok(Some(self.adopt(stored).await));
        }

        // Sessão guardada perto de expirar: renova antes de devolver
        match self.refresh(&stored.refresh_token).await {
            Ok(renewed) => Ok(Some(self.adopt(renewed).await)),
            Err(AppError::InvalidToken) => {
                tracing::info!("stored session can no longer be refreshed");
                self.forget().await;
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    async fn sign_out(&self) -> Result<(), AppError> {
        self.stop_auto_refresh();
        let previous = self.inner.current.lock().await.take();
        self.forget().await;
        let _ = self.inner.events.send(AuthEvent::SignedOut);

        let Some(session) = previous else {
            return Ok(());
        };

        let response = self
            .inner
            .http
            .post(format!("{}/logout", self.inner.auth_url))
            .query(&[("scope", "local")])
            .header("apikey", &self.inner.anon_key)
            .bearer_auth(&session.access_token)
            .send()
            .await?;

        // Token já invalidado do lado do backend também conta como logout
        match response.status() {
            status if status.is_success() => Ok(()),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN | StatusCode::NOT_FOUND => Ok(()),
            status => Err(AppError::from_backend_code(
                status.as_u16(),
                None,
                response.text().await.unwrap_or_default(),
            )),
        }
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.inner.events.subscribe()
    }

    fn shutdown(&self) {
        self.stop_auto_refresh();
    }
}
