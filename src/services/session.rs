//! Contexto de sessão/identidade do painel.
//!
//! Fonte única de "quem está logado e o que pode ver". É construído uma vez no
//! `AppState`, inicializado no start-up e descartado no shutdown.
//!
//! Estado publicado num `watch`: cada leitor recebe um snapshot inteiro, então
//! login/logout nunca aparecem pela metade para os guards.
//!
//! Inicialização: a recuperação da sessão guardada e o timeout disputam um
//! portão atômico (`InitGate`). Quem chega primeiro decide; o timeout só publica
//! se ganhar, e uma recuperação que chega depois do timeout (ou de um evento da
//! assinatura) é descartada. Eventos da assinatura também resolvem o portão.
//! Timeout, recuperação e assinatura compartilham um `CancellationToken`
//! cancelado em `dispose()`.

use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::{broadcast, watch};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{GymRepository, ProfileRepository},
    models::{
        auth::{AuthEvent, AuthUser, Session},
        gym::Gym,
        profile::{Profile, Role},
    },
    services::auth::AuthApi,
};

pub const DEFAULT_INIT_TIMEOUT: Duration = Duration::from_secs(10);

const TIMEOUT_MESSAGE: &str = "Authentication is taking too long. Please check your Supabase configuration and network connection.";

// ---
// Estado publicado
// ---
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SessionState {
    pub loading: bool,
    /// Erro de configuração: terminal até reiniciar o processo.
    pub error: Option<String>,
    #[serde(skip)]
    pub session: Option<Session>,
    pub user: Option<AuthUser>,
    pub profile: Option<Profile>,
    pub gym: Option<Gym>,
    /// Falha transitória na última busca de perfil/academia.
    pub lookup_error: Option<String>,
}

impl SessionState {
    fn initial() -> Self {
        SessionState {
            loading: true,
            ..SessionState::default()
        }
    }

    pub fn role(&self) -> Option<&Role> {
        self.profile.as_ref().map(|p| &p.role)
    }

    pub fn has_valid_role(&self) -> bool {
        self.role().is_some_and(Role::is_valid)
    }

    fn is_user(&self, user_id: Uuid) -> bool {
        self.user.as_ref().is_some_and(|u| u.id == user_id)
    }

    fn clear_identity(&mut self) {
        self.session = None;
        self.user = None;
        self.profile = None;
        self.gym = None;
        self.lookup_error = None;
    }
}

// Resultado de uma busca de perfil (+ academia em cascata)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IdentityLookup {
    pub profile: Option<Profile>,
    pub gym: Option<Gym>,
    pub error: Option<String>,
}

impl IdentityLookup {
    fn apply_to(self, state: &mut SessionState) {
        state.profile = self.profile;
        state.gym = self.gym;
        state.lookup_error = self.error;
    }
}

// ---
// Portão de inicialização: o primeiro a escrever vence
// ---
const GATE_PENDING: u8 = 0;
const GATE_RECOVERED: u8 = 1;
const GATE_EVENT: u8 = 2;
const GATE_TIMED_OUT: u8 = 3;

struct InitGate(AtomicU8);

impl InitGate {
    fn new() -> Self {
        InitGate(AtomicU8::new(GATE_PENDING))
    }

    /// `true` só se a recuperação chegou antes do timeout e de qualquer evento.
    fn recover(&self) -> bool {
        self.claim(GATE_RECOVERED).is_ok()
    }

    /// Eventos continuam valendo depois da recuperação; só o timeout os barra.
    fn event(&self) -> bool {
        match self.claim(GATE_EVENT) {
            Ok(_) => true,
            Err(current) => current != GATE_TIMED_OUT,
        }
    }

    /// `true` se o timeout venceu a corrida.
    fn time_out(&self) -> bool {
        self.claim(GATE_TIMED_OUT).is_ok()
    }

    fn claim(&self, winner: u8) -> Result<u8, u8> {
        self.0
            .compare_exchange(GATE_PENDING, winner, Ordering::AcqRel, Ordering::Acquire)
    }
}

#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub init_timeout: Duration,
    /// Preenchido quando o backend não está configurado.
    pub configuration_error: Option<String>,
}

impl Default for SessionOptions {
    fn default() -> Self {
        SessionOptions {
            init_timeout: DEFAULT_INIT_TIMEOUT,
            configuration_error: None,
        }
    }
}

// ---
// O contexto
// ---
#[derive(Clone)]
pub struct SessionContext {
    inner: Arc<Inner>,
}

struct Inner {
    auth: Arc<dyn AuthApi>,
    profiles: ProfileRepository,
    gyms: GymRepository,
    state: watch::Sender<SessionState>,
    gate: InitGate,
    cancel: CancellationToken,
    initialized: AtomicBool,
    options: SessionOptions,
}

impl SessionContext {
    pub fn new(
        auth: Arc<dyn AuthApi>,
        profiles: ProfileRepository,
        gyms: GymRepository,
        options: SessionOptions,
    ) -> Self {
        let (state, _) = watch::channel(SessionState::initial());
        Self {
            inner: Arc::new(Inner {
                auth,
                profiles,
                gyms,
                state,
                gate: InitGate::new(),
                cancel: CancellationToken::new(),
                initialized: AtomicBool::new(false),
                options,
            }),
        }
    }

    pub fn snapshot(&self) -> SessionState {
        self.inner.state.borrow().clone()
    }

    pub fn watch(&self) -> watch::Receiver<SessionState> {
        self.inner.state.subscribe()
    }

    pub fn has_valid_role(&self) -> bool {
        self.inner.state.borrow().has_valid_role()
    }

    // Depois do dispose nenhuma tarefa altera o estado
    fn publish(&self, update: impl FnOnce(&mut SessionState)) {
        if self.inner.cancel.is_cancelled() {
            return;
        }
        self.inner.state.send_modify(update);
    }

    /// Recupera a sessão guardada, assina as mudanças de autenticação e arma o timeout.
    pub fn initialize(&self) {
        if self.inner.initialized.swap(true, Ordering::AcqRel) {
            tracing::warn!("session context already initialized");
            return;
        }

        if let Some(message) = self.inner.options.configuration_error.clone() {
            tracing::error!("🔥 {}", message);
            self.publish(|s| {
                s.error = Some(message);
                s.loading = false;
            });
            return;
        }

        // Assina antes de recuperar: nenhum evento emitido durante a recuperação se perde
        let events = self.inner.auth.subscribe();
        tokio::spawn(self.clone().listen(events));
        tokio::spawn(self.clone().arm_timeout());
        tokio::spawn(self.clone().recover());
    }

    /// Cancela timeout, recuperação e assinatura.
    pub fn dispose(&self) {
        self.inner.cancel.cancel();
        self.inner.auth.shutdown();
        tracing::debug!("session context disposed");
    }

    async fn arm_timeout(self) {
        let timeout = self.inner.options.init_timeout;
        tokio::select! {
            _ = self.inner.cancel.cancelled() => {}
            _ = tokio::time::sleep(timeout) => {
                if self.inner.gate.time_out() {
                    tracing::error!(timeout_secs = timeout.as_secs(), "auth initialization timeout");
                    self.publish(|s| {
                        s.error = Some(TIMEOUT_MESSAGE.to_string());
                        s.loading = false;
                    });
                }
            }
        }
    }

    async fn recover(self) {
        let cancel = self.inner.cancel.clone();
        tokio::select! {
            _ = cancel.cancelled() => {}
            _ = self.recover_session() => {}
        }
    }

    async fn recover_session(&self) {
        let result = self.inner.auth.get_session().await;

        if !self.inner.gate.recover() {
            tracing::warn!("session recovery finished after the timeout or a newer auth event, discarding it");
            return;
        }

        match result {
            Ok(session) => {
                tracing::info!(signed_in = session.is_some(), "session recovered");
                self.apply_session(session).await;
            }
            Err(e) => {
                tracing::error!(error = %e, "error getting session");
                self.publish(|s| {
                    s.error = Some(format!("Failed to initialize authentication: {e}"));
                    s.loading = false;
                });
            }
        }
    }

    async fn listen(self, mut events: broadcast::Receiver<AuthEvent>) {
        let cancel = self.inner.cancel.clone();
        loop {
            let received = tokio::select! {
                _ = cancel.cancelled() => return,
                received = events.recv() => received,
            };

            match received {
                Ok(event) => {
                    if !self.inner.gate.event() {
                        tracing::debug!(event = event.name(), "ignoring auth event after initialization timeout");
                        continue;
                    }
                    tracing::debug!(event = event.name(), "auth state changed");
                    tokio::select! {
                        _ = cancel.cancelled() => return,
                        _ = self.apply_session(event.into_session()) => {}
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "auth event subscription lagged");
                }
                Err(broadcast::error::RecvError::Closed) => return,
            }
        }
    }

    // Publica sessão/usuário e, depois, perfil/academia num único passo.
    async fn apply_session(&self, session: Option<Session>) {
        let Some(session) = session else {
            self.publish(|s| {
                s.clear_identity();
                s.loading = false;
            });
            return;
        };

        let user_id = session.user.id;
        self.publish(|s| {
            // Renovação de token do mesmo usuário não volta a "carregando"
            let already_settled = !s.loading && s.is_user(user_id);
            if !already_settled {
                s.profile = None;
                s.gym = None;
                s.loading = true;
            }
            s.user = Some(session.user.clone());
            s.session = Some(session);
        });

        let lookup = self.fetch_profile(user_id).await;
        self.publish(|s| {
            // Um logout (ou outro login) no meio do caminho vence esta busca
            if s.is_user(user_id) {
                lookup.apply_to(s);
                s.loading = false;
            }
        });
    }

    fn access_token(&self) -> Option<String> {
        self.inner
            .state
            .borrow()
            .session
            .as_ref()
            .map(|s| s.access_token.clone())
    }

    /// Busca o perfil; papel válido busca a academia em cascata.
    pub async fn fetch_profile(&self, user_id: Uuid) -> IdentityLookup {
        let Some(token) = self.access_token() else {
            return IdentityLookup::default();
        };

        match self.inner.profiles.find_by_id(user_id, &token).await {
            Ok(None) => {
                tracing::info!(%user_id, "profile not found, user may be new");
                IdentityLookup::default()
            }
            Ok(Some(profile)) => {
                let gym = if profile.role.is_valid() {
                    self.fetch_gym(user_id).await
                } else {
                    None
                };
                IdentityLookup {
                    profile: Some(profile),
                    gym,
                    error: None,
                }
            }
            Err(e) => {
                tracing::error!(%user_id, error = %e, "error fetching profile");
                IdentityLookup {
                    profile: None,
                    gym: None,
                    error: Some(e.to_string()),
                }
            }
        }
    }

    pub async fn fetch_gym(&self, owner_id: Uuid) -> Option<Gym> {
        let token = self.access_token()?;
        match self.inner.gyms.find_by_owner(owner_id, &token).await {
            Ok(gym) => gym,
            Err(e) => {
                tracing::error!(%owner_id, error = %e, "error fetching gym");
                None
            }
        }
    }

    pub async fn refresh_profile(&self) {
        let Some(user) = self.snapshot().user else {
            return;
        };
        let lookup = self.fetch_profile(user.id).await;
        self.publish(|s| {
            if s.is_user(user.id) {
                lookup.apply_to(s);
            }
        });
    }

    pub async fn refresh_gym(&self) {
        let Some(user) = self.snapshot().user else {
            return;
        };
        let gym = self.fetch_gym(user.id).await;
        self.publish(|s| {
            if s.is_user(user.id) {
                s.gym = gym;
            }
        });
    }

    /// Delega a verificação ao backend. Quem popula sessão e perfil é a assinatura.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<AuthUser, AppError> {
        let session = self.inner.auth.sign_in_with_password(email, password).await?;
        Ok(session.user)
    }

    /// Limpa sessão, usuário, perfil e academia antes de falar com o backend.
    pub async fn sign_out(&self) {
        self.publish(|s| {
            s.clear_identity();
            s.loading = false;
        });

        if let Err(e) = self.inner.auth.sign_out().await {
            tracing::warn!(error = %e, "backend sign-out failed, local session already cleared");
        }
    }

    /// Espera a assinatura terminar de carregar o perfil de `user_id`.
    pub async fn wait_for_identity(&self, user_id: Uuid, bound: Duration) -> Option<SessionState> {
        let mut rx = self.watch();
        let settled = tokio::time::timeout(
            bound,
            rx.wait_for(|s| s.error.is_some() || (!s.loading && s.is_user(user_id))),
        )
        .await;

        match settled {
            Ok(Ok(state)) => Some(state.clone()),
            _ => None,
        }
    }
}

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;
