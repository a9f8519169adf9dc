// src/testing.rs
//
// Dublês em memória das APIs do backend e atalhos para montar estados.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    config::{AppState, Settings},
    db::{table::at_most_one, Column, Table, TableApi},
    models::{
        auth::{AuthEvent, AuthUser, Session},
        gym::Gym,
        profile::{Profile, Role},
    },
    services::{auth::AuthApi, session::SessionState},
};

pub const PASSWORD: &str = "correct-horse";

// ---
// Autenticação
// ---
#[derive(Debug, Clone)]
pub enum Recovery {
    Immediate,
    Delayed(Duration),
    /// Lê a sessão guardada na hora e só devolve depois da espera.
    Stale(Duration),
    Hang,
    Fail(String),
}

pub struct FakeAuth {
    accounts: Mutex<HashMap<String, AuthUser>>,
    stored: Mutex<Option<Session>>,
    recovery: Mutex<Recovery>,
    events: broadcast::Sender<AuthEvent>,
    sign_outs: AtomicUsize,
}

impl FakeAuth {
    pub fn new() -> Arc<Self> {
        let (events, _) = broadcast::channel(16);
        Arc::new(FakeAuth {
            accounts: Mutex::new(HashMap::new()),
            stored: Mutex::new(None),
            recovery: Mutex::new(Recovery::Immediate),
            events,
            sign_outs: AtomicUsize::new(0),
        })
    }

    pub fn add_account(&self, user: &AuthUser) {
        let email = user.email.clone().expect("test accounts have an email");
        self.accounts.lock().unwrap().insert(email, user.clone());
    }

    /// Sessão que `get_session` vai devolver (como se estivesse no disco).
    pub fn store_session(&self, user: &AuthUser) {
        *self.stored.lock().unwrap() = Some(session_for(user));
    }

    pub fn set_recovery(&self, recovery: Recovery) {
        *self.recovery.lock().unwrap() = recovery;
    }

    pub fn emit(&self, event: AuthEvent) {
        let _ = self.events.send(event);
    }

    pub fn sign_out_calls(&self) -> usize {
        self.sign_outs.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AuthApi for FakeAuth {
    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Session, AppError> {
        let user = self.accounts.lock().unwrap().get(email).cloned();
        let Some(user) = user.filter(|_| password == PASSWORD) else {
            return Err(AppError::InvalidCredentials("Invalid login credentials".into()));
        };

        let session = session_for(&user);
        *self.stored.lock().unwrap() = Some(session.clone());
        self.emit(AuthEvent::SignedIn(session.clone()));
        Ok(session)
    }

    async fn get_session(&self) -> Result<Option<Session>, AppError> {
        let recovery = self.recovery.lock().unwrap().clone();
        match recovery {
            Recovery::Immediate => {}
            Recovery::Delayed(delay) => tokio::time::sleep(delay).await,
            Recovery::Stale(delay) => {
                let snapshot = self.stored.lock().unwrap().clone();
                tokio::time::sleep(delay).await;
                return Ok(snapshot);
            }
            Recovery::Hang => std::future::pending::<()>().await,
            Recovery::Fail(message) => {
                return Err(AppError::Backend {
                    status: 500,
                    code: None,
                    message,
                })
            }
        }
        Ok(self.stored.lock().unwrap().clone())
    }

    async fn sign_out(&self) -> Result<(), AppError> {
        self.sign_outs.fetch_add(1, Ordering::SeqCst);
        *self.stored.lock().unwrap() = None;
        self.emit(AuthEvent::SignedOut);
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }
}

// ---
// Tabelas
// ---
#[derive(Default)]
pub struct FakeTables {
    rows: Mutex<HashMap<Table, Vec<Value>>>,
    fail_selects: AtomicBool,
}

impl FakeTables {
    pub fn new() -> Arc<Self> {
        Arc::new(FakeTables::default())
    }

    pub fn insert(&self, table: Table, row: Value) {
        self.rows.lock().unwrap().entry(table).or_default().push(row);
    }

    pub fn add_profile(&self, user: &AuthUser, role: &str) {
        self.insert(
            Table::Profiles,
            json!({ "id": user.id, "email": user.email, "role": role }),
        );
    }

    pub fn set_role(&self, user: &AuthUser, role: &str) {
        let id = user.id.to_string();
        let mut rows = self.rows.lock().unwrap();
        for row in rows.entry(Table::Profiles).or_default() {
            if row["id"].as_str() == Some(id.as_str()) {
                row["role"] = json!(role);
            }
        }
    }

    pub fn add_gym(&self, owner: &AuthUser, name: &str) {
        self.insert(Table::Gyms, gym_row(owner.id, name));
    }

    pub fn rows(&self, table: Table) -> Vec<Value> {
        self.rows.lock().unwrap().get(&table).cloned().unwrap_or_default()
    }

    pub fn fail_selects(&self, fail: bool) {
        self.fail_selects.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl TableApi for FakeTables {
    async fn select_maybe_single(
        &self,
        table: Table,
        column: Column,
        value: &str,
        _access_token: &str,
    ) -> Result<Option<Value>, AppError> {
        if self.fail_selects.load(Ordering::SeqCst) {
            return Err(AppError::Backend {
                status: 503,
                code: None,
                message: "connection refused".into(),
            });
        }

        let matching = self
            .rows(table)
            .into_iter()
            .filter(|row| row.get(column.name()).and_then(Value::as_str) == Some(value))
            .collect();
        at_most_one(matching)
    }

    async fn insert_returning(
        &self,
        table: Table,
        mut row: Value,
        _access_token: &str,
    ) -> Result<Value, AppError> {
        let slug = row.get("slug").cloned();
        let duplicate = table == Table::Gyms
            && slug.is_some()
            && self.rows(table).iter().any(|r| r.get("slug") == slug.as_ref());
        if duplicate {
            return Err(AppError::from_backend_code(
                409,
                Some("23505"),
                "duplicate key value violates unique constraint \"gyms_slug_key\"",
            ));
        }

        row["id"] = json!(Uuid::new_v4());
        self.insert(table, row.clone());
        Ok(row)
    }
}

// ---
// Atalhos
// ---
pub fn user(email: &str) -> AuthUser {
    AuthUser {
        id: Uuid::new_v4(),
        email: Some(email.to_string()),
    }
}

pub fn session_for(user: &AuthUser) -> Session {
    Session {
        access_token: format!("access-{}", user.id),
        refresh_token: format!("refresh-{}", user.id),
        expires_at: chrono::Utc::now().timestamp() + 3600,
        user: user.clone(),
    }
}

pub fn gym_row(owner_id: Uuid, name: &str) -> Value {
    json!({
        "id": Uuid::new_v4(),
        "owner_id": owner_id,
        "name": name,
        "slug": crate::models::gym::generate_slug(name),
        "status": "approved",
    })
}

pub fn settled_state() -> SessionState {
    SessionState {
        loading: false,
        ..SessionState::default()
    }
}

pub fn signed_in_state(role: Role, has_gym: bool) -> SessionState {
    let user = user("partner@example.com");
    let gym: Option<Gym> =
        has_gym.then(|| serde_json::from_value(gym_row(user.id, "Iron Pulse")).unwrap());
    SessionState {
        loading: false,
        session: Some(session_for(&user)),
        profile: Some(Profile {
            id: user.id,
            email: user.email.clone(),
            role,
            full_name: None,
        }),
        gym,
        user: Some(user),
        ..SessionState::default()
    }
}

pub fn test_settings() -> Settings {
    Settings::from_lookup(|key| match key {
        "SUPABASE_URL" => Some("https://project.supabase.co".into()),
        "SUPABASE_ANON_KEY" => Some("anon-key".into()),
        _ => None,
    })
}

pub struct Harness {
    pub auth: Arc<FakeAuth>,
    pub tables: Arc<FakeTables>,
    pub state: AppState,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_settings(test_settings())
    }

    pub fn with_settings(settings: Settings) -> Self {
        let auth = FakeAuth::new();
        let tables = FakeTables::new();
        let state = AppState::from_parts(settings, auth.clone(), tables.clone());
        Harness { auth, tables, state }
    }

    /// Espera o contexto sair de "carregando".
    pub async fn settled(&self) -> SessionState {
        let mut rx = self.state.session.watch();
        let state = tokio::time::timeout(Duration::from_secs(30), rx.wait_for(|s| !s.loading))
            .await
            .expect("session context never settled")
            .expect("session context dropped");
        state.clone()
    }
}

/// Sobe um backend HTTP descartável em `127.0.0.1:0` e devolve a URL base.
pub async fn serve_backend(router: axum::Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}
