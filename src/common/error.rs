// src/common/error.rs

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// Códigos do Postgres que o backend repassa (via PostgREST ou conexão direta)
const PG_UNIQUE_VIOLATION: &str = "23505";
const PG_NOT_NULL_VIOLATION: &str = "23502";
const PG_INSUFFICIENT_PRIVILEGE: &str = "42501";

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("Credenciais inválidas: {0}")]
    InvalidCredentials(String),

    #[error("Token inválido")]
    InvalidToken,

    // Backend ausente ou mal configurado: fatal para a sessão inteira
    #[error("Configuração inválida: {0}")]
    Configuration(String),

    #[error("Nenhuma linha encontrada")]
    RowNotFound,

    #[error("Registro duplicado: {0}")]
    Conflict(String),

    #[error("Campo obrigatório ausente: {0}")]
    MissingField(String),

    #[error("Permissão negada: {0}")]
    PermissionDenied(String),

    #[error("Erro do backend ({status}): {message}")]
    Backend {
        status: u16,
        code: Option<String>,
        message: String,
    },

    #[error("Erro de banco de dados")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Erro de HTTP: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Erro de serialização: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Erro interno do servidor")]
    InternalServerError(#[from] anyhow::Error),
}

impl AppError {
    /// Converte o código de erro devolvido pelo backend na variante correspondente.
    pub fn from_backend_code(status: u16, code: Option<&str>, message: impl Into<String>) -> Self {
        let message = message.into();
        match code {
            Some(PG_UNIQUE_VIOLATION) => AppError::Conflict(message),
            Some(PG_NOT_NULL_VIOLATION) => AppError::MissingField(message),
            Some(PG_INSUFFICIENT_PRIVILEGE) => AppError::PermissionDenied(message),
            _ => AppError::Backend {
                status,
                code: code.map(str::to_owned),
                message,
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::ValidationError(errors) => {
                let mut details = std::collections::HashMap::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages: Vec<String> = field_errors
                        .iter()
                        .filter_map(|e| e.message.as_ref().map(|m| m.to_string()))
                        .collect();
                    details.insert(field.to_string(), messages);
                }
                let body = Json(json!({
                    "error": "One or more fields are invalid.",
                    "details": details,
                }));
                return (StatusCode::BAD_REQUEST, body).into_response();
            }
            AppError::InvalidCredentials(message) => (StatusCode::UNAUTHORIZED, message),
            AppError::InvalidToken => (
                StatusCode::UNAUTHORIZED,
                "You must be signed in to continue.".to_string(),
            ),
            AppError::Configuration(message) => (StatusCode::SERVICE_UNAVAILABLE, message),
            AppError::RowNotFound => (StatusCode::NOT_FOUND, "Record not found.".to_string()),
            AppError::Conflict(message) => (StatusCode::CONFLICT, message),
            AppError::MissingField(message) => (
                StatusCode::BAD_REQUEST,
                format!("Missing required field. {message}"),
            ),
            AppError::PermissionDenied(message) => (StatusCode::FORBIDDEN, message),

            // Todo o resto vira 500; o `tracing` registra o detalhe que o `thiserror` montou.
            ref e => {
                tracing::error!("Erro Interno do Servidor: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An unexpected error occurred. Please try again or contact support.".to_string(),
                )
            }
        };

        let body = Json(json!({ "error": error_message }));
        (status, body).into_response()
    }
}
