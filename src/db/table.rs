// src/db/table.rs

use async_trait::async_trait;
use serde_json::Value;

use crate::common::error::AppError;

// Tabelas do backend que o painel lê/escreve diretamente
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    Profiles,
    Gyms,
}

impl Table {
    pub fn name(self) -> &'static str {
        match self {
            Table::Profiles => "profiles",
            Table::Gyms => "gyms",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    Id,
    OwnerId,
}

impl Column {
    pub fn name(self) -> &'static str {
        match self {
            Column::Id => "id",
            Column::OwnerId => "owner_id",
        }
    }
}

/// API de linhas do backend. Toda chamada leva o access token do operador,
/// que é o que faz as políticas de RLS valerem.
#[async_trait]
pub trait TableApi: Send + Sync {
    /// Zero ou uma linha: ausência é `Ok(None)`, mais de uma é erro.
    async fn select_maybe_single(
        &self,
        table: Table,
        column: Column,
        value: &str,
        access_token: &str,
    ) -> Result<Option<Value>, AppError>;

    /// Exatamente uma linha: ausência é `AppError::RowNotFound`.
    async fn select_single(
        &self,
        table: Table,
        column: Column,
        value: &str,
        access_token: &str,
    ) -> Result<Value, AppError> {
        self.select_maybe_single(table, column, value, access_token)
            .await?
            .ok_or(AppError::RowNotFound)
    }

    /// Insere e devolve a linha como o banco a gravou.
    async fn insert_returning(
        &self,
        table: Table,
        row: Value,
        access_token: &str,
    ) -> Result<Value, AppError>;
}

/// Reduz o resultado de uma consulta com `LIMIT 2` à semântica "zero ou uma".
pub(crate) fn at_most_one(mut rows: Vec<Value>) -> Result<Option<Value>, AppError> {
    match rows.len() {
        0 => Ok(None),
        1 => Ok(rows.pop()),
        n => Err(AppError::from_backend_code(
            406,
            Some("PGRST116"),
            format!("expected at most one row, found {n}"),
        )),
    }
}
