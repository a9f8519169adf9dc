// src/db/pg_tables.rs

use std::sync::LazyLock;

use async_trait::async_trait;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use regex::Regex;
use serde_json::Value;
use sqlx::PgPool;

use crate::common::db_utils::begin_rls_transaction;
use crate::common::error::AppError;
use crate::db::table::{at_most_one, Column, Table, TableApi};
use crate::models::auth::Claims;

static COLUMN_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z_][a-z0-9_]*$").expect("column regex is valid"));

/// Acesso direto ao Postgres do backend (quando `DATABASE_URL` está definido).
///
/// Cada consulta roda numa transação com as claims do token do operador, então as
/// mesmas políticas de RLS da API REST continuam valendo.
#[derive(Clone)]
pub struct PgTableClient {
    pool: PgPool,
    jwt_secret: String,
}

impl PgTableClient {
    pub fn new(pool: PgPool, jwt_secret: String) -> Self {
        Self { pool, jwt_secret }
    }

    fn claims(&self, access_token: &str) -> Result<Claims, AppError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(&["authenticated"]);

        let token_data = decode::<Claims>(
            access_token,
            &DecodingKey::from_secret(self.jwt_secret.as_ref()),
            &validation,
        )
        .map_err(|_| AppError::InvalidToken)?;

        Ok(token_data.claims)
    }
}

// Converte violações do Postgres nas mesmas variantes que a API REST produz
fn map_db_error(e: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(db_err) = &e {
        if let Some(code) = db_err.code() {
            return AppError::from_backend_code(500, Some(code.as_ref()), db_err.message());
        }
    }
    e.into()
}

#[async_trait]
impl TableApi for PgTableClient {
    async fn select_maybe_single(
        &self,
        table: Table,
        column: Column,
        value: &str,
        access_token: &str,
    ) -> Result<Option<Value>, AppError> {
        let claims = self.claims(access_token)?;
        let mut tx = begin_rls_transaction(&self.pool, &claims).await?;

        // Nomes de tabela/coluna vêm de enums fechados; só o valor é parâmetro.
        let sql = format!(
            "SELECT to_jsonb(t) FROM {} AS t WHERE t.{}::text = $1 LIMIT 2",
            table.name(),
            column.name()
        );
        let rows: Vec<(Value,)> = sqlx::query_as(&sql)
            .bind(value)
            .fetch_all(&mut *tx)
            .await
            .map_err(map_db_error)?;

        tx.commit().await?;
        at_most_one(rows.into_iter().map(|(row,)| row).collect())
    }

    async fn insert_returning(
        &self,
        table: Table,
        row: Value,
        access_token: &str,
    ) -> Result<Value, AppError> {
        let Value::Object(fields) = &row else {
            return Err(anyhow::anyhow!("insert payload must be a JSON object").into());
        };

        let mut columns = Vec::with_capacity(fields.len());
        for key in fields.keys() {
            if !COLUMN_NAME.is_match(key) {
                return Err(anyhow::anyhow!("invalid column name: {key}").into());
            }
            columns.push(key.as_str());
        }
        let columns = columns.join(", ");

        let claims = self.claims(access_token)?;
        let mut tx = begin_rls_transaction(&self.pool, &claims).await?;

        // Colunas omitidas continuam recebendo o DEFAULT da tabela
        let sql = format!(
            "INSERT INTO {table} ({columns}) \
             SELECT {columns} FROM jsonb_populate_record(NULL::{table}, $1) \
             RETURNING to_jsonb({table}.*)",
            table = table.name(),
        );
        let (inserted,): (Value,) = sqlx::query_as(&sql)
            .bind(&row)
            .fetch_one(&mut *tx)
            .await
            .map_err(map_db_error)?;

        tx.commit().await?;
        Ok(inserted)
    }
}
