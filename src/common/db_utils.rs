// src/common/db_utils.rs

use sqlx::{PgPool, Postgres, Transaction};

use crate::common::error::AppError;
use crate::models::auth::Claims;

// ---
// Helper RLS: a "chave" para o banco de dados do backend
// ---
/// Abre uma transação e define as mesmas variáveis que a API REST do backend define
/// antes de cada consulta, para que as políticas de RLS enxerguem o usuário do token.
/// As configurações são locais à transação (`is_local = true`).
pub(crate) async fn begin_rls_transaction<'a>(
    pool: &'a PgPool,
    claims: &Claims,
) -> Result<Transaction<'a, Postgres>, AppError> {
    // 1. Inicia a transação
    let mut tx = pool.begin().await?;

    // 2. Claims completas do JWT (lidas por auth.uid() / auth.jwt())
    let claims_json = serde_json::to_string(claims)?;
    sqlx::query("SELECT set_config('request.jwt.claims', $1, true)")
        .bind(claims_json)
        .execute(&mut *tx)
        .await?;

    // 3. Papel do Postgres (normalmente 'authenticated')
    sqlx::query("SELECT set_config('role', $1, true)")
        .bind(&claims.role)
        .execute(&mut *tx)
        .await?;

    Ok(tx)
}
