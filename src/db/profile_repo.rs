// src/db/profile_repo.rs

use std::sync::Arc;

use uuid::Uuid;

use crate::common::error::AppError;
use crate::db::table::{Column, Table, TableApi};
use crate::models::profile::Profile;

// O repositório de perfis, responsável pelas leituras da tabela 'profiles'
#[derive(Clone)]
pub struct ProfileRepository {
    tables: Arc<dyn TableApi>,
}

impl ProfileRepository {
    pub fn new(tables: Arc<dyn TableApi>) -> Self {
        Self { tables }
    }

    // Perfil inexistente é um estado normal (conta nova), não um erro
    pub async fn find_by_id(
        &self,
        user_id: Uuid,
        access_token: &str,
    ) -> Result<Option<Profile>, AppError> {
        let row = self
            .tables
            .select_maybe_single(Table::Profiles, Column::Id, &user_id.to_string(), access_token)
            .await?;

        Ok(row.map(serde_json::from_value).transpose()?)
    }
}
