// src/db/gym_repo.rs

use std::sync::Arc;

use uuid::Uuid;

use crate::common::error::AppError;
use crate::db::table::{Column, Table, TableApi};
use crate::models::gym::{Gym, NewGymRow};

#[derive(Clone)]
pub struct GymRepository {
    tables: Arc<dyn TableApi>,
}

impl GymRepository {
    pub fn new(tables: Arc<dyn TableApi>) -> Self {
        Self { tables }
    }

    /// No máximo uma academia por dono; nenhuma é `Ok(None)`.
    pub async fn find_by_owner(
        &self,
        owner_id: Uuid,
        access_token: &str,
    ) -> Result<Option<Gym>, AppError> {
        let row = self
            .tables
            .select_maybe_single(Table::Gyms, Column::OwnerId, &owner_id.to_string(), access_token)
            .await?;

        Ok(row.map(serde_json::from_value).transpose()?)
    }

    pub async fn create(&self, gym: &NewGymRow, access_token: &str) -> Result<Gym, AppError> {
        let inserted = self
            .tables
            .insert_returning(Table::Gyms, serde_json::to_value(gym)?, access_token)
            .await?;

        Ok(serde_json::from_value(inserted)?)
    }
}
