// src/db/postgrest.rs

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response};
use serde::Deserialize;
use serde_json::Value;

use crate::common::error::AppError;
use crate::db::table::{at_most_one, Column, Table, TableApi};

// Corpo de erro padrão da API REST do backend
#[derive(Debug, Default, Deserialize)]
struct RestError {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    details: Option<String>,
}

/// Cliente da API REST de tabelas (`/rest/v1`).
#[derive(Clone)]
pub struct PostgrestClient {
    http: reqwest::Client,
    rest_url: String,
    anon_key: String,
}

impl PostgrestClient {
    pub fn new(http: reqwest::Client, base_url: &str, anon_key: &str) -> Self {
        Self {
            http,
            rest_url: format!("{}/rest/v1", base_url.trim_end_matches('/')),
            anon_key: anon_key.to_string(),
        }
    }

    fn request(&self, method: Method, table: Table, access_token: &str) -> RequestBuilder {
        self.http
            .request(method, format!("{}/{}", self.rest_url, table.name()))
            .header("apikey", &self.anon_key)
            .bearer_auth(access_token)
    }

    async fn rows(response: Response) -> Result<Vec<Value>, AppError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let error: RestError = serde_json::from_str(&body).unwrap_or_default();
            let message = error
                .message
                .or(error.details)
                .unwrap_or_else(|| format!("request failed: {body}"));
            return Err(AppError::from_backend_code(
                status.as_u16(),
                error.code.as_deref(),
                message,
            ));
        }
        Ok(response.json::<Vec<Value>>().await?)
    }
}

#[async_trait]
impl TableApi for PostgrestClient {
    async fn select_maybe_single(
        &self,
        table: Table,
        column: Column,
        value: &str,
        access_token: &str,
    ) -> Result<Option<Value>, AppError> {
        let filter = format!("eq.{value}");
        let response = self
            .request(Method::GET, table, access_token)
            .query(&[("select", "*"), (column.name(), filter.as_str()), ("limit", "2")])
            .send()
            .await?;

        at_most_one(Self::rows(response).await?)
    }

    async fn insert_returning(
        &self,
        table: Table,
        row: Value,
        access_token: &str,
    ) -> Result<Value, AppError> {
        let response = self
            .request(Method::POST, table, access_token)
            .header("Prefer", "return=representation")
            .json(&row)
            .send()
            .await?;

        at_most_one(Self::rows(response).await?)?.ok_or(AppError::RowNotFound)
    }
}
