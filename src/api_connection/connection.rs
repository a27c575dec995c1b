use dotenv::dotenv;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::env;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ApiConnectionError {
    #[error("API key not found in environment: {0}")]
    MissingApiKey(String),

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("API error {status}: {error_body}")]
    ApiError { status: StatusCode, error_body: String },

    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),
}

/// Thin client for a PostgREST-style table API (`{base}/rest/v1/{table}`).
///
/// The service key is read from the named environment variable on every
/// request, so a missing key surfaces as [`ApiConnectionError::MissingApiKey`]
/// at call time rather than at construction.
#[derive(Debug, Clone)]
pub struct RestClient {
    base_url: String,
    api_key_env_var: String,
    client: Client,
}

impl RestClient {
    pub fn new(base_url: &str, api_key_env_var: &str) -> Self {
        dotenv().ok();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key_env_var: api_key_env_var.to_string(),
            client: Client::new(),
        }
    }

    pub fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    fn api_key(&self) -> Result<String, ApiConnectionError> {
        env::var(&self.api_key_env_var)
            .map_err(|_| ApiConnectionError::MissingApiKey(self.api_key_env_var.clone()))
    }

    /// `GET` rows of `table` filtered by PostgREST query parameters.
    pub async fn select<T: DeserializeOwned>(
        &self,
        table: &str,
        params: &[(String, String)],
    ) -> Result<Vec<T>, ApiConnectionError> {
        let api_key = self.api_key()?;
        let url = self.table_url(table);
        debug!(%url, ?params, "select");

        let response = self
            .client
            .get(&url)
            .header("apikey", &api_key)
            .bearer_auth(&api_key)
            .query(params)
            .send()
            .await?;

        Self::read_rows(response).await
    }

    /// `POST` rows into `table` and return the stored representation.
    pub async fn insert<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        table: &str,
        rows: &B,
    ) -> Result<Vec<T>, ApiConnectionError> {
        let api_key = self.api_key()?;
        let url = self.table_url(table);
        debug!(%url, "insert");

        let response = self
            .client
            .post(&url)
            .header("apikey", &api_key)
            .bearer_auth(&api_key)
            .header("Content-Type", "application/json")
            .header("Prefer", "return=representation")
            .json(rows)
            .send()
            .await?;

        Self::read_rows(response).await
    }

    /// `DELETE` the rows of `table` matched by the query parameters.
    pub async fn delete(&self, table: &str, params: &[(String, String)]) -> Result<(), ApiConnectionError> {
        let api_key = self.api_key()?;
        let url = self.table_url(table);
        debug!(%url, ?params, "delete");

        let response = self
            .client
            .delete(&url)
            .header("apikey", &api_key)
            .bearer_auth(&api_key)
            .header("Prefer", "return=minimal")
            .query(params)
            .send()
            .await?;

        if response.status().is_success() {
            Ok(())
        } else {
            let status = response.status();
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read error body".to_string());
            Err(ApiConnectionError::ApiError { status, error_body })
        }
    }

    async fn read_rows<T: DeserializeOwned>(response: reqwest::Response) -> Result<Vec<T>, ApiConnectionError> {
        if response.status().is_success() {
            let body = response.text().await?;
            Ok(serde_json::from_str(&body)?)
        } else {
            let status = response.status();
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read error body".to_string());
            Err(ApiConnectionError::ApiError { status, error_body })
        }
    }
}
