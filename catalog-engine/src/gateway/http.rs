use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use tracing::{debug, warn};

use catalog_types::{ApiErrorBody, CatalogEntry, ProcedureDescriptor};

use super::RemoteCatalogGateway;
use crate::config::Config;
use crate::error::{FetchError, SaveError};

/// `reqwest`-backed gateway for the marketplace catalog API.
#[derive(Debug, Clone)]
pub struct HttpCatalogGateway {
    client: reqwest::Client,
    base_url: String,
    provider_id: String,
}

impl HttpCatalogGateway {
    pub fn new(
        base_url: impl Into<String>,
        provider_id: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            provider_id: provider_id.into(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, reqwest::Error> {
        Self::new(
            config.api_base_url.clone(),
            config.provider_id.clone(),
            config.request_timeout,
        )
    }

    fn catalog_url(&self) -> String {
        format!("{}/providers/{}/catalog", self.base_url, self.provider_id)
    }

    fn procedures_url(&self) -> String {
        format!("{}/procedures", self.base_url)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = describe_http_error(response).await;
            warn!(url, status = status.as_u16(), %message, "catalog fetch failed");
            return Err(FetchError::Status {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|e| FetchError::Decode(e.to_string()))
    }
}

#[async_trait]
impl RemoteCatalogGateway for HttpCatalogGateway {
    async fn fetch_catalog(&self) -> Result<Vec<CatalogEntry>, FetchError> {
        let url = self.catalog_url();
        let entries: Vec<CatalogEntry> = self.get_json(&url).await?;
        debug!(url = %url, entries = entries.len(), "fetched catalog");
        Ok(entries)
    }

    async fn fetch_master_procedures(&self) -> Result<Vec<ProcedureDescriptor>, FetchError> {
        let url = self.procedures_url();
        let procedures: Vec<ProcedureDescriptor> = self.get_json(&url).await?;
        debug!(url = %url, procedures = procedures.len(), "fetched master procedures");
        Ok(procedures)
    }

    async fn save(&self, payload: Vec<CatalogEntry>) -> Result<Vec<CatalogEntry>, SaveError> {
        let url = self.catalog_url();
        let response = self
            .client
            .put(&url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| SaveError::Transport(e.to_string()))?;

        let status = response.status();
        if is_validation_failure(status) {
            let reason = describe_http_error(response).await;
            warn!(url = %url, status = status.as_u16(), %reason, "catalog save rejected");
            return Err(SaveError::Rejected { reason, payload });
        }
        if !status.is_success() {
            let message = describe_http_error(response).await;
            return Err(SaveError::Transport(format!("HTTP {status}: {message}")));
        }

        response
            .json::<Vec<CatalogEntry>>()
            .await
            .map_err(|e| SaveError::Transport(format!("Failed to parse save response: {e}")))
    }
}

fn is_validation_failure(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::BAD_REQUEST | StatusCode::CONFLICT | StatusCode::UNPROCESSABLE_ENTITY
    )
}

async fn describe_http_error(response: reqwest::Response) -> String {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    if body.trim().is_empty() {
        return status.to_string();
    }

    if let Ok(parsed) = serde_json::from_str::<ApiErrorBody>(&body) {
        if let Some(described) = parsed.describe() {
            return described.to_string();
        }
    }

    body.trim().to_string()
}
