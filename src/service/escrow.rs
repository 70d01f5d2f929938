// service/escrow.rs
//
// Adapter for the external escrow collaborator. The collaborator is treated
// as slow and unreliable: every call carries a bounded timeout, and callers
// decide what the local state does on failure.
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

use crate::config::Config;

#[derive(Debug, Error)]
pub enum EscrowError {
    #[error("escrow call timed out")]
    Timeout,

    #[error("escrow collaborator unreachable: {0}")]
    Unavailable(String),

    #[error("escrow collaborator rejected the request: {0}")]
    Rejected(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EscrowCreated {
    pub escrow_id: String,
    pub tx_hash: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EscrowRelease {
    pub tx_hash: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EscrowStatusSnapshot {
    pub escrow_id: String,
    pub state: String,
    pub amount: f64,
    pub updated_at: Option<DateTime<Utc>>,
}

#[async_trait]
pub trait EscrowGateway: Send + Sync {
    async fn create_escrow(
        &self,
        client_ref: Uuid,
        provider_ref: Uuid,
        amount: f64,
    ) -> Result<EscrowCreated, EscrowError>;

    async fn release(&self, escrow_id: &str) -> Result<EscrowRelease, EscrowError>;

    async fn get_status(&self, escrow_id: &str) -> Result<EscrowStatusSnapshot, EscrowError>;
}

#[derive(Debug)]
pub struct HttpEscrowGateway {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl HttpEscrowGateway {
    pub fn new(config: &Config) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.escrow_timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.escrow_base_url.trim_end_matches('/').to_string(),
            api_key: config.escrow_api_key.clone(),
        })
    }

    fn transport_error(error: reqwest::Error) -> EscrowError {
        if error.is_timeout() {
            EscrowError::Timeout
        } else {
            EscrowError::Unavailable(error.to_string())
        }
    }

    async fn rejection(response: reqwest::Response) -> EscrowError {
        let status = response.status();
        let message = response
            .json::<serde_json::Value>()
            .await
            .ok()
            .and_then(|body| body["message"].as_str().map(|s| s.to_string()))
            .unwrap_or_else(|| "no error detail".to_string());

        EscrowError::Rejected(format!("{}: {}", status, message))
    }
}

#[async_trait]
impl EscrowGateway for HttpEscrowGateway {
    async fn create_escrow(
        &self,
        client_ref: Uuid,
        provider_ref: Uuid,
        amount: f64,
    ) -> Result<EscrowCreated, EscrowError> {
        let payload = serde_json::json!({
            "client_ref": client_ref,
            "provider_ref": provider_ref,
            "amount": amount,
        });

        let response = self
            .client
            .post(format!("{}/escrows", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&payload)
            .send()
            .await
            .map_err(Self::transport_error)?;

        if !response.status().is_success() {
            return Err(Self::rejection(response).await);
        }

        response
            .json::<EscrowCreated>()
            .await
            .map_err(|e| EscrowError::Unavailable(e.to_string()))
    }

    async fn release(&self, escrow_id: &str) -> Result<EscrowRelease, EscrowError> {
        let response = self
            .client
            .post(format!("{}/escrows/{}/release", self.base_url, escrow_id))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .send()
            .await
            .map_err(Self::transport_error)?;

        if !response.status().is_success() {
            return Err(Self::rejection(response).await);
        }

        response
            .json::<EscrowRelease>()
            .await
            .map_err(|e| EscrowError::Unavailable(e.to_string()))
    }

    async fn get_status(&self, escrow_id: &str) -> Result<EscrowStatusSnapshot, EscrowError> {
        let response = self
            .client
            .get(format!("{}/escrows/{}", self.base_url, escrow_id))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .send()
            .await
            .map_err(Self::transport_error)?;

        if !response.status().is_success() {
            return Err(Self::rejection(response).await);
        }

        response
            .json::<EscrowStatusSnapshot>()
            .await
            .map_err(|e| EscrowError::Unavailable(e.to_string()))
    }
}
