//! # HTTP Gateway
//!
//! reqwest implementation of [`FaucetGateway`] against the faucet API:
//!
//! - `GET {base}/balance/{address}` returns `{ "balance": ... }`
//! - `POST {base}/transfer` with `{ "to_address": ... }` returns
//!   `{ "deploy_id": ... }`, or `{ "details": ... }` on rejection
//! - `GET {base}/deploy/{deploy_id}` returns `{ "status": ..., "msg": ... }`
//!
//! Decoding is deliberately tolerant. The balance field arrives as a JSON
//! number or a numeric string depending on the node version, and an absent
//! field is not an error at this layer - the engine decides what absence
//! means.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use spigot_core::constants::{DEFAULT_GATEWAY_URL, DEFAULT_REQUEST_TIMEOUT_SECS};
use spigot_core::Cogs;
use spigot_engine::gateway::{DeployId, FaucetGateway, GatewayError, GatewayResult, StatusReport};

/// Settings for [`HttpGateway`].
#[derive(Clone, Debug)]
pub struct HttpGatewayConfig {
    /// Base URL of the faucet API.
    pub base_url: String,
    /// Per-request timeout.
    pub request_timeout: Duration,
}

impl Default for HttpGatewayConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_GATEWAY_URL.to_owned(),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        }
    }
}

/// Failure to construct the gateway.
#[derive(Debug, Error)]
pub enum GatewayBuildError {
    /// The configured base URL does not parse.
    #[error("invalid gateway base URL: {0}")]
    InvalidBaseUrl(String),

    /// reqwest refused the client configuration.
    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

/// reqwest-backed faucet API client.
pub struct HttpGateway {
    client: Client,
    base_url: String,
}

impl HttpGateway {
    /// Builds a client with the configured timeout. Fails on an unparseable
    /// base URL or an unbuildable client.
    pub fn new(config: HttpGatewayConfig) -> Result<Self, GatewayBuildError> {
        let base_url = config.base_url.trim_end_matches('/').to_owned();
        if reqwest::Url::parse(&base_url).is_err() {
            return Err(GatewayBuildError::InvalidBaseUrl(config.base_url));
        }

        let client = Client::builder().timeout(config.request_timeout).build()?;

        Ok(Self { client, base_url })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

#[async_trait]
impl FaucetGateway for HttpGateway {
    async fn fetch_balance(&self, address: &str) -> GatewayResult<Option<Cogs>> {
        let url = self.endpoint(&format!("balance/{address}"));
        tracing::debug!("GET {}", url);

        let response = self.client.get(url).send().await.map_err(transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(GatewayError::Transport(format!(
                "Error fetching balance: {}",
                status_text(status)
            )));
        }

        let body: BalanceBody = response.json().await.map_err(transport)?;
        Ok(body.balance.as_ref().and_then(balance_from_wire))
    }

    async fn submit_claim(&self, address: &str) -> GatewayResult<DeployId> {
        let url = self.endpoint("transfer");
        tracing::debug!("POST {}", url);

        let response = self
            .client
            .post(url)
            .json(&TransferRequest { to_address: address })
            .send()
            .await
            .map_err(transport)?;

        let status = response.status();
        // Rejections carry a `details` field in the body; read it before
        // deciding on the status line alone.
        let raw = response.bytes().await.map_err(transport)?;
        let body: TransferBody = serde_json::from_slice(&raw).unwrap_or_default();

        if let Some(details) = body.details {
            return Err(GatewayError::Rejected(format!("Error on faucet: {details}")));
        }
        if !status.is_success() {
            return Err(GatewayError::Rejected(format!(
                "Error on faucet: {}",
                status_text(status)
            )));
        }

        Ok(DeployId::new(body.deploy_id.unwrap_or_default()))
    }

    async fn fetch_status(&self, deploy_id: &DeployId) -> GatewayResult<StatusReport> {
        let url = self.endpoint(&format!("deploy/{}", deploy_id.as_str()));
        tracing::debug!("GET {}", url);

        let response = self.client.get(url).send().await.map_err(transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(GatewayError::Transport(format!(
                "Error on check deploy_id: {}",
                status_text(status)
            )));
        }

        let body: DeployBody = response.json().await.map_err(transport)?;
        Ok(StatusReport {
            status: body.status,
            message: body.msg,
        })
    }
}

fn transport(err: reqwest::Error) -> GatewayError {
    GatewayError::Transport(err.to_string())
}

/// Reason phrase of the status line, or the bare code for exotic statuses.
fn status_text(status: StatusCode) -> String {
    status
        .canonical_reason()
        .map_or_else(|| status.as_str().to_owned(), str::to_owned)
}

/// Accepts the two wire spellings of a balance. Anything else means the
/// response carried no usable balance.
fn balance_from_wire(value: &serde_json::Value) -> Option<Cogs> {
    match value {
        serde_json::Value::Number(number) => number.as_u64().map(Cogs::new),
        serde_json::Value::String(text) => text.trim().parse().ok().map(Cogs::new),
        _ => None,
    }
}

#[derive(Deserialize)]
struct BalanceBody {
    #[serde(default)]
    balance: Option<serde_json::Value>,
}

#[derive(Serialize)]
struct TransferRequest<'a> {
    to_address: &'a str,
}

#[derive(Default, Deserialize)]
struct TransferBody {
    #[serde(default)]
    deploy_id: Option<String>,
    #[serde(default)]
    details: Option<String>,
}

#[derive(Deserialize)]
struct DeployBody {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    msg: Option<String>,
}
