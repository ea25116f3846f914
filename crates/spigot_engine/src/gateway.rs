//! # Gateway Seam
//!
//! The three faucet API calls the engine depends on, behind an object-safe
//! async trait. The engine never constructs an HTTP client; it receives a
//! [`FaucetGateway`] and hands every call's outcome back to the controllers
//! with the staleness token it was issued under.
//!
//! Error display strings are user-facing: whatever a gateway puts into
//! [`GatewayError`] ends up verbatim in the message list of the controller
//! that made the call.

use std::fmt;

use async_trait::async_trait;
use spigot_core::Cogs;
use thiserror::Error;

/// Result alias for gateway calls.
pub type GatewayResult<T> = Result<T, GatewayError>;

/// Failure of a gateway call.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum GatewayError {
    /// Network-level failure: connect, timeout, decode, non-success status
    /// without a server-provided detail.
    #[error("{0}")]
    Transport(String),

    /// The API rejected the request and said why.
    #[error("{0}")]
    Rejected(String),
}

/// Identifier the node assigns to a submitted deploy.
///
/// May be empty when the API responded without one; emptiness is a semantic
/// failure decided by the claim controller, not by the gateway.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct DeployId(String);

impl DeployId {
    /// Wraps a raw identifier string.
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// The raw identifier.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True when the API handed back no identifier at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for DeployId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Raw payload of the deploy status endpoint.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StatusReport {
    /// Status string, if the node provided one.
    pub status: Option<String>,
    /// Accompanying message, usually explaining a failure.
    pub message: Option<String>,
}

/// The faucet API surface.
///
/// Implementations are expected to be cheap to share (`Arc`) and to format
/// their error strings for end users.
#[async_trait]
pub trait FaucetGateway: Send + Sync {
    /// Fetches the cog balance of `address`.
    ///
    /// `Ok(None)` means the response was well-formed but carried no usable
    /// balance; the claim controller treats that as its own failure case.
    async fn fetch_balance(&self, address: &str) -> GatewayResult<Option<Cogs>>;

    /// Submits a claim for `address` and returns the assigned deploy id.
    async fn submit_claim(&self, address: &str) -> GatewayResult<DeployId>;

    /// Fetches the current status of `deploy_id`.
    async fn fetch_status(&self, deploy_id: &DeployId) -> GatewayResult<StatusReport>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_is_verbatim() {
        let transport = GatewayError::Transport("Error fetching balance: Not Found".to_owned());
        assert_eq!(
            transport.to_string(),
            "Error fetching balance: Not Found"
        );

        let rejected = GatewayError::Rejected("Error on faucet: out of funds".to_owned());
        assert_eq!(rejected.to_string(), "Error on faucet: out of funds");
    }

    #[test]
    fn test_deploy_id_emptiness() {
        assert!(DeployId::new("").is_empty());
        assert!(!DeployId::new("abc").is_empty());
        assert_eq!(DeployId::new("abc").as_str(), "abc");
    }
}
