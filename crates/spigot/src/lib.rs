//! # SPIGOT
//!
//! Configuration loading and wiring for the faucet client. The flow logic
//! lives in `spigot_engine`; the HTTP specifics in `spigot_gateway`. This
//! crate reads settings, builds the gateway and hands back a running flow.

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod config;

pub use config::{ConfigError, SpigotConfig};

use std::sync::Arc;

use spigot_engine::FlowHandle;
use spigot_gateway::{GatewayBuildError, HttpGateway};

/// Builds the HTTP gateway from `config` and spawns the flow worker on the
/// current tokio runtime.
pub fn build_flow(config: &SpigotConfig) -> Result<FlowHandle, GatewayBuildError> {
    let gateway = HttpGateway::new(config.gateway_config())?;
    Ok(FlowHandle::spawn(config.flow_config(), Arc::new(gateway)))
}
