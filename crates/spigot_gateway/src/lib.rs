//! # SPIGOT Gateway
//!
//! reqwest client for the faucet HTTP API, implementing the engine's
//! [`spigot_engine::gateway::FaucetGateway`] seam.
//!
//! ## Design Principles
//!
//! 1. **Tolerant decoding** - wire bodies vary across node versions; absent
//!    or oddly-typed fields degrade to `None`, never to a panic
//! 2. **Verbatim rejections** - when the API says why it refused, the user
//!    sees that string, not a paraphrase
//! 3. **No retries** - the engine owns cadence and staleness; this layer
//!    makes exactly one attempt per request

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod http;

pub use http::{GatewayBuildError, HttpGateway, HttpGatewayConfig};
