//! # SPIGOT Engine
//!
//! The faucet flow: eligibility testing, token claims and deploy status
//! polling, driven by a single worker task.
//!
//! ## Design Principles
//!
//! 1. **Pure state machines** - [`ClaimController`] and [`StatusPoller`]
//!    never perform I/O; they hand back request descriptors and absorb the
//!    results later
//! 2. **Staleness by token** - balance fetches carry a sequence number,
//!    status fetches a generation; a late response with the wrong stamp is
//!    discarded, never raced
//! 3. **One writer** - the flow worker is the only code that mutates either
//!    machine; everything downstream reads snapshots from a watch channel
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use spigot_engine::{FlowConfig, FlowHandle};
//!
//! let handle = FlowHandle::spawn(FlowConfig::default(), Arc::new(gateway));
//! handle.input_address("1111...");
//! let snapshot = handle.snapshot();
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod claim;
pub mod debounce;
pub mod gateway;
pub mod poller;
pub mod runtime;

pub use claim::{ClaimConfig, ClaimController, ClaimSnapshot, FaucetPhase};
pub use gateway::{DeployId, FaucetGateway, GatewayError, GatewayResult, StatusReport};
pub use poller::{PollSnapshot, PollerConfig, StatusPoller};
pub use runtime::{FlowConfig, FlowHandle, FlowSnapshot};
