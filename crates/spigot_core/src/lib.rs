//! # SPIGOT Core
//!
//! Domain vocabulary for the SPIGOT faucet engine.
//!
//! ## Design Principles
//!
//! 1. **Integer-only balance math** - minor units (cogs) are `u64`, conversion
//!    to the display unit is explicit and checked
//! 2. **No I/O** - this crate never touches the network or the clock
//! 3. **Wire spellings survive** - unknown deploy statuses pass through
//!    verbatim so operators see exactly what the node said
//!
//! ## Example
//!
//! ```rust,ignore
//! use spigot_core::{Cogs, UnitScale, InputRules};
//!
//! let scale = UnitScale::default();
//! let display = Cogs::new(500_000_000_000).to_major_rounded(scale);
//! assert_eq!(display, 500);
//!
//! let check = InputRules::wallet_address().validate("1111abc");
//! assert!(!check.is_valid);
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod constants;
pub mod status;
pub mod units;
pub mod validation;

pub use status::DeployStatus;
pub use units::{Cogs, UnitScale};
pub use validation::{InputRules, Validation};
