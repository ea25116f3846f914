//! # Faucet Engine Constants
//!
//! Default values for the faucet flow. Every one of these can be overridden
//! through configuration; these are the values the engine falls back to.

// =============================================================================
// POLLING CADENCE
// =============================================================================

/// Seconds between deploy status polls.
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 30;

/// Wall-clock ceiling on a poll session, in minutes.
///
/// Measured from the session start against a monotonic clock, not counted
/// in ticks, so a stalled runtime cannot stretch the window.
pub const DEFAULT_MAX_POLL_MINUTES: u64 = 7;

/// Seconds between countdown display updates.
pub const COUNTDOWN_TICK_SECS: u64 = 1;

// =============================================================================
// ELIGIBILITY
// =============================================================================

/// Maximum display-unit balance an address may hold and still claim.
/// The comparison is inclusive.
pub const DEFAULT_BALANCE_CEILING: u64 = 2000;

/// Power of ten between the minor unit (cogs) and the display unit.
pub const DEFAULT_UNIT_EXPONENT: u32 = 9;

// =============================================================================
// INPUT HANDLING
// =============================================================================

/// Milliseconds of keyboard silence before an input value is committed.
pub const DEFAULT_DEBOUNCE_MS: u64 = 500;

/// Required prefix of a wallet address.
pub const ADDRESS_PREFIX: &str = "1111";

/// Minimum wallet address length.
pub const ADDRESS_MIN_LEN: usize = 50;

/// Maximum wallet address length.
pub const ADDRESS_MAX_LEN: usize = 54;

/// Minimum deploy identifier length.
pub const DEPLOY_ID_MIN_LEN: usize = 100;

/// Maximum deploy identifier length.
pub const DEPLOY_ID_MAX_LEN: usize = 160;

// =============================================================================
// GATEWAY
// =============================================================================

/// Default faucet API base URL.
pub const DEFAULT_GATEWAY_URL: &str = "http://localhost:3000";

/// Default per-request timeout, in seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;
