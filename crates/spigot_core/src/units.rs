//! # Balance Units
//!
//! **CRITICAL: NO FLOATING POINT IN BALANCE CALCULATIONS**
//!
//! The chain denominates balances in an indivisible minor unit ("cogs");
//! users think in the major display unit. One display unit is `10^exponent`
//! cogs, exponent 9 unless configured otherwise.
//!
//! ## Two conversion flavors
//!
//! - `to_major_rounded` - nearest display unit, halves round up. This is what
//!   eligibility uses: it matches how balances are shown to the user.
//! - `to_major_floor` - truncation, for callers that must never overstate
//!   a balance.
//!
//! ## Why Integer Math?
//!
//! - Deterministic: same balance = same display value on all hardware
//! - A `u64` holds ~1.8e19 cogs, ample for any faucet-relevant balance
//! - Overflow is handled with checked arithmetic, never silently wrapped

use std::fmt;

use crate::constants::DEFAULT_UNIT_EXPONENT;

/// Largest exponent whose power of ten fits in a `u64`.
const MAX_UNIT_EXPONENT: u32 = 19;

// =============================================================================
// UnitScale - minor unit to display unit ratio
// =============================================================================

/// Ratio between the minor unit and the display unit, as a power of ten.
///
/// Construction is checked: exponents above 19 would overflow the `u64`
/// multiplier and are rejected.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct UnitScale {
    exponent: u32,
}

impl UnitScale {
    /// Creates a scale of `10^exponent` cogs per display unit.
    ///
    /// Returns `None` when the exponent exceeds 19.
    #[inline]
    #[must_use]
    pub const fn new(exponent: u32) -> Option<Self> {
        if exponent > MAX_UNIT_EXPONENT {
            None
        } else {
            Some(Self { exponent })
        }
    }

    /// The configured exponent.
    #[inline]
    #[must_use]
    pub const fn exponent(self) -> u32 {
        self.exponent
    }

    /// Cogs per display unit.
    #[inline]
    #[must_use]
    pub const fn multiplier(self) -> u64 {
        10u64.pow(self.exponent)
    }
}

impl Default for UnitScale {
    fn default() -> Self {
        Self {
            exponent: DEFAULT_UNIT_EXPONENT,
        }
    }
}

impl fmt::Display for UnitScale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "10^{}", self.exponent)
    }
}

// =============================================================================
// Cogs - raw minor-unit balance
// =============================================================================

/// Balance in the minor unit, exactly as reported by the chain.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Debug)]
#[repr(transparent)]
pub struct Cogs(u64);

impl Cogs {
    /// Zero balance.
    pub const ZERO: Self = Self(0);

    /// Wraps a raw cog count.
    #[inline]
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// The raw cog count.
    #[inline]
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }

    /// Converts to display units, rounding to nearest with halves up.
    #[inline]
    #[must_use]
    pub const fn to_major_rounded(self, scale: UnitScale) -> u64 {
        let multiplier = scale.multiplier();
        if multiplier == 1 {
            return self.0;
        }
        let quotient = self.0 / multiplier;
        let remainder = self.0 % multiplier;
        // multiplier >= 10 here, so quotient + 1 cannot overflow
        if remainder >= multiplier.div_ceil(2) {
            quotient + 1
        } else {
            quotient
        }
    }

    /// Converts to display units, truncating.
    #[inline]
    #[must_use]
    pub const fn to_major_floor(self, scale: UnitScale) -> u64 {
        self.0 / scale.multiplier()
    }

    /// Converts a display-unit amount back to cogs.
    ///
    /// Returns `None` on overflow.
    #[inline]
    #[must_use]
    pub const fn from_major(major: u64, scale: UnitScale) -> Option<Self> {
        match major.checked_mul(scale.multiplier()) {
            Some(raw) => Some(Self(raw)),
            None => None,
        }
    }
}

impl fmt::Display for Cogs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
