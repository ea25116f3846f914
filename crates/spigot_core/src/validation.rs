//! # Input Validation
//!
//! Rule-driven validation for the two free-text inputs: wallet addresses
//! and deploy identifiers. Rules are plain data so the front end can render
//! hints from the same source the engine enforces.
//!
//! Empty input is a special case: invalid, but with no messages. Nothing
//! has been typed yet, so there is nothing to complain about.

use crate::constants::{
    ADDRESS_MAX_LEN, ADDRESS_MIN_LEN, ADDRESS_PREFIX, DEPLOY_ID_MAX_LEN, DEPLOY_ID_MIN_LEN,
};

/// Hint rendered into the alphabet violation message.
const ALPHABET_HINT: &str = "[0-9], [a-z], [A-Z]";

/// Validation rules for one input field. Absent bounds are not checked.
#[derive(Clone, Debug, Default)]
pub struct InputRules {
    /// Required prefix, if any.
    pub starts_with: Option<String>,
    /// Minimum length after trimming.
    pub min_len: Option<usize>,
    /// Maximum length after trimming.
    pub max_len: Option<usize>,
    /// Restrict to ASCII alphanumeric characters.
    pub alphanumeric: bool,
}

/// Outcome of validating one input value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Validation {
    /// One message per violated rule, in rule order.
    pub messages: Vec<String>,
    /// True when the trimmed input is non-empty and violates nothing.
    pub is_valid: bool,
}

impl InputRules {
    /// Rules for a wallet address: starts with `1111`, 50 to 54
    /// alphanumeric characters.
    #[must_use]
    pub fn wallet_address() -> Self {
        Self {
            starts_with: Some(ADDRESS_PREFIX.to_owned()),
            min_len: Some(ADDRESS_MIN_LEN),
            max_len: Some(ADDRESS_MAX_LEN),
            alphanumeric: true,
        }
    }

    /// Rules for a deploy identifier: 100 to 160 alphanumeric characters.
    #[must_use]
    pub fn deploy_id() -> Self {
        Self {
            starts_with: None,
            min_len: Some(DEPLOY_ID_MIN_LEN),
            max_len: Some(DEPLOY_ID_MAX_LEN),
            alphanumeric: true,
        }
    }

    /// Validates `raw` against these rules. The input is trimmed first.
    #[must_use]
    pub fn validate(&self, raw: &str) -> Validation {
        let value = raw.trim();
        if value.is_empty() {
            return Validation {
                messages: Vec::new(),
                is_valid: false,
            };
        }

        let mut messages = Vec::new();

        if let Some(prefix) = &self.starts_with {
            if !value.starts_with(prefix.as_str()) {
                messages.push(format!("Your input must start with {prefix}"));
            }
        }

        if let Some(min) = self.min_len {
            if value.len() < min {
                messages.push(format!("Length must be at least {min} chars"));
            }
        }

        if let Some(max) = self.max_len {
            if value.len() > max {
                messages.push(format!("Length must be less than {} chars", max + 1));
            }
        }

        if self.alphanumeric && !value.chars().all(|c| c.is_ascii_alphanumeric()) {
            messages.push(format!("Only {ALPHABET_HINT} symbols allowed"));
        }

        let is_valid = messages.is_empty();
        Validation { messages, is_valid }
    }
}
