//! # Deploy Status Vocabulary
//!
//! Statuses a node reports for a deploy, plus the two predicates the poller
//! lives by: "is this a success terminal" and "is this a failure terminal".
//!
//! Parsing is deliberately forgiving. Known names match case-insensitively;
//! anything else is carried through verbatim as [`DeployStatus::Other`] so
//! the operator sees exactly the string the node produced. Failure detection
//! therefore works on the raw spelling too: any status ending in `Error` or
//! `_ERROR` (case-insensitive) counts as a failure, which covers both the
//! known error variants and whatever a future node version invents.

use std::fmt;

/// Status of a deploy as reported by the network.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum DeployStatus {
    /// Deploy accepted, not yet proposed into a block.
    Deploying,
    /// Proposed, awaiting finalization.
    Finalizing,
    /// Finalized. The one success terminal.
    Finalized,
    /// Finalization failed.
    FinalizationError,
    /// The deploy itself failed.
    DeployError,
    /// The node reported no status.
    Unknown,
    /// A status string outside the known set, carried verbatim.
    Other(String),
}

impl DeployStatus {
    /// Parses a wire status string. Known names match case-insensitively;
    /// everything else lands in [`DeployStatus::Other`] unchanged.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        if raw.eq_ignore_ascii_case("deploying") {
            Self::Deploying
        } else if raw.eq_ignore_ascii_case("finalizing") {
            Self::Finalizing
        } else if raw.eq_ignore_ascii_case("finalized") {
            Self::Finalized
        } else if raw.eq_ignore_ascii_case("finalizationerror") {
            Self::FinalizationError
        } else if raw.eq_ignore_ascii_case("deployerror") {
            Self::DeployError
        } else if raw.eq_ignore_ascii_case("unknown") {
            Self::Unknown
        } else {
            Self::Other(raw.to_owned())
        }
    }

    /// Normalizes an optional wire status: absent becomes [`DeployStatus::Unknown`].
    #[must_use]
    pub fn from_report(raw: Option<&str>) -> Self {
        raw.map_or(Self::Unknown, Self::parse)
    }

    /// The canonical (or verbatim, for unknown statuses) spelling.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Deploying => "Deploying",
            Self::Finalizing => "Finalizing",
            Self::Finalized => "Finalized",
            Self::FinalizationError => "FinalizationError",
            Self::DeployError => "DeployError",
            Self::Unknown => "Unknown",
            Self::Other(raw) => raw,
        }
    }

    /// True only for [`DeployStatus::Finalized`].
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Finalized)
    }

    /// True for any error-suffixed status, known or not.
    #[must_use]
    pub fn is_failure(&self) -> bool {
        match self {
            Self::FinalizationError | Self::DeployError => true,
            Self::Other(raw) => has_error_suffix(raw),
            _ => false,
        }
    }

    /// Success or failure; polling stops here. `Unknown` is not terminal.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        self.is_success() || self.is_failure()
    }
}

impl fmt::Display for DeployStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Case-insensitive suffix test covering both the `Error` and `_ERROR`
/// wire spellings.
fn has_error_suffix(raw: &str) -> bool {
    let lower = raw.to_ascii_lowercase();
    lower.ends_with("error")
}
