//! # Eligibility and Claim Controller
//!
//! One address at a time moves through the claim flow:
//!
//! - **TESTING**: balance fetch pending, or the address failed eligibility
//! - **READY_TO_CLAIM**: balance verified at or under the ceiling
//! - **IN_PROGRESS**: claim submitted, waiting on the node
//! - **COMPLETED**: claim accepted, deploy id handed off
//! - **ERROR**: balance fetch or claim failed
//!
//! The controller is pure: it never performs I/O. `set_address` and
//! `begin_claim` hand back request descriptors for a driver to execute, and
//! the outcomes come back through `apply_balance` / `apply_claim`.
//!
//! ## Staleness
//!
//! Every balance fetch is stamped with a strictly increasing sequence
//! number taken at issue time. A response is applied only if its stamp is
//! still the latest issued one, so two rapid address edits can never end
//! with the first edit's balance on screen. The claim path carries no such
//! stamp: claims are not re-entrant (only READY_TO_CLAIM may start one),
//! and a late claim completion deliberately lands regardless of what the
//! address input did in the meantime.

use std::fmt;

use spigot_core::constants::DEFAULT_BALANCE_CEILING;
use spigot_core::{Cogs, UnitScale};

use crate::gateway::{DeployId, GatewayResult};

/// Phase of the claim flow.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum FaucetPhase {
    /// Eligibility test pending or failed.
    Testing,
    /// Balance verified under the ceiling; a claim may begin.
    ReadyToClaim,
    /// Claim submitted, waiting on the node.
    InProgress,
    /// Claim accepted; a deploy id was handed off.
    Completed,
    /// Balance fetch or claim failed.
    Errored,
}

impl FaucetPhase {
    /// Wire spelling of the phase.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Testing => "ELIGIBILITY_TEST",
            Self::ReadyToClaim => "READY_TO_CLAIM",
            Self::InProgress => "IN_PROGRESS",
            Self::Completed => "COMPLETED",
            Self::Errored => "ERROR",
        }
    }
}

impl fmt::Display for FaucetPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Balance fetch the driver must execute, stamped with its sequence number.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct BalanceRequest {
    /// Staleness token. Echo it back into [`ClaimController::apply_balance`].
    pub seq: u64,
    /// Address whose balance to fetch.
    pub address: String,
}

/// Claim submission the driver must execute.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct ClaimRequest {
    /// Address claiming tokens.
    pub address: String,
}

/// Eligibility settings.
#[derive(Clone, Copy, Debug)]
pub struct ClaimConfig {
    /// Inclusive display-unit ceiling an address may hold and still claim.
    pub balance_ceiling: u64,
    /// Minor-to-display unit scale.
    pub scale: UnitScale,
}

impl Default for ClaimConfig {
    fn default() -> Self {
        Self {
            balance_ceiling: DEFAULT_BALANCE_CEILING,
            scale: UnitScale::default(),
        }
    }
}

/// Presentation view of the controller.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClaimSnapshot {
    /// Current phase.
    pub phase: FaucetPhase,
    /// Last fetched balance in display units, if any.
    pub display_balance: Option<u64>,
    /// User-facing messages. Replaced, never appended.
    pub messages: Vec<String>,
    /// True while a balance fetch is outstanding.
    pub is_fetching: bool,
}

/// The eligibility and claim state machine.
pub struct ClaimController {
    config: ClaimConfig,
    /// Tracked address; empty means none.
    address: String,
    phase: FaucetPhase,
    display_balance: Option<u64>,
    messages: Vec<String>,
    /// Latest issued balance request stamp.
    seq: u64,
    /// Stamp of the outstanding balance fetch, if one is in flight.
    awaiting: Option<u64>,
}

impl ClaimController {
    /// Creates a controller with no tracked address.
    #[must_use]
    pub fn new(config: ClaimConfig) -> Self {
        Self {
            config,
            address: String::new(),
            phase: FaucetPhase::Testing,
            display_balance: None,
            messages: Vec::new(),
            seq: 0,
            awaiting: None,
        }
    }

    /// Replaces the tracked address.
    ///
    /// Unchanged input is a no-op. An empty address resets the flow and
    /// clears the displayed balance. A new non-empty address resets the flow
    /// and returns the balance fetch to execute; the previous fetch, if any,
    /// is left to die by its stale sequence number.
    pub fn set_address(&mut self, address: &str) -> Option<BalanceRequest> {
        if address == self.address {
            return None;
        }

        self.address = address.to_owned();
        self.seq += 1;
        self.messages.clear();
        self.transition_to(FaucetPhase::Testing);

        if self.address.is_empty() {
            self.display_balance = None;
            self.awaiting = None;
            return None;
        }

        self.awaiting = Some(self.seq);
        Some(BalanceRequest {
            seq: self.seq,
            address: self.address.clone(),
        })
    }

    /// Applies a balance fetch outcome. Returns false when the response was
    /// stale and discarded.
    pub fn apply_balance(&mut self, seq: u64, result: GatewayResult<Option<Cogs>>) -> bool {
        if seq != self.seq {
            tracing::debug!(
                "Discarding stale balance response (seq {} != latest {})",
                seq,
                self.seq
            );
            return false;
        }

        self.awaiting = None;

        match result {
            Ok(Some(cogs)) => {
                let display = cogs.to_major_rounded(self.config.scale);
                self.display_balance = Some(display);

                if display <= self.config.balance_ceiling {
                    self.messages.clear();
                    self.transition_to(FaucetPhase::ReadyToClaim);
                } else {
                    self.messages = vec!["Your address is not eligible".to_owned()];
                    self.transition_to(FaucetPhase::Testing);
                }
            }
            Ok(None) => {
                self.messages =
                    vec!["Unable to acquire address balance. Please try again…".to_owned()];
                self.transition_to(FaucetPhase::Errored);
            }
            Err(err) => {
                self.messages = vec![err.to_string()];
                self.transition_to(FaucetPhase::Errored);
            }
        }

        true
    }

    /// Starts a claim. Refused (returns `None`) in every phase except
    /// READY_TO_CLAIM.
    pub fn begin_claim(&mut self) -> Option<ClaimRequest> {
        if self.phase != FaucetPhase::ReadyToClaim {
            tracing::debug!("Claim refused in phase {}", self.phase);
            return None;
        }

        self.transition_to(FaucetPhase::InProgress);
        Some(ClaimRequest {
            address: self.address.clone(),
        })
    }

    /// Applies a claim outcome. A non-empty deploy id completes the flow
    /// and is returned for hand-off to the status poller; an empty id is a
    /// failure of its own.
    pub fn apply_claim(&mut self, result: GatewayResult<DeployId>) -> Option<DeployId> {
        match result {
            Ok(id) if !id.is_empty() => {
                self.transition_to(FaucetPhase::Completed);
                Some(id)
            }
            Ok(_) => {
                self.messages =
                    vec!["Unable to acquire 'deploy_id'. Please try again...".to_owned()];
                self.transition_to(FaucetPhase::Errored);
                None
            }
            Err(err) => {
                self.messages = vec![err.to_string()];
                self.transition_to(FaucetPhase::Errored);
                None
            }
        }
    }

    /// Current phase.
    #[must_use]
    pub fn phase(&self) -> FaucetPhase {
        self.phase
    }

    /// Presentation view of the current state.
    #[must_use]
    pub fn snapshot(&self) -> ClaimSnapshot {
        ClaimSnapshot {
            phase: self.phase,
            display_balance: self.display_balance,
            messages: self.messages.clone(),
            is_fetching: self.awaiting.is_some(),
        }
    }

    fn transition_to(&mut self, next: FaucetPhase) {
        if next != self.phase {
            tracing::info!("Faucet phase transition: {} -> {}", self.phase, next);
            self.phase = next;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::GatewayError;

    const ADDRESS_A: &str = "1111aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";
    const ADDRESS_B: &str = "1111bbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb";

    fn controller() -> ClaimController {
        ClaimController::new(ClaimConfig::default())
    }

    fn cogs(major: u64) -> Option<Cogs> {
        Cogs::from_major(major, UnitScale::default())
    }

    #[test]
    fn test_initial_state() {
        let machine = controller();
        let snap = machine.snapshot();
        assert_eq!(snap.phase, FaucetPhase::Testing);
        assert_eq!(snap.display_balance, None);
        assert!(snap.messages.is_empty());
        assert!(!snap.is_fetching);
    }

    #[test]
    fn test_eligible_balance_readies_claim() {
        let mut machine = controller();
        let request = machine.set_address(ADDRESS_A).unwrap();
        assert_eq!(request.address, ADDRESS_A);
        assert!(machine.snapshot().is_fetching);

        assert!(machine.apply_balance(request.seq, Ok(Some(Cogs::new(500_000_000_000)))));

        let snap = machine.snapshot();
        assert_eq!(snap.phase, FaucetPhase::ReadyToClaim);
        assert_eq!(snap.display_balance, Some(500));
        assert!(snap.messages.is_empty());
        assert!(!snap.is_fetching);
    }

    #[test]
    fn test_balance_over_ceiling_is_not_eligible() {
        let mut machine = controller();
        let request = machine.set_address(ADDRESS_A).unwrap();
        machine.apply_balance(request.seq, Ok(cogs(2001)));

        let snap = machine.snapshot();
        assert_eq!(snap.phase, FaucetPhase::Testing);
        assert_eq!(snap.display_balance, Some(2001));
        assert_eq!(snap.messages, vec!["Your address is not eligible".to_owned()]);
        assert!(machine.begin_claim().is_none());
    }

    #[test]
    fn test_ceiling_is_inclusive() {
        let mut machine = controller();
        let request = machine.set_address(ADDRESS_A).unwrap();
        machine.apply_balance(request.seq, Ok(cogs(2000)));
        assert_eq!(machine.phase(), FaucetPhase::ReadyToClaim);
    }

    #[test]
    fn test_stale_balance_response_is_discarded() {
        let mut machine = controller();
        let first = machine.set_address(ADDRESS_A).unwrap();
        let second = machine.set_address(ADDRESS_B).unwrap();
        assert!(second.seq > first.seq);

        // First response arrives late; it must not touch state.
        assert!(!machine.apply_balance(first.seq, Ok(cogs(1))));
        assert_eq!(machine.phase(), FaucetPhase::Testing);
        assert!(machine.snapshot().is_fetching);

        assert!(machine.apply_balance(second.seq, Ok(cogs(2))));
        assert_eq!(machine.phase(), FaucetPhase::ReadyToClaim);
        assert_eq!(machine.snapshot().display_balance, Some(2));
    }

    #[test]
    fn test_empty_address_resets_flow() {
        let mut machine = controller();
        let request = machine.set_address(ADDRESS_A).unwrap();
        machine.apply_balance(request.seq, Ok(cogs(10)));

        assert!(machine.set_address("").is_none());

        let snap = machine.snapshot();
        assert_eq!(snap.phase, FaucetPhase::Testing);
        assert_eq!(snap.display_balance, None);
        assert!(snap.messages.is_empty());
        assert!(!snap.is_fetching);
        assert!(machine.begin_claim().is_none());
    }

    #[test]
    fn test_unchanged_address_is_noop() {
        let mut machine = controller();
        let request = machine.set_address(ADDRESS_A).unwrap();
        machine.apply_balance(request.seq, Ok(cogs(10)));

        assert!(machine.set_address(ADDRESS_A).is_none());
        assert_eq!(machine.phase(), FaucetPhase::ReadyToClaim);
    }

    #[test]
    fn test_balance_survives_address_change_until_next_result() {
        let mut machine = controller();
        let first = machine.set_address(ADDRESS_A).unwrap();
        machine.apply_balance(first.seq, Ok(cogs(500)));

        machine.set_address(ADDRESS_B).unwrap();
        let snap = machine.snapshot();
        assert_eq!(snap.display_balance, Some(500));
        assert!(snap.is_fetching);
        assert_eq!(snap.phase, FaucetPhase::Testing);
    }

    #[test]
    fn test_missing_balance_is_a_failure() {
        let mut machine = controller();
        let request = machine.set_address(ADDRESS_A).unwrap();
        machine.apply_balance(request.seq, Ok(None));

        let snap = machine.snapshot();
        assert_eq!(snap.phase, FaucetPhase::Errored);
        assert_eq!(
            snap.messages,
            vec!["Unable to acquire address balance. Please try again…".to_owned()]
        );
    }

    #[test]
    fn test_transport_failure_surfaces_gateway_message() {
        let mut machine = controller();
        let request = machine.set_address(ADDRESS_A).unwrap();
        machine.apply_balance(
            request.seq,
            Err(GatewayError::Transport(
                "Error fetching balance: Not Found".to_owned(),
            )),
        );

        let snap = machine.snapshot();
        assert_eq!(snap.phase, FaucetPhase::Errored);
        assert_eq!(
            snap.messages,
            vec!["Error fetching balance: Not Found".to_owned()]
        );
        assert!(machine.begin_claim().is_none());
    }

    #[test]
    fn test_claim_happy_path_hands_off_deploy_id() {
        let mut machine = controller();
        let request = machine.set_address(ADDRESS_A).unwrap();
        machine.apply_balance(request.seq, Ok(cogs(0)));

        let claim = machine.begin_claim().unwrap();
        assert_eq!(claim.address, ADDRESS_A);
        assert_eq!(machine.phase(), FaucetPhase::InProgress);

        let id = machine.apply_claim(Ok(DeployId::new("d".repeat(120)))).unwrap();
        assert_eq!(id.as_str(), "d".repeat(120));
        assert_eq!(machine.phase(), FaucetPhase::Completed);
    }

    #[test]
    fn test_empty_deploy_id_is_a_failure() {
        let mut machine = controller();
        let request = machine.set_address(ADDRESS_A).unwrap();
        machine.apply_balance(request.seq, Ok(cogs(0)));
        machine.begin_claim().unwrap();

        assert!(machine.apply_claim(Ok(DeployId::new(""))).is_none());

        let snap = machine.snapshot();
        assert_eq!(snap.phase, FaucetPhase::Errored);
        assert_eq!(
            snap.messages,
            vec!["Unable to acquire 'deploy_id'. Please try again...".to_owned()]
        );
    }

    #[test]
    fn test_rejected_claim_surfaces_gateway_message() {
        let mut machine = controller();
        let request = machine.set_address(ADDRESS_A).unwrap();
        machine.apply_balance(request.seq, Ok(cogs(0)));
        machine.begin_claim().unwrap();

        assert!(machine
            .apply_claim(Err(GatewayError::Rejected(
                "Error on faucet: insufficient funds".to_owned()
            )))
            .is_none());
        assert_eq!(machine.phase(), FaucetPhase::Errored);
        assert_eq!(
            machine.snapshot().messages,
            vec!["Error on faucet: insufficient funds".to_owned()]
        );
    }

    #[test]
    fn test_claim_refused_outside_ready_phase() {
        let mut machine = controller();
        assert!(machine.begin_claim().is_none());

        let request = machine.set_address(ADDRESS_A).unwrap();
        assert!(machine.begin_claim().is_none());

        machine.apply_balance(request.seq, Ok(cogs(0)));
        machine.begin_claim().unwrap();

        // IN_PROGRESS refuses re-entry.
        assert!(machine.begin_claim().is_none());

        machine.apply_claim(Ok(DeployId::new("d".repeat(120))));
        assert!(machine.begin_claim().is_none());
    }

    #[test]
    fn test_new_address_restarts_after_completion() {
        let mut machine = controller();
        let request = machine.set_address(ADDRESS_A).unwrap();
        machine.apply_balance(request.seq, Ok(cogs(0)));
        machine.begin_claim().unwrap();
        machine.apply_claim(Ok(DeployId::new("d".repeat(120))));
        assert_eq!(machine.phase(), FaucetPhase::Completed);

        let next = machine.set_address(ADDRESS_B).unwrap();
        assert_eq!(machine.phase(), FaucetPhase::Testing);
        machine.apply_balance(next.seq, Ok(cogs(0)));
        assert_eq!(machine.phase(), FaucetPhase::ReadyToClaim);
    }

    #[test]
    fn test_phase_spellings() {
        assert_eq!(FaucetPhase::Testing.to_string(), "ELIGIBILITY_TEST");
        assert_eq!(FaucetPhase::ReadyToClaim.to_string(), "READY_TO_CLAIM");
        assert_eq!(FaucetPhase::InProgress.to_string(), "IN_PROGRESS");
        assert_eq!(FaucetPhase::Completed.to_string(), "COMPLETED");
        assert_eq!(FaucetPhase::Errored.to_string(), "ERROR");
    }
}
