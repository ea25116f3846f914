//! # Status Poller
//!
//! Polls the network for a deploy's status until it reaches a terminal
//! state or a wall-clock ceiling expires. Like the claim controller, the
//! poller is pure: ticks and results are pushed in, poll requests come out.
//!
//! ## Sessions and generations
//!
//! Tracking a new identifier opens a fresh [`PollSession`]: elapsed-time
//! origin, countdown, in-flight flag. The poller stamps every request with
//! its current generation, bumped on every tracking change, and discards any
//! result whose stamp no longer matches - a response belonging to a replaced
//! session can never touch current state. In-flight requests are never
//! aborted; they are simply stale on arrival.
//!
//! ## Timing rules
//!
//! - The elapsed ceiling is measured from the session's start `Instant` on
//!   every tick. Ticks are not counted; a stalled driver cannot stretch the
//!   window.
//! - An overlapping tick while a request is in flight issues nothing, and is
//!   never queued. The countdown still resets, so the display stays honest.
//! - The countdown is display-only. It never fires polls and never restarts
//!   once a session stops.

use std::time::{Duration, Instant};

use spigot_core::constants::{DEFAULT_MAX_POLL_MINUTES, DEFAULT_POLL_INTERVAL_SECS};
use spigot_core::DeployStatus;

use crate::gateway::{DeployId, GatewayResult, StatusReport};

/// Display status shown when the status endpoint itself failed.
const FETCH_ERROR_STATUS: &str = "Error fetching status";

/// Poller cadence settings.
#[derive(Clone, Copy, Debug)]
pub struct PollerConfig {
    /// Interval between polls.
    pub poll_interval: Duration,
    /// Wall-clock ceiling on a session, measured from its start.
    pub max_poll: Duration,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
            max_poll: Duration::from_secs(DEFAULT_MAX_POLL_MINUTES * 60),
        }
    }
}

/// One tracked identifier's polling lifetime.
#[derive(Clone, Copy, Debug)]
struct PollSession {
    /// Elapsed-time origin.
    started_at: Instant,
    /// Seconds shown in the "next check" display.
    countdown_secs: u64,
    /// A request is outstanding; overlapping ticks are skipped.
    in_flight: bool,
    /// False once the session stopped. Stopped sessions keep their display
    /// state but accept no results and issue no requests.
    running: bool,
}

/// Poll the driver must execute, stamped with its generation.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct PollRequest {
    /// Staleness token. Echo it back into [`StatusPoller::apply_status`].
    pub generation: u64,
    /// Identifier to poll.
    pub deploy_id: DeployId,
}

/// Presentation view of the poller.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PollSnapshot {
    /// Last displayed status, surviving session stops and switches.
    pub status: Option<DeployStatus>,
    /// Seconds until the next scheduled poll.
    pub countdown_secs: u64,
    /// True while a session is running.
    pub is_polling: bool,
    /// True while a status request is in flight.
    pub is_checking: bool,
    /// User-facing messages. Replaced, never appended.
    pub messages: Vec<String>,
    /// Identifier currently tracked.
    pub tracked: Option<DeployId>,
}

/// The deploy status polling state machine.
pub struct StatusPoller {
    config: PollerConfig,
    tracked: Option<DeployId>,
    session: Option<PollSession>,
    status: Option<DeployStatus>,
    messages: Vec<String>,
    /// Bumped on every tracking change; stamps outgoing requests.
    generation: u64,
    disposed: bool,
}

impl StatusPoller {
    /// Creates a poller with nothing tracked.
    #[must_use]
    pub fn new(config: PollerConfig) -> Self {
        Self {
            config,
            tracked: None,
            session: None,
            status: None,
            messages: Vec::new(),
            generation: 0,
            disposed: false,
        }
    }

    /// Changes the tracked identifier.
    ///
    /// Empty input is a hard reset: session dropped, status and messages
    /// cleared. A new non-empty identifier replaces the session and returns
    /// the immediate first poll. Re-tracking the current identifier is a
    /// no-op, even if its session already stopped. The displayed status
    /// survives a session switch until the new session's first result.
    pub fn track(&mut self, id: &str, now: Instant) -> Option<PollRequest> {
        if self.disposed {
            return None;
        }

        if id.is_empty() {
            if self.tracked.is_some() {
                tracing::info!("Tracking cleared; poll state reset");
            }
            self.generation += 1;
            self.tracked = None;
            self.session = None;
            self.status = None;
            self.messages.clear();
            return None;
        }

        if self.tracked.as_ref().is_some_and(|t| t.as_str() == id) {
            return None;
        }

        self.generation += 1;
        self.tracked = Some(DeployId::new(id));
        self.session = Some(PollSession {
            started_at: now,
            countdown_secs: self.config.poll_interval.as_secs(),
            in_flight: false,
            running: true,
        });
        tracing::info!("Tracking deploy id ({} chars); poll session started", id.len());

        self.begin_poll()
    }

    /// Poll-interval tick. Checks the elapsed ceiling first, then issues the
    /// next request unless one is still in flight.
    pub fn on_poll_tick(&mut self, now: Instant) -> Option<PollRequest> {
        if self.disposed {
            return None;
        }

        let in_flight = {
            let session = self.session.as_mut()?;
            if !session.running {
                return None;
            }

            if now.duration_since(session.started_at) >= self.config.max_poll {
                session.running = false;
                let minutes = self.config.max_poll.as_secs() / 60;
                tracing::info!("Polling stopped: {} minute ceiling reached", minutes);
                self.messages = vec![format!("Polling stopped after {minutes} minutes.")];
                return None;
            }

            session.countdown_secs = self.config.poll_interval.as_secs();
            session.in_flight
        };

        if in_flight {
            tracing::debug!("Poll tick skipped: request already in flight");
            return None;
        }

        self.begin_poll()
    }

    /// Countdown tick, display only. Returns the current countdown value.
    pub fn on_countdown_tick(&mut self) -> u64 {
        if !self.disposed {
            if let Some(session) = self.session.as_mut() {
                if session.running {
                    session.countdown_secs = session.countdown_secs.saturating_sub(1);
                }
            }
        }
        self.countdown_secs()
    }

    /// Applies a status fetch outcome. Returns false when the response was
    /// stale (wrong generation, stopped session, or disposed poller) and
    /// was discarded.
    pub fn apply_status(&mut self, generation: u64, result: GatewayResult<StatusReport>) -> bool {
        if self.disposed {
            tracing::debug!("Discarding status response after disposal");
            return false;
        }

        if generation != self.generation {
            tracing::debug!(
                "Discarding stale status response (generation {} != current {})",
                generation,
                self.generation
            );
            return false;
        }

        let Some(session) = self.session.as_mut() else {
            return false;
        };
        // A matching generation means this is the session's outstanding
        // request; the checking indicator clears even when the result is
        // discarded below.
        session.in_flight = false;

        if !session.running {
            tracing::debug!("Discarding status response for a stopped session");
            return false;
        }

        match result {
            Ok(report) => {
                let status = DeployStatus::from_report(report.status.as_deref());

                if status.is_failure() {
                    session.running = false;
                    let stop_message = report.message.unwrap_or_else(|| {
                        "Polling stopped due to error status returned by node.".to_owned()
                    });
                    tracing::info!("Polling stopped on failure status {}", status);
                    self.messages = vec![stop_message];
                } else {
                    if status.is_success() {
                        session.running = false;
                        tracing::info!("Deploy finalized; polling stopped");
                    }
                    self.messages = report.message.map_or_else(Vec::new, |m| vec![m]);
                }

                self.status = Some(status);
            }
            Err(err) => {
                session.running = false;
                tracing::warn!("Status fetch failed: {}", err);
                self.status = Some(DeployStatus::Other(FETCH_ERROR_STATUS.to_owned()));
                self.messages = vec![
                    "Polling stopped: network or server error while fetching status.".to_owned(),
                ];
            }
        }

        true
    }

    /// Stops everything, permanently. Later calls are no-ops and later
    /// results are discarded; the last snapshot stays readable.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;
        if let Some(session) = self.session.as_mut() {
            session.running = false;
            // Nothing will apply the outstanding result; the indicator must
            // not outlive the poller.
            session.in_flight = false;
        }
        tracing::debug!("Status poller disposed");
    }

    /// True while a session is running and the poller is live.
    #[must_use]
    pub fn is_polling(&self) -> bool {
        !self.disposed && self.session.is_some_and(|s| s.running)
    }

    /// Seconds until the next scheduled poll.
    #[must_use]
    pub fn countdown_secs(&self) -> u64 {
        self.session
            .map_or(self.config.poll_interval.as_secs(), |s| s.countdown_secs)
    }

    /// Presentation view of the current state.
    #[must_use]
    pub fn snapshot(&self) -> PollSnapshot {
        PollSnapshot {
            status: self.status.clone(),
            countdown_secs: self.countdown_secs(),
            is_polling: self.is_polling(),
            is_checking: self.session.is_some_and(|s| s.in_flight),
            messages: self.messages.clone(),
            tracked: self.tracked.clone(),
        }
    }

    /// Marks the next request outstanding and clears the message list, the
    /// same way the driver presents a fresh check to the user.
    fn begin_poll(&mut self) -> Option<PollRequest> {
        let deploy_id = self.tracked.clone()?;
        let session = self.session.as_mut()?;
        session.in_flight = true;
        self.messages.clear();
        Some(PollRequest {
            generation: self.generation,
            deploy_id,
        })
    }
}
