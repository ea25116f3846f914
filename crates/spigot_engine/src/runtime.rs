//! # Flow Runtime
//!
//! One worker task owns both state machines and is their only writer.
//! Everything else talks to it through channels:
//!
//! - commands in through an unbounded mpsc (input edits, claim, shutdown)
//! - gateway call completions back through an internal reply channel,
//!   stamped with the staleness token they were issued under
//! - state out through a watch channel republishing a [`FlowSnapshot`]
//!   whenever something observable changed
//!
//! Gateway calls run as spawned tasks, so a slow response never blocks a
//! tick or a command. Nothing is ever aborted: a completion whose token went
//! stale is discarded by the controller it returns to. The poll and
//! countdown tickers are re-armed whenever a poll session starts, and their
//! select arms are disabled entirely while no session is running.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant as TokioInstant, Interval, MissedTickBehavior};

use spigot_core::constants::{COUNTDOWN_TICK_SECS, DEFAULT_DEBOUNCE_MS};
use spigot_core::{Cogs, InputRules};

use crate::claim::{BalanceRequest, ClaimConfig, ClaimController, ClaimRequest, ClaimSnapshot};
use crate::debounce::Debouncer;
use crate::gateway::{DeployId, FaucetGateway, GatewayResult, StatusReport};
use crate::poller::{PollRequest, PollSnapshot, PollerConfig, StatusPoller};

/// Settings for the whole flow runtime.
#[derive(Clone, Debug)]
pub struct FlowConfig {
    /// Eligibility and claim settings.
    pub claim: ClaimConfig,
    /// Poller cadence settings.
    pub poller: PollerConfig,
    /// Settle delay for both text inputs.
    pub debounce: Duration,
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            claim: ClaimConfig::default(),
            poller: PollerConfig::default(),
            debounce: Duration::from_millis(DEFAULT_DEBOUNCE_MS),
        }
    }
}

/// Combined view of both state machines plus input validation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FlowSnapshot {
    /// Claim side.
    pub claim: ClaimSnapshot,
    /// Poll side.
    pub poll: PollSnapshot,
    /// Rule violations of the last committed address input.
    pub address_messages: Vec<String>,
    /// Rule violations of the last committed deploy id input.
    pub deploy_id_messages: Vec<String>,
}

enum Command {
    InputAddress(String),
    InputDeployId(String),
    Claim,
    Shutdown,
}

enum Reply {
    Balance {
        seq: u64,
        result: GatewayResult<Option<Cogs>>,
    },
    Claimed {
        result: GatewayResult<DeployId>,
    },
    Status {
        generation: u64,
        result: GatewayResult<StatusReport>,
    },
}

/// Handle to a running flow worker.
///
/// Dropping the handle closes the command channel; the worker notices,
/// disposes the poller and exits. [`FlowHandle::shutdown`] does the same but
/// waits for the worker to finish.
pub struct FlowHandle {
    commands: mpsc::UnboundedSender<Command>,
    snapshots: watch::Receiver<FlowSnapshot>,
    worker: JoinHandle<()>,
}

impl FlowHandle {
    /// Spawns the flow worker on the current tokio runtime.
    #[must_use]
    pub fn spawn(config: FlowConfig, gateway: Arc<dyn FaucetGateway>) -> Self {
        let (commands_tx, commands_rx) = mpsc::unbounded_channel();
        let (replies_tx, replies_rx) = mpsc::unbounded_channel();

        let claim = ClaimController::new(config.claim);
        let poller = StatusPoller::new(config.poller);
        let initial = FlowSnapshot {
            claim: claim.snapshot(),
            poll: poller.snapshot(),
            address_messages: Vec::new(),
            deploy_id_messages: Vec::new(),
        };
        let (snapshots_tx, snapshots_rx) = watch::channel(initial);

        let worker = FlowWorker {
            claim,
            poller,
            gateway,
            poll_interval: config.poller.poll_interval,
            address_rules: InputRules::wallet_address(),
            deploy_id_rules: InputRules::deploy_id(),
            address_debounce: Debouncer::new(config.debounce),
            deploy_id_debounce: Debouncer::new(config.debounce),
            address_messages: Vec::new(),
            deploy_id_messages: Vec::new(),
            replies_tx,
            snapshots: snapshots_tx,
        };

        let handle = tokio::spawn(worker.run(commands_rx, replies_rx));
        tracing::debug!("Flow worker spawned");

        Self {
            commands: commands_tx,
            snapshots: snapshots_rx,
            worker: handle,
        }
    }

    /// Submits a raw wallet address edit. Debounced, then validated; only a
    /// valid address triggers an eligibility test.
    pub fn input_address(&self, raw: impl Into<String>) {
        let _ = self.commands.send(Command::InputAddress(raw.into()));
    }

    /// Submits a raw deploy id edit. Debounced, then validated; only a
    /// valid id gets tracked.
    pub fn input_deploy_id(&self, raw: impl Into<String>) {
        let _ = self.commands.send(Command::InputDeployId(raw.into()));
    }

    /// Triggers a claim. Ignored unless the flow is READY_TO_CLAIM.
    pub fn claim(&self) {
        let _ = self.commands.send(Command::Claim);
    }

    /// Watch channel carrying the latest snapshot.
    #[must_use]
    pub fn snapshots(&self) -> watch::Receiver<FlowSnapshot> {
        self.snapshots.clone()
    }

    /// The latest snapshot.
    #[must_use]
    pub fn snapshot(&self) -> FlowSnapshot {
        self.snapshots.borrow().clone()
    }

    /// Stops the worker and waits for it to finish.
    pub async fn shutdown(self) {
        let _ = self.commands.send(Command::Shutdown);
        let _ = self.worker.await;
    }
}

struct FlowWorker {
    claim: ClaimController,
    poller: StatusPoller,
    gateway: Arc<dyn FaucetGateway>,
    poll_interval: Duration,
    address_rules: InputRules,
    deploy_id_rules: InputRules,
    address_debounce: Debouncer<String>,
    deploy_id_debounce: Debouncer<String>,
    address_messages: Vec<String>,
    deploy_id_messages: Vec<String>,
    replies_tx: mpsc::UnboundedSender<Reply>,
    snapshots: watch::Sender<FlowSnapshot>,
}

impl FlowWorker {
    async fn run(
        mut self,
        mut commands: mpsc::UnboundedReceiver<Command>,
        mut replies: mpsc::UnboundedReceiver<Reply>,
    ) {
        let mut poll_ticker = Self::ticker(self.poll_interval);
        let mut countdown_ticker = Self::ticker(Duration::from_secs(COUNTDOWN_TICK_SECS));

        loop {
            let address_deadline = self.address_debounce.deadline();
            let deploy_id_deadline = self.deploy_id_debounce.deadline();

            tokio::select! {
                maybe_command = commands.recv() => {
                    match maybe_command {
                        None | Some(Command::Shutdown) => break,
                        Some(command) => self.handle_command(command),
                    }
                }
                maybe_reply = replies.recv() => {
                    if let Some(reply) = maybe_reply {
                        self.handle_reply(reply, &mut poll_ticker, &mut countdown_ticker);
                    }
                }
                _ = poll_ticker.tick(), if self.poller.is_polling() => {
                    if let Some(request) = self.poller.on_poll_tick(Instant::now()) {
                        self.spawn_status(request);
                    }
                }
                _ = countdown_ticker.tick(), if self.poller.is_polling() => {
                    self.poller.on_countdown_tick();
                }
                () = sleep_until_deadline(address_deadline), if address_deadline.is_some() => {
                    self.commit_address();
                }
                () = sleep_until_deadline(deploy_id_deadline), if deploy_id_deadline.is_some() => {
                    self.commit_deploy_id(&mut poll_ticker, &mut countdown_ticker);
                }
            }

            self.publish();
        }

        self.poller.dispose();
        self.publish();
        tracing::debug!("Flow worker stopped");
    }

    fn handle_command(&mut self, command: Command) {
        match command {
            Command::InputAddress(raw) => {
                self.address_debounce.submit(raw, Instant::now());
            }
            Command::InputDeployId(raw) => {
                self.deploy_id_debounce.submit(raw, Instant::now());
            }
            Command::Claim => {
                if let Some(request) = self.claim.begin_claim() {
                    self.spawn_claim(request);
                }
            }
            // Handled by the run loop before dispatch.
            Command::Shutdown => {}
        }
    }

    fn handle_reply(
        &mut self,
        reply: Reply,
        poll_ticker: &mut Interval,
        countdown_ticker: &mut Interval,
    ) {
        match reply {
            Reply::Balance { seq, result } => {
                self.claim.apply_balance(seq, result);
            }
            Reply::Claimed { result } => {
                if let Some(id) = self.claim.apply_claim(result) {
                    // Hand-off and user input share one tracking setter.
                    self.apply_track(id.as_str(), poll_ticker, countdown_ticker);
                }
            }
            Reply::Status { generation, result } => {
                self.poller.apply_status(generation, result);
            }
        }
    }

    fn commit_address(&mut self) {
        let Some(raw) = self.address_debounce.take_ready(Instant::now()) else {
            return;
        };

        let check = self.address_rules.validate(&raw);
        self.address_messages = check.messages;

        if check.is_valid {
            if let Some(request) = self.claim.set_address(raw.trim()) {
                self.spawn_balance(request);
            }
        } else {
            // Invalid input deactivates the claim flow.
            self.claim.set_address("");
        }
    }

    fn commit_deploy_id(&mut self, poll_ticker: &mut Interval, countdown_ticker: &mut Interval) {
        let Some(raw) = self.deploy_id_debounce.take_ready(Instant::now()) else {
            return;
        };

        let check = self.deploy_id_rules.validate(&raw);
        self.deploy_id_messages = check.messages;

        if check.is_valid {
            self.apply_track(raw.trim(), poll_ticker, countdown_ticker);
        } else {
            // Invalid input stops tracking rather than polling a bad id.
            self.apply_track("", poll_ticker, countdown_ticker);
        }
    }

    /// The single setter both tracking write paths go through. Starting a
    /// session re-arms both tickers so the first scheduled poll lands a full
    /// interval after the immediate one.
    fn apply_track(
        &mut self,
        id: &str,
        poll_ticker: &mut Interval,
        countdown_ticker: &mut Interval,
    ) {
        if let Some(request) = self.poller.track(id, Instant::now()) {
            *poll_ticker = Self::ticker(self.poll_interval);
            *countdown_ticker = Self::ticker(Duration::from_secs(COUNTDOWN_TICK_SECS));
            self.spawn_status(request);
        }
    }

    fn spawn_balance(&self, request: BalanceRequest) {
        let gateway = Arc::clone(&self.gateway);
        let replies = self.replies_tx.clone();
        tokio::spawn(async move {
            let result = gateway.fetch_balance(&request.address).await;
            let _ = replies.send(Reply::Balance {
                seq: request.seq,
                result,
            });
        });
    }

    fn spawn_claim(&self, request: ClaimRequest) {
        let gateway = Arc::clone(&self.gateway);
        let replies = self.replies_tx.clone();
        tokio::spawn(async move {
            let result = gateway.submit_claim(&request.address).await;
            let _ = replies.send(Reply::Claimed { result });
        });
    }

    fn spawn_status(&self, request: PollRequest) {
        let gateway = Arc::clone(&self.gateway);
        let replies = self.replies_tx.clone();
        tokio::spawn(async move {
            let result = gateway.fetch_status(&request.deploy_id).await;
            let _ = replies.send(Reply::Status {
                generation: request.generation,
                result,
            });
        });
    }

    fn publish(&self) {
        let next = self.snapshot();
        self.snapshots.send_if_modified(|current| {
            if *current == next {
                false
            } else {
                *current = next;
                true
            }
        });
    }

    fn snapshot(&self) -> FlowSnapshot {
        FlowSnapshot {
            claim: self.claim.snapshot(),
            poll: self.poller.snapshot(),
            address_messages: self.address_messages.clone(),
            deploy_id_messages: self.deploy_id_messages.clone(),
        }
    }

    fn ticker(period: Duration) -> Interval {
        let mut interval = time::interval_at(TokioInstant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        interval
    }
}

/// Sleeps until `deadline`, or forever when there is none. The forever arm
/// is only constructed, never polled: its select branch is guarded.
async fn sleep_until_deadline(deadline: Option<Instant>) {
    match deadline {
        Some(instant) => time::sleep_until(TokioInstant::from_std(instant)).await,
        None => std::future::pending().await,
    }
}
