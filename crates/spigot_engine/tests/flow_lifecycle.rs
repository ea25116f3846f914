//! Integration test for the faucet flow runtime.
//!
//! Drives a real worker task against a scripted gateway with short timers
//! and watches the snapshot channel for the states that must appear.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::watch;

use spigot_core::{Cogs, DeployStatus};
use spigot_engine::gateway::{
    DeployId, FaucetGateway, GatewayError, GatewayResult, StatusReport,
};
use spigot_engine::{FaucetPhase, FlowConfig, FlowHandle, FlowSnapshot, PollerConfig};

/// Gateway double that replays queued results and counts calls.
#[derive(Default)]
struct ScriptedGateway {
    balances: Mutex<VecDeque<GatewayResult<Option<Cogs>>>>,
    claims: Mutex<VecDeque<GatewayResult<DeployId>>>,
    statuses: Mutex<VecDeque<GatewayResult<StatusReport>>>,
    balance_calls: AtomicUsize,
    claim_calls: AtomicUsize,
    status_calls: AtomicUsize,
    last_balance_address: Mutex<Option<String>>,
}

impl ScriptedGateway {
    fn queue_balance(&self, result: GatewayResult<Option<Cogs>>) {
        self.balances.lock().push_back(result);
    }

    fn queue_claim(&self, result: GatewayResult<DeployId>) {
        self.claims.lock().push_back(result);
    }

    fn queue_status(&self, result: GatewayResult<StatusReport>) {
        self.statuses.lock().push_back(result);
    }

    fn balances_fetched(&self) -> usize {
        self.balance_calls.load(Ordering::SeqCst)
    }

    fn claims_submitted(&self) -> usize {
        self.claim_calls.load(Ordering::SeqCst)
    }

    fn statuses_fetched(&self) -> usize {
        self.status_calls.load(Ordering::SeqCst)
    }

    fn last_balance_address(&self) -> Option<String> {
        self.last_balance_address.lock().clone()
    }
}

#[async_trait]
impl FaucetGateway for ScriptedGateway {
    async fn fetch_balance(&self, address: &str) -> GatewayResult<Option<Cogs>> {
        self.balance_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_balance_address.lock() = Some(address.to_owned());
        self.balances
            .lock()
            .pop_front()
            .unwrap_or_else(|| Ok(Some(Cogs::ZERO)))
    }

    async fn submit_claim(&self, _address: &str) -> GatewayResult<DeployId> {
        self.claim_calls.fetch_add(1, Ordering::SeqCst);
        self.claims
            .lock()
            .pop_front()
            .unwrap_or_else(|| Err(GatewayError::Rejected("unscripted claim".to_owned())))
    }

    async fn fetch_status(&self, _deploy_id: &DeployId) -> GatewayResult<StatusReport> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        self.statuses.lock().pop_front().unwrap_or_else(|| {
            Ok(StatusReport {
                status: Some("Deploying".to_owned()),
                message: None,
            })
        })
    }
}

fn report(status: &str) -> GatewayResult<StatusReport> {
    Ok(StatusReport {
        status: Some(status.to_owned()),
        message: None,
    })
}

fn report_with_message(status: &str, message: &str) -> GatewayResult<StatusReport> {
    Ok(StatusReport {
        status: Some(status.to_owned()),
        message: Some(message.to_owned()),
    })
}

/// 50 chars, passes the wallet rules.
fn valid_address(fill: char) -> String {
    format!("1111{}", fill.to_string().repeat(46))
}

/// 120 chars, passes the deploy id rules.
fn valid_deploy_id(fill: char) -> String {
    fill.to_string().repeat(120)
}

/// Timers short enough that a full flow fits in a test.
fn fast_config() -> FlowConfig {
    FlowConfig {
        poller: PollerConfig {
            poll_interval: Duration::from_millis(50),
            max_poll: Duration::from_secs(10),
        },
        debounce: Duration::from_millis(10),
        ..FlowConfig::default()
    }
}

/// Spawns a worker over the scripted gateway with the short timers.
fn spawn_flow(gateway: &Arc<ScriptedGateway>) -> FlowHandle {
    FlowHandle::spawn(fast_config(), Arc::clone(gateway) as Arc<dyn FaucetGateway>)
}

/// Waits until the snapshot satisfies `predicate`, or fails after 5s.
async fn wait_for<F>(rx: &mut watch::Receiver<FlowSnapshot>, mut predicate: F) -> FlowSnapshot
where
    F: FnMut(&FlowSnapshot) -> bool,
{
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            {
                let current = rx.borrow_and_update();
                if predicate(&current) {
                    return current.clone();
                }
            }
            rx.changed().await.expect("flow worker dropped");
        }
    })
    .await
    .expect("condition not reached within 5s")
}

#[tokio::test]
async fn test_claim_flow_reaches_finalized_deploy() {
    let gateway = Arc::new(ScriptedGateway::default());
    gateway.queue_balance(Ok(Some(Cogs::new(500_000_000_000))));
    gateway.queue_claim(Ok(DeployId::new(valid_deploy_id('d'))));
    gateway.queue_status(report("Deploying"));
    gateway.queue_status(report("Finalized"));

    let handle = spawn_flow(&gateway);
    let mut rx = handle.snapshots();

    handle.input_address(valid_address('a'));
    let snap = wait_for(&mut rx, |s| s.claim.phase == FaucetPhase::ReadyToClaim).await;
    assert_eq!(snap.claim.display_balance, Some(500));
    assert!(snap.address_messages.is_empty());

    handle.claim();
    let snap = wait_for(&mut rx, |s| s.claim.phase == FaucetPhase::Completed).await;
    assert_eq!(
        snap.poll.tracked.as_ref().map(DeployId::as_str),
        Some(valid_deploy_id('d').as_str())
    );

    let snap = wait_for(&mut rx, |s| {
        s.poll.status == Some(DeployStatus::Finalized)
    })
    .await;
    assert!(!snap.poll.is_polling);
    assert!(snap.poll.messages.is_empty());

    assert_eq!(gateway.balances_fetched(), 1);
    assert_eq!(gateway.claims_submitted(), 1);
    assert_eq!(gateway.statuses_fetched(), 2);

    handle.shutdown().await;
}

#[tokio::test]
async fn test_rejected_address_input_is_gated() {
    let gateway = Arc::new(ScriptedGateway::default());
    let handle = spawn_flow(&gateway);
    let mut rx = handle.snapshots();

    handle.input_address("abc");
    let snap = wait_for(&mut rx, |s| !s.address_messages.is_empty()).await;
    assert_eq!(
        snap.address_messages,
        vec![
            "Your input must start with 1111".to_owned(),
            "Length must be at least 50 chars".to_owned(),
        ]
    );
    assert_eq!(snap.claim.phase, FaucetPhase::Testing);
    assert_eq!(snap.claim.display_balance, None);

    // A claim attempt on a gated flow goes nowhere.
    handle.claim();
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(gateway.balances_fetched(), 0);
    assert_eq!(gateway.claims_submitted(), 0);

    handle.shutdown().await;
}

#[tokio::test]
async fn test_rapid_edits_collapse_to_one_balance_fetch() {
    let gateway = Arc::new(ScriptedGateway::default());
    gateway.queue_balance(Ok(Some(Cogs::ZERO)));

    let handle = spawn_flow(&gateway);
    let mut rx = handle.snapshots();

    handle.input_address(valid_address('a'));
    handle.input_address(valid_address('b'));
    handle.input_address(valid_address('c'));

    wait_for(&mut rx, |s| s.claim.phase == FaucetPhase::ReadyToClaim).await;
    assert_eq!(gateway.balances_fetched(), 1);
    assert_eq!(gateway.last_balance_address(), Some(valid_address('c')));

    handle.shutdown().await;
}

#[tokio::test]
async fn test_tracked_deploy_id_polls_until_failure() {
    let gateway = Arc::new(ScriptedGateway::default());
    gateway.queue_status(report("Deploying"));
    gateway.queue_status(report_with_message("DeployError", "node rejected the deploy"));

    let handle = spawn_flow(&gateway);
    let mut rx = handle.snapshots();

    handle.input_deploy_id(valid_deploy_id('f'));
    let snap = wait_for(&mut rx, |s| {
        s.poll.status == Some(DeployStatus::DeployError)
    })
    .await;
    assert!(!snap.poll.is_polling);
    assert_eq!(snap.poll.messages, vec!["node rejected the deploy".to_owned()]);
    assert_eq!(
        snap.poll.tracked.as_ref().map(DeployId::as_str),
        Some(valid_deploy_id('f').as_str())
    );

    // Clearing the input resets the poll side entirely.
    handle.input_deploy_id("");
    let snap = wait_for(&mut rx, |s| s.poll.tracked.is_none()).await;
    assert_eq!(snap.poll.status, None);
    assert!(snap.poll.messages.is_empty());

    // The claim side never got involved.
    assert_eq!(snap.claim.phase, FaucetPhase::Testing);
    assert_eq!(gateway.balances_fetched(), 0);

    handle.shutdown().await;
}

#[tokio::test]
async fn test_empty_deploy_id_from_claim_is_an_error() {
    let gateway = Arc::new(ScriptedGateway::default());
    gateway.queue_balance(Ok(Some(Cogs::ZERO)));
    gateway.queue_claim(Ok(DeployId::new("")));

    let handle = spawn_flow(&gateway);
    let mut rx = handle.snapshots();

    handle.input_address(valid_address('a'));
    wait_for(&mut rx, |s| s.claim.phase == FaucetPhase::ReadyToClaim).await;

    handle.claim();
    let snap = wait_for(&mut rx, |s| s.claim.phase == FaucetPhase::Errored).await;
    assert_eq!(
        snap.claim.messages,
        vec!["Unable to acquire 'deploy_id'. Please try again...".to_owned()]
    );

    // No deploy id, no poll session.
    assert_eq!(snap.poll.tracked, None);
    assert_eq!(gateway.statuses_fetched(), 0);

    handle.shutdown().await;
}

#[tokio::test]
async fn test_shutdown_stops_polling_but_keeps_last_view() {
    let gateway = Arc::new(ScriptedGateway::default());
    gateway.queue_status(report("Deploying"));

    let handle = spawn_flow(&gateway);
    let mut rx = handle.snapshots();

    handle.input_deploy_id(valid_deploy_id('f'));
    wait_for(&mut rx, |s| s.poll.status == Some(DeployStatus::Deploying)).await;

    handle.shutdown().await;

    let snap = rx.borrow().clone();
    assert!(!snap.poll.is_polling);
    assert_eq!(snap.poll.status, Some(DeployStatus::Deploying));
    assert_eq!(
        snap.poll.tracked.as_ref().map(DeployId::as_str),
        Some(valid_deploy_id('f').as_str())
    );
}
