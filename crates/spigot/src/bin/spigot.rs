//! # SPIGOT
//!
//! Terminal front end for the faucet flow.
//!
//! ```bash
//! # Test eligibility, claim, poll the deploy to a terminal state
//! spigot claim 1111abcd...
//!
//! # Poll an existing deploy id
//! spigot status 0a1b2c...
//!
//! # Settings come from --config, SPIGOT_CONFIG, or built-in defaults
//! spigot --config spigot.toml claim 1111abcd...
//! ```
//!
//! The binary drives the flow engine and prints snapshot fields as they
//! change. Exit code is zero only when the deploy reached `Finalized`.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use tracing_subscriber::EnvFilter;

use spigot::{build_flow, ConfigError, SpigotConfig};
use spigot_core::DeployStatus;
use spigot_engine::{FaucetPhase, FlowHandle, FlowSnapshot};

/// What the user asked for.
enum Command {
    Claim { address: String },
    Status { deploy_id: String },
}

/// Parsed command line. `command` is `None` when help was requested or no
/// command was given.
struct Invocation {
    config_path: Option<PathBuf>,
    command: Option<Command>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("spigot=info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let invocation = match parse_args(&args) {
        Ok(invocation) => invocation,
        Err(message) => {
            eprintln!("✗ {message}");
            eprintln!();
            print_help();
            return ExitCode::FAILURE;
        }
    };

    let Some(command) = invocation.command else {
        print_help();
        return ExitCode::SUCCESS;
    };

    let config = match load_config(invocation.config_path.as_deref()) {
        Ok(config) => config,
        Err(error) => {
            eprintln!("✗ {error}");
            return ExitCode::FAILURE;
        }
    };

    print_banner(&config);

    let handle = match build_flow(&config) {
        Ok(handle) => handle,
        Err(error) => {
            eprintln!("✗ {error}");
            return ExitCode::FAILURE;
        }
    };

    let success = match command {
        Command::Claim { address } => run_claim(&handle, &address).await,
        Command::Status { deploy_id } => run_status(&handle, &deploy_id).await,
    };

    handle.shutdown().await;
    println!();

    if success {
        println!("  ✓ Deploy finalized");
        ExitCode::SUCCESS
    } else {
        println!("  ✗ Flow did not complete");
        ExitCode::FAILURE
    }
}

/// Full flow: eligibility, claim, then poll the returned deploy id.
async fn run_claim(handle: &FlowHandle, address: &str) -> bool {
    let mut rx = handle.snapshots();
    let mut printer = FlowPrinter::new();
    let mut claimed = false;

    handle.input_address(address);

    loop {
        if rx.changed().await.is_err() {
            return false;
        }
        let snap = rx.borrow_and_update().clone();
        printer.print_delta(&snap);

        if !snap.address_messages.is_empty() {
            return false;
        }
        match snap.claim.phase {
            FaucetPhase::ReadyToClaim if !claimed => {
                claimed = true;
                handle.claim();
            }
            FaucetPhase::Errored => return false,
            // Eligibility refused: the flow stays in TESTING with a message.
            FaucetPhase::Testing if !snap.claim.messages.is_empty() => return false,
            _ => {}
        }
        if let Some(success) = poll_finished(&snap) {
            return success;
        }
    }
}

/// Poll an existing deploy id to a terminal state or timeout.
async fn run_status(handle: &FlowHandle, deploy_id: &str) -> bool {
    let mut rx = handle.snapshots();
    let mut printer = FlowPrinter::new();

    handle.input_deploy_id(deploy_id);

    loop {
        if rx.changed().await.is_err() {
            return false;
        }
        let snap = rx.borrow_and_update().clone();
        printer.print_delta(&snap);

        if !snap.deploy_id_messages.is_empty() {
            return false;
        }
        if let Some(success) = poll_finished(&snap) {
            return success;
        }
    }
}

/// `Some(success)` once a poll session has started and stopped.
fn poll_finished(snap: &FlowSnapshot) -> Option<bool> {
    if snap.poll.tracked.is_some() && !snap.poll.is_polling {
        Some(snap.poll.status.as_ref().is_some_and(DeployStatus::is_success))
    } else {
        None
    }
}

fn load_config(path: Option<&Path>) -> Result<SpigotConfig, ConfigError> {
    match path {
        Some(path) => SpigotConfig::load(path),
        None => SpigotConfig::from_env(),
    }
}

fn parse_args(args: &[String]) -> Result<Invocation, String> {
    let mut config_path = None;
    let mut positional = Vec::new();

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--config" => {
                let value = iter.next().ok_or("--config requires a path")?;
                config_path = Some(PathBuf::from(value));
            }
            "--help" | "-h" => {
                return Ok(Invocation {
                    config_path,
                    command: None,
                });
            }
            flag if flag.starts_with('-') => return Err(format!("unknown flag: {flag}")),
            value => positional.push(value.to_owned()),
        }
    }

    let command = match positional.as_slice() {
        [] => None,
        [command, value] => match command.as_str() {
            "claim" => Some(Command::Claim {
                address: value.clone(),
            }),
            "status" => Some(Command::Status {
                deploy_id: value.clone(),
            }),
            other => return Err(format!("unknown command: {other}")),
        },
        _ => return Err("expected: claim <address> or status <deploy_id>".to_owned()),
    };

    Ok(Invocation {
        config_path,
        command,
    })
}

fn print_banner(config: &SpigotConfig) {
    println!("═══════════════════════════════════════════════════════════════════");
    println!("                       SPIGOT FAUCET CLIENT");
    println!("═══════════════════════════════════════════════════════════════════");
    println!();
    println!("  Gateway:       {}", config.gateway.url);
    println!(
        "  Ceiling:       {} display units (inclusive)",
        config.claim.balance_ceiling
    );
    println!(
        "  Poll cadence:  every {}s, up to {} min",
        config.poller.interval_secs, config.poller.max_minutes
    );
    println!();
}

fn print_help() {
    println!("SPIGOT - token faucet client");
    println!();
    println!("USAGE:");
    println!("  spigot [--config <path>] claim <address>");
    println!("  spigot [--config <path>] status <deploy_id>");
    println!();
    println!("COMMANDS:");
    println!("  claim    Test eligibility, claim tokens, poll the deploy to a terminal state");
    println!("  status   Poll an existing deploy id");
    println!();
    println!("FLAGS:");
    println!("  --config <path>  TOML config file (env: SPIGOT_CONFIG)");
    println!("  --help           Show this help");
}

/// Prints snapshot fields as they change, teletype style.
struct FlowPrinter {
    phase: FaucetPhase,
    balance: Option<u64>,
    status: Option<String>,
    messages: Vec<String>,
    countdown: Option<u64>,
}

impl FlowPrinter {
    fn new() -> Self {
        Self {
            phase: FaucetPhase::Testing,
            balance: None,
            status: None,
            messages: Vec::new(),
            countdown: None,
        }
    }

    fn print_delta(&mut self, snap: &FlowSnapshot) {
        if snap.claim.phase != self.phase {
            println!("  Phase:   {}", snap.claim.phase);
            self.phase = snap.claim.phase;
        }

        if snap.claim.display_balance != self.balance {
            if let Some(balance) = snap.claim.display_balance {
                println!("  Balance: {balance}");
            }
            self.balance = snap.claim.display_balance;
        }

        let status = snap.poll.status.as_ref().map(ToString::to_string);
        if status != self.status {
            if let Some(current) = &status {
                println!("  Status:  {current}");
            }
            self.status = status;
        }

        let mut messages = Vec::new();
        messages.extend_from_slice(&snap.address_messages);
        messages.extend_from_slice(&snap.deploy_id_messages);
        messages.extend_from_slice(&snap.claim.messages);
        messages.extend_from_slice(&snap.poll.messages);
        if messages != self.messages {
            for message in &messages {
                if !self.messages.contains(message) {
                    println!("  ! {message}");
                }
            }
            self.messages = messages;
        }

        let countdown = snap.poll.is_polling.then_some(snap.poll.countdown_secs);
        if countdown != self.countdown {
            if let Some(secs) = countdown {
                println!("  Next check in {secs}s");
            }
            self.countdown = countdown;
        }
    }
}
