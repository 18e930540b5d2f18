//! Run command implementation

use crate::cli::output::{format_notification, format_snapshot};
use crate::cli::repl::{parse_line, ReplAction, HELP};
use crate::cli::{BackendArgs, RunArgs};
use crate::config::ConsoleConfig;
use crate::console::{Command, Console, ConsoleSnapshot, NotificationView};
use crate::hub::HttpHubApi;
use crate::stream::WsTransport;
use anyhow::Context;
use colored::Colorize;
use std::io::BufRead;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;

/// Load configuration with CLI overrides
pub fn load_config_with_overrides(args: &BackendArgs) -> anyhow::Result<ConsoleConfig> {
    // Load from file if it exists, otherwise use defaults
    let mut config = if args.config.exists() {
        ConsoleConfig::load(Some(&args.config))
            .with_context(|| format!("failed to load {}", args.config.display()))?
    } else {
        tracing::debug!("Config file not found, using defaults");
        ConsoleConfig::default()
    };

    // Apply environment variable overrides
    config = config.with_env_overrides();

    // Apply CLI overrides (highest priority)
    if let Some(port) = args.port {
        config.backend.port = port;
    }
    if let Some(ref host) = args.host {
        config.backend.host = host.clone();
    }

    config.validate()?;
    Ok(config)
}

/// Notifications newer than `last_seen`, plus the new high-water mark.
pub fn fresh_notifications(
    snapshot: &ConsoleSnapshot,
    last_seen: u64,
) -> (Vec<&NotificationView>, u64) {
    let fresh: Vec<_> = snapshot
        .notifications
        .iter()
        .filter(|n| n.id > last_seen)
        .collect();
    let high = fresh.iter().map(|n| n.id).max().unwrap_or(last_seen);
    (fresh, high)
}

/// Print each notification once, as it appears.
async fn print_notifications(
    mut snapshots: watch::Receiver<ConsoleSnapshot>,
    cancel: CancellationToken,
) {
    let mut last_seen = 0;
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            changed = snapshots.changed() => {
                if changed.is_err() {
                    break;
                }
            }
        }

        let snapshot = snapshots.borrow_and_update().clone();
        let (fresh, high) = fresh_notifications(&snapshot, last_seen);
        for n in fresh {
            println!("{}", format_notification(n));
        }
        last_seen = high;
    }
}

/// Read stdin on a plain thread so a pending read never holds up shutdown.
fn spawn_stdin_reader() -> mpsc::UnboundedReceiver<String> {
    let (tx, rx) = mpsc::unbounded_channel();
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if tx.send(line).is_err() {
                break;
            }
        }
    });
    rx
}

/// Wait for SIGINT
async fn shutdown_signal(cancel_token: CancellationToken) {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            tracing::info!("Received SIGINT, shutting down...");
            cancel_token.cancel();
        }
        Err(e) => tracing::warn!(error = %e, "Failed to install CTRL+C handler"),
    }
}

/// Main run command handler
pub async fn run_console(args: RunArgs) -> anyhow::Result<()> {
    // 1. Load and merge configuration
    let mut config = load_config_with_overrides(&args.backend)?;
    if let Some(ref log_level) = args.log_level {
        config.logging.level = log_level.clone();
    }
    if args.no_health_check {
        config.health_check.enabled = false;
    }

    // 2. Initialize tracing
    crate::logging::init_tracing(&config.logging)
        .map_err(|e| anyhow::anyhow!("failed to initialize logging: {}", e))?;

    tracing::info!(backend = %config.backend.base_url(), "Starting edge console");
    tracing::debug!(?config, "Loaded configuration");

    // 3. Build the engine and run it on its own task
    let api = HttpHubApi::new(config.backend.clone(), config.health_check.timeout())?;
    let console = Console::new(config, Arc::new(api), Arc::new(WsTransport::new()));
    let cancel_token = CancellationToken::new();
    let (handle, console_task) = console.spawn(cancel_token.clone());

    let printer = tokio::spawn(print_notifications(
        handle.subscribe(),
        cancel_token.clone(),
    ));
    tokio::spawn(shutdown_signal(cancel_token.clone()));

    // 4. Forward typed commands until quit, EOF, or SIGINT
    println!("{}", "Edge Console. Type 'help' for commands.".bold());
    let mut lines = spawn_stdin_reader();
    loop {
        let line = tokio::select! {
            _ = cancel_token.cancelled() => break,
            line = lines.recv() => line,
        };
        let Some(line) = line else { break };

        match parse_line(&line) {
            Ok(ReplAction::Send(command)) => {
                if !handle.send(command).await {
                    break;
                }
            }
            Ok(ReplAction::Status) => println!("{}", format_snapshot(&handle.snapshot())),
            Ok(ReplAction::Help) => println!("{}", HELP),
            Ok(ReplAction::Quit) => break,
            Ok(ReplAction::Nothing) => {}
            Err(message) => eprintln!("{}", message.red()),
        }
    }

    // 5. Graceful shutdown
    handle.send(Command::Shutdown).await;
    console_task.await?;
    cancel_token.cancel();
    printer.await?;

    tracing::info!("Edge console stopped");
    Ok(())
}
