//! sign-standalone
//!
//! Terminal dapp that pairs with a wallet and requests a transaction.
//!
//! # Architecture Overview
//!
//! ```text
//!   stdin ──▶ ui::command ──▶ ui::app ──▶ session::controller ──▶ connector::bridge ──▶ sidecar
//!                                              │      ▲                 (JSON-RPC / ws)
//!                                              │      └── session_delete ◀──────┘
//!                                              ├──▶ modal::terminal (pairing URI)
//!   stdout ◀── ui::view ◀── watch::Receiver ◀──┘
//! ```

use std::io::BufRead;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::sync::mpsc;

use sign_standalone::config::{load_config, AppConfig};
use sign_standalone::connector::BridgeFactory;
use sign_standalone::lifecycle::{signals::shutdown_on_signal, Shutdown};
use sign_standalone::modal::TerminalModal;
use sign_standalone::observability::{logging, metrics};
use sign_standalone::session::SessionController;
use sign_standalone::ui::{render, App, Command, CommandError, Flow, Notice, HELP};

#[derive(Parser)]
#[command(name = "sign-standalone")]
#[command(about = "Pair with a wallet and request a transaction", long_about = None)]
struct Cli {
    /// TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Overrides the config file and the environment.
    #[arg(long)]
    project_id: Option<String>,

    #[arg(long)]
    bridge_url: Option<String>,

    #[arg(long)]
    log_level: Option<String>,
}

impl Cli {
    /// Flags win over the environment and the file.
    fn apply(&self, config: &mut AppConfig) {
        if let Some(project_id) = &self.project_id {
            config.project_id = project_id.clone();
        }
        if let Some(url) = &self.bridge_url {
            config.bridge.url = url.clone();
        }
        if let Some(level) = &self.log_level {
            config.observability.log_level = level.clone();
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref(), |config| cli.apply(config))?;

    logging::init_logging(&config.observability);

    tracing::info!(
        chain = %config.chain.id,
        bridge = %config.bridge.url,
        approval_timeout_secs = config.session.approval_timeout_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        if let Ok(addr) = config.observability.metrics_address.parse() {
            metrics::init_metrics(addr);
        } else {
            tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            );
        }
    }

    let shutdown = Shutdown::new();
    tokio::spawn(shutdown_on_signal(shutdown.clone()));

    let factory = Arc::new(BridgeFactory::new(&config.bridge, shutdown.clone()));
    let controller = SessionController::new(
        &config,
        factory,
        Box::new(TerminalModal::stdout()),
        shutdown.clone(),
    )?;

    {
        let controller = controller.clone();
        tokio::spawn(async move {
            if let Err(e) = controller.initialize_with_retry().await {
                tracing::error!(error = %e, "Sign client unavailable, type `init` to retry");
            }
        });
    }

    let mut changes = controller.watch();
    let (app, mut notices) = App::new(controller, config.chain.explorer_tx_url.clone());
    let mut lines = spawn_stdin_reader();
    let mut shutdown_rx = shutdown.subscribe();

    println!("{}", render(&changes.borrow_and_update().clone(), app.explorer_tx_url()));
    println!("{}", HELP);

    loop {
        tokio::select! {
            line = lines.recv() => match line {
                Some(line) => match line.parse::<Command>() {
                    Ok(command) => {
                        if app.handle(command) == Flow::Quit {
                            break;
                        }
                    }
                    Err(CommandError::Empty) => {}
                    Err(e) => println!("! {}", e),
                },
                None => break,
            },
            Some(notice) = notices.recv() => match notice {
                Notice::Info(message) => println!("> {}", message),
                Notice::Error(message) => println!("! {}", message),
                Notice::View(view) => println!("{}", view),
            },
            changed = changes.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = changes.borrow_and_update().clone();
                println!("{}", render(&snapshot, app.explorer_tx_url()));
            }
            _ = shutdown_rx.recv() => break,
        }
    }

    shutdown.trigger();
    tracing::info!("Shutdown complete");
    Ok(())
}

/// Read stdin on a plain thread so a pending read never holds up runtime
/// shutdown.
fn spawn_stdin_reader() -> mpsc::UnboundedReceiver<String> {
    let (tx, rx) = mpsc::unbounded_channel();
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            match line {
                Ok(line) => {
                    if tx.send(line).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to read stdin");
                    break;
                }
            }
        }
    });
    rx
}
