//! wintrack - Window Lifecycle Tracker
//!
//! Binary entry point: parses the command line, initializes logging and
//! signal handling, then hands the command to the CLI executor.

use clap::Parser;
use tokio::{signal, sync::broadcast};
use tracing::{debug, error, info, warn};
use wintrack::{
    cli::{CliExecutor, WinTrackCli},
    logging::{init_logging, LogConfig, LogLevel},
    Result,
};

/// Application state for one invocation
pub struct WinTrackApp {
    cli: WinTrackCli,
    shutdown_tx: broadcast::Sender<()>,
}

impl WinTrackApp {
    pub fn new(cli: WinTrackCli) -> Result<Self> {
        let mut log_config = LogConfig::from_env();
        if cli.verbose {
            log_config.level = LogLevel::Debug;
        }
        init_logging(&log_config)?;

        debug!("wintrack v{}", env!("CARGO_PKG_VERSION"));
        let (shutdown_tx, _) = broadcast::channel(1);
        Ok(Self { cli, shutdown_tx })
    }

    pub async fn run(self) -> Result<()> {
        let shutdown_tx = self.shutdown_tx.clone();
        tokio::spawn(async move {
            if let Err(e) = Self::setup_signal_handlers(shutdown_tx).await {
                error!("Failed to setup signal handlers: {}", e);
            }
        });

        let executor = CliExecutor::new(&self.cli, self.shutdown_tx.clone());
        executor.execute(self.cli.command).await
    }

    async fn setup_signal_handlers(shutdown_tx: broadcast::Sender<()>) -> Result<()> {
        #[cfg(unix)]
        {
            let mut sigterm = signal::unix::signal(signal::unix::SignalKind::terminate())?;
            tokio::select! {
                res = signal::ctrl_c() => {
                    match res {
                        Ok(_) => info!("Received SIGINT (Ctrl+C)"),
                        Err(e) => warn!("Failed to listen for Ctrl+C: {}", e),
                    }
                }
                _ = sigterm.recv() => {
                    info!("Received SIGTERM");
                }
            }
        }

        #[cfg(not(unix))]
        {
            match signal::ctrl_c().await {
                Ok(_) => info!("Received Ctrl+C"),
                Err(e) => warn!("Failed to listen for Ctrl+C: {}", e),
            }
        }

        if shutdown_tx.send(()).is_err() {
            debug!("Shutdown signal sent with no active command listening");
        }

        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = WinTrackCli::parse();
    let json = cli.json;
    let app = WinTrackApp::new(cli)?;

    if let Err(e) = app.run().await {
        if json {
            let error_json = serde_json::json!({
                "error": true,
                "message": format!("{:#}", e),
            });
            println!("{}", error_json);
        } else {
            error!("Command failed: {:#}", e);
            eprintln!("error: {:#}", e);
        }
        std::process::exit(1);
    }

    Ok(())
}
