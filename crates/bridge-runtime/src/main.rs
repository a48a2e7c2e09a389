//! # Launcher Bridge Runtime
//!
//! Runs the configured correlators against a save-data directory shared
//! with the launcher.
//!
//! ## Startup Sequence
//!
//! 1. Parse arguments (`--save-root`, `--correlator NAME[=TIMEOUT_SECS]`, ...)
//! 2. Initialize logging (stderr)
//! 3. Create `requests/` and `responses/` under the save root
//! 4. Register one correlator per name on the event bus
//! 5. Serve JSON-lines triggers from stdin until EOF or Ctrl+C

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use bridge_correlator::DirectoryExchange;
use bridge_runtime::{Args, BridgeRuntime};
use bridge_telemetry::{init_telemetry, TelemetryConfig};
use clap::Parser;
use shared_bus::InMemoryEventBus;
use tokio::io::BufReader;
use tracing::{info, warn};

fn main() -> Result<()> {
    let args = Args::parse();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start tokio runtime")?;
    let result = runtime.block_on(serve(args));

    // A stdin read stays blocked until the next line arrives
    runtime.shutdown_timeout(Duration::from_millis(100));
    result
}

async fn serve(args: Args) -> Result<()> {
    let _telemetry =
        init_telemetry(TelemetryConfig::from_env()).context("Failed to initialize logging")?;

    let configs = args
        .correlator_configs()
        .context("Invalid correlator configuration")?;

    let exchange = DirectoryExchange::new(&args.save_root);
    exchange
        .ensure_layout()
        .with_context(|| format!("Failed to prepare {}", args.save_root.display()))?;

    let bridge = BridgeRuntime::new(Arc::new(InMemoryEventBus::new()), exchange);
    for config in configs {
        bridge
            .register(config)
            .context("Failed to register correlator")?;
    }

    info!(
        save_root = %args.save_root.display(),
        poll_interval_ms = args.poll_interval_ms,
        malformed_policy = %args.malformed_policy,
        "Launcher bridge ready. Reading triggers from stdin."
    );

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    bridge
        .run(
            BufReader::new(tokio::io::stdin()),
            tokio::io::stdout(),
            shutdown,
        )
        .await?;

    info!("Launcher bridge stopped");
    Ok(())
}
