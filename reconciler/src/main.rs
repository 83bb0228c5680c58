//! Table reconciler binary.
//!
//! Runs one reconciliation pass of the configured destination table against its source and
//! exits. The exit status is non-zero when loading configuration, connecting, reading or
//! diffing failed, or when any mutation of the pass failed.

use std::process::ExitCode;

use reconcile_config::Environment;
use reconcile_config::shared::ReconcilerConfig;
use reconcile_telemetry::tracing::init_tracing;
use tracing::error;

use crate::config::load_reconciler_config;
use crate::core::run_reconciler_with_config;
use crate::error::{ReconcilerError, ReconcilerResult};

mod config;
mod core;
mod error;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprint!("{}", err.render_report());
            ExitCode::FAILURE
        }
    }
}

/// Loads configuration, initializes tracing and runs the pass on a current-thread runtime.
fn run() -> ReconcilerResult<()> {
    let reconciler_config = load_reconciler_config()?;

    let environment = Environment::load()?;
    let _log_flusher =
        init_tracing(env!("CARGO_BIN_NAME"), environment).map_err(ReconcilerError::config)?;

    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?
        .block_on(async_main(reconciler_config))
}

async fn async_main(reconciler_config: ReconcilerConfig) -> ReconcilerResult<()> {
    if let Err(err) = run_reconciler_with_config(reconciler_config).await {
        error!("{err}");
        return Err(err);
    }

    Ok(())
}
