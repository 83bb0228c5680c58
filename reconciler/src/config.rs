use reconcile_config::load_config;
use reconcile_config::shared::ReconcilerConfig;

use crate::error::{ReconcilerError, ReconcilerResult};

/// Loads and validates the reconciler configuration.
pub fn load_reconciler_config() -> ReconcilerResult<ReconcilerConfig> {
    let config = load_config::<ReconcilerConfig>().map_err(ReconcilerError::config)?;
    config.validate().map_err(ReconcilerError::config)?;

    Ok(config)
}
