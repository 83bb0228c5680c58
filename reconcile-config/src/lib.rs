//! Configuration types and loading for the table reconciler.
//!
//! Configuration is read from `configuration/base.*` and `configuration/{environment}.*` files
//! and then overridden by `APP_`-prefixed environment variables. The resulting
//! [`shared::ReconcilerConfig`] is validated once and then passed explicitly to the pipeline.

mod environment;
mod load;
pub mod shared;

pub use environment::Environment;
pub use load::{LoadConfigError, load_config, load_config_from};
