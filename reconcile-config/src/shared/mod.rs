//! Shared configuration types for reconciliation runs.

mod base;
mod batch;
mod connection;
mod reconciler;
mod sync;
mod table;

pub use base::ValidationError;
pub use batch::BatchConfig;
pub use connection::{
    IntoConnectOptions, MySqlConnectionConfig, MySqlConnectionConfigWithoutSecrets, TlsConfig,
};
pub use reconciler::{ReconcilerConfig, ReconcilerConfigWithoutSecrets};
pub use sync::{SyncConfig, Transcoding, default_transcoding};
pub use table::{
    DestinationTableConfig, DestinationTableConfigWithoutSecrets, SourceTableConfig,
    SourceTableConfigWithoutSecrets,
};
