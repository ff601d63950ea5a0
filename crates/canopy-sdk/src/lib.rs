//! Canopy SDK
//!
//! Keeps a client-side copy of a user's tree-tracking dashboard in sync with
//! the Canopy API.
//!
//! - [`repository`]: one async trait per entity, with HTTP and in-memory
//!   implementations
//! - [`store`]: the observable [`DashboardStore`] presentation code reads from
//! - [`models`]: trees, care records, reminders, stats
//! - [`config`]: TOML configuration shared with the CLI
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use canopy_sdk::{CanopyConfig, DashboardStore, FileCredentialStore, Gateway, Repositories};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = CanopyConfig::load("canopy.toml")?;
//! let credentials = Arc::new(FileCredentialStore::new(config.credentials.token_path.clone()));
//! let gateway = Arc::new(Gateway::new(config.api.clone(), credentials)?);
//!
//! let store = DashboardStore::new(Repositories::http(gateway), config.dashboard.clone());
//! store.set_authenticated(true).await;
//!
//! for tree in store.snapshot().trees() {
//!     println!("{} ({})", tree.name, tree.health_status);
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod models;
pub mod repository;
pub mod stats;
pub mod store;

// Re-export main types
pub use config::{CanopyConfig, CredentialsConfig, DashboardConfig, ReconcileStrategy};
pub use error::{Result, SdkError};
pub use models::*;
pub use repository::{
    Acknowledgement, AnalyticsKind, CareRecordQuery, CareRecordRepository, Page, ReminderQuery,
    ReminderRepository, Repositories, StatsProvider, TreeListParams, TreeRepository,
};
pub use store::{CollectionKind, DashboardSnapshot, DashboardStore, Phase, Slot, SlotStatus};

pub use canopy_client::{
    ClientError, CredentialStore, FileCredentialStore, Gateway, GatewayConfig,
    MemoryCredentialStore, Query,
};
