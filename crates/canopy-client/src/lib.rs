//! Rust client for the Canopy dashboard API
//!
//! The [`Gateway`] is the only component that talks HTTP. It attaches the
//! bearer credential from a [`CredentialStore`], enforces the request
//! timeout, and unwraps the `{success, data, message}` envelope every
//! endpoint responds with.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use canopy_client::{Gateway, GatewayConfig, MemoryCredentialStore, Query};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let credentials = Arc::new(MemoryCredentialStore::with_token("secret"));
//! let gateway = Gateway::new(
//!     GatewayConfig {
//!         base_url: "http://localhost:5000/api".into(),
//!         ..Default::default()
//!     },
//!     credentials,
//! )?;
//!
//! let query = Query::new().push("page", 1).push("limit", 20);
//! let response = gateway
//!     .get::<serde_json::Value>(&format!("/dashboard/trees{}", query))
//!     .await?;
//! assert!(response.success);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod credentials;
pub mod error;
pub mod query;
pub mod types;

// Re-export main types
pub use client::Gateway;
pub use credentials::{CredentialStore, FileCredentialStore, MemoryCredentialStore};
pub use error::{ClientError, Result};
pub use query::{encode_segment, Query};
pub use types::*;
