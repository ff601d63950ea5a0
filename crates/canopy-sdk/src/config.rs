//! SDK configuration
//!
//! Loaded from TOML:
//!
//! ```toml
//! [api]
//! base_url = "https://canopy.example.org/api"
//! timeout_ms = 10000
//!
//! [credentials]
//! token_path = "/home/me/.canopy/token"
//!
//! [dashboard]
//! tree_page_limit = 50
//! tree_sort_by = "createdAt"
//! tree_sort_order = "desc"
//! care_record_limit = 50
//! tree_add_reconcile = "prepend"
//! ```

use crate::error::{Result, SdkError};
use crate::models::SortOrder;
use crate::repository::{CareRecordQuery, ReminderQuery, TreeListParams};
use canopy_client::GatewayConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CanopyConfig {
    #[serde(default)]
    pub api: GatewayConfig,
    #[serde(default)]
    pub credentials: CredentialsConfig,
    #[serde(default)]
    pub dashboard: DashboardConfig,
}

impl CanopyConfig {
    /// Read a config file, falling back to defaults when it does not exist
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::info!("Config file {} not found, using defaults", path.display());
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .map_err(|e| SdkError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CredentialsConfig {
    /// File holding the bearer token
    #[serde(default = "default_token_path")]
    pub token_path: PathBuf,
}

impl Default for CredentialsConfig {
    fn default() -> Self {
        Self {
            token_path: default_token_path(),
        }
    }
}

fn default_token_path() -> PathBuf {
    std::env::var_os("HOME")
        .map(|home| PathBuf::from(home).join(".canopy").join("token"))
        .unwrap_or_else(|| PathBuf::from(".canopy-token"))
}

/// How a newly added entity lands in the local collection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReconcileStrategy {
    /// Insert the server's echo of the created entity at the front
    #[default]
    Prepend,
    /// Re-fetch the whole collection
    Refetch,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardConfig {
    /// Page size for the tree list; 0 is treated as 1
    #[serde(default = "default_page_limit")]
    pub tree_page_limit: u32,

    #[serde(default = "default_tree_sort_by")]
    pub tree_sort_by: Option<String>,

    #[serde(default)]
    pub tree_sort_order: SortOrder,

    #[serde(default = "default_page_limit")]
    pub care_record_limit: u32,

    /// Include completed reminders in the reminder list
    #[serde(default = "default_true")]
    pub include_completed_reminders: bool,

    #[serde(default)]
    pub tree_add_reconcile: ReconcileStrategy,
}

fn default_page_limit() -> u32 { 50 }
fn default_tree_sort_by() -> Option<String> { Some("createdAt".to_string()) }
fn default_true() -> bool { true }

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            tree_page_limit: default_page_limit(),
            tree_sort_by: default_tree_sort_by(),
            tree_sort_order: SortOrder::default(),
            care_record_limit: default_page_limit(),
            include_completed_reminders: true,
            tree_add_reconcile: ReconcileStrategy::default(),
        }
    }
}

impl DashboardConfig {
    pub fn tree_list_params(&self) -> TreeListParams {
        TreeListParams {
            page: 1,
            limit: self.tree_page_limit.max(1),
            sort_by: self.tree_sort_by.clone(),
            sort_order: self.tree_sort_order,
        }
    }

    pub fn care_record_query(&self) -> CareRecordQuery {
        CareRecordQuery {
            page: Some(1),
            limit: Some(self.care_record_limit.max(1)),
            ..Default::default()
        }
    }

    pub fn reminder_query(&self) -> ReminderQuery {
        ReminderQuery {
            is_completed: (!self.include_completed_reminders).then_some(false),
            ..Default::default()
        }
    }
}
