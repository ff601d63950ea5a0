//! Entity repositories
//!
//! One trait per entity, implemented over HTTP by the `Http*` types and in
//! memory by [`mock`]. Repositories never swallow errors; the dashboard
//! store is the single place failures are recorded.

mod http;
pub mod mock;
mod normalize;

pub use http::{
    HttpCareRecordRepository, HttpReminderRepository, HttpStatsProvider, HttpTreeRepository,
};
pub use normalize::{normalize_all, normalize_entity};

use crate::error::Result;
use crate::models::{
    CareAction, CareRecord, CareReminder, DashboardStats, NewCareRecord, NewTree, ReminderType,
    SortOrder, Tree, TreeUpdate,
};
use async_trait::async_trait;
use canopy_client::{Gateway, Pagination, Query};
use std::fmt;
use std::sync::Arc;

/// One page of a list endpoint
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Passed through from the server unchanged
    pub pagination: Pagination,
}

/// Outcome of a delete call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Acknowledgement {
    pub success: bool,
    pub message: Option<String>,
}

/// Paging and sorting for the tree list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeListParams {
    /// 1-based
    pub page: u32,
    pub limit: u32,
    pub sort_by: Option<String>,
    pub sort_order: SortOrder,
}

impl Default for TreeListParams {
    fn default() -> Self {
        Self {
            page: 1,
            limit: 50,
            sort_by: None,
            sort_order: SortOrder::Desc,
        }
    }
}

impl TreeListParams {
    pub fn to_query(&self) -> Query {
        Query::new()
            .push("page", self.page.max(1))
            .push("limit", self.limit.max(1))
            .push_opt("sortBy", self.sort_by.as_deref())
            .push("sortOrder", self.sort_order)
    }
}

/// Filters for the care-record list
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CareRecordQuery {
    pub tree_id: Option<String>,
    pub action: Option<CareAction>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl CareRecordQuery {
    pub fn for_tree(tree_id: impl Into<String>) -> Self {
        Self {
            tree_id: Some(tree_id.into()),
            ..Default::default()
        }
    }

    pub fn to_query(&self) -> Query {
        Query::new()
            .push_opt("treeId", self.tree_id.as_deref())
            .push_opt("action", self.action)
            .push_opt("page", self.page.map(|p| p.max(1)))
            .push_opt("limit", self.limit.map(|l| l.max(1)))
    }
}

/// Filters for the reminder list
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReminderQuery {
    pub reminder_type: Option<ReminderType>,
    pub is_completed: Option<bool>,
    pub overdue: Option<bool>,
}

impl ReminderQuery {
    pub fn to_query(&self) -> Query {
        Query::new()
            .push_opt("type", self.reminder_type)
            .push_opt("isCompleted", self.is_completed)
            .push_opt("overdue", self.overdue)
    }
}

/// Chart-shaped analytics reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnalyticsKind {
    GrowthTrend,
    Report,
    Community,
}

impl AnalyticsKind {
    /// Path segment under `/dashboard/analytics/`
    pub fn path(&self) -> &'static str {
        match self {
            Self::GrowthTrend => "growth-trend",
            Self::Report => "report",
            Self::Community => "community",
        }
    }

    pub fn from_path(s: &str) -> Option<Self> {
        match s {
            "growth-trend" | "growth" => Some(Self::GrowthTrend),
            "report" => Some(Self::Report),
            "community" => Some(Self::Community),
            _ => None,
        }
    }
}

impl fmt::Display for AnalyticsKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

#[async_trait]
pub trait TreeRepository: Send + Sync {
    async fn list(&self, params: &TreeListParams) -> Result<Page<Tree>>;

    async fn add(&self, tree: &NewTree) -> Result<Tree>;

    async fn update(&self, id: &str, update: &TreeUpdate) -> Result<Tree>;

    /// A refusal the server reports with `success: false` comes back as
    /// `Ok` with `success == false`, not as an error.
    async fn delete(&self, id: &str) -> Result<Acknowledgement>;
}

#[async_trait]
pub trait CareRecordRepository: Send + Sync {
    async fn list(&self, query: &CareRecordQuery) -> Result<Page<CareRecord>>;

    async fn add(&self, record: &NewCareRecord) -> Result<CareRecord>;
}

#[async_trait]
pub trait ReminderRepository: Send + Sync {
    async fn list(&self, query: &ReminderQuery) -> Result<Vec<CareReminder>>;

    /// Mark a reminder done; returns the server's copy
    async fn complete(&self, id: &str) -> Result<CareReminder>;
}

#[async_trait]
pub trait StatsProvider: Send + Sync {
    async fn stats(&self) -> Result<DashboardStats>;

    /// Raw chart payload; its shape depends on `kind`
    async fn analytics(&self, kind: AnalyticsKind, params: &Query) -> Result<serde_json::Value>;
}

/// The four repositories the dashboard store depends on
#[derive(Clone)]
pub struct Repositories {
    pub trees: Arc<dyn TreeRepository>,
    pub care_records: Arc<dyn CareRecordRepository>,
    pub reminders: Arc<dyn ReminderRepository>,
    pub stats: Arc<dyn StatsProvider>,
}

impl Repositories {
    /// HTTP repositories sharing one gateway
    pub fn http(gateway: Arc<Gateway>) -> Self {
        Self {
            trees: Arc::new(HttpTreeRepository::new(gateway.clone())),
            care_records: Arc::new(HttpCareRecordRepository::new(gateway.clone())),
            reminders: Arc::new(HttpReminderRepository::new(gateway.clone())),
            stats: Arc::new(HttpStatsProvider::new(gateway)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tree_params_query() {
        let params = TreeListParams {
            page: 0,
            limit: 20,
            sort_by: Some("plantDate".into()),
            sort_order: SortOrder::Asc,
        };
        assert_eq!(
            params.to_query().to_string(),
            "?page=1&limit=20&sortBy=plantDate&sortOrder=asc"
        );
    }

    #[test]
    fn test_care_query_skips_unset() {
        let q = CareRecordQuery {
            action: Some(CareAction::PestControl),
            ..CareRecordQuery::for_tree("t1")
        };
        assert_eq!(q.to_query().to_string(), "?treeId=t1&action=pest_control");
        assert!(CareRecordQuery::default().to_query().is_empty());
    }

    #[test]
    fn test_reminder_query() {
        let q = ReminderQuery {
            reminder_type: Some(ReminderType::HealthCheck),
            is_completed: Some(false),
            overdue: None,
        };
        assert_eq!(q.to_query().to_string(), "?type=health_check&isCompleted=false");
    }

    #[test]
    fn test_analytics_paths() {
        for kind in [AnalyticsKind::GrowthTrend, AnalyticsKind::Report, AnalyticsKind::Community] {
            assert_eq!(AnalyticsKind::from_path(kind.path()), Some(kind));
        }
        assert_eq!(AnalyticsKind::from_path("weather"), None);
    }
}
