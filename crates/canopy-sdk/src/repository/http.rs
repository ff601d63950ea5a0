//! HTTP-backed repositories

use super::{
    normalize_all, normalize_entity, Acknowledgement, AnalyticsKind, CareRecordQuery,
    CareRecordRepository, Page, ReminderQuery, ReminderRepository, StatsProvider, TreeListParams,
    TreeRepository,
};
use crate::error::{Result, SdkError};
use crate::models::{
    CareRecord, CareReminder, DashboardStats, NewCareRecord, NewTree, Tree, TreeUpdate,
};
use async_trait::async_trait;
use canopy_client::{encode_segment, ApiResponse, Gateway, Pagination, Query};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
struct TreeListData {
    #[serde(default)]
    trees: Vec<Value>,
    #[serde(default)]
    pagination: Pagination,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CareRecordListData {
    #[serde(default)]
    care_records: Vec<Value>,
    #[serde(default)]
    pagination: Pagination,
}

/// Unwrap a 2xx envelope, treating `success: false` as a rejection
fn into_data<T>(response: ApiResponse<T>, what: &'static str) -> Result<T> {
    if !response.success {
        let reason = response
            .reason()
            .map(str::to_string)
            .unwrap_or_else(|| format!("Server did not accept the {} request", what));
        return Err(SdkError::Rejected(reason));
    }
    response.data.ok_or(SdkError::MissingData(what))
}

/// Normalize then decode a single entity
fn decode_entity<T: DeserializeOwned>(value: Value, entity: &'static str) -> Result<T> {
    serde_json::from_value(normalize_entity(value))
        .map_err(|source| SdkError::Decode { entity, source })
}

fn decode_entities<T: DeserializeOwned>(values: Vec<Value>, entity: &'static str) -> Result<Vec<T>> {
    normalize_all(values)
        .into_iter()
        .map(|v| serde_json::from_value(v).map_err(|source| SdkError::Decode { entity, source }))
        .collect()
}

/// Cap a page at the requested limit
fn cap_to_limit<T>(mut items: Vec<T>, limit: Option<u32>, entity: &str) -> Vec<T> {
    if let Some(limit) = limit {
        let limit = limit.max(1) as usize;
        if items.len() > limit {
            tracing::warn!(
                "Server returned {} {} for limit {}, truncating",
                items.len(),
                entity,
                limit
            );
            items.truncate(limit);
        }
    }
    items
}

// ==================== Trees ====================

pub struct HttpTreeRepository {
    gateway: Arc<Gateway>,
}

impl HttpTreeRepository {
    pub fn new(gateway: Arc<Gateway>) -> Self {
        Self { gateway }
    }
}

#[async_trait]
impl TreeRepository for HttpTreeRepository {
    async fn list(&self, params: &TreeListParams) -> Result<Page<Tree>> {
        let endpoint = format!("/dashboard/trees{}", params.to_query());
        let data: TreeListData = into_data(self.gateway.get(&endpoint).await?, "tree list")?;

        let items = decode_entities(data.trees, "tree")?;
        Ok(Page {
            items: cap_to_limit(items, Some(params.limit), "trees"),
            pagination: data.pagination,
        })
    }

    async fn add(&self, tree: &NewTree) -> Result<Tree> {
        let data = into_data(self.gateway.post("/dashboard/trees", tree).await?, "tree")?;
        decode_entity(data, "tree")
    }

    async fn update(&self, id: &str, update: &TreeUpdate) -> Result<Tree> {
        let endpoint = format!("/dashboard/trees/{}", encode_segment(id));
        let data = into_data(self.gateway.put(&endpoint, update).await?, "tree")?;
        decode_entity(data, "tree")
    }

    async fn delete(&self, id: &str) -> Result<Acknowledgement> {
        let endpoint = format!("/dashboard/trees/{}", encode_segment(id));
        let response = self.gateway.delete::<Value>(&endpoint).await?;
        Ok(Acknowledgement {
            success: response.success,
            message: response.reason().map(str::to_string),
        })
    }
}

// ==================== Care records ====================

pub struct HttpCareRecordRepository {
    gateway: Arc<Gateway>,
}

impl HttpCareRecordRepository {
    pub fn new(gateway: Arc<Gateway>) -> Self {
        Self { gateway }
    }
}

#[async_trait]
impl CareRecordRepository for HttpCareRecordRepository {
    async fn list(&self, query: &CareRecordQuery) -> Result<Page<CareRecord>> {
        let endpoint = format!("/dashboard/care-records{}", query.to_query());
        let data: CareRecordListData =
            into_data(self.gateway.get(&endpoint).await?, "care record list")?;

        let items = decode_entities(data.care_records, "care record")?;
        Ok(Page {
            items: cap_to_limit(items, query.limit, "care records"),
            pagination: data.pagination,
        })
    }

    async fn add(&self, record: &NewCareRecord) -> Result<CareRecord> {
        let data = into_data(
            self.gateway.post("/dashboard/care-records", record).await?,
            "care record",
        )?;
        decode_entity(data, "care record")
    }
}

// ==================== Reminders ====================

pub struct HttpReminderRepository {
    gateway: Arc<Gateway>,
}

impl HttpReminderRepository {
    pub fn new(gateway: Arc<Gateway>) -> Self {
        Self { gateway }
    }
}

#[async_trait]
impl ReminderRepository for HttpReminderRepository {
    async fn list(&self, query: &ReminderQuery) -> Result<Vec<CareReminder>> {
        let endpoint = format!("/dashboard/care-reminders{}", query.to_query());
        let data: Vec<Value> = into_data(self.gateway.get(&endpoint).await?, "reminder list")?;
        decode_entities(data, "reminder")
    }

    async fn complete(&self, id: &str) -> Result<CareReminder> {
        let endpoint = format!("/dashboard/care-reminders/{}/complete", encode_segment(id));
        let data = into_data(self.gateway.patch(&endpoint, None).await?, "reminder")?;
        decode_entity(data, "reminder")
    }
}

// ==================== Stats & analytics ====================

pub struct HttpStatsProvider {
    gateway: Arc<Gateway>,
}

impl HttpStatsProvider {
    pub fn new(gateway: Arc<Gateway>) -> Self {
        Self { gateway }
    }
}

#[async_trait]
impl StatsProvider for HttpStatsProvider {
    async fn stats(&self) -> Result<DashboardStats> {
        into_data(self.gateway.get("/dashboard/stats").await?, "stats")
    }

    async fn analytics(&self, kind: AnalyticsKind, params: &Query) -> Result<Value> {
        let endpoint = format!("/dashboard/analytics/{}{}", kind.path(), params);
        into_data(self.gateway.get(&endpoint).await?, "analytics")
    }
}
