//! In-memory repositories for tests
//!
//! Each mock keeps its own "server-side" collection and can be scripted to
//! fail, refuse, or answer late.

use super::{
    Acknowledgement, AnalyticsKind, CareRecordQuery, CareRecordRepository, Page, ReminderQuery,
    ReminderRepository, Repositories, StatsProvider, TreeListParams, TreeRepository,
};
use crate::error::{Result, SdkError};
use crate::models::{
    CareRecord, CareReminder, DashboardStats, NewCareRecord, NewTree, Tree, TreeUpdate,
};
use async_trait::async_trait;
use canopy_client::{ClientError, Pagination, Query};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Scripted behaviour shared by every mock
#[derive(Debug, Default)]
pub struct MockBehaviour {
    failure: Mutex<Option<String>>,
    delays: Mutex<VecDeque<Duration>>,
    calls: AtomicU32,
}

impl MockBehaviour {
    /// Fail every following call with a server error carrying `message`
    pub fn fail_with(&self, message: impl Into<String>) {
        *lock(&self.failure) = Some(message.into());
    }

    /// Stop failing
    pub fn recover(&self) {
        *lock(&self.failure) = None;
    }

    /// Delay the next call by `delay`; queued delays apply in order
    pub fn delay_next(&self, delay: Duration) {
        lock(&self.delays).push_back(delay);
    }

    pub fn call_count(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn reset_call_count(&self) {
        self.calls.store(0, Ordering::SeqCst);
    }

    async fn enter(&self) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let delay = lock(&self.delays).pop_front();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let failure = lock(&self.failure).clone();
        match failure {
            Some(message) => Err(SdkError::Client(ClientError::Server {
                status: 500,
                message,
            })),
            None => Ok(()),
        }
    }
}

fn paginate<T: Clone>(items: &[T], page: u32, limit: u32) -> Page<T> {
    let page = page.max(1);
    let limit = limit.max(1);
    let start = ((page as u64 - 1) * limit as u64).min(usize::MAX as u64) as usize;
    let slice: Vec<T> = items.iter().skip(start).take(limit as usize).cloned().collect();
    let total = items.len() as u64;
    let total_pages = total.div_ceil(limit as u64) as u32;
    Page {
        items: slice,
        pagination: Pagination {
            page,
            limit,
            total,
            total_pages,
            has_next: page < total_pages,
            has_prev: page > 1,
        },
    }
}

// ==================== Trees ====================

#[derive(Debug, Default)]
pub struct MockTreeRepository {
    trees: Mutex<Vec<Tree>>,
    delete_refusal: Mutex<Option<String>>,
    next_id: AtomicU32,
    behaviour: MockBehaviour,
}

impl MockTreeRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_trees(trees: Vec<Tree>) -> Self {
        let repo = Self::default();
        repo.set_trees(trees);
        repo
    }

    /// Replace the server-side collection
    pub fn set_trees(&self, trees: Vec<Tree>) {
        *lock(&self.trees) = trees;
    }

    pub fn trees(&self) -> Vec<Tree> {
        lock(&self.trees).clone()
    }

    /// Answer deletes with `success: false` and this message
    pub fn refuse_deletes(&self, message: impl Into<String>) {
        *lock(&self.delete_refusal) = Some(message.into());
    }

    pub fn behaviour(&self) -> &MockBehaviour {
        &self.behaviour
    }
}

#[async_trait]
impl TreeRepository for MockTreeRepository {
    async fn list(&self, params: &TreeListParams) -> Result<Page<Tree>> {
        let snapshot = self.trees();
        self.behaviour.enter().await?;
        Ok(paginate(&snapshot, params.page, params.limit))
    }

    async fn add(&self, tree: &NewTree) -> Result<Tree> {
        self.behaviour.enter().await?;
        let n = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let created = Tree {
            id: format!("tree-{}", n),
            name: tree.name.clone(),
            species: tree.species.clone(),
            location: tree.location.clone(),
            plant_date: tree.plant_date.clone(),
            height: tree.height,
            diameter: tree.diameter,
            health_status: tree.health_status,
            last_watered: None,
            last_fertilized: None,
            notes: tree.notes.clone(),
            carbon_absorbed: 0.0,
        };
        lock(&self.trees).insert(0, created.clone());
        Ok(created)
    }

    async fn update(&self, id: &str, update: &TreeUpdate) -> Result<Tree> {
        self.behaviour.enter().await?;
        let mut trees = lock(&self.trees);
        let tree = trees
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| SdkError::Rejected("Tree not found".into()))?;
        update.apply_to(tree);
        Ok(tree.clone())
    }

    async fn delete(&self, id: &str) -> Result<Acknowledgement> {
        self.behaviour.enter().await?;
        if let Some(message) = lock(&self.delete_refusal).clone() {
            return Ok(Acknowledgement {
                success: false,
                message: Some(message),
            });
        }
        let mut trees = lock(&self.trees);
        let before = trees.len();
        trees.retain(|t| t.id != id);
        if trees.len() == before {
            return Ok(Acknowledgement {
                success: false,
                message: Some("Tree not found".into()),
            });
        }
        Ok(Acknowledgement {
            success: true,
            message: Some("Tree deleted successfully".into()),
        })
    }
}

// ==================== Care records ====================

#[derive(Debug, Default)]
pub struct MockCareRecordRepository {
    records: Mutex<Vec<CareRecord>>,
    next_id: AtomicU32,
    behaviour: MockBehaviour,
}

impl MockCareRecordRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: Vec<CareRecord>) -> Self {
        let repo = Self::default();
        repo.set_records(records);
        repo
    }

    pub fn set_records(&self, records: Vec<CareRecord>) {
        *lock(&self.records) = records;
    }

    pub fn records(&self) -> Vec<CareRecord> {
        lock(&self.records).clone()
    }

    pub fn behaviour(&self) -> &MockBehaviour {
        &self.behaviour
    }
}

#[async_trait]
impl CareRecordRepository for MockCareRecordRepository {
    async fn list(&self, query: &CareRecordQuery) -> Result<Page<CareRecord>> {
        let matching: Vec<CareRecord> = self
            .records()
            .into_iter()
            .filter(|r| query.tree_id.as_ref().map_or(true, |id| &r.tree_id == id))
            .filter(|r| query.action.map_or(true, |a| r.action == a))
            .collect();
        self.behaviour.enter().await?;
        Ok(paginate(
            &matching,
            query.page.unwrap_or(1),
            query.limit.unwrap_or(u32::MAX),
        ))
    }

    async fn add(&self, record: &NewCareRecord) -> Result<CareRecord> {
        self.behaviour.enter().await?;
        let n = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let created = CareRecord {
            id: format!("care-{}", n),
            tree_id: record.tree_id.clone(),
            date: record
                .date
                .clone()
                .unwrap_or_else(|| chrono::Utc::now().to_rfc3339()),
            action: record.action,
            notes: record.notes.clone(),
            health_rating: record.health_rating,
        };
        lock(&self.records).insert(0, created.clone());
        Ok(created)
    }
}

// ==================== Reminders ====================

#[derive(Debug, Default)]
pub struct MockReminderRepository {
    reminders: Mutex<Vec<CareReminder>>,
    behaviour: MockBehaviour,
}

impl MockReminderRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_reminders(reminders: Vec<CareReminder>) -> Self {
        let repo = Self::default();
        repo.set_reminders(reminders);
        repo
    }

    pub fn set_reminders(&self, reminders: Vec<CareReminder>) {
        *lock(&self.reminders) = reminders;
    }

    pub fn reminders(&self) -> Vec<CareReminder> {
        lock(&self.reminders).clone()
    }

    pub fn behaviour(&self) -> &MockBehaviour {
        &self.behaviour
    }
}

#[async_trait]
impl ReminderRepository for MockReminderRepository {
    async fn list(&self, query: &ReminderQuery) -> Result<Vec<CareReminder>> {
        let now = chrono::Utc::now();
        let matching = self
            .reminders()
            .into_iter()
            .filter(|r| query.reminder_type.map_or(true, |t| r.reminder_type == t))
            .filter(|r| query.is_completed.map_or(true, |c| r.is_completed == c))
            .filter(|r| query.overdue.map_or(true, |o| r.is_overdue(now) == o))
            .collect();
        self.behaviour.enter().await?;
        Ok(matching)
    }

    async fn complete(&self, id: &str) -> Result<CareReminder> {
        self.behaviour.enter().await?;
        let mut reminders = lock(&self.reminders);
        let reminder = reminders
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| SdkError::Rejected("Reminder not found".into()))?;
        reminder.is_completed = true;
        Ok(reminder.clone())
    }
}

// ==================== Stats ====================

#[derive(Debug, Default)]
pub struct MockStatsProvider {
    stats: Mutex<DashboardStats>,
    behaviour: MockBehaviour,
}

impl MockStatsProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_stats(stats: DashboardStats) -> Self {
        Self {
            stats: Mutex::new(stats),
            behaviour: MockBehaviour::default(),
        }
    }

    pub fn set_stats(&self, stats: DashboardStats) {
        *lock(&self.stats) = stats;
    }

    pub fn behaviour(&self) -> &MockBehaviour {
        &self.behaviour
    }
}

#[async_trait]
impl StatsProvider for MockStatsProvider {
    async fn stats(&self) -> Result<DashboardStats> {
        let snapshot = lock(&self.stats).clone();
        self.behaviour.enter().await?;
        Ok(snapshot)
    }

    async fn analytics(&self, kind: AnalyticsKind, params: &Query) -> Result<serde_json::Value> {
        self.behaviour.enter().await?;
        Ok(serde_json::json!({
            "kind": kind.path(),
            "params": params.to_string(),
            "series": [],
        }))
    }
}

/// A full set of mocks plus handles to script them
#[derive(Clone, Default)]
pub struct MockRepositories {
    pub trees: Arc<MockTreeRepository>,
    pub care_records: Arc<MockCareRecordRepository>,
    pub reminders: Arc<MockReminderRepository>,
    pub stats: Arc<MockStatsProvider>,
}

impl MockRepositories {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn repositories(&self) -> Repositories {
        Repositories {
            trees: self.trees.clone(),
            care_records: self.care_records.clone(),
            reminders: self.reminders.clone(),
            stats: self.stats.clone(),
        }
    }
}
