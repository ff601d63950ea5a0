//! Read model handed to subscribers

use crate::models::{CareRecord, CareReminder, DashboardStats, Tree, TreeUpdate};
use crate::stats::local_stats;
use chrono::{DateTime, NaiveDate, Utc};
use std::fmt;

/// The four independently refreshed parts of the dashboard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollectionKind {
    Trees,
    CareRecords,
    Reminders,
    Stats,
}

impl CollectionKind {
    pub const ALL: [CollectionKind; 4] = [
        CollectionKind::Trees,
        CollectionKind::CareRecords,
        CollectionKind::Reminders,
        CollectionKind::Stats,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trees => "trees",
            Self::CareRecords => "care_records",
            Self::Reminders => "reminders",
            Self::Stats => "stats",
        }
    }
}

impl fmt::Display for CollectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Idle → Loading → {Loaded, Errored}, back to Loading on every call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Phase {
    #[default]
    Idle,
    Loading,
    Loaded,
    Errored,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SlotStatus {
    pub phase: Phase,
    /// Calls against this slot that have not settled yet
    pub in_flight: u32,
}

/// Bookkeeping for one slot
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct SlotMeta {
    pub(crate) status: SlotStatus,
    /// Bumped by every refresh start
    pub(crate) generation: u64,
    /// Generation of the last refresh whose result was applied. An older
    /// response arriving later is discarded.
    pub(crate) applied: u64,
    /// Refreshes that have not settled yet
    pub(crate) refreshing: u32,
    /// Count of applied mutations, used to order the journal
    pub(crate) mutations: u64,
}

impl SlotMeta {
    pub(crate) fn begin(&mut self) {
        self.status.in_flight += 1;
        self.status.phase = Phase::Loading;
    }

    pub(crate) fn settle(&mut self, ok: bool) {
        self.status.in_flight = self.status.in_flight.saturating_sub(1);
        if self.status.in_flight == 0 {
            self.status.phase = if ok { Phase::Loaded } else { Phase::Errored };
        }
    }
}

/// A local mutation that must survive a refresh which started before it
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Replay {
    UpsertTree(Tree),
    MergeTree { id: String, update: TreeUpdate },
    RemoveTree(String),
    UpsertCareRecord(CareRecord),
    CompleteReminder(String),
}

impl Replay {
    pub(crate) fn kind(&self) -> CollectionKind {
        match self {
            Self::UpsertTree(_) | Self::MergeTree { .. } | Self::RemoveTree(_) => {
                CollectionKind::Trees
            }
            Self::UpsertCareRecord(_) => CollectionKind::CareRecords,
            Self::CompleteReminder(_) => CollectionKind::Reminders,
        }
    }

    /// Idempotent: applying twice equals applying once
    pub(crate) fn apply(&self, snapshot: &mut DashboardSnapshot) {
        match self {
            Self::UpsertTree(tree) => {
                let trees = &mut snapshot.trees.value;
                trees.retain(|t| t.id != tree.id);
                trees.insert(0, tree.clone());
            }
            Self::MergeTree { id, update } => {
                if let Some(tree) = snapshot.trees.value.iter_mut().find(|t| &t.id == id) {
                    update.apply_to(tree);
                }
            }
            Self::RemoveTree(id) => snapshot.trees.value.retain(|t| &t.id != id),
            Self::UpsertCareRecord(record) => {
                let records = &mut snapshot.care_records.value;
                records.retain(|r| r.id != record.id);
                records.insert(0, record.clone());
            }
            Self::CompleteReminder(id) => {
                if let Some(reminder) = snapshot.reminders.value.iter_mut().find(|r| &r.id == id) {
                    reminder.is_completed = true;
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Journaled {
    pub(crate) seq: u64,
    pub(crate) op: Replay,
}

/// A value plus its load status
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Slot<T> {
    pub(crate) value: T,
    pub(crate) meta: SlotMeta,
}

impl<T> Slot<T> {
    pub fn value(&self) -> &T {
        &self.value
    }

    pub fn status(&self) -> SlotStatus {
        self.meta.status
    }

    pub fn is_loading(&self) -> bool {
        self.meta.status.in_flight > 0
    }
}

/// Everything the dashboard shows, as one immutable value
///
/// A new snapshot is published after every state transition. The previous
/// contents stay visible while a refresh is in flight.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DashboardSnapshot {
    pub(crate) trees: Slot<Vec<Tree>>,
    pub(crate) care_records: Slot<Vec<CareRecord>>,
    pub(crate) reminders: Slot<Vec<CareReminder>>,
    pub(crate) stats: Slot<Option<DashboardStats>>,
    pub(crate) error: Option<String>,
    pub(crate) authenticated: bool,
    /// Bumped on every sign-in and sign-out; responses from an older epoch
    /// are dropped.
    pub(crate) epoch: u64,
    /// Mutations applied while a refresh of the same slot was in flight
    pub(crate) journal: Vec<Journaled>,
}

impl DashboardSnapshot {
    pub fn trees(&self) -> &[Tree] {
        &self.trees.value
    }

    pub fn care_records(&self) -> &[CareRecord] {
        &self.care_records.value
    }

    pub fn reminders(&self) -> &[CareReminder] {
        &self.reminders.value
    }

    /// Server stats, `None` until the first successful fetch
    pub fn stats(&self) -> Option<&DashboardStats> {
        self.stats.value.as_ref()
    }

    /// Last recorded error. A newer failure replaces an older one.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// True while any slot has a call in flight
    pub fn is_loading(&self) -> bool {
        self.trees.is_loading()
            || self.care_records.is_loading()
            || self.reminders.is_loading()
            || self.stats.is_loading()
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    pub fn status(&self, kind: CollectionKind) -> SlotStatus {
        self.meta(kind).status
    }

    pub fn tree(&self, id: &str) -> Option<&Tree> {
        self.trees.value.iter().find(|t| t.id == id)
    }

    pub fn care_records_for<'a>(&'a self, tree_id: &'a str) -> impl Iterator<Item = &'a CareRecord> + 'a {
        self.care_records.value.iter().filter(move |r| r.tree_id == tree_id)
    }

    pub fn pending_reminders(&self) -> impl Iterator<Item = &CareReminder> {
        self.reminders.value.iter().filter(|r| !r.is_completed)
    }

    pub fn overdue_reminders(&self, now: DateTime<Utc>) -> impl Iterator<Item = &CareReminder> {
        self.reminders.value.iter().filter(move |r| r.is_overdue(now))
    }

    /// Server stats when present, otherwise computed from local collections
    pub fn effective_stats(&self, today: NaiveDate) -> DashboardStats {
        match self.stats.value {
            Some(ref stats) => stats.clone(),
            None => local_stats(&self.trees.value, &self.care_records.value, today),
        }
    }

    pub(crate) fn meta(&self, kind: CollectionKind) -> &SlotMeta {
        match kind {
            CollectionKind::Trees => &self.trees.meta,
            CollectionKind::CareRecords => &self.care_records.meta,
            CollectionKind::Reminders => &self.reminders.meta,
            CollectionKind::Stats => &self.stats.meta,
        }
    }

    pub(crate) fn meta_mut(&mut self, kind: CollectionKind) -> &mut SlotMeta {
        match kind {
            CollectionKind::Trees => &mut self.trees.meta,
            CollectionKind::CareRecords => &mut self.care_records.meta,
            CollectionKind::Reminders => &mut self.reminders.meta,
            CollectionKind::Stats => &mut self.stats.meta,
        }
    }

    /// Re-apply journaled mutations newer than `since` on top of a fresh list
    pub(crate) fn replay_since(&mut self, kind: CollectionKind, since: u64) {
        let ops: Vec<Replay> = self
            .journal
            .iter()
            .filter(|j| j.op.kind() == kind && j.seq > since)
            .map(|j| j.op.clone())
            .collect();
        for op in &ops {
            op.apply(self);
        }
    }

    /// Drop every collection and start a new epoch
    pub(crate) fn clear_session(&mut self) {
        let epoch = self.epoch + 1;
        *self = Self {
            epoch,
            ..Self::default()
        };
    }
}
