//! Dashboard state container
//!
//! Owns the in-memory copies of trees, care records, reminders and stats for
//! the signed-in user. Presentation code reads [`DashboardSnapshot`]s from
//! [`DashboardStore::subscribe`] and calls the mutation methods, which all
//! report success as a `bool` and record failures in the shared error field
//! instead of returning them.
//!
//! Every state transition is a single `watch` update: subscribers never see
//! a half-applied refresh.

mod snapshot;

pub use snapshot::{CollectionKind, DashboardSnapshot, Phase, Slot, SlotStatus};

use snapshot::{Journaled, Replay};

use crate::config::{DashboardConfig, ReconcileStrategy};
use crate::error::{Result, SdkError};
use crate::models::{NewCareRecord, NewTree, TreeUpdate};
use crate::repository::{AnalyticsKind, CareRecordQuery, Repositories};
use canopy_client::Query;
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Captured when a call starts, checked when it settles
#[derive(Debug, Clone, Copy)]
struct Ticket {
    kind: CollectionKind,
    epoch: u64,
    generation: u64,
    /// Mutations already applied when the call started
    mutations: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CallKind {
    /// Full replace; dropped only if a newer refresh was applied first
    Refresh,
    /// Local reconcile of a write; always applied within the same session
    Mutation,
}

/// Observable dashboard store
///
/// # Example
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use canopy_client::{Gateway, GatewayConfig, MemoryCredentialStore};
/// use canopy_sdk::{DashboardConfig, DashboardStore, Repositories};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let credentials = Arc::new(MemoryCredentialStore::with_token("secret"));
/// let gateway = Arc::new(Gateway::new(GatewayConfig::default(), credentials)?);
/// let store = DashboardStore::new(Repositories::http(gateway), DashboardConfig::default());
///
/// let mut updates = store.subscribe();
/// store.set_authenticated(true).await;
///
/// let snapshot = updates.borrow_and_update().clone();
/// println!("{} trees, loading: {}", snapshot.trees().len(), snapshot.is_loading());
/// # Ok(())
/// # }
/// ```
pub struct DashboardStore {
    repos: Repositories,
    config: DashboardConfig,
    state: watch::Sender<DashboardSnapshot>,
}

impl DashboardStore {
    pub fn new(repos: Repositories, config: DashboardConfig) -> Self {
        let (state, _) = watch::channel(DashboardSnapshot::default());
        Self {
            repos,
            config,
            state,
        }
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    // ==================== Consumer contract ====================

    /// Receiver that is notified after every state transition
    pub fn subscribe(&self) -> watch::Receiver<DashboardSnapshot> {
        self.state.subscribe()
    }

    /// Copy of the current state
    pub fn snapshot(&self) -> DashboardSnapshot {
        self.state.borrow().clone()
    }

    /// Reset the shared error field. Safe to call when there is no error.
    pub fn clear_error(&self) {
        self.state.send_if_modified(|s| s.error.take().is_some());
    }

    // ==================== Session ====================

    /// Follow the authentication state.
    ///
    /// Signing in loads all four slots concurrently. Signing out clears every
    /// slot before returning and discards any response still in flight.
    /// Repeating the current state does nothing.
    pub async fn set_authenticated(&self, authenticated: bool) {
        let changed = self.state.send_if_modified(|s| {
            if s.authenticated == authenticated {
                return false;
            }
            if authenticated {
                s.epoch += 1;
                s.authenticated = true;
            } else {
                s.clear_session();
            }
            true
        });

        if !changed {
            return;
        }
        if authenticated {
            info!("Session started, loading dashboard");
            self.refresh_all().await;
        } else {
            info!("Session ended, dashboard cleared");
        }
    }

    /// Refresh all four slots concurrently; true if every refresh succeeded
    pub async fn refresh_all(&self) -> bool {
        let (trees, care, reminders, stats) = tokio::join!(
            self.refresh_trees(),
            self.refresh_care_records(),
            self.refresh_reminders(),
            self.refresh_stats(),
        );
        trees && care && reminders && stats
    }

    // ==================== Refresh ====================

    pub async fn refresh_trees(&self) -> bool {
        let ticket = self.begin(CollectionKind::Trees, CallKind::Refresh);
        let params = self.config.tree_list_params();
        let result = self.repos.trees.list(&params).await.map(|page| page.items);
        self.settle_refresh(ticket, result, |s, trees| s.trees.value = trees)
    }

    pub async fn refresh_care_records(&self) -> bool {
        let query = self.config.care_record_query();
        self.refresh_care_records_with(&query).await
    }

    /// Replace the care-record slot with the result of a custom query
    pub async fn refresh_care_records_with(&self, query: &CareRecordQuery) -> bool {
        let ticket = self.begin(CollectionKind::CareRecords, CallKind::Refresh);
        let result = self.repos.care_records.list(query).await.map(|page| page.items);
        self.settle_refresh(ticket, result, |s, records| {
            s.care_records.value = records
        })
    }

    pub async fn refresh_reminders(&self) -> bool {
        let ticket = self.begin(CollectionKind::Reminders, CallKind::Refresh);
        let query = self.config.reminder_query();
        let result = self.repos.reminders.list(&query).await;
        self.settle_refresh(ticket, result, |s, reminders| {
            s.reminders.value = reminders
        })
    }

    pub async fn refresh_stats(&self) -> bool {
        let ticket = self.begin(CollectionKind::Stats, CallKind::Refresh);
        let result = self.repos.stats.stats().await;
        self.settle_refresh(ticket, result, |s, stats| {
            s.stats.value = Some(stats)
        })
    }

    // ==================== Trees ====================

    pub async fn add_tree(&self, tree: &NewTree) -> bool {
        if let Err(e) = tree.validate() {
            return self.reject(e);
        }

        let ticket = self.begin(CollectionKind::Trees, CallKind::Mutation);
        let result = self.repos.trees.add(tree).await;

        match self.config.tree_add_reconcile {
            ReconcileStrategy::Prepend => {
                self.settle_mutation(ticket, result, |created| Some(Replay::UpsertTree(created)))
            }
            ReconcileStrategy::Refetch => {
                let added = self.settle_mutation(ticket, result, |_| None);
                if added {
                    self.refresh_trees().await;
                }
                added
            }
        }
    }

    /// Send a partial update and merge the same fields into the local copy
    pub async fn update_tree(&self, id: &str, update: &TreeUpdate) -> bool {
        if let Err(e) = update.validate() {
            return self.reject(e);
        }

        let ticket = self.begin(CollectionKind::Trees, CallKind::Mutation);
        let result = self.repos.trees.update(id, update).await;
        self.settle_mutation(ticket, result, |_server_copy| {
            Some(Replay::MergeTree {
                id: id.to_string(),
                update: update.clone(),
            })
        })
    }

    /// The tree leaves the local collection only once the server confirms
    pub async fn delete_tree(&self, id: &str) -> bool {
        let ticket = self.begin(CollectionKind::Trees, CallKind::Mutation);
        let result = self.repos.trees.delete(id).await.and_then(|ack| {
            if ack.success {
                Ok(())
            } else {
                Err(SdkError::Rejected(
                    ack.message.unwrap_or_else(|| "Failed to delete tree".to_string()),
                ))
            }
        });
        self.settle_mutation(ticket, result, |()| Some(Replay::RemoveTree(id.to_string())))
    }

    // ==================== Care records ====================

    pub async fn add_care_record(&self, record: &NewCareRecord) -> bool {
        if let Err(e) = record.validate() {
            return self.reject(e);
        }

        let ticket = self.begin(CollectionKind::CareRecords, CallKind::Mutation);
        let result = self.repos.care_records.add(record).await;
        self.settle_mutation(ticket, result, |created| Some(Replay::UpsertCareRecord(created)))
    }

    // ==================== Reminders ====================

    /// One-way: a completed reminder is never reopened here
    pub async fn mark_reminder_completed(&self, id: &str) -> bool {
        let ticket = self.begin(CollectionKind::Reminders, CallKind::Mutation);
        let result = self.repos.reminders.complete(id).await;
        self.settle_mutation(ticket, result, |_server_copy| {
            Some(Replay::CompleteReminder(id.to_string()))
        })
    }

    // ==================== Analytics ====================

    /// Fetch a chart payload. Not cached; failures land in the error field.
    pub async fn analytics(&self, kind: AnalyticsKind, params: &Query) -> Option<serde_json::Value> {
        self.clear_error();
        match self.repos.stats.analytics(kind, params).await {
            Ok(payload) => Some(payload),
            Err(e) => {
                self.reject(e);
                None
            }
        }
    }

    // ==================== Transitions ====================

    /// Clear the error and mark the slot as loading. A refresh claims a new
    /// generation.
    fn begin(&self, kind: CollectionKind, call: CallKind) -> Ticket {
        let mut ticket = Ticket {
            kind,
            epoch: 0,
            generation: 0,
            mutations: 0,
        };
        self.state.send_modify(|s| {
            s.error = None;
            let meta = s.meta_mut(kind);
            if call == CallKind::Refresh {
                meta.generation += 1;
                meta.refreshing += 1;
            }
            meta.begin();
            ticket.generation = meta.generation;
            ticket.mutations = meta.mutations;
            ticket.epoch = s.epoch;
        });
        debug!(slot = %kind, generation = ticket.generation, ?call, "call started");
        ticket
    }

    /// Replace a slot with a refresh result as one update.
    ///
    /// Mutations applied after the refresh started are replayed on top of
    /// the server's list, so a write that overlaps a refresh is not lost.
    /// Returns false only when the refresh itself failed.
    fn settle_refresh<T>(
        &self,
        ticket: Ticket,
        result: Result<T>,
        apply: impl FnOnce(&mut DashboardSnapshot, T),
    ) -> bool {
        let mut outcome = false;

        self.state.send_if_modified(|s| {
            if s.epoch != ticket.epoch {
                warn!(slot = %ticket.kind, "dropping response from a previous session");
                return false;
            }

            let meta = s.meta_mut(ticket.kind);
            meta.refreshing = meta.refreshing.saturating_sub(1);

            match result {
                Ok(_) if meta.applied > ticket.generation => {
                    // A refresh that started later already landed
                    warn!(
                        slot = %ticket.kind,
                        started = ticket.generation,
                        applied = meta.applied,
                        "dropping superseded refresh"
                    );
                    meta.settle(true);
                    outcome = true;
                }
                Ok(value) => {
                    meta.applied = ticket.generation;
                    meta.settle(true);
                    apply(s, value);
                    s.replay_since(ticket.kind, ticket.mutations);
                    outcome = true;
                }
                Err(e) => {
                    debug!(slot = %ticket.kind, error = %e, "refresh failed");
                    meta.settle(false);
                    s.error = Some(e.user_message());
                }
            }

            if s.meta(ticket.kind).refreshing == 0 {
                s.journal.retain(|j| j.op.kind() != ticket.kind);
            }
            true
        });

        outcome
    }

    /// Reconcile a successful write into the local collection as one update.
    /// `to_replay` turns the server's answer into the local change, if any.
    fn settle_mutation<T>(
        &self,
        ticket: Ticket,
        result: Result<T>,
        to_replay: impl FnOnce(T) -> Option<Replay>,
    ) -> bool {
        let mut outcome = false;

        self.state.send_if_modified(|s| {
            if s.epoch != ticket.epoch {
                warn!(slot = %ticket.kind, "dropping response from a previous session");
                return false;
            }

            match result {
                Ok(value) => {
                    s.meta_mut(ticket.kind).settle(true);
                    if let Some(op) = to_replay(value) {
                        op.apply(s);
                        let meta = s.meta_mut(ticket.kind);
                        meta.mutations += 1;
                        let seq = meta.mutations;
                        if meta.refreshing > 0 {
                            s.journal.push(Journaled { seq, op });
                        }
                    }
                    outcome = true;
                }
                Err(e) => {
                    debug!(slot = %ticket.kind, error = %e, "call failed");
                    s.meta_mut(ticket.kind).settle(false);
                    s.error = Some(e.user_message());
                }
            }
            true
        });

        outcome
    }

    /// Record a failure that never reached the network
    fn reject(&self, err: SdkError) -> bool {
        debug!(error = %err, "rejected before sending");
        self.state.send_modify(|s| s.error = Some(err.user_message()));
        false
    }
}
