//! Subcommands, their execution and output formatting

use canopy_sdk::{
    AnalyticsKind, CareAction, CareRecord, CareRecordQuery, CareReminder, CredentialStore,
    DashboardConfig, DashboardSnapshot, DashboardStats, DashboardStore, HealthStatus,
    NewCareRecord, NewTree, Query, ReconcileStrategy, ReminderPriority, Repositories, Tree,
    TreeUpdate,
};
use chrono::Utc;
use clap::{Args, Subcommand};
use serde::Serialize;

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store a bearer token for later commands
    Login {
        #[arg(long, env = "CANOPY_TOKEN", hide_env_values = true)]
        token: String,
    },

    /// Forget the stored token
    Logout,

    /// Load the whole dashboard and print a summary
    Sync,

    /// Manage trees
    #[command(subcommand)]
    Trees(TreeCommands),

    /// Care log
    #[command(subcommand)]
    Care(CareCommands),

    /// Care reminders
    #[command(subcommand)]
    Reminders(ReminderCommands),

    /// Show dashboard statistics
    Stats,

    /// Fetch an analytics report (growth-trend, report, community)
    Analytics {
        #[arg(value_parser = parse_analytics_kind)]
        kind: AnalyticsKind,

        /// Extra query parameter, repeatable
        #[arg(short, long = "param", value_name = "KEY=VALUE", value_parser = parse_param)]
        params: Vec<(String, String)>,
    },
}

#[derive(Debug, Subcommand)]
pub enum TreeCommands {
    /// List trees, newest first
    List {
        /// Page size (overrides config file)
        #[arg(short, long)]
        limit: Option<u32>,
    },

    /// Plant a new tree
    Add(NewTreeArgs),

    /// Change some fields of a tree
    Update {
        id: String,
        #[command(flatten)]
        fields: TreeUpdateArgs,
    },

    /// Delete a tree
    Delete { id: String },
}

#[derive(Debug, Args)]
pub struct NewTreeArgs {
    #[arg(long)]
    name: String,
    #[arg(long)]
    species: String,
    #[arg(long, default_value = "")]
    location: String,
    /// YYYY-MM-DD, defaults to today
    #[arg(long)]
    plant_date: Option<String>,
    /// Metres
    #[arg(long)]
    height: f64,
    /// Metres
    #[arg(long)]
    diameter: f64,
    #[arg(long, default_value = "good")]
    health: HealthStatus,
    #[arg(long)]
    notes: Option<String>,
}

#[derive(Debug, Args)]
pub struct TreeUpdateArgs {
    #[arg(long)]
    name: Option<String>,
    #[arg(long)]
    species: Option<String>,
    #[arg(long)]
    location: Option<String>,
    #[arg(long)]
    plant_date: Option<String>,
    #[arg(long)]
    height: Option<f64>,
    #[arg(long)]
    diameter: Option<f64>,
    #[arg(long)]
    health: Option<HealthStatus>,
    #[arg(long)]
    last_watered: Option<String>,
    #[arg(long)]
    last_fertilized: Option<String>,
    #[arg(long)]
    notes: Option<String>,
}

#[derive(Debug, Subcommand)]
pub enum CareCommands {
    /// List care records
    List {
        /// Only records for this tree
        #[arg(long)]
        tree: Option<String>,
        #[arg(long)]
        action: Option<CareAction>,
        #[arg(short, long)]
        limit: Option<u32>,
    },

    /// Log a care action
    Add {
        #[arg(long)]
        tree: String,
        /// watering, fertilizing, pruning, pest-control, other
        #[arg(long)]
        action: CareAction,
        /// 1 (poor) to 5 (thriving)
        #[arg(long)]
        rating: u8,
        /// Defaults to now
        #[arg(long)]
        date: Option<String>,
        #[arg(long)]
        notes: Option<String>,
    },
}

#[derive(Debug, Subcommand)]
pub enum ReminderCommands {
    /// List reminders
    List {
        /// Only incomplete reminders
        #[arg(long)]
        pending: bool,
        /// Only reminders past their due date
        #[arg(long, conflicts_with = "pending")]
        overdue: bool,
    },

    /// Mark a reminder as done
    Complete { id: String },
}

fn parse_analytics_kind(s: &str) -> Result<AnalyticsKind, String> {
    AnalyticsKind::from_path(s)
        .ok_or_else(|| format!("unknown report '{}', expected growth-trend, report or community", s))
}

fn parse_param(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{}'", s))?;
    Ok((key.to_string(), value.to_string()))
}

// ==================== Execution ====================

pub fn login(credentials: &dyn CredentialStore, token: &str) -> Result<String, String> {
    let token = token.trim();
    if token.is_empty() {
        return Err("token is empty".to_string());
    }
    credentials.set_token(token).map_err(|e| e.to_string())?;
    Ok("Token saved".to_string())
}

pub fn logout(credentials: &dyn CredentialStore) -> Result<String, String> {
    credentials.clear().map_err(|e| e.to_string())?;
    Ok("Signed out".to_string())
}

/// Run a command that needs the API
pub async fn execute(
    repos: Repositories,
    mut config: DashboardConfig,
    command: Command,
    json: bool,
) -> Result<String, String> {
    if let Command::Trees(TreeCommands::List { limit: Some(limit) }) = &command {
        config.tree_page_limit = *limit;
    }
    let store = DashboardStore::new(repos, config);

    match command {
        // handled before the store exists
        Command::Login { .. } | Command::Logout => Ok(String::new()),

        Command::Sync => {
            store.set_authenticated(true).await;
            let snapshot = store.snapshot();
            if let Some(error) = snapshot.error() {
                return Err(error.to_string());
            }
            Ok(format_summary(&snapshot))
        }

        Command::Trees(cmd) => execute_trees(&store, cmd, json).await,
        Command::Care(cmd) => execute_care(&store, cmd, json).await,
        Command::Reminders(cmd) => execute_reminders(&store, cmd, json).await,

        Command::Stats => {
            check(&store, store.refresh_stats().await)?;
            let snapshot = store.snapshot();
            let stats = snapshot.stats().cloned().unwrap_or_default();
            if json {
                to_json(&stats)
            } else {
                Ok(format_stats(&stats))
            }
        }

        Command::Analytics { kind, params } => {
            let query = params
                .iter()
                .fold(Query::new(), |q, (key, value)| q.push(key, value));
            match store.analytics(kind, &query).await {
                Some(payload) => to_json(&payload),
                None => Err(failure(&store)),
            }
        }
    }
}

async fn execute_trees(
    store: &DashboardStore,
    cmd: TreeCommands,
    json: bool,
) -> Result<String, String> {
    match cmd {
        TreeCommands::List { .. } => {
            check(store, store.refresh_trees().await)?;
            let snapshot = store.snapshot();
            if json {
                to_json(snapshot.trees())
            } else {
                Ok(format_trees(snapshot.trees()))
            }
        }

        TreeCommands::Add(args) => {
            let tree = NewTree {
                name: args.name,
                species: args.species,
                location: args.location,
                plant_date: args
                    .plant_date
                    .unwrap_or_else(|| Utc::now().date_naive().to_string()),
                height: args.height,
                diameter: args.diameter,
                health_status: args.health,
                notes: args.notes,
            };
            check(store, store.add_tree(&tree).await)?;
            let snapshot = store.snapshot();
            match created_tree(snapshot.trees(), store.config().tree_add_reconcile) {
                Some(created) if json => to_json(created),
                Some(created) => Ok(format!("Added tree {} ({})", created.name, created.id)),
                None => Ok(format!("Added tree {}", tree.name)),
            }
        }

        TreeCommands::Update { id, fields } => {
            let update = TreeUpdate {
                name: fields.name,
                species: fields.species,
                location: fields.location,
                plant_date: fields.plant_date,
                height: fields.height,
                diameter: fields.diameter,
                health_status: fields.health,
                last_watered: fields.last_watered,
                last_fertilized: fields.last_fertilized,
                notes: fields.notes,
            };
            check(store, store.update_tree(&id, &update).await)?;
            Ok(format!("Updated tree {}", id))
        }

        TreeCommands::Delete { id } => {
            check(store, store.delete_tree(&id).await)?;
            Ok(format!("Deleted tree {}", id))
        }
    }
}

async fn execute_care(
    store: &DashboardStore,
    cmd: CareCommands,
    json: bool,
) -> Result<String, String> {
    match cmd {
        CareCommands::List { tree, action, limit } => {
            let query = CareRecordQuery {
                tree_id: tree,
                action,
                page: Some(1),
                limit: Some(limit.unwrap_or(store.config().care_record_limit)),
            };
            check(store, store.refresh_care_records_with(&query).await)?;
            let snapshot = store.snapshot();
            if json {
                to_json(snapshot.care_records())
            } else {
                Ok(format_care_records(snapshot.care_records()))
            }
        }

        CareCommands::Add {
            tree,
            action,
            rating,
            date,
            notes,
        } => {
            let record = NewCareRecord {
                tree_id: tree,
                date,
                action,
                notes,
                health_rating: rating,
            };
            check(store, store.add_care_record(&record).await)?;
            let snapshot = store.snapshot();
            match snapshot.care_records().first() {
                Some(created) if json => to_json(created),
                Some(created) => Ok(format!(
                    "Logged {} for tree {} ({})",
                    created.action, created.tree_id, created.id
                )),
                None => Ok("Care record logged".to_string()),
            }
        }
    }
}

async fn execute_reminders(
    store: &DashboardStore,
    cmd: ReminderCommands,
    json: bool,
) -> Result<String, String> {
    match cmd {
        ReminderCommands::List { pending, overdue } => {
            check(store, store.refresh_reminders().await)?;
            let snapshot = store.snapshot();
            let reminders: Vec<&CareReminder> = if overdue {
                snapshot.overdue_reminders(Utc::now()).collect()
            } else if pending {
                snapshot.pending_reminders().collect()
            } else {
                snapshot.reminders().iter().collect()
            };
            if json {
                to_json(&reminders)
            } else {
                Ok(format_reminders(&reminders))
            }
        }

        ReminderCommands::Complete { id } => {
            check(store, store.mark_reminder_completed(&id).await)?;
            Ok(format!("Completed reminder {}", id))
        }
    }
}

/// Turn a `false` from the store into its recorded error
fn check(store: &DashboardStore, ok: bool) -> Result<(), String> {
    if ok {
        Ok(())
    } else {
        Err(failure(store))
    }
}

fn failure(store: &DashboardStore) -> String {
    store
        .snapshot()
        .error()
        .unwrap_or("operation failed")
        .to_string()
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String, String> {
    serde_json::to_string_pretty(value).map_err(|e| e.to_string())
}

// ==================== Formatting ====================

fn format_summary(snapshot: &DashboardSnapshot) -> String {
    let now = Utc::now();
    let stats = snapshot.effective_stats(now.date_naive());
    let mut out = String::new();
    out.push_str(&format!("Trees:         {}\n", snapshot.trees().len()));
    out.push_str(&format!("Care records:  {}\n", snapshot.care_records().len()));
    out.push_str(&format!(
        "Reminders:     {} pending, {} overdue\n",
        snapshot.pending_reminders().count(),
        snapshot.overdue_reminders(now).count()
    ));
    out.push('\n');
    out.push_str(&format_stats(&stats));
    out
}

fn format_stats(stats: &DashboardStats) -> String {
    let mut out = String::new();
    out.push_str(&format!("Total trees:        {}\n", stats.total_trees));
    out.push_str(&format!("Carbon absorbed:    {:.1} kg\n", stats.total_carbon_absorbed));
    out.push_str(&format!("Average health:     {:.2} / 4\n", stats.average_health));
    out.push_str(&format!("Care records:       {}\n", stats.total_care_records));
    out.push_str(&format!("Planted this month: {}\n", stats.trees_planted_this_month));
    if stats.community_total_trees > 0 {
        out.push_str(&format!(
            "Community:          {} trees, {:.1} kg carbon\n",
            stats.community_total_trees, stats.community_total_carbon
        ));
    }
    out
}

fn format_trees(trees: &[Tree]) -> String {
    if trees.is_empty() {
        return "No trees".to_string();
    }
    let mut out = format!(
        "{:<26} {:<20} {:<22} {:>8} {:>10}  {}\n",
        "ID", "NAME", "SPECIES", "HEIGHT", "CARBON", "HEALTH"
    );
    for tree in trees {
        out.push_str(&format!(
            "{:<26} {:<20} {:<22} {:>7.1}m {:>8.1}kg  {}\n",
            tree.id, tree.name, tree.species, tree.height, tree.carbon_absorbed, tree.health_status
        ));
    }
    out
}

fn format_care_records(records: &[CareRecord]) -> String {
    if records.is_empty() {
        return "No care records".to_string();
    }
    let mut out = String::new();
    for record in records {
        out.push_str(&format!(
            "{}  {:<12} tree {}  rating {}/5",
            date_part(&record.date),
            record.action,
            record.tree_id,
            record.health_rating
        ));
        if let Some(ref notes) = record.notes {
            out.push_str(&format!("  {}", notes));
        }
        out.push('\n');
    }
    out
}

fn format_reminders(reminders: &[&CareReminder]) -> String {
    if reminders.is_empty() {
        return "No reminders".to_string();
    }
    let now = Utc::now();
    let mut out = String::new();
    for reminder in reminders {
        let state = if reminder.is_completed {
            "done"
        } else if reminder.is_overdue(now) {
            "OVERDUE"
        } else {
            "pending"
        };
        out.push_str(&format!(
            "{:<26} {}  {:<12} {:<6} tree {}  [{}]\n",
            reminder.id,
            date_part(&reminder.due_date),
            reminder.reminder_type,
            priority_label(reminder.priority),
            reminder.tree_id,
            state
        ));
    }
    out
}

fn priority_label(priority: ReminderPriority) -> &'static str {
    match priority {
        ReminderPriority::Low => "low",
        ReminderPriority::Medium => "medium",
        ReminderPriority::High => "high",
    }
}

/// Under prepend the created tree is always first; a refetched list
/// carries no marker for it.
fn created_tree(trees: &[Tree], strategy: ReconcileStrategy) -> Option<&Tree> {
    match strategy {
        ReconcileStrategy::Prepend => trees.first(),
        ReconcileStrategy::Refetch => None,
    }
}

fn date_part(raw: &str) -> &str {
    raw.get(..10).unwrap_or(raw)
}
