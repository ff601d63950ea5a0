//! Domain models mirrored from the dashboard API
//!
//! Field names follow the wire format (camelCase); enums serialize to the
//! exact strings the server uses.

mod care;
mod reminder;
mod stats;
mod tree;

pub use care::{CareAction, CareRecord, NewCareRecord};
pub use reminder::{CareReminder, ReminderPriority, ReminderType};
pub use stats::DashboardStats;
pub use tree::{HealthStatus, NewTree, SortOrder, Tree, TreeUpdate};

use crate::error::{Result, SdkError};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

/// Maximum length of any free-text notes field
pub const MAX_NOTES_LEN: usize = 500;

/// Parse a wire timestamp.
///
/// Accepts RFC 3339, a naive `YYYY-MM-DDTHH:MM:SS` (read as UTC), or a bare
/// `YYYY-MM-DD` (midnight UTC).
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    parse_date(raw).and_then(|d| d.and_hms_opt(0, 0, 0)).map(|n| n.and_utc())
}

/// Parse the calendar date at the start of a wire date or timestamp
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    let prefix = raw.get(..10).unwrap_or(raw);
    NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok()
}

pub(crate) fn validate_notes(notes: Option<&str>) -> Result<()> {
    match notes {
        Some(n) if n.chars().count() > MAX_NOTES_LEN => Err(SdkError::Validation(format!(
            "Notes must be at most {} characters",
            MAX_NOTES_LEN
        ))),
        _ => Ok(()),
    }
}

pub(crate) fn validate_required(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        Err(SdkError::Validation(format!("{} is required", field)))
    } else {
        Ok(())
    }
}
