//! Care reminders

use super::parse_timestamp;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// What the reminder is for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReminderType {
    Watering,
    Fertilizing,
    Pruning,
    HealthCheck,
}

impl ReminderType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Watering => "watering",
            Self::Fertilizing => "fertilizing",
            Self::Pruning => "pruning",
            Self::HealthCheck => "health_check",
        }
    }
}

impl fmt::Display for ReminderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReminderPriority {
    Low,
    #[default]
    Medium,
    High,
}

/// A scheduled (or overdue) care action, created server-side
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CareReminder {
    pub id: String,
    pub tree_id: String,
    #[serde(rename = "type")]
    pub reminder_type: ReminderType,
    pub due_date: String,
    #[serde(default)]
    pub is_completed: bool,
    #[serde(default)]
    pub priority: ReminderPriority,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl CareReminder {
    pub fn due_at(&self) -> Option<DateTime<Utc>> {
        parse_timestamp(&self.due_date)
    }

    /// Incomplete and past due. An unparseable due date is never overdue.
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        !self.is_completed && self.due_at().is_some_and(|due| due < now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn reminder(due: &str, done: bool) -> CareReminder {
        serde_json::from_value(serde_json::json!({
            "id": "r1",
            "treeId": "t1",
            "type": "health_check",
            "dueDate": due,
            "isCompleted": done,
            "priority": "high"
        }))
        .unwrap()
    }

    #[test]
    fn test_decodes_type_field() {
        let r = reminder("2024-06-01", false);
        assert_eq!(r.reminder_type, ReminderType::HealthCheck);
        assert_eq!(r.priority, ReminderPriority::High);
    }

    #[test]
    fn test_overdue() {
        let now = Utc.with_ymd_and_hms(2024, 6, 2, 12, 0, 0).unwrap();
        assert!(reminder("2024-06-01T08:00:00Z", false).is_overdue(now));
        assert!(!reminder("2024-06-01T08:00:00Z", true).is_overdue(now));
        assert!(!reminder("2024-06-03", false).is_overdue(now));
        assert!(!reminder("soon", false).is_overdue(now));
    }
}
