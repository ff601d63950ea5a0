//! Care records

use super::{validate_notes, validate_required};
use crate::error::{Result, SdkError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kind of care applied to a tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CareAction {
    Watering,
    Fertilizing,
    Pruning,
    PestControl,
    Other,
}

impl CareAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Watering => "watering",
            Self::Fertilizing => "fertilizing",
            Self::Pruning => "pruning",
            Self::PestControl => "pest_control",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for CareAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CareAction {
    type Err = SdkError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "watering" => Ok(Self::Watering),
            "fertilizing" => Ok(Self::Fertilizing),
            "pruning" => Ok(Self::Pruning),
            "pest_control" => Ok(Self::PestControl),
            "other" => Ok(Self::Other),
            other => Err(SdkError::Validation(format!("Unknown care action: {}", other))),
        }
    }
}

/// One care action applied to a tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CareRecord {
    pub id: String,
    pub tree_id: String,
    #[serde(default)]
    pub date: String,
    pub action: CareAction,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// 1 (poor) to 5 (thriving)
    pub health_rating: u8,
}

/// Input for logging a care action
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCareRecord {
    pub tree_id: String,
    /// Defaults to the server's current time when omitted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    pub action: CareAction,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub health_rating: u8,
}

impl NewCareRecord {
    pub fn validate(&self) -> Result<()> {
        validate_required("Tree id", &self.tree_id)?;
        if !(1..=5).contains(&self.health_rating) {
            return Err(SdkError::Validation(
                "Health rating must be between 1 and 5".into(),
            ));
        }
        if let Some(ref date) = self.date {
            if super::parse_timestamp(date).is_none() {
                return Err(SdkError::Validation(format!("Care date is not a valid date: {}", date)));
            }
        }
        validate_notes(self.notes.as_deref())
    }
}
