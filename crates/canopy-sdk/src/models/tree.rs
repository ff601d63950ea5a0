//! Tree entity

use super::{parse_date, validate_notes, validate_required};
use crate::error::{Result, SdkError};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Upper bound on tree height in meters
pub const MAX_HEIGHT_M: f64 = 100.0;
/// Upper bound on trunk diameter in meters
pub const MAX_DIAMETER_M: f64 = 10.0;

/// Observed health of a tree
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Excellent,
    #[default]
    Good,
    Fair,
    Poor,
}

impl HealthStatus {
    /// Numeric score used for averages: excellent 4, good 3, fair 2, poor 1
    pub fn score(&self) -> u8 {
        match self {
            Self::Excellent => 4,
            Self::Good => 3,
            Self::Fair => 2,
            Self::Poor => 1,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Excellent => "excellent",
            Self::Good => "good",
            Self::Fair => "fair",
            Self::Poor => "poor",
        }
    }
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HealthStatus {
    type Err = SdkError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "excellent" => Ok(Self::Excellent),
            "good" => Ok(Self::Good),
            "fair" => Ok(Self::Fair),
            "poor" => Ok(Self::Poor),
            other => Err(SdkError::Validation(format!("Unknown health status: {}", other))),
        }
    }
}

/// Sort direction for list endpoints
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A planted tree tracked by the user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tree {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub species: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub plant_date: String,
    /// Meters
    #[serde(default)]
    pub height: f64,
    /// Meters
    #[serde(default)]
    pub diameter: f64,
    #[serde(default)]
    pub health_status: HealthStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_watered: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_fertilized: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Kilograms of CO2
    #[serde(default)]
    pub carbon_absorbed: f64,
}

impl Tree {
    pub fn planted_on(&self) -> Option<NaiveDate> {
        parse_date(&self.plant_date)
    }
}

fn validate_height(height: f64) -> Result<()> {
    if height > 0.0 && height <= MAX_HEIGHT_M {
        Ok(())
    } else {
        Err(SdkError::Validation(format!(
            "Height must be greater than 0 and at most {} m",
            MAX_HEIGHT_M
        )))
    }
}

fn validate_diameter(diameter: f64) -> Result<()> {
    if diameter > 0.0 && diameter <= MAX_DIAMETER_M {
        Ok(())
    } else {
        Err(SdkError::Validation(format!(
            "Diameter must be greater than 0 and at most {} m",
            MAX_DIAMETER_M
        )))
    }
}

/// Input for planting a new tree; the server assigns the id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTree {
    pub name: String,
    pub species: String,
    pub location: String,
    pub plant_date: String,
    pub height: f64,
    pub diameter: f64,
    pub health_status: HealthStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl NewTree {
    pub fn validate(&self) -> Result<()> {
        validate_required("Name", &self.name)?;
        validate_required("Species", &self.species)?;
        validate_required("Plant date", &self.plant_date)?;
        if parse_date(&self.plant_date).is_none() {
            return Err(SdkError::Validation(format!(
                "Plant date is not a valid date: {}",
                self.plant_date
            )));
        }
        validate_height(self.height)?;
        validate_diameter(self.diameter)?;
        validate_notes(self.notes.as_deref())
    }
}

/// Partial tree update
///
/// Only the fields that are `Some` are sent, and only those are merged into
/// the local copy afterwards.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub species: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plant_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diameter: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub health_status: Option<HealthStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_watered: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_fertilized: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl TreeUpdate {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    pub fn validate(&self) -> Result<()> {
        if self.is_empty() {
            return Err(SdkError::Validation("Update contains no fields".into()));
        }
        if let Some(ref name) = self.name {
            validate_required("Name", name)?;
        }
        if let Some(ref species) = self.species {
            validate_required("Species", species)?;
        }
        if let Some(ref date) = self.plant_date {
            if parse_date(date).is_none() {
                return Err(SdkError::Validation(format!(
                    "Plant date is not a valid date: {}",
                    date
                )));
            }
        }
        if let Some(height) = self.height {
            validate_height(height)?;
        }
        if let Some(diameter) = self.diameter {
            validate_diameter(diameter)?;
        }
        validate_notes(self.notes.as_deref())
    }

    /// Shallow merge into a local tree; absent fields keep their value
    pub fn apply_to(&self, tree: &mut Tree) {
        if let Some(ref v) = self.name {
            tree.name = v.clone();
        }
        if let Some(ref v) = self.species {
            tree.species = v.clone();
        }
        if let Some(ref v) = self.location {
            tree.location = v.clone();
        }
        if let Some(ref v) = self.plant_date {
            tree.plant_date = v.clone();
        }
        if let Some(v) = self.height {
            tree.height = v;
        }
        if let Some(v) = self.diameter {
            tree.diameter = v;
        }
        if let Some(v) = self.health_status {
            tree.health_status = v;
        }
        if let Some(ref v) = self.last_watered {
            tree.last_watered = Some(v.clone());
        }
        if let Some(ref v) = self.last_fertilized {
            tree.last_fertilized = Some(v.clone());
        }
        if let Some(ref v) = self.notes {
            tree.notes = Some(v.clone());
        }
    }
}
