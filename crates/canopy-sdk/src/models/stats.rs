//! Aggregate dashboard figures

use serde::{Deserialize, Serialize};

/// Summary shown at the top of the dashboard
///
/// Every field defaults to zero so a partial payload still decodes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DashboardStats {
    pub total_trees: u64,
    /// Kilograms of CO2
    pub total_carbon_absorbed: f64,
    /// 0 to 4, see `HealthStatus::score`
    pub average_health: f64,
    pub total_care_records: u64,
    pub trees_planted_this_month: u64,
    pub community_total_trees: u64,
    pub community_total_carbon: f64,
}
