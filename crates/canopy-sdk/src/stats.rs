//! Local approximation of the dashboard stats
//!
//! Used while the server figures are missing or failed to load. Counts match
//! the server exactly; carbon and health are approximations and are never
//! reconciled against the server's values.

use crate::models::{CareRecord, DashboardStats, Tree};
use chrono::{Datelike, NaiveDate};

/// Mean health score (excellent 4 … poor 1); 0.0 for no trees
pub fn average_health(trees: &[Tree]) -> f64 {
    if trees.is_empty() {
        return 0.0;
    }
    let sum: u32 = trees.iter().map(|t| u32::from(t.health_status.score())).sum();
    f64::from(sum) / trees.len() as f64
}

pub fn total_carbon(trees: &[Tree]) -> f64 {
    trees.iter().map(|t| t.carbon_absorbed).sum()
}

/// Trees whose plant date falls in the given calendar month
pub fn trees_planted_in_month(trees: &[Tree], year: i32, month: u32) -> u64 {
    trees
        .iter()
        .filter_map(Tree::planted_on)
        .filter(|d| d.year() == year && d.month() == month)
        .count() as u64
}

/// Build stats from local collections; community figures stay at zero
pub fn local_stats(trees: &[Tree], care_records: &[CareRecord], today: NaiveDate) -> DashboardStats {
    DashboardStats {
        total_trees: trees.len() as u64,
        total_carbon_absorbed: total_carbon(trees),
        average_health: average_health(trees),
        total_care_records: care_records.len() as u64,
        trees_planted_this_month: trees_planted_in_month(trees, today.year(), today.month()),
        community_total_trees: 0,
        community_total_carbon: 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::HealthStatus;

    fn tree(id: &str, health: HealthStatus, carbon: f64, planted: &str) -> Tree {
        Tree {
            id: id.into(),
            name: id.into(),
            species: "Quercus".into(),
            location: String::new(),
            plant_date: planted.into(),
            height: 2.0,
            diameter: 0.1,
            health_status: health,
            last_watered: None,
            last_fertilized: None,
            notes: None,
            carbon_absorbed: carbon,
        }
    }

    #[test]
    fn test_average_health_empty_is_zero() {
        let avg = average_health(&[]);
        assert_eq!(avg, 0.0);
        assert!(!avg.is_nan());
    }

    #[test]
    fn test_average_health_mixed() {
        let trees = vec![
            tree("a", HealthStatus::Excellent, 0.0, ""),
            tree("b", HealthStatus::Poor, 0.0, ""),
            tree("c", HealthStatus::Good, 0.0, ""),
        ];
        assert!((average_health(&trees) - 8.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_single_good_tree_scenario() {
        let trees = vec![tree("t1", HealthStatus::Good, 10.0, "2024-01-15")];
        let today = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let stats = local_stats(&trees, &[], today);

        assert_eq!(stats.total_trees, 1);
        assert_eq!(stats.average_health, 3.0);
        assert_eq!(stats.total_carbon_absorbed, 10.0);
        assert_eq!(stats.total_care_records, 0);
        assert_eq!(stats.trees_planted_this_month, 0);
    }

    #[test]
    fn test_planted_this_month() {
        let trees = vec![
            tree("a", HealthStatus::Good, 1.0, "2024-06-03"),
            tree("b", HealthStatus::Good, 1.0, "2024-06-28T09:00:00Z"),
            tree("c", HealthStatus::Good, 1.0, "2023-06-10"),
            tree("d", HealthStatus::Good, 1.0, "unknown"),
        ];
        assert_eq!(trees_planted_in_month(&trees, 2024, 6), 2);
        assert_eq!(total_carbon(&trees), 4.0);
    }
}
