//! Config loading and defaults integration tests

use canopy_sdk::{CanopyConfig, ReconcileStrategy, SdkError, SortOrder};
use std::io::Write;

#[test]
fn test_missing_file_uses_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let config = CanopyConfig::load(dir.path().join("absent.toml")).unwrap();

    assert_eq!(config.api.base_url, "http://localhost:5000/api");
    assert_eq!(config.api.timeout_ms, 10_000);
    assert_eq!(config.dashboard.tree_page_limit, 50);
    assert_eq!(config.dashboard.tree_add_reconcile, ReconcileStrategy::Prepend);
}

#[test]
fn test_load_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
[api]
base_url = "https://canopy.example.org/api"
timeout_ms = 2500

[credentials]
token_path = "/tmp/canopy-test/token"

[dashboard]
tree_page_limit = 20
tree_sort_by = "name"
tree_sort_order = "asc"
include_completed_reminders = false
tree_add_reconcile = "refetch"
"#
    )
    .unwrap();

    let config = CanopyConfig::load(file.path()).unwrap();
    assert_eq!(config.api.base_url, "https://canopy.example.org/api");
    assert_eq!(config.api.timeout_ms, 2500);
    assert_eq!(
        config.credentials.token_path,
        std::path::PathBuf::from("/tmp/canopy-test/token")
    );

    let params = config.dashboard.tree_list_params();
    assert_eq!(params.limit, 20);
    assert_eq!(params.sort_by.as_deref(), Some("name"));
    assert_eq!(params.sort_order, SortOrder::Asc);
    assert_eq!(config.dashboard.reminder_query().is_completed, Some(false));
    assert_eq!(config.dashboard.tree_add_reconcile, ReconcileStrategy::Refetch);
}

#[test]
fn test_partial_file_keeps_other_defaults() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[dashboard]\ncare_record_limit = 10").unwrap();

    let config = CanopyConfig::load(file.path()).unwrap();
    assert_eq!(config.dashboard.care_record_limit, 10);
    assert_eq!(config.dashboard.tree_page_limit, 50);
    assert_eq!(config.api.timeout_ms, 10_000);
}

#[test]
fn test_invalid_file_is_config_error() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[dashboard]\ntree_add_reconcile = \"sideways\"").unwrap();

    let err = CanopyConfig::load(file.path()).unwrap_err();
    assert!(matches!(err, SdkError::Config(_)));
}
