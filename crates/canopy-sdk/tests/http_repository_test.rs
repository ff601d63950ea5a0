//! HTTP repositories and the store against a fake dashboard server

use std::sync::Arc;

use canopy_sdk::{
    AnalyticsKind, CareRecordQuery, DashboardConfig, DashboardStore, Gateway, GatewayConfig,
    MemoryCredentialStore, Query, ReminderQuery, Repositories, SdkError, TreeListParams,
};
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn repositories_for(server: &MockServer) -> Repositories {
    let gateway = Gateway::new(
        GatewayConfig {
            base_url: format!("{}/api", server.uri()),
            ..Default::default()
        },
        Arc::new(MemoryCredentialStore::with_token("token")),
    )
    .expect("gateway");
    Repositories::http(Arc::new(gateway))
}

fn ok(data: serde_json::Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({"success": true, "data": data}))
}

fn raw_tree(id_field: &str, id: serde_json::Value, name: &str) -> serde_json::Value {
    let mut tree = json!({
        "name": name,
        "species": "Quercus robur",
        "location": "North field",
        "plantDate": "2024-03-01T00:00:00.000Z",
        "height": 2.5,
        "diameter": 0.2,
        "healthStatus": "good",
        "carbonAbsorbed": 12.5
    });
    tree[id_field] = id;
    tree
}

#[tokio::test]
async fn test_tree_list_normalizes_ids_and_passes_pagination() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/dashboard/trees"))
        .and(query_param("page", "2"))
        .and(query_param("limit", "2"))
        .and(query_param("sortOrder", "desc"))
        .respond_with(ok(json!({
            "trees": [
                raw_tree("_id", json!("a1"), "Oak"),
                raw_tree("_id", json!({"$oid": "b2"}), "Ash"),
            ],
            "pagination": {
                "page": 2, "limit": 2, "total": 7, "totalPages": 4,
                "hasNext": true, "hasPrev": true
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let repos = repositories_for(&server);
    let params = TreeListParams {
        page: 2,
        limit: 2,
        ..Default::default()
    };
    let page = repos.trees.list(&params).await.unwrap();

    let ids: Vec<&str> = page.items.iter().map(|t| t.id.as_str()).collect();
    assert_eq!(ids, vec!["a1", "b2"]);
    assert_eq!(page.pagination.total, 7);
    assert_eq!(page.pagination.total_pages, 4);
    assert!(page.pagination.has_next);
}

#[tokio::test]
async fn test_tree_list_truncated_to_limit() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/dashboard/trees"))
        .respond_with(ok(json!({
            "trees": [
                raw_tree("id", json!("t1"), "One"),
                raw_tree("id", json!("t2"), "Two"),
                raw_tree("id", json!("t3"), "Three"),
            ]
        })))
        .mount(&server)
        .await;

    let repos = repositories_for(&server);
    let params = TreeListParams {
        limit: 2,
        ..Default::default()
    };
    let page = repos.trees.list(&params).await.unwrap();
    assert_eq!(page.items.len(), 2);
}

#[tokio::test]
async fn test_unsuccessful_envelope_is_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/api/dashboard/trees/t9"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": false,
            "message": "Tree not found"
        })))
        .mount(&server)
        .await;

    let repos = repositories_for(&server);
    let update = canopy_sdk::TreeUpdate {
        name: Some("Renamed".into()),
        ..Default::default()
    };
    let err = repos.trees.update("t9", &update).await.unwrap_err();
    assert!(matches!(err, SdkError::Rejected(ref m) if m == "Tree not found"));
}

#[tokio::test]
async fn test_delete_acknowledgement() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/api/dashboard/trees/t1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "message": "Tree deleted successfully"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let repos = repositories_for(&server);
    let ack = repos.trees.delete("t1").await.unwrap();
    assert!(ack.success);
    assert_eq!(ack.message.as_deref(), Some("Tree deleted successfully"));
}

#[tokio::test]
async fn test_care_records_filtered_by_tree() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/dashboard/care-records"))
        .and(query_param("treeId", "t1"))
        .respond_with(ok(json!({
            "careRecords": [{
                "_id": 42,
                "treeId": "t1",
                "date": "2024-05-02T10:00:00Z",
                "action": "pest_control",
                "healthRating": 3
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let repos = repositories_for(&server);
    let page = repos
        .care_records
        .list(&CareRecordQuery::for_tree("t1"))
        .await
        .unwrap();
    assert_eq!(page.items.len(), 1);
    assert_eq!(page.items[0].id, "42");
}

#[tokio::test]
async fn test_reminder_list_and_complete() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/dashboard/care-reminders"))
        .and(query_param("isCompleted", "false"))
        .respond_with(ok(json!([{
            "_id": "r1",
            "treeId": "t1",
            "type": "health_check",
            "dueDate": "2024-06-01T09:00:00Z",
            "isCompleted": false,
            "priority": "high"
        }])))
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/api/dashboard/care-reminders/r1/complete"))
        .respond_with(ok(json!({
            "_id": "r1",
            "treeId": "t1",
            "type": "health_check",
            "dueDate": "2024-06-01T09:00:00Z",
            "isCompleted": true
        })))
        .expect(1)
        .mount(&server)
        .await;

    let repos = repositories_for(&server);
    let query = ReminderQuery {
        is_completed: Some(false),
        ..Default::default()
    };
    let reminders = repos.reminders.list(&query).await.unwrap();
    assert_eq!(reminders.len(), 1);
    assert_eq!(reminders[0].id, "r1");

    let done = repos.reminders.complete("r1").await.unwrap();
    assert!(done.is_completed);
}

#[tokio::test]
async fn test_analytics_path_and_params() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/dashboard/analytics/growth-trend"))
        .and(query_param("period", "12m"))
        .respond_with(ok(json!({"labels": ["Jan"], "series": [1.5]})))
        .expect(1)
        .mount(&server)
        .await;

    let repos = repositories_for(&server);
    let payload = repos
        .stats
        .analytics(AnalyticsKind::GrowthTrend, &Query::new().push("period", "12m"))
        .await
        .unwrap();
    assert_eq!(payload["series"][0], 1.5);
}

#[tokio::test]
async fn test_store_bootstrap_over_http() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/dashboard/trees"))
        .respond_with(ok(json!({"trees": [raw_tree("_id", json!("a1"), "Oak")]})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/dashboard/care-records"))
        .respond_with(ok(json!({"careRecords": []})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/dashboard/care-reminders"))
        .respond_with(ok(json!([])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/dashboard/stats"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "success": false,
            "message": "Stats service unavailable"
        })))
        .mount(&server)
        .await;

    let store = DashboardStore::new(repositories_for(&server), DashboardConfig::default());
    store.set_authenticated(true).await;

    let snapshot = store.snapshot();
    assert_eq!(snapshot.trees().len(), 1);
    assert_eq!(snapshot.trees()[0].id, "a1");
    assert!(snapshot.stats().is_none());
    assert_eq!(snapshot.error(), Some("Stats service unavailable"));

    let today = chrono::NaiveDate::from_ymd_opt(2024, 3, 20).unwrap();
    let local = snapshot.effective_stats(today);
    assert_eq!(local.total_trees, 1);
    assert_eq!(local.total_carbon_absorbed, 12.5);
}
