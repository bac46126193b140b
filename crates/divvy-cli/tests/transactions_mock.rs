//! Transactions query tests against a mock backend, plus headless CLI runs.

use std::sync::Arc;

use assert_cmd::cargo::cargo_bin_cmd;
use divvy_core::config::SupabaseSettings;
use divvy_core::repository::TransactionRepository;
use divvy_core::session::store::{SessionStore, StoredAuth};
use divvy_core::session::Auth;
use divvy_core::supabase::SupabaseClient;
use divvy_core::supabase::types::{Session, User};
use predicates::prelude::*;
use serde_json::json;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn settings(server: &MockServer) -> SupabaseSettings {
    SupabaseSettings {
        url: server.uri(),
        anon_key: "anon-key".to_string(),
    }
}

fn valid_session() -> Session {
    Session {
        access_token: "user-access".to_string(),
        refresh_token: "user-refresh".to_string(),
        expires_at: u64::MAX,
        user: User {
            id: "u1".to_string(),
            email: Some("a@b.com".to_string()),
        },
    }
}

fn rows_body() -> serde_json::Value {
    json!([
        {
            "id": "tx-2",
            "group_id": "trip-2026",
            "user_id": "u1",
            "amount": 18.0,
            "memo": "museum tickets",
            "date": "2026-08-02",
            "created_at": "2026-08-02T09:00:00+00:00"
        },
        {
            "id": "tx-1",
            "group_id": "trip-2026",
            "user_id": null,
            "amount": 42.5,
            "memo": null,
            "date": "2026-08-01",
            "created_at": "2026-08-01T12:34:56+00:00"
        }
    ])
}

/// Builds an authenticated repository backed by the mock server.
async fn repository_at(server: &MockServer, dir: &tempfile::TempDir) -> TransactionRepository {
    let store = SessionStore::new(dir.path().join("session.json"));
    store
        .save(&StoredAuth {
            session: Some(valid_session()),
            code_verifier: None,
        })
        .unwrap();

    let client = Arc::new(SupabaseClient::new(&settings(server)).unwrap());
    let auth = Arc::new(Auth::new(Arc::clone(&client), store));
    auth.restore().await;
    TransactionRepository::new(client, auth)
}

#[tokio::test]
async fn test_list_forwards_group_filter_and_bearer_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/transactions"))
        .and(query_param("select", "*"))
        .and(query_param("order", "date.desc"))
        .and(query_param("group_id", "eq.trip-2026"))
        .and(header("apikey", "anon-key"))
        .and(header("Authorization", "Bearer user-access"))
        .respond_with(ResponseTemplate::new(200).set_body_json(rows_body()))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let repository = repository_at(&server, &dir).await;

    let rows = repository.list_by_group(Some("trip-2026")).await.unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].id, "tx-2");
    assert_eq!(rows[1].memo, None);
}

#[tokio::test]
async fn test_list_without_group_queries_unfiltered() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/transactions"))
        .and(query_param("select", "*"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let repository = repository_at(&server, &dir).await;

    let rows = repository.list_by_group(None).await.unwrap();
    assert!(rows.is_empty());

    // The group filter must not have been sent.
    let requests = server.received_requests().await.unwrap();
    assert!(!requests[0].url.query().unwrap_or("").contains("group_id"));
}

#[tokio::test]
async fn test_list_is_idempotent_against_unchanged_data() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/transactions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(rows_body()))
        .expect(2)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let repository = repository_at(&server, &dir).await;

    let first = repository.list_by_group(Some("trip-2026")).await.unwrap();
    let second = repository.list_by_group(Some("trip-2026")).await.unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_query_failure_propagates_with_backend_message() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/transactions"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "message": "permission denied for table transactions"
        })))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let repository = repository_at(&server, &dir).await;

    let err = repository.list_by_group(Some("trip-2026")).await.unwrap_err();
    assert_eq!(
        err.to_string(),
        "permission denied for table transactions"
    );
}

// ============================================================================
// Headless CLI runs
// ============================================================================

fn write_home(server: &MockServer, home: &tempfile::TempDir, with_session: bool) {
    std::fs::write(
        home.path().join("config.toml"),
        format!(
            "[supabase]\nurl = \"{}\"\nanon_key = \"anon-key\"\n",
            server.uri()
        ),
    )
    .unwrap();

    if with_session {
        SessionStore::new(home.path().join("session.json"))
            .save(&StoredAuth {
                session: Some(valid_session()),
                code_verifier: None,
            })
            .unwrap();
    }
}

#[tokio::test]
async fn test_transactions_command_prints_rows() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/transactions"))
        .and(query_param("group_id", "eq.trip-2026"))
        .respond_with(ResponseTemplate::new(200).set_body_json(rows_body()))
        .mount(&server)
        .await;

    let home = tempfile::tempdir().unwrap();
    write_home(&server, &home, true);

    cargo_bin_cmd!("divvy")
        .env("DIVVY_HOME", home.path())
        .args(["transactions", "--group", "trip-2026"])
        .assert()
        .success()
        .stdout(predicate::str::contains("museum tickets"))
        .stdout(predicate::str::contains("42.50"));
}

#[tokio::test]
async fn test_transactions_command_reports_empty_group() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/transactions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let home = tempfile::tempdir().unwrap();
    write_home(&server, &home, true);

    cargo_bin_cmd!("divvy")
        .env("DIVVY_HOME", home.path())
        .arg("transactions")
        .assert()
        .success()
        .stdout(predicate::str::contains("No transactions found."));
}

#[tokio::test]
async fn test_transactions_command_fails_without_session() {
    let server = MockServer::start().await;
    let home = tempfile::tempdir().unwrap();
    write_home(&server, &home, false);

    cargo_bin_cmd!("divvy")
        .env("DIVVY_HOME", home.path())
        .arg("transactions")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Not signed in"));
}

#[tokio::test]
async fn test_transactions_command_surfaces_query_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/transactions"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "message": "backend exploded"
        })))
        .mount(&server)
        .await;

    let home = tempfile::tempdir().unwrap();
    write_home(&server, &home, true);

    cargo_bin_cmd!("divvy")
        .env("DIVVY_HOME", home.path())
        .arg("transactions")
        .assert()
        .failure()
        .stderr(predicate::str::contains("backend exploded"));
}
