//! End-to-end orchestration against a scripted session: login, multi-search
//! aggregation, persistence, and fatal-path behaviour.

mod common;

use common::{FakeSession, FakeSurface};
use propflow_browser::LabeledValue;
use propflow_core::{AppConfig, Credentials};
use propflow_scraper::{ScrapeError, SessionOrchestrator};
use std::path::Path;
use std::sync::Arc;

fn test_config(dir: &Path, searches: &[&str]) -> AppConfig {
    let mut config = AppConfig::default();
    config.run.saved_searches = searches.iter().map(|s| (*s).to_string()).collect();
    config.output.results_path = dir.join("properties.json");
    config.output.diagnostics_dir = dir.join("diagnostics");
    config
}

/// A listing surface that logs in successfully and serves `rows` hrefs
/// per search, each resolving to the same scripted detail panel.
fn listing_surface(config: &AppConfig, rows: usize) -> Arc<FakeSurface> {
    let sel = &config.selectors;
    let primary = FakeSurface::new("listing");
    primary.set_url_fragment(&config.session.landing_fragment);
    primary.set_visible(&sel.row_name);
    primary.set_visible(&sel.detail_panel);
    primary.set_visible(&sel.title);
    primary.set_counts(&sel.row_name, &[rows]);
    let hrefs: Vec<String> = (0..rows).map(|i| format!("/search/{}", 100 + i)).collect();
    let href_refs: Vec<&str> = hrefs.iter().map(String::as_str).collect();
    primary.set_hrefs(&sel.row_name, &href_refs);
    primary.set_text(&sel.title, "100 Elm St, Denton, TX");
    primary.set_pairs(vec![LabeledValue {
        label: "County".to_string(),
        value: Some("Denton".to_string()),
    }]);
    primary.hide_containing(&sel.linked_tab_text);
    primary
}

#[tokio::test(start_paused = true)]
async fn test_two_searches_aggregate_in_order_and_persist() {
    let dir = tempfile::tempdir().expect("temp dir");
    let config = test_config(dir.path(), &["Denton Bank Owned", "Collin Pre-Foreclosure"]);

    let primary = listing_surface(&config, 2);
    let session = Arc::new(FakeSession::new(Arc::clone(&primary)));
    let orchestrator = SessionOrchestrator::new(
        session.clone(),
        config.clone(),
        Credentials::new("agent@example.com".to_string(), "hunter2".to_string()),
    );

    let aggregate = orchestrator.run().await.expect("run succeeds");

    assert_eq!(aggregate.len(), 4);
    assert_eq!(aggregate.successes(), 4);

    let ids: Vec<u32> = aggregate.records().iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![1, 2, 3, 4]);
    let names: Vec<&str> = aggregate
        .records()
        .iter()
        .map(|r| r.search_name.as_str())
        .collect();
    assert_eq!(
        names,
        vec![
            "Denton Bank Owned",
            "Denton Bank Owned",
            "Collin Pre-Foreclosure",
            "Collin Pre-Foreclosure",
        ]
    );

    // Login actually submitted the injected credentials.
    let actions = primary.actions();
    assert!(actions
        .iter()
        .any(|a| a == r#"fill:input[name="username"]:agent@example.com"#));

    // Persisted document is a bare array with flattened field keys.
    let raw = std::fs::read_to_string(&config.output.results_path).expect("results file");
    let json: serde_json::Value = serde_json::from_str(&raw).expect("valid json");
    let array = json.as_array().expect("top-level array");
    assert_eq!(array.len(), 4);
    assert_eq!(array[0]["searchName"], "Denton Bank Owned");
    assert_eq!(array[0]["County"], "Denton");
    assert!(array[0].get("fields").is_none());
    assert!(array[0].get("error").is_none());

    assert!(session.was_closed());
}

#[tokio::test(start_paused = true)]
async fn test_login_failure_is_fatal_and_closes_session() {
    let dir = tempfile::tempdir().expect("temp dir");
    let config = test_config(dir.path(), &["Denton Bank Owned"]);

    // No landing fragment scripted, so the post-login wait times out.
    let primary = FakeSurface::new("login");
    let session = Arc::new(FakeSession::new(Arc::clone(&primary)));
    let orchestrator = SessionOrchestrator::new(
        session.clone(),
        config.clone(),
        Credentials::new("agent@example.com".to_string(), "hunter2".to_string()),
    );

    let err = orchestrator.run().await.unwrap_err();
    assert!(matches!(err, ScrapeError::SessionEstablishment(_)));

    assert!(!config.output.results_path.exists());
    assert!(session.was_closed());

    let actions = primary.actions();
    assert!(
        actions
            .iter()
            .any(|a| a.starts_with("screenshot:") && a.ends_with("fatal_error.png")),
        "no fatal diagnostic in {actions:?}"
    );
}

#[tokio::test(start_paused = true)]
async fn test_failed_search_persists_partial_aggregate_first() {
    let dir = tempfile::tempdir().expect("temp dir");
    let config = test_config(dir.path(), &["Denton Bank Owned", "Collin Pre-Foreclosure"]);

    let primary = listing_surface(&config, 1);
    // The second search's menu entry never appears.
    primary.hide_containing("Collin Pre-Foreclosure");

    let session = Arc::new(FakeSession::new(Arc::clone(&primary)));
    let orchestrator = SessionOrchestrator::new(
        session.clone(),
        config.clone(),
        Credentials::new("agent@example.com".to_string(), "hunter2".to_string()),
    );

    let err = orchestrator.run().await.unwrap_err();
    assert!(matches!(
        err,
        ScrapeError::SearchRun { ref name, .. } if name == "Collin Pre-Foreclosure"
    ));

    // The first search's record made it to disk before the abort.
    let raw = std::fs::read_to_string(&config.output.results_path).expect("results file");
    let json: serde_json::Value = serde_json::from_str(&raw).expect("valid json");
    let array = json.as_array().expect("top-level array");
    assert_eq!(array.len(), 1);
    assert_eq!(array[0]["id"], 1);
    assert_eq!(array[0]["searchName"], "Denton Bank Owned");

    assert!(session.was_closed());
}

#[tokio::test(start_paused = true)]
async fn test_identical_runs_serialize_identically() {
    let run = || async {
        let dir = tempfile::tempdir().expect("temp dir");
        let config = test_config(dir.path(), &["Denton Bank Owned"]);
        let primary = listing_surface(&config, 2);
        let session = Arc::new(FakeSession::new(primary));
        let orchestrator = SessionOrchestrator::new(
            session,
            config,
            Credentials::new("agent@example.com".to_string(), "hunter2".to_string()),
        );
        let aggregate = orchestrator.run().await.expect("run succeeds");
        serde_json::to_value(&aggregate).expect("serialize aggregate")
    };

    let first = run().await;
    let second = run().await;
    assert_eq!(first, second);
}

#[tokio::test(start_paused = true)]
async fn test_failed_record_keeps_sequential_ids() {
    let dir = tempfile::tempdir().expect("temp dir");
    let config = test_config(dir.path(), &["Denton Bank Owned"]);

    let primary = listing_surface(&config, 3);
    // The middle row is never clickable.
    primary.fail_click_nth(&config.selectors.row_name, 1, u32::MAX);

    let session = Arc::new(FakeSession::new(Arc::clone(&primary)));
    let orchestrator = SessionOrchestrator::new(
        session,
        config.clone(),
        Credentials::new("agent@example.com".to_string(), "hunter2".to_string()),
    );

    let aggregate = orchestrator.run().await.expect("run succeeds");

    assert_eq!(aggregate.len(), 3);
    assert_eq!(aggregate.successes(), 2);
    assert_eq!(aggregate.failures(), 1);

    let records = aggregate.records();
    assert_eq!(records[0].id, 1);
    assert_eq!(records[1].id, 2);
    assert_eq!(records[2].id, 3);
    assert!(records[0].error.is_none());
    assert!(records[1].error.is_some());
    assert!(records[2].error.is_none());
}
