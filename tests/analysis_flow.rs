use async_trait::async_trait;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use driftwatch::api::handlers::{self, AppContext};
use driftwatch::client::{DescriptorClient, Enricher, Enrichment};
use driftwatch::error::MonitorError;
use driftwatch::logic::analysis::{AnalysisRunner, ServiceAnalysisStatus};
use driftwatch::logic::baseline::BaselineResolver;
use driftwatch::logic::ledger::ChangeLedger;
use driftwatch::model::{ApiSpec, BreakingChange, ChangeKind, ChangeStatus};
use driftwatch::store::memory::MemoryStore;
use driftwatch::store::traits::{ChangeStore, SpecStore};
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

/// Serves pre-scripted descriptor bodies per service. The last body in a
/// queue is sticky so repeated fetches keep working; services with no
/// queue at all behave as offline.
struct ScriptedDescriptors {
    responses: Mutex<HashMap<String, VecDeque<String>>>,
}

impl ScriptedDescriptors {
    fn new() -> Self {
        Self {
            responses: Mutex::new(HashMap::new()),
        }
    }

    fn push(&self, service: &str, body: &str) {
        self.responses
            .lock()
            .entry(service.to_string())
            .or_default()
            .push_back(body.to_string());
    }
}

#[async_trait]
impl DescriptorClient for ScriptedDescriptors {
    async fn fetch_descriptor(&self, service_name: &str) -> Result<String, MonitorError> {
        let mut responses = self.responses.lock();
        let queue = responses.get_mut(service_name).ok_or_else(|| {
            MonitorError::UpstreamUnavailable(format!("{service_name} is not available"))
        })?;
        if queue.len() > 1 {
            Ok(queue.pop_front().unwrap())
        } else {
            queue.front().cloned().ok_or_else(|| {
                MonitorError::UpstreamUnavailable(format!("{service_name} is not available"))
            })
        }
    }

    async fn is_available(&self, service_name: &str) -> bool {
        self.responses.lock().contains_key(service_name)
    }
}

struct FailingEnricher;

#[async_trait]
impl Enricher for FailingEnricher {
    async fn enrich(
        &self,
        _change: &BreakingChange,
        _known_services: &[ApiSpec],
    ) -> Result<Enrichment, MonitorError> {
        Err(MonitorError::EnrichmentFailed("quota exceeded".to_string()))
    }
}

struct CannedEnricher;

#[async_trait]
impl Enricher for CannedEnricher {
    async fn enrich(
        &self,
        _change: &BreakingChange,
        _known_services: &[ApiSpec],
    ) -> Result<Enrichment, MonitorError> {
        Ok(Enrichment {
            suggestion: "Deprecate the endpoint first".to_string(),
            impact: "order-service | 80% | consumes this endpoint".to_string(),
            explanation: "An API page that other teams rely on went away".to_string(),
        })
    }
}

const SPEC_V1: &str = r#"{
    "paths": {
        "/users": {"get": {}, "post": {}},
        "/orders": {"get": {}}
    },
    "components": {
        "schemas": {
            "User": {"properties": {"id": {"type": "integer"}, "name": {"type": "string"}}}
        }
    }
}"#;

// /orders removed, User.name removed
const SPEC_V2: &str = r#"{
    "paths": {
        "/users": {"get": {}, "post": {}}
    },
    "components": {
        "schemas": {
            "User": {"properties": {"id": {"type": "integer"}}}
        }
    }
}"#;

// superset of v1: a new endpoint and a new field
const SPEC_V1_PLUS: &str = r#"{
    "paths": {
        "/users": {"get": {}, "post": {}},
        "/orders": {"get": {}},
        "/invoices": {"get": {}}
    },
    "components": {
        "schemas": {
            "User": {"properties": {"id": {"type": "integer"}, "name": {"type": "string"}, "email": {"type": "string"}}}
        }
    }
}"#;

fn runner_with(
    store: Arc<MemoryStore>,
    descriptors: Arc<ScriptedDescriptors>,
    enricher: Arc<dyn Enricher>,
    services: &[&str],
) -> AnalysisRunner<MemoryStore> {
    AnalysisRunner::new(
        store,
        descriptors,
        enricher,
        services.iter().map(|s| s.to_string()).collect(),
    )
}

#[tokio::test]
async fn first_observation_becomes_the_baseline() {
    let store = Arc::new(MemoryStore::new());
    let descriptors = Arc::new(ScriptedDescriptors::new());
    descriptors.push("user-service", SPEC_V1);
    let runner = runner_with(
        store.clone(),
        descriptors,
        Arc::new(FailingEnricher),
        &["user-service"],
    );

    let report = runner.analyze("user-service").await.unwrap();

    assert_eq!(report.breaking_changes_count, 0);
    assert!(report.summary.starts_with("Baseline spec saved for user-service"));

    let baseline = store.baseline_spec("user-service").await.unwrap().unwrap();
    assert!(baseline.is_baseline);
    assert!(store.all_changes().await.unwrap().is_empty());
}

#[tokio::test]
async fn removals_are_recorded_with_sentinel_enrichment() {
    let store = Arc::new(MemoryStore::new());
    let descriptors = Arc::new(ScriptedDescriptors::new());
    descriptors.push("user-service", SPEC_V1);
    descriptors.push("user-service", SPEC_V2);
    let runner = runner_with(
        store.clone(),
        descriptors,
        Arc::new(FailingEnricher),
        &["user-service"],
    );

    runner.analyze("user-service").await.unwrap();
    let report = runner.analyze("user-service").await.unwrap();

    assert_eq!(report.breaking_changes_count, 2);

    let changes = store.changes_for_service("user-service").await.unwrap();
    assert_eq!(changes.len(), 2);

    let endpoint = changes
        .iter()
        .find(|c| c.change_type == ChangeKind::EndpointRemoved)
        .unwrap();
    assert_eq!(endpoint.description, "Endpoint '/orders' was removed");
    assert_eq!(endpoint.path, "/orders");
    assert_eq!(
        endpoint.ai_suggestion.as_deref(),
        Some("enrichment unavailable: quota exceeded")
    );
    assert_eq!(
        endpoint.predicted_impact.as_deref(),
        Some("enrichment unavailable: quota exceeded")
    );

    let field = changes
        .iter()
        .find(|c| c.change_type == ChangeKind::FieldRemoved)
        .unwrap();
    assert_eq!(
        field.description,
        "Field 'name' removed from 'User' schema"
    );
    assert_eq!(field.path, "/components/schemas/User");
}

#[tokio::test]
async fn successful_enrichment_fills_all_three_annotations() {
    let store = Arc::new(MemoryStore::new());
    let descriptors = Arc::new(ScriptedDescriptors::new());
    descriptors.push("user-service", SPEC_V1);
    descriptors.push("user-service", SPEC_V2);
    let runner = runner_with(
        store.clone(),
        descriptors,
        Arc::new(CannedEnricher),
        &["user-service"],
    );

    runner.analyze("user-service").await.unwrap();
    runner.analyze("user-service").await.unwrap();

    let changes = store.changes_for_service("user-service").await.unwrap();
    assert!(!changes.is_empty());
    for change in changes {
        assert_eq!(
            change.ai_suggestion.as_deref(),
            Some("Deprecate the endpoint first")
        );
        assert!(change.predicted_impact.is_some());
        assert!(change.plain_explanation.is_some());
    }
}

#[tokio::test]
async fn additive_changes_are_not_breaking() {
    let store = Arc::new(MemoryStore::new());
    let descriptors = Arc::new(ScriptedDescriptors::new());
    descriptors.push("user-service", SPEC_V1);
    descriptors.push("user-service", SPEC_V1_PLUS);
    let runner = runner_with(
        store.clone(),
        descriptors,
        Arc::new(FailingEnricher),
        &["user-service"],
    );

    runner.analyze("user-service").await.unwrap();
    let report = runner.analyze("user-service").await.unwrap();

    assert_eq!(report.breaking_changes_count, 0);
    assert!(store.all_changes().await.unwrap().is_empty());
}

#[tokio::test]
async fn pinned_baseline_survives_until_cleared() {
    let store = Arc::new(MemoryStore::new());
    let descriptors = Arc::new(ScriptedDescriptors::new());
    descriptors.push("user-service", SPEC_V1);
    descriptors.push("user-service", SPEC_V2);
    descriptors.push("user-service", SPEC_V1);
    let runner = runner_with(
        store.clone(),
        descriptors,
        Arc::new(FailingEnricher),
        &["user-service"],
    );

    // First run pins the initial snapshot as baseline.
    runner.analyze("user-service").await.unwrap();
    let report = runner.analyze("user-service").await.unwrap();
    assert_eq!(report.breaking_changes_count, 2);

    // Third run restores the original shape; against the pinned baseline
    // that reads as no drift, even though the previous snapshot differed.
    let report = runner.analyze("user-service").await.unwrap();
    assert_eq!(report.breaking_changes_count, 0);

    // Without the baseline the comparison falls back to the previous
    // snapshot, which is identical now.
    BaselineResolver::clear_baseline(&*store, "user-service")
        .await
        .unwrap();
    let report = runner.analyze("user-service").await.unwrap();
    assert_eq!(report.breaking_changes_count, 0);
}

#[tokio::test]
async fn reanalysis_appends_without_touching_prior_statuses() {
    let store = Arc::new(MemoryStore::new());
    let descriptors = Arc::new(ScriptedDescriptors::new());
    descriptors.push("user-service", SPEC_V1);
    descriptors.push("user-service", SPEC_V2);
    let runner = runner_with(
        store.clone(),
        descriptors,
        Arc::new(FailingEnricher),
        &["user-service"],
    );

    runner.analyze("user-service").await.unwrap();
    runner.analyze("user-service").await.unwrap();

    let first_run = store.changes_for_service("user-service").await.unwrap();
    assert_eq!(first_run.len(), 2);
    let acknowledged = ChangeLedger::acknowledge(&*store, &first_run[0].id, "alex@example.com")
        .await
        .unwrap();

    // Same drifted descriptor against the pinned baseline; the run appends
    // fresh records instead of revisiting the earlier ones.
    let report = runner.analyze("user-service").await.unwrap();
    assert_eq!(report.breaking_changes_count, 2);

    let all = store.changes_for_service("user-service").await.unwrap();
    assert_eq!(all.len(), 4);

    let earlier = store
        .get_change(&acknowledged.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(earlier.status, ChangeStatus::Acknowledged);
    assert_eq!(earlier.resolved_by.as_deref(), Some("alex@example.com"));
    assert_eq!(earlier.resolution_notes.as_deref(), Some("Acknowledged by team"));

    let active = store
        .changes_by_status("user-service", ChangeStatus::Active)
        .await
        .unwrap();
    assert_eq!(active.len(), 3);
}

#[tokio::test]
async fn status_update_without_body_is_a_shaped_bad_request() {
    let store = Arc::new(MemoryStore::new());
    let descriptors = Arc::new(ScriptedDescriptors::new());
    let runner = runner_with(
        store.clone(),
        descriptors,
        Arc::new(FailingEnricher),
        &["user-service"],
    );
    let ctx = Arc::new(AppContext {
        store,
        runner,
        retention_keep_default: 10,
    });

    let result = handlers::update_change_status(
        State(ctx),
        Path("some-change-id".to_string()),
        None,
    )
    .await;

    let (status, body) = result.unwrap_err();
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body.0.error, "Status is required");
}

#[tokio::test]
async fn batch_run_tolerates_offline_services() {
    let store = Arc::new(MemoryStore::new());
    let descriptors = Arc::new(ScriptedDescriptors::new());
    descriptors.push("user-service", SPEC_V1);
    // order-service has no scripted responses at all, so it is offline.
    let runner = runner_with(
        store.clone(),
        descriptors,
        Arc::new(FailingEnricher),
        &["user-service", "order-service"],
    );

    let result = runner.analyze_all().await;

    assert_eq!(result.total_services, 2);
    assert_eq!(result.success_count, 1);
    assert_eq!(result.fail_count, 1);
    assert!(matches!(
        result.results["user-service"],
        ServiceAnalysisStatus::Success { breaking_changes: 0 }
    ));
    assert!(matches!(
        result.results["order-service"],
        ServiceAnalysisStatus::Offline
    ));

    // The online service still got its snapshot and baseline.
    assert!(store.has_specs("user-service").await.unwrap());
    assert!(!store.has_specs("order-service").await.unwrap());
}

#[tokio::test]
async fn fetch_and_save_keeps_snapshots_immutable() {
    let store = Arc::new(MemoryStore::new());
    let descriptors = Arc::new(ScriptedDescriptors::new());
    descriptors.push("user-service", SPEC_V1);
    descriptors.push("user-service", SPEC_V2);
    let runner = runner_with(
        store.clone(),
        descriptors,
        Arc::new(FailingEnricher),
        &["user-service"],
    );

    let first = runner.fetch_and_save("user-service").await.unwrap();
    let second = runner.fetch_and_save("user-service").await.unwrap();

    assert_ne!(first.id, second.id);
    let history = store.spec_history("user-service").await.unwrap();
    assert_eq!(history.len(), 2);
    // Newest first; the earlier snapshot still carries its original body.
    assert_eq!(history[0].id, second.id);
    assert_eq!(history[1].spec_content, SPEC_V1);
}
