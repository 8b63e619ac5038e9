use crate::client::{DescriptorClient, Enricher};
use crate::error::MonitorError;
use crate::logic::baseline::BaselineResolver;
use crate::logic::compare::{Comparator, CompareContext};
use crate::logic::ledger::ChangeLedger;
use crate::model::{
    enrichment_sentinel, AnalysisReport, ApiSpec, BreakingChange, ChangeCandidate,
};
use crate::store::traits::Store;
use log::{info, warn};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Per-service outcome of a batch run.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ServiceAnalysisStatus {
    Success { breaking_changes: usize },
    Offline,
    Error { message: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchAnalysisResult {
    pub total_services: usize,
    pub success_count: usize,
    pub fail_count: usize,
    pub results: HashMap<String, ServiceAnalysisStatus>,
}

/// Drives one analysis run per service: fetch, snapshot, resolve the
/// comparison target, compare, enrich best-effort, persist ledger entries
/// and the run report.
pub struct AnalysisRunner<S> {
    store: Arc<S>,
    descriptors: Arc<dyn DescriptorClient>,
    enricher: Arc<dyn Enricher>,
    known_services: Vec<String>,
    // Serializes concurrent runs for the same service so baseline
    // resolution cannot race; different services proceed independently.
    service_locks: parking_lot::Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl<S: Store> AnalysisRunner<S> {
    pub fn new(
        store: Arc<S>,
        descriptors: Arc<dyn DescriptorClient>,
        enricher: Arc<dyn Enricher>,
        known_services: Vec<String>,
    ) -> Self {
        Self {
            store,
            descriptors,
            enricher,
            known_services,
            service_locks: parking_lot::Mutex::new(HashMap::new()),
        }
    }

    pub fn known_services(&self) -> &[String] {
        &self.known_services
    }

    pub async fn service_available(&self, service_name: &str) -> bool {
        self.descriptors.is_available(service_name).await
    }

    fn lock_for(&self, service_name: &str) -> Arc<Mutex<()>> {
        self.service_locks
            .lock()
            .entry(service_name.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Fetch the current descriptor and persist it as a new immutable
    /// snapshot. Also exposed as a standalone operation without analysis.
    pub async fn fetch_and_save(&self, service_name: &str) -> Result<ApiSpec, MonitorError> {
        info!("Fetching and saving spec for {service_name}");
        let content = self.descriptors.fetch_descriptor(service_name).await?;
        let spec = self
            .store
            .save_spec(ApiSpec::new(service_name.to_string(), content))
            .await?;
        info!("Saved spec for {service_name} with version {}", spec.version);
        Ok(spec)
    }

    pub async fn analyze(&self, service_name: &str) -> Result<AnalysisReport, MonitorError> {
        let lock = self.lock_for(service_name);
        let _guard = lock.lock().await;

        info!("Starting analysis for {service_name}");

        if !self.descriptors.is_available(service_name).await {
            return Err(MonitorError::UpstreamUnavailable(format!(
                "{service_name} is currently offline or unreachable"
            )));
        }

        let new_spec = self.fetch_and_save(service_name).await?;

        let target =
            BaselineResolver::resolve_comparison_target(&*self.store, service_name).await?;

        let Some(old_spec) = target else {
            info!("Not enough history to analyze {service_name}. Creating initial baseline.");
            self.store
                .set_baseline(service_name, &new_spec.id)
                .await?
                .ok_or_else(|| {
                    MonitorError::AnalysisFailed(anyhow::anyhow!(
                        "freshly saved spec {} disappeared before baseline pinning",
                        new_spec.id
                    ))
                })?;
            let report = self
                .store
                .save_report(AnalysisReport::baseline(service_name, &new_spec))
                .await?;
            return Ok(report);
        };

        let candidates = self.compare_snapshots(&old_spec, &new_spec);

        let mut records: Vec<BreakingChange> = candidates
            .into_iter()
            .map(BreakingChange::from_candidate)
            .collect();

        if !records.is_empty() {
            let known_services = self.store.latest_specs_for_all().await?;
            for change in &mut records {
                self.enrich_change(change, &known_services).await;
            }
            records = ChangeLedger::record_all(&*self.store, records).await?;
        }

        let report = self
            .store
            .save_report(AnalysisReport::from_run(
                service_name,
                &old_spec,
                &new_spec,
                &records,
            ))
            .await?;

        info!(
            "Analysis complete for {service_name}. Found {} breaking changes",
            records.len()
        );
        Ok(report)
    }

    /// Parse both snapshots and run the comparator. A malformed document is
    /// logged and swallowed into an empty change set rather than failing
    /// the run.
    fn compare_snapshots(&self, old_spec: &ApiSpec, new_spec: &ApiSpec) -> Vec<ChangeCandidate> {
        let old_doc = match old_spec.document() {
            Ok(doc) => doc,
            Err(e) => {
                warn!(
                    "Error comparing specs for {}: failed to parse version {}: {e}",
                    old_spec.service_name, old_spec.version
                );
                return Vec::new();
            }
        };
        let new_doc = match new_spec.document() {
            Ok(doc) => doc,
            Err(e) => {
                warn!(
                    "Error comparing specs for {}: failed to parse version {}: {e}",
                    new_spec.service_name, new_spec.version
                );
                return Vec::new();
            }
        };

        let ctx = CompareContext {
            service_name: &new_spec.service_name,
            old_version: &old_spec.version,
            new_version: &new_spec.version,
        };
        Comparator::compare(&ctx, &old_doc, &new_doc)
    }

    /// Best-effort enrichment of one record. Failure substitutes the
    /// sentinel text and never affects sibling changes or the run.
    async fn enrich_change(&self, change: &mut BreakingChange, known_services: &[ApiSpec]) {
        match self.enricher.enrich(change, known_services).await {
            Ok(enrichment) => {
                change.ai_suggestion = Some(enrichment.suggestion);
                change.predicted_impact = Some(enrichment.impact);
                change.plain_explanation = Some(enrichment.explanation);
            }
            Err(e) => {
                warn!("Enrichment failed for change {}: {e}", change.id);
                let sentinel = enrichment_sentinel(&e.reason());
                change.ai_suggestion = Some(sentinel.clone());
                change.predicted_impact = Some(sentinel.clone());
                change.plain_explanation = Some(sentinel);
            }
        }
    }

    /// Analyze every configured service, converting per-service failures
    /// into status entries instead of aborting the batch.
    pub async fn analyze_all(&self) -> BatchAnalysisResult {
        info!("Starting batch analysis of {} services", self.known_services.len());

        let mut results = HashMap::new();
        let mut success_count = 0;
        let mut fail_count = 0;

        for service in &self.known_services {
            match self.analyze(service).await {
                Ok(report) => {
                    results.insert(
                        service.clone(),
                        ServiceAnalysisStatus::Success {
                            breaking_changes: report.breaking_changes_count,
                        },
                    );
                    success_count += 1;
                }
                Err(MonitorError::UpstreamUnavailable(_)) => {
                    results.insert(service.clone(), ServiceAnalysisStatus::Offline);
                    fail_count += 1;
                }
                Err(e) => {
                    warn!("Error analyzing {service}: {e}");
                    results.insert(
                        service.clone(),
                        ServiceAnalysisStatus::Error {
                            message: e.to_string(),
                        },
                    );
                    fail_count += 1;
                }
            }
        }

        BatchAnalysisResult {
            total_services: self.known_services.len(),
            success_count,
            fail_count,
            results,
        }
    }
}
