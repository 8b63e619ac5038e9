use crate::model::{AnalysisReport, ApiSpec, BreakingChange, ChangeKind, ChangeStatus, Id};
use crate::store::traits::{ChangeStore, ReportStore, SpecStore, Store};
use anyhow::Result;
use chrono::Utc;
use parking_lot::RwLock;
use std::collections::HashSet;

#[derive(Debug, Default)]
struct MemoryState {
    // Insertion order doubles as fetch order; newest entries are at the tail.
    specs: Vec<ApiSpec>,
    changes: Vec<BreakingChange>,
    reports: Vec<AnalysisReport>,
}

/// In-memory store used by the server and the test suites. All reads and
/// writes take the single state lock, so multi-step operations like
/// `set_baseline` are atomic with respect to other store calls.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl SpecStore for MemoryStore {
    async fn save_spec(&self, spec: ApiSpec) -> Result<ApiSpec> {
        let mut state = self.state.write();
        state.specs.push(spec.clone());
        Ok(spec)
    }

    async fn get_spec(&self, id: &Id) -> Result<Option<ApiSpec>> {
        let state = self.state.read();
        Ok(state.specs.iter().find(|s| &s.id == id).cloned())
    }

    async fn latest_spec(&self, service_name: &str) -> Result<Option<ApiSpec>> {
        let state = self.state.read();
        Ok(state
            .specs
            .iter()
            .rev()
            .find(|s| s.service_name == service_name)
            .cloned())
    }

    async fn spec_history(&self, service_name: &str) -> Result<Vec<ApiSpec>> {
        let state = self.state.read();
        Ok(state
            .specs
            .iter()
            .rev()
            .filter(|s| s.service_name == service_name)
            .cloned()
            .collect())
    }

    async fn spec_by_version(&self, service_name: &str, version: &str) -> Result<Option<ApiSpec>> {
        let state = self.state.read();
        Ok(state
            .specs
            .iter()
            .find(|s| s.service_name == service_name && s.version == version)
            .cloned())
    }

    async fn latest_specs_for_all(&self) -> Result<Vec<ApiSpec>> {
        let state = self.state.read();
        let mut seen = HashSet::new();
        let mut latest = Vec::new();
        for spec in state.specs.iter().rev() {
            if seen.insert(spec.service_name.clone()) {
                latest.push(spec.clone());
            }
        }
        Ok(latest)
    }

    async fn has_specs(&self, service_name: &str) -> Result<bool> {
        let state = self.state.read();
        Ok(state.specs.iter().any(|s| s.service_name == service_name))
    }

    async fn total_spec_count(&self) -> Result<usize> {
        Ok(self.state.read().specs.len())
    }

    async fn baseline_spec(&self, service_name: &str) -> Result<Option<ApiSpec>> {
        let state = self.state.read();
        Ok(state
            .specs
            .iter()
            .find(|s| s.service_name == service_name && s.is_baseline)
            .cloned())
    }

    async fn set_baseline(&self, service_name: &str, spec_id: &Id) -> Result<Option<ApiSpec>> {
        let mut state = self.state.write();
        // The snapshot must exist and belong to the named service, otherwise
        // a foreign id could leave two flagged snapshots behind.
        if !state
            .specs
            .iter()
            .any(|s| &s.id == spec_id && s.service_name == service_name)
        {
            return Ok(None);
        }
        for spec in state
            .specs
            .iter_mut()
            .filter(|s| s.service_name == service_name)
        {
            spec.is_baseline = false;
            spec.baseline_set_at = None;
        }
        let updated = state
            .specs
            .iter_mut()
            .find(|s| &s.id == spec_id)
            .map(|spec| {
                spec.is_baseline = true;
                spec.baseline_set_at = Some(Utc::now());
                spec.clone()
            });
        Ok(updated)
    }

    async fn clear_baseline(&self, service_name: &str) -> Result<()> {
        let mut state = self.state.write();
        for spec in state
            .specs
            .iter_mut()
            .filter(|s| s.service_name == service_name)
        {
            spec.is_baseline = false;
            spec.baseline_set_at = None;
        }
        Ok(())
    }

    async fn cleanup_old_specs(&self, service_name: &str, keep: usize) -> Result<usize> {
        let mut state = self.state.write();
        let service_ids: Vec<Id> = state
            .specs
            .iter()
            .filter(|s| s.service_name == service_name)
            .map(|s| s.id.clone())
            .collect();
        if service_ids.len() <= keep {
            return Ok(0);
        }
        // Retain the `keep` most recent plus the baseline, wherever it sits.
        let mut retained: HashSet<Id> = service_ids
            .iter()
            .rev()
            .take(keep)
            .cloned()
            .collect();
        if let Some(baseline) = state
            .specs
            .iter()
            .find(|s| s.service_name == service_name && s.is_baseline)
        {
            retained.insert(baseline.id.clone());
        }
        let before = state.specs.len();
        state
            .specs
            .retain(|s| s.service_name != service_name || retained.contains(&s.id));
        Ok(before - state.specs.len())
    }
}

#[async_trait::async_trait]
impl ChangeStore for MemoryStore {
    async fn save_changes(&self, changes: Vec<BreakingChange>) -> Result<Vec<BreakingChange>> {
        let mut state = self.state.write();
        state.changes.extend(changes.iter().cloned());
        Ok(changes)
    }

    async fn get_change(&self, id: &Id) -> Result<Option<BreakingChange>> {
        let state = self.state.read();
        Ok(state.changes.iter().find(|c| &c.id == id).cloned())
    }

    async fn update_change(&self, change: BreakingChange) -> Result<()> {
        let mut state = self.state.write();
        match state.changes.iter_mut().find(|c| c.id == change.id) {
            Some(existing) => {
                *existing = change;
                Ok(())
            }
            None => Err(anyhow::anyhow!("breaking change not found: {}", change.id)),
        }
    }

    async fn changes_for_service(&self, service_name: &str) -> Result<Vec<BreakingChange>> {
        let state = self.state.read();
        Ok(state
            .changes
            .iter()
            .rev()
            .filter(|c| c.service_name == service_name)
            .cloned()
            .collect())
    }

    async fn changes_by_kind(
        &self,
        service_name: &str,
        kind: ChangeKind,
    ) -> Result<Vec<BreakingChange>> {
        let state = self.state.read();
        Ok(state
            .changes
            .iter()
            .rev()
            .filter(|c| c.service_name == service_name && c.change_type == kind)
            .cloned()
            .collect())
    }

    async fn changes_by_status(
        &self,
        service_name: &str,
        status: ChangeStatus,
    ) -> Result<Vec<BreakingChange>> {
        let state = self.state.read();
        Ok(state
            .changes
            .iter()
            .rev()
            .filter(|c| c.service_name == service_name && c.status == status)
            .cloned()
            .collect())
    }

    async fn all_changes(&self) -> Result<Vec<BreakingChange>> {
        let state = self.state.read();
        Ok(state.changes.iter().rev().cloned().collect())
    }

    async fn count_changes_for_service(&self, service_name: &str) -> Result<usize> {
        let state = self.state.read();
        Ok(state
            .changes
            .iter()
            .filter(|c| c.service_name == service_name)
            .count())
    }

    async fn count_changes_by_status(
        &self,
        service_name: &str,
        status: ChangeStatus,
    ) -> Result<usize> {
        let state = self.state.read();
        Ok(state
            .changes
            .iter()
            .filter(|c| c.service_name == service_name && c.status == status)
            .count())
    }

    async fn count_active_changes(&self) -> Result<usize> {
        let state = self.state.read();
        Ok(state
            .changes
            .iter()
            .filter(|c| c.status == ChangeStatus::Active)
            .count())
    }
}

#[async_trait::async_trait]
impl ReportStore for MemoryStore {
    async fn save_report(&self, report: AnalysisReport) -> Result<AnalysisReport> {
        let mut state = self.state.write();
        state.reports.push(report.clone());
        Ok(report)
    }

    async fn latest_report(&self, service_name: &str) -> Result<Option<AnalysisReport>> {
        let state = self.state.read();
        Ok(state
            .reports
            .iter()
            .rev()
            .find(|r| r.service_name == service_name)
            .cloned())
    }

    async fn report_history(&self, service_name: &str) -> Result<Vec<AnalysisReport>> {
        let state = self.state.read();
        Ok(state
            .reports
            .iter()
            .rev()
            .filter(|r| r.service_name == service_name)
            .cloned()
            .collect())
    }
}

impl Store for MemoryStore {}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(service: &str, content: &str) -> ApiSpec {
        ApiSpec::new(service.to_string(), content.to_string())
    }

    #[tokio::test]
    async fn history_is_newest_first() {
        let store = MemoryStore::new();
        let a = store.save_spec(spec("user-service", "{}")).await.unwrap();
        let b = store.save_spec(spec("user-service", "{}")).await.unwrap();
        store.save_spec(spec("order-service", "{}")).await.unwrap();

        let history = store.spec_history("user-service").await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].id, b.id);
        assert_eq!(history[1].id, a.id);
        assert_eq!(store.latest_spec("user-service").await.unwrap().unwrap().id, b.id);
    }

    #[tokio::test]
    async fn set_baseline_clears_the_previous_flag() {
        let store = MemoryStore::new();
        let first = store.save_spec(spec("user-service", "{}")).await.unwrap();
        let second = store.save_spec(spec("user-service", "{}")).await.unwrap();

        store.set_baseline("user-service", &first.id).await.unwrap();
        let updated = store
            .set_baseline("user-service", &second.id)
            .await
            .unwrap()
            .unwrap();
        assert!(updated.is_baseline);
        assert!(updated.baseline_set_at.is_some());

        let flagged: Vec<ApiSpec> = store
            .spec_history("user-service")
            .await
            .unwrap()
            .into_iter()
            .filter(|s| s.is_baseline)
            .collect();
        assert_eq!(flagged.len(), 1);
        assert_eq!(flagged[0].id, second.id);
    }

    #[tokio::test]
    async fn set_baseline_with_unknown_id_is_none() {
        let store = MemoryStore::new();
        store.save_spec(spec("user-service", "{}")).await.unwrap();
        let result = store
            .set_baseline("user-service", &"missing".to_string())
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn set_baseline_rejects_snapshots_of_other_services() {
        let store = MemoryStore::new();
        let foreign = store.save_spec(spec("order-service", "{}")).await.unwrap();
        store.save_spec(spec("user-service", "{}")).await.unwrap();

        let result = store
            .set_baseline("user-service", &foreign.id)
            .await
            .unwrap();
        assert!(result.is_none());
        assert!(store.baseline_spec("user-service").await.unwrap().is_none());
        assert!(store.baseline_spec("order-service").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn cleanup_keeps_most_recent_snapshots() {
        let store = MemoryStore::new();
        for _ in 0..5 {
            store.save_spec(spec("user-service", "{}")).await.unwrap();
        }
        let deleted = store.cleanup_old_specs("user-service", 2).await.unwrap();
        assert_eq!(deleted, 3);
        assert_eq!(store.spec_history("user-service").await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn cleanup_never_deletes_the_baseline() {
        let store = MemoryStore::new();
        let oldest = store.save_spec(spec("user-service", "{}")).await.unwrap();
        for _ in 0..3 {
            store.save_spec(spec("user-service", "{}")).await.unwrap();
        }
        store.set_baseline("user-service", &oldest.id).await.unwrap();

        let deleted = store.cleanup_old_specs("user-service", 1).await.unwrap();
        assert_eq!(deleted, 2);

        let remaining = store.spec_history("user-service").await.unwrap();
        assert_eq!(remaining.len(), 2);
        assert!(remaining.iter().any(|s| s.id == oldest.id && s.is_baseline));
    }

    #[tokio::test]
    async fn update_change_rejects_unknown_ids() {
        let store = MemoryStore::new();
        let change = BreakingChange::from_candidate(crate::model::ChangeCandidate {
            service_name: "user-service".to_string(),
            kind: ChangeKind::EndpointRemoved,
            path: "/users".to_string(),
            description: "Endpoint '/users' was removed".to_string(),
            old_version: "v1".to_string(),
            new_version: "v2".to_string(),
        });
        assert!(store.update_change(change).await.is_err());
    }
}
