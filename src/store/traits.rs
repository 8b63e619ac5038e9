use crate::model::{AnalysisReport, ApiSpec, BreakingChange, ChangeKind, ChangeStatus, Id};
use anyhow::Result;

/// Persistence contract for descriptor snapshots. History ordering is
/// newest-first throughout.
#[async_trait::async_trait]
pub trait SpecStore: Send + Sync {
    async fn save_spec(&self, spec: ApiSpec) -> Result<ApiSpec>;
    async fn get_spec(&self, id: &Id) -> Result<Option<ApiSpec>>;
    async fn latest_spec(&self, service_name: &str) -> Result<Option<ApiSpec>>;
    async fn spec_history(&self, service_name: &str) -> Result<Vec<ApiSpec>>;
    async fn spec_by_version(&self, service_name: &str, version: &str) -> Result<Option<ApiSpec>>;
    /// Latest snapshot of every service that has one.
    async fn latest_specs_for_all(&self) -> Result<Vec<ApiSpec>>;
    async fn has_specs(&self, service_name: &str) -> Result<bool>;
    async fn total_spec_count(&self) -> Result<usize>;
    async fn baseline_spec(&self, service_name: &str) -> Result<Option<ApiSpec>>;
    /// Atomically clear any existing baseline for the service and flag the
    /// given snapshot. Returns `None` when the snapshot id is unknown or
    /// belongs to a different service.
    async fn set_baseline(&self, service_name: &str, spec_id: &Id) -> Result<Option<ApiSpec>>;
    async fn clear_baseline(&self, service_name: &str) -> Result<()>;
    /// Delete all but the `keep` most recent snapshots for the service. The
    /// current baseline survives even when it falls outside the retained
    /// window. Returns the number of deleted snapshots.
    async fn cleanup_old_specs(&self, service_name: &str, keep: usize) -> Result<usize>;
}

/// Persistence contract for the breaking-change ledger. Append-mostly: runs
/// only add records, status mutation goes through `update_change`.
#[async_trait::async_trait]
pub trait ChangeStore: Send + Sync {
    async fn save_changes(&self, changes: Vec<BreakingChange>) -> Result<Vec<BreakingChange>>;
    async fn get_change(&self, id: &Id) -> Result<Option<BreakingChange>>;
    async fn update_change(&self, change: BreakingChange) -> Result<()>;
    async fn changes_for_service(&self, service_name: &str) -> Result<Vec<BreakingChange>>;
    async fn changes_by_kind(
        &self,
        service_name: &str,
        kind: ChangeKind,
    ) -> Result<Vec<BreakingChange>>;
    async fn changes_by_status(
        &self,
        service_name: &str,
        status: ChangeStatus,
    ) -> Result<Vec<BreakingChange>>;
    async fn all_changes(&self) -> Result<Vec<BreakingChange>>;
    async fn count_changes_for_service(&self, service_name: &str) -> Result<usize>;
    async fn count_changes_by_status(
        &self,
        service_name: &str,
        status: ChangeStatus,
    ) -> Result<usize>;
    async fn count_active_changes(&self) -> Result<usize>;
}

#[async_trait::async_trait]
pub trait ReportStore: Send + Sync {
    async fn save_report(&self, report: AnalysisReport) -> Result<AnalysisReport>;
    async fn latest_report(&self, service_name: &str) -> Result<Option<AnalysisReport>>;
    async fn report_history(&self, service_name: &str) -> Result<Vec<AnalysisReport>>;
}

pub trait Store: SpecStore + ChangeStore + ReportStore + Send + Sync {}
