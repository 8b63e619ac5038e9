use crate::error::MonitorError;
use crate::model::{BreakingChange, ChangeStatus, Id};
use crate::store::traits::Store;
use chrono::Utc;
use itertools::Itertools;
use log::info;
use serde::Serialize;
use std::collections::HashMap;

/// Aggregate counts across all services.
#[derive(Debug, Clone, Serialize)]
pub struct ChangeStatistics {
    pub total_breaking_changes: usize,
    pub breaking_changes_by_type: HashMap<String, usize>,
    pub active_breaking_changes: usize,
}

/// Per-service count rollup.
#[derive(Debug, Clone, Serialize)]
pub struct ServiceChangeSummary {
    pub service_name: String,
    pub total_breaking_changes: usize,
    pub by_type: HashMap<String, usize>,
}

/// Lifecycle operations and queries over the persistent change ledger.
/// Analysis runs only append; status changes are explicit user actions and
/// terminal states reject further transitions.
pub struct ChangeLedger;

impl ChangeLedger {
    pub async fn record_all<S: Store>(
        store: &S,
        changes: Vec<BreakingChange>,
    ) -> anyhow::Result<Vec<BreakingChange>> {
        info!("Recording {} breaking changes", changes.len());
        store.save_changes(changes).await
    }

    /// General status primitive. Fails with `NotFound` for unknown ids and
    /// with `InvalidInput` when the record is already resolved or ignored.
    pub async fn update_status<S: Store>(
        store: &S,
        id: &Id,
        status: ChangeStatus,
        actor: &str,
        notes: Option<String>,
    ) -> Result<BreakingChange, MonitorError> {
        info!("Updating status of breaking change {id} to {status}");

        let mut change = store
            .get_change(id)
            .await?
            .ok_or_else(|| MonitorError::NotFound(format!("breaking change not found: {id}")))?;

        if change.is_terminal() {
            return Err(MonitorError::InvalidInput(format!(
                "breaking change {id} is already {} and cannot transition to {status}",
                change.status
            )));
        }

        change.status = status;
        change.resolved_by = Some(actor.to_string());
        if status == ChangeStatus::Resolved {
            change.resolved_at = Some(Utc::now());
        }
        if let Some(notes) = notes.filter(|n| !n.is_empty()) {
            change.resolution_notes = Some(notes);
        }

        store.update_change(change.clone()).await?;
        Ok(change)
    }

    pub async fn acknowledge<S: Store>(
        store: &S,
        id: &Id,
        actor: &str,
    ) -> Result<BreakingChange, MonitorError> {
        Self::update_status(
            store,
            id,
            ChangeStatus::Acknowledged,
            actor,
            Some("Acknowledged by team".to_string()),
        )
        .await
    }

    pub async fn resolve<S: Store>(
        store: &S,
        id: &Id,
        actor: &str,
        notes: Option<String>,
    ) -> Result<BreakingChange, MonitorError> {
        let notes = notes
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| "Resolved".to_string());
        Self::update_status(store, id, ChangeStatus::Resolved, actor, Some(notes)).await
    }

    pub async fn ignore<S: Store>(
        store: &S,
        id: &Id,
        actor: &str,
        reason: Option<String>,
    ) -> Result<BreakingChange, MonitorError> {
        let reason = reason
            .filter(|r| !r.is_empty())
            .unwrap_or_else(|| "Marked as intentional".to_string());
        Self::update_status(store, id, ChangeStatus::Ignored, actor, Some(reason)).await
    }

    pub async fn active_changes<S: Store>(
        store: &S,
        service_name: &str,
    ) -> anyhow::Result<Vec<BreakingChange>> {
        store
            .changes_by_status(service_name, ChangeStatus::Active)
            .await
    }

    /// Newest-first truncation, not a cursor.
    pub async fn recent_changes<S: Store>(
        store: &S,
        service_name: &str,
        limit: usize,
    ) -> anyhow::Result<Vec<BreakingChange>> {
        let mut changes = store.changes_for_service(service_name).await?;
        changes.truncate(limit);
        Ok(changes)
    }

    pub async fn summary<S: Store>(
        store: &S,
        service_name: &str,
    ) -> anyhow::Result<ServiceChangeSummary> {
        let changes = store.changes_for_service(service_name).await?;
        let by_type = changes
            .iter()
            .counts_by(|c| c.change_type.to_string());
        Ok(ServiceChangeSummary {
            service_name: service_name.to_string(),
            total_breaking_changes: changes.len(),
            by_type,
        })
    }

    pub async fn statistics<S: Store>(store: &S) -> anyhow::Result<ChangeStatistics> {
        let changes = store.all_changes().await?;
        let by_type = changes
            .iter()
            .counts_by(|c| c.change_type.to_string());
        Ok(ChangeStatistics {
            total_breaking_changes: changes.len(),
            breaking_changes_by_type: by_type,
            active_breaking_changes: store.count_active_changes().await?,
        })
    }
}
