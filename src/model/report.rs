use crate::model::{generate_id, ApiSpec, BreakingChange, Id};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;

/// Outcome of one analysis run, including the degenerate first-observation
/// run. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub id: Id,
    pub service_name: String,
    pub breaking_changes_count: usize,
    /// Advisory only; this engine does not detect non-breaking changes.
    pub non_breaking_changes_count: usize,
    pub summary: String,
    pub analyzed_at: DateTime<Utc>,
}

impl AnalysisReport {
    pub fn from_run(
        service_name: &str,
        old_spec: &ApiSpec,
        new_spec: &ApiSpec,
        changes: &[BreakingChange],
    ) -> Self {
        let mut summary = String::new();
        let _ = writeln!(
            summary,
            "Analysis of {}: {} -> {}",
            service_name, old_spec.version, new_spec.version
        );
        let _ = writeln!(summary, "Breaking changes: {}", changes.len());
        if !changes.is_empty() {
            let _ = writeln!(summary, "\nBreaking changes detected:");
            for change in changes {
                let _ = writeln!(
                    summary,
                    "- {} at {}: {}",
                    change.change_type, change.path, change.description
                );
            }
        }

        Self {
            id: generate_id(),
            service_name: service_name.to_string(),
            breaking_changes_count: changes.len(),
            non_breaking_changes_count: 0,
            summary,
            analyzed_at: Utc::now(),
        }
    }

    pub fn baseline(service_name: &str, spec: &ApiSpec) -> Self {
        Self {
            id: generate_id(),
            service_name: service_name.to_string(),
            breaking_changes_count: 0,
            non_breaking_changes_count: 0,
            summary: format!(
                "Baseline spec saved for {}. Version: {}",
                service_name, spec.version
            ),
            analyzed_at: Utc::now(),
        }
    }
}
