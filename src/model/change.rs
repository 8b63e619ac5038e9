use crate::model::{generate_id, Id};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Closed taxonomy of client-breaking changes. Additions (new endpoints,
/// schemas, properties) are never classified as breaking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChangeKind {
    EndpointRemoved,
    MethodRemoved,
    FieldRemoved,
    TypeChanged,
    SchemaRemoved,
}

impl ChangeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeKind::EndpointRemoved => "ENDPOINT_REMOVED",
            ChangeKind::MethodRemoved => "METHOD_REMOVED",
            ChangeKind::FieldRemoved => "FIELD_REMOVED",
            ChangeKind::TypeChanged => "TYPE_CHANGED",
            ChangeKind::SchemaRemoved => "SCHEMA_REMOVED",
        }
    }
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChangeKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "ENDPOINT_REMOVED" => Ok(ChangeKind::EndpointRemoved),
            "METHOD_REMOVED" => Ok(ChangeKind::MethodRemoved),
            "FIELD_REMOVED" => Ok(ChangeKind::FieldRemoved),
            "TYPE_CHANGED" => Ok(ChangeKind::TypeChanged),
            "SCHEMA_REMOVED" => Ok(ChangeKind::SchemaRemoved),
            other => Err(format!("unknown change type: {other}")),
        }
    }
}

/// Lifecycle state of a recorded breaking change. `Resolved` and `Ignored`
/// are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChangeStatus {
    Active,
    Acknowledged,
    Resolved,
    Ignored,
}

impl ChangeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeStatus::Active => "ACTIVE",
            ChangeStatus::Acknowledged => "ACKNOWLEDGED",
            ChangeStatus::Resolved => "RESOLVED",
            ChangeStatus::Ignored => "IGNORED",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ChangeStatus::Resolved | ChangeStatus::Ignored)
    }
}

impl fmt::Display for ChangeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChangeStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "ACTIVE" => Ok(ChangeStatus::Active),
            "ACKNOWLEDGED" => Ok(ChangeStatus::Acknowledged),
            "RESOLVED" => Ok(ChangeStatus::Resolved),
            "IGNORED" => Ok(ChangeStatus::Ignored),
            other => Err(format!(
                "invalid status '{other}'. Must be one of: ACTIVE, ACKNOWLEDGED, RESOLVED, IGNORED"
            )),
        }
    }
}

/// Comparator output before persistence. Identity and lifecycle fields are
/// assigned when the candidate is recorded in the ledger.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeCandidate {
    pub service_name: String,
    pub kind: ChangeKind,
    pub path: String,
    pub description: String,
    pub old_version: String,
    pub new_version: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreakingChange {
    pub id: Id,
    pub service_name: String,
    pub change_type: ChangeKind,
    pub path: String,
    pub description: String,
    pub old_version: String,
    pub new_version: String,
    pub detected_at: DateTime<Utc>,
    // Enrichment fields, populated best-effort. A sentinel is substituted on
    // failure so "attempted and failed" is distinguishable from "not yet run".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_suggestion: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub predicted_impact: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plain_explanation: Option<String>,
    pub status: ChangeStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolution_notes: Option<String>,
}

impl BreakingChange {
    pub fn from_candidate(candidate: ChangeCandidate) -> Self {
        Self {
            id: generate_id(),
            service_name: candidate.service_name,
            change_type: candidate.kind,
            path: candidate.path,
            description: candidate.description,
            old_version: candidate.old_version,
            new_version: candidate.new_version,
            detected_at: Utc::now(),
            ai_suggestion: None,
            predicted_impact: None,
            plain_explanation: None,
            status: ChangeStatus::Active,
            resolved_at: None,
            resolved_by: None,
            resolution_notes: None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

/// Sentinel recorded in the enrichment fields when enrichment was attempted
/// and failed.
pub fn enrichment_sentinel(reason: &str) -> String {
    format!("enrichment unavailable: {reason}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn change_kind_round_trips_through_str() {
        for kind in [
            ChangeKind::EndpointRemoved,
            ChangeKind::MethodRemoved,
            ChangeKind::FieldRemoved,
            ChangeKind::TypeChanged,
            ChangeKind::SchemaRemoved,
        ] {
            assert_eq!(kind.as_str().parse::<ChangeKind>().unwrap(), kind);
        }
        assert!("NOT_A_KIND".parse::<ChangeKind>().is_err());
    }

    #[test]
    fn status_parsing_is_case_insensitive() {
        assert_eq!("resolved".parse::<ChangeStatus>().unwrap(), ChangeStatus::Resolved);
        assert!("DELETED".parse::<ChangeStatus>().is_err());
    }

    #[test]
    fn new_record_starts_active_without_lifecycle_fields() {
        let change = BreakingChange::from_candidate(ChangeCandidate {
            service_name: "user-service".to_string(),
            kind: ChangeKind::EndpointRemoved,
            path: "/users".to_string(),
            description: "Endpoint '/users' was removed".to_string(),
            old_version: "v1".to_string(),
            new_version: "v2".to_string(),
        });
        assert_eq!(change.status, ChangeStatus::Active);
        assert!(change.resolved_at.is_none());
        assert!(change.ai_suggestion.is_none());
        assert!(!change.is_terminal());
    }
}
