use crate::model::{generate_id, DocNode, Id};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const DEFAULT_ENVIRONMENT: &str = "development";

/// One immutable snapshot of a service's API descriptor. Content never
/// changes after creation; only the baseline flag and its timestamp are
/// toggled administratively.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiSpec {
    pub id: Id,
    pub service_name: String,
    /// Opaque version label, timestamp-based so labels sort by fetch time.
    pub version: String,
    pub spec_content: String,
    pub fetched_at: DateTime<Utc>,
    pub is_baseline: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub baseline_set_at: Option<DateTime<Utc>>,
    pub environment: String,
}

impl ApiSpec {
    pub fn new(service_name: String, spec_content: String) -> Self {
        let fetched_at = Utc::now();
        Self {
            id: generate_id(),
            service_name,
            version: fetched_at.to_rfc3339(),
            spec_content,
            fetched_at,
            is_baseline: false,
            baseline_set_at: None,
            environment: DEFAULT_ENVIRONMENT.to_string(),
        }
    }

    /// Parse the stored content into a document tree.
    pub fn document(&self) -> anyhow::Result<DocNode> {
        DocNode::parse(&self.spec_content)
    }
}
