use thiserror::Error;

/// Failure taxonomy for the drift engine. `EnrichmentFailed` is always
/// recovered per change and never surfaces past the record it affects; the
/// rest propagate to the run boundary.
#[derive(Debug, Error)]
pub enum MonitorError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("service unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("enrichment failed: {0}")]
    EnrichmentFailed(String),

    #[error("analysis failed: {0}")]
    AnalysisFailed(#[from] anyhow::Error),
}

impl MonitorError {
    /// Short reason text for sentinel substitution, without the variant
    /// prefix repeated.
    pub fn reason(&self) -> String {
        match self {
            MonitorError::EnrichmentFailed(reason) => reason.clone(),
            other => other.to_string(),
        }
    }
}
