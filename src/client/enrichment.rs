use crate::config::EnrichmentConfig;
use crate::error::MonitorError;
use crate::model::{ApiSpec, BreakingChange};
use log::info;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::time::Duration;

/// Natural-language annotations for one breaking change.
#[derive(Debug, Clone, PartialEq)]
pub struct Enrichment {
    pub suggestion: String,
    pub impact: String,
    pub explanation: String,
}

/// External text-generation collaborator. A failure applies to one change
/// only; the orchestrator substitutes sentinel text and moves on.
#[async_trait::async_trait]
pub trait Enricher: Send + Sync {
    async fn enrich(
        &self,
        change: &BreakingChange,
        known_services: &[ApiSpec],
    ) -> Result<Enrichment, MonitorError>;
}

/// Used when no enrichment endpoint is configured. Always fails, so every
/// record carries the explicit sentinel rather than an absent field.
pub struct NoopEnricher;

#[async_trait::async_trait]
impl Enricher for NoopEnricher {
    async fn enrich(
        &self,
        _change: &BreakingChange,
        _known_services: &[ApiSpec],
    ) -> Result<Enrichment, MonitorError> {
        Err(MonitorError::EnrichmentFailed(
            "no enrichment endpoint configured".to_string(),
        ))
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

/// Talks to an OpenAI-style chat-completions endpoint. One prompt per
/// enrichment aspect, so a single run issues three completions per change.
pub struct HttpEnricher {
    client: reqwest::Client,
    endpoint: String,
    model: String,
}

impl HttpEnricher {
    pub fn new(endpoint: String, config: &EnrichmentConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_default();
        Self {
            client,
            endpoint,
            model: config.model.clone(),
        }
    }

    async fn complete(&self, prompt: String) -> Result<String, MonitorError> {
        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: prompt,
            }],
        };

        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| MonitorError::EnrichmentFailed(format!("request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(MonitorError::EnrichmentFailed(format!(
                "endpoint returned status {}",
                response.status()
            )));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| MonitorError::EnrichmentFailed(format!("malformed response: {e}")))?;

        parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| MonitorError::EnrichmentFailed("empty response".to_string()))
    }

    fn suggestion_prompt(change: &BreakingChange) -> String {
        format!(
            "A breaking change was detected in a microservices API:\n\n\
             Change Type: {}\nLocation: {}\nDescription: {}\n\
             Old Version: {}\nNew Version: {}\n\n\
             As an expert software architect, suggest a backward-compatible alternative approach. \
             Provide specific, actionable steps that allow gradual migration without breaking \
             existing clients. Format your response as a numbered list.",
            change.change_type, change.path, change.description, change.old_version, change.new_version
        )
    }

    fn impact_prompt(change: &BreakingChange, known_services: &[ApiSpec]) -> String {
        let mut services_info = String::new();
        for spec in known_services {
            let _ = writeln!(services_info, "- {} (version {})", spec.service_name, spec.version);
        }
        format!(
            "A breaking change occurred in the {} microservice:\n\n\
             Change Type: {}\nLocation: {}\nDescription: {}\n\n\
             Available microservices in the system:\n{}\n\
             Predict which services are most likely to be affected, with a confidence score \
             (0-100%) and a reason for each. Format as: Service Name | Confidence | Reason",
            change.service_name, change.change_type, change.path, change.description, services_info
        )
    }

    fn explanation_prompt(change: &BreakingChange) -> String {
        format!(
            "Translate this technical API breaking change into plain English that a non-technical \
             stakeholder can understand:\n\n\
             Change Type: {}\nLocation: {}\nTechnical Description: {}\n\
             Old Version: {}\nNew Version: {}\n\n\
             Provide a one-sentence summary, what it means for clients of the API, and the \
             business impact. Keep it concise and avoid technical terminology.",
            change.change_type, change.path, change.description, change.old_version, change.new_version
        )
    }
}

#[async_trait::async_trait]
impl Enricher for HttpEnricher {
    async fn enrich(
        &self,
        change: &BreakingChange,
        known_services: &[ApiSpec],
    ) -> Result<Enrichment, MonitorError> {
        info!("Generating enrichment for breaking change {}", change.id);
        let suggestion = self.complete(Self::suggestion_prompt(change)).await?;
        let impact = self
            .complete(Self::impact_prompt(change, known_services))
            .await?;
        let explanation = self.complete(Self::explanation_prompt(change)).await?;
        Ok(Enrichment {
            suggestion,
            impact,
            explanation,
        })
    }
}
