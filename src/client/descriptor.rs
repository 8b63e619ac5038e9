use crate::config::ServiceEndpoint;
use crate::error::MonitorError;
use log::{info, warn};
use std::collections::HashMap;
use std::time::Duration;

/// External collaborator that serves raw API descriptor documents.
#[async_trait::async_trait]
pub trait DescriptorClient: Send + Sync {
    async fn fetch_descriptor(&self, service_name: &str) -> Result<String, MonitorError>;
    async fn is_available(&self, service_name: &str) -> bool;
}

/// Fetches descriptors over HTTP from each service's `/api-docs` endpoint.
pub struct HttpDescriptorClient {
    client: reqwest::Client,
    base_urls: HashMap<String, String>,
}

impl HttpDescriptorClient {
    pub fn new(services: &[ServiceEndpoint]) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_default();
        let base_urls = services
            .iter()
            .map(|s| (s.name.clone(), s.url.trim_end_matches('/').to_string()))
            .collect();
        Self { client, base_urls }
    }

    fn docs_url(&self, service_name: &str) -> Result<String, MonitorError> {
        self.base_urls
            .get(service_name)
            .map(|base| format!("{base}/api-docs"))
            .ok_or_else(|| MonitorError::NotFound(format!("unknown service: {service_name}")))
    }
}

#[async_trait::async_trait]
impl DescriptorClient for HttpDescriptorClient {
    async fn fetch_descriptor(&self, service_name: &str) -> Result<String, MonitorError> {
        let url = self.docs_url(service_name)?;
        info!("Fetching API descriptor from {url}");

        let response = self.client.get(&url).send().await.map_err(|e| {
            warn!("Failed to connect to {service_name}: {e}");
            MonitorError::UpstreamUnavailable(format!("{service_name} is not available: {e}"))
        })?;

        if !response.status().is_success() {
            return Err(MonitorError::UpstreamUnavailable(format!(
                "{service_name} returned status {}",
                response.status()
            )));
        }

        let body = response.text().await.map_err(|e| {
            MonitorError::UpstreamUnavailable(format!(
                "failed to read descriptor from {service_name}: {e}"
            ))
        })?;
        info!("Successfully fetched descriptor for {service_name}");
        Ok(body)
    }

    async fn is_available(&self, service_name: &str) -> bool {
        match self.fetch_descriptor(service_name).await {
            Ok(_) => true,
            Err(e) => {
                warn!("Service {service_name} is not available: {e}");
                false
            }
        }
    }
}
