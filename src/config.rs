use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    /// Monitored services, injected here rather than hard-coded in the
    /// orchestrator. Batch analysis walks exactly this list.
    pub services: Vec<ServiceEndpoint>,
    pub enrichment: EnrichmentConfig,
    pub retention: RetentionConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceEndpoint {
    pub name: String,
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrichmentConfig {
    /// Chat-completions style endpoint. When unset, enrichment is disabled
    /// and records carry the sentinel text instead.
    pub endpoint: Option<String>,
    pub model: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetentionConfig {
    /// Default "keep last N" for snapshot cleanup.
    pub keep_default: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            services: vec![
                ServiceEndpoint {
                    name: "user-service".to_string(),
                    url: "http://localhost:8081".to_string(),
                },
                ServiceEndpoint {
                    name: "order-service".to_string(),
                    url: "http://localhost:8082".to_string(),
                },
                ServiceEndpoint {
                    name: "product-service".to_string(),
                    url: "http://localhost:8083".to_string(),
                },
                ServiceEndpoint {
                    name: "notification-service".to_string(),
                    url: "http://localhost:8084".to_string(),
                },
            ],
            enrichment: EnrichmentConfig::default(),
            retention: RetentionConfig::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3001,
        }
    }
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            model: "gpt-4".to_string(),
            timeout_secs: 30,
        }
    }
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self { keep_default: 10 }
    }
}

impl AppConfig {
    /// Load configuration from defaults, an optional config file, and
    /// environment variables with prefix "DRIFT_".
    pub fn load() -> anyhow::Result<Self> {
        let mut config = config::Config::builder();

        config = config.add_source(config::Config::try_from(&AppConfig::default())?);

        config = config.add_source(config::File::with_name("config").required(false));

        config = config.add_source(
            config::Environment::with_prefix("DRIFT")
                .separator("_")
                .prefix_separator("_"),
        );

        let config = config.build()?;
        let app_config: AppConfig = config.try_deserialize()?;

        Ok(app_config)
    }

    /// Get the server bind address
    pub fn server_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    pub fn known_service_names(&self) -> Vec<String> {
        self.services.iter().map(|s| s.name.clone()).collect()
    }
}
