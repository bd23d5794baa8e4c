//! HTTP diagnostics sink - posts plugin failure reports as JSON

use async_trait::async_trait;
use reqwest::Client;

use crate::application::errors::BotError;
use crate::domain::traits::{DiagnosticReport, DiagnosticsSink};
use crate::infrastructure::config::DiagnosticsConfig;

pub struct HttpDiagnostics {
    client: Client,
    endpoint: String,
}

impl HttpDiagnostics {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.into(),
        }
    }

    /// `None` unless reporting is enabled and an endpoint is set
    pub fn from_config(config: &DiagnosticsConfig) -> Option<Self> {
        match (&config.endpoint, config.enabled) {
            (Some(endpoint), true) if !endpoint.is_empty() => Some(Self::new(endpoint.clone())),
            _ => None,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl DiagnosticsSink for HttpDiagnostics {
    async fn report(&self, report: DiagnosticReport) -> Result<(), BotError> {
        let response = self
            .client
            .post(&self.endpoint)
            .header("Content-Type", "application/json")
            .json(&report)
            .send()
            .await
            .map_err(|e| BotError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(BotError::Transport(format!("diagnostics endpoint returned {}", status)));
        }
        tracing::debug!("Reported failure of {} to {}", report.plugin, self.endpoint);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_without_endpoint() {
        let mut config = DiagnosticsConfig::default();
        assert!(HttpDiagnostics::from_config(&config).is_none());

        config.endpoint = Some("http://127.0.0.1:9/report".to_string());
        assert!(HttpDiagnostics::from_config(&config).is_none());

        config.enabled = true;
        let sink = HttpDiagnostics::from_config(&config).unwrap();
        assert_eq!(sink.endpoint(), "http://127.0.0.1:9/report");
    }

    #[test]
    fn test_report_body_shape() {
        let report = DiagnosticReport {
            identifier: "15550100".to_string(),
            plugin: "weather".to_string(),
            command: ".weather".to_string(),
            reason: "boom #HIDDEN#".to_string(),
            content_hash: Some("abc".to_string()),
        };
        let body = serde_json::to_value(&report).unwrap();
        assert_eq!(body["plugin"], "weather");
        assert_eq!(body["content_hash"], "abc");
    }
}
