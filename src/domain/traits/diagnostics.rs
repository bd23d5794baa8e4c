use async_trait::async_trait;
use serde::Serialize;
use crate::application::errors::BotError;

/// Report sent when a plugin hook fails
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiagnosticReport {
    /// Bot identifier
    pub identifier: String,
    pub plugin: String,
    pub command: String,
    pub reason: String,
    /// Digest of the plugin source
    pub content_hash: Option<String>,
}

/// Outbound sink for plugin failures. Delivery is best-effort.
#[async_trait]
pub trait DiagnosticsSink: Send + Sync {
    async fn report(&self, report: DiagnosticReport) -> Result<(), BotError>;
}
