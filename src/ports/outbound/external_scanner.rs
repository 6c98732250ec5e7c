use crate::correlation::domain::{ComponentSet, MatchResult};
use crate::shared::error::ScanToolError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;

/// Outcome of a scanner database refresh
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum DbRefreshStatus {
    Success {
        updated_at: DateTime<Utc>,
        cache_dir: PathBuf,
        message: String,
    },
    Failed {
        updated_at: DateTime<Utc>,
        #[serde(skip_serializing_if = "Option::is_none")]
        cache_dir: Option<PathBuf>,
        error: String,
    },
}

impl DbRefreshStatus {
    pub fn failed(cache_dir: Option<PathBuf>, error: impl Into<String>) -> Self {
        DbRefreshStatus::Failed {
            updated_at: Utc::now(),
            cache_dir,
            error: error.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, DbRefreshStatus::Success { .. })
    }
}

/// ExternalScanner port - alternate matching path backed by a scanning tool
///
/// Produces the same `MatchResult` shape as the built-in matcher.
#[async_trait]
pub trait ExternalScanner: Send + Sync {
    /// Scans a component set
    ///
    /// # Arguments
    /// * `components` - Components serialized to a canonical SBOM for the tool
    /// * `timeout` - Wall-clock limit; the tool process is killed when exceeded
    ///
    /// # Errors
    /// Any `ScanToolError` subtype; a timeout is reported as `ScanToolError::Timeout`
    async fn scan(
        &self,
        components: &ComponentSet,
        timeout: Duration,
    ) -> Result<MatchResult, ScanToolError>;

    /// Refreshes the tool's vulnerability database.
    /// Failures are reported in the returned status, never raised.
    async fn refresh_database(&self, timeout: Duration) -> DbRefreshStatus;

    /// Whether the tool can be executed at all
    async fn is_available(&self) -> bool;
}
