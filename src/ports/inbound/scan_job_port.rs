use crate::application::dto::ScanOutcome;
use crate::correlation::domain::ScanJob;
use async_trait::async_trait;

/// ScanJobPort - Inbound port driven by scan workers
///
/// Runs one queued job to a terminal state. Never fails: every error ends
/// as a `ScanOutcome::Failed` payload.
#[async_trait]
pub trait ScanJobPort: Send + Sync {
    async fn handle(&self, job: ScanJob) -> ScanOutcome;
}
