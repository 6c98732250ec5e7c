use crate::application::dto::{UploadReceipt, UploadRequest};
use crate::shared::error::ScanError;
use async_trait::async_trait;

/// ScanSubmissionPort - Inbound port for accepting SBOM uploads
///
/// Entry point of the scan lifecycle: validates, fingerprints and
/// normalizes an upload, then queues a scan job for it.
#[async_trait]
pub trait ScanSubmissionPort: Send + Sync {
    /// Submits an upload
    ///
    /// # Errors
    /// - `ScanError::UploadRejected` for a bad extension or an oversized upload
    /// - `ScanError::Parse` when the document cannot be normalized; no job is queued
    /// - `ScanError::Queue` / `ScanError::Store` on infrastructure failure
    /// - `ScanError::StoredNotQueued` when the SBOM was stored but its scan was not queued
    async fn submit(&self, request: UploadRequest) -> Result<UploadReceipt, ScanError>;
}
