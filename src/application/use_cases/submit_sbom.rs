use crate::application::dto::{PreviousScanSummary, UploadReceipt, UploadRequest, UploadStatus};
use crate::correlation::domain::{ContentFingerprint, SbomRecord, ScanJob};
use crate::correlation::services::{DocumentEncoding, SbomNormalizer};
use crate::ports::inbound::ScanSubmissionPort;
use crate::ports::outbound::{ScanQueue, ScanStore, StoreSession};
use crate::shared::error::{PersistenceError, ScanError};
use crate::shared::security::{validate_sbom_extension, validate_upload_size};
use async_trait::async_trait;

/// SubmitSbomUseCase - Entry of the scan lifecycle
///
/// Validates and fingerprints an upload. A byte-identical upload that is
/// already stored skips normalization and queues a rescan of the existing
/// SBOM; anything else is normalized, stored and queued for its first scan.
/// No lock is taken per SBOM: a rescan may be queued while another scan of
/// the same SBOM is still running.
///
/// # Type Parameters
/// * `S` - ScanStore implementation
/// * `Q` - ScanQueue implementation
pub struct SubmitSbomUseCase<S, Q> {
    store: S,
    queue: Q,
    max_upload_bytes: u64,
}

impl<S, Q> SubmitSbomUseCase<S, Q>
where
    S: ScanStore,
    Q: ScanQueue,
{
    /// Creates a new SubmitSbomUseCase with injected dependencies
    ///
    /// # Arguments
    /// * `store` - Store holding SBOM records and scan results
    /// * `queue` - Queue feeding the scan workers
    /// * `max_upload_bytes` - Uploads larger than this are rejected
    pub fn new(store: S, queue: Q, max_upload_bytes: u64) -> Self {
        Self {
            store,
            queue,
            max_upload_bytes,
        }
    }

    /// Executes the submission
    ///
    /// # Returns
    /// UploadReceipt with `queued` for a new SBOM or `rescanning` for a duplicate
    pub async fn execute(&self, request: UploadRequest) -> Result<UploadReceipt, ScanError> {
        // Step 1: Reject bad uploads before touching the content
        self.validate(&request)?;

        // Step 2: Fingerprint the raw bytes
        let fingerprint = ContentFingerprint::of(&request.content);
        let session = self.store.open_session().await.map_err(ScanError::Store)?;

        // Step 3: Duplicate content goes straight to a rescan
        if let Some(existing) = session
            .find_sbom_by_fingerprint(&fingerprint)
            .await
            .map_err(ScanError::Store)?
        {
            return self.rescan(&session, existing).await;
        }

        // Step 4: Normalize; a parse error never reaches the queue
        let parsed = SbomNormalizer::parse(
            &request.content,
            DocumentEncoding::from_filename(&request.filename),
        )?;

        // Step 5: Store the source record
        let record = SbomRecord::new(request.filename, fingerprint.clone(), parsed);
        match session.insert_sbom(record.clone()).await {
            Ok(()) => {}
            Err(PersistenceError::Conflict { .. }) => {
                // identical bytes stored concurrently
                let existing = session
                    .find_sbom_by_fingerprint(&fingerprint)
                    .await
                    .map_err(ScanError::Store)?
                    .ok_or_else(|| ScanError::SbomNotFound {
                        sbom_id: fingerprint.to_string(),
                    })?;
                return self.rescan(&session, existing).await;
            }
            Err(e) => return Err(e.into()),
        }

        // Step 6: Queue the first scan; the record stays stored if this fails
        if let Err(e) = self.queue.enqueue(ScanJob::new(record.id, false)) {
            tracing::warn!(
                sbom_id = %record.id,
                error = %e,
                "SBOM stored but scan not queued; re-upload to requeue"
            );
            return Err(ScanError::StoredNotQueued {
                sbom_id: record.id.to_string(),
                details: e.to_string(),
            });
        }
        tracing::info!(
            sbom_id = %record.id,
            filename = %record.filename,
            format = %record.format,
            components = record.component_count(),
            "SBOM stored, scan queued"
        );

        Ok(UploadReceipt {
            sbom_id: record.id,
            filename: record.filename.clone(),
            format: record.format,
            fingerprint: record.fingerprint.clone(),
            component_count: record.component_count(),
            scan_status: UploadStatus::Queued,
            is_duplicate: false,
            previous_scan: None,
        })
    }

    fn validate(&self, request: &UploadRequest) -> Result<(), ScanError> {
        validate_sbom_extension(&request.filename)
            .and_then(|_| {
                validate_upload_size(request.size(), &request.filename, self.max_upload_bytes)
            })
            .map_err(|e| ScanError::UploadRejected {
                reason: e.to_string(),
            })
    }

    async fn rescan(
        &self,
        session: &S::Session,
        existing: SbomRecord,
    ) -> Result<UploadReceipt, ScanError> {
        let previous_scan = session
            .latest_scan(existing.id)
            .await
            .map_err(ScanError::Store)?;

        self.enqueue(ScanJob::new(existing.id, true))?;
        tracing::info!(
            sbom_id = %existing.id,
            fingerprint = %existing.fingerprint,
            "duplicate SBOM, rescan queued"
        );

        Ok(UploadReceipt {
            sbom_id: existing.id,
            filename: existing.filename.clone(),
            format: existing.format,
            fingerprint: existing.fingerprint.clone(),
            component_count: existing.component_count(),
            scan_status: UploadStatus::Rescanning,
            is_duplicate: true,
            previous_scan: previous_scan.as_ref().map(PreviousScanSummary::from),
        })
    }

    fn enqueue(&self, job: ScanJob) -> Result<(), ScanError> {
        self.queue.enqueue(job).map_err(|e| ScanError::Queue {
            details: e.to_string(),
        })
    }
}

#[async_trait]
impl<S, Q> ScanSubmissionPort for SubmitSbomUseCase<S, Q>
where
    S: ScanStore,
    Q: ScanQueue,
{
    async fn submit(&self, request: UploadRequest) -> Result<UploadReceipt, ScanError> {
        self.execute(request).await
    }
}
