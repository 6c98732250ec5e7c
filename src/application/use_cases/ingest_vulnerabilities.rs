use crate::ports::outbound::{
    ProgressReporter, ScanStore, StoreSession, UpsertOutcome, VulnerabilityFeed,
};
use crate::shared::Result;
use serde::Serialize;

/// Counts of one ingestion run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IngestionStats {
    pub total_fetched: usize,
    pub new_count: usize,
    pub updated_count: usize,
    /// Feed entries that were rejected by the mapper or failed to write
    pub failed_count: usize,
}

/// IngestVulnerabilitiesUseCase - Loads feed records into the vulnerability store
///
/// Every record is upserted by CVE identifier. A record that fails to write
/// is counted and skipped; the run continues with the next one.
///
/// # Type Parameters
/// * `S` - ScanStore implementation
/// * `F` - VulnerabilityFeed implementation
/// * `PR` - ProgressReporter implementation
pub struct IngestVulnerabilitiesUseCase<S, F, PR> {
    store: S,
    feed: F,
    progress_reporter: PR,
}

impl<S, F, PR> IngestVulnerabilitiesUseCase<S, F, PR>
where
    S: ScanStore,
    F: VulnerabilityFeed,
    PR: ProgressReporter,
{
    pub fn new(store: S, feed: F, progress_reporter: PR) -> Self {
        Self {
            store,
            feed,
            progress_reporter,
        }
    }

    /// Fetches one batch from the feed and upserts it
    ///
    /// # Errors
    /// Returns an error only when the feed or the store cannot be reached at all
    pub async fn execute(&self) -> Result<IngestionStats> {
        // Step 1: Fetch
        self.progress_reporter
            .report_activity("📥 Fetching vulnerability records...");
        let batch = self.feed.fetch().await?;
        let total = batch.vulnerabilities.len();

        let mut stats = IngestionStats {
            total_fetched: total,
            failed_count: batch.rejected,
            ..Default::default()
        };

        // Step 2: Upsert each record
        let session = self.store.open_session().await?;
        for (index, vulnerability) in batch.vulnerabilities.into_iter().enumerate() {
            let cve_id = vulnerability.cve_id.clone();
            match session.upsert_vulnerability(vulnerability).await {
                Ok(UpsertOutcome::Inserted) => stats.new_count += 1,
                Ok(UpsertOutcome::Updated) => stats.updated_count += 1,
                Err(e) => {
                    tracing::warn!(cve_id = %cve_id, error = %e, "failed to store vulnerability");
                    stats.failed_count += 1;
                }
            }
            self.progress_reporter
                .report_progress(index + 1, total, Some(&cve_id));
        }

        tracing::info!(
            total_fetched = stats.total_fetched,
            new = stats.new_count,
            updated = stats.updated_count,
            failed = stats.failed_count,
            "vulnerability ingestion finished"
        );
        self.progress_reporter.report_completion(&format!(
            "✅ Stored {} new and {} updated vulnerabilities ({} failed)",
            stats.new_count, stats.updated_count, stats.failed_count
        ));

        Ok(stats)
    }
}
