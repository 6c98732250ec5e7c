use crate::correlation::domain::ScanJob;
use crate::shared::Result;

/// ScanQueue port - hands scan jobs to the worker pool
///
/// Enqueueing never waits for the job to run.
pub trait ScanQueue: Send + Sync {
    /// # Errors
    /// Returns an error if the queue no longer accepts jobs
    fn enqueue(&self, job: ScanJob) -> Result<()>;
}
