use crate::correlation::domain::Vulnerability;
use crate::shared::Result;
use async_trait::async_trait;

/// A batch of vulnerabilities from a feed
#[derive(Debug, Clone, Default)]
pub struct FeedBatch {
    pub vulnerabilities: Vec<Vulnerability>,
    /// Feed entries that could not be mapped to a vulnerability
    pub rejected: usize,
}

/// VulnerabilityFeed port - source of vulnerability records for ingestion
#[async_trait]
pub trait VulnerabilityFeed: Send + Sync {
    /// Fetches the next batch of vulnerabilities
    ///
    /// # Errors
    /// Returns an error if the feed cannot be read at all
    async fn fetch(&self) -> Result<FeedBatch>;
}
