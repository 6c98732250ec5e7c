use async_trait::async_trait;
use sbom_vuln_scanner::ports::outbound::FeedBatch;
use sbom_vuln_scanner::prelude::*;

/// Mock VulnerabilityFeed serving a fixed batch
pub struct MockVulnerabilityFeed {
    vulnerabilities: Vec<Vulnerability>,
    rejected: usize,
}

impl MockVulnerabilityFeed {
    pub fn new(vulnerabilities: Vec<Vulnerability>) -> Self {
        Self {
            vulnerabilities,
            rejected: 0,
        }
    }

    pub fn with_rejected(mut self, rejected: usize) -> Self {
        self.rejected = rejected;
        self
    }
}

#[async_trait]
impl VulnerabilityFeed for MockVulnerabilityFeed {
    async fn fetch(&self) -> Result<FeedBatch> {
        Ok(FeedBatch {
            vulnerabilities: self.vulnerabilities.clone(),
            rejected: self.rejected,
        })
    }
}
