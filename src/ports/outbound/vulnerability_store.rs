use crate::correlation::domain::Vulnerability;
use crate::shared::Result;
use async_trait::async_trait;

/// VulnerabilityStoreView port - read-only query surface over stored vulnerabilities
///
/// Only vulnerabilities carrying at least one CPE criterion are candidates
/// for matching.
#[async_trait]
pub trait VulnerabilityStoreView: Send + Sync {
    /// Returns every stored vulnerability with a non-empty `cpe_match` list
    ///
    /// # Errors
    /// Returns an error if the underlying store cannot be queried
    async fn cpe_candidates(&self) -> Result<Vec<Vulnerability>>;
}
