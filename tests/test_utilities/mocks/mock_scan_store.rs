use async_trait::async_trait;
use sbom_vuln_scanner::adapters::outbound::storage::InMemorySession;
use sbom_vuln_scanner::prelude::*;

/// ScanStore whose sessions can never be opened
///
/// Models a store outage: every job fails and the failed-row fallback
/// cannot write either.
#[derive(Clone, Default)]
pub struct UnavailableStore;

#[async_trait]
impl ScanStore for UnavailableStore {
    type Session = InMemorySession;

    async fn open_session(&self) -> Result<Self::Session> {
        anyhow::bail!("connection refused")
    }
}
