use super::vulnerability_store::VulnerabilityStoreView;
use crate::correlation::domain::{
    CompletedScan, ContentFingerprint, SbomId, SbomRecord, ScanResult, ScanResultId,
    ScanVulnerability, Vulnerability,
};
use crate::shared::error::PersistenceError;
use crate::shared::Result;
use async_trait::async_trait;

/// Whether an upsert created or replaced a vulnerability row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted,
    Updated,
}

/// ScanStore port - factory of per-job store sessions
///
/// Every scan job opens its own session and never shares it with another job.
#[async_trait]
pub trait ScanStore: Send + Sync {
    type Session: StoreSession + 'static;

    /// Opens a session for exclusive use by one job
    async fn open_session(&self) -> Result<Self::Session>;
}

/// StoreSession port - the store operations available to one job
#[async_trait]
pub trait StoreSession: VulnerabilityStoreView {
    async fn find_sbom_by_fingerprint(
        &self,
        fingerprint: &ContentFingerprint,
    ) -> Result<Option<SbomRecord>>;

    /// Stores a new source record
    ///
    /// # Errors
    /// `PersistenceError::Conflict` when a record with the same fingerprint exists
    async fn insert_sbom(&self, record: SbomRecord) -> std::result::Result<(), PersistenceError>;

    async fn get_sbom(&self, sbom_id: SbomId) -> Result<Option<SbomRecord>>;

    /// Most recent scan result of an SBOM, by scan date
    async fn latest_scan(&self, sbom_id: SbomId) -> Result<Option<ScanResult>>;

    /// All scan results of an SBOM, oldest first
    async fn scan_results(&self, sbom_id: SbomId) -> Result<Vec<ScanResult>>;

    async fn scan_vulnerabilities(
        &self,
        scan_result_id: ScanResultId,
    ) -> Result<Vec<ScanVulnerability>>;

    async fn get_vulnerability(&self, cve_id: &str) -> Result<Option<Vulnerability>>;

    /// Writes a completed scan as one atomic unit
    ///
    /// Vulnerability inserts come first, then the result row, then the
    /// association rows. Either every row becomes visible or none does.
    async fn persist_completed_scan(
        &self,
        scan: CompletedScan,
    ) -> std::result::Result<(), PersistenceError>;

    /// Writes a `failed` scan result row
    async fn record_failed_scan(&self, result: ScanResult)
        -> std::result::Result<(), PersistenceError>;

    /// Inserts or replaces a vulnerability keyed by its CVE identifier
    async fn upsert_vulnerability(
        &self,
        vulnerability: Vulnerability,
    ) -> std::result::Result<UpsertOutcome, PersistenceError>;
}
