use crate::correlation::domain::{
    CompletedScan, ContentFingerprint, SbomId, SbomRecord, ScanResult, ScanResultId,
    ScanVulnerability, Vulnerability,
};
use crate::ports::outbound::{ScanStore, StoreSession, UpsertOutcome, VulnerabilityStoreView};
use crate::shared::error::PersistenceError;
use crate::shared::Result;
use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::collections::HashSet;
use std::sync::{Arc, Mutex, RwLock};

const SCAN_RESULTS: &str = "scan_results";
const SCAN_VULNERABILITIES: &str = "scan_vulnerabilities";
const SBOMS: &str = "sboms";

/// Injected write failures, used to exercise rollback and fallback paths
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FaultPlan {
    /// Fail while staging the association row at this index (0-based)
    pub fail_link_at: Option<usize>,
    /// Fail while staging the scan result row of a completed scan
    pub fail_result_row: bool,
    /// Fail when writing a `failed` scan result row
    pub fail_failed_row: bool,
}

#[derive(Debug, Default)]
struct ScanTables {
    results: Vec<ScanResult>,
    links: Vec<ScanVulnerability>,
}

#[derive(Debug, Default)]
struct StoreState {
    sboms: DashMap<SbomId, SbomRecord>,
    fingerprints: DashMap<ContentFingerprint, SbomId>,
    vulnerabilities: DashMap<String, Vulnerability>,
    // Results and links commit under one write lock so readers never see
    // a result without its complete set of links.
    scans: RwLock<ScanTables>,
    faults: Mutex<FaultPlan>,
}

/// InMemoryScanStore adapter - process-local implementation of the scan store
///
/// Cheap to clone; clones share the same tables. Each `open_session` call
/// returns an independent session handle.
#[derive(Debug, Clone, Default)]
pub struct InMemoryScanStore {
    state: Arc<StoreState>,
}

impl InMemoryScanStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs a fault plan for subsequent writes
    pub fn set_fault_plan(&self, plan: FaultPlan) {
        if let Ok(mut faults) = self.state.faults.lock() {
            *faults = plan;
        }
    }

    /// Seeds vulnerabilities directly, replacing rows with the same CVE id
    pub fn insert_vulnerabilities(&self, vulnerabilities: impl IntoIterator<Item = Vulnerability>) {
        for vulnerability in vulnerabilities {
            self.state
                .vulnerabilities
                .insert(vulnerability.cve_id.clone(), vulnerability);
        }
    }

    pub fn sbom_count(&self) -> usize {
        self.state.sboms.len()
    }

    pub fn vulnerability_count(&self) -> usize {
        self.state.vulnerabilities.len()
    }

    pub fn scan_result_count(&self) -> usize {
        self.state
            .scans
            .read()
            .map(|tables| tables.results.len())
            .unwrap_or_default()
    }

    pub fn scan_vulnerability_count(&self) -> usize {
        self.state
            .scans
            .read()
            .map(|tables| tables.links.len())
            .unwrap_or_default()
    }
}

#[async_trait]
impl ScanStore for InMemoryScanStore {
    type Session = InMemorySession;

    async fn open_session(&self) -> Result<Self::Session> {
        Ok(InMemorySession {
            state: Arc::clone(&self.state),
        })
    }
}

/// Session handle over the shared in-memory tables
#[derive(Debug)]
pub struct InMemorySession {
    state: Arc<StoreState>,
}

impl InMemorySession {
    fn faults(&self) -> FaultPlan {
        self.state
            .faults
            .lock()
            .map(|faults| *faults)
            .unwrap_or_default()
    }

    fn unavailable(details: impl std::fmt::Display) -> PersistenceError {
        PersistenceError::Unavailable {
            details: details.to_string(),
        }
    }

    /// Validates every row of the unit before anything is applied
    fn stage(&self, scan: &CompletedScan) -> std::result::Result<(), PersistenceError> {
        let faults = self.faults();

        if faults.fail_result_row {
            return Err(PersistenceError::WriteFailed {
                table: SCAN_RESULTS.to_string(),
                details: "injected failure".to_string(),
            });
        }
        if !self.state.sboms.contains_key(&scan.result.sbom_id) {
            return Err(PersistenceError::WriteFailed {
                table: SCAN_RESULTS.to_string(),
                details: format!("unknown sbom {}", scan.result.sbom_id),
            });
        }

        let upserted: HashSet<&str> = scan
            .vulnerability_upserts
            .iter()
            .map(|v| v.cve_id.as_str())
            .collect();

        for (index, link) in scan.links.iter().enumerate() {
            if faults.fail_link_at == Some(index) {
                return Err(PersistenceError::WriteFailed {
                    table: SCAN_VULNERABILITIES.to_string(),
                    details: format!("injected failure at row {}", index),
                });
            }
            if link.scan_result_id != scan.result.id {
                return Err(PersistenceError::WriteFailed {
                    table: SCAN_VULNERABILITIES.to_string(),
                    details: format!("row {} references another scan result", index),
                });
            }
            let known = upserted.contains(link.vulnerability_id.as_str())
                || self.state.vulnerabilities.contains_key(&link.vulnerability_id);
            if !known {
                return Err(PersistenceError::WriteFailed {
                    table: SCAN_VULNERABILITIES.to_string(),
                    details: format!("unknown vulnerability {}", link.vulnerability_id),
                });
            }
        }

        Ok(())
    }
}

#[async_trait]
impl VulnerabilityStoreView for InMemorySession {
    async fn cpe_candidates(&self) -> Result<Vec<Vulnerability>> {
        let mut candidates: Vec<Vulnerability> = self
            .state
            .vulnerabilities
            .iter()
            .filter(|entry| entry.value().is_matchable())
            .map(|entry| entry.value().clone())
            .collect();
        candidates.sort_by(|a, b| a.cve_id.cmp(&b.cve_id));
        Ok(candidates)
    }
}

#[async_trait]
impl StoreSession for InMemorySession {
    async fn find_sbom_by_fingerprint(
        &self,
        fingerprint: &ContentFingerprint,
    ) -> Result<Option<SbomRecord>> {
        let Some(sbom_id) = self.state.fingerprints.get(fingerprint).map(|id| *id) else {
            return Ok(None);
        };
        Ok(self.state.sboms.get(&sbom_id).map(|record| record.clone()))
    }

    async fn insert_sbom(&self, record: SbomRecord) -> std::result::Result<(), PersistenceError> {
        match self.state.fingerprints.entry(record.fingerprint.clone()) {
            Entry::Occupied(_) => Err(PersistenceError::Conflict {
                table: SBOMS.to_string(),
                key: record.fingerprint.to_string(),
            }),
            Entry::Vacant(slot) => {
                let sbom_id = record.id;
                self.state.sboms.insert(sbom_id, record);
                slot.insert(sbom_id);
                Ok(())
            }
        }
    }

    async fn get_sbom(&self, sbom_id: SbomId) -> Result<Option<SbomRecord>> {
        Ok(self.state.sboms.get(&sbom_id).map(|record| record.clone()))
    }

    async fn latest_scan(&self, sbom_id: SbomId) -> Result<Option<ScanResult>> {
        let tables = self.state.scans.read().map_err(Self::unavailable)?;
        // max_by_key keeps the last of equal dates, i.e. the most recent insert
        Ok(tables
            .results
            .iter()
            .filter(|result| result.sbom_id == sbom_id)
            .max_by_key(|result| result.scan_date)
            .cloned())
    }

    async fn scan_results(&self, sbom_id: SbomId) -> Result<Vec<ScanResult>> {
        let tables = self.state.scans.read().map_err(Self::unavailable)?;
        Ok(tables
            .results
            .iter()
            .filter(|result| result.sbom_id == sbom_id)
            .cloned()
            .collect())
    }

    async fn scan_vulnerabilities(
        &self,
        scan_result_id: ScanResultId,
    ) -> Result<Vec<ScanVulnerability>> {
        let tables = self.state.scans.read().map_err(Self::unavailable)?;
        Ok(tables
            .links
            .iter()
            .filter(|link| link.scan_result_id == scan_result_id)
            .cloned()
            .collect())
    }

    async fn get_vulnerability(&self, cve_id: &str) -> Result<Option<Vulnerability>> {
        Ok(self.state.vulnerabilities.get(cve_id).map(|v| v.clone()))
    }

    async fn persist_completed_scan(
        &self,
        scan: CompletedScan,
    ) -> std::result::Result<(), PersistenceError> {
        self.stage(&scan)?;

        let mut tables = self.state.scans.write().map_err(Self::unavailable)?;
        for vulnerability in scan.vulnerability_upserts {
            // existing rows are kept as they are
            self.state
                .vulnerabilities
                .entry(vulnerability.cve_id.clone())
                .or_insert(vulnerability);
        }
        tables.results.push(scan.result);
        tables.links.extend(scan.links);

        Ok(())
    }

    async fn record_failed_scan(
        &self,
        result: ScanResult,
    ) -> std::result::Result<(), PersistenceError> {
        if self.faults().fail_failed_row {
            return Err(PersistenceError::WriteFailed {
                table: SCAN_RESULTS.to_string(),
                details: "injected failure".to_string(),
            });
        }
        let mut tables = self.state.scans.write().map_err(Self::unavailable)?;
        tables.results.push(result);
        Ok(())
    }

    async fn upsert_vulnerability(
        &self,
        vulnerability: Vulnerability,
    ) -> std::result::Result<UpsertOutcome, PersistenceError> {
        let outcome = match self.state.vulnerabilities.insert(vulnerability.cve_id.clone(), vulnerability) {
            Some(_) => UpsertOutcome::Updated,
            None => UpsertOutcome::Inserted,
        };
        Ok(outcome)
    }
}
