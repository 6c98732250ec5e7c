use crate::correlation::domain::{
    ContentFingerprint, SbomFormat, SbomId, ScanResult, ScanResultId, ScanStatus,
};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Scan state reported back for an accepted upload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadStatus {
    /// New SBOM stored and its first scan queued
    Queued,
    /// Byte-identical SBOM already known; a rescan was queued
    Rescanning,
}

/// Summary of the latest scan of a previously uploaded SBOM
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PreviousScanSummary {
    pub scan_result_id: ScanResultId,
    pub scan_date: DateTime<Utc>,
    pub status: ScanStatus,
    pub total_components: usize,
    pub vulnerable_count: usize,
    pub total_vulnerabilities: usize,
}

impl From<&ScanResult> for PreviousScanSummary {
    fn from(result: &ScanResult) -> Self {
        Self {
            scan_result_id: result.id,
            scan_date: result.scan_date,
            status: result.status,
            total_components: result.total_components,
            vulnerable_count: result.vulnerable_count,
            total_vulnerabilities: result.total_vulnerabilities(),
        }
    }
}

/// UploadReceipt - Response for an accepted upload
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UploadReceipt {
    pub sbom_id: SbomId,
    pub filename: String,
    pub format: SbomFormat,
    pub fingerprint: ContentFingerprint,
    pub component_count: usize,
    pub scan_status: UploadStatus,
    pub is_duplicate: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_scan: Option<PreviousScanSummary>,
}
