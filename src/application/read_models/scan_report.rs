//! Scan report read model
//!
//! Denormalized view of one scan result and its matched vulnerabilities,
//! shaped for the report formatters.

use crate::correlation::domain::{SbomId, ScanResultId, ScanStatus, Severity, SeverityCounts};
use crate::correlation::policies::RiskLevel;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Complete scan report
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScanReport {
    pub scan: ScanSummaryView,
    pub risk: RiskSummaryView,
    pub vulnerabilities: Vec<ReportVulnerabilityView>,
}

/// Scan-level statistics
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScanSummaryView {
    pub scan_id: ScanResultId,
    pub sbom_id: SbomId,
    pub sbom_filename: Option<String>,
    pub scan_date: DateTime<Utc>,
    pub status: ScanStatus,
    pub total_components: usize,
    pub vulnerable_count: usize,
    pub severity_counts: SeverityCounts,
    pub scan_duration_seconds: f64,
}

/// Derived risk figures
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskSummaryView {
    pub total_vulnerabilities: usize,
    pub risk_level: RiskLevel,
    pub severity_percentages: SeverityPercentages,
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SeverityPercentages {
    pub critical: f64,
    pub high: f64,
    pub medium: f64,
    pub low: f64,
}

/// One matched (component, vulnerability) pair
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportVulnerabilityView {
    pub cve_id: String,
    pub severity: Severity,
    pub cvss_score: Option<f64>,
    pub cvss_vector: Option<String>,
    pub description: String,
    pub published_date: Option<DateTime<Utc>>,
    pub component_name: String,
    pub component_version: String,
    pub matched_cpe: Option<String>,
}
