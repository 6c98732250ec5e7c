use crate::correlation::domain::{SbomId, ScanResult, ScanResultId, SeverityCounts};
use serde::Serialize;

/// Severity tallies in the caller-facing payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SeverityCountsView {
    #[serde(rename = "CRITICAL")]
    pub critical: usize,
    #[serde(rename = "HIGH")]
    pub high: usize,
    #[serde(rename = "MEDIUM")]
    pub medium: usize,
    #[serde(rename = "LOW")]
    pub low: usize,
}

impl From<SeverityCounts> for SeverityCountsView {
    fn from(counts: SeverityCounts) -> Self {
        Self {
            critical: counts.critical,
            high: counts.high,
            medium: counts.medium,
            low: counts.low,
        }
    }
}

/// What happened to the audit row after a scan failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackOutcome {
    /// A `failed` ScanResult row with zero counts was written
    FailedRowWritten,
    /// Writing the `failed` row also failed; the secondary error was logged and dropped
    FailedRowDropped,
}

/// ScanOutcome - Terminal result of one scan job, as reported to its caller
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ScanOutcome {
    Success {
        sbom_id: SbomId,
        scan_result_id: ScanResultId,
        total_components: usize,
        vulnerable_count: usize,
        total_vulnerabilities: usize,
        severity_counts: SeverityCountsView,
        scan_duration_seconds: f64,
    },
    Failed {
        sbom_id: SbomId,
        error: String,
        #[serde(skip)]
        fallback: FallbackOutcome,
    },
}

impl ScanOutcome {
    pub fn success(result: &ScanResult) -> Self {
        ScanOutcome::Success {
            sbom_id: result.sbom_id,
            scan_result_id: result.id,
            total_components: result.total_components,
            vulnerable_count: result.vulnerable_count,
            total_vulnerabilities: result.total_vulnerabilities(),
            severity_counts: result.severity_counts.into(),
            scan_duration_seconds: result.scan_duration_seconds,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ScanOutcome::Success { .. })
    }

    pub fn sbom_id(&self) -> SbomId {
        match self {
            ScanOutcome::Success { sbom_id, .. } | ScanOutcome::Failed { sbom_id, .. } => *sbom_id,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            ScanOutcome::Failed { error, .. } => Some(error),
            ScanOutcome::Success { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failed_payload_shape() {
        let outcome = ScanOutcome::Failed {
            sbom_id: SbomId::generate(),
            error: "Scan tool timed out after 300s".to_string(),
            fallback: FallbackOutcome::FailedRowWritten,
        };
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["status"], "failed");
        assert_eq!(json["error"], "Scan tool timed out after 300s");
        assert!(json.get("fallback").is_none());
        assert!(!outcome.is_success());
    }

    #[test]
    fn test_success_payload_shape() {
        let mut counts = SeverityCounts::default();
        counts.critical = 2;
        counts.unknown = 1;
        let mut result = ScanResult::failed(SbomId::generate(), 0.5);
        result.status = crate::correlation::domain::ScanStatus::Completed;
        result.total_components = 3;
        result.vulnerable_count = 1;
        result.severity_counts = counts;

        let outcome = ScanOutcome::success(&result);
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["status"], "success");
        assert_eq!(json["severity_counts"]["CRITICAL"], 2);
        assert_eq!(json["total_vulnerabilities"], 3);
        assert_eq!(json["vulnerable_count"], 1);
    }
}
