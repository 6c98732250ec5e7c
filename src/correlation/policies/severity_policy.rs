use crate::correlation::domain::{Severity, SeverityCounts};
use serde::Serialize;
use std::fmt;

/// Overall risk rating of a scan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    Critical,
    High,
    Medium,
    Low,
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            RiskLevel::Critical => "CRITICAL",
            RiskLevel::High => "HIGH",
            RiskLevel::Medium => "MEDIUM",
            RiskLevel::Low => "LOW",
        };
        f.write_str(label)
    }
}

/// SeverityPolicy - Summary rules applied to severity tallies
///
/// Risk level:
/// 1. CRITICAL if any critical finding
/// 2. HIGH if more than five high findings
/// 3. MEDIUM if any high finding
/// 4. LOW otherwise
pub struct SeverityPolicy;

impl SeverityPolicy {
    const HIGH_RISK_THRESHOLD: usize = 5;

    pub fn risk_level(counts: &SeverityCounts) -> RiskLevel {
        if counts.critical > 0 {
            RiskLevel::Critical
        } else if counts.high > Self::HIGH_RISK_THRESHOLD {
            RiskLevel::High
        } else if counts.high > 0 {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }

    /// Share of findings in a bucket, rounded to one decimal.
    /// Zero when there are no findings at all.
    pub fn percentage(counts: &SeverityCounts, severity: Severity) -> f64 {
        let total = counts.total();
        if total == 0 {
            return 0.0;
        }
        let raw = counts.get(severity) as f64 * 100.0 / total as f64;
        (raw * 10.0).round() / 10.0
    }
}
