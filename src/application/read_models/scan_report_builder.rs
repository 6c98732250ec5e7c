//! Builder for constructing ScanReport from domain objects

use super::scan_report::{
    ReportVulnerabilityView, RiskSummaryView, ScanReport, ScanSummaryView, SeverityPercentages,
};
use crate::correlation::domain::{ScanResult, ScanVulnerability, Severity, SeverityCounts, Vulnerability};
use crate::correlation::policies::SeverityPolicy;
use std::collections::HashMap;

/// Medium findings above this count earn their own recommendation
const MEDIUM_RECOMMENDATION_THRESHOLD: usize = 5;

/// Builder for constructing ScanReport from domain objects
pub struct ScanReportBuilder;

impl ScanReportBuilder {
    /// Builds a report for one scan result
    ///
    /// # Arguments
    /// * `result` - The scan result row
    /// * `sbom_filename` - File name of the scanned SBOM, when known
    /// * `links` - Association rows of the scan
    /// * `vulnerabilities` - Stored vulnerabilities keyed by CVE id. Links whose
    ///   vulnerability is missing are still reported with UNKNOWN severity.
    ///
    /// # Returns
    /// ScanReport with findings ordered by severity, then CVE id
    pub fn build(
        result: &ScanResult,
        sbom_filename: Option<String>,
        links: &[ScanVulnerability],
        vulnerabilities: &HashMap<String, Vulnerability>,
    ) -> ScanReport {
        let mut findings: Vec<ReportVulnerabilityView> = links
            .iter()
            .map(|link| Self::build_finding(link, vulnerabilities.get(&link.vulnerability_id)))
            .collect();
        findings.sort_by(|a, b| a.severity.cmp(&b.severity).then_with(|| a.cve_id.cmp(&b.cve_id)));

        ScanReport {
            scan: ScanSummaryView {
                scan_id: result.id,
                sbom_id: result.sbom_id,
                sbom_filename,
                scan_date: result.scan_date,
                status: result.status,
                total_components: result.total_components,
                vulnerable_count: result.vulnerable_count,
                severity_counts: result.severity_counts,
                scan_duration_seconds: result.scan_duration_seconds,
            },
            risk: Self::build_risk(&result.severity_counts),
            vulnerabilities: findings,
        }
    }

    fn build_finding(
        link: &ScanVulnerability,
        vulnerability: Option<&Vulnerability>,
    ) -> ReportVulnerabilityView {
        ReportVulnerabilityView {
            cve_id: link.vulnerability_id.clone(),
            severity: vulnerability.map_or(Severity::Unknown, |v| v.severity),
            cvss_score: vulnerability.and_then(|v| v.cvss_score).map(|s| s.value()),
            cvss_vector: vulnerability.and_then(|v| v.cvss_vector.clone()),
            description: vulnerability
                .map(|v| v.description.clone())
                .unwrap_or_default(),
            published_date: vulnerability.and_then(|v| v.published_date),
            component_name: link.component_name.clone(),
            component_version: link.component_version.clone(),
            matched_cpe: link.matched_cpe.clone(),
        }
    }

    fn build_risk(counts: &SeverityCounts) -> RiskSummaryView {
        RiskSummaryView {
            total_vulnerabilities: counts.total(),
            risk_level: SeverityPolicy::risk_level(counts),
            severity_percentages: SeverityPercentages {
                critical: SeverityPolicy::percentage(counts, Severity::Critical),
                high: SeverityPolicy::percentage(counts, Severity::High),
                medium: SeverityPolicy::percentage(counts, Severity::Medium),
                low: SeverityPolicy::percentage(counts, Severity::Low),
            },
            recommendations: Self::recommendations(counts),
        }
    }

    fn recommendations(counts: &SeverityCounts) -> Vec<String> {
        let mut recommendations = Vec::new();

        if counts.critical > 0 {
            recommendations.push(format!(
                "🔴 {} CRITICAL vulnerabilities detected. Remediate immediately.",
                counts.critical
            ));
        }
        if counts.high > 0 {
            recommendations.push(format!(
                "🟠 {} HIGH vulnerabilities detected. Prioritize remediation.",
                counts.high
            ));
        }
        if counts.medium > MEDIUM_RECOMMENDATION_THRESHOLD {
            recommendations.push(format!(
                "🟡 {} MEDIUM vulnerabilities detected. Plan remediation.",
                counts.medium
            ));
        }
        if counts.critical == 0 && counts.high == 0 {
            recommendations.push("✅ No severe vulnerabilities detected.".to_string());
        }
        recommendations
            .push("💡 Rescan regularly to pick up newly published vulnerabilities.".to_string());

        recommendations
    }
}
