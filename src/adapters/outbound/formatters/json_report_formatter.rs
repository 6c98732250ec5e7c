use crate::application::read_models::{
    ReportVulnerabilityView, RiskSummaryView, ScanReport, ScanSummaryView,
};
use crate::ports::outbound::ScanReportFormatter;
use crate::shared::Result;
use serde::Serialize;

const REPORT_VERSION: &str = "1.0";

#[derive(Debug, Serialize)]
struct JsonReport<'a> {
    report_metadata: ReportMetadata,
    scan_summary: &'a ScanSummaryView,
    risk_summary: &'a RiskSummaryView,
    vulnerabilities: &'a [ReportVulnerabilityView],
}

#[derive(Debug, Serialize)]
struct ReportMetadata {
    generated_at: String,
    format: &'static str,
    version: &'static str,
}

/// JsonReportFormatter adapter rendering a scan report as pretty-printed JSON
pub struct JsonReportFormatter;

impl JsonReportFormatter {
    pub fn new() -> Self {
        Self
    }
}

impl Default for JsonReportFormatter {
    fn default() -> Self {
        Self::new()
    }
}

impl ScanReportFormatter for JsonReportFormatter {
    fn format(&self, report: &ScanReport) -> Result<String> {
        let document = JsonReport {
            report_metadata: ReportMetadata {
                generated_at: chrono::Utc::now().to_rfc3339(),
                format: "json",
                version: REPORT_VERSION,
            },
            scan_summary: &report.scan,
            risk_summary: &report.risk,
            vulnerabilities: &report.vulnerabilities,
        };

        serde_json::to_string_pretty(&document).map_err(Into::into)
    }
}
