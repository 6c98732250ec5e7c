use crate::application::read_models::{ReportVulnerabilityView, ScanReport};
use crate::ports::outbound::ScanReportFormatter;
use crate::shared::Result;

const HEADER: [&str; 8] = [
    "CVE ID",
    "Severity",
    "CVSS Score",
    "Component Name",
    "Component Version",
    "Description",
    "Published Date",
    "CVSS Vector",
];

/// Descriptions are cut to this many characters
const DESCRIPTION_LIMIT: usize = 200;

/// CsvReportFormatter adapter rendering one row per finding plus a summary block
pub struct CsvReportFormatter;

impl CsvReportFormatter {
    pub fn new() -> Self {
        Self
    }

    /// Quotes a field when it contains a separator, a quote or a line break
    fn escape(field: &str) -> String {
        if field.contains([',', '"', '\n', '\r']) {
            format!("\"{}\"", field.replace('"', "\"\""))
        } else {
            field.to_string()
        }
    }

    fn write_row<S: AsRef<str>>(output: &mut String, fields: &[S]) {
        let row: Vec<String> = fields.iter().map(|f| Self::escape(f.as_ref())).collect();
        output.push_str(&row.join(","));
        output.push_str("\r\n");
    }

    fn finding_row(finding: &ReportVulnerabilityView) -> [String; 8] {
        [
            finding.cve_id.clone(),
            finding.severity.to_string(),
            finding
                .cvss_score
                .map(|s| format!("{:.1}", s))
                .unwrap_or_default(),
            finding.component_name.clone(),
            finding.component_version.clone(),
            finding.description.chars().take(DESCRIPTION_LIMIT).collect(),
            finding
                .published_date
                .map(|d| d.to_rfc3339())
                .unwrap_or_default(),
            finding.cvss_vector.clone().unwrap_or_default(),
        ]
    }
}

impl Default for CsvReportFormatter {
    fn default() -> Self {
        Self::new()
    }
}

impl ScanReportFormatter for CsvReportFormatter {
    fn format(&self, report: &ScanReport) -> Result<String> {
        let mut output = String::new();
        Self::write_row(&mut output, &HEADER);

        for finding in &report.vulnerabilities {
            Self::write_row(&mut output, &Self::finding_row(finding));
        }

        let scan = &report.scan;
        let counts = &scan.severity_counts;
        output.push_str("\r\n");
        Self::write_row(&mut output, &["Summary"]);
        for (label, value) in [
            ("Total Components", scan.total_components),
            ("Vulnerable Components", scan.vulnerable_count),
            ("Critical", counts.critical),
            ("High", counts.high),
            ("Medium", counts.medium),
            ("Low", counts.low),
        ] {
            Self::write_row(&mut output, &[label.to_string(), value.to_string()]);
        }

        Ok(output)
    }
}
