/// Formatter adapters for scan reports and the canonical SBOM document
mod csv_report_formatter;
mod cyclonedx_formatter;
mod json_report_formatter;

pub use csv_report_formatter::CsvReportFormatter;
pub use cyclonedx_formatter::CycloneDxFormatter;
pub use json_report_formatter::JsonReportFormatter;
