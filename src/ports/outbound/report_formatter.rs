use crate::application::read_models::ScanReport;
use crate::shared::Result;

/// ScanReportFormatter port for rendering scan reports
pub trait ScanReportFormatter {
    /// Renders a report
    ///
    /// # Errors
    /// Returns an error if serialization fails
    fn format(&self, report: &ScanReport) -> Result<String>;
}
