use crate::adapters::outbound::formatters::{CsvReportFormatter, JsonReportFormatter};
use crate::application::dto::OutputFormat;
use crate::ports::outbound::ScanReportFormatter;

/// Factory for creating scan report formatters
///
/// This factory encapsulates the creation logic for different formatter implementations,
/// following the Factory Pattern. It belongs in the application layer as it orchestrates
/// the selection of infrastructure adapters based on application needs.
pub struct FormatterFactory;

impl FormatterFactory {
    /// Creates a formatter instance for the specified output format
    ///
    /// # Examples
    /// ```
    /// use sbom_vuln_scanner::application::dto::OutputFormat;
    /// use sbom_vuln_scanner::application::factories::FormatterFactory;
    ///
    /// let formatter = FormatterFactory::create(OutputFormat::Csv);
    /// ```
    pub fn create(format: OutputFormat) -> Box<dyn ScanReportFormatter> {
        match format {
            OutputFormat::Json => Box::new(JsonReportFormatter::new()),
            OutputFormat::Csv => Box::new(CsvReportFormatter::new()),
        }
    }

    /// Returns the progress message for the specified output format
    ///
    /// # Examples
    /// ```
    /// use sbom_vuln_scanner::application::dto::OutputFormat;
    /// use sbom_vuln_scanner::application::factories::FormatterFactory;
    ///
    /// let message = FormatterFactory::progress_message(OutputFormat::Json);
    /// assert_eq!(message, "📝 Generating JSON report...");
    /// ```
    pub fn progress_message(format: OutputFormat) -> &'static str {
        match format {
            OutputFormat::Json => "📝 Generating JSON report...",
            OutputFormat::Csv => "📝 Generating CSV report...",
        }
    }
}
