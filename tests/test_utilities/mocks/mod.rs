/// Mock implementations for testing
mod mock_external_scanner;
mod mock_progress_reporter;
mod mock_scan_store;
mod mock_vulnerability_feed;

pub use mock_external_scanner::MockExternalScanner;
pub use mock_progress_reporter::MockProgressReporter;
pub use mock_scan_store::UnavailableStore;
pub use mock_vulnerability_feed::MockVulnerabilityFeed;
