/// Outbound ports (Driven ports) - Infrastructure interfaces
///
/// These ports define the interfaces that the application core uses
/// to interact with external systems (store, scanner tool, feeds, console, etc.).
pub mod external_scanner;
pub mod output_presenter;
pub mod progress_reporter;
pub mod report_formatter;
pub mod sbom_reader;
pub mod scan_queue;
pub mod scan_store;
pub mod vulnerability_feed;
pub mod vulnerability_store;

pub use external_scanner::{DbRefreshStatus, ExternalScanner};
pub use output_presenter::OutputPresenter;
pub use progress_reporter::ProgressReporter;
pub use report_formatter::ScanReportFormatter;
pub use sbom_reader::SbomReader;
pub use scan_queue::ScanQueue;
pub use scan_store::{ScanStore, StoreSession, UpsertOutcome};
pub use vulnerability_feed::{FeedBatch, VulnerabilityFeed};
pub use vulnerability_store::VulnerabilityStoreView;
