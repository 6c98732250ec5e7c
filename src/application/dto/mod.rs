/// Data Transfer Objects for application layer
///
/// DTOs are used to transfer data between the application layer
/// and adapters, keeping the domain layer isolated.
mod output_format;
mod scan_engine;
mod scan_outcome;
mod upload_receipt;
mod upload_request;

pub use output_format::OutputFormat;
pub use scan_engine::ScanEngine;
pub use scan_outcome::{FallbackOutcome, ScanOutcome, SeverityCountsView};
pub use upload_receipt::{PreviousScanSummary, UploadReceipt, UploadStatus};
pub use upload_request::UploadRequest;
