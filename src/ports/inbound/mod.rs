/// Inbound ports (Driving ports) - Use case interfaces
///
/// These ports define the interfaces that external adapters (CLI, workers)
/// use to interact with the application core.
pub mod scan_job_port;
pub mod scan_submission_port;

pub use scan_job_port::ScanJobPort;
pub use scan_submission_port::ScanSubmissionPort;
