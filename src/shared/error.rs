use std::fmt;
use thiserror::Error;

/// Exit codes for the CLI application.
///
/// These codes allow CI systems to distinguish between different
/// types of failures and successes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Success - scan completed without findings, or maintenance succeeded
    Success = 0,
    /// The scan completed and at least one component is vulnerable
    VulnerabilitiesDetected = 1,
    /// Invalid command-line arguments (clap parsing errors)
    InvalidArguments = 2,
    /// Application error (parse error, scan tool error, persistence error, etc.)
    ApplicationError = 3,
}

impl ExitCode {
    /// Convert to i32 for use with std::process::exit
    pub fn as_i32(self) -> i32 {
        self as i32
    }
}

impl fmt::Display for ExitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitCode::Success => write!(f, "Success (0)"),
            ExitCode::VulnerabilitiesDetected => write!(f, "Vulnerabilities Detected (1)"),
            ExitCode::InvalidArguments => write!(f, "Invalid Arguments (2)"),
            ExitCode::ApplicationError => write!(f, "Application Error (3)"),
        }
    }
}

/// Malformed or unrecognized SBOM document.
///
/// User-fixable and never retried automatically. Raised before any scan job
/// is queued, so the raw bytes are never partially accepted.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SbomParseError {
    #[error("Unsupported file type: {filename}\n\n💡 Hint: Upload a .json or .xml SBOM document")]
    UnsupportedFileType { filename: String },

    #[error("SBOM is not valid UTF-8: {details}")]
    InvalidEncoding { details: String },

    #[error("Invalid JSON: {details}\n\n💡 Hint: Please verify that the file is a well-formed JSON document")]
    InvalidJson { details: String },

    #[error("Invalid XML: {details}\n\n💡 Hint: Please verify that the file is a well-formed XML document")]
    InvalidXml { details: String },

    #[error("Unknown SBOM format in {encoding}\n\n💡 Hint: Only CycloneDX and SPDX documents are supported")]
    UnknownFormat { encoding: String },

    #[error("Malformed {format} document: {details}")]
    MalformedDocument { format: String, details: String },
}

/// Failure of the external scanning tool.
///
/// Operationally retryable by a fresh job, never within the same job.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ScanToolError {
    #[error("Scan tool not available: {command}\nDetails: {details}\n\n💡 Hint: Install the scanner or set scanner.command in the config file")]
    NotInstalled { command: String, details: String },

    #[error("Scan tool exited with unexpected status {code}: {stderr}")]
    UnexpectedExit { code: String, stderr: String },

    #[error("Scan tool produced malformed output: {details}")]
    MalformedOutput { details: String },

    #[error("Scan tool timed out after {seconds}s")]
    Timeout { seconds: u64 },

    #[error("Scan tool I/O error: {details}")]
    Io { details: String },
}

impl ScanToolError {
    /// Returns true for the timeout subtype
    pub fn is_timeout(&self) -> bool {
        matches!(self, ScanToolError::Timeout { .. })
    }
}

/// Transactional write failure in the scan store.
///
/// Triggers a rollback of the unit being written and the best-effort
/// failed-row fallback of the scan orchestrator.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PersistenceError {
    #[error("Failed to write {table} row: {details}")]
    WriteFailed { table: String, details: String },

    #[error("Duplicate {table} key: {key}")]
    Conflict { table: String, key: String },

    #[error("Scan store unavailable: {details}")]
    Unavailable { details: String },
}

/// A version string or range bound that does not parse as a release version.
///
/// Recovered locally by the range evaluator and never surfaced to callers.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Cannot evaluate version '{input}': {reason}")]
pub struct VersionEvaluationError {
    pub input: String,
    pub reason: String,
}

impl VersionEvaluationError {
    pub fn new(input: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            input: input.into(),
            reason: reason.into(),
        }
    }
}

/// Terminal failure reasons of an upload or a scan job.
///
/// Every variant renders to a human-readable message for the caller's
/// structured error payload.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error(transparent)]
    Parse(#[from] SbomParseError),

    #[error(transparent)]
    ScanTool(#[from] ScanToolError),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    #[error(transparent)]
    VersionEvaluation(#[from] VersionEvaluationError),

    #[error("Upload rejected: {reason}")]
    UploadRejected { reason: String },

    #[error("SBOM not found: {sbom_id}")]
    SbomNotFound { sbom_id: String },

    #[error("Vulnerability lookup timed out after {seconds}s")]
    LookupTimeout { seconds: u64 },

    #[error("Scan queue error: {details}")]
    Queue { details: String },

    #[error("SBOM {sbom_id} was stored but its scan could not be queued: {details}\n\n💡 Hint: Upload the same file again to queue a rescan of the stored SBOM")]
    StoredNotQueued { sbom_id: String, details: String },

    #[error("Vulnerability store error: {0}")]
    Store(#[source] anyhow::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_code_values() {
        assert_eq!(ExitCode::Success.as_i32(), 0);
        assert_eq!(ExitCode::VulnerabilitiesDetected.as_i32(), 1);
        assert_eq!(ExitCode::InvalidArguments.as_i32(), 2);
        assert_eq!(ExitCode::ApplicationError.as_i32(), 3);
    }

    #[test]
    fn test_exit_code_display() {
        assert_eq!(format!("{}", ExitCode::Success), "Success (0)");
        assert_eq!(
            format!("{}", ExitCode::VulnerabilitiesDetected),
            "Vulnerabilities Detected (1)"
        );
        assert_eq!(
            format!("{}", ExitCode::ApplicationError),
            "Application Error (3)"
        );
    }

    #[test]
    fn test_parse_error_display_has_hint() {
        let error = SbomParseError::InvalidJson {
            details: "expected value at line 1 column 1".to_string(),
        };
        let display = format!("{}", error);
        assert!(display.contains("Invalid JSON"));
        assert!(display.contains("line 1 column 1"));
        assert!(display.contains("💡 Hint:"));
    }

    #[test]
    fn test_unknown_format_display() {
        let error = SbomParseError::UnknownFormat {
            encoding: "JSON".to_string(),
        };
        assert!(format!("{}", error).contains("Unknown SBOM format in JSON"));
    }

    #[test]
    fn test_scan_tool_timeout_is_distinct() {
        let timeout = ScanToolError::Timeout { seconds: 300 };
        let exit = ScanToolError::UnexpectedExit {
            code: "2".to_string(),
            stderr: "boom".to_string(),
        };
        assert!(timeout.is_timeout());
        assert!(!exit.is_timeout());
        assert_eq!(format!("{}", timeout), "Scan tool timed out after 300s");
    }

    #[test]
    fn test_scan_error_is_transparent_over_tool_error() {
        let error: ScanError = ScanToolError::UnexpectedExit {
            code: "2".to_string(),
            stderr: "fatal".to_string(),
        }
        .into();
        let display = format!("{}", error);
        assert!(display.contains("unexpected status 2"));
        assert!(display.contains("fatal"));
    }

    #[test]
    fn test_version_evaluation_error_display() {
        let error = VersionEvaluationError::new("1.x", "non-numeric release segment");
        assert_eq!(
            format!("{}", error),
            "Cannot evaluate version '1.x': non-numeric release segment"
        );
    }

    #[test]
    fn test_persistence_error_display() {
        let error = PersistenceError::WriteFailed {
            table: "scan_vulnerabilities".to_string(),
            details: "disk full".to_string(),
        };
        let display = format!("{}", error);
        assert!(display.contains("scan_vulnerabilities"));
        assert!(display.contains("disk full"));
    }
}
