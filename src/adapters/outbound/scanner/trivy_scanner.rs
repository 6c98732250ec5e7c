use super::trivy_report::TrivyReport;
use crate::adapters::outbound::formatters::CycloneDxFormatter;
use crate::correlation::domain::{ComponentSet, MatchResult};
use crate::ports::outbound::{DbRefreshStatus, ExternalScanner};
use crate::shared::error::ScanToolError;
use async_trait::async_trait;
use std::ffi::OsString;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};
use std::time::Duration;
use tokio::process::Command;

/// Severity filter passed to every scan; covers all five buckets
const SEVERITY_FILTER: &str = "UNKNOWN,LOW,MEDIUM,HIGH,CRITICAL";
const DEFAULT_REFRESH_TARGET: &str = "alpine:latest";
const VERSION_CHECK_TIMEOUT: Duration = Duration::from_secs(5);

/// TrivyScanner adapter running the `trivy` CLI as a subprocess
///
/// Each scan writes the canonical SBOM to a temporary file that is removed
/// when the scan returns, whatever the outcome. A subprocess that outlives
/// its timeout is killed.
pub struct TrivyScanner {
    command: String,
    cache_dir: PathBuf,
    refresh_target: String,
    temp_dir: Option<PathBuf>,
    formatter: CycloneDxFormatter,
}

impl TrivyScanner {
    /// Creates a scanner invoking `command` with the given database cache directory
    pub fn new(command: impl Into<String>, cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            command: command.into(),
            cache_dir: cache_dir.into(),
            refresh_target: DEFAULT_REFRESH_TARGET.to_string(),
            temp_dir: None,
            formatter: CycloneDxFormatter::new(),
        }
    }

    /// Image used as the placeholder target of a database refresh
    pub fn with_refresh_target(mut self, target: impl Into<String>) -> Self {
        self.refresh_target = target.into();
        self
    }

    /// Directory for the temporary SBOM files (system temp dir by default)
    pub fn with_temp_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.temp_dir = Some(dir.into());
        self
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// `$TRIVY_CACHE_DIR`, falling back to `~/.cache/trivy`
    pub fn default_cache_dir() -> PathBuf {
        if let Some(dir) = std::env::var_os("TRIVY_CACHE_DIR").filter(|d| !d.is_empty()) {
            return PathBuf::from(dir);
        }
        std::env::var_os("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(std::env::temp_dir)
            .join(".cache")
            .join("trivy")
    }

    fn write_sbom(&self, components: &ComponentSet) -> Result<tempfile::NamedTempFile, ScanToolError> {
        let io_error = |e: std::io::Error| ScanToolError::Io {
            details: format!("failed to write temporary SBOM: {}", e),
        };

        let document = self
            .formatter
            .format(components)
            .map_err(|e| ScanToolError::Io {
                details: format!("failed to serialize SBOM: {}", e),
            })?;

        let mut builder = tempfile::Builder::new();
        builder.prefix("sbom-").suffix(".json");
        let mut file = match &self.temp_dir {
            Some(dir) => builder.tempfile_in(dir),
            None => builder.tempfile(),
        }
        .map_err(io_error)?;

        file.write_all(document.as_bytes()).map_err(io_error)?;
        file.flush().map_err(io_error)?;
        Ok(file)
    }

    /// Runs the tool and waits for it, killing it when `timeout` elapses
    async fn run(&self, args: &[OsString], timeout: Duration) -> Result<Output, ScanToolError> {
        tracing::debug!(command = %self.command, args = ?args, "executing scanner");

        let child = Command::new(&self.command)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound | std::io::ErrorKind::PermissionDenied => {
                    ScanToolError::NotInstalled {
                        command: self.command.clone(),
                        details: e.to_string(),
                    }
                }
                _ => ScanToolError::Io {
                    details: e.to_string(),
                },
            })?;

        // dropping the future on timeout drops the child, which kills it
        match tokio::time::timeout(timeout, child.wait_with_output()).await {
            Ok(output) => output.map_err(|e| ScanToolError::Io {
                details: e.to_string(),
            }),
            Err(_) => Err(ScanToolError::Timeout {
                seconds: timeout.as_secs(),
            }),
        }
    }

    fn scan_args(&self, sbom_path: &Path) -> Vec<OsString> {
        vec![
            "sbom".into(),
            "--format".into(),
            "json".into(),
            "--cache-dir".into(),
            self.cache_dir.clone().into_os_string(),
            "--severity".into(),
            SEVERITY_FILTER.into(),
            sbom_path.as_os_str().to_os_string(),
        ]
    }

    fn refresh_args(&self) -> Vec<OsString> {
        vec![
            "image".into(),
            "--download-db-only".into(),
            "--cache-dir".into(),
            self.cache_dir.clone().into_os_string(),
            self.refresh_target.clone().into(),
        ]
    }
}

fn exit_code_label(output: &Output) -> String {
    output
        .status
        .code()
        .map(|c| c.to_string())
        .unwrap_or_else(|| "signal".to_string())
}

#[async_trait]
impl ExternalScanner for TrivyScanner {
    async fn scan(
        &self,
        components: &ComponentSet,
        timeout: Duration,
    ) -> Result<MatchResult, ScanToolError> {
        // removed on drop, on every return path
        let sbom_file = self.write_sbom(components)?;
        let output = self.run(&self.scan_args(sbom_file.path()), timeout).await;

        let output = match output {
            Ok(output) => output,
            Err(e) => {
                tracing::error!(error = %e, "scanner invocation failed");
                return Err(e);
            }
        };

        match output.status.code() {
            // 1 means findings were reported
            Some(0) | Some(1) => {
                let result = TrivyReport::parse(&output.stdout)?.into_match_result(components.len());
                tracing::info!(
                    exit_code = output.status.code().unwrap_or_default(),
                    findings = result.total_vulnerabilities(),
                    vulnerable_count = result.vulnerable_count(),
                    "scanner finished"
                );
                Ok(result)
            }
            _ => {
                let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
                let code = exit_code_label(&output);
                tracing::error!(exit_code = %code, stderr = %stderr, "scanner exited unexpectedly");
                Err(ScanToolError::UnexpectedExit { code, stderr })
            }
        }
    }

    async fn refresh_database(&self, timeout: Duration) -> DbRefreshStatus {
        tracing::info!(cache_dir = %self.cache_dir.display(), "starting scanner database refresh");

        match self.run(&self.refresh_args(), timeout).await {
            Ok(output) if output.status.success() => DbRefreshStatus::Success {
                updated_at: chrono::Utc::now(),
                cache_dir: self.cache_dir.clone(),
                message: "Database updated successfully".to_string(),
            },
            Ok(output) => DbRefreshStatus::failed(
                Some(self.cache_dir.clone()),
                format!(
                    "Database refresh failed with status {}: {}",
                    exit_code_label(&output),
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            ),
            Err(ScanToolError::Timeout { seconds }) => DbRefreshStatus::failed(
                Some(self.cache_dir.clone()),
                format!("Database refresh timed out after {}s", seconds),
            ),
            Err(e) => DbRefreshStatus::failed(
                Some(self.cache_dir.clone()),
                format!("Database refresh error: {}", e),
            ),
        }
    }

    async fn is_available(&self) -> bool {
        match self.run(&["--version".into()], VERSION_CHECK_TIMEOUT).await {
            Ok(output) if output.status.success() => {
                let version = String::from_utf8_lossy(&output.stdout);
                tracing::info!(version = %version.lines().next().unwrap_or_default(), "scanner is installed");
                true
            }
            Ok(output) => {
                tracing::warn!(exit_code = %exit_code_label(&output), "scanner version check failed");
                false
            }
            Err(e) => {
                tracing::warn!(error = %e, "scanner version check failed");
                false
            }
        }
    }
}
