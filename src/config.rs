//! Configuration file support for sbom-vuln-scanner.
//!
//! Provides YAML-based configuration through `sbom-vuln-scanner.config.yml`
//! files, including the file schema, loading, validation, and resolution
//! into runtime [`Settings`] with defaults applied.

use anyhow::{bail, Context};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::adapters::outbound::scanner::TrivyScanner;
use crate::application::dto::ScanEngine;
use crate::application::use_cases::ScanTimeouts;
use crate::shared::security::MAX_UPLOAD_SIZE;
use crate::shared::Result;

pub const CONFIG_FILENAME: &str = "sbom-vuln-scanner.config.yml";

const DEFAULT_SCANNER_COMMAND: &str = "trivy";
const DEFAULT_REFRESH_TARGET: &str = "alpine:latest";
const DEFAULT_SCAN_TIMEOUT_SECS: u64 = 300;
const DEFAULT_LOOKUP_TIMEOUT_SECS: u64 = 300;
const DEFAULT_DB_REFRESH_TIMEOUT_SECS: u64 = 600;
const DEFAULT_DB_REFRESH_INTERVAL_SECS: u64 = 12 * 60 * 60;
const DEFAULT_WORKERS: usize = 4;
const DEFAULT_NVD_WINDOW_DAYS: u32 = 30;

/// Top-level configuration file schema.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFile {
    pub log_level: Option<String>,
    pub log_format: Option<String>,
    pub engine: Option<String>,
    pub workers: Option<usize>,
    pub max_upload_bytes: Option<u64>,
    pub lookup_timeout_secs: Option<u64>,
    pub scanner: Option<ScannerSection>,
    pub nvd: Option<NvdSection>,
    /// Captures unknown fields for warnings.
    #[serde(flatten)]
    pub unknown_fields: HashMap<String, serde_yaml_ng::Value>,
}

/// External scanning tool settings.
#[derive(Debug, Deserialize, Default)]
pub struct ScannerSection {
    pub command: Option<String>,
    pub cache_dir: Option<PathBuf>,
    pub scan_timeout_secs: Option<u64>,
    pub db_refresh_timeout_secs: Option<u64>,
    pub db_refresh_interval_secs: Option<u64>,
    pub refresh_target: Option<String>,
}

/// NVD CVE API settings.
#[derive(Debug, Deserialize, Default)]
pub struct NvdSection {
    pub api_key: Option<String>,
    pub window_days: Option<u32>,
}

/// Log output flavour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pretty" | "text" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            _ => Err(format!(
                "Invalid log format: {}. Please specify 'pretty' or 'json'",
                s
            )),
        }
    }
}

/// Resolved scanner settings.
#[derive(Debug, Clone, PartialEq)]
pub struct ScannerSettings {
    pub command: String,
    pub cache_dir: PathBuf,
    pub scan_timeout: Duration,
    pub db_refresh_timeout: Duration,
    pub db_refresh_interval: Duration,
    pub refresh_target: String,
}

impl ScannerSettings {
    /// Builds the Trivy adapter these settings describe.
    pub fn build_scanner(&self) -> TrivyScanner {
        TrivyScanner::new(self.command.clone(), self.cache_dir.clone())
            .with_refresh_target(self.refresh_target.clone())
    }
}

/// Resolved NVD settings.
#[derive(Debug, Clone, PartialEq)]
pub struct NvdSettings {
    pub api_key: Option<String>,
    pub window_days: u32,
}

/// Runtime settings: file values over defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub log_level: String,
    pub log_format: LogFormat,
    pub engine: ScanEngine,
    pub workers: usize,
    pub max_upload_bytes: u64,
    pub lookup_timeout: Duration,
    pub scanner: ScannerSettings,
    pub nvd: NvdSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_level: "warn".to_string(),
            log_format: LogFormat::Pretty,
            engine: ScanEngine::Matcher,
            workers: DEFAULT_WORKERS,
            max_upload_bytes: MAX_UPLOAD_SIZE,
            lookup_timeout: Duration::from_secs(DEFAULT_LOOKUP_TIMEOUT_SECS),
            scanner: ScannerSettings {
                command: DEFAULT_SCANNER_COMMAND.to_string(),
                cache_dir: TrivyScanner::default_cache_dir(),
                scan_timeout: Duration::from_secs(DEFAULT_SCAN_TIMEOUT_SECS),
                db_refresh_timeout: Duration::from_secs(DEFAULT_DB_REFRESH_TIMEOUT_SECS),
                db_refresh_interval: Duration::from_secs(DEFAULT_DB_REFRESH_INTERVAL_SECS),
                refresh_target: DEFAULT_REFRESH_TARGET.to_string(),
            },
            nvd: NvdSettings {
                api_key: None,
                window_days: DEFAULT_NVD_WINDOW_DAYS,
            },
        }
    }
}

impl Settings {
    /// Applies a (validated) config file on top of the defaults.
    pub fn from_file(config: Option<&ConfigFile>) -> Result<Self> {
        let mut settings = Settings::default();
        let Some(config) = config else {
            return Ok(settings);
        };

        if let Some(ref level) = config.log_level {
            settings.log_level = level.clone();
        }
        if let Some(ref format) = config.log_format {
            settings.log_format = format.parse().map_err(anyhow::Error::msg)?;
        }
        if let Some(ref engine) = config.engine {
            settings.engine = engine.parse().map_err(anyhow::Error::msg)?;
        }
        if let Some(workers) = config.workers {
            settings.workers = workers;
        }
        if let Some(max) = config.max_upload_bytes {
            settings.max_upload_bytes = max;
        }
        if let Some(secs) = config.lookup_timeout_secs {
            settings.lookup_timeout = Duration::from_secs(secs);
        }

        if let Some(ref scanner) = config.scanner {
            let target = &mut settings.scanner;
            if let Some(ref command) = scanner.command {
                target.command = command.clone();
            }
            if let Some(ref dir) = scanner.cache_dir {
                target.cache_dir = dir.clone();
            }
            if let Some(secs) = scanner.scan_timeout_secs {
                target.scan_timeout = Duration::from_secs(secs);
            }
            if let Some(secs) = scanner.db_refresh_timeout_secs {
                target.db_refresh_timeout = Duration::from_secs(secs);
            }
            if let Some(secs) = scanner.db_refresh_interval_secs {
                target.db_refresh_interval = Duration::from_secs(secs);
            }
            if let Some(ref refresh_target) = scanner.refresh_target {
                target.refresh_target = refresh_target.clone();
            }
        }

        if let Some(ref nvd) = config.nvd {
            if nvd.api_key.is_some() {
                settings.nvd.api_key = nvd.api_key.clone();
            }
            if let Some(days) = nvd.window_days {
                settings.nvd.window_days = days;
            }
        }

        Ok(settings)
    }

    pub fn scan_timeouts(&self) -> ScanTimeouts {
        ScanTimeouts {
            scan: self.scanner.scan_timeout,
            lookup: self.lookup_timeout,
        }
    }
}

/// Load config from an explicit path. Returns an error if the file is not found.
pub fn load_config_from_path(path: &Path) -> Result<ConfigFile> {
    let content = std::fs::read_to_string(path).with_context(|| {
        format!(
            "Failed to read config file: {}\n\n💡 Hint: Check that the file exists and is readable.",
            path.display()
        )
    })?;

    let config: ConfigFile = serde_yaml_ng::from_str(&content).with_context(|| {
        format!(
            "Failed to parse config file: {}\n\n💡 Hint: Ensure the file contains valid YAML syntax.",
            path.display()
        )
    })?;

    validate_config(&config)?;

    Ok(config)
}

/// Auto-discover config in a directory. Returns `None` silently if not found.
pub fn discover_config(dir: &Path) -> Result<Option<ConfigFile>> {
    let config_path = dir.join(CONFIG_FILENAME);

    if !config_path.exists() {
        return Ok(None);
    }

    let config = load_config_from_path(&config_path)?;
    Ok(Some(config))
}

fn require_positive(name: &str, value: Option<u64>) -> Result<()> {
    if value == Some(0) {
        bail!(
            "Invalid config: {} must be greater than 0.\n\n\
             💡 Hint: Remove the field to use the default, or set a positive number of seconds.",
            name
        );
    }
    Ok(())
}

/// Validate the loaded configuration.
fn validate_config(config: &ConfigFile) -> Result<()> {
    if config.workers == Some(0) {
        bail!(
            "Invalid config: workers must be at least 1.\n\n\
             💡 Hint: The worker pool needs at least one worker to process scan jobs."
        );
    }
    if config.max_upload_bytes == Some(0) {
        bail!(
            "Invalid config: max_upload_bytes must be greater than 0.\n\n\
             💡 Hint: The default limit is {} bytes (50 MiB).",
            MAX_UPLOAD_SIZE
        );
    }
    if let Some(ref engine) = config.engine {
        if let Err(e) = engine.parse::<ScanEngine>() {
            bail!("Invalid config: {}", e);
        }
    }
    if let Some(ref format) = config.log_format {
        if let Err(e) = format.parse::<LogFormat>() {
            bail!("Invalid config: {}", e);
        }
    }

    require_positive("lookup_timeout_secs", config.lookup_timeout_secs)?;
    if let Some(ref scanner) = config.scanner {
        require_positive("scanner.scan_timeout_secs", scanner.scan_timeout_secs)?;
        require_positive(
            "scanner.db_refresh_timeout_secs",
            scanner.db_refresh_timeout_secs,
        )?;
        require_positive(
            "scanner.db_refresh_interval_secs",
            scanner.db_refresh_interval_secs,
        )?;
        if scanner
            .command
            .as_deref()
            .is_some_and(|c| c.trim().is_empty())
        {
            bail!(
                "Invalid config: scanner.command must not be empty.\n\n\
                 💡 Hint: Set it to the scanner executable, e.g. \"trivy\" or \"/usr/local/bin/trivy\"."
            );
        }
    }
    if let Some(ref nvd) = config.nvd {
        if nvd.window_days == Some(0) {
            bail!(
                "Invalid config: nvd.window_days must be at least 1.\n\n\
                 💡 Hint: The NVD API accepts publication windows of up to 120 days."
            );
        }
    }
    Ok(())
}

/// Warn about unknown fields in the config file.
///
/// Called once logging is up, since the log level itself comes from the file.
pub fn warn_unknown_fields(config: &ConfigFile) {
    for key in config.unknown_fields.keys() {
        tracing::warn!(field = %key, "unknown config field will be ignored");
    }
}
