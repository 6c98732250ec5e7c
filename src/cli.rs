use clap::{Parser, Subcommand};
use std::path::PathBuf;

use sbom_vuln_scanner::application::dto::{OutputFormat, ScanEngine};

/// Correlate CycloneDX and SPDX SBOMs with known vulnerabilities
#[derive(Parser, Debug)]
#[command(name = "sbom-vuln-scanner")]
#[command(version)]
#[command(
    about = "Correlate CycloneDX and SPDX SBOMs with known vulnerabilities",
    long_about = None
)]
pub struct Args {
    /// Path to a config file (defaults to ./sbom-vuln-scanner.config.yml when present)
    #[arg(short, long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Scan an SBOM file and print a vulnerability report
    Scan(ScanArgs),
    /// Refresh the external scanner's vulnerability database
    RefreshDb {
        /// Keep refreshing every scanner.db_refresh_interval_secs until interrupted
        #[arg(long)]
        watch: bool,
    },
    /// Check whether the external scanner is installed
    CheckTool,
}

#[derive(clap::Args, Debug)]
pub struct ScanArgs {
    /// SBOM document (.json or .xml, CycloneDX or SPDX)
    pub file: PathBuf,

    /// NVD CVE API 2.0 JSON file to load before matching
    #[arg(long, value_name = "PATH")]
    pub feed: Option<PathBuf>,

    /// Fetch recently published CVEs from the NVD API before matching
    #[arg(long)]
    pub fetch_nvd: bool,

    /// Matching engine: matcher or external (overrides config)
    #[arg(short, long)]
    pub engine: Option<ScanEngine>,

    /// Report format: json or csv
    #[arg(short, long, default_value = "json")]
    pub format: OutputFormat,

    /// Output file path (if not specified, outputs to stdout)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

impl Args {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
