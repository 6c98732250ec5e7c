//! sbom-vuln-scanner - vulnerability correlation engine for SBOMs
//!
//! This library ingests CycloneDX and SPDX documents (JSON or XML),
//! normalizes them into a flat component list, and correlates those
//! components with known vulnerabilities, either through a built-in CPE
//! matcher with version-range evaluation or through an external scanner
//! (Trivy). Each scan runs through a small state machine and persists its
//! result atomically, following hexagonal architecture and Domain-Driven
//! Design principles.
//!
//! # Architecture
//!
//! The library is organized into the following layers:
//!
//! - **Domain Layer** (`correlation`): Components, vulnerabilities, version ranges and matching
//! - **Application Layer** (`application`): Use cases, DTOs, read models and factories
//! - **Ports** (`ports`): Interface definitions for infrastructure
//! - **Adapters** (`adapters`): Concrete implementations of ports
//! - **Shared** (`shared`): Common utilities and error types
//!
//! # Example
//!
//! ```no_run
//! use sbom_vuln_scanner::prelude::*;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<()> {
//! let store = InMemoryScanStore::new();
//!
//! // Load vulnerability records
//! let feed = NvdFeedFile::new("nvd.json");
//! IngestVulnerabilitiesUseCase::new(store.clone(), feed, StderrProgressReporter::new())
//!     .execute()
//!     .await?;
//!
//! // Start workers and submit an SBOM
//! let run_scan = RunScanUseCase::new(
//!     store.clone(),
//!     None::<TrivyScanner>,
//!     ScanEngine::Matcher,
//!     ScanTimeouts::default(),
//! );
//! let (queue, mut pool) = ScanWorkerPool::start(Arc::new(run_scan), 4);
//! let submit = SubmitSbomUseCase::new(store.clone(), queue, 50 * 1024 * 1024);
//! let content = std::fs::read("bom.json")?;
//! let receipt = submit.execute(UploadRequest::new("bom.json", content)).await?;
//!
//! let outcome = pool.next_outcome().await;
//! println!("{:?}", outcome);
//!
//! // Render the report
//! if let Some(report) = BuildScanReportUseCase::new(store).execute(receipt.sbom_id).await? {
//!     println!("{}", JsonReportFormatter::new().format(&report)?);
//! }
//! # Ok(())
//! # }
//! ```

pub mod adapters;
pub mod application;
pub mod config;
pub mod correlation;
pub mod ports;
pub mod shared;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::adapters::outbound::console::StderrProgressReporter;
    pub use crate::adapters::outbound::filesystem::{
        FileSystemReader, FileSystemWriter, NvdFeedFile, StdoutPresenter,
    };
    pub use crate::adapters::outbound::formatters::{
        CsvReportFormatter, CycloneDxFormatter, JsonReportFormatter,
    };
    pub use crate::adapters::outbound::network::NvdClient;
    pub use crate::adapters::outbound::queue::{ChannelScanQueue, ScanWorkerPool};
    pub use crate::adapters::outbound::scanner::TrivyScanner;
    pub use crate::adapters::outbound::storage::InMemoryScanStore;
    pub use crate::application::dto::{
        OutputFormat, ScanEngine, ScanOutcome, UploadReceipt, UploadRequest,
    };
    pub use crate::application::read_models::ScanReport;
    pub use crate::application::use_cases::{
        BuildScanReportUseCase, IngestVulnerabilitiesUseCase, RefreshScannerDbUseCase,
        RunScanUseCase, ScanTimeouts, SubmitSbomUseCase,
    };
    pub use crate::correlation::domain::{
        Component, ComponentSet, MatchResult, SbomId, ScanJob, ScanResult, ScanStatus, Severity,
        Vulnerability,
    };
    pub use crate::correlation::services::{SbomNormalizer, VulnerabilityMatcher};
    pub use crate::ports::outbound::{
        ExternalScanner, OutputPresenter, ProgressReporter, ScanReportFormatter, ScanStore,
        StoreSession, VulnerabilityFeed,
    };
    pub use crate::shared::error::ScanError;
    pub use crate::shared::Result;
}
