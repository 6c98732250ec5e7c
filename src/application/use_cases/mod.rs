/// Use cases module containing application business logic orchestration
mod build_scan_report;
mod ingest_vulnerabilities;
mod refresh_scanner_db;
mod run_scan;
mod submit_sbom;

pub use build_scan_report::BuildScanReportUseCase;
pub use ingest_vulnerabilities::{IngestVulnerabilitiesUseCase, IngestionStats};
pub use refresh_scanner_db::RefreshScannerDbUseCase;
pub use run_scan::{FallbackStats, RunScanUseCase, ScanTimeouts};
pub use submit_sbom::SubmitSbomUseCase;
