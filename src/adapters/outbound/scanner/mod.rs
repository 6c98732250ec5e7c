/// External scanner adapters
mod trivy_report;
mod trivy_scanner;

pub use trivy_scanner::TrivyScanner;
