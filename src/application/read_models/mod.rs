//! Read models for CQRS-lite pattern
//!
//! This module contains view-optimized structs that provide
//! a denormalized representation of domain data for queries.

pub mod scan_report;
pub mod scan_report_builder;

pub use scan_report::{
    ReportVulnerabilityView, RiskSummaryView, ScanReport, ScanSummaryView, SeverityPercentages,
};
pub use scan_report_builder::ScanReportBuilder;
