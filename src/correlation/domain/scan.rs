use super::component::Component;
use super::sbom_record::SbomId;
use super::vulnerability::{Severity, Vulnerability};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use uuid::Uuid;

/// Lifecycle state of one scan attempt.
///
/// `Queued` and `Running` are transient; only the terminal states are
/// persisted as `ScanResult` rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanStatus {
    Queued,
    Running,
    Completed,
    Failed,
}

impl ScanStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ScanStatus::Completed | ScanStatus::Failed)
    }

    /// Legal transitions: queued -> running -> {completed, failed}.
    /// Terminal states never transition; a new scan is a new instance.
    pub fn can_transition_to(&self, next: ScanStatus) -> bool {
        matches!(
            (self, next),
            (ScanStatus::Queued, ScanStatus::Running)
                | (ScanStatus::Running, ScanStatus::Completed)
                | (ScanStatus::Running, ScanStatus::Failed)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ScanStatus::Queued => "queued",
            ScanStatus::Running => "running",
            ScanStatus::Completed => "completed",
            ScanStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for ScanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-severity tally of (component, vulnerability) match pairs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeverityCounts {
    pub critical: usize,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
    pub unknown: usize,
}

impl SeverityCounts {
    pub fn increment(&mut self, severity: Severity) {
        match severity {
            Severity::Critical => self.critical += 1,
            Severity::High => self.high += 1,
            Severity::Medium => self.medium += 1,
            Severity::Low => self.low += 1,
            Severity::Unknown => self.unknown += 1,
        }
    }

    pub fn get(&self, severity: Severity) -> usize {
        match severity {
            Severity::Critical => self.critical,
            Severity::High => self.high,
            Severity::Medium => self.medium,
            Severity::Low => self.low,
            Severity::Unknown => self.unknown,
        }
    }

    pub fn total(&self) -> usize {
        self.critical + self.high + self.medium + self.low + self.unknown
    }
}

/// A vulnerability matched against a component, with the CPE criterion
/// (or scanner target) that produced the match.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchedVulnerability {
    pub vulnerability: Vulnerability,
    pub matched_cpe: Option<String>,
}

/// All vulnerabilities matched for one component
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentMatch {
    pub component: Component,
    pub vulnerabilities: Vec<MatchedVulnerability>,
}

/// Outcome of correlating a component set with vulnerability data.
///
/// Produced identically by the built-in matcher and the external scanner
/// adapter.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MatchResult {
    total_components: usize,
    matches: Vec<ComponentMatch>,
    severity_counts: SeverityCounts,
}

impl MatchResult {
    pub fn new(total_components: usize) -> Self {
        Self {
            total_components,
            ..Default::default()
        }
    }

    /// Records the matches found for a component.
    /// Severity buckets are incremented once per match pair.
    pub fn record(&mut self, component: Component, vulnerabilities: Vec<MatchedVulnerability>) {
        if vulnerabilities.is_empty() {
            return;
        }
        for matched in &vulnerabilities {
            self.severity_counts
                .increment(matched.vulnerability.severity);
        }
        match self.matches.iter_mut().find(|m| m.component == component) {
            Some(existing) => existing.vulnerabilities.extend(vulnerabilities),
            None => self.matches.push(ComponentMatch {
                component,
                vulnerabilities,
            }),
        }
    }

    pub fn total_components(&self) -> usize {
        self.total_components
    }

    pub fn matches(&self) -> &[ComponentMatch] {
        &self.matches
    }

    pub fn severity_counts(&self) -> SeverityCounts {
        self.severity_counts
    }

    /// Number of distinct components with at least one match
    pub fn vulnerable_count(&self) -> usize {
        self.matches
            .iter()
            .map(|m| &m.component)
            .collect::<HashSet<_>>()
            .len()
    }

    /// Number of (component, vulnerability) match pairs
    pub fn total_vulnerabilities(&self) -> usize {
        self.matches.iter().map(|m| m.vulnerabilities.len()).sum()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScanResultId(Uuid);

impl ScanResultId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl fmt::Display for ScanResultId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Persisted outcome of one scan attempt. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanResult {
    pub id: ScanResultId,
    pub sbom_id: SbomId,
    pub scan_date: DateTime<Utc>,
    pub status: ScanStatus,
    pub total_components: usize,
    pub vulnerable_count: usize,
    pub severity_counts: SeverityCounts,
    pub scan_duration_seconds: f64,
}

impl ScanResult {
    pub fn completed(sbom_id: SbomId, outcome: &MatchResult, duration_seconds: f64) -> Self {
        let total_components = outcome.total_components();
        let mut vulnerable_count = outcome.vulnerable_count();
        if vulnerable_count > total_components {
            tracing::warn!(
                sbom_id = %sbom_id,
                vulnerable_count,
                total_components,
                "vulnerable count exceeds component count, clamping"
            );
            vulnerable_count = total_components;
        }

        Self {
            id: ScanResultId::generate(),
            sbom_id,
            scan_date: Utc::now(),
            status: ScanStatus::Completed,
            total_components,
            vulnerable_count,
            severity_counts: outcome.severity_counts(),
            scan_duration_seconds: duration_seconds,
        }
    }

    /// Minimal audit row for a scan that failed: zero counts
    pub fn failed(sbom_id: SbomId, duration_seconds: f64) -> Self {
        Self {
            id: ScanResultId::generate(),
            sbom_id,
            scan_date: Utc::now(),
            status: ScanStatus::Failed,
            total_components: 0,
            vulnerable_count: 0,
            severity_counts: SeverityCounts::default(),
            scan_duration_seconds: duration_seconds,
        }
    }

    pub fn total_vulnerabilities(&self) -> usize {
        self.severity_counts.total()
    }
}

/// Association between a scan result and a matched vulnerability
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanVulnerability {
    pub scan_result_id: ScanResultId,
    /// Natural key of the referenced vulnerability (its CVE identifier)
    pub vulnerability_id: String,
    pub component_name: String,
    pub component_version: String,
    pub matched_cpe: Option<String>,
}

/// Everything written for a completed scan as one atomic unit.
///
/// Write order inside the unit: vulnerability upserts, then the result row,
/// then the association rows.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletedScan {
    pub result: ScanResult,
    pub vulnerability_upserts: Vec<Vulnerability>,
    pub links: Vec<ScanVulnerability>,
}

impl CompletedScan {
    /// Builds the unit from a match result.
    ///
    /// # Arguments
    /// * `upsert_findings` - Insert the matched vulnerabilities into the store
    ///   when absent. Used by the external scanner path, whose findings may
    ///   reference CVEs the store has never seen.
    pub fn from_match(
        sbom_id: SbomId,
        outcome: &MatchResult,
        duration_seconds: f64,
        upsert_findings: bool,
    ) -> Self {
        let result = ScanResult::completed(sbom_id, outcome, duration_seconds);
        let mut links = Vec::with_capacity(outcome.total_vulnerabilities());
        let mut vulnerability_upserts: Vec<Vulnerability> = Vec::new();
        let mut seen = HashSet::new();

        for component_match in outcome.matches() {
            for matched in &component_match.vulnerabilities {
                links.push(ScanVulnerability {
                    scan_result_id: result.id,
                    vulnerability_id: matched.vulnerability.cve_id.clone(),
                    component_name: component_match.component.name().to_string(),
                    component_version: component_match.component.version().to_string(),
                    matched_cpe: matched.matched_cpe.clone(),
                });
                if upsert_findings && seen.insert(matched.vulnerability.cve_id.clone()) {
                    vulnerability_upserts.push(matched.vulnerability.clone());
                }
            }
        }

        Self {
            result,
            vulnerability_upserts,
            links,
        }
    }
}

/// Unit of work pulled by a scan worker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanJob {
    pub job_id: Uuid,
    pub sbom_id: SbomId,
    pub enqueued_at: DateTime<Utc>,
    pub is_rescan: bool,
}

impl ScanJob {
    pub fn new(sbom_id: SbomId, is_rescan: bool) -> Self {
        Self {
            job_id: Uuid::new_v4(),
            sbom_id,
            enqueued_at: Utc::now(),
            is_rescan,
        }
    }
}
