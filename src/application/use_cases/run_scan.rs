use crate::application::dto::{FallbackOutcome, ScanEngine, ScanOutcome};
use crate::correlation::domain::{
    CompletedScan, MatchResult, SbomId, SbomRecord, ScanJob, ScanResult, ScanStatus,
};
use crate::correlation::services::VulnerabilityMatcher;
use crate::ports::inbound::ScanJobPort;
use crate::ports::outbound::{ExternalScanner, ScanStore, StoreSession, VulnerabilityStoreView};
use crate::shared::error::{ScanError, ScanToolError};
use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Counters of the failed-row fallback path
///
/// Readable while workers run; shared between every job of a pool.
#[derive(Debug, Default)]
pub struct FallbackStats {
    failed_rows_written: AtomicU64,
    failed_rows_dropped: AtomicU64,
}

impl FallbackStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failed_rows_written(&self) -> u64 {
        self.failed_rows_written.load(Ordering::Relaxed)
    }

    pub fn failed_rows_dropped(&self) -> u64 {
        self.failed_rows_dropped.load(Ordering::Relaxed)
    }

    fn record(&self, outcome: FallbackOutcome) {
        let counter = match outcome {
            FallbackOutcome::FailedRowWritten => &self.failed_rows_written,
            FallbackOutcome::FailedRowDropped => &self.failed_rows_dropped,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

/// Timeouts applied while a job runs
#[derive(Debug, Clone, Copy)]
pub struct ScanTimeouts {
    /// Wall-clock limit of the external scanner invocation
    pub scan: Duration,
    /// Limit on fetching candidates from the vulnerability store
    pub lookup: Duration,
}

impl Default for ScanTimeouts {
    fn default() -> Self {
        Self {
            scan: Duration::from_secs(300),
            lookup: Duration::from_secs(300),
        }
    }
}

/// RunScanUseCase - Drives one scan job through its lifecycle
///
/// `queued -> running -> {completed, failed}`. A completed scan persists its
/// result row and association rows as one atomic unit. On any failure the
/// job ends `failed` and a zero-count `failed` row is attempted for audit;
/// if that write fails as well the secondary error is logged, counted and
/// dropped.
///
/// # Type Parameters
/// * `S` - ScanStore implementation
/// * `X` - ExternalScanner implementation (used only by the external engine)
pub struct RunScanUseCase<S, X> {
    store: S,
    external_scanner: Option<X>,
    engine: ScanEngine,
    timeouts: ScanTimeouts,
    fallback_stats: Arc<FallbackStats>,
}

impl<S, X> RunScanUseCase<S, X>
where
    S: ScanStore,
    X: ExternalScanner,
{
    /// Creates a new RunScanUseCase with injected dependencies
    ///
    /// # Arguments
    /// * `store` - Store holding SBOM records, vulnerabilities and scan results
    /// * `external_scanner` - Scanner tool adapter; required by `ScanEngine::External`
    /// * `engine` - Matching path for every job of this use case
    /// * `timeouts` - Scan and lookup time limits
    pub fn new(
        store: S,
        external_scanner: Option<X>,
        engine: ScanEngine,
        timeouts: ScanTimeouts,
    ) -> Self {
        Self {
            store,
            external_scanner,
            engine,
            timeouts,
            fallback_stats: Arc::new(FallbackStats::new()),
        }
    }

    /// Shares fallback counters with other use case instances
    pub fn with_fallback_stats(mut self, stats: Arc<FallbackStats>) -> Self {
        self.fallback_stats = stats;
        self
    }

    pub fn fallback_stats(&self) -> Arc<FallbackStats> {
        Arc::clone(&self.fallback_stats)
    }

    /// Executes one job to a terminal state
    pub async fn execute(&self, job: ScanJob) -> ScanOutcome {
        let started = Instant::now();
        let mut status = ScanStatus::Queued;

        // Step 1: queued -> running
        advance(&job, &mut status, ScanStatus::Running);

        // Step 2: match and persist
        match self.run(&job, started).await {
            Ok(result) => {
                advance(&job, &mut status, ScanStatus::Completed);
                tracing::info!(
                    sbom_id = %job.sbom_id,
                    scan_result_id = %result.id,
                    total_components = result.total_components,
                    vulnerable_count = result.vulnerable_count,
                    total_vulnerabilities = result.total_vulnerabilities(),
                    duration_secs = result.scan_duration_seconds,
                    "scan completed"
                );
                ScanOutcome::success(&result)
            }
            Err(error) => {
                advance(&job, &mut status, ScanStatus::Failed);
                tracing::error!(sbom_id = %job.sbom_id, job_id = %job.job_id, error = %error, "scan failed");
                let fallback = self
                    .record_failed_row(job.sbom_id, started.elapsed().as_secs_f64())
                    .await;
                ScanOutcome::Failed {
                    sbom_id: job.sbom_id,
                    error: error.to_string(),
                    fallback,
                }
            }
        }
    }

    async fn run(&self, job: &ScanJob, started: Instant) -> Result<ScanResult, ScanError> {
        let session = self.store.open_session().await.map_err(ScanError::Store)?;
        let record = session
            .get_sbom(job.sbom_id)
            .await
            .map_err(ScanError::Store)?
            .ok_or_else(|| ScanError::SbomNotFound {
                sbom_id: job.sbom_id.to_string(),
            })?;

        let (outcome, upsert_findings) = match self.engine {
            ScanEngine::Matcher => (self.match_with_store(&session, &record).await?, false),
            ScanEngine::External => (self.match_with_scanner(&record).await?, true),
        };

        let unit = CompletedScan::from_match(
            record.id,
            &outcome,
            started.elapsed().as_secs_f64(),
            upsert_findings,
        );
        let result = unit.result.clone();
        session.persist_completed_scan(unit).await?;

        Ok(result)
    }

    async fn match_with_store(
        &self,
        session: &S::Session,
        record: &SbomRecord,
    ) -> Result<MatchResult, ScanError> {
        let candidates = tokio::time::timeout(self.timeouts.lookup, session.cpe_candidates())
            .await
            .map_err(|_| ScanError::LookupTimeout {
                seconds: self.timeouts.lookup.as_secs(),
            })?
            .map_err(ScanError::Store)?;

        tracing::debug!(
            sbom_id = %record.id,
            candidates = candidates.len(),
            components = record.component_count(),
            "matching components against stored vulnerabilities"
        );
        Ok(VulnerabilityMatcher::match_components(
            &record.components,
            &candidates,
        ))
    }

    async fn match_with_scanner(&self, record: &SbomRecord) -> Result<MatchResult, ScanError> {
        let scanner = self
            .external_scanner
            .as_ref()
            .ok_or_else(|| ScanToolError::NotInstalled {
                command: "external scanner".to_string(),
                details: "no external scanner configured".to_string(),
            })?;
        Ok(scanner.scan(&record.components, self.timeouts.scan).await?)
    }

    /// Named fallback of the failed path: best-effort zero-count audit row
    async fn record_failed_row(&self, sbom_id: SbomId, duration_seconds: f64) -> FallbackOutcome {
        let failed = ScanResult::failed(sbom_id, duration_seconds);
        let scan_result_id = failed.id;

        let written = match self.store.open_session().await {
            Ok(session) => session
                .record_failed_scan(failed)
                .await
                .map_err(anyhow::Error::from),
            Err(e) => Err(e),
        };

        let outcome = match written {
            Ok(()) => {
                tracing::info!(sbom_id = %sbom_id, scan_result_id = %scan_result_id, "failed scan row written");
                FallbackOutcome::FailedRowWritten
            }
            Err(e) => {
                tracing::warn!(sbom_id = %sbom_id, error = %e, "could not write failed scan row, dropping");
                FallbackOutcome::FailedRowDropped
            }
        };
        self.fallback_stats.record(outcome);
        outcome
    }
}

fn advance(job: &ScanJob, status: &mut ScanStatus, next: ScanStatus) {
    debug_assert!(status.can_transition_to(next), "{} -> {}", status, next);
    tracing::debug!(
        sbom_id = %job.sbom_id,
        job_id = %job.job_id,
        from = %status,
        to = %next,
        "scan state transition"
    );
    *status = next;
}

#[async_trait]
impl<S, X> ScanJobPort for RunScanUseCase<S, X>
where
    S: ScanStore,
    X: ExternalScanner,
{
    async fn handle(&self, job: ScanJob) -> ScanOutcome {
        self.execute(job).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::outbound::storage::{FaultPlan, InMemoryScanStore};
    use crate::correlation::domain::{
        Component, ComponentSet, ContentFingerprint, CpeMatchCriterion, MatchedVulnerability,
        ParsedSbom, SbomFormat, Severity, Vulnerability,
    };
    use crate::ports::outbound::DbRefreshStatus;

    enum FakeBehavior {
        Findings,
        Fail(ScanToolError),
    }

    struct FakeScanner(FakeBehavior);

    #[async_trait]
    impl ExternalScanner for FakeScanner {
        async fn scan(
            &self,
            components: &ComponentSet,
            _timeout: Duration,
        ) -> Result<MatchResult, ScanToolError> {
            match &self.0 {
                FakeBehavior::Findings => {
                    let mut result = MatchResult::new(components.len());
                    result.record(
                        Component::new("openssl".into(), "1.1.1k".into(), None, "library".into()),
                        vec![MatchedVulnerability {
                            vulnerability: Vulnerability::new("CVE-2022-0778", Severity::High),
                            matched_cpe: Some("bom.json".to_string()),
                        }],
                    );
                    Ok(result)
                }
                FakeBehavior::Fail(e) => Err(e.clone()),
            }
        }

        async fn refresh_database(&self, _timeout: Duration) -> DbRefreshStatus {
            DbRefreshStatus::failed(None, "not supported")
        }

        async fn is_available(&self) -> bool {
            true
        }
    }

    async fn seeded_store(components: Vec<Component>) -> (InMemoryScanStore, SbomId) {
        let store = InMemoryScanStore::new();
        store.insert_vulnerabilities(vec![Vulnerability::new("CVE-2021-44228", Severity::Critical)
            .with_cpe_match(
                CpeMatchCriterion::new("cpe:2.3:a:apache:log4j:*").with_end_excluding("2.15.0"),
            )]);
        let record = SbomRecord::new(
            "bom.json".to_string(),
            ContentFingerprint::of(b"bom"),
            ParsedSbom {
                format: SbomFormat::CycloneDx,
                spec_version: None,
                serial_number: None,
                components: ComponentSet::new(components),
            },
        );
        let sbom_id = record.id;
        store
            .open_session()
            .await
            .unwrap()
            .insert_sbom(record)
            .await
            .unwrap();
        (store, sbom_id)
    }

    fn log4j() -> Component {
        Component::new("log4j-core".into(), "2.14.1".into(), None, "library".into())
    }

    #[tokio::test]
    async fn test_matcher_engine_completes_and_persists() {
        let (store, sbom_id) = seeded_store(vec![log4j()]).await;
        let use_case: RunScanUseCase<_, FakeScanner> =
            RunScanUseCase::new(store.clone(), None, ScanEngine::Matcher, ScanTimeouts::default());

        let outcome = use_case.execute(ScanJob::new(sbom_id, false)).await;
        match outcome {
            ScanOutcome::Success {
                vulnerable_count,
                total_components,
                severity_counts,
                ..
            } => {
                assert_eq!(vulnerable_count, 1);
                assert_eq!(total_components, 1);
                assert_eq!(severity_counts.critical, 1);
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert_eq!(store.scan_result_count(), 1);
        assert_eq!(store.scan_vulnerability_count(), 1);
    }

    #[tokio::test]
    async fn test_empty_sbom_completes_with_zero_counts() {
        let (store, sbom_id) = seeded_store(vec![]).await;
        let use_case: RunScanUseCase<_, FakeScanner> =
            RunScanUseCase::new(store.clone(), None, ScanEngine::Matcher, ScanTimeouts::default());

        let outcome = use_case.execute(ScanJob::new(sbom_id, false)).await;
        assert!(outcome.is_success());
        let session = store.open_session().await.unwrap();
        let result = session.latest_scan(sbom_id).await.unwrap().unwrap();
        assert_eq!(result.status, ScanStatus::Completed);
        assert_eq!(result.total_components, 0);
        assert_eq!(result.vulnerable_count, 0);
    }

    #[tokio::test]
    async fn test_external_engine_upserts_findings() {
        let (store, sbom_id) = seeded_store(vec![log4j()]).await;
        let use_case = RunScanUseCase::new(
            store.clone(),
            Some(FakeScanner(FakeBehavior::Findings)),
            ScanEngine::External,
            ScanTimeouts::default(),
        );

        let outcome = use_case.execute(ScanJob::new(sbom_id, false)).await;
        assert!(outcome.is_success());
        let session = store.open_session().await.unwrap();
        assert!(session.get_vulnerability("CVE-2022-0778").await.unwrap().is_some());
        assert_eq!(store.scan_vulnerability_count(), 1);
    }

    #[tokio::test]
    async fn test_tool_failure_writes_failed_row_and_no_links() {
        let (store, sbom_id) = seeded_store(vec![log4j()]).await;
        let use_case = RunScanUseCase::new(
            store.clone(),
            Some(FakeScanner(FakeBehavior::Fail(ScanToolError::UnexpectedExit {
                code: "2".to_string(),
                stderr: "fatal".to_string(),
            }))),
            ScanEngine::External,
            ScanTimeouts::default(),
        );

        let outcome = use_case.execute(ScanJob::new(sbom_id, false)).await;
        assert!(outcome.error().unwrap().contains("unexpected status 2"));
        assert_eq!(store.scan_vulnerability_count(), 0);

        let session = store.open_session().await.unwrap();
        let result = session.latest_scan(sbom_id).await.unwrap().unwrap();
        assert_eq!(result.status, ScanStatus::Failed);
        assert_eq!(result.total_vulnerabilities(), 0);
        assert_eq!(use_case.fallback_stats().failed_rows_written(), 1);
    }

    #[tokio::test]
    async fn test_external_engine_without_scanner_fails() {
        let (store, sbom_id) = seeded_store(vec![log4j()]).await;
        let use_case: RunScanUseCase<_, FakeScanner> =
            RunScanUseCase::new(store, None, ScanEngine::External, ScanTimeouts::default());
        let outcome = use_case.execute(ScanJob::new(sbom_id, false)).await;
        assert!(outcome.error().unwrap().contains("not available"));
    }

    #[tokio::test]
    async fn test_missing_sbom_fails() {
        let store = InMemoryScanStore::new();
        let use_case: RunScanUseCase<_, FakeScanner> =
            RunScanUseCase::new(store, None, ScanEngine::Matcher, ScanTimeouts::default());
        let outcome = use_case.execute(ScanJob::new(SbomId::generate(), false)).await;
        assert!(outcome.error().unwrap().contains("SBOM not found"));
    }

    #[tokio::test]
    async fn test_secondary_failure_is_dropped_and_counted() {
        let (store, sbom_id) = seeded_store(vec![log4j()]).await;
        store.set_fault_plan(FaultPlan {
            fail_link_at: Some(0),
            fail_failed_row: true,
            ..Default::default()
        });
        let use_case: RunScanUseCase<_, FakeScanner> =
            RunScanUseCase::new(store.clone(), None, ScanEngine::Matcher, ScanTimeouts::default());

        let outcome = use_case.execute(ScanJob::new(sbom_id, false)).await;
        match outcome {
            ScanOutcome::Failed { fallback, error, .. } => {
                assert_eq!(fallback, FallbackOutcome::FailedRowDropped);
                assert!(error.contains("scan_vulnerabilities"));
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert_eq!(store.scan_result_count(), 0);
        assert_eq!(use_case.fallback_stats().failed_rows_dropped(), 1);
        assert_eq!(use_case.fallback_stats().failed_rows_written(), 0);
    }
}
