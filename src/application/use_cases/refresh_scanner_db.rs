use crate::ports::outbound::{DbRefreshStatus, ExternalScanner};
use std::future::Future;
use std::time::Duration;

/// RefreshScannerDbUseCase - Keeps the external scanner's database current
///
/// Runs on demand or on a fixed interval. Failures are reported in the
/// returned status and never stop the periodic loop.
///
/// # Type Parameters
/// * `X` - ExternalScanner implementation
pub struct RefreshScannerDbUseCase<X> {
    scanner: X,
    timeout: Duration,
}

impl<X: ExternalScanner> RefreshScannerDbUseCase<X> {
    /// Creates a new RefreshScannerDbUseCase
    ///
    /// # Arguments
    /// * `scanner` - Scanner whose database is refreshed
    /// * `timeout` - Limit for one refresh run
    pub fn new(scanner: X, timeout: Duration) -> Self {
        Self { scanner, timeout }
    }

    /// Refreshes once
    pub async fn execute(&self) -> DbRefreshStatus {
        if !self.scanner.is_available().await {
            tracing::warn!("scanner not installed, skipping database refresh");
            return DbRefreshStatus::failed(None, "Scanner is not installed");
        }

        let status = self.scanner.refresh_database(self.timeout).await;
        match &status {
            DbRefreshStatus::Success { cache_dir, .. } => {
                tracing::info!(cache_dir = %cache_dir.display(), "scanner database refreshed")
            }
            DbRefreshStatus::Failed { error, .. } => {
                tracing::error!(error = %error, "scanner database refresh failed")
            }
        }
        status
    }

    /// Refreshes every `interval` until `shutdown` resolves
    ///
    /// The first refresh runs immediately.
    ///
    /// # Returns
    /// Number of refresh runs performed
    pub async fn run_every<F>(&self, interval: Duration, shutdown: F) -> usize
    where
        F: Future<Output = ()>,
    {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        let mut runs = 0;
        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    tracing::debug!(runs, "database refresh loop stopped");
                    return runs;
                }
                _ = ticker.tick() => {
                    self.execute().await;
                    runs += 1;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::correlation::domain::{ComponentSet, MatchResult};
    use crate::shared::error::ScanToolError;
    use async_trait::async_trait;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct CountingScanner {
        installed: bool,
        refreshes: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl ExternalScanner for CountingScanner {
        async fn scan(
            &self,
            components: &ComponentSet,
            _timeout: Duration,
        ) -> Result<MatchResult, ScanToolError> {
            Ok(MatchResult::new(components.len()))
        }

        async fn refresh_database(&self, _timeout: Duration) -> DbRefreshStatus {
            self.refreshes.fetch_add(1, Ordering::SeqCst);
            DbRefreshStatus::Success {
                updated_at: chrono::Utc::now(),
                cache_dir: PathBuf::from("/tmp/cache"),
                message: "updated".to_string(),
            }
        }

        async fn is_available(&self) -> bool {
            self.installed
        }
    }

    fn scanner(installed: bool) -> (CountingScanner, Arc<AtomicUsize>) {
        let refreshes = Arc::new(AtomicUsize::new(0));
        (
            CountingScanner {
                installed,
                refreshes: Arc::clone(&refreshes),
            },
            refreshes,
        )
    }

    #[tokio::test]
    async fn test_refresh_success() {
        let (scanner, refreshes) = scanner(true);
        let use_case = RefreshScannerDbUseCase::new(scanner, Duration::from_secs(1));
        assert!(use_case.execute().await.is_success());
        assert_eq!(refreshes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_refresh_without_scanner_reports_failure() {
        let (scanner, refreshes) = scanner(false);
        let use_case = RefreshScannerDbUseCase::new(scanner, Duration::from_secs(1));
        match use_case.execute().await {
            DbRefreshStatus::Failed { error, cache_dir, .. } => {
                assert!(error.contains("not installed"));
                assert!(cache_dir.is_none());
            }
            other => panic!("unexpected status: {:?}", other),
        }
        assert_eq!(refreshes.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_every_stops_on_shutdown() {
        let (scanner, refreshes) = scanner(true);
        let use_case = RefreshScannerDbUseCase::new(scanner, Duration::from_secs(1));

        let runs = use_case
            .run_every(
                Duration::from_secs(60),
                tokio::time::sleep(Duration::from_secs(150)),
            )
            .await;

        // ticks at 0s, 60s and 120s
        assert_eq!(runs, 3);
        assert_eq!(refreshes.load(Ordering::SeqCst), 3);
    }
}
