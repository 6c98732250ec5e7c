use crate::application::dto::ScanOutcome;
use crate::correlation::domain::ScanJob;
use crate::ports::inbound::ScanJobPort;
use crate::ports::outbound::ScanQueue;
use crate::shared::Result;
use futures::future::join_all;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;

/// ChannelScanQueue adapter feeding an in-process worker pool
///
/// Cheap to clone. The pool drains and stops once every clone is dropped.
#[derive(Clone)]
pub struct ChannelScanQueue {
    sender: mpsc::UnboundedSender<ScanJob>,
}

impl ScanQueue for ChannelScanQueue {
    fn enqueue(&self, job: ScanJob) -> Result<()> {
        let job_id = job.job_id;
        self.sender
            .send(job)
            .map_err(|_| anyhow::anyhow!("scan queue is closed"))?;
        tracing::debug!(job_id = %job_id, "scan job enqueued");
        Ok(())
    }
}

/// Pool of scan workers pulling jobs from a shared channel
///
/// Workers never coordinate on a job: each job is received by exactly one
/// worker, which drives it to a terminal state through the job port.
pub struct ScanWorkerPool {
    handles: Vec<JoinHandle<()>>,
    outcomes: mpsc::UnboundedReceiver<ScanOutcome>,
}

impl ScanWorkerPool {
    /// Spawns `workers` workers on the current runtime
    ///
    /// # Returns
    /// The queue to submit jobs to, and the pool collecting their outcomes
    pub fn start<P>(handler: Arc<P>, workers: usize) -> (ChannelScanQueue, Self)
    where
        P: ScanJobPort + 'static,
    {
        let (job_tx, job_rx) = mpsc::unbounded_channel();
        let (outcome_tx, outcome_rx) = mpsc::unbounded_channel();
        let job_rx = Arc::new(Mutex::new(job_rx));

        let handles = (0..workers.max(1))
            .map(|worker_id| {
                Self::spawn_worker(
                    worker_id,
                    Arc::clone(&handler),
                    Arc::clone(&job_rx),
                    outcome_tx.clone(),
                )
            })
            .collect();

        (
            ChannelScanQueue { sender: job_tx },
            Self {
                handles,
                outcomes: outcome_rx,
            },
        )
    }

    fn spawn_worker<P>(
        worker_id: usize,
        handler: Arc<P>,
        job_rx: Arc<Mutex<mpsc::UnboundedReceiver<ScanJob>>>,
        outcome_tx: mpsc::UnboundedSender<ScanOutcome>,
    ) -> JoinHandle<()>
    where
        P: ScanJobPort + 'static,
    {
        tokio::spawn(async move {
            tracing::debug!(worker_id, "scan worker started");
            loop {
                let job = {
                    let mut rx = job_rx.lock().await;
                    rx.recv().await
                };

                let Some(job) = job else {
                    tracing::debug!(worker_id, "scan worker stopped");
                    break;
                };

                let (job_id, sbom_id) = (job.job_id, job.sbom_id);
                tracing::debug!(worker_id, job_id = %job_id, sbom_id = %sbom_id, "job picked up");
                let outcome = handler.handle(job).await;
                if outcome_tx.send(outcome).is_err() {
                    tracing::debug!(
                        worker_id,
                        job_id = %job_id,
                        sbom_id = %sbom_id,
                        "pool handle dropped, discarding job outcome"
                    );
                }
            }
        })
    }

    /// Waits for the next finished job
    ///
    /// Returns `None` once every queue clone is dropped and all workers stopped.
    pub async fn next_outcome(&mut self) -> Option<ScanOutcome> {
        self.outcomes.recv().await
    }

    /// Waits for the workers to drain the queue and stop
    ///
    /// Every queue clone must be dropped first, or this never returns.
    ///
    /// # Returns
    /// Outcomes not yet taken with `next_outcome`
    pub async fn shutdown(mut self) -> Vec<ScanOutcome> {
        for result in join_all(self.handles.drain(..)).await {
            if let Err(e) = result {
                tracing::error!(error = %e, "scan worker panicked");
            }
        }

        let mut remaining = Vec::new();
        while let Ok(outcome) = self.outcomes.try_recv() {
            remaining.push(outcome);
        }
        remaining
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::dto::FallbackOutcome;
    use crate::correlation::domain::SbomId;
    use async_trait::async_trait;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct CountingHandler {
        handled: AtomicUsize,
    }

    #[async_trait]
    impl ScanJobPort for CountingHandler {
        async fn handle(&self, job: ScanJob) -> ScanOutcome {
            self.handled.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(5)).await;
            ScanOutcome::Failed {
                sbom_id: job.sbom_id,
                error: "stub".to_string(),
                fallback: FallbackOutcome::FailedRowWritten,
            }
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_every_job_handled_exactly_once() {
        let handler = Arc::new(CountingHandler {
            handled: AtomicUsize::new(0),
        });
        let (queue, pool) = ScanWorkerPool::start(Arc::clone(&handler), 3);

        let ids: Vec<SbomId> = (0..10).map(|_| SbomId::generate()).collect();
        for id in &ids {
            queue.enqueue(ScanJob::new(*id, false)).unwrap();
        }
        drop(queue);

        let outcomes = pool.shutdown().await;
        assert_eq!(outcomes.len(), 10);
        assert_eq!(handler.handled.load(Ordering::SeqCst), 10);

        let seen: HashSet<SbomId> = outcomes.iter().map(|o| o.sbom_id()).collect();
        assert_eq!(seen, ids.into_iter().collect());
    }

    #[tokio::test]
    async fn test_same_sbom_can_be_queued_twice() {
        let handler = Arc::new(CountingHandler {
            handled: AtomicUsize::new(0),
        });
        let (queue, mut pool) = ScanWorkerPool::start(handler, 2);
        let sbom_id = SbomId::generate();

        queue.enqueue(ScanJob::new(sbom_id, false)).unwrap();
        queue.enqueue(ScanJob::new(sbom_id, true)).unwrap();

        assert_eq!(pool.next_outcome().await.unwrap().sbom_id(), sbom_id);
        assert_eq!(pool.next_outcome().await.unwrap().sbom_id(), sbom_id);
        drop(queue);
        assert!(pool.shutdown().await.is_empty());
    }

    #[tokio::test]
    async fn test_workers_keep_running_after_pool_handle_dropped() {
        let handler = Arc::new(CountingHandler {
            handled: AtomicUsize::new(0),
        });
        let (queue, pool) = ScanWorkerPool::start(Arc::clone(&handler), 2);
        drop(pool);

        for _ in 0..4 {
            queue.enqueue(ScanJob::new(SbomId::generate(), false)).unwrap();
        }

        tokio::time::timeout(Duration::from_secs(5), async {
            while handler.handled.load(Ordering::SeqCst) < 4 {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap();
        drop(queue);
    }
}
