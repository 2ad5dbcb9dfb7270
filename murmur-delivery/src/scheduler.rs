//! Deferred-job scheduling.
//!
//! Enqueue hands the delivery wait to a [`JobScheduler`] rather than an
//! inline sleep, so the hosting process can track every pending continuation
//! and a durable scheduler can replace the in-process one without touching
//! the queue. The in-process [`TokioScheduler`] does not survive a restart;
//! messages pending at shutdown are lost with it. A known limitation of this
//! design, bounded by the store's safety TTL.

use std::{future::Future, pin::Pin, time::Duration};

use tracing::debug;

/// A deferred unit of work.
pub type Job = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

/// Abstraction over deferred execution.
pub trait JobScheduler: Send + Sync + std::fmt::Debug {
    /// Run `job` after `delay`, without blocking the caller.
    fn schedule(&self, delay: Duration, job: Job);
}

/// In-process scheduler backed by `tokio::spawn`.
///
/// Every spawned job's handle is tracked so [`drain`](Self::drain) can wait
/// for in-flight work before process teardown.
#[derive(Debug, Default)]
pub struct TokioScheduler {
    handles: std::sync::Mutex<Vec<tokio::task::JoinHandle<()>>>,
}

impl TokioScheduler {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of scheduled jobs that have not finished yet.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.handles
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .iter()
            .filter(|handle| !handle.is_finished())
            .count()
    }

    /// Wait for every scheduled job to complete.
    pub async fn drain(&self) {
        loop {
            let handle = self
                .handles
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner)
                .pop();

            match handle {
                Some(handle) => {
                    // A panicked job was already reported by the panic hook
                    let _ = handle.await;
                }
                None => break,
            }
        }
    }
}

impl JobScheduler for TokioScheduler {
    fn schedule(&self, delay: Duration, job: Job) {
        debug!(delay_secs = delay.as_secs(), "Scheduling deferred job");

        let handle = tokio::spawn(async move {
            if delay > Duration::ZERO {
                tokio::time::sleep(delay).await;
            }
            job.await;
        });

        let mut handles = self
            .handles
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        // Drop completed handles so the list doesn't grow unbounded
        handles.retain(|existing| !existing.is_finished());
        handles.push(handle);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::{
        Arc,
        atomic::{AtomicU32, Ordering},
    };

    use super::*;

    #[tokio::test]
    async fn test_drain_waits_for_in_flight_jobs() {
        let scheduler = TokioScheduler::new();
        let completed = Arc::new(AtomicU32::new(0));

        for _ in 0..5 {
            let completed = completed.clone();
            scheduler.schedule(
                Duration::from_millis(10),
                Box::pin(async move {
                    completed.fetch_add(1, Ordering::SeqCst);
                }),
            );
        }

        scheduler.drain().await;
        assert_eq!(completed.load(Ordering::SeqCst), 5);
        assert_eq!(scheduler.pending(), 0);
    }

    #[tokio::test]
    async fn test_zero_delay_runs_immediately() {
        let scheduler = TokioScheduler::new();
        let completed = Arc::new(AtomicU32::new(0));

        let flag = completed.clone();
        scheduler.schedule(
            Duration::ZERO,
            Box::pin(async move {
                flag.fetch_add(1, Ordering::SeqCst);
            }),
        );

        scheduler.drain().await;
        assert_eq!(completed.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_scheduling_does_not_block_caller() {
        let scheduler = TokioScheduler::new();

        let before = std::time::Instant::now();
        scheduler.schedule(Duration::from_secs(5), Box::pin(async {}));
        assert!(before.elapsed() < Duration::from_secs(1));
        assert_eq!(scheduler.pending(), 1);

        // Don't drain: the pending job is abandoned with the runtime,
        // mirroring a process teardown losing in-flight waits.
    }
}
