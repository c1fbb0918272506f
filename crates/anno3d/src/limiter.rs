use std::{
    future::Future,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use crate::error::UploadError;

/// Optional bound on the number of concurrently running units of work.
///
/// Cloning shares the bound.
#[derive(Debug, Clone, Default)]
pub struct ConcurrencyLimit {
    semaphore: Option<Arc<Semaphore>>,
    parallelism: Option<usize>,
}

/// Held while a unit of work runs; dropping it releases the slot.
#[derive(Debug)]
pub struct ConcurrencyPermit {
    _permit: Option<OwnedSemaphorePermit>,
}

impl ConcurrencyLimit {
    /// Allow at most `parallelism` concurrent units, any number if `None`.
    ///
    /// A parallelism of zero is treated as one.
    pub fn new(parallelism: Option<usize>) -> Self {
        let parallelism = parallelism.map(|n| n.max(1));
        Self {
            semaphore: parallelism.map(|n| Arc::new(Semaphore::new(n))),
            parallelism,
        }
    }

    /// The configured bound, `None` if unbounded.
    pub fn parallelism(&self) -> Option<usize> {
        self.parallelism
    }

    /// Wait for a free slot.
    pub async fn acquire(&self) -> ConcurrencyPermit {
        let permit = match &self.semaphore {
            // never closed, acquiring only fails on a closed semaphore
            Some(semaphore) => semaphore.clone().acquire_owned().await.ok(),
            None => None,
        };
        ConcurrencyPermit { _permit: permit }
    }

    /// Run `unit` while holding a slot.
    pub async fn run<F: Future>(&self, unit: F) -> F::Output {
        let _permit = self.acquire().await;
        unit.await
    }
}

/// Set by the first failing unit of a joined group.
///
/// A failed join returns at once, but work already handed to the blocking pool
/// keeps running. Such work checks the flag between remote calls and stops early.
/// Cloning shares the flag.
#[derive(Debug, Clone, Default)]
pub struct AbortFlag(Arc<AtomicBool>);

impl AbortFlag {
    /// A flag that is not set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a unit has failed.
    pub fn is_aborted(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    /// Fail with [`UploadError::Aborted`] once the flag is set.
    pub fn check(&self) -> Result<(), UploadError> {
        if self.is_aborted() {
            return Err(UploadError::Aborted);
        }
        Ok(())
    }

    /// Pass `result` through, setting the flag if it is an error.
    pub fn record<T, E>(&self, result: Result<T, E>) -> Result<T, E> {
        if result.is_err() {
            self.0.store(true, Ordering::Release);
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use std::{sync::atomic::AtomicUsize, time::Duration};

    use futures::future::try_join_all;

    use super::*;

    async fn max_in_flight(limit: ConcurrencyLimit, units: usize) -> usize {
        let running = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let handles = (0..units)
            .map(|_| {
                let limit = limit.clone();
                let running = running.clone();
                let peak = peak.clone();
                tokio::spawn(async move {
                    limit
                        .run(async {
                            let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                            peak.fetch_max(now, Ordering::SeqCst);
                            tokio::time::sleep(Duration::from_millis(10)).await;
                            running.fetch_sub(1, Ordering::SeqCst);
                        })
                        .await
                })
            })
            .collect::<Vec<_>>();

        for handle in handles {
            handle.await.unwrap();
        }
        peak.load(Ordering::SeqCst)
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_bounded() {
        assert!(max_in_flight(ConcurrencyLimit::new(Some(2)), 12).await <= 2);
        assert_eq!(max_in_flight(ConcurrencyLimit::new(Some(0)), 4).await, 1);
        assert_eq!(ConcurrencyLimit::new(Some(0)).parallelism(), Some(1));
    }

    #[tokio::test]
    async fn test_unbounded() {
        assert_eq!(max_in_flight(ConcurrencyLimit::new(None), 8).await, 8);
    }

    #[test]
    fn test_abort_flag() {
        let flag = AbortFlag::new();
        assert!(flag.check().is_ok());

        assert_eq!(flag.record(Ok::<_, UploadError>(1)).ok(), Some(1));
        assert!(!flag.is_aborted());

        let shared = flag.clone();
        assert!(shared.record(Err::<(), _>(UploadError::Aborted)).is_err());
        assert!(flag.is_aborted());
        assert!(matches!(flag.check(), Err(UploadError::Aborted)));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_running_units_stop_after_a_failure() {
        let flag = AbortFlag::new();
        let done = Arc::new(AtomicUsize::new(0));

        let handles = (0..4)
            .map(|index| {
                let flag = flag.clone();
                let done = done.clone();
                tokio::task::spawn_blocking(move || {
                    flag.record((|| {
                        if index == 0 {
                            return Err(UploadError::InvalidInput("first".to_string()));
                        }
                        // still running when the first unit fails
                        while !flag.is_aborted() {
                            std::thread::sleep(Duration::from_millis(1));
                        }
                        flag.check()?;
                        done.fetch_add(1, Ordering::SeqCst);
                        Ok(())
                    })())
                })
            })
            .collect::<Vec<_>>();

        let results = try_join_all(handles).await.unwrap();
        assert!(matches!(results[0], Err(UploadError::InvalidInput(_))));
        assert!(results[1..]
            .iter()
            .all(|result| matches!(result, Err(UploadError::Aborted))));
        assert_eq!(done.load(Ordering::SeqCst), 0);
    }
}
