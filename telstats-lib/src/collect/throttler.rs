use core::time::Duration;
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Bounds the number of in-flight requests and supports temporary pausing.
///
/// Call [`Throttler::acquire`] before each request. At most `max_concurrent`
/// requests run at once. When the device signals backpressure, any request can
/// call [`Throttler::pause_for`] to hold back new dispatches until the pause ends.
/// Overlapping pauses keep the latest deadline.
#[derive(Debug)]
pub struct Throttler {
    semaphore: Arc<Semaphore>,
    resume_at: Mutex<Option<Instant>>,
}

impl Throttler {
    /// Minimum extension required for a new pause to override an active one.
    const MIN_PAUSE_EXTENSION: Duration = Duration::from_secs(1);

    /// Create a new throttler that allows at most `max_concurrent` requests at a time.
    pub fn new(max_concurrent: usize) -> Arc<Self> {
        Arc::new(Self {
            semaphore: Arc::new(Semaphore::new(max_concurrent)),
            resume_at: Mutex::new(None),
        })
    }

    /// Wait out any active pause, then acquire a concurrency slot.
    ///
    /// The returned permit must be held for the duration of the request.
    pub async fn acquire(&self) -> OwnedSemaphorePermit {
        while let Some(remaining) = self.remaining_pause() {
            tokio::time::sleep(remaining).await;
        }

        Arc::clone(&self.semaphore)
            .acquire_owned()
            .await
            .expect("semaphore is never closed")
    }

    /// Returns whether the throttler is currently paused.
    pub fn is_paused(&self) -> bool {
        self.remaining_pause().is_some()
    }

    /// Hold back new dispatches for `duration`.
    ///
    /// Requests already running are not interrupted. Returns `true` only when this
    /// call moved the resume deadline.
    pub fn pause_for(&self, duration: Duration) -> bool {
        let new_resume_at = Instant::now() + duration;
        let mut guard = self.resume_at.lock().expect("lock not poisoned");
        if guard.is_some_and(|existing| existing + Self::MIN_PAUSE_EXTENSION >= new_resume_at) {
            return false;
        }

        *guard = Some(new_resume_at);
        true
    }

    fn remaining_pause(&self) -> Option<Duration> {
        let mut guard = self.resume_at.lock().expect("lock not poisoned");
        let remaining = guard.and_then(|t| t.checked_duration_since(Instant::now())).filter(|d| !d.is_zero());
        if remaining.is_none() {
            *guard = None;
        }
        remaining
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    #[cfg_attr(miri, ignore = "Miri cannot call CreateIoCompletionPort on Windows")]
    async fn limits_concurrency() {
        let throttler = Throttler::new(2);
        let active = Arc::new(AtomicUsize::new(0));
        let max_seen = Arc::new(AtomicUsize::new(0));

        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let throttler = Arc::clone(&throttler);
                let active = Arc::clone(&active);
                let max_seen = Arc::clone(&max_seen);
                tokio::spawn(async move {
                    let _permit = throttler.acquire().await;
                    let current = active.fetch_add(1, Ordering::SeqCst) + 1;
                    _ = max_seen.fetch_max(current, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(10)).await;
                    _ = active.fetch_sub(1, Ordering::SeqCst);
                })
            })
            .collect();

        _ = futures_util::future::join_all(tasks).await;

        assert!(max_seen.load(Ordering::SeqCst) <= 2);
    }

    #[tokio::test]
    #[cfg_attr(miri, ignore = "Miri cannot call CreateIoCompletionPort on Windows")]
    async fn pause_blocks_new_requests() {
        let throttler = Throttler::new(4);
        assert!(throttler.pause_for(Duration::from_millis(200)));
        assert!(throttler.is_paused());

        let start = tokio::time::Instant::now();
        let _permit = throttler.acquire().await;

        assert!(start.elapsed() >= Duration::from_millis(150));
        assert!(!throttler.is_paused());
    }

    #[tokio::test]
    #[cfg_attr(miri, ignore = "Miri cannot call CreateIoCompletionPort on Windows")]
    async fn shorter_pause_is_ignored() {
        let throttler = Throttler::new(1);
        assert!(throttler.pause_for(Duration::from_secs(5)));
        assert!(!throttler.pause_for(Duration::from_millis(10)));
    }
}
