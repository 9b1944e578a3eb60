//! Request accounting for a collection cycle.

use super::RequestKind;
use core::sync::atomic::{AtomicU64, Ordering};
use strum::IntoEnumIterator;

/// Counters for one kind of request.
#[derive(Debug, Default)]
struct RequestCounter {
    issued: AtomicU64,
    completed: AtomicU64,
    failed: AtomicU64,
}

/// A point-in-time copy of the counters for one kind of request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RequestCounts {
    pub issued: u64,
    pub completed: u64,
    pub failed: u64,
}

/// Tracks the requests issued during one cycle.
///
/// Every issued request eventually counts as either completed or failed.
#[derive(Debug, Default)]
pub struct CycleStats {
    counters: [RequestCounter; 2],
}

impl CycleStats {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    const fn counter(&self, kind: RequestKind) -> &RequestCounter {
        match kind {
            RequestKind::Api => &self.counters[0],
            RequestKind::Command => &self.counters[1],
        }
    }

    /// Mark that new requests have been issued.
    pub fn add_requests(&self, kind: RequestKind, count: u64) {
        let _ = self.counter(kind).issued.fetch_add(count, Ordering::Relaxed);
    }

    /// Mark that a request finished successfully.
    pub fn complete_request(&self, kind: RequestKind) {
        let _ = self.counter(kind).completed.fetch_add(1, Ordering::Relaxed);
    }

    /// Mark that a request failed.
    pub fn fail_request(&self, kind: RequestKind) {
        let _ = self.counter(kind).failed.fetch_add(1, Ordering::Relaxed);
    }

    #[must_use]
    pub fn counts(&self, kind: RequestKind) -> RequestCounts {
        let counter = self.counter(kind);
        RequestCounts {
            issued: counter.issued.load(Ordering::Relaxed),
            completed: counter.completed.load(Ordering::Relaxed),
            failed: counter.failed.load(Ordering::Relaxed),
        }
    }

    /// Total counts across every kind of request.
    #[must_use]
    pub fn totals(&self) -> RequestCounts {
        RequestKind::iter().map(|kind| self.counts(kind)).fold(RequestCounts::default(), |acc, c| RequestCounts {
            issued: acc.issued + c.issued,
            completed: acc.completed + c.completed,
            failed: acc.failed + c.failed,
        })
    }

    /// A one-line summary such as `3/3 api, 1/2 command (1 failed)`.
    #[must_use]
    pub fn summary(&self) -> String {
        let parts: Vec<_> = RequestKind::iter()
            .filter_map(|kind| {
                let c = self.counts(kind);
                if c.issued == 0 {
                    return None;
                }

                let mut text = format!("{}/{} {kind}", c.completed, c.issued);
                if c.failed > 0 {
                    text.push_str(&format!(" ({} failed)", c.failed));
                }
                Some(text)
            })
            .collect();

        if parts.is_empty() {
            "No requests".to_string()
        } else {
            parts.join(", ")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_requests() {
        let stats = CycleStats::new();
        assert_eq!(stats.summary(), "No requests");
        assert_eq!(stats.totals(), RequestCounts::default());
    }

    #[test]
    fn test_counts_per_kind() {
        let stats = CycleStats::new();
        stats.add_requests(RequestKind::Api, 3);
        stats.add_requests(RequestKind::Command, 2);
        stats.complete_request(RequestKind::Api);
        stats.complete_request(RequestKind::Api);
        stats.fail_request(RequestKind::Api);
        stats.complete_request(RequestKind::Command);

        assert_eq!(
            stats.counts(RequestKind::Api),
            RequestCounts {
                issued: 3,
                completed: 2,
                failed: 1
            }
        );
        assert_eq!(stats.totals().issued, 5);
        assert_eq!(stats.summary(), "2/3 api (1 failed), 1/2 command");
    }

    #[test]
    fn test_summary_skips_idle_kinds() {
        let stats = CycleStats::new();
        stats.add_requests(RequestKind::Command, 1);
        stats.complete_request(RequestKind::Command);
        assert_eq!(stats.summary(), "1/1 command");
    }
}
