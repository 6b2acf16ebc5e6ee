use crate::dispatch::queue::{WorkItem, WorkQueue};
use crate::store::UrlStore;
use std::time::Duration;

/// Totals from one dispatch cycle
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CycleReport {
    /// Records the pending query returned
    pub pending: usize,

    /// Messages actually placed on the queue
    pub published: usize,

    /// Publish attempts that failed; the records stay pending
    pub failed: usize,
}

/// Periodically publishes the pending delta onto the work queue
///
/// Publishing does not change store state, so a URL stays in the delta and is
/// republished every cycle until the consumer acknowledges it via
/// [`UrlStore::mark_crawled`]. Duplicate messages are the consumer's problem;
/// lost ones are not.
pub struct DeltaDispatcher<S: UrlStore, Q: WorkQueue> {
    store: S,
    queue: Q,
}

impl<S: UrlStore, Q: WorkQueue> DeltaDispatcher<S, Q> {
    pub fn new(store: S, queue: Q) -> Self {
        Self { store, queue }
    }

    /// Gives the store back, for callers that interleave discovery and dispatch
    pub fn into_parts(self) -> (S, Q) {
        (self.store, self.queue)
    }

    /// Runs one query-and-publish pass
    ///
    /// A failed publish is logged and skipped; the rest of the delta still
    /// goes out and the failure shows up in the report.
    pub fn run_cycle(&mut self) -> crate::Result<CycleReport> {
        let pending = self.store.query_pending()?;
        let mut report = CycleReport {
            pending: pending.len(),
            ..CycleReport::default()
        };

        for record in &pending {
            let item = WorkItem {
                url: record.url.clone(),
                row_key: record.fingerprint.clone(),
            };
            match self.queue.publish(&item) {
                Ok(()) => report.published += 1,
                Err(e) => {
                    tracing::warn!("Failed to publish {}: {}", record.url, e);
                    report.failed += 1;
                }
            }
        }

        if report.pending > 0 {
            tracing::info!(
                "Dispatch cycle: {} pending, {} published, {} failed",
                report.pending,
                report.published,
                report.failed
            );
        } else {
            tracing::debug!("Dispatch cycle: nothing pending");
        }

        Ok(report)
    }

    /// Runs dispatch cycles forever at a fixed interval
    ///
    /// The first cycle runs immediately. A cycle that fails outright (store
    /// unavailable) is logged and retried at the next tick rather than
    /// terminating the loop.
    pub async fn run(&mut self, interval: Duration) -> crate::Result<()> {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            if let Err(e) = self.run_cycle() {
                tracing::error!("Dispatch cycle failed: {}", e);
            }
        }
    }
}
