use std::collections::VecDeque;
use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::runtime::Handle;

pub type BatchJob =
    Box<dyn FnOnce() -> Result<(), Box<dyn std::error::Error + Send + Sync>> + Send>;

/// A deferred side effect.
pub struct BatchItem {
    pub label: String,
    job: BatchJob,
}

impl BatchItem {
    pub fn new<F>(label: impl Into<String>, job: F) -> Self
    where
        F: FnOnce() -> Result<(), Box<dyn std::error::Error + Send + Sync>> + Send + 'static,
    {
        Self {
            label: label.into(),
            job: Box::new(job),
        }
    }
}

impl fmt::Debug for BatchItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BatchItem").field("label", &self.label).finish()
    }
}

struct BatchInner {
    queue: Mutex<VecDeque<BatchItem>>,
    flushing: AtomicBool,
    batch_size: usize,
    processed: AtomicU64,
    failed: AtomicU64,
}

/// Queue of side effects flushed in bounded batches.
///
/// Reaching `batch_size` pending items flushes synchronously from `add`. A flush runs at
/// most `batch_size` items; leftovers are picked up by a flush spawned on the current
/// tokio runtime, or by the pipeline's periodic flush when there is none.
#[derive(Clone)]
pub struct BatchScheduler {
    inner: Arc<BatchInner>,
}

impl BatchScheduler {
    pub fn new(batch_size: usize) -> Self {
        Self {
            inner: Arc::new(BatchInner {
                queue: Mutex::new(VecDeque::new()),
                flushing: AtomicBool::new(false),
                batch_size: batch_size.max(1),
                processed: AtomicU64::new(0),
                failed: AtomicU64::new(0),
            }),
        }
    }

    fn queue(&self) -> MutexGuard<'_, VecDeque<BatchItem>> {
        self.inner.queue.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn add(&self, item: BatchItem) {
        let pending = {
            let mut queue = self.queue();
            queue.push_back(item);
            queue.len()
        };

        if pending >= self.inner.batch_size {
            self.flush();
        }
    }

    /// Run up to one batch of pending items. Returns how many items ran.
    ///
    /// A call made while another flush is in progress (including from inside an item) is a
    /// no-op. Failing or panicking items are logged and counted; the remaining items of the
    /// batch still run.
    pub fn flush(&self) -> usize {
        if self
            .inner
            .flushing
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return 0;
        }

        let batch: Vec<BatchItem> = {
            let mut queue = self.queue();
            let take = queue.len().min(self.inner.batch_size);
            queue.drain(..take).collect()
        };

        let ran = batch.len();
        for item in batch {
            self.run_item(item);
        }

        self.inner.flushing.store(false, Ordering::Release);

        if ran > 0 {
            tracing::debug!("Flushed batch of {} items", ran);
        }

        if self.pending() > 0 {
            self.schedule_flush();
        }

        ran
    }

    /// Flush synchronously until the queue is empty or another flush holds the guard.
    pub fn drain(&self) -> usize {
        let mut total = 0;

        while self.pending() > 0 {
            let ran = self.flush();
            if ran == 0 {
                break;
            }
            total += ran;
        }

        total
    }

    fn run_item(&self, item: BatchItem) {
        let BatchItem { label, job } = item;

        match catch_unwind(AssertUnwindSafe(job)) {
            Ok(Ok(())) => {
                self.inner.processed.fetch_add(1, Ordering::Relaxed);
            }
            Ok(Err(e)) => {
                self.inner.failed.fetch_add(1, Ordering::Relaxed);
                tracing::error!(error = %e, "Error processing batch item {}", label);
            }
            Err(_) => {
                self.inner.failed.fetch_add(1, Ordering::Relaxed);
                tracing::error!("Batch item {} panicked", label);
            }
        }
    }

    fn schedule_flush(&self) {
        match Handle::try_current() {
            Ok(runtime) => {
                let scheduler = self.clone();
                runtime.spawn(async move {
                    tokio::task::yield_now().await;
                    scheduler.flush();
                });
            }
            Err(_) => {
                tracing::trace!(
                    "No runtime available, {} items wait for the next periodic flush",
                    self.pending()
                );
            }
        }
    }

    pub fn pending(&self) -> usize {
        self.queue().len()
    }

    pub fn processed(&self) -> u64 {
        self.inner.processed.load(Ordering::Relaxed)
    }

    pub fn failed(&self) -> u64 {
        self.inner.failed.load(Ordering::Relaxed)
    }

    pub fn batch_size(&self) -> usize {
        self.inner.batch_size
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    use super::*;

    fn counting_item(counter: &Arc<AtomicUsize>) -> BatchItem {
        let counter = counter.clone();
        BatchItem::new("count", move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
    }

    #[test]
    fn add_below_batch_size_does_not_flush() {
        let scheduler = BatchScheduler::new(3);
        let counter = Arc::new(AtomicUsize::new(0));

        scheduler.add(counting_item(&counter));
        scheduler.add(counting_item(&counter));

        assert_eq!(counter.load(Ordering::SeqCst), 0);
        assert_eq!(scheduler.pending(), 2);
    }

    #[test]
    fn reaching_batch_size_flushes_synchronously() {
        let scheduler = BatchScheduler::new(3);
        let counter = Arc::new(AtomicUsize::new(0));

        for _ in 0..3 {
            scheduler.add(counting_item(&counter));
        }

        assert_eq!(counter.load(Ordering::SeqCst), 3);
        assert_eq!(scheduler.pending(), 0);
        assert_eq!(scheduler.processed(), 3);
    }

    #[test]
    fn failing_items_do_not_stop_the_batch() {
        let scheduler = BatchScheduler::new(10);
        let counter = Arc::new(AtomicUsize::new(0));

        scheduler.add(counting_item(&counter));
        scheduler.add(BatchItem::new("fails", || Err("disk full".into())));
        scheduler.add(BatchItem::new("panics", || panic!("bug in item")));
        scheduler.add(counting_item(&counter));

        assert_eq!(scheduler.flush(), 4);
        assert_eq!(counter.load(Ordering::SeqCst), 2);
        assert_eq!(scheduler.processed(), 2);
        assert_eq!(scheduler.failed(), 2);
    }

    #[test]
    fn flush_takes_at_most_one_batch_without_runtime() {
        let scheduler = BatchScheduler::new(2);
        let counter = Arc::new(AtomicUsize::new(0));

        {
            let mut queue = scheduler.queue();
            for _ in 0..5 {
                queue.push_back(counting_item(&counter));
            }
        }

        assert_eq!(scheduler.flush(), 2);
        assert_eq!(scheduler.pending(), 3);
        assert_eq!(scheduler.drain(), 3);
        assert_eq!(counter.load(Ordering::SeqCst), 5);
    }

    #[test]
    fn reentrant_flush_is_a_no_op() {
        let scheduler = BatchScheduler::new(10);
        let inner_result = Arc::new(AtomicUsize::new(usize::MAX));

        let nested = scheduler.clone();
        let result = inner_result.clone();
        scheduler.add(BatchItem::new("reenter", move || {
            result.store(nested.flush(), Ordering::SeqCst);
            Ok(())
        }));

        assert_eq!(scheduler.flush(), 1);
        assert_eq!(inner_result.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn empty_flush_is_a_no_op() {
        let scheduler = BatchScheduler::new(2);
        assert_eq!(scheduler.flush(), 0);
    }

    #[tokio::test]
    async fn leftovers_are_flushed_on_a_later_tick() {
        let scheduler = BatchScheduler::new(2);
        let counter = Arc::new(AtomicUsize::new(0));

        {
            let mut queue = scheduler.queue();
            for _ in 0..5 {
                queue.push_back(counting_item(&counter));
            }
        }

        assert_eq!(scheduler.flush(), 2);
        assert_eq!(counter.load(Ordering::SeqCst), 2);

        tokio::time::timeout(Duration::from_secs(1), async {
            while scheduler.pending() > 0 {
                tokio::task::yield_now().await;
            }
        })
        .await
        .unwrap();

        assert_eq!(counter.load(Ordering::SeqCst), 5);
    }
}
