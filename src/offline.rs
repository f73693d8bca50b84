//! Offline completions.
//!
//! Ties the queue, the network monitor and the sync driver together into the
//! surface the rest of the application uses: queue toggles while offline,
//! look up what is still pending, and drain the queue as soon as the
//! connection comes back.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::NaiveDate;

use crate::error::SyncError;
use crate::network::{NetworkMonitor, NetworkStatus, Subscription};
use crate::queue::{CompletionAction, CompletionQueue, PlanType, QueueOutcome, QueuedAction};
use crate::sync::{CompletionSink, DriverConfig, SyncDriver, SyncResult};

/// Shared view of whether a flush is running.
#[derive(Debug, Clone, Default)]
pub struct SyncIndicator(Arc<AtomicBool>);

impl SyncIndicator {
    /// Whether a flush is in progress.
    #[must_use]
    pub fn is_syncing(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    fn set(&self, value: bool) {
        self.0.store(value, Ordering::SeqCst);
    }
}

struct SyncingGuard<'a>(&'a SyncIndicator);

impl<'a> SyncingGuard<'a> {
    fn start(indicator: &'a SyncIndicator) -> Self {
        indicator.set(true);
        Self(indicator)
    }
}

impl Drop for SyncingGuard<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

/// Offline-capable completion tracking.
pub struct OfflineCompletions {
    queue: CompletionQueue,
    monitor: NetworkMonitor,
    sink: Box<dyn CompletionSink>,
    config: DriverConfig,
    syncing: SyncIndicator,
    sync_due: Arc<AtomicBool>,
    _reconnect: Subscription,
}

impl OfflineCompletions {
    /// Assemble from a loaded queue, a monitor seeded with the current
    /// connectivity, and the backend sink.
    #[must_use]
    pub fn new(
        queue: CompletionQueue,
        monitor: NetworkMonitor,
        sink: Box<dyn CompletionSink>,
        config: DriverConfig,
    ) -> Self {
        // Set by any online transition, whichever clone of the monitor
        // received it.
        let sync_due = Arc::new(AtomicBool::new(false));
        let due = Arc::clone(&sync_due);
        let reconnect = monitor.subscribe(move |status| {
            if status.is_online() {
                due.store(true, Ordering::SeqCst);
            }
        });

        Self {
            queue,
            monitor,
            sink,
            config,
            syncing: SyncIndicator::default(),
            sync_due,
            _reconnect: reconnect,
        }
    }

    /// Pending actions in insertion order.
    #[must_use]
    pub fn queue(&self) -> &[QueuedAction] {
        self.queue.actions()
    }

    /// The underlying queue.
    #[must_use]
    pub const fn completion_queue(&self) -> &CompletionQueue {
        &self.queue
    }

    /// Whether the monitor currently reports online.
    #[must_use]
    pub fn is_online(&self) -> bool {
        self.monitor.is_online()
    }

    /// Whether a flush is in progress.
    #[must_use]
    pub fn is_syncing(&self) -> bool {
        self.syncing.is_syncing()
    }

    /// A handle to the monitor for feeding platform events from elsewhere.
    ///
    /// Transitions applied through it are picked up by
    /// [`sync_if_due`](Self::sync_if_due) and
    /// [`handle_connectivity`](Self::handle_connectivity).
    #[must_use]
    pub fn network_monitor(&self) -> NetworkMonitor {
        self.monitor.clone()
    }

    /// Handle that reports `is_syncing` from elsewhere (sinks, subscribers).
    #[must_use]
    pub fn sync_indicator(&self) -> SyncIndicator {
        self.syncing.clone()
    }

    /// Queue a completion toggle. See [`CompletionQueue::queue_completion`].
    pub fn queue_completion(
        &mut self,
        source_id: &str,
        plan_type: PlanType,
        completed_date: NaiveDate,
        action: CompletionAction,
    ) -> QueueOutcome {
        self.queue
            .queue_completion(source_id, plan_type, completed_date, action)
    }

    /// Action of the most recently queued entry for `source_id`.
    #[must_use]
    pub fn pending_action(&self, source_id: &str) -> Option<CompletionAction> {
        self.queue.pending_action(source_id)
    }

    /// Drop every pending action.
    pub fn clear_queue(&mut self) {
        self.queue.clear();
    }

    /// Register a connectivity callback.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(NetworkStatus) + Send + Sync + 'static,
    {
        self.monitor.subscribe(callback)
    }

    /// Apply a connectivity transition.
    ///
    /// An online event with a non-empty queue triggers a flush, whose result
    /// is returned. This holds even when the monitor already reported online,
    /// for example because the transition arrived through a clone.
    pub fn handle_connectivity(&mut self, status: NetworkStatus) -> Option<SyncResult> {
        let changed = self.monitor.apply(status);
        let due = self.sync_due.swap(false, Ordering::SeqCst);
        if status.is_online() && self.monitor.is_online() && !self.queue.is_empty() {
            tracing::info!(
                pending = self.queue.len(),
                changed,
                due,
                "online, flushing completion queue"
            );
            return Some(self.sync_now());
        }
        None
    }

    /// Flush if the monitor came back online since the last flush and work
    /// is pending.
    pub fn sync_if_due(&mut self) -> Option<SyncResult> {
        let due = self.sync_due.swap(false, Ordering::SeqCst);
        if due && self.monitor.is_online() && !self.queue.is_empty() {
            tracing::info!(pending = self.queue.len(), "reconnected, flushing completion queue");
            return Some(self.sync_now());
        }
        None
    }

    /// Apply a platform event by name (`online`/`offline`).
    ///
    /// # Errors
    ///
    /// Returns an error for any other event name.
    pub fn handle_event(&mut self, name: &str) -> Result<Option<SyncResult>, SyncError> {
        let status: NetworkStatus = name.parse()?;
        Ok(self.handle_connectivity(status))
    }

    /// Flush the queue now. Does nothing while offline.
    pub fn sync_now(&mut self) -> SyncResult {
        if !self.monitor.is_online() {
            tracing::debug!("offline, sync deferred");
            return SyncResult::empty();
        }

        self.sync_due.store(false, Ordering::SeqCst);
        let _guard = SyncingGuard::start(&self.syncing);
        SyncDriver::with_config(self.sink.as_ref(), self.config).flush(&mut self.queue)
    }
}
