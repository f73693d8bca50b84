//! Completion queue storage and merge rules.
//!
//! The queue holds at most one action per `(source_id, completed_date)`.
//! Re-queuing the same action is a no-op; queuing the opposite action
//! removes the pending one instead, since toggling twice nets out.
//!
//! Every mutation rewrites the whole queue to the backing store. A failed
//! write is logged and otherwise ignored: the in-memory queue stays
//! authoritative for the rest of the session.

use chrono::NaiveDate;

use super::action::{CompletionAction, PlanType, QueuedAction};
use super::persisted;
use crate::storage::{KeyValueStore, MemoryStore};

/// Key the queue blob is stored under.
pub const DEFAULT_STORAGE_KEY: &str = "metabolikal_completion_queue";

/// Suffix of the key an unreadable blob is copied to before being replaced.
pub const UNREADABLE_SUFFIX: &str = ".unreadable";

/// What `queue_completion` did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueueOutcome {
    /// A new action was appended
    Queued(QueuedAction),
    /// The same action was already pending; nothing changed
    AlreadyQueued,
    /// An opposite action was pending; it was removed
    Cancelled(QueuedAction),
}

impl QueueOutcome {
    /// Short label for display.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Queued(_) => "queued",
            Self::AlreadyQueued => "already_queued",
            Self::Cancelled(_) => "cancelled",
        }
    }
}

/// Queue statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueueStats {
    /// Number of pending actions
    pub pending: usize,
    /// Pending actions with at least one failed attempt
    pub retrying: usize,
    /// Pending actions per plan type, in `PlanType::ALL` order
    pub by_plan: [usize; 4],
    /// `queued_at` of the oldest pending action
    pub oldest_queued_at: Option<i64>,
}

/// Ordered queue of completion toggles awaiting sync.
pub struct CompletionQueue {
    store: Box<dyn KeyValueStore>,
    key: String,
    actions: Vec<QueuedAction>,
    persist_failed: bool,
}

impl std::fmt::Debug for CompletionQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompletionQueue")
            .field("key", &self.key)
            .field("actions", &self.actions)
            .field("persist_failed", &self.persist_failed)
            .finish_non_exhaustive()
    }
}

impl CompletionQueue {
    /// Load the queue stored under `key`.
    ///
    /// Whatever the store holds is available immediately. A missing blob
    /// gives an empty queue. An unreadable blob is copied aside under
    /// `<key>.unreadable` and the queue starts empty.
    pub fn load(store: impl KeyValueStore + 'static, key: impl Into<String>) -> Self {
        let key = key.into();
        let actions = hydrate(&store, &key);
        Self {
            store: Box::new(store),
            key,
            actions,
            persist_failed: false,
        }
    }

    /// Load from `store` under [`DEFAULT_STORAGE_KEY`].
    pub fn with_store(store: impl KeyValueStore + 'static) -> Self {
        Self::load(store, DEFAULT_STORAGE_KEY)
    }

    /// An empty queue backed by a fresh [`MemoryStore`].
    #[must_use]
    pub fn in_memory() -> Self {
        Self::with_store(MemoryStore::new())
    }

    /// Storage key of this queue.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Pending actions in insertion order.
    #[must_use]
    pub fn actions(&self) -> &[QueuedAction] {
        &self.actions
    }

    /// Number of pending actions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    /// Whether nothing is pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Look up a pending action by ID.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&QueuedAction> {
        self.actions.iter().find(|a| a.id == id)
    }

    /// Whether the most recent write to the store failed.
    #[must_use]
    pub const fn persist_failed(&self) -> bool {
        self.persist_failed
    }

    /// Queue a completion toggle, merging with any pending action for the
    /// same `(source_id, completed_date)`.
    pub fn queue_completion(
        &mut self,
        source_id: &str,
        plan_type: PlanType,
        completed_date: NaiveDate,
        action: CompletionAction,
    ) -> QueueOutcome {
        if let Some(index) = self
            .actions
            .iter()
            .position(|a| a.matches(source_id, completed_date))
        {
            let existing = &self.actions[index];
            if existing.plan_type != plan_type {
                tracing::warn!(
                    source_id,
                    %completed_date,
                    queued = %existing.plan_type,
                    requested = %plan_type,
                    "plan type differs from pending action for the same item and date"
                );
            }

            if existing.action == action {
                tracing::debug!(source_id, %completed_date, %action, "action already queued");
                return QueueOutcome::AlreadyQueued;
            }

            let removed = self.actions.remove(index);
            tracing::debug!(source_id, %completed_date, "opposite actions cancelled out");
            self.persist();
            return QueueOutcome::Cancelled(removed);
        }

        let queued = QueuedAction::new(source_id, plan_type, completed_date, action);
        tracing::debug!(id = %queued.id, source_id, %completed_date, %action, "action queued");
        self.actions.push(queued.clone());
        self.persist();
        QueueOutcome::Queued(queued)
    }

    /// Action of the most recently queued entry for `source_id`.
    #[must_use]
    pub fn pending_action(&self, source_id: &str) -> Option<CompletionAction> {
        self.actions
            .iter()
            .rev()
            .find(|a| a.source_id == source_id)
            .map(|a| a.action)
    }

    /// Pending action for an exact `(source_id, completed_date)` pair.
    #[must_use]
    pub fn pending_action_on(
        &self,
        source_id: &str,
        completed_date: NaiveDate,
    ) -> Option<CompletionAction> {
        self.actions
            .iter()
            .find(|a| a.matches(source_id, completed_date))
            .map(|a| a.action)
    }

    /// Drop every pending action and persist the empty queue.
    pub fn clear(&mut self) {
        self.actions.clear();
        self.persist();
    }

    /// Remove an action after the backend confirmed it.
    ///
    /// Returns `false` if no action has that ID.
    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.actions.len();
        self.actions.retain(|a| a.id != id);
        let removed = self.actions.len() != before;
        if removed {
            self.persist();
        }
        removed
    }

    /// Record a failed sync attempt. Returns the new attempt count.
    pub fn record_failure(&mut self, id: &str, error: &str) -> Option<u32> {
        let action = self.actions.iter_mut().find(|a| a.id == id)?;
        action.attempts += 1;
        action.last_error = Some(error.to_string());
        let attempts = action.attempts;
        self.persist();
        Some(attempts)
    }

    /// Reset attempt counters so exhausted actions are retried.
    ///
    /// Returns the number of actions that had failed attempts.
    pub fn reset_attempts(&mut self) -> usize {
        let mut reset = 0;
        for action in &mut self.actions {
            if action.attempts > 0 || action.last_error.is_some() {
                action.attempts = 0;
                action.last_error = None;
                reset += 1;
            }
        }
        if reset > 0 {
            self.persist();
        }
        reset
    }

    /// Get queue statistics.
    #[must_use]
    pub fn stats(&self) -> QueueStats {
        let mut stats = QueueStats {
            pending: self.actions.len(),
            ..QueueStats::default()
        };
        for action in &self.actions {
            if action.attempts > 0 {
                stats.retrying += 1;
            }
            if let Some(slot) = PlanType::ALL.iter().position(|p| *p == action.plan_type) {
                stats.by_plan[slot] += 1;
            }
        }
        stats.oldest_queued_at = self.actions.iter().map(|a| a.queued_at).min();
        stats
    }

    fn persist(&mut self) {
        let result =
            persisted::encode(&self.actions).and_then(|blob| self.store.set(&self.key, &blob));
        match result {
            Ok(()) => self.persist_failed = false,
            Err(e) => {
                tracing::warn!(key = %self.key, error = %e, "failed to persist completion queue");
                self.persist_failed = true;
            }
        }
    }
}

fn hydrate(store: &dyn KeyValueStore, key: &str) -> Vec<QueuedAction> {
    let blob = match store.get(key) {
        Ok(Some(blob)) => blob,
        Ok(None) => return Vec::new(),
        Err(e) => {
            tracing::warn!(key, error = %e, "failed to read completion queue, starting empty");
            return Vec::new();
        }
    };

    match persisted::decode(&blob) {
        Ok(decoded) => {
            if decoded.is_stale() {
                tracing::info!(
                    key,
                    version = decoded.version,
                    "loaded queue in older layout, it will be rewritten on the next change"
                );
            }
            collapse_duplicates(decoded.actions)
        }
        Err(e) => {
            let backup_key = format!("{key}{UNREADABLE_SUFFIX}");
            tracing::warn!(
                key,
                backup_key = %backup_key,
                error = %e,
                "unreadable completion queue, starting empty"
            );
            if let Err(e) = store.set(&backup_key, &blob) {
                tracing::warn!(
                    backup_key = %backup_key,
                    error = %e,
                    "failed to back up unreadable queue"
                );
            }
            Vec::new()
        }
    }
}

/// Apply the merge rules to a stored list, in order, so that at most one
/// action per `(source_id, completed_date)` survives.
fn collapse_duplicates(stored: Vec<QueuedAction>) -> Vec<QueuedAction> {
    let mut actions: Vec<QueuedAction> = Vec::with_capacity(stored.len());

    for action in stored {
        let Some(index) = actions
            .iter()
            .position(|a| a.matches(&action.source_id, action.completed_date))
        else {
            actions.push(action);
            continue;
        };

        if actions[index].action == action.action {
            tracing::warn!(
                source_id = %action.source_id,
                completed_date = %action.completed_date,
                dropped = %action.id,
                "stored queue held a duplicate action, keeping the first"
            );
        } else {
            let removed = actions.remove(index);
            tracing::warn!(
                source_id = %action.source_id,
                completed_date = %action.completed_date,
                first = %removed.id,
                second = %action.id,
                "stored queue held opposite actions, both cancelled"
            );
        }
    }

    actions
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SyncError;
    use crate::storage::MockKeyValueStore;
    use std::rc::Rc;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn stored_actions(store: &MemoryStore) -> Vec<QueuedAction> {
        let blob = store.get(DEFAULT_STORAGE_KEY).unwrap().unwrap();
        persisted::decode(&blob).unwrap().actions
    }

    #[test]
    fn test_complete_then_uncomplete_cancels() {
        let mut queue = CompletionQueue::in_memory();

        let outcome = queue.queue_completion(
            "item-1",
            PlanType::Diet,
            date("2026-01-27"),
            CompletionAction::Complete,
        );
        assert!(matches!(outcome, QueueOutcome::Queued(_)));
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.pending_action("item-1"), Some(CompletionAction::Complete));

        let outcome = queue.queue_completion(
            "item-1",
            PlanType::Diet,
            date("2026-01-27"),
            CompletionAction::Uncomplete,
        );
        assert!(matches!(outcome, QueueOutcome::Cancelled(_)));
        assert_eq!(queue.len(), 0);
        assert_eq!(queue.pending_action("item-1"), None);
    }

    #[test]
    fn test_cancel_out_restores_previous_length() {
        let mut queue = CompletionQueue::in_memory();
        queue.queue_completion(
            "a",
            PlanType::Workout,
            date("2026-01-01"),
            CompletionAction::Complete,
        );
        queue.queue_completion(
            "b",
            PlanType::Lifestyle,
            date("2026-01-01"),
            CompletionAction::Uncomplete,
        );
        let before = queue.len();

        queue.queue_completion(
            "c",
            PlanType::Supplement,
            date("2026-01-02"),
            CompletionAction::Uncomplete,
        );
        queue.queue_completion(
            "c",
            PlanType::Supplement,
            date("2026-01-02"),
            CompletionAction::Complete,
        );

        assert_eq!(queue.len(), before);
        let ids: Vec<_> = queue.actions().iter().map(|a| a.source_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[test]
    fn test_same_action_twice_is_single_entry() {
        let mut queue = CompletionQueue::in_memory();

        let first = queue.queue_completion(
            "item-1",
            PlanType::Diet,
            date("2026-01-27"),
            CompletionAction::Complete,
        );
        let second = queue.queue_completion(
            "item-1",
            PlanType::Diet,
            date("2026-01-27"),
            CompletionAction::Complete,
        );

        assert_eq!(queue.len(), 1);
        assert_eq!(second, QueueOutcome::AlreadyQueued);
        let QueueOutcome::Queued(original) = first else {
            panic!("first call should queue");
        };
        assert_eq!(queue.actions()[0].id, original.id);
    }

    #[test]
    fn test_different_dates_are_independent() {
        let mut queue = CompletionQueue::in_memory();
        queue.queue_completion(
            "item-1",
            PlanType::Diet,
            date("2026-01-27"),
            CompletionAction::Complete,
        );
        queue.queue_completion(
            "item-1",
            PlanType::Diet,
            date("2026-01-28"),
            CompletionAction::Uncomplete,
        );

        assert_eq!(queue.len(), 2);
        assert_eq!(queue.pending_action("item-1"), Some(CompletionAction::Uncomplete));
        assert_eq!(
            queue.pending_action_on("item-1", date("2026-01-27")),
            Some(CompletionAction::Complete)
        );
        assert_eq!(queue.pending_action_on("item-1", date("2026-01-29")), None);
    }

    #[test]
    fn test_pending_action_unknown_source() {
        let mut queue = CompletionQueue::in_memory();
        queue.queue_completion(
            "item-1",
            PlanType::Diet,
            date("2026-01-27"),
            CompletionAction::Complete,
        );
        assert_eq!(queue.pending_action("never-queued"), None);
    }

    #[test]
    fn test_plan_type_mismatch_still_merges() {
        let mut queue = CompletionQueue::in_memory();
        queue.queue_completion(
            "shared",
            PlanType::Diet,
            date("2026-01-27"),
            CompletionAction::Complete,
        );

        let outcome = queue.queue_completion(
            "shared",
            PlanType::Workout,
            date("2026-01-27"),
            CompletionAction::Uncomplete,
        );

        assert!(matches!(outcome, QueueOutcome::Cancelled(ref a) if a.plan_type == PlanType::Diet));
        assert!(queue.is_empty());
    }

    #[test]
    fn test_every_mutation_persists() {
        let store = Rc::new(MemoryStore::new());
        let mut queue = CompletionQueue::with_store(Rc::clone(&store));

        queue.queue_completion(
            "item-1",
            PlanType::Diet,
            date("2026-01-27"),
            CompletionAction::Complete,
        );
        assert_eq!(stored_actions(&store).len(), 1);

        queue.queue_completion(
            "item-2",
            PlanType::Workout,
            date("2026-01-27"),
            CompletionAction::Complete,
        );
        assert_eq!(stored_actions(&store).len(), 2);

        queue.queue_completion(
            "item-1",
            PlanType::Diet,
            date("2026-01-27"),
            CompletionAction::Uncomplete,
        );
        let stored = stored_actions(&store);
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].source_id, "item-2");
    }

    #[test]
    fn test_clear_persists_empty_queue() {
        let store = Rc::new(MemoryStore::new());
        let mut queue = CompletionQueue::with_store(Rc::clone(&store));
        queue.queue_completion(
            "item-1",
            PlanType::Diet,
            date("2026-01-27"),
            CompletionAction::Complete,
        );

        queue.clear();

        assert!(queue.is_empty());
        assert!(stored_actions(&store).is_empty());
        assert_eq!(
            store.get(DEFAULT_STORAGE_KEY).unwrap().as_deref(),
            Some(r#"{"version":1,"actions":[]}"#)
        );
    }

    #[test]
    fn test_clear_on_empty_queue_still_persists() {
        let store = Rc::new(MemoryStore::new());
        let mut queue = CompletionQueue::with_store(Rc::clone(&store));

        queue.clear();

        assert!(store.get(DEFAULT_STORAGE_KEY).unwrap().is_some());
    }

    #[test]
    fn test_hydrates_from_store_immediately() {
        let store = Rc::new(MemoryStore::new());
        {
            let mut queue = CompletionQueue::with_store(Rc::clone(&store));
            queue.queue_completion(
                "item-1",
                PlanType::Diet,
                date("2026-01-27"),
                CompletionAction::Complete,
            );
            queue.queue_completion(
                "sup-2",
                PlanType::Supplement,
                date("2026-01-27"),
                CompletionAction::Uncomplete,
            );
        }

        let queue = CompletionQueue::with_store(Rc::clone(&store));

        assert_eq!(queue.len(), 2);
        assert_eq!(queue.actions()[0].source_id, "item-1");
        assert_eq!(queue.pending_action("sup-2"), Some(CompletionAction::Uncomplete));
    }

    #[test]
    fn test_hydrates_legacy_array() {
        let legacy = r#"[{"id":"legacy-1","sourceId":"item-1","planType":"diet",
            "completedDate":"2026-01-27","action":"complete",
            "queuedAt":1769500000000,"attempts":2}]"#;
        let store = Rc::new(MemoryStore::with_entry(DEFAULT_STORAGE_KEY, legacy));

        let mut queue = CompletionQueue::with_store(Rc::clone(&store));
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.actions()[0].attempts, 2);

        queue.queue_completion(
            "item-2",
            PlanType::Diet,
            date("2026-01-27"),
            CompletionAction::Complete,
        );
        let blob = store.get(DEFAULT_STORAGE_KEY).unwrap().unwrap();
        assert!(blob.starts_with("{\"version\":1"));
    }

    #[test]
    fn test_unreadable_blob_is_backed_up() {
        let store = Rc::new(MemoryStore::with_entry(DEFAULT_STORAGE_KEY, "{corrupt"));

        let queue = CompletionQueue::with_store(Rc::clone(&store));

        assert!(queue.is_empty());
        let backup = format!("{DEFAULT_STORAGE_KEY}{UNREADABLE_SUFFIX}");
        assert_eq!(store.get(&backup).unwrap().as_deref(), Some("{corrupt"));
        assert_eq!(store.get(DEFAULT_STORAGE_KEY).unwrap().as_deref(), Some("{corrupt"));
    }

    #[test]
    fn test_write_failure_keeps_memory_state() {
        let mut store = MockKeyValueStore::new();
        store.expect_get().returning(|_| Ok(None));
        store
            .expect_set()
            .returning(|_, _| Err(SyncError::Storage("quota exceeded".to_string())));

        let mut queue = CompletionQueue::with_store(store);
        let outcome = queue.queue_completion(
            "item-1",
            PlanType::Diet,
            date("2026-01-27"),
            CompletionAction::Complete,
        );

        assert!(matches!(outcome, QueueOutcome::Queued(_)));
        assert_eq!(queue.len(), 1);
        assert!(queue.persist_failed());
        assert_eq!(queue.pending_action("item-1"), Some(CompletionAction::Complete));
    }

    #[test]
    fn test_read_failure_starts_empty() {
        let mut store = MockKeyValueStore::new();
        store
            .expect_get()
            .returning(|_| Err(SyncError::Storage("denied".to_string())));

        let queue = CompletionQueue::with_store(store);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_hydrate_collapses_duplicate_pairs() {
        let blob = r#"{"version":1,"actions":[
            {"id":"a-1","sourceId":"a","planType":"diet","completedDate":"2026-01-27",
             "action":"complete","queuedAt":1},
            {"id":"b-1","sourceId":"b","planType":"workout","completedDate":"2026-01-27",
             "action":"complete","queuedAt":2},
            {"id":"a-2","sourceId":"a","planType":"diet","completedDate":"2026-01-27",
             "action":"complete","queuedAt":3},
            {"id":"b-2","sourceId":"b","planType":"workout","completedDate":"2026-01-27",
             "action":"uncomplete","queuedAt":4},
            {"id":"c-1","sourceId":"c","planType":"lifestyle","completedDate":"2026-01-27",
             "action":"uncomplete","queuedAt":5}
        ]}"#;
        let store = Rc::new(MemoryStore::with_entry(DEFAULT_STORAGE_KEY, blob));

        let mut queue = CompletionQueue::with_store(Rc::clone(&store));

        let ids: Vec<&str> = queue.actions().iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["a-1", "c-1"]);
        assert_eq!(queue.pending_action("b"), None);

        let outcome = queue.queue_completion(
            "a",
            PlanType::Diet,
            date("2026-01-27"),
            CompletionAction::Uncomplete,
        );
        assert!(matches!(outcome, QueueOutcome::Cancelled(ref a) if a.id == "a-1"));
        assert_eq!(queue.pending_action("a"), None);
        assert_eq!(stored_actions(&store).len(), 1);
    }

    #[test]
    fn test_remove_and_record_failure() {
        let mut queue = CompletionQueue::in_memory();
        let QueueOutcome::Queued(a) = queue.queue_completion(
            "a",
            PlanType::Diet,
            date("2026-01-27"),
            CompletionAction::Complete,
        ) else {
            panic!("should queue");
        };

        assert_eq!(queue.record_failure(&a.id, "timeout"), Some(1));
        assert_eq!(queue.record_failure(&a.id, "timeout again"), Some(2));
        let stored = queue.get(&a.id).unwrap();
        assert_eq!(stored.attempts, 2);
        assert_eq!(stored.last_error.as_deref(), Some("timeout again"));

        assert_eq!(queue.record_failure("missing", "x"), None);
        assert!(queue.remove(&a.id));
        assert!(!queue.remove(&a.id));
        assert!(queue.is_empty());
    }

    #[test]
    fn test_reset_attempts() {
        let mut queue = CompletionQueue::in_memory();
        queue.queue_completion("a", PlanType::Diet, date("2026-01-27"), CompletionAction::Complete);
        queue.queue_completion("b", PlanType::Diet, date("2026-01-27"), CompletionAction::Complete);
        let id = queue.actions()[0].id.clone();
        queue.record_failure(&id, "boom");

        assert_eq!(queue.reset_attempts(), 1);
        assert_eq!(queue.actions()[0].attempts, 0);
        assert!(queue.actions()[0].last_error.is_none());
        assert_eq!(queue.reset_attempts(), 0);
    }

    #[test]
    fn test_stats() {
        let mut queue = CompletionQueue::in_memory();
        queue.queue_completion("a", PlanType::Diet, date("2026-01-27"), CompletionAction::Complete);
        queue.queue_completion(
            "b",
            PlanType::Workout,
            date("2026-01-27"),
            CompletionAction::Complete,
        );
        queue.queue_completion(
            "c",
            PlanType::Workout,
            date("2026-01-27"),
            CompletionAction::Uncomplete,
        );
        let id = queue.actions()[1].id.clone();
        queue.record_failure(&id, "boom");

        let stats = queue.stats();
        assert_eq!(stats.pending, 3);
        assert_eq!(stats.retrying, 1);
        assert_eq!(stats.by_plan, [1, 0, 2, 0]);
        let oldest = queue.actions().iter().map(|a| a.queued_at).min();
        assert_eq!(stats.oldest_queued_at, oldest);
    }
}
