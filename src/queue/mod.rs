//! Offline completion queue.
//!
//! Completion toggles made while the backend is unreachable are buffered
//! here, persisted after every change, and drained by the sync driver.

pub mod action;
pub mod persisted;
pub mod store;

pub use action::{CompletionAction, PlanType, QueuedAction};
pub use persisted::FORMAT_VERSION;
pub use store::{CompletionQueue, QueueOutcome, QueueStats, DEFAULT_STORAGE_KEY};
