//! Connectivity observation.

mod monitor;

pub use monitor::{NetworkMonitor, NetworkStatus, Subscription};
