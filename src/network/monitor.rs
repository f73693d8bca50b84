//! Network state monitor.
//!
//! Tracks online/offline state from platform transition events. There is no
//! polling: state only changes when [`NetworkMonitor::apply`] is called.
//! Callbacks registered with [`NetworkMonitor::subscribe`] run on every
//! actual transition and stay registered until their [`Subscription`] is
//! dropped or unsubscribed.

use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use crate::error::SyncError;

/// Connectivity state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkStatus {
    /// The platform reports a connection
    Online,
    /// The platform reports no connection
    Offline,
}

impl NetworkStatus {
    /// Build from a boolean connectivity flag.
    #[must_use]
    pub const fn from_online(online: bool) -> Self {
        if online {
            Self::Online
        } else {
            Self::Offline
        }
    }

    /// Whether this is [`NetworkStatus::Online`].
    #[must_use]
    pub const fn is_online(self) -> bool {
        matches!(self, Self::Online)
    }

    /// Name of the platform event announcing this state.
    #[must_use]
    pub const fn event_name(self) -> &'static str {
        match self {
            Self::Online => "online",
            Self::Offline => "offline",
        }
    }
}

impl fmt::Display for NetworkStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.event_name())
    }
}

impl FromStr for NetworkStatus {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "online" => Ok(Self::Online),
            "offline" => Ok(Self::Offline),
            other => Err(SyncError::Parse(format!("Unknown network event: {other}"))),
        }
    }
}

type Callback = Arc<dyn Fn(NetworkStatus) + Send + Sync>;

#[derive(Default)]
struct Listeners {
    next_id: u64,
    entries: Vec<(u64, Callback)>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Observer of platform connectivity events.
#[derive(Clone)]
pub struct NetworkMonitor {
    status: Arc<Mutex<NetworkStatus>>,
    listeners: Arc<Mutex<Listeners>>,
}

impl fmt::Debug for NetworkMonitor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NetworkMonitor")
            .field("status", &self.status())
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

impl NetworkMonitor {
    /// Create a monitor seeded with the platform's current connectivity.
    #[must_use]
    pub fn new(initial: NetworkStatus) -> Self {
        Self {
            status: Arc::new(Mutex::new(initial)),
            listeners: Arc::new(Mutex::new(Listeners::default())),
        }
    }

    /// Current connectivity.
    #[must_use]
    pub fn status(&self) -> NetworkStatus {
        *lock(&self.status)
    }

    /// Whether the monitor currently reports online.
    #[must_use]
    pub fn is_online(&self) -> bool {
        self.status().is_online()
    }

    /// Record a transition event.
    ///
    /// Subscribers are notified only when the state actually changes.
    /// Returns whether it changed.
    pub fn apply(&self, status: NetworkStatus) -> bool {
        {
            let mut current = lock(&self.status);
            if *current == status {
                return false;
            }
            *current = status;
        }

        match status {
            NetworkStatus::Online => tracing::info!("network: online"),
            NetworkStatus::Offline => tracing::warn!("network: offline"),
        }

        // Callbacks run without the lock held so they may subscribe or
        // unsubscribe.
        let callbacks: Vec<Callback> = lock(&self.listeners)
            .entries
            .iter()
            .map(|(_, cb)| Arc::clone(cb))
            .collect();
        for callback in callbacks {
            callback(status);
        }

        true
    }

    /// Record a transition from a platform event name (`online`/`offline`).
    ///
    /// # Errors
    ///
    /// Returns an error for any other event name.
    pub fn handle_event(&self, name: &str) -> Result<bool, SyncError> {
        Ok(self.apply(name.parse()?))
    }

    /// Register a callback for connectivity transitions.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(NetworkStatus) + Send + Sync + 'static,
    {
        let mut listeners = lock(&self.listeners);
        let id = listeners.next_id;
        listeners.next_id += 1;
        listeners.entries.push((id, Arc::new(callback)));

        Subscription {
            id,
            listeners: Arc::downgrade(&self.listeners),
        }
    }

    /// Number of live subscriptions.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        lock(&self.listeners).entries.len()
    }
}

impl Default for NetworkMonitor {
    fn default() -> Self {
        Self::new(NetworkStatus::Online)
    }
}

/// Handle to a registered callback. Dropping it unsubscribes.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    id: u64,
    listeners: Weak<Mutex<Listeners>>,
}

impl Subscription {
    /// Detach the callback now.
    pub fn unsubscribe(self) {
        drop(self);
    }

    fn detach(&self) {
        if let Some(listeners) = self.listeners.upgrade() {
            lock(&listeners).entries.retain(|(id, _)| *id != self.id);
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.detach();
    }
}
