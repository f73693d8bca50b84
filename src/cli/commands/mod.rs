//! Command implementations for metabolikal-sync.
//!
//! Every command opens what it needs through [`Context`] and returns the
//! rendered output.

mod completions;
mod queue;
mod sync;

pub use completions::{completion_install_instructions, completions, generate_completions};
pub use queue::{clear, list, pending, plan_day, queue, status};
pub use sync::{ledger, sync};

use std::rc::Rc;

use crate::cli::args::OutputFormat;
use crate::config::{Config, Paths, StoreBackend};
use crate::error::SyncError;
use crate::queue::CompletionQueue;
use crate::storage::{Database, FileStore};
use crate::sync::CompletionLedger;

/// Resolved paths, configuration and output format for one invocation.
#[derive(Debug, Clone)]
pub struct Context {
    pub paths: Paths,
    pub config: Config,
    pub format: OutputFormat,
}

impl Context {
    /// Build a context, taking the output format from the config file when
    /// none was given on the command line.
    #[must_use]
    pub fn new(paths: Paths, config: Config, output: Option<OutputFormat>) -> Self {
        let format = output.unwrap_or(config.general.default_output);
        Self {
            paths,
            config,
            format,
        }
    }

    /// Open the database, creating and migrating it if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the data directory cannot be created or the
    /// database cannot be opened.
    pub fn database(&self) -> Result<Database, SyncError> {
        self.paths.ensure_dirs()?;
        Database::open_at(&self.paths.database)
    }

    /// Load the completion queue from the configured backend.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be opened. An unreadable
    /// queue blob is not an error; the queue starts empty.
    pub fn open_queue(&self) -> Result<CompletionQueue, SyncError> {
        self.paths.ensure_dirs()?;
        let key = self.config.queue.storage_key.clone();
        let queue = match self.config.queue.backend {
            StoreBackend::File => CompletionQueue::load(FileStore::new(&self.paths.store), key),
            StoreBackend::Sqlite => CompletionQueue::load(Rc::new(self.database()?), key),
        };
        tracing::debug!(pending = queue.len(), key = queue.key(), "loaded completion queue");
        Ok(queue)
    }

    /// Open the completion ledger.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened.
    pub fn open_ledger(&self) -> Result<CompletionLedger, SyncError> {
        Ok(CompletionLedger::new(Rc::new(self.database()?)))
    }
}
