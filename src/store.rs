//! Persisted state behind a narrow load/save/append/delete interface.
//!
//! The interpreter never opens a state file itself; it goes through a
//! [`StateStore`]. [`FileStore`] is what the binary uses, [`MemoryStore`] is
//! the in-memory fake for tests.

use crate::env::Environment;
use anyhow::{Context, Result};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::io::{ErrorKind, Write};
use std::rc::Rc;
use tracing::debug;

/// A named piece of state the runtime reads or writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    /// `key=value` subscription record.
    Subscription,
    /// One rating per line, append-only.
    Ratings,
    /// JSON ghost command table, read-only to the runtime.
    GhostCommands,
    /// Script written by the subscription manager scaffold.
    SubscriptionManager,
}

impl Resource {
    pub fn default_file_name(self) -> &'static str {
        match self {
            Resource::Subscription => "subs.msx",
            Resource::Ratings => "ratings.msx",
            Resource::GhostCommands => "ghost.command-fig.json",
            Resource::SubscriptionManager => "subscription_manager.msx",
        }
    }

    /// Variable that overrides the file location.
    pub fn env_var(self) -> &'static str {
        match self {
            Resource::Subscription => "MSX_SUBS_FILE",
            Resource::Ratings => "MSX_RATINGS_FILE",
            Resource::GhostCommands => "MSX_GHOST_FILE",
            Resource::SubscriptionManager => "MSX_MANAGER_FILE",
        }
    }
}

/// Whole-record access to persisted state.
///
/// A missing record is `Ok(None)` from [`load`](StateStore::load), never an
/// error. Deleting a missing record succeeds.
pub trait StateStore {
    fn load(&self, resource: Resource) -> Result<Option<String>>;

    /// Replace the record with `text`.
    fn save(&mut self, resource: Resource, text: &str) -> Result<()>;

    /// Append `text` to the record, creating it when absent.
    fn append(&mut self, resource: Resource, text: &str) -> Result<()>;

    fn delete(&mut self, resource: Resource) -> Result<()>;

    /// Human-readable location of a record, used in messages.
    fn describe(&self, resource: Resource) -> String {
        resource.default_file_name().to_string()
    }
}

/// Store backed by files resolved through an [`Environment`].
pub struct FileStore {
    env: Environment,
}

impl FileStore {
    pub fn new(env: Environment) -> Self {
        Self { env }
    }
}

impl StateStore for FileStore {
    fn load(&self, resource: Resource) -> Result<Option<String>> {
        let path = self.env.resource_path(resource);
        match fs::read_to_string(&path) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).with_context(|| format!("can't read {}", path.display())),
        }
    }

    fn save(&mut self, resource: Resource, text: &str) -> Result<()> {
        let path = self.env.resource_path(resource);
        debug!(path = %path.display(), "saving record");
        fs::write(&path, text).with_context(|| format!("can't write {}", path.display()))
    }

    fn append(&mut self, resource: Resource, text: &str) -> Result<()> {
        let path = self.env.resource_path(resource);
        debug!(path = %path.display(), "appending to record");
        let mut f = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("can't open {}", path.display()))?;
        f.write_all(text.as_bytes())
            .with_context(|| format!("can't append to {}", path.display()))
    }

    fn delete(&mut self, resource: Resource) -> Result<()> {
        let path = self.env.resource_path(resource);
        match fs::remove_file(&path) {
            Ok(()) => {
                debug!(path = %path.display(), "deleted record");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| format!("can't delete {}", path.display())),
        }
    }

    fn describe(&self, resource: Resource) -> String {
        self.env.resource_path(resource).display().to_string()
    }
}

/// In-memory store. Clones share the same records, so a test can keep a
/// handle and inspect what the interpreter wrote.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    records: Rc<RefCell<HashMap<Resource, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Convenience: create a store and return (store, shared handle).
    pub fn with_handle() -> (Self, Self) {
        let store = Self::new();
        let handle = store.clone();
        (store, handle)
    }

    pub fn get(&self, resource: Resource) -> Option<String> {
        self.records.borrow().get(&resource).cloned()
    }

    pub fn insert(&self, resource: Resource, text: impl Into<String>) {
        self.records.borrow_mut().insert(resource, text.into());
    }

    pub fn contains(&self, resource: Resource) -> bool {
        self.records.borrow().contains_key(&resource)
    }
}

impl StateStore for MemoryStore {
    fn load(&self, resource: Resource) -> Result<Option<String>> {
        Ok(self.get(resource))
    }

    fn save(&mut self, resource: Resource, text: &str) -> Result<()> {
        self.insert(resource, text);
        Ok(())
    }

    fn append(&mut self, resource: Resource, text: &str) -> Result<()> {
        self.records
            .borrow_mut()
            .entry(resource)
            .or_default()
            .push_str(text);
        Ok(())
    }

    fn delete(&mut self, resource: Resource) -> Result<()> {
        self.records.borrow_mut().remove(&resource);
        Ok(())
    }
}
