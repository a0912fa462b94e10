use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

use crate::error::{Error, Result};
use crate::store::{Metadata, SnapshotStore};

/// A structural operation recorded by [`MemoryStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreOp {
    Create(String),
    Evict(String),
    Clone { source: String, target: String },
    Destroy(String),
}

#[derive(Debug, Clone, Default)]
struct Container {
    meta: Metadata,
    data: BTreeMap<String, String>,
    sessions: usize,
}

#[derive(Debug, Default)]
struct Inner {
    containers: HashMap<String, Container>,
    journal: Vec<StoreOp>,
}

/// In-process [`SnapshotStore`].
///
/// Containers hold a metadata map and a data map. External sessions are
/// simulated with [`attach`](Self::attach); while any are attached,
/// cloning from or into the container and destroying it fail with
/// [`Error::Busy`]. Structural calls are appended to a journal so callers
/// can check evict-before-mutate ordering.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Inner>> {
        self.inner.lock().map_err(|e| Error::store_msg(e.to_string()))
    }

    /// Simulate an external session connecting to `name`.
    pub fn attach(&self, name: &str) -> Result<()> {
        let mut inner = self.lock()?;
        let container = inner
            .containers
            .get_mut(name)
            .ok_or_else(|| Error::not_found(format!("container '{}'", name)))?;
        container.sessions += 1;
        Ok(())
    }

    /// Number of sessions currently attached to `name`.
    pub fn sessions(&self, name: &str) -> Result<usize> {
        let inner = self.lock()?;
        Ok(inner.containers.get(name).map(|c| c.sessions).unwrap_or(0))
    }

    /// Write a data entry into a container.
    pub fn write(&self, name: &str, key: &str, value: &str) -> Result<()> {
        let mut inner = self.lock()?;
        let container = inner
            .containers
            .get_mut(name)
            .ok_or_else(|| Error::not_found(format!("container '{}'", name)))?;
        container.data.insert(key.to_string(), value.to_string());
        Ok(())
    }

    /// Read a data entry from a container.
    pub fn read(&self, name: &str, key: &str) -> Result<Option<String>> {
        let inner = self.lock()?;
        let container = inner
            .containers
            .get(name)
            .ok_or_else(|| Error::not_found(format!("container '{}'", name)))?;
        Ok(container.data.get(key).cloned())
    }

    /// All structural operations performed so far, oldest first.
    pub fn journal(&self) -> Result<Vec<StoreOp>> {
        Ok(self.lock()?.journal.clone())
    }

    /// Forget the journal.
    pub fn clear_journal(&self) -> Result<()> {
        self.lock()?.journal.clear();
        Ok(())
    }
}

impl SnapshotStore for MemoryStore {
    fn exists(&self, name: &str) -> Result<bool> {
        Ok(self.lock()?.containers.contains_key(name))
    }

    fn containers(&self) -> Result<Vec<String>> {
        let inner = self.lock()?;
        let mut names: Vec<String> = inner.containers.keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    fn create(&self, name: &str) -> Result<()> {
        let mut inner = self.lock()?;
        if inner.containers.contains_key(name) {
            return Err(Error::already_exists(name));
        }
        inner.containers.insert(name.to_string(), Container::default());
        inner.journal.push(StoreOp::Create(name.to_string()));
        Ok(())
    }

    fn evict(&self, name: &str) -> Result<usize> {
        let mut inner = self.lock()?;
        let evicted = match inner.containers.get_mut(name) {
            Some(container) => std::mem::take(&mut container.sessions),
            None => 0,
        };
        inner.journal.push(StoreOp::Evict(name.to_string()));
        Ok(evicted)
    }

    fn clone_container(&self, source: &str, target: &str) -> Result<()> {
        let mut inner = self.lock()?;
        let src = inner
            .containers
            .get(source)
            .ok_or_else(|| Error::not_found(format!("container '{}'", source)))?;
        if src.sessions > 0 {
            return Err(Error::busy(source));
        }
        if inner.containers.contains_key(target) {
            return Err(Error::already_exists(target));
        }
        let copy = Container {
            sessions: 0,
            ..src.clone()
        };
        inner.containers.insert(target.to_string(), copy);
        inner.journal.push(StoreOp::Clone {
            source: source.to_string(),
            target: target.to_string(),
        });
        Ok(())
    }

    fn destroy(&self, name: &str) -> Result<()> {
        let mut inner = self.lock()?;
        match inner.containers.get(name) {
            None => return Err(Error::not_found(format!("container '{}'", name))),
            Some(c) if c.sessions > 0 => return Err(Error::busy(name)),
            Some(_) => {}
        }
        inner.containers.remove(name);
        inner.journal.push(StoreOp::Destroy(name.to_string()));
        Ok(())
    }

    fn metadata(&self, name: &str) -> Result<Metadata> {
        let inner = self.lock()?;
        let container = inner
            .containers
            .get(name)
            .ok_or_else(|| Error::not_found(format!("container '{}'", name)))?;
        Ok(container.meta.clone())
    }

    fn set_meta(&self, name: &str, key: &str, value: &str) -> Result<()> {
        let mut inner = self.lock()?;
        let container = inner
            .containers
            .get_mut(name)
            .ok_or_else(|| Error::not_found(format!("container '{}'", name)))?;
        container.meta.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn unset_meta(&self, name: &str, key: &str) -> Result<()> {
        let mut inner = self.lock()?;
        let container = inner
            .containers
            .get_mut(name)
            .ok_or_else(|| Error::not_found(format!("container '{}'", name)))?;
        container.meta.remove(key);
        Ok(())
    }
}
