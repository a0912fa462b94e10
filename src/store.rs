use std::collections::BTreeMap;
use std::sync::Arc;

use crate::error::Result;

/// Per-container key/value metadata.
pub type Metadata = BTreeMap<String, String>;

/// The storage engine underneath a [`History`](crate::History).
///
/// A container is a named data holder (a database, in the PostgreSQL
/// backend). Destructive calls are split in two phases: callers first
/// [`evict`](Self::evict) every other session bound to a container, then
/// mutate it. [`clone_container`](Self::clone_container) and
/// [`destroy`](Self::destroy) fail while sessions remain attached.
///
/// Eviction kills third-party sessions without warning. That is the price of
/// cloning and dropping live databases.
pub trait SnapshotStore {
    /// Whether a container named `name` exists.
    fn exists(&self, name: &str) -> Result<bool>;

    /// Names of every container visible to the store.
    fn containers(&self) -> Result<Vec<String>>;

    /// Create an empty container able to hold metadata.
    ///
    /// # Errors
    /// Returns [`Error::AlreadyExists`](crate::Error::AlreadyExists) if the
    /// name is taken.
    fn create(&self, name: &str) -> Result<()>;

    /// Force-terminate every other session attached to `name`.
    ///
    /// Returns the number of sessions terminated.
    fn evict(&self, name: &str) -> Result<usize>;

    /// Copy-on-write clone of `source` into a new container `target`.
    /// Metadata is cloned along with the data.
    fn clone_container(&self, source: &str, target: &str) -> Result<()>;

    /// Permanently drop the container `name`.
    fn destroy(&self, name: &str) -> Result<()>;

    /// Every metadata entry of `name`. Empty when the container carries none.
    fn metadata(&self, name: &str) -> Result<Metadata>;

    /// Set (insert or overwrite) one metadata entry.
    fn set_meta(&self, name: &str, key: &str, value: &str) -> Result<()>;

    /// Remove one metadata entry. Removing a missing key is not an error.
    fn unset_meta(&self, name: &str, key: &str) -> Result<()>;

    /// Read one metadata entry.
    fn get_meta(&self, name: &str, key: &str) -> Result<Option<String>> {
        Ok(self.metadata(name)?.remove(key))
    }
}

impl<S: SnapshotStore + ?Sized> SnapshotStore for &S {
    fn exists(&self, name: &str) -> Result<bool> {
        (**self).exists(name)
    }
    fn containers(&self) -> Result<Vec<String>> {
        (**self).containers()
    }
    fn create(&self, name: &str) -> Result<()> {
        (**self).create(name)
    }
    fn evict(&self, name: &str) -> Result<usize> {
        (**self).evict(name)
    }
    fn clone_container(&self, source: &str, target: &str) -> Result<()> {
        (**self).clone_container(source, target)
    }
    fn destroy(&self, name: &str) -> Result<()> {
        (**self).destroy(name)
    }
    fn metadata(&self, name: &str) -> Result<Metadata> {
        (**self).metadata(name)
    }
    fn set_meta(&self, name: &str, key: &str, value: &str) -> Result<()> {
        (**self).set_meta(name, key, value)
    }
    fn unset_meta(&self, name: &str, key: &str) -> Result<()> {
        (**self).unset_meta(name, key)
    }
    fn get_meta(&self, name: &str, key: &str) -> Result<Option<String>> {
        (**self).get_meta(name, key)
    }
}

impl<S: SnapshotStore + ?Sized> SnapshotStore for Arc<S> {
    fn exists(&self, name: &str) -> Result<bool> {
        (**self).exists(name)
    }
    fn containers(&self) -> Result<Vec<String>> {
        (**self).containers()
    }
    fn create(&self, name: &str) -> Result<()> {
        (**self).create(name)
    }
    fn evict(&self, name: &str) -> Result<usize> {
        (**self).evict(name)
    }
    fn clone_container(&self, source: &str, target: &str) -> Result<()> {
        (**self).clone_container(source, target)
    }
    fn destroy(&self, name: &str) -> Result<()> {
        (**self).destroy(name)
    }
    fn metadata(&self, name: &str) -> Result<Metadata> {
        (**self).metadata(name)
    }
    fn set_meta(&self, name: &str, key: &str, value: &str) -> Result<()> {
        (**self).set_meta(name, key, value)
    }
    fn unset_meta(&self, name: &str, key: &str) -> Result<()> {
        (**self).unset_meta(name, key)
    }
    fn get_meta(&self, name: &str, key: &str) -> Result<Option<String>> {
        (**self).get_meta(name, key)
    }
}
