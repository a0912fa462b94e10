use log::info;

use crate::error::{Error, Result};
use crate::history::History;
use crate::store::SnapshotStore;
use crate::types::{LogOptions, Revision, TaggedRevision, META_TAG};

/// A transient, borrowed view over the tags of a [`History`].
///
/// Tags live in the metadata of the container they name, so every lookup
/// scans the history. A tag value is carried by at most one container at a
/// time, and a container carries at most one tag.
pub struct TagDict<'a, S> {
    history: &'a History<S>,
}

impl<'a, S: SnapshotStore> TagDict<'a, S> {
    pub(crate) fn new(history: &'a History<S>) -> Self {
        Self { history }
    }

    /// All tagged revisions, newest first.
    pub fn list(&self) -> Result<Vec<TaggedRevision>> {
        Ok(self
            .history
            .log(LogOptions::default())?
            .into_iter()
            .filter_map(|rev| {
                rev.tag.map(|tag| TaggedRevision {
                    tag,
                    container: rev.container,
                })
            })
            .collect())
    }

    /// The revision currently carrying `tag`, if any.
    pub fn find(&self, tag: &str) -> Result<Option<Revision>> {
        Ok(self
            .history
            .log(LogOptions::default())?
            .into_iter()
            .find(|rev| rev.tag.as_deref() == Some(tag)))
    }

    /// Returns `true` if some revision carries `tag`.
    pub fn has(&self, tag: &str) -> Result<bool> {
        Ok(self.find(tag)?.is_some())
    }

    /// Attach `tag` to `revision`, or to the head when `revision` is `None`.
    ///
    /// A tag already carried by the target container is replaced.
    ///
    /// # Errors
    /// * [`Error::InvalidName`] if `tag` is empty.
    /// * [`Error::TagExists`] if any revision already carries `tag`.
    /// * [`Error::NotFound`] if there is no archive for `revision`.
    pub fn set(&self, tag: &str, revision: Option<u64>) -> Result<()> {
        if tag.trim().is_empty() {
            return Err(Error::invalid_name("tag must not be empty"));
        }
        self.history.locked(|| {
            if self.has(tag)? {
                return Err(Error::tag_exists(tag));
            }
            let container = self.history.container_for(revision)?;
            if !self.history.store().exists(&container)? {
                return Err(Error::not_found(format!(
                    "revision {} ({})",
                    revision.map(|id| id.to_string()).unwrap_or_default(),
                    container
                )));
            }
            self.history.store().set_meta(&container, META_TAG, tag)?;
            info!("tagged {} as {}", container, tag);
            Ok(())
        })
    }

    /// Remove `tag` from whichever container carries it.
    ///
    /// Returns `false` (and does nothing) when no revision carries `tag`.
    pub fn delete(&self, tag: &str) -> Result<bool> {
        self.history.locked(|| match self.find(tag)? {
            Some(rev) => {
                self.history.store().unset_meta(&rev.container, META_TAG)?;
                info!("removed tag {} from {}", tag, rev.container);
                Ok(true)
            }
            None => Ok(false),
        })
    }
}
