use log::{debug, info, warn};

use crate::error::{Error, Result};
use crate::glog;
use crate::naming::validate_head_name;
use crate::store::SnapshotStore;
use crate::tags::TagDict;
use crate::types::{
    HistoryOptions, LogOptions, PurgeMode, RevertTarget, Revision, META_MESSAGE, META_PARENT,
    META_REVISION, META_TAG,
};

/// The revision history of one head container.
///
/// `History` is the caller-owned context for every operation: it names the
/// head, owns the [`SnapshotStore`] handle, and holds the naming strategy
/// for archives. Nothing is cached; every call reads the current metadata
/// from the store.
///
/// Mutating calls (`commit`, `revert`, `purge`, tag changes) assume they are
/// the only writer for this head. Set [`HistoryOptions::lock_dir`] to
/// serialize them through an advisory file lock.
#[derive(Debug)]
pub struct History<S> {
    store: S,
    head: String,
    options: HistoryOptions,
}

impl<S: SnapshotStore> History<S> {
    /// Bind a history to the head container `head`.
    ///
    /// Does not touch the store; the container may not exist yet.
    ///
    /// # Errors
    /// Returns [`Error::InvalidName`] if `head` is not a usable head name.
    pub fn open(store: S, head: impl Into<String>, options: HistoryOptions) -> Result<Self> {
        let head = head.into();
        validate_head_name(&head, options.naming.reserved_char())?;
        Ok(History {
            store,
            head,
            options,
        })
    }

    /// The underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Name of the head container.
    pub fn head(&self) -> &str {
        &self.head
    }

    /// The options this history was opened with.
    pub fn options(&self) -> &HistoryOptions {
        &self.options
    }

    /// Name of the archive container freezing revision `id`.
    pub fn archive_name(&self, id: u64) -> String {
        self.options.naming.archive_name(&self.head, id)
    }

    /// Return a [`TagDict`] over the tags of this history.
    pub fn tags(&self) -> TagDict<'_, S> {
        TagDict::new(self)
    }

    // -----------------------------------------------------------------------
    // Head container lifecycle
    // -----------------------------------------------------------------------

    /// Create an empty head container.
    pub fn create(&self) -> Result<()> {
        self.store.create(&self.head)?;
        info!("created {}", self.head);
        Ok(())
    }

    /// Evict all sessions and drop the head container.
    ///
    /// Archives are left alone; use [`purge`](Self::purge) first to remove
    /// them.
    pub fn destroy(&self) -> Result<()> {
        self.locked(|| {
            self.evict(&self.head)?;
            self.store.destroy(&self.head)?;
            info!("dropped {}", self.head);
            Ok(())
        })
    }

    // -----------------------------------------------------------------------
    // Reading the head
    // -----------------------------------------------------------------------

    /// Write the root revision `{id: 0, parent: 0}` on the head.
    ///
    /// # Errors
    /// Returns [`Error::AlreadyInitialized`] if the head already carries a
    /// revision.
    pub fn init(&self) -> Result<u64> {
        self.locked(|| {
            if self.store.get_meta(&self.head, META_REVISION)?.is_some() {
                return Err(Error::already_initialized(self.head.as_str()));
            }
            self.store.set_meta(&self.head, META_REVISION, "0")?;
            self.store.set_meta(&self.head, META_PARENT, "0")?;
            info!("initialized {} at revision 0", self.head);
            Ok(0)
        })
    }

    /// [`init`](Self::init) the head if it has no revision yet, otherwise
    /// leave it as is. Returns the head's current id.
    pub fn ensure_initialized(&self) -> Result<u64> {
        match self.init() {
            Err(Error::AlreadyInitialized(_)) => {
                debug!("{} already initialized", self.head);
                self.id()
            }
            other => other,
        }
    }

    /// Raw value of a head metadata key.
    pub fn get(&self, key: &str) -> Result<Option<String>> {
        self.store.get_meta(&self.head, key)
    }

    /// The head's revision record.
    ///
    /// # Errors
    /// Returns [`Error::NotInitialized`] if `init` never ran on the head.
    pub fn info(&self) -> Result<Revision> {
        self.read_revision(&self.head)?
            .ok_or_else(|| Error::not_initialized(self.head.as_str()))
    }

    /// The head's revision id.
    pub fn id(&self) -> Result<u64> {
        Ok(self.info()?.id)
    }

    /// The head's parent id.
    pub fn parent(&self) -> Result<u64> {
        Ok(self.info()?.parent)
    }

    // -----------------------------------------------------------------------
    // State transitions
    // -----------------------------------------------------------------------

    /// Freeze the head into a new archive and move the head one id forward.
    ///
    /// With the head at id `n`: `message` is recorded, the head is cloned
    /// into archive `n` (which keeps the message and any tag), then the head
    /// becomes `{id: n+1, parent: n}` without tag or message.
    ///
    /// Every other session on the head is terminated before cloning.
    ///
    /// # Errors
    /// * [`Error::NotInitialized`] if the head has no revision.
    /// * [`Error::AlreadyExists`] if the archive name is already taken.
    pub fn commit(&self, message: Option<&str>) -> Result<()> {
        self.locked(|| {
            let n = self.id()?;
            let archive = self.archive_name(n);
            if self.store.exists(&archive)? {
                return Err(Error::already_exists(archive));
            }

            match message {
                Some(msg) => self.store.set_meta(&self.head, META_MESSAGE, msg)?,
                None => self.store.unset_meta(&self.head, META_MESSAGE)?,
            }

            self.evict(&self.head)?;
            debug!("cloning {} into {}", self.head, archive);
            self.store.clone_container(&self.head, &archive)?;

            self.store.set_meta(&self.head, META_REVISION, &(n + 1).to_string())?;
            self.store.set_meta(&self.head, META_PARENT, &n.to_string())?;
            self.store.unset_meta(&self.head, META_TAG)?;
            self.store.unset_meta(&self.head, META_MESSAGE)?;

            info!("committed {} as {}, now at revision {}", self.head, archive, n + 1);
            Ok(())
        })
    }

    /// Replace the head's content with a clone of another revision.
    ///
    /// The head id is unchanged; its parent becomes the target id, and tag
    /// and message are cleared. Uncommitted changes in the head are lost and
    /// every session on the head is terminated.
    ///
    /// Returns the id reverted to.
    ///
    /// # Errors
    /// * [`Error::NotInitialized`] if the head has no revision.
    /// * [`Error::TagNotFound`] if reverting to a tag nobody carries.
    /// * [`Error::NoTemplate`] if the target archive does not exist, or is
    ///   the head itself. The head is left untouched.
    pub fn revert(&self, target: RevertTarget) -> Result<u64> {
        self.locked(|| {
            let current = self.info()?;
            let target_id = match target {
                RevertTarget::Parent => current.parent,
                RevertTarget::Revision(id) => id,
                RevertTarget::Tag(ref tag) => self
                    .tags()
                    .find(tag)?
                    .map(|rev| rev.id)
                    .ok_or_else(|| Error::tag_not_found(tag.as_str()))?,
            };
            if target_id == current.id {
                return Err(Error::no_template(format!(
                    "revision {} is the working head {}",
                    target_id, self.head
                )));
            }

            let source = self.archive_name(target_id);
            self.evict(&self.head)?;
            if !self.store.exists(&source)? {
                return Err(Error::no_template(source));
            }

            // Between these two calls the head does not exist. A crash here
            // needs manual recovery from `source`.
            self.store.destroy(&self.head)?;
            self.evict(&source)?;
            debug!("cloning {} into {}", source, self.head);
            self.store.clone_container(&source, &self.head)?;

            self.store.set_meta(&self.head, META_REVISION, &current.id.to_string())?;
            self.store.set_meta(&self.head, META_PARENT, &target_id.to_string())?;
            self.store.unset_meta(&self.head, META_TAG)?;
            self.store.unset_meta(&self.head, META_MESSAGE)?;

            info!(
                "reverted {} to {}, still at revision {}",
                self.head, source, current.id
            );
            Ok(target_id)
        })
    }

    /// Drop archives.
    ///
    /// Selects every archive ([`PurgeMode::All`]) or every untagged one
    /// ([`PurgeMode::KeepTags`]), newest first. Without `confirm` nothing is
    /// dropped and the selection is returned as a preview. The head is never
    /// selected.
    pub fn purge(&self, mode: PurgeMode, confirm: bool) -> Result<Vec<Revision>> {
        if !confirm {
            return self.purge_candidates(mode);
        }
        self.locked(|| {
            let candidates = self.purge_candidates(mode)?;
            for rev in &candidates {
                self.evict(&rev.container)?;
                self.store.destroy(&rev.container)?;
                debug!("dropped {}", rev.container);
            }
            info!("purged {} archive(s) of {} ({})", candidates.len(), self.head, mode);
            Ok(candidates)
        })
    }

    fn purge_candidates(&self, mode: PurgeMode) -> Result<Vec<Revision>> {
        Ok(self
            .log(LogOptions::default())?
            .into_iter()
            .filter(|rev| rev.container != self.head)
            .filter(|rev| mode == PurgeMode::All || !rev.is_tagged())
            .collect())
    }

    // -----------------------------------------------------------------------
    // History listing
    // -----------------------------------------------------------------------

    /// List the head and every archive.
    ///
    /// Opens one metadata read per candidate container. Entries are sorted
    /// by id, newest first unless `opts.newest_first` is `false`, and cut to
    /// `opts.limit` after sorting.
    ///
    /// # Errors
    /// Returns [`Error::NotInitialized`] if the head has no revision.
    pub fn log(&self, opts: LogOptions) -> Result<Vec<Revision>> {
        let mut revisions = vec![self.info()?];

        for name in self.store.containers()? {
            if name == self.head || !self.options.naming.may_be_archive(&self.head, &name) {
                continue;
            }
            if let Some(rev) = self.read_revision(&name)? {
                // only containers whose record matches their name belong here
                if self.archive_name(rev.id) == name {
                    revisions.push(rev);
                }
            }
        }

        if opts.newest_first {
            revisions.sort_by(|a, b| b.id.cmp(&a.id));
        } else {
            revisions.sort_by(|a, b| a.id.cmp(&b.id));
        }
        if let Some(limit) = opts.limit {
            revisions.truncate(limit);
        }
        Ok(revisions)
    }

    /// Render the most recent `limit` revisions (all when `None`) as an
    /// ASCII branch graph, newest line first.
    ///
    /// See [`glog::render`] for the layout.
    pub fn glog(&self, limit: Option<usize>) -> Result<Vec<String>> {
        let mut revisions = self.log(LogOptions {
            limit,
            newest_first: true,
        })?;
        revisions.reverse();
        Ok(glog::render(&revisions)
            .into_iter()
            .map(|line| line.to_string())
            .collect())
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    /// Container holding revision `id`: the head for its own id (or `None`),
    /// the archive otherwise.
    pub(crate) fn container_for(&self, id: Option<u64>) -> Result<String> {
        let head_id = self.id()?;
        Ok(match id {
            None => self.head.clone(),
            Some(id) if id == head_id => self.head.clone(),
            Some(id) => self.archive_name(id),
        })
    }

    pub(crate) fn read_revision(&self, container: &str) -> Result<Option<Revision>> {
        let mut meta = self.store.metadata(container)?;
        let Some(id) = meta.remove(META_REVISION) else {
            return Ok(None);
        };
        let parent = meta
            .remove(META_PARENT)
            .ok_or_else(|| Error::invalid_metadata(format!("{}: missing parent", container)))?;
        Ok(Some(Revision {
            container: container.to_string(),
            id: parse_id(container, META_REVISION, &id)?,
            parent: parse_id(container, META_PARENT, &parent)?,
            tag: meta.remove(META_TAG),
            message: meta.remove(META_MESSAGE),
        }))
    }

    fn evict(&self, container: &str) -> Result<()> {
        let evicted = self.store.evict(container)?;
        if evicted > 0 {
            warn!("terminated {} session(s) on {}", evicted, container);
        } else {
            debug!("no other session on {}", container);
        }
        Ok(())
    }

    pub(crate) fn locked<T>(&self, f: impl FnOnce() -> Result<T>) -> Result<T> {
        match self.options.lock_dir {
            Some(ref dir) => crate::lock::with_head_lock(dir, &self.head, f),
            None => f(),
        }
    }
}

fn parse_id(container: &str, key: &str, value: &str) -> Result<u64> {
    value.trim().parse::<u64>().map_err(|_| {
        Error::invalid_metadata(format!("{}: {} is not an id: {:?}", container, key, value))
    })
}
