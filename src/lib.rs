//! Numbered, branching snapshot history for databases.
//!
//! `dbsnap` keeps a tree of revisions of one working database (the *head*)
//! on top of a storage engine that can clone a database cheaply. Every
//! commit freezes the head into an immutable *archive* named after its
//! revision id; reverts rewind the head to any archive, and later commits
//! branch off from there.
//!
//! # Key types
//!
//! - [`History`]: the head plus its archives; commit, revert, log, purge.
//! - [`TagDict`]: unique, movable labels on revisions.
//! - [`SnapshotStore`]: what the storage engine must provide. [`MemoryStore`]
//!   is an in-process implementation; `PgStore` (feature `postgres`) drives a
//!   PostgreSQL server.
//! - [`glog::render`]: ASCII branch graph of a history.
//!
//! # Quick example
//!
//! ```rust
//! use dbsnap::{History, HistoryOptions, MemoryStore, RevertTarget};
//!
//! let history = History::open(MemoryStore::new(), "shop", HistoryOptions::default()).unwrap();
//! history.create().unwrap();
//! history.init().unwrap();
//!
//! history.commit(Some("before migration")).unwrap();
//! assert_eq!(history.id().unwrap(), 1);
//!
//! // Throw away whatever happened since
//! history.revert(RevertTarget::Parent).unwrap();
//! assert_eq!(history.parent().unwrap(), 0);
//! ```

pub mod config;
pub mod error;
pub mod glog;
pub mod history;
pub mod lock;
pub mod memory;
pub mod naming;
#[cfg(feature = "postgres")]
pub mod pg;
pub mod store;
pub mod tags;
pub mod types;

// Re-export primary public types at crate root.
pub use config::Config;
pub use error::{Error, Result};
pub use history::History;
pub use memory::{MemoryStore, StoreOp};
pub use naming::{ArchiveNaming, SeparatorNaming};
#[cfg(feature = "postgres")]
pub use pg::{PgOptions, PgStore};
pub use store::{Metadata, SnapshotStore};
pub use tags::TagDict;
pub use types::*;
