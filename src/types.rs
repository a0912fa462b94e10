use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::naming::{ArchiveNaming, SeparatorNaming};

// ---------------------------------------------------------------------------
// Metadata keys
// ---------------------------------------------------------------------------

pub const META_REVISION: &str = "revision";
pub const META_PARENT: &str = "parent";
pub const META_TAG: &str = "tag";
pub const META_MESSAGE: &str = "message";

// ---------------------------------------------------------------------------
// Revision
// ---------------------------------------------------------------------------

/// One entry of the history: the revision record attached to a container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Revision {
    /// Name of the container holding this record (head or archive).
    pub container: String,
    pub id: u64,
    pub parent: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl Revision {
    /// `true` when a tag is attached.
    pub fn is_tagged(&self) -> bool {
        self.tag.is_some()
    }
}

/// A tag and the container currently carrying it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaggedRevision {
    pub tag: String,
    pub container: String,
}

// ---------------------------------------------------------------------------
// LogOptions
// ---------------------------------------------------------------------------

/// Options for [`History::log`](crate::History::log).
#[derive(Debug, Clone, Copy)]
pub struct LogOptions {
    /// Keep only the first `limit` entries in the requested order.
    pub limit: Option<usize>,
    /// Sort by id descending (default) instead of ascending.
    pub newest_first: bool,
}

impl Default for LogOptions {
    fn default() -> Self {
        Self {
            limit: None,
            newest_first: true,
        }
    }
}

impl LogOptions {
    pub fn limit(limit: usize) -> Self {
        Self {
            limit: Some(limit),
            ..Default::default()
        }
    }

    pub fn oldest_first() -> Self {
        Self {
            newest_first: false,
            ..Default::default()
        }
    }
}

// ---------------------------------------------------------------------------
// RevertTarget
// ---------------------------------------------------------------------------

/// Where [`History::revert`](crate::History::revert) takes the new head content from.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RevertTarget {
    /// The head's current parent: drop uncommitted changes.
    #[default]
    Parent,
    /// An explicit revision id.
    Revision(u64),
    /// The revision currently carrying this tag.
    Tag(String),
}

// ---------------------------------------------------------------------------
// PurgeMode
// ---------------------------------------------------------------------------

/// Which archives [`History::purge`](crate::History::purge) selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PurgeMode {
    /// Every archive.
    All,
    /// Every archive without a tag.
    KeepTags,
}

impl PurgeMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::KeepTags => "keeptags",
        }
    }
}

impl FromStr for PurgeMode {
    type Err = crate::error::Error;

    fn from_str(s: &str) -> crate::error::Result<Self> {
        match s {
            "all" => Ok(Self::All),
            "keeptags" => Ok(Self::KeepTags),
            other => Err(crate::error::Error::unsupported_purge_mode(other)),
        }
    }
}

impl fmt::Display for PurgeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// ConnectOptions
// ---------------------------------------------------------------------------

/// Server connection parameters shared by every container of a history.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

impl ConnectOptions {
    /// Render a libpq keyword/value connection string for `dbname`.
    ///
    /// Keys appear in the order `dbname user password host port`; absent
    /// fields are skipped. Values that are empty or contain whitespace, `'`
    /// or `\` are single-quoted with `'` and `\` backslash-escaped.
    pub fn connection_string(&self, dbname: &str) -> String {
        let mut parts = vec![format!("dbname={}", quote_conn_value(dbname))];
        if let Some(ref user) = self.user {
            parts.push(format!("user={}", quote_conn_value(user)));
        }
        if let Some(ref password) = self.password {
            parts.push(format!("password={}", quote_conn_value(password)));
        }
        if let Some(ref host) = self.host {
            parts.push(format!("host={}", quote_conn_value(host)));
        }
        if let Some(port) = self.port {
            parts.push(format!("port={}", port));
        }
        parts.join(" ")
    }
}

fn quote_conn_value(value: &str) -> String {
    let needs_quotes = value.is_empty()
        || value
            .chars()
            .any(|c| c.is_whitespace() || c == '\'' || c == '\\');
    if !needs_quotes {
        return value.to_string();
    }
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('\'');
    for c in value.chars() {
        if c == '\'' || c == '\\' {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    quoted.push('\'');
    quoted
}

// ---------------------------------------------------------------------------
// HistoryOptions
// ---------------------------------------------------------------------------

/// Options for opening a [`History`](crate::History).
#[derive(Debug, Clone)]
pub struct HistoryOptions {
    /// How archive containers are named from the head name and an id.
    pub naming: Arc<dyn ArchiveNaming>,
    /// Directory for the advisory head lock. No locking when `None`.
    pub lock_dir: Option<PathBuf>,
}

impl Default for HistoryOptions {
    fn default() -> Self {
        Self {
            naming: Arc::new(SeparatorNaming::default()),
            lock_dir: None,
        }
    }
}
