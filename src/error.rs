use std::path::PathBuf;

/// All errors produced by dbsnap.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("already initialized: {0}")]
    AlreadyInitialized(String),

    #[error("not initialized: {0}")]
    NotInitialized(String),

    #[error("cannot revert: source does not exist: {0}")]
    NoTemplate(String),

    #[error("tag already exists: {0}")]
    TagExists(String),

    #[error("tag not found: {0}")]
    TagNotFound(String),

    #[error("unsupported purge mode: {0}")]
    UnsupportedPurgeMode(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("already exists: {0}")]
    AlreadyExists(String),

    #[error("container busy: {0}")]
    Busy(String),

    #[error("invalid container name: {0}")]
    InvalidName(String),

    #[error("invalid metadata: {0}")]
    InvalidMetadata(String),

    #[error("timed out waiting for lock: {0}")]
    LockTimeout(String),

    #[error("store error: {0}")]
    Store(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

// ---------------------------------------------------------------------------
// Convenience constructors
// ---------------------------------------------------------------------------

impl Error {
    pub fn already_initialized(name: impl Into<String>) -> Self {
        Self::AlreadyInitialized(name.into())
    }

    pub fn not_initialized(name: impl Into<String>) -> Self {
        Self::NotInitialized(name.into())
    }

    pub fn no_template(name: impl Into<String>) -> Self {
        Self::NoTemplate(name.into())
    }

    pub fn tag_exists(tag: impl Into<String>) -> Self {
        Self::TagExists(tag.into())
    }

    pub fn tag_not_found(tag: impl Into<String>) -> Self {
        Self::TagNotFound(tag.into())
    }

    pub fn unsupported_purge_mode(mode: impl Into<String>) -> Self {
        Self::UnsupportedPurgeMode(mode.into())
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    pub fn already_exists(name: impl Into<String>) -> Self {
        Self::AlreadyExists(name.into())
    }

    pub fn busy(name: impl Into<String>) -> Self {
        Self::Busy(name.into())
    }

    pub fn invalid_name(msg: impl Into<String>) -> Self {
        Self::InvalidName(msg.into())
    }

    pub fn invalid_metadata(msg: impl Into<String>) -> Self {
        Self::InvalidMetadata(msg.into())
    }

    pub fn lock_timeout(path: impl Into<PathBuf>) -> Self {
        Self::LockTimeout(path.into().display().to_string())
    }

    pub fn store(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Store(Box::new(err))
    }

    pub fn store_msg(msg: impl Into<String>) -> Self {
        Self::Store(msg.into().into())
    }

    pub fn io(path: impl Into<PathBuf>, err: std::io::Error) -> Self {
        Self::Io(std::io::Error::new(
            err.kind(),
            format!("{}: {}", path.into().display(), err),
        ))
    }
}
