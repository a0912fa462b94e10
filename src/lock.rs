use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use fs2::FileExt;

use crate::error::{Error, Result};

/// How long [`with_head_lock`] waits before giving up.
pub const LOCK_TIMEOUT: Duration = Duration::from_secs(30);

const INITIAL_BACKOFF: Duration = Duration::from_millis(5);
const MAX_BACKOFF: Duration = Duration::from_millis(500);

/// Path of the lock file guarding `head` inside `dir`.
pub fn lock_path(dir: &Path, head: &str) -> PathBuf {
    dir.join(format!("{}.lock", head))
}

/// Acquire an advisory file lock keyed by the head container name, execute
/// `f`, then release.
///
/// Locks `<dir>/<head>.lock` exclusively with `fs2`, retrying with
/// exponential backoff for up to [`LOCK_TIMEOUT`]. Serializes mutating
/// history operations across threads and processes sharing `dir`.
///
/// # Arguments
/// * `dir` - Directory holding lock files. Created if missing.
/// * `head` - Head container name.
/// * `f` - Closure to execute while the lock is held.
///
/// # Errors
/// Returns [`Error::LockTimeout`] if the lock cannot be acquired in time.
pub fn with_head_lock<F, T>(dir: &Path, head: &str, f: F) -> Result<T>
where
    F: FnOnce() -> Result<T>,
{
    with_head_lock_timeout(dir, head, LOCK_TIMEOUT, f)
}

/// [`with_head_lock`] with an explicit timeout.
pub fn with_head_lock_timeout<F, T>(dir: &Path, head: &str, timeout: Duration, f: F) -> Result<T>
where
    F: FnOnce() -> Result<T>,
{
    std::fs::create_dir_all(dir).map_err(|e| Error::io(dir, e))?;
    let path = lock_path(dir, head);
    let file = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(&path)
        .map_err(|e| Error::io(&path, e))?;

    let deadline = Instant::now() + timeout;
    let mut backoff = INITIAL_BACKOFF;
    loop {
        match file.try_lock_exclusive() {
            Ok(()) => break,
            Err(e) if e.kind() == fs2::lock_contended_error().kind() => {
                if Instant::now() >= deadline {
                    return Err(Error::lock_timeout(&path));
                }
                log::debug!("lock {} busy, retrying in {:?}", path.display(), backoff);
                std::thread::sleep(backoff);
                backoff = (backoff * 2).min(MAX_BACKOFF);
            }
            Err(e) => return Err(Error::io(&path, e)),
        }
    }

    let result = f();
    if let Err(e) = FileExt::unlock(&file) {
        log::debug!("unlocking {}: {}", path.display(), e);
    }
    result
}
