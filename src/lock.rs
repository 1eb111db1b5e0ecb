//! File locking and atomic writes for stores.
//!
//! - Exclusive `fs2` lock on a sidecar `<file>.lock`, with a bounded wait
//! - Atomic replace: write a temp file in the target directory, then rename
//!
//! Read-modify-write sequences run inside [`with_lock`] so two flow
//! processes touching the same store serialize instead of losing a write.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use fs2::FileExt;
use tempfile::NamedTempFile;

use crate::error::{Error, Result};

const STORE_LOCK_WAIT: Duration = Duration::from_secs(5);
const STORE_LOCK_POLL: Duration = Duration::from_millis(50);

/// Exclusive hold on a store's sidecar lock file, released on drop
#[derive(Debug)]
struct StoreLock(File);

impl StoreLock {
    /// Poll for the lock until `wait` runs out.
    fn wait_for(lock_path: &Path, wait: Duration) -> Result<Self> {
        if let Some(parent) = lock_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(lock_path)?;

        let deadline = Instant::now() + wait;
        loop {
            match file.try_lock_exclusive() {
                Ok(()) => return Ok(StoreLock(file)),
                Err(err) if held_elsewhere(&err) && Instant::now() < deadline => {
                    std::thread::sleep(STORE_LOCK_POLL);
                }
                Err(err) if held_elsewhere(&err) => {
                    tracing::warn!(path = %lock_path.display(), "timed out waiting for store lock");
                    return Err(Error::LockFailed(lock_path.to_path_buf()));
                }
                Err(err) => return Err(Error::Io(err)),
            }
        }
    }
}

impl Drop for StoreLock {
    fn drop(&mut self) {
        let _ = self.0.unlock();
    }
}

fn held_elsewhere(err: &io::Error) -> bool {
    // Windows reports lock violations as raw OS errors 32/33.
    err.kind() == io::ErrorKind::WouldBlock
        || cfg!(windows) && matches!(err.raw_os_error(), Some(32) | Some(33))
}

fn sidecar(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".lock");
    PathBuf::from(name)
}

/// Run `op` while holding the sidecar lock of the store at `path`.
pub fn with_lock<T>(path: &Path, op: impl FnOnce() -> Result<T>) -> Result<T> {
    let _held = StoreLock::wait_for(&sidecar(path), STORE_LOCK_WAIT)?;
    op()
}

/// Replace `path` with `data` in one rename.
///
/// Does not take the lock; callers coordinating with other processes wrap
/// this in [`with_lock`].
pub fn write_atomic(path: impl AsRef<Path>, data: &[u8]) -> Result<()> {
    let path = path.as_ref();
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent)?;

    let mut temp = NamedTempFile::new_in(parent)?;
    temp.write_all(data)?;
    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|err| Error::Io(err.error))?;
    Ok(())
}

/// Read a file, `Ok(None)` when it does not exist.
pub fn read_optional(path: &Path) -> Result<Option<String>> {
    match fs::read_to_string(path) {
        Ok(text) => Ok(Some(text)),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(err) => Err(Error::Io(err)),
    }
}
