//! Root lock: one agent per watched root
//!
//! The lock is an `flock` on `.svault.lock` inside the root. The kernel drops
//! it when the holder exits, so a leftover file never blocks a new agent.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// Name of the lock file inside the watched root
pub const LOCK_FILE: &str = ".svault.lock";

/// Exclusive lock on a watched root, released on drop
pub struct RootLock {
    path: PathBuf,
    #[allow(dead_code)]
    file: File,
}

/// Agent recorded in the lock file
#[derive(Debug, Serialize, Deserialize)]
pub struct Holder {
    pub pid: u32,
    pub started_at: u64,
}

impl RootLock {
    /// Lock `root`, failing if another agent holds it
    pub fn acquire(root: &Path) -> Result<Self> {
        let path = root.join(LOCK_FILE);
        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(&path)
            .with_context(|| format!("Failed to open lock file {}", path.display()))?;

        if !try_flock_exclusive(&file)? {
            match read_holder(&mut file) {
                Ok(holder) => anyhow::bail!(
                    "Another agent (pid {}) is already watching {}",
                    holder.pid,
                    root.display()
                ),
                Err(_) => anyhow::bail!("Another agent is already watching {}", root.display()),
            }
        }

        let holder = Holder {
            pid: std::process::id(),
            started_at: current_timestamp_ms(),
        };
        let serialized = serde_json::to_string(&holder).context("Failed to serialize lock content")?;
        file.set_len(0)?;
        file.write_all(serialized.as_bytes())?;
        file.sync_all()?;

        Ok(Self { path, file })
    }

    /// The agent currently holding `root`, if any
    pub fn holder(root: &Path) -> Option<Holder> {
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(root.join(LOCK_FILE))
            .ok()?;
        match try_flock_exclusive(&file) {
            // Lockable means nobody holds it; closing the file unlocks again
            Ok(true) | Err(_) => None,
            Ok(false) => read_holder(&mut file).ok(),
        }
    }

    /// Release the lock and remove the lock file
    pub fn release(self) -> Result<()> {
        std::fs::remove_file(&self.path).context("Failed to remove lock file")?;
        Ok(())
    }
}

impl Drop for RootLock {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}

fn read_holder(file: &mut File) -> Result<Holder> {
    file.seek(SeekFrom::Start(0))?;
    let mut contents = String::new();
    file.read_to_string(&mut contents)?;
    serde_json::from_str(&contents).context("Failed to parse lock content")
}

/// Non-blocking exclusive `flock`; `false` when someone else holds it
#[cfg(unix)]
fn try_flock_exclusive(file: &File) -> Result<bool> {
    use nix::fcntl::{flock, FlockArg};
    use std::os::unix::io::AsRawFd;

    match flock(file.as_raw_fd(), FlockArg::LockExclusiveNonblock) {
        Ok(_) => Ok(true),
        Err(nix::errno::Errno::EWOULDBLOCK) => Ok(false),
        Err(e) => Err(e.into()),
    }
}

#[cfg(not(unix))]
fn try_flock_exclusive(_file: &File) -> Result<bool> {
    Ok(true)
}

fn current_timestamp_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
