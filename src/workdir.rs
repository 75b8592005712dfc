//! Scoped working-directory switching.
//!
//! The process working directory is global mutable state shared by every
//! tool invocation, so all directory-dependent work is funneled through a
//! single mutex. [`DirGuard`] takes the lock, switches into the target
//! directory, and restores the previous directory on drop — including the
//! unwind path — so no exit from a handler can leave the process stranded
//! in a tool's target directory.

use std::env;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::{debug, error};

/// Serializes every working-directory switch in the process.
static WORKDIR_LOCK: Mutex<()> = Mutex::new(());

/// RAII guard for a temporary working-directory change.
///
/// Holding the guard also holds the global workdir lock, so at most one
/// scope is active at a time. Nested acquisition from the same thread
/// deadlocks by construction — handlers must never stack guards.
#[derive(Debug)]
pub struct DirGuard {
    previous: PathBuf,
    _permit: MutexGuard<'static, ()>,
}

impl DirGuard {
    /// Switch the process working directory to `target`.
    ///
    /// Blocks until no other scope is active, captures the current
    /// directory, then performs the switch.
    ///
    /// # Errors
    ///
    /// Returns an error if the current directory cannot be read or the
    /// switch to `target` fails; in both cases the previous directory is
    /// left untouched.
    pub fn change_to(target: &Path) -> std::io::Result<Self> {
        // A poisoned lock only means a previous holder panicked mid-scope;
        // its own Drop already restored the directory, so the state the
        // mutex protects is intact.
        let permit = WORKDIR_LOCK
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let previous = env::current_dir()?;
        env::set_current_dir(target)?;
        debug!(from = %previous.display(), to = %target.display(), "switched working directory");

        Ok(Self {
            previous,
            _permit: permit,
        })
    }

    /// The directory that will be restored when this guard drops.
    pub fn previous(&self) -> &Path {
        &self.previous
    }
}

impl Drop for DirGuard {
    fn drop(&mut self) {
        // Runs before `_permit` is released, so the restore is still
        // covered by the lock.
        if let Err(e) = env::set_current_dir(&self.previous) {
            error!(
                dir = %self.previous.display(),
                error = %e,
                "failed to restore working directory"
            );
        } else {
            debug!(dir = %self.previous.display(), "restored working directory");
        }
    }
}
