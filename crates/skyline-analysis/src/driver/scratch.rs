//! Temp-state lifecycle.
//!
//! Every scratch directory is created 0o700 with a random suffix under the
//! OS temp root, tracked in a process-wide registry, removed on drop, and
//! swept at shutdown if a drop was skipped (panic unwound past it, caller
//! leaked the handle).

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, OnceLock};

use skyline_core::errors::DriverError;
use skyline_core::FxHashMap;

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

fn registry() -> &'static Mutex<FxHashMap<u64, PathBuf>> {
    static REGISTRY: OnceLock<Mutex<FxHashMap<u64, PathBuf>>> = OnceLock::new();
    REGISTRY.get_or_init(|| Mutex::new(FxHashMap::default()))
}

/// An owned scratch directory. Recursively removed on drop.
#[derive(Debug)]
pub struct ScratchDir {
    id: u64,
    path: PathBuf,
}

impl ScratchDir {
    /// Create a scratch directory under the OS temp root.
    pub fn create() -> Result<Self, DriverError> {
        let dir = tempfile::Builder::new()
            .prefix("skyline-")
            .rand_bytes(8)
            .tempdir()
            .map_err(DriverError::from)?;

        // Detach from TempDir so the registry is the single owner of the
        // removal responsibility.
        let path = dir.keep();

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o700))
                .map_err(DriverError::from)?;
        }

        let id = NEXT_ID.fetch_add(1, Ordering::Relaxed);
        if let Ok(mut reg) = registry().lock() {
            reg.insert(id, path.clone());
        }

        tracing::debug!(path = %path.display(), "scratch dir created");
        Ok(Self { id, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ScratchDir {
    fn drop(&mut self) {
        if let Ok(mut reg) = registry().lock() {
            reg.remove(&self.id);
        }
        if let Err(e) = std::fs::remove_dir_all(&self.path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "scratch dir removal failed"
                );
            }
        }
    }
}

/// Delete every scratch directory still registered. Call at shutdown.
/// Returns the number of survivors removed.
pub fn cleanup_survivors() -> usize {
    let survivors: Vec<(u64, PathBuf)> = match registry().lock() {
        Ok(mut reg) => reg.drain().collect(),
        Err(_) => return 0,
    };

    let mut removed = 0;
    for (_, path) in survivors {
        match std::fs::remove_dir_all(&path) {
            Ok(()) => removed += 1,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "survivor sweep failed");
            }
        }
    }
    removed
}

/// Number of scratch dirs currently registered.
pub fn registered_count() -> usize {
    registry().lock().map(|r| r.len()).unwrap_or(0)
}
