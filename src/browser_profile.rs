//! Per-job Chrome profile directories
//!
//! Every job launches its own Chrome, and every Chrome gets a UUID-named
//! profile so concurrent jobs never share a cookie store or a SingletonLock.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// RAII wrapper for a Chrome profile directory
///
/// Removes the directory on drop. Orphaned profiles would otherwise pile up in
/// temp with a copy of the job's session cookies inside.
#[derive(Debug)]
pub struct BrowserProfile {
    path: PathBuf,
}

impl BrowserProfile {
    /// Get reference to the profile directory path
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for BrowserProfile {
    fn drop(&mut self) {
        if self.path.exists() {
            info!("BrowserProfile cleanup: removing {}", self.path.display());
            if let Err(e) = std::fs::remove_dir_all(&self.path) {
                warn!("Failed to cleanup profile directory {}: {}", self.path.display(), e);
            }
        }
    }
}

/// Create a unique profile directory under the system temp dir
///
/// Uses `create_dir` (not `create_dir_all`) so an existing directory is an
/// error rather than silently shared.
pub fn create_unique_profile_with_prefix(prefix: &str) -> Result<BrowserProfile> {
    let path = std::env::temp_dir().join(format!("{}_{}", prefix, Uuid::new_v4()));

    debug!("Creating Chrome profile with prefix '{}': {}", prefix, path.display());

    std::fs::create_dir(&path)
        .with_context(|| format!("Failed to create profile directory: {}", path.display()))?;

    Ok(BrowserProfile { path })
}
