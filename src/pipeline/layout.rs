//! On-disk layout of an index directory.
//!
//! ```text
//! <root>/
//!   current/              the published index
//!   .staging-<uuid>/      a build in progress
//!   .retired-<uuid>/      the previous index, briefly, during promotion
//! ```
//!
//! A build writes into a fresh staging directory. Only when every artifact
//! is written does [`StagingDir::promote`] swap it in as `current/`. A
//! staging directory that is dropped without being promoted is removed, so a
//! failed build leaves `current/` exactly as it was.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::{debug, info, warn};
use uuid::Uuid;

use crate::error::{CreaseError, Result};
use crate::storage::file::{FileStorageConfig, sync_directory};
use crate::storage::{Storage, StorageConfig, StorageFactory};

/// Name of the published index directory.
pub const CURRENT_DIR: &str = "current";

const STAGING_PREFIX: &str = ".staging-";
const RETIRED_PREFIX: &str = ".retired-";

/// The root directory holding `current/` and any staging directories.
#[derive(Debug, Clone)]
pub struct IndexLayout {
    root: PathBuf,
}

impl IndexLayout {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        IndexLayout {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the published index.
    pub fn current_dir(&self) -> PathBuf {
        self.root.join(CURRENT_DIR)
    }

    pub fn has_current(&self) -> bool {
        self.current_dir().is_dir()
    }

    /// Create a new, empty staging directory.
    pub fn begin_staging(&self) -> Result<StagingDir> {
        fs::create_dir_all(&self.root).map_err(|e| {
            CreaseError::storage(format!("Failed to create {}: {e}", self.root.display()))
        })?;

        let path = self
            .root
            .join(format!("{STAGING_PREFIX}{}", Uuid::new_v4()));
        fs::create_dir(&path).map_err(|e| {
            CreaseError::storage(format!("Failed to create {}: {e}", path.display()))
        })?;

        let storage =
            StorageFactory::create(StorageConfig::File(FileStorageConfig::new(&path)))?;

        debug!("Staging build in {}", path.display());
        Ok(StagingDir {
            path,
            root: self.root.clone(),
            storage,
            promoted: false,
        })
    }

    /// Staging and retired directories left behind by an interrupted process.
    pub fn leftover_dirs(&self) -> Result<Vec<PathBuf>> {
        if !self.root.is_dir() {
            return Ok(Vec::new());
        }

        let mut leftovers = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if (name.starts_with(STAGING_PREFIX) || name.starts_with(RETIRED_PREFIX))
                && entry.file_type()?.is_dir()
            {
                leftovers.push(entry.path());
            }
        }
        leftovers.sort();
        Ok(leftovers)
    }

    /// Remove leftovers of interrupted builds. Never touches `current/`.
    pub fn clean_leftovers(&self) -> Result<usize> {
        let leftovers = self.leftover_dirs()?;
        for path in &leftovers {
            info!("Removing leftover build directory {}", path.display());
            fs::remove_dir_all(path)?;
        }
        Ok(leftovers.len())
    }
}

/// A build's private output directory.
///
/// Removed on drop unless promoted.
#[derive(Debug)]
pub struct StagingDir {
    path: PathBuf,
    root: PathBuf,
    storage: Arc<dyn Storage>,
    promoted: bool,
}

impl StagingDir {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Storage rooted at the staging directory.
    pub fn storage(&self) -> Arc<dyn Storage> {
        Arc::clone(&self.storage)
    }

    /// Publish the staging directory as `current/`, replacing any previous index.
    ///
    /// The old `current/` is first renamed aside, so there is never a moment
    /// with a half-written `current/`. If the final rename fails the old index
    /// is put back.
    pub fn promote(mut self) -> Result<PathBuf> {
        self.storage.sync()?;

        let current = self.root.join(CURRENT_DIR);
        let retired = if current.exists() {
            let retired = self
                .root
                .join(format!("{RETIRED_PREFIX}{}", Uuid::new_v4()));
            fs::rename(&current, &retired).map_err(|e| {
                CreaseError::storage(format!("Failed to retire {}: {e}", current.display()))
            })?;
            Some(retired)
        } else {
            None
        };

        if let Err(e) = fs::rename(&self.path, &current) {
            if let Some(retired) = &retired {
                if let Err(restore) = fs::rename(retired, &current) {
                    warn!(
                        "Failed to restore {} after a failed promotion: {restore}",
                        retired.display()
                    );
                }
            }
            return Err(CreaseError::storage(format!(
                "Failed to promote {}: {e}",
                self.path.display()
            )));
        }
        self.promoted = true;
        if let Err(e) = sync_directory(&self.root) {
            warn!("Failed to sync {}: {e}", self.root.display());
        }

        if let Some(retired) = retired {
            if let Err(e) = fs::remove_dir_all(&retired) {
                warn!("Failed to remove retired index {}: {e}", retired.display());
            }
        }

        info!("Published index at {}", current.display());
        Ok(current)
    }
}

impl Drop for StagingDir {
    fn drop(&mut self) {
        if self.promoted {
            return;
        }
        match fs::remove_dir_all(&self.path) {
            Ok(()) => debug!("Discarded staging directory {}", self.path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(
                "Failed to remove staging directory {}: {e}",
                self.path.display()
            ),
        }
    }
}
