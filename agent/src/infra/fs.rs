//! Filesystem infrastructure: implements `HostFs` for container directories.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::application::ports::HostFs;
use crate::domain::container::HOST_DIR_PREFIX;

/// Production `HostFs` rooted in a base directory (the system temp dir by
/// default).
pub struct LocalFs {
    base: PathBuf,
}

impl LocalFs {
    #[must_use]
    pub fn new(base: PathBuf) -> Self {
        Self { base }
    }
}

impl Default for LocalFs {
    fn default() -> Self {
        Self::new(std::env::temp_dir())
    }
}

impl HostFs for LocalFs {
    fn create_private_dir(&self) -> Result<PathBuf> {
        let dir = tempfile::Builder::new()
            .prefix(HOST_DIR_PREFIX)
            .tempdir_in(&self.base)
            .with_context(|| format!("creating directory under {}", self.base.display()))?;
        Ok(dir.keep())
    }

    fn remove_dir_all(&self, path: &Path) -> Result<()> {
        match std::fs::remove_dir_all(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| format!("removing directory {}", path.display())),
        }
    }

    fn write_file(&self, path: &Path, contents: &str) -> Result<()> {
        std::fs::write(path, contents).with_context(|| format!("writing file {}", path.display()))
    }
}
