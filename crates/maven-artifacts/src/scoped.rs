//! Scoped temporary directories
//!
//! A [`ScopedTempDir`] is removed when it is dropped, so every exit path of
//! the operation that owns it (success, early return, `?`, panic unwind)
//! cleans up. [`ScopedTempDir::release`] removes it eagerly and reports
//! removal errors instead of swallowing them.

use crate::version::ArtifactVersion;
use std::io;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, warn};

/// Owned temporary directory, removed on drop or [`release`](Self::release)
#[derive(Debug)]
pub struct ScopedTempDir {
    inner: TempDir,
}

impl ScopedTempDir {
    /// Create a directory under the system temp dir named `{prefix}XXXXXX`
    pub fn new(prefix: &str) -> io::Result<Self> {
        let inner = tempfile::Builder::new().prefix(prefix).tempdir()?;
        debug!(path = %inner.path().display(), "created scoped temp dir");
        Ok(ScopedTempDir { inner })
    }

    /// Create a directory under `root` named `{prefix}XXXXXX`
    pub fn new_in(root: &Path, prefix: &str) -> io::Result<Self> {
        let inner = tempfile::Builder::new().prefix(prefix).tempdir_in(root)?;
        debug!(path = %inner.path().display(), "created scoped temp dir");
        Ok(ScopedTempDir { inner })
    }

    pub fn path(&self) -> &Path {
        self.inner.path()
    }

    /// Remove the directory now
    pub fn release(self) -> io::Result<()> {
        let path = self.inner.path().to_path_buf();
        match self.inner.close() {
            Ok(()) => {
                debug!(path = %path.display(), "released scoped temp dir");
                Ok(())
            }
            Err(err) => {
                warn!(path = %path.display(), error = %err, "failed to remove scoped temp dir");
                Err(err)
            }
        }
    }
}

/// A release artifact downloaded into its own [`ScopedTempDir`]
///
/// The file lives exactly as long as this value. Whoever holds it decides
/// when the directory goes away.
#[derive(Debug)]
pub struct DownloadedArtifact {
    pub version: ArtifactVersion,
    /// Absolute path of the downloaded file
    pub path: PathBuf,
    /// Hex SHA-256 of the file contents
    pub sha256: String,
    pub size: u64,
    dir: ScopedTempDir,
}

impl DownloadedArtifact {
    pub(crate) fn new(
        version: ArtifactVersion,
        path: PathBuf,
        sha256: String,
        size: u64,
        dir: ScopedTempDir,
    ) -> Self {
        DownloadedArtifact {
            version,
            path,
            sha256,
            size,
            dir,
        }
    }

    /// Directory holding the artifact
    pub fn directory(&self) -> &Path {
        self.dir.path()
    }

    /// Remove the artifact and its directory
    pub fn release(self) -> io::Result<()> {
        self.dir.release()
    }
}
