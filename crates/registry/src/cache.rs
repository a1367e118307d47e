//! Fetch-once cache for extracted package resources.
//!
//! Resources live under a configured root, keyed by the publishing package's
//! checksum when it has one and by `name/version` otherwise:
//!
//! ```text
//! <root>/
//! ├── 798B39B0A22E3FA3E3D34B04FB4A2165C8BB9E92/
//! │   ├── package.json
//! │   └── dist/...
//! └── left-pad/
//!     └── 1.3.0/
//!         ├── package.json
//!         └── dist/...
//! ```
//!
//! A resource is written into a staging directory first and published with a
//! single rename, so readers never observe a partially-written resource.

use crate::error::{Error, Result};
use std::fs;
use std::path::{Component, Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use tempfile::TempDir;
use tracing::{debug, trace};

/// Fetch-once store of extracted package resources.
#[derive(Debug)]
pub struct Cache {
    root: PathBuf,
    // Serializes misses so at most one writer runs per key in this process.
    write_lock: Mutex<()>,
}

impl Cache {
    /// Create a cache rooted at the given directory, creating it if needed.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|source| Error::io(source, &root, "create cache root"))?;
        Ok(Self {
            root,
            write_lock: Mutex::new(()),
        })
    }

    /// The cache root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Return the path of the resource `name`, producing it on miss.
    ///
    /// On hit the writer is not invoked and the existing path is returned
    /// unchanged. On miss the writer runs exactly once against a staging
    /// [`CacheEntry`] and the staged content is published atomically after
    /// it returns. Concurrent fetches of one key observe either nothing or
    /// the complete resource, never a partial write.
    pub fn fetch_resource<W>(&self, name: &str, writer: W) -> Result<PathBuf>
    where
        W: FnOnce(&CacheEntry) -> Result<()>,
    {
        let target = self.resource_path(name)?;
        if target.exists() {
            trace!(resource = name, "cache hit");
            return Ok(target);
        }

        // A poisoned lock means another writer panicked; nothing partial
        // escapes its staging directory, so the lock stays usable.
        let _guard = self
            .write_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if target.exists() {
            trace!(resource = name, "cache hit after waiting for writer");
            return Ok(target);
        }

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)
                .map_err(|source| Error::io(source, parent, "create cache directory"))?;
        }

        // Staged inside the root so the publishing rename never crosses a
        // filesystem boundary.
        let staging = TempDir::with_prefix_in(".staging-", &self.root)
            .map_err(|source| Error::io(source, &self.root, "create staging directory"))?;
        let entry = CacheEntry {
            resource: staging.path().join("resource"),
        };
        writer(&entry)?;

        match fs::rename(&entry.resource, &target) {
            Ok(()) => debug!(resource = name, "cached resource"),
            // Lost the publish race to another process; the winner's copy
            // is identical by key construction.
            Err(_) if target.exists() => {
                trace!(resource = name, "resource published concurrently");
            }
            Err(source) => return Err(Error::io(source, &target, "publish cache resource")),
        }
        Ok(target)
    }

    /// Map a resource key to its path under the cache root.
    fn resource_path(&self, name: &str) -> Result<PathBuf> {
        let relative = Path::new(name);
        ensure_contained(relative)?;
        Ok(self.root.join(relative))
    }
}

/// Staging handle handed to a cache writer on miss.
///
/// A writer persists the resource either as one file via
/// [`write_bytes`](Self::write_bytes) or as a directory tree via repeated
/// [`write_bytes_at`](Self::write_bytes_at) calls; one entry uses one shape.
/// Nothing becomes visible to readers until the cache publishes the staged
/// resource.
#[derive(Debug)]
pub struct CacheEntry {
    resource: PathBuf,
}

impl CacheEntry {
    /// Persist the whole resource as a single file.
    pub fn write_bytes(&self, bytes: &[u8]) -> Result<()> {
        fs::write(&self.resource, bytes)
            .map_err(|source| Error::io(source, &self.resource, "write cache resource"))
    }

    /// Persist one file of a directory-shaped resource at `subpath`.
    ///
    /// Parent directories are created as needed; paths that would escape
    /// the resource are rejected.
    pub fn write_bytes_at(&self, subpath: impl AsRef<Path>, bytes: &[u8]) -> Result<()> {
        let subpath = subpath.as_ref();
        ensure_contained(subpath)?;
        let path = self.resource.join(subpath);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|source| Error::io(source, parent, "create resource directory"))?;
        }
        fs::write(&path, bytes).map_err(|source| Error::io(source, &path, "write cache resource"))
    }
}

/// Reject paths that would land outside the directory they are joined to.
fn ensure_contained(path: &Path) -> Result<()> {
    let mut named = false;
    for component in path.components() {
        match component {
            Component::Normal(_) => named = true,
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(Error::UnsafePath {
                    path: path.display().to_string(),
                });
            }
        }
    }
    if named {
        Ok(())
    } else {
        Err(Error::UnsafePath {
            path: path.display().to_string(),
        })
    }
}
