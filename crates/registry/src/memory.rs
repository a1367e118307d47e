//! Fixed in-memory registry for fixtures and offline tests.

use crate::error::{Error, Result};
use crate::package::PackageId;
use crate::registry::{PackageRoot, Registry, RegistryPackageRoot};
use flate2::Compression;
use flate2::write::GzEncoder;
use sha1::{Digest, Sha1};
use std::collections::HashMap;
use std::io::{Cursor, Read};
use std::sync::Arc;

/// A [`Registry`] serving a fixed set of packages from memory.
///
/// Package roots and archive bytes are published up front; lookups never
/// touch the network or the filesystem.
#[derive(Debug, Default)]
pub struct StaticRegistry {
    roots: HashMap<PackageId, Arc<RegistryPackageRoot>>,
    resources: HashMap<String, Vec<u8>>,
}

impl StaticRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish a package root.
    pub fn publish_root(&mut self, root: RegistryPackageRoot) {
        self.roots.insert(root.id().clone(), Arc::new(root));
    }

    /// Publish raw archive bytes under a URL.
    pub fn publish_resource(&mut self, url: impl Into<String>, bytes: Vec<u8>) {
        self.resources.insert(url.into(), bytes);
    }
}

impl Registry for StaticRegistry {
    fn package_root(&self, id: &PackageId) -> Result<Arc<dyn PackageRoot>> {
        self.roots
            .get(id)
            .cloned()
            .map(|root| root as Arc<dyn PackageRoot>)
            .ok_or_else(|| Error::PackageNotFound {
                package: id.to_string(),
            })
    }

    fn open_archive(&self, url: &str) -> Result<Box<dyn Read + Send>> {
        self.resources
            .get(url)
            .cloned()
            .map(|bytes| Box::new(Cursor::new(bytes)) as Box<dyn Read + Send>)
            .ok_or_else(|| Error::ResourceNotFound {
                url: url.to_string(),
            })
    }
}

/// Build a gzip-compressed tarball from `(path, content)` pairs.
pub fn build_tarball(files: &[(&str, &[u8])]) -> Result<Vec<u8>> {
    let mut builder = tar::Builder::new(GzEncoder::new(Vec::new(), Compression::default()));
    for (path, content) in files {
        let mut header = tar::Header::new_gnu();
        header
            .set_path(path)
            .map_err(|source| Error::io(source, path, "set entry path"))?;
        header.set_size(content.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder
            .append(&header, *content)
            .map_err(|source| Error::io_no_path(source, "append entry"))?;
    }
    builder
        .into_inner()
        .map_err(|source| Error::io_no_path(source, "finish tar"))?
        .finish()
        .map_err(|source| Error::io_no_path(source, "finish gzip"))
}

/// Uppercase SHA-1 hex of a byte slice, as registries publish it.
#[must_use]
pub fn sha1_hex(bytes: &[u8]) -> String {
    hex::encode_upper(Sha1::digest(bytes))
}
