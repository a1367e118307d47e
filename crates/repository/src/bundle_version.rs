//! One resolved version of a bundle and its lazily materialized artifacts.

use crate::config::VersionConfig;
use crate::error::{Error, Result};
use crate::jar::ModuleJar;
use crate::repository::ResolverContext;
use crate::resource::{self, HostVersion, ModuleResource};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, OnceLock};
use tracing::debug;
use webmod_registry::{Archive, ModuleFormat, PackageId, PackageVersion, TarGzReader};
use webmod_semver::{Range, Version};

/// Cache entry name of the extracted metadata document.
const PACKAGE_JSON: &str = "package.json";

/// Cache entry name of the extracted distribution tree.
const DIST: &str = "dist";

/// Directory under which npm tarballs root their content.
const PACKAGE_ROOT: &str = "package";

/// One version of a package, resolved into the repository.
///
/// The registry metadata is available immediately; the parsed
/// `package.json`, the extracted distribution tree, the descriptor and
/// the packaging hand-off all materialize on first use and are memoized
/// for the life of the value. Every artifact routes through the
/// repository cache, so a second repository over the same cache
/// directory reuses the downloaded tarball content.
pub struct BundleVersion {
    context: Arc<ResolverContext>,
    metadata: Arc<PackageVersion>,
    config: VersionConfig,
    package_json: OnceLock<Arc<Value>>,
    dist: OnceLock<PathBuf>,
    resource: OnceLock<Arc<ModuleResource>>,
    jar: OnceLock<Arc<ModuleJar>>,
}

impl BundleVersion {
    pub(crate) fn new(
        context: Arc<ResolverContext>,
        metadata: Arc<PackageVersion>,
        config: VersionConfig,
    ) -> Self {
        Self {
            context,
            metadata,
            config,
            package_json: OnceLock::new(),
            dist: OnceLock::new(),
            resource: OnceLock::new(),
            jar: OnceLock::new(),
        }
    }

    /// The package this version belongs to.
    #[must_use]
    pub fn id(&self) -> &PackageId {
        self.metadata.id()
    }

    /// The resolved version.
    #[must_use]
    pub fn version(&self) -> &Version {
        self.metadata.version()
    }

    /// The registry metadata this version was resolved from.
    #[must_use]
    pub fn package_version(&self) -> &PackageVersion {
        &self.metadata
    }

    /// The dependencies this version declares.
    #[must_use]
    pub fn dependencies(&self) -> &BTreeMap<PackageId, Range> {
        self.metadata.dependencies()
    }

    /// The effective module format: the configured override, or the
    /// repository default.
    #[must_use]
    pub fn format(&self) -> ModuleFormat {
        self.config.format()
    }

    /// The parsed `package.json` of this version.
    ///
    /// Extracted from the distribution tarball through the cache on
    /// first use.
    pub fn package_json(&self) -> Result<Arc<Value>> {
        if let Some(document) = self.package_json.get() {
            return Ok(Arc::clone(document));
        }
        let document = Arc::new(self.fetch_package_json()?);
        Ok(Arc::clone(self.package_json.get_or_init(|| document)))
    }

    /// The extracted distribution tree of this version on disk.
    ///
    /// The whole tarball is unpacked through the cache on first use; the
    /// returned directory keeps the archive's internal layout.
    pub fn package_dist(&self) -> Result<PathBuf> {
        if let Some(path) = self.dist.get() {
            return Ok(path.clone());
        }
        let path = self.fetch_dist()?;
        Ok(self.dist.get_or_init(|| path).clone())
    }

    /// The effective entry point: the configured override, or the one
    /// the metadata document declares for the effective format.
    pub fn entry_point(&self) -> Result<Option<String>> {
        if let Some(configured) = self.config.entry_point() {
            return Ok(Some(configured.to_string()));
        }
        let document = self.package_json()?;
        Ok(resource::detect_entry_point(&document, self.format()))
    }

    /// The capability and requirement descriptor of this version.
    pub fn resource(&self) -> Result<Arc<ModuleResource>> {
        if let Some(descriptor) = self.resource.get() {
            return Ok(Arc::clone(descriptor));
        }
        let entry_point = self.entry_point()?;
        let descriptor = Arc::new(ModuleResource::new(
            self.id(),
            self.version(),
            self.format(),
            entry_point.as_deref(),
        ));
        Ok(Arc::clone(self.resource.get_or_init(|| descriptor)))
    }

    /// The packaging hand-off for this version.
    ///
    /// Materializes the descriptor and the distribution tree.
    pub fn jar(&self) -> Result<Arc<ModuleJar>> {
        if let Some(jar) = self.jar.get() {
            return Ok(Arc::clone(jar));
        }
        let descriptor = self.resource()?;
        let dist = self.package_dist()?;
        let jar = Arc::new(ModuleJar::new(
            &self.context.symbolic_name_prefix,
            self.id(),
            self.format(),
            HostVersion::from(self.version()),
            descriptor,
            dist,
        ));
        Ok(Arc::clone(self.jar.get_or_init(|| jar)))
    }

    /// The tarball archive this version is distributed as.
    fn tarball(&self) -> Result<&Archive> {
        self.metadata.archive(Archive::TARBALL).ok_or_else(|| {
            Error::missing_archive(
                self.id().to_string(),
                self.version().to_string(),
                Archive::TARBALL,
            )
        })
    }

    /// Cache segment of this version: its published checksum, or its
    /// coordinates when the registry published none.
    fn cache_segment(&self) -> String {
        self.metadata.checksum().map_or_else(
            || format!("{}/{}", self.id(), self.version()),
            str::to_string,
        )
    }

    fn fetch_package_json(&self) -> Result<Value> {
        let archive = self.tarball()?;
        let name = format!("{}/{PACKAGE_JSON}", self.cache_segment());
        let entry_name = format!("{PACKAGE_ROOT}/{PACKAGE_JSON}");
        let path = self.context.cache.fetch_resource(&name, |entry| {
            let stream = self.context.registry.open_archive(&archive.url)?;
            let mut reader =
                TarGzReader::new(stream, self.metadata.checksum().map(str::to_string));
            let bytes = reader.find_entry(&entry_name)?;
            entry.write_bytes(&bytes)?;
            reader.close()
        })?;
        let bytes = fs::read(&path)
            .map_err(|source| webmod_registry::Error::io(source, &path, "read cached metadata"))?;
        debug!(package = %self.id(), version = %self.version(), "loaded package.json");
        serde_json::from_slice(&bytes).map_err(|source| {
            Error::metadata(self.id().to_string(), self.version().to_string(), source)
        })
    }

    fn fetch_dist(&self) -> Result<PathBuf> {
        let archive = self.tarball()?;
        let name = format!("{}/{DIST}", self.cache_segment());
        let path = self.context.cache.fetch_resource(&name, |entry| {
            let stream = self.context.registry.open_archive(&archive.url)?;
            let mut reader =
                TarGzReader::new(stream, self.metadata.checksum().map(str::to_string));
            reader.extract_files(|path, bytes| entry.write_bytes_at(path, bytes))?;
            reader.close()
        })?;
        debug!(package = %self.id(), version = %self.version(), path = %path.display(), "extracted distribution");
        Ok(path)
    }
}
