//! Registry collaborators and the npm document model.
//!
//! A [`Registry`] hands out [`PackageRoot`]s (the set of published versions
//! of one package) and raw archive byte streams. [`RegistryPackageRoot`]
//! parses the document shape npm registries actually serve; resolution code
//! only sees the traits, so tests substitute in-memory implementations.

use crate::error::{Error, Result};
use crate::package::PackageId;
use serde_json::Value;
use std::collections::BTreeMap;
use std::io::Read;
use std::sync::Arc;
use tracing::warn;
use webmod_semver::{Range, Version};

/// A named distribution archive published for a package version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Archive {
    /// The archive type, e.g. [`Archive::TARBALL`].
    pub kind: String,
    /// Where the archive bytes live.
    pub url: String,
}

impl Archive {
    /// The archive type every npm package publishes.
    pub const TARBALL: &'static str = "tarball";
}

/// The resolved metadata of one published package version.
#[derive(Debug, Clone)]
pub struct PackageVersion {
    id: PackageId,
    version: Version,
    dependencies: BTreeMap<PackageId, Range>,
    archives: Vec<Archive>,
    checksum: Option<String>,
}

impl PackageVersion {
    /// Assemble a package version from already-parsed parts.
    #[must_use]
    pub fn new(
        id: PackageId,
        version: Version,
        dependencies: BTreeMap<PackageId, Range>,
        archives: Vec<Archive>,
        checksum: Option<String>,
    ) -> Self {
        Self {
            id,
            version,
            dependencies,
            archives,
            // Registries publish hex checksums in either case.
            checksum: checksum.map(|sum| sum.to_ascii_uppercase()),
        }
    }

    /// Parse one version document out of a package root document.
    ///
    /// Recognized members are `dependencies` (package name to range string)
    /// and `dist` (archive type to URL, plus the published `shasum`). All
    /// other members are ignored. A dependency whose name or range does not
    /// parse makes the whole document malformed.
    pub fn from_document(id: PackageId, version: Version, document: &Value) -> Result<Self> {
        let context = format!("{id}@{version}");
        let Some(document) = document.as_object() else {
            return Err(Error::document(context, "version document is not an object"));
        };

        let mut dependencies = BTreeMap::new();
        if let Some(declared) = document.get("dependencies") {
            let declared = declared.as_object().ok_or_else(|| {
                Error::document(context.as_str(), "`dependencies` is not an object")
            })?;
            for (name, range) in declared {
                let dependency: PackageId = name.parse()?;
                let range = range.as_str().ok_or_else(|| {
                    Error::document(
                        context.as_str(),
                        format!("dependency `{name}` is not a range string"),
                    )
                })?;
                dependencies.insert(dependency, range.parse::<Range>()?);
            }
        }

        let mut archives = Vec::new();
        let mut checksum = None;
        if let Some(dist) = document.get("dist").and_then(Value::as_object) {
            for (key, value) in dist {
                // Non-string members (file counts, signature blocks) carry
                // no location and are skipped.
                let Some(value) = value.as_str() else { continue };
                match key.as_str() {
                    "shasum" => checksum = Some(value.to_ascii_uppercase()),
                    // Subresource-integrity strings are not fetchable URLs.
                    "integrity" => {}
                    _ => archives.push(Archive {
                        kind: key.clone(),
                        url: value.to_string(),
                    }),
                }
            }
        }

        Ok(Self {
            id,
            version,
            dependencies,
            archives,
            checksum,
        })
    }

    /// The package this version belongs to.
    #[must_use]
    pub fn id(&self) -> &PackageId {
        &self.id
    }

    /// The published version.
    #[must_use]
    pub fn version(&self) -> &Version {
        &self.version
    }

    /// The declared dependencies and their version ranges.
    #[must_use]
    pub fn dependencies(&self) -> &BTreeMap<PackageId, Range> {
        &self.dependencies
    }

    /// Every published distribution archive.
    #[must_use]
    pub fn archives(&self) -> &[Archive] {
        &self.archives
    }

    /// The first archive of the given type, if one was published.
    #[must_use]
    pub fn archive(&self, kind: &str) -> Option<&Archive> {
        self.archives.iter().find(|archive| archive.kind == kind)
    }

    /// The published checksum in uppercase hex, if any.
    #[must_use]
    pub fn checksum(&self) -> Option<&str> {
        self.checksum.as_deref()
    }
}

/// Where package metadata and archive bytes come from.
///
/// Implementations own their transport and timeout policy; the resolution
/// engine only asks for documents and byte streams and never retries.
pub trait Registry: Send + Sync {
    /// Look up the root document for a package.
    ///
    /// # Errors
    /// Returns [`Error::PackageNotFound`] if the registry does not serve the
    /// package, or a transport error from the implementation.
    fn package_root(&self, id: &PackageId) -> Result<Arc<dyn PackageRoot>>;

    /// Open the byte stream behind an archive URL.
    ///
    /// # Errors
    /// Returns [`Error::ResourceNotFound`] if nothing lives at the URL.
    fn open_archive(&self, url: &str) -> Result<Box<dyn Read + Send>>;
}

/// The set of versions a registry publishes for one package.
pub trait PackageRoot: Send + Sync {
    /// The package this root describes.
    fn id(&self) -> &PackageId;

    /// Every published version, in ascending precedence order.
    fn package_versions(&self) -> Vec<Version>;

    /// The metadata of one published version.
    ///
    /// # Errors
    /// Returns [`Error::VersionNotFound`] if the version is not published.
    fn package_version(&self, version: &Version) -> Result<Arc<PackageVersion>>;
}

/// A [`PackageRoot`] parsed from an npm package root document.
#[derive(Debug)]
pub struct RegistryPackageRoot {
    id: PackageId,
    versions: BTreeMap<Version, Arc<PackageVersion>>,
}

impl RegistryPackageRoot {
    /// Parse a package root document as served by an npm registry.
    ///
    /// The document is an object whose `versions` member maps version strings
    /// to version documents. Entries whose key or body fails to parse are
    /// skipped with a warning; one malformed version must not hide every
    /// other version of the package.
    pub fn from_document(id: PackageId, document: &Value) -> Result<Self> {
        let declared = document
            .get("versions")
            .and_then(Value::as_object)
            .ok_or_else(|| Error::document(id.to_string(), "missing `versions` object"))?;

        let mut versions = BTreeMap::new();
        for (key, value) in declared {
            let version = match key.parse::<Version>() {
                Ok(version) => version,
                Err(error) => {
                    warn!(package = %id, version = %key, %error, "skipping unparseable version key");
                    continue;
                }
            };
            match PackageVersion::from_document(id.clone(), version.clone(), value) {
                Ok(parsed) => {
                    versions.insert(version, Arc::new(parsed));
                }
                Err(error) => {
                    warn!(package = %id, %version, %error, "skipping malformed version document");
                }
            }
        }

        Ok(Self { id, versions })
    }

    /// Parse a package root document from raw JSON bytes.
    pub fn from_json(id: PackageId, json: &[u8]) -> Result<Self> {
        let document: Value = serde_json::from_slice(json).map_err(|source| Error::Json {
            source,
            context: id.to_string(),
        })?;
        Self::from_document(id, &document)
    }
}

impl PackageRoot for RegistryPackageRoot {
    fn id(&self) -> &PackageId {
        &self.id
    }

    fn package_versions(&self) -> Vec<Version> {
        self.versions.keys().cloned().collect()
    }

    fn package_version(&self, version: &Version) -> Result<Arc<PackageVersion>> {
        self.versions
            .get(version)
            .cloned()
            .ok_or_else(|| Error::VersionNotFound {
                package: self.id.to_string(),
                version: version.to_string(),
            })
    }
}
