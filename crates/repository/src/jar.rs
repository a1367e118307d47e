//! Packaging hand-off for resolved module versions.
//!
//! A [`ModuleJar`] gathers everything the bundle packaging step needs to
//! assemble one host bundle: the derived symbolic name, the converted
//! version, the descriptor and the extracted distribution tree on disk.

use crate::resource::{HostVersion, ModuleResource};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use webmod_registry::{ModuleFormat, PackageId};

/// Everything needed to package one resolved version as a host bundle.
#[derive(Debug, Clone)]
pub struct ModuleJar {
    symbolic_name: String,
    version: HostVersion,
    resource: Arc<ModuleResource>,
    dist: PathBuf,
}

impl ModuleJar {
    pub(crate) fn new(
        prefix: &str,
        id: &PackageId,
        format: ModuleFormat,
        version: HostVersion,
        resource: Arc<ModuleResource>,
        dist: PathBuf,
    ) -> Self {
        Self {
            symbolic_name: bundle_symbolic_name(prefix, id, format),
            version,
            resource,
            dist,
        }
    }

    /// The symbolic name of the bundle to assemble.
    #[must_use]
    pub fn symbolic_name(&self) -> &str {
        &self.symbolic_name
    }

    /// The bundle version, in the host scheme.
    #[must_use]
    pub fn version(&self) -> &HostVersion {
        &self.version
    }

    /// The descriptor the bundle manifest is generated from.
    #[must_use]
    pub fn resource(&self) -> &ModuleResource {
        &self.resource
    }

    /// Root of the extracted distribution tree to pack.
    #[must_use]
    pub fn dist(&self) -> &Path {
        &self.dist
    }
}

/// Derive the symbolic name of the bundle packaging a module.
///
/// The package scope and name join with a dot under the repository
/// prefix. Characters the host forbids in symbolic names turn into
/// underscores, with trailing runs dropped, and the module format is
/// appended as the final segment.
#[must_use]
pub fn bundle_symbolic_name(prefix: &str, id: &PackageId, format: ModuleFormat) -> String {
    let joined = match id.scope() {
        Some(scope) => format!("{scope}.{}", id.name()),
        None => id.name().to_string(),
    };
    let mut parts: Vec<&str> = joined
        .split(|c: char| !(c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-')))
        .collect();
    while parts.last() == Some(&"") {
        parts.pop();
    }
    format!("{prefix}.{}.{}", parts.join("_"), format.as_str())
}
