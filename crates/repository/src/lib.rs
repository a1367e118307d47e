//! Recursive, concurrent bundle resolution over a CommonJS package registry
//!
//! Given an initial set of packages and version ranges, a [`Repository`]
//! walks a [`webmod_registry::Registry`]: every published version a range
//! matches becomes a [`BundleVersion`], the dependencies those versions
//! declare join the frontier, and the walk repeats until no new version
//! appears. Resolution is total: packages and versions that cannot be
//! loaded are logged and skipped, never fatal.
//!
//! # Overview
//!
//! Resolved versions materialize their artifacts lazily. The first use of
//! a version's `package.json`, distribution tree, descriptor or
//! [`ModuleJar`] pulls the tarball through the repository cache and
//! memoizes the result. The descriptor publishes one capability in the
//! [`WEB_MODULE_NAMESPACE`] and requires the web-module extender, which is
//! how the host's module layer discovers what a resolved version provides.
//!
//! Configuration is a JSON document mapping package names to a range
//! string, an override object or a list of override objects; overrides
//! pin versions and replace the detected module format or entry point.

mod bundle;
mod bundle_version;
mod config;
mod error;
mod jar;
mod repository;
mod resource;

// Re-export error types at crate root
pub use error::{Error, Result};

// Re-export main types
pub use bundle::Bundle;
pub use bundle_version::BundleVersion;
pub use config::{BundleConfig, RepositoryConfig, VersionConfig};
pub use jar::{ModuleJar, bundle_symbolic_name};
pub use repository::Repository;
pub use resource::{
    AttributeValue, Capability, ENTRY_POINT_ATTRIBUTE, EXTENDER_NAME, EXTENDER_NAMESPACE,
    EXTENDER_VERSION, EXTENDER_VERSION_ATTRIBUTE, FORMAT_ATTRIBUTE, HostVersion, ID_ATTRIBUTE,
    ModuleResource, PRE_RELEASE_TAG, RELEASE_TAG, RESOURCE_ROOT, RESOURCE_ROOT_ATTRIBUTE,
    Requirement, VERSION_ATTRIBUTE, WEB_MODULE_NAMESPACE,
};
