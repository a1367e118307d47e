//! Error types for bundle resolution

// Rust 1.92 compiler bug: false positives for thiserror/miette derive macro fields
// https://github.com/rust-lang/rust/issues/147648
#![allow(unused_assignments)]

use miette::Diagnostic;
use thiserror::Error;

/// Error type for bundle resolution
#[derive(Error, Debug, Diagnostic)]
pub enum Error {
    /// The initial dependency document failed to deserialize
    #[error("invalid bundle configuration document")]
    #[diagnostic(
        code(webmod::repository::config),
        help("The document maps package names to a range string, an override object or a list of override objects")
    )]
    Config {
        /// The underlying deserialization error
        #[source]
        source: serde_json::Error,
    },

    /// A package metadata document failed to deserialize
    #[error("invalid package metadata for {package}@{version}")]
    #[diagnostic(code(webmod::repository::metadata))]
    Metadata {
        /// The package whose metadata was unreadable
        package: String,
        /// The version whose metadata was unreadable
        version: String,
        /// The underlying deserialization error
        #[source]
        source: serde_json::Error,
    },

    /// A package version published no archive of the required type
    #[error("no {kind} archive published for {package}@{version}")]
    #[diagnostic(
        code(webmod::repository::missing_archive),
        help("Only packages distributed as archives can be materialized")
    )]
    MissingArchive {
        /// The package missing the archive
        package: String,
        /// The version missing the archive
        version: String,
        /// The archive type that was required
        kind: String,
    },

    /// A registry, cache or archive operation failed
    #[error(transparent)]
    #[diagnostic(transparent)]
    Registry(#[from] webmod_registry::Error),

    /// A version or range failed to parse
    #[error(transparent)]
    #[diagnostic(transparent)]
    Semver(#[from] webmod_semver::Error),
}

impl Error {
    /// Create a metadata parse error with package context
    #[must_use]
    pub fn metadata(
        package: impl Into<String>,
        version: impl Into<String>,
        source: serde_json::Error,
    ) -> Self {
        Self::Metadata {
            package: package.into(),
            version: version.into(),
            source,
        }
    }

    /// Create a missing archive error
    #[must_use]
    pub fn missing_archive(
        package: impl Into<String>,
        version: impl Into<String>,
        kind: impl Into<String>,
    ) -> Self {
        Self::MissingArchive {
            package: package.into(),
            version: version.into(),
            kind: kind.into(),
        }
    }
}

/// Result type for bundle resolution
pub type Result<T> = std::result::Result<T, Error>;
