//! Error types for registry, cache and archive operations

// Rust 1.92 compiler bug: false positives for thiserror/miette derive macro fields
// https://github.com/rust-lang/rust/issues/147648
#![allow(unused_assignments)]

use miette::Diagnostic;
use std::path::Path;
use thiserror::Error;

/// Error type for registry, cache and archive operations
#[derive(Error, Debug, Diagnostic)]
pub enum Error {
    /// I/O error during cache or archive operations
    #[error("I/O {operation} failed{}", path.as_ref().map_or(String::new(), |p| format!(": {}", p.display())))]
    #[diagnostic(
        code(webmod::registry::io),
        help("Check file permissions and ensure the path exists")
    )]
    Io {
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
        /// Path that caused the error, if available
        path: Option<Box<Path>>,
        /// Operation that failed (e.g., "read", "write", "publish")
        operation: String,
    },

    /// A registry document did not have the expected shape
    #[error("malformed registry document for {context}: {message}")]
    #[diagnostic(
        code(webmod::registry::document),
        help("The registry served metadata this client cannot interpret")
    )]
    Document {
        /// What was being parsed (package, version)
        context: String,
        /// What was wrong with the document
        message: String,
    },

    /// A registry document failed to deserialize
    #[error("invalid JSON for {context}")]
    #[diagnostic(code(webmod::registry::json))]
    Json {
        /// The underlying deserialization error
        #[source]
        source: serde_json::Error,
        /// What was being parsed (package, version)
        context: String,
    },

    /// The registry does not know the requested package
    #[error("package not found: {package}")]
    #[diagnostic(code(webmod::registry::package_not_found))]
    PackageNotFound {
        /// The requested package
        package: String,
    },

    /// The registry does not know the requested version of a package
    #[error("version {version} of {package} not found")]
    #[diagnostic(code(webmod::registry::version_not_found))]
    VersionNotFound {
        /// The requested package
        package: String,
        /// The requested version
        version: String,
    },

    /// No resource is available at the requested location
    #[error("no resource at {url}")]
    #[diagnostic(code(webmod::registry::resource_not_found))]
    ResourceNotFound {
        /// The requested location
        url: String,
    },

    /// A tar entry was not present in the archive
    #[error("archive entry not found: {name}")]
    #[diagnostic(
        code(webmod::registry::entry_not_found),
        help("The archive ended before the requested entry was seen")
    )]
    EntryNotFound {
        /// The entry that was searched for
        name: String,
    },

    /// An archive's content did not match its published checksum
    #[error("checksum mismatch: expected {expected}, computed {actual}")]
    #[diagnostic(
        code(webmod::registry::checksum_mismatch),
        help("The archive is corrupt or was tampered with; it must not be used")
    )]
    ChecksumMismatch {
        /// The checksum the registry published
        expected: String,
        /// The checksum computed from the bytes read
        actual: String,
    },

    /// A resource key or entry path would escape the cache
    #[error("unsafe resource path: {path}")]
    #[diagnostic(
        code(webmod::registry::unsafe_path),
        help("Resource paths must stay within the cache directory")
    )]
    UnsafePath {
        /// The offending path
        path: String,
    },

    /// Invalid package identifier
    #[error("invalid package id `{input}`: {reason}")]
    #[diagnostic(code(webmod::registry::package_id))]
    PackageId {
        /// The string that failed to parse
        input: String,
        /// What was wrong with it
        reason: String,
    },

    /// Invalid version or range inside a registry document
    #[error(transparent)]
    #[diagnostic(transparent)]
    Semver(#[from] webmod_semver::Error),
}

impl Error {
    /// Create an I/O error with path context
    #[must_use]
    pub fn io(
        source: std::io::Error,
        path: impl AsRef<Path>,
        operation: impl Into<String>,
    ) -> Self {
        Self::Io {
            source,
            path: Some(path.as_ref().into()),
            operation: operation.into(),
        }
    }

    /// Create an I/O error without path context
    #[must_use]
    pub fn io_no_path(source: std::io::Error, operation: impl Into<String>) -> Self {
        Self::Io {
            source,
            path: None,
            operation: operation.into(),
        }
    }

    /// Create a document shape error
    #[must_use]
    pub fn document(context: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Document {
            context: context.into(),
            message: message.into(),
        }
    }

    /// Create a package id error
    #[must_use]
    pub fn package_id(input: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::PackageId {
            input: input.into(),
            reason: reason.into(),
        }
    }
}

/// Result type for registry, cache and archive operations
pub type Result<T> = std::result::Result<T, Error>;
