//! Error types for version and range parsing

// Rust 1.92 compiler bug: false positives for thiserror/miette derive macro fields
// https://github.com/rust-lang/rust/issues/147648
#![allow(unused_assignments)]

use miette::Diagnostic;
use thiserror::Error;

/// Error type for version and range operations
#[derive(Error, Debug, Diagnostic)]
pub enum Error {
    /// Malformed semantic version string
    #[error("invalid version `{input}`: {reason}")]
    #[diagnostic(
        code(webmod::semver::version_format),
        help("Expected `[v]major.minor.micro[-pre.release][+build]` with numeric components")
    )]
    VersionFormat {
        /// The string that failed to parse
        input: String,
        /// What was wrong with it
        reason: String,
    },

    /// Malformed range or comparator token
    #[error("invalid range `{input}`: {reason}")]
    #[diagnostic(
        code(webmod::semver::range_format),
        help("Ranges are `||`-separated clauses of whitespace-separated comparators")
    )]
    RangeFormat {
        /// The string that failed to parse
        input: String,
        /// What was wrong with it
        reason: String,
    },
}

impl Error {
    /// Create a version format error
    #[must_use]
    pub fn version_format(input: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::VersionFormat {
            input: input.into(),
            reason: reason.into(),
        }
    }

    /// Create a range format error
    #[must_use]
    pub fn range_format(input: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::RangeFormat {
            input: input.into(),
            reason: reason.into(),
        }
    }
}

/// Result type for version and range operations
pub type Result<T> = std::result::Result<T, Error>;
