//! Package registry access, caching and archive handling for webmod
//!
//! This crate owns everything between the resolution engine and the bytes a
//! registry serves:
//! - Package identity (optionally scoped names) and module formats
//! - The npm registry document model: package roots, version documents,
//!   distribution archives and published checksums
//! - A fetch-once cache that publishes resources atomically
//! - A streaming tar+gzip reader with SHA-1 integrity verification
//! - An in-memory registry for fixtures and offline tests
//!
//! # Overview
//!
//! The resolution engine talks to the [`Registry`] and [`PackageRoot`]
//! traits only; [`RegistryPackageRoot`] adapts npm's document shape to
//! them and [`StaticRegistry`] serves fixtures. Archive bytes flow through
//! [`TarGzReader`] into the [`Cache`], which keys extracted content by the
//! published checksum when there is one and by name and version otherwise.

mod archive;
mod cache;
mod error;
mod memory;
mod package;
mod registry;

// Re-export error types at crate root
pub use error::{Error, Result};

// Re-export main types
pub use archive::TarGzReader;
pub use cache::{Cache, CacheEntry};
pub use memory::{StaticRegistry, build_tarball, sha1_hex};
pub use package::{ModuleFormat, PackageId};
pub use registry::{Archive, PackageRoot, PackageVersion, Registry, RegistryPackageRoot};
