//! Streaming tar+gzip reader with integrity verification.
//!
//! Registries publish the SHA-1 of the compressed tarball, so every raw byte
//! pulled from the underlying stream is fed to a running digest before
//! decompression. [`TarGzReader::close`] drains the stream to its end and
//! compares the finalized digest against the published checksum; an archive
//! is never treated as verified without that full comparison.

use crate::error::{Error, Result};
use flate2::read::GzDecoder;
use sha1::{Digest, Sha1};
use std::io::{self, Read};
use std::path::Path;
use tracing::trace;

/// A reader that feeds every byte it yields into a SHA-1 digest.
struct DigestReader<R> {
    inner: R,
    digest: Sha1,
}

impl<R: Read> Read for DigestReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let read = self.inner.read(buf)?;
        self.digest.update(&buf[..read]);
        Ok(read)
    }
}

/// Single-pass reader over a gzip-compressed tar archive.
///
/// The underlying stream can only move forward, so a reader supports one
/// scan: either [`find_entry`](Self::find_entry) or
/// [`extract_files`](Self::extract_files), followed by
/// [`close`](Self::close).
pub struct TarGzReader<R: Read> {
    archive: tar::Archive<GzDecoder<DigestReader<R>>>,
    expected_checksum: Option<String>,
}

impl<R: Read> TarGzReader<R> {
    /// Wrap a raw, still-compressed tarball stream.
    #[must_use]
    pub fn new(reader: R, expected_checksum: Option<String>) -> Self {
        let tap = DigestReader {
            inner: reader,
            digest: Sha1::new(),
        };
        Self {
            archive: tar::Archive::new(GzDecoder::new(tap)),
            expected_checksum,
        }
    }

    /// Scan forward to the named entry and return its content.
    ///
    /// Matching is case-insensitive and ignores a leading `./` on entry
    /// paths. The scan consumes the stream up to the match.
    pub fn find_entry(&mut self, name: &str) -> Result<Vec<u8>> {
        let entries = self
            .archive
            .entries()
            .map_err(|source| Error::io_no_path(source, "read archive"))?;
        for entry in entries {
            let mut entry = entry.map_err(|source| Error::io_no_path(source, "read archive entry"))?;
            let path = entry
                .path()
                .map_err(|source| Error::io_no_path(source, "read entry path"))?
                .to_string_lossy()
                .into_owned();
            let path = path.trim_start_matches("./");
            if path.eq_ignore_ascii_case(name) {
                trace!(entry = path, "found archive entry");
                let mut content = Vec::new();
                entry
                    .read_to_end(&mut content)
                    .map_err(|source| Error::io_no_path(source, "read entry content"))?;
                return Ok(content);
            }
        }
        Err(Error::EntryNotFound {
            name: name.to_string(),
        })
    }

    /// Feed every regular file entry to the consumer.
    ///
    /// Entry paths keep their internal layout with a leading `./` stripped.
    /// Directories, links and other special entries are skipped.
    pub fn extract_files<F>(&mut self, mut consumer: F) -> Result<()>
    where
        F: FnMut(&Path, &[u8]) -> Result<()>,
    {
        let entries = self
            .archive
            .entries()
            .map_err(|source| Error::io_no_path(source, "read archive"))?;
        for entry in entries {
            let mut entry = entry.map_err(|source| Error::io_no_path(source, "read archive entry"))?;
            if !entry.header().entry_type().is_file() {
                continue;
            }
            let path = entry
                .path()
                .map_err(|source| Error::io_no_path(source, "read entry path"))?
                .into_owned();
            let mut content = Vec::new();
            entry
                .read_to_end(&mut content)
                .map_err(|source| Error::io_no_path(source, "read entry content"))?;
            let relative = path.strip_prefix(".").unwrap_or(&path);
            trace!(entry = %relative.display(), size = content.len(), "extracted archive entry");
            consumer(relative, &content)?;
        }
        Ok(())
    }

    /// Verify the published checksum, consuming the reader.
    ///
    /// The remaining raw stream is drained first so the digest covers the
    /// whole archive even when the caller stopped at an early entry. Without
    /// a published checksum this is a no-op.
    pub fn close(self) -> Result<()> {
        let Some(expected) = self.expected_checksum else {
            return Ok(());
        };
        let mut tap = self.archive.into_inner().into_inner();
        io::copy(&mut tap, &mut io::sink())
            .map_err(|source| Error::io_no_path(source, "drain archive"))?;
        let actual = hex::encode(tap.digest.finalize());
        if actual.eq_ignore_ascii_case(&expected) {
            trace!(checksum = %expected, "archive checksum verified");
            Ok(())
        } else {
            Err(Error::ChecksumMismatch {
                expected,
                actual: actual.to_ascii_uppercase(),
            })
        }
    }
}
