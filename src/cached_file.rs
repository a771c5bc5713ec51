//! Size-adaptive cached file with a streaming content digest.
//!
//! Files under the buffer threshold are read fully into memory once and can
//! be re-streamed at will without touching the filesystem again; anything at
//! or over the threshold stays on its source and is re-opened per
//! consumption. The representation is fixed at construction.

use std::fs::File;
use std::io::{Cursor, Read};
use std::path::PathBuf;

use md5::{Digest, Md5};

use crate::error::SyncError;

/// Largest file eagerly buffered in memory: 2048 MiB.
pub const MAX_BUFFER_BYTES: u64 = 2048 * 1024 * 1024;

const DIGEST_CHUNK_BYTES: usize = 64 * 1024;

/// Opaque handle to file content: enough to size it and open fresh readers.
pub trait FileSource: Send + Sync {
    /// Human-facing name for diagnostics.
    fn name(&self) -> String;

    /// Size in bytes. Fails with `NotAFile` when the handle does not resolve
    /// to a regular file.
    fn size(&self) -> Result<u64, SyncError>;

    /// Open a fresh reader positioned at the start of the content.
    fn open(&self) -> Result<Box<dyn Read + Send>, SyncError>;
}

impl FileSource for PathBuf {
    fn name(&self) -> String {
        self.display().to_string()
    }

    fn size(&self) -> Result<u64, SyncError> {
        let meta = std::fs::metadata(self)?;
        if !meta.is_file() {
            return Err(SyncError::NotAFile { path: self.clone() });
        }
        Ok(meta.len())
    }

    fn open(&self) -> Result<Box<dyn Read + Send>, SyncError> {
        Ok(Box::new(File::open(self)?))
    }
}

/// Authoritative data representation, chosen irrevocably at construction.
#[derive(Debug)]
enum Repr {
    /// Entire content held in memory; re-readable at will.
    Buffered(Vec<u8>),
    /// Content stays on the source; every consumption re-opens it.
    Streamed,
}

#[derive(Debug)]
pub struct CachedFile<S: FileSource> {
    source: S,
    size: u64,
    repr: Repr,
}

impl<S: FileSource> CachedFile<S> {
    /// Size the source and pick the representation.
    pub fn build(source: S) -> Result<Self, SyncError> {
        let size = source.size()?;
        let repr = if size < MAX_BUFFER_BYTES {
            let mut buf = Vec::with_capacity(size as usize);
            source.open()?.read_to_end(&mut buf)?;
            Repr::Buffered(buf)
        } else {
            Repr::Streamed
        };
        Ok(Self { source, size, repr })
    }

    pub fn name(&self) -> String {
        self.source.name()
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn is_buffered(&self) -> bool {
        matches!(self.repr, Repr::Buffered(_))
    }

    /// The full content as one in-memory buffer.
    ///
    /// Hard contract: fails with `BufferTooLarge` when the file is
    /// stream-backed. Callers handling arbitrary sizes must use
    /// [`read_stream`](Self::read_stream) instead.
    pub fn data(&self) -> Result<&[u8], SyncError> {
        match &self.repr {
            Repr::Buffered(buf) => Ok(buf),
            Repr::Streamed => Err(SyncError::BufferTooLarge {
                size: self.size,
                limit: MAX_BUFFER_BYTES,
            }),
        }
    }

    /// A fresh reader over the content.
    ///
    /// Buffer-backed entries replay from memory; stream-backed entries
    /// re-open the source. Either way each returned reader is independently
    /// consumable, so a digest after a full read sees the same bytes.
    pub fn read_stream(&self) -> Result<Box<dyn Read + Send + '_>, SyncError> {
        match &self.repr {
            Repr::Buffered(buf) => Ok(Box::new(Cursor::new(buf.as_slice()))),
            Repr::Streamed => Ok(self.source.open()?),
        }
    }

    /// Hex-encoded MD5 of the content, fed chunk-by-chunk from a fresh
    /// stream. Never needs the whole file resident at once, and repeated
    /// calls return the same value for the same backing content.
    pub fn digest(&self) -> Result<String, SyncError> {
        let mut reader = self.read_stream()?;
        let mut hasher = Md5::new();
        let mut chunk = vec![0u8; DIGEST_CHUNK_BYTES];
        loop {
            let n = reader.read(&mut chunk)?;
            if n == 0 {
                break;
            }
            hasher.update(&chunk[..n]);
        }
        Ok(format!("{:x}", hasher.finalize()))
    }
}
