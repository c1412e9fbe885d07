//! # Byte Source Abstractions
//!
//! The byte-stream contract consumed by the decoder framework, plus
//! local-file and in-memory implementations.
//!
//! A [`ByteSource`] is an openable, closeable, optionally seekable byte
//! stream with an associated [`SourceLocator`] and an optional declared
//! content type. Codec plugins read from it through a cloneable
//! [`SharedByteSource`] handle, which is what makes the resolver's
//! reclaim-on-failed-open behavior possible: when a candidate decoder
//! fails to open, dropping it releases every handle clone and the
//! resolver recovers exclusive ownership of the source for the next
//! candidate.

use crate::error::{DecodeError, Result};
use bytes::Bytes;
use parking_lot::Mutex;
use std::fmt;
use std::fs::File;
use std::io::{self, Cursor, Read, Seek, SeekFrom};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

/// Location of an audio source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceLocator {
    /// Audio file stored locally on the filesystem.
    LocalFile {
        /// Path to the audio file
        path: PathBuf,
    },

    /// Audio resource identified by a URL.
    Remote {
        /// Full URL to the audio resource
        url: String,
    },
}

impl SourceLocator {
    /// The lowercase path extension of this locator, if present.
    ///
    /// For URLs, query strings and fragments are stripped before the
    /// extension of the last path segment is taken.
    pub fn extension(&self) -> Option<String> {
        match self {
            SourceLocator::LocalFile { path } => path
                .extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| ext.to_ascii_lowercase()),
            SourceLocator::Remote { url } => {
                let path = url
                    .split(|c| c == '?' || c == '#')
                    .next()
                    .unwrap_or(url.as_str());
                let segment = path.rsplit('/').next().unwrap_or(path);
                segment
                    .rsplit_once('.')
                    .map(|(_, ext)| ext)
                    .filter(|ext| !ext.is_empty())
                    .map(|ext| ext.to_ascii_lowercase())
            }
        }
    }
}

impl fmt::Display for SourceLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceLocator::LocalFile { path } => write!(f, "{}", path.display()),
            SourceLocator::Remote { url } => write!(f, "{}", url),
        }
    }
}

/// An openable, closeable, seekable byte stream.
///
/// This is the contract the decoder framework consumes; the concrete
/// I/O (filesystem, memory, network) lives behind it. Reading or
/// seeking a source that is not open is an `io::Error`, never a panic.
///
/// `declared_mime_type` is an optional capability: sources that know
/// their content type (e.g. from an HTTP response header) may report
/// it, and the resolver will prefer it over the locator's extension.
/// The default implementation reports none.
pub trait ByteSource: Send {
    /// Returns `true` if the source is open.
    fn is_open(&self) -> bool;

    /// Open the source. Opening an already-open source is a no-op.
    fn open(&mut self) -> Result<()>;

    /// Close the source. Closing an already-closed source is a no-op.
    fn close(&mut self) -> Result<()>;

    /// The locator this source was created from, if any.
    fn locator(&self) -> Option<&SourceLocator>;

    /// The content type declared by the source itself, if known.
    fn declared_mime_type(&self) -> Option<String> {
        None
    }

    /// Read bytes from the current position.
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    /// Seek to a position in the stream.
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64>;

    /// Returns `true` if the source supports seeking.
    fn supports_seeking(&self) -> bool;

    /// Total length in bytes, if known.
    fn len(&self) -> Option<u64>;
}

fn not_open_error() -> io::Error {
    io::Error::new(io::ErrorKind::NotConnected, "byte source is not open")
}

/// A byte source backed by a local file, opened lazily.
pub struct FileSource {
    path: PathBuf,
    locator: SourceLocator,
    file: Option<File>,
    len: Option<u64>,
}

impl FileSource {
    /// Create a source for the given path. The file is not opened
    /// until [`ByteSource::open`] is called.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self {
            locator: SourceLocator::LocalFile { path: path.clone() },
            path,
            file: None,
            len: None,
        }
    }
}

impl ByteSource for FileSource {
    fn is_open(&self) -> bool {
        self.file.is_some()
    }

    fn open(&mut self) -> Result<()> {
        if self.file.is_some() {
            debug!(path = %self.path.display(), "open() called on a source that is already open");
            return Ok(());
        }

        let file = File::open(&self.path).map_err(|e| {
            DecodeError::Source(format!("failed to open {}: {}", self.path.display(), e))
        })?;
        self.len = file.metadata().ok().map(|m| m.len());
        self.file = Some(file);
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.file = None;
        Ok(())
    }

    fn locator(&self) -> Option<&SourceLocator> {
        Some(&self.locator)
    }

    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.file.as_mut() {
            Some(file) => file.read(buf),
            None => Err(not_open_error()),
        }
    }

    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        match self.file.as_mut() {
            Some(file) => file.seek(pos),
            None => Err(not_open_error()),
        }
    }

    fn supports_seeking(&self) -> bool {
        true
    }

    fn len(&self) -> Option<u64> {
        self.len
    }
}

/// A byte source backed by an in-memory buffer.
///
/// Useful for pre-fetched data and for tests. An optional locator and
/// declared MIME type can be attached so resolution works the same way
/// it does for file-backed sources.
pub struct MemorySource {
    cursor: Cursor<Bytes>,
    open: bool,
    locator: Option<SourceLocator>,
    mime_type: Option<String>,
}

impl MemorySource {
    /// Create a source over the given bytes.
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self {
            cursor: Cursor::new(data.into()),
            open: false,
            locator: None,
            mime_type: None,
        }
    }

    /// Attach a locator, enabling extension-based resolution.
    pub fn with_locator(mut self, locator: SourceLocator) -> Self {
        self.locator = Some(locator);
        self
    }

    /// Declare the content type of the data.
    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }
}

impl ByteSource for MemorySource {
    fn is_open(&self) -> bool {
        self.open
    }

    fn open(&mut self) -> Result<()> {
        if self.open {
            debug!("open() called on a source that is already open");
            return Ok(());
        }
        self.cursor.set_position(0);
        self.open = true;
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.open = false;
        Ok(())
    }

    fn locator(&self) -> Option<&SourceLocator> {
        self.locator.as_ref()
    }

    fn declared_mime_type(&self) -> Option<String> {
        self.mime_type.clone()
    }

    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if !self.open {
            return Err(not_open_error());
        }
        self.cursor.read(buf)
    }

    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        if !self.open {
            return Err(not_open_error());
        }
        self.cursor.seek(pos)
    }

    fn supports_seeking(&self) -> bool {
        true
    }

    fn len(&self) -> Option<u64> {
        Some(self.cursor.get_ref().len() as u64)
    }
}

/// Cloneable handle to a [`ByteSource`] with exclusive-ownership
/// recovery.
///
/// The framework hands clones of one handle to the decoder backend and
/// the [`Decoder`](crate::Decoder) that owns it; `std::io::Read` and
/// `std::io::Seek` are implemented on the handle so codec crates can
/// feed it straight into their demuxers. [`SharedByteSource::try_unwrap`]
/// recovers the boxed source once every other clone has been dropped,
/// which is how a failed decoder hands its source back to the resolver.
#[derive(Clone)]
pub struct SharedByteSource {
    inner: Arc<Mutex<Box<dyn ByteSource>>>,
}

impl SharedByteSource {
    /// Wrap a byte source in a shared handle.
    pub fn new(source: Box<dyn ByteSource>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(source)),
        }
    }

    /// Returns `true` if the underlying source is open.
    pub fn is_open(&self) -> bool {
        self.inner.lock().is_open()
    }

    /// Open the underlying source.
    pub fn open(&self) -> Result<()> {
        self.inner.lock().open()
    }

    /// Close the underlying source.
    pub fn close(&self) -> Result<()> {
        self.inner.lock().close()
    }

    /// The underlying source's locator, cloned out of the handle.
    pub fn locator(&self) -> Option<SourceLocator> {
        self.inner.lock().locator().cloned()
    }

    /// The underlying source's declared content type, if any.
    pub fn declared_mime_type(&self) -> Option<String> {
        self.inner.lock().declared_mime_type()
    }

    /// Returns `true` if the underlying source supports seeking.
    pub fn supports_seeking(&self) -> bool {
        self.inner.lock().supports_seeking()
    }

    /// Total length of the underlying source in bytes, if known.
    pub fn len(&self) -> Option<u64> {
        self.inner.lock().len()
    }

    /// Recover exclusive ownership of the source.
    ///
    /// Fails (returning the handle unchanged) if any other clone is
    /// still alive.
    pub fn try_unwrap(self) -> std::result::Result<Box<dyn ByteSource>, SharedByteSource> {
        match Arc::try_unwrap(self.inner) {
            Ok(mutex) => Ok(mutex.into_inner()),
            Err(inner) => Err(SharedByteSource { inner }),
        }
    }
}

impl Read for SharedByteSource {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.lock().read(buf)
    }
}

impl Seek for SharedByteSource {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.inner.lock().seek(pos)
    }
}
