//! Streaming archive writer.
//!
//! Entries are pulled one at a time from an [`EntrySource`] and turned into a lazy sequence of
//! byte chunks: local header, payload, data descriptor for every file entry, then the central
//! directory and the end records. Nothing is written ahead of the consumer, so the archive can be
//! sent over a socket or an HTTP body as it is produced.
//!
//! Entry layout decisions:
//!
//! | | Local file header | Data descriptor | Central directory header |
//! |---|---|---|---|
//! | size unknown or >= u32::MAX, or offset >= u32::MAX | zeroed Zip64 extra field, version 4.5 | Zip64 form (24 bytes) | sentinels + Zip64 extra field |
//! | otherwise | no extra field | 32-bit form (16 bytes) | plain values |
//! | directory | no extra field | none | plain values |
//!
//! A file declared below 4 GiB that turns out larger fails the archive.
//!
//! The archive gets a Zip64 end of central directory record and locator when the central
//! directory offset or length is >= u32::MAX, or when it holds 0xFFFF entries or more.

pub mod archive;
mod write_wrapper;

use async_trait::async_trait;
use tokio::io::AsyncRead;
use tokio::sync::mpsc::Receiver;

use crate::compression::{CompressionMethod, Level};
use crate::constants::MAX_COMMENT_SIZE;
use crate::types::FileDateTime;

pub use archive::ZipStream;
pub use write_wrapper::AsyncWriteWrapper;

/// Payload of a file entry.
pub type EntryStream = Box<dyn AsyncRead + Unpin + Send>;

/// An entry to be archived.
pub struct ZipEntry {
    /// Path inside the archive, `/` separated. Directories get a trailing `/` if missing.
    pub filename: String,
    pub mtime: FileDateTime,
    pub is_directory: bool,
    /// Defaults to store.
    pub compression: Option<CompressionMethod>,
    /// Declared uncompressed size. Unknown or large sizes reserve room for Zip64 values.
    pub size: Option<u64>,
    /// Required for files, ignored for directories.
    pub stream: Option<EntryStream>,
}

impl ZipEntry {
    pub fn file<S, R>(filename: S, stream: R) -> Self
    where
        S: Into<String>,
        R: AsyncRead + Unpin + Send + 'static,
    {
        Self {
            filename: filename.into(),
            mtime: FileDateTime::Now,
            is_directory: false,
            compression: None,
            size: None,
            stream: Some(Box::new(stream)),
        }
    }

    pub fn directory<S: Into<String>>(filename: S) -> Self {
        Self {
            filename: filename.into(),
            mtime: FileDateTime::Now,
            is_directory: true,
            compression: None,
            size: None,
            stream: None,
        }
    }

    /// Set the last modified time
    ///
    /// The default is the current timestamp
    pub fn mtime(mut self, mtime: FileDateTime) -> Self {
        self.mtime = mtime;
        self
    }

    pub fn compression(mut self, method: CompressionMethod) -> Self {
        self.compression = Some(method);
        self
    }

    /// Declare the uncompressed size when it is known up front.
    ///
    /// Entries declared below 4 GiB skip the Zip64 extra field in their local header.
    pub fn size(mut self, size: u64) -> Self {
        self.size = Some(size);
        self
    }

    pub fn stream<R: AsyncRead + Unpin + Send + 'static>(mut self, stream: R) -> Self {
        self.stream = Some(Box::new(stream));
        self
    }
}

impl std::fmt::Debug for ZipEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ZipEntry")
            .field("filename", &self.filename)
            .field("mtime", &self.mtime)
            .field("is_directory", &self.is_directory)
            .field("compression", &self.compression)
            .field("size", &self.size)
            .field("stream", &self.stream.as_ref().map(|_| ".."))
            .finish()
    }
}

/// Archive wide settings.
#[derive(Debug, Clone, Default)]
pub struct ArchiveOptions {
    /// Archive comment, at most 0xFFFF bytes.
    pub comments: Vec<u8>,
    /// Deflate level. `Level::None` writes deflate entries as stored.
    pub compression_level: Level,
}

impl ArchiveOptions {
    /// Set ZIP archive comment.
    ///
    /// The comment is typically expected to be encoded in UTF-8. It is truncated to 0xFFFF bytes.
    pub fn comments<C: AsRef<[u8]>>(mut self, comments: C) -> Self {
        let bytes = comments.as_ref();
        let len = std::cmp::min(bytes.len(), MAX_COMMENT_SIZE);
        self.comments = bytes[..len].to_owned();
        self
    }

    pub fn compression_level(mut self, level: Level) -> Self {
        self.compression_level = level;
        self
    }
}

/// Produces the entries of an archive, possibly asynchronously.
#[async_trait]
pub trait EntrySource: Send {
    async fn next_entry(&mut self) -> Option<ZipEntry>;
}

/// Adapts a plain iterator.
pub struct IterSource<I>(I);

#[async_trait]
impl<I> EntrySource for IterSource<I>
where
    I: Iterator<Item = ZipEntry> + Send,
{
    async fn next_entry(&mut self) -> Option<ZipEntry> {
        self.0.next()
    }
}

/// Entries sent from another task; the archive ends when every sender is dropped.
#[async_trait]
impl EntrySource for Receiver<ZipEntry> {
    async fn next_entry(&mut self) -> Option<ZipEntry> {
        self.recv().await
    }
}

/// Encodes a synchronous sequence of entries.
pub fn encode<I>(entries: I, options: ArchiveOptions) -> ZipStream<IterSource<I::IntoIter>>
where
    I: IntoIterator<Item = ZipEntry>,
    I::IntoIter: Send,
{
    ZipStream::new(IterSource(entries.into_iter()), options)
}

/// Encodes entries produced by any source, such as a channel.
pub fn encode_source<S: EntrySource>(source: S, options: ArchiveOptions) -> ZipStream<S> {
    ZipStream::new(source, options)
}
