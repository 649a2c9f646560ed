//! A library for streaming ZIP archives out in one pass and reading their entries back.
//!
//! Writing never seeks: each entry is emitted as a local header, its (optionally deflated)
//! payload and a data descriptor, and the central directory follows the last entry. The output is
//! a lazy sequence of chunks, suitable for a socket or an HTTP response body. Archives that exceed
//! the classic 32-bit limits (4 GiB entries or offsets, 65535 entries) get Zip64 records.
//!
//! Reading works from random access: the end of central directory record is located by scanning
//! the tail of the archive, the central directory lists the entries and each entry payload is
//! streamed from its byte range.
//!
//! The current implementation is based on
//!
//! [PKWARE's APPNOTE.TXT v6.3.10](https://pkware.cachefly.net/webdocs/casestudies/APPNOTE.TXT)
//!
//! Only the store and deflate methods are supported. Encryption and multi-disk archives are not.
//!
//! ## Examples
//! ### [File system](demos/fs.rs)
//!
//!```rust,no_run
//! use streamzip::{
//!     compress::{encode, ArchiveOptions, ZipEntry},
//!     compression::CompressionMethod,
//!     error::ArchiveError,
//! };
//! use tokio::fs::File;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), ArchiveError> {
//!     let entries = vec![
//!         ZipEntry::file("file1.txt", &b"hello\n"[..]).compression(CompressionMethod::Deflate),
//!         ZipEntry::file("file2.txt", &b"world\n"[..]).size(6),
//!         ZipEntry::directory("empty"),
//!     ];
//!
//!     let file = File::create("archive.zip").await?;
//!     encode(entries, ArchiveOptions::default()).write_to(file).await?;
//!
//!     Ok(())
//! }
//!```
//!
//! ### Listing and extracting
//!
//!```rust,no_run
//! use streamzip::{error::ArchiveError, uncompress::ArchiveReader};
//! use tokio::io::AsyncReadExt;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), ArchiveError> {
//!     let archive = ArchiveReader::open("archive.zip").await?;
//!
//!     for entry in archive.list_entries().await? {
//!         if entry.is_directory {
//!             continue;
//!         }
//!         let mut content = Vec::new();
//!         archive.open_entry(&entry).await?.read_to_end(&mut content).await?;
//!         println!("{}: {} bytes", entry.filename, content.len());
//!     }
//!
//!     Ok(())
//! }
//!```

mod constants;

mod archive_common;
pub mod compress;
pub mod compression;
pub mod error;
pub mod spec;
pub mod tools;
pub mod types;
pub mod uncompress;

pub use archive_common::ExtraData;
pub use compress::{encode, encode_source, ArchiveOptions, EntrySource, ZipEntry, ZipStream};
pub use uncompress::{list_entries, open_entry, ArchiveReader, ReadAt, ZipExtractEntry};
