//! Random access archive reader.
//!
//! The archive is located from its end: the end of central directory record (and its Zip64
//! counterpart when sentinels are present) gives the position of the central directory, whose
//! headers point at each local header. Payloads are then streamed from their byte ranges.

mod locator;
mod read_at;
mod reader;

pub use locator::{find_end_of_central_directory, EOCD_SEARCH_LENGTH};
pub use read_at::{read_fully_at, EntryReader, LocalFileReader, MemoryReader, ReadAt};
pub use reader::{
    central_directory, list_entries, open_entry, parse_central_directory, resolve_zip64_extra,
    ArchiveReader, CentralDirectoryIter, ZipExtractEntry,
};
