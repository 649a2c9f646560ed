use std::ops::RangeInclusive;
use std::path::Path;

use async_compression::tokio::bufread::DeflateDecoder;
use chrono::{DateTime, Utc};
use tokio::io::BufReader;

use crate::archive_common::ArchiveDescriptorReader;
use crate::compression::CompressionMethod;
use crate::constants::{FILE_HEADER_BASE_SIZE, ZIP64_BYTES_THR};
use crate::error::ArchiveError;
use crate::spec::{CentralDirectoryHeader, EndOfCentralDirectory, LocalFileHeader, Zip64ExtraField};

use super::locator::find_end_of_central_directory;
use super::read_at::{read_fully_at, EntryReader, LocalFileReader, ReadAt};

/// An entry as listed from the central directory, with the location of its payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZipExtractEntry {
    pub filename: String,
    pub mtime: DateTime<Utc>,
    pub compression: CompressionMethod,
    pub is_directory: bool,
    /// First byte of the compressed payload, 0 when the payload is empty.
    pub start: u64,
    /// Last byte of the compressed payload (inclusive), 0 when the payload is empty.
    pub end: u64,
    pub size: u64,
    pub compressed_size: u64,
    pub crc: u32,
}

impl ZipExtractEntry {
    /// `None` for empty payloads.
    pub fn byte_range(&self) -> Option<RangeInclusive<u64>> {
        (self.compressed_size > 0).then_some(self.start..=self.end)
    }
}

/// Replaces sentinel values with those of the Zip64 extra field and drops the field.
///
/// A payload holding the three 64-bit values overrides them all. A shorter one only holds the
/// values whose 32-bit field is a sentinel, in size, compressed size, offset order.
pub fn resolve_zip64_extra(header: &mut CentralDirectoryHeader) -> Result<(), ArchiveError> {
    let data = match header.extra.remove(Zip64ExtraField::HEADER_ID) {
        Some(data) => data,
        None => return Ok(()),
    };

    if data.len() >= 24 {
        let field = Zip64ExtraField::decode(&data)?;
        header.size = field.size;
        header.compressed_size = field.compressed_size;
        header.offset = field.offset;
        return Ok(());
    }

    let mut indexer = ArchiveDescriptorReader::new(&data, "zip64 extra field");
    if header.size == ZIP64_BYTES_THR {
        header.size = indexer.read_u64()?;
    }
    if header.compressed_size == ZIP64_BYTES_THR {
        header.compressed_size = indexer.read_u64()?;
    }
    if header.offset == ZIP64_BYTES_THR {
        header.offset = indexer.read_u64()?;
    }

    Ok(())
}

/// Lazily decodes the back to back headers of a central directory buffer.
///
/// Stops after the first error.
pub struct CentralDirectoryIter<'a> {
    bytes: &'a [u8],
    offset: usize,
    failed: bool,
}

impl<'a> Iterator for CentralDirectoryIter<'a> {
    type Item = Result<CentralDirectoryHeader, ArchiveError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.offset >= self.bytes.len() {
            return None;
        }

        let result = CentralDirectoryHeader::decode(self.bytes, self.offset).and_then(
            |(mut header, length)| {
                self.offset += length;
                resolve_zip64_extra(&mut header)?;
                Ok(header)
            },
        );
        self.failed = result.is_err();

        Some(result)
    }
}

pub fn parse_central_directory(bytes: &[u8]) -> CentralDirectoryIter<'_> {
    CentralDirectoryIter {
        bytes,
        offset: 0,
        failed: false,
    }
}

/// Reads and decodes the central directory described by `end`.
pub async fn central_directory<R: ReadAt + ?Sized>(
    reader: &R,
    end: &EndOfCentralDirectory,
) -> Result<Vec<CentralDirectoryHeader>, ArchiveError> {
    let truncated = || {
        ArchiveError::bad_structure(format!(
            "Central directory is truncated: {} bytes declared at offset {}, archive is {} bytes",
            end.cd_length,
            end.data_length,
            reader.size()
        ))
    };

    let within_file = end
        .data_length
        .checked_add(end.cd_length)
        .map_or(false, |cd_end| cd_end <= reader.size());
    if !within_file {
        return Err(truncated());
    }

    let bytes = read_fully_at(reader, end.data_length, end.cd_length as usize).await?;
    if (bytes.len() as u64) < end.cd_length {
        return Err(truncated());
    }

    let headers = parse_central_directory(&bytes).collect::<Result<Vec<_>, _>>()?;
    if headers.len() as u64 != end.files_count {
        log::warn!(
            "central directory holds {} headers, end record declares {}",
            headers.len(),
            end.files_count
        );
    }

    Ok(headers)
}

async fn resolve_entry<R: ReadAt + ?Sized>(
    reader: &R,
    header: CentralDirectoryHeader,
) -> Result<ZipExtractEntry, ArchiveError> {
    let fixed = read_fully_at(reader, header.offset, FILE_HEADER_BASE_SIZE).await?;
    if fixed.len() < FILE_HEADER_BASE_SIZE {
        return Err(ArchiveError::truncated(
            "local file header",
            FILE_HEADER_BASE_SIZE,
            fixed.len(),
        ));
    }
    let header_length = LocalFileHeader::header_length(&fixed)? as u64;

    let (start, end) = if header.compressed_size == 0 {
        (0, 0)
    } else {
        let start = header.offset + header_length;
        let end = start
            .checked_add(header.compressed_size - 1)
            .filter(|end| *end < reader.size())
            .ok_or_else(|| {
                ArchiveError::bad_structure(format!(
                    "Entry '{}' extends past the end of the archive",
                    header.filename
                ))
            })?;
        (start, end)
    };

    Ok(ZipExtractEntry {
        is_directory: header.is_directory(),
        mtime: header.mtime.to_datetime(),
        compression: header.compression,
        start,
        end,
        size: header.size,
        compressed_size: header.compressed_size,
        crc: header.crc,
        filename: header.filename,
    })
}

async fn list_entries_with<R: ReadAt + ?Sized>(
    reader: &R,
    strict: bool,
) -> Result<Vec<ZipExtractEntry>, ArchiveError> {
    let end = find_end_of_central_directory(reader, strict).await?;
    let headers = central_directory(reader, &end).await?;

    let mut entries = Vec::with_capacity(headers.len());
    for header in headers {
        entries.push(resolve_entry(reader, header).await?);
    }

    Ok(entries)
}

/// Lists the entries of an archive, in central directory order.
pub async fn list_entries<R: ReadAt + ?Sized>(
    reader: &R,
) -> Result<Vec<ZipExtractEntry>, ArchiveError> {
    list_entries_with(reader, true).await
}

/// Opens the decompressed payload of a listed entry.
pub async fn open_entry<R: ReadAt + ?Sized>(
    reader: &R,
    entry: &ZipExtractEntry,
) -> Result<EntryReader, ArchiveError> {
    if entry.is_directory {
        return Err(ArchiveError::EntryIsDirectory(entry.filename.clone()));
    }
    if !entry.compression.is_supported() {
        return Err(ArchiveError::UnsupportedCompressionMethod(entry.compression));
    }

    let raw = match entry.byte_range() {
        Some(range) => {
            reader
                .open_range(*range.start(), range.end() - range.start() + 1)
                .await?
        }
        None => return Ok(Box::new(tokio::io::empty())),
    };

    match entry.compression {
        CompressionMethod::Store => Ok(raw),
        CompressionMethod::Deflate => Ok(Box::new(DeflateDecoder::new(BufReader::new(raw)))),
        other => Err(ArchiveError::UnsupportedCompressionMethod(other)),
    }
}

/// Entry listing and extraction over a [`ReadAt`] source.
pub struct ArchiveReader<R: ReadAt> {
    reader: R,
    strict: bool,
}

impl<R: ReadAt> ArchiveReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            strict: true,
        }
    }

    /// Zip64 consistency checks, on by default.
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn get_ref(&self) -> &R {
        &self.reader
    }

    pub fn into_inner(self) -> R {
        self.reader
    }

    pub async fn end_of_central_directory(&self) -> Result<EndOfCentralDirectory, ArchiveError> {
        find_end_of_central_directory(&self.reader, self.strict).await
    }

    pub async fn central_directory(&self) -> Result<Vec<CentralDirectoryHeader>, ArchiveError> {
        let end = self.end_of_central_directory().await?;
        central_directory(&self.reader, &end).await
    }

    pub async fn list_entries(&self) -> Result<Vec<ZipExtractEntry>, ArchiveError> {
        list_entries_with(&self.reader, self.strict).await
    }

    pub async fn open_entry(&self, entry: &ZipExtractEntry) -> Result<EntryReader, ArchiveError> {
        open_entry(&self.reader, entry).await
    }
}

impl ArchiveReader<LocalFileReader> {
    pub async fn open<P: AsRef<Path>>(path: P) -> Result<Self, ArchiveError> {
        Ok(Self::new(LocalFileReader::open(path).await?))
    }
}
