use crate::archive_common::{ArchiveDescriptor, ArchiveDescriptorReader, ExtraData};
use crate::compression::CompressionMethod;
use crate::constants::{
    CENTRAL_DIRECTORY_ENTRY_BASE_SIZE, CENTRAL_DIRECTORY_ENTRY_SIGNATURE, DEFAULT_FLAGS,
    DOS_DIRECTORY_ATTRIBUTE, VERSION_DEFAULT, VERSION_MADE_BY, ZIP64_BYTES_THR,
};
use crate::error::ArchiveError;
use crate::types::DateTimeCS;

use super::Zip64ExtraField;

/// Central directory file header.
///
/// Sizes and offset are kept as full 64-bit values. When encoding, a value that does not fit in
/// 32 bits is written as `0xFFFFFFFF` and must be carried by a Zip64 extra field. Since the extra
/// field always holds all three values, attaching one turns all three 32-bit fields into
/// sentinels, so that readers expecting only the overflowing values in order stay aligned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CentralDirectoryHeader {
    pub version_made_by: u16,
    pub version_needed: u16,
    pub flags: u16,
    pub compression: CompressionMethod,
    pub mtime: DateTimeCS,
    pub crc: u32,
    pub compressed_size: u64,
    pub size: u64,
    /// MS-DOS attributes, low half of the external attributes.
    pub dos_mode: u16,
    /// Unix mode, high half of the external attributes.
    pub unix_mode: u16,
    /// Offset of the local file header.
    pub offset: u64,
    pub filename: String,
    pub extra: ExtraData,
    pub comment: Vec<u8>,
}

impl Default for CentralDirectoryHeader {
    fn default() -> Self {
        Self {
            version_made_by: VERSION_MADE_BY,
            version_needed: VERSION_DEFAULT as u16,
            flags: DEFAULT_FLAGS,
            compression: CompressionMethod::Store,
            mtime: DateTimeCS::default(),
            crc: 0,
            compressed_size: 0,
            size: 0,
            dos_mode: 0,
            unix_mode: 0,
            offset: 0,
            filename: String::new(),
            extra: ExtraData::new(),
            comment: Vec::new(),
        }
    }
}

impl CentralDirectoryHeader {
    /// True when the DOS directory attribute (0x10) is set.
    ///
    /// Also true for names ending with `/`, going beyond the attribute check: some writers only
    /// set unix modes on directories, and APPNOTE 4.3.8 gives them a trailing slash.
    pub fn is_directory(&self) -> bool {
        self.dos_mode & DOS_DIRECTORY_ATTRIBUTE != 0 || self.filename.ends_with('/')
    }

    /// True when size, compressed size or offset cannot be written in 32 bits.
    pub fn overflows_32_bits(&self) -> bool {
        self.size >= ZIP64_BYTES_THR
            || self.compressed_size >= ZIP64_BYTES_THR
            || self.offset >= ZIP64_BYTES_THR
    }

    /// Zip64 extra field carrying the true values of this header.
    pub fn zip64_extra_field(&self) -> Zip64ExtraField {
        Zip64ExtraField {
            size: self.size,
            compressed_size: self.compressed_size,
            offset: self.offset,
        }
    }

    fn extra_with(&self, zip64: Option<&Zip64ExtraField>) -> ExtraData {
        let mut extra = self.extra.clone();
        if let Some(zip64) = zip64 {
            extra.insert(Zip64ExtraField::HEADER_ID, zip64.encode());
        }
        extra
    }

    pub fn encoded_len(&self, zip64: Option<&Zip64ExtraField>) -> usize {
        CENTRAL_DIRECTORY_ENTRY_BASE_SIZE
            + self.filename.len()
            + self.extra_with(zip64).encoded_len()
            + self.comment.len()
    }

    pub(crate) fn write(&self, descriptor: &mut ArchiveDescriptor, zip64: Option<&Zip64ExtraField>) {
        let extra = self.extra_with(zip64);
        let (date, time) = self.mtime.ms_dos();
        let clamp = |value: u64| match zip64 {
            Some(_) => ZIP64_BYTES_THR as u32,
            None => value.min(ZIP64_BYTES_THR) as u32,
        };

        descriptor.write_u32(CENTRAL_DIRECTORY_ENTRY_SIGNATURE);
        descriptor.write_u16(self.version_made_by);
        descriptor.write_u16(self.version_needed);
        descriptor.write_u16(self.flags);
        descriptor.write_u16(self.compression.code());
        descriptor.write_u16(time);
        descriptor.write_u16(date);
        descriptor.write_u32(self.crc);
        descriptor.write_u32(clamp(self.compressed_size));
        descriptor.write_u32(clamp(self.size));
        descriptor.write_u16(self.filename.len() as u16);
        descriptor.write_u16(extra.encoded_len() as u16);
        descriptor.write_u16(self.comment.len() as u16);
        // disk number start
        descriptor.write_u16(0);
        // internal attributes
        descriptor.write_u16(0);
        descriptor.write_u16(self.dos_mode);
        descriptor.write_u16(self.unix_mode);
        descriptor.write_u32(clamp(self.offset));
        descriptor.write_bytes(self.filename.as_bytes());
        extra.write(descriptor);
        descriptor.write_bytes(&self.comment);
    }

    pub fn encode(&self, zip64: Option<&Zip64ExtraField>) -> Vec<u8> {
        let mut descriptor = ArchiveDescriptor::new(self.encoded_len(zip64));
        self.write(&mut descriptor, zip64);
        descriptor.finish()
    }

    /// Decodes one header; a Zip64 extra field is left untouched in `extra`.
    pub fn decode(bytes: &[u8], offset: usize) -> Result<(Self, usize), ArchiveError> {
        let stream = bytes.get(offset..).unwrap_or_default();
        let mut indexer = ArchiveDescriptorReader::new(stream, "central directory header");

        indexer.expect_signature(CENTRAL_DIRECTORY_ENTRY_SIGNATURE)?;
        let version_made_by = indexer.read_u16()?;
        let version_needed = indexer.read_u16()?;
        let flags = indexer.read_u16()?;
        let compression = CompressionMethod::from_code(indexer.read_u16()?);
        let time = indexer.read_u16()?;
        let date = indexer.read_u16()?;
        let crc = indexer.read_u32()?;
        let compressed_size = indexer.read_u32()? as u64;
        let size = indexer.read_u32()? as u64;
        let filename_len = indexer.read_u16()? as usize;
        let extra_len = indexer.read_u16()? as usize;
        let comment_len = indexer.read_u16()? as usize;
        let _disk_number = indexer.read_u16()?;
        let _internal_attributes = indexer.read_u16()?;
        let dos_mode = indexer.read_u16()?;
        let unix_mode = indexer.read_u16()?;
        let header_offset = indexer.read_u32()? as u64;
        let filename = indexer.read_utf8_string(filename_len)?;
        let extra = ExtraData::decode(&indexer.read_bytes(extra_len)?)?;
        let comment = indexer.read_bytes(comment_len)?;

        let header = CentralDirectoryHeader {
            version_made_by,
            version_needed,
            flags,
            compression,
            mtime: DateTimeCS::from_msdos(date, time),
            crc,
            compressed_size,
            size,
            dos_mode,
            unix_mode,
            offset: header_offset,
            filename,
            extra,
            comment,
        };

        Ok((header, indexer.index()))
    }
}
