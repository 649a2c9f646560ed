use crate::archive_common::{ArchiveDescriptor, ArchiveDescriptorReader, ExtraData};
use crate::compression::CompressionMethod;
use crate::constants::{
    DEFAULT_FLAGS, FILE_HEADER_BASE_SIZE, LOCAL_FILE_HEADER_SIGNATURE, VERSION_DEFAULT,
};
use crate::error::ArchiveError;
use crate::types::DateTimeCS;

/// Local file header, written right before each entry payload.
///
/// The streaming writer always leaves crc and sizes at zero and sets the data descriptor flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalFileHeader {
    pub version_needed: u16,
    pub flags: u16,
    pub compression: CompressionMethod,
    pub mtime: DateTimeCS,
    pub crc: u32,
    pub compressed_size: u32,
    pub size: u32,
    pub filename: String,
    pub extra: ExtraData,
}

impl Default for LocalFileHeader {
    fn default() -> Self {
        Self {
            version_needed: VERSION_DEFAULT as u16,
            flags: DEFAULT_FLAGS,
            compression: CompressionMethod::Store,
            mtime: DateTimeCS::default(),
            crc: 0,
            compressed_size: 0,
            size: 0,
            filename: String::new(),
            extra: ExtraData::new(),
        }
    }
}

impl LocalFileHeader {
    pub fn encoded_len(&self) -> usize {
        FILE_HEADER_BASE_SIZE + self.filename.len() + self.extra.encoded_len()
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut descriptor = ArchiveDescriptor::new(self.encoded_len());
        let (date, time) = self.mtime.ms_dos();

        descriptor.write_u32(LOCAL_FILE_HEADER_SIGNATURE);
        descriptor.write_u16(self.version_needed);
        descriptor.write_u16(self.flags);
        descriptor.write_u16(self.compression.code());
        descriptor.write_u16(time);
        descriptor.write_u16(date);
        descriptor.write_u32(self.crc);
        descriptor.write_u32(self.compressed_size);
        descriptor.write_u32(self.size);
        descriptor.write_u16(self.filename.len() as u16);
        descriptor.write_u16(self.extra.encoded_len() as u16);
        descriptor.write_bytes(self.filename.as_bytes());
        self.extra.write(&mut descriptor);

        descriptor.finish()
    }

    pub fn decode(bytes: &[u8], offset: usize) -> Result<(Self, usize), ArchiveError> {
        let stream = bytes.get(offset..).unwrap_or_default();
        let mut indexer = ArchiveDescriptorReader::new(stream, "local file header");

        indexer.expect_signature(LOCAL_FILE_HEADER_SIGNATURE)?;
        let version_needed = indexer.read_u16()?;
        let flags = indexer.read_u16()?;
        let compression = CompressionMethod::from_code(indexer.read_u16()?);
        let time = indexer.read_u16()?;
        let date = indexer.read_u16()?;
        let crc = indexer.read_u32()?;
        let compressed_size = indexer.read_u32()?;
        let size = indexer.read_u32()?;
        let filename_len = indexer.read_u16()? as usize;
        let extra_len = indexer.read_u16()? as usize;
        let filename = indexer.read_utf8_string(filename_len)?;
        let extra = ExtraData::decode(&indexer.read_bytes(extra_len)?)?;

        let header = LocalFileHeader {
            version_needed,
            flags,
            compression,
            mtime: DateTimeCS::from_msdos(date, time),
            crc,
            compressed_size,
            size,
            filename,
            extra,
        };

        Ok((header, indexer.index()))
    }

    /// Total header length (fixed part, name and extra) read from the fixed 30 bytes alone.
    pub fn header_length(fixed: &[u8]) -> Result<usize, ArchiveError> {
        let mut indexer = ArchiveDescriptorReader::new(fixed, "local file header");

        indexer.expect_signature(LOCAL_FILE_HEADER_SIGNATURE)?;
        indexer.set_index(FILE_HEADER_BASE_SIZE - 4);
        let filename_len = indexer.read_u16()? as usize;
        let extra_len = indexer.read_u16()? as usize;

        Ok(FILE_HEADER_BASE_SIZE + filename_len + extra_len)
    }
}
