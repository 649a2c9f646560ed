use crate::archive_common::{ArchiveDescriptor, ArchiveDescriptorReader};
use crate::constants::{DATA_DESCRIPTOR_SIGNATURE, DESCRIPTOR_SIZE, ZIP64_DESCRIPTOR_SIZE};
use crate::error::ArchiveError;

/// Trailer carrying crc and sizes after a streamed payload.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DataDescriptor {
    pub crc: u32,
    pub compressed_size: u64,
    pub size: u64,
}

impl DataDescriptor {
    pub fn encoded_len(zip64: bool) -> usize {
        if zip64 {
            ZIP64_DESCRIPTOR_SIZE
        } else {
            DESCRIPTOR_SIZE
        }
    }

    /// 16 bytes with 32-bit sizes, or 24 bytes with 64-bit sizes. The signature is always written.
    pub fn encode(&self, zip64: bool) -> Vec<u8> {
        let mut descriptor = ArchiveDescriptor::new(Self::encoded_len(zip64));

        descriptor.write_u32(DATA_DESCRIPTOR_SIGNATURE);
        descriptor.write_u32(self.crc);
        if zip64 {
            descriptor.write_u64(self.compressed_size);
            descriptor.write_u64(self.size);
        } else {
            descriptor.write_u32(self.compressed_size.min(u32::MAX as u64) as u32);
            descriptor.write_u32(self.size.min(u32::MAX as u64) as u32);
        }

        descriptor.finish()
    }

    /// The signature is optional: it is assumed present only when the buffer holds the full
    /// signed form and starts with it.
    pub fn decode(bytes: &[u8], offset: usize, zip64: bool) -> Result<(Self, usize), ArchiveError> {
        let stream = bytes.get(offset..).unwrap_or_default();
        let mut indexer = ArchiveDescriptorReader::new(stream, "data descriptor");

        let signed_len = Self::encoded_len(zip64);
        let signed = stream.len() >= signed_len
            && stream[..4] == DATA_DESCRIPTOR_SIGNATURE.to_le_bytes();
        if signed {
            indexer.read_u32()?;
        }

        let crc = indexer.read_u32()?;
        let (compressed_size, size) = if zip64 {
            (indexer.read_u64()?, indexer.read_u64()?)
        } else {
            (indexer.read_u32()? as u64, indexer.read_u32()? as u64)
        };

        let descriptor = DataDescriptor {
            crc,
            compressed_size,
            size,
        };

        Ok((descriptor, indexer.index()))
    }
}
