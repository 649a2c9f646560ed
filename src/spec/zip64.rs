use crate::archive_common::{ArchiveDescriptor, ArchiveDescriptorReader, ExtraData};
use crate::constants::{
    HOST_UNIX, VERSION_ZIP64, ZIP64_CENTRAL_DIRECTORY_END_SIGNATURE,
    ZIP64_END_OF_CENTRAL_DIRECTORY_LOCATOR_SIZE, ZIP64_END_OF_CENTRAL_DIRECTORY_SIZE,
    ZIP64_END_OF_CENTRAL_DIR_LOCATOR_SIGNATURE, ZIP64_EXTRA_FIELD_HEADER_ID,
    ZIP64_EXTRA_FIELD_SIZE,
};
use crate::error::ArchiveError;

use super::EndOfCentralDirectory;

/// Zip64 end of central directory record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Zip64EndOfCentralDirectory {
    /// Host system, high byte of "version made by".
    pub made_by: u8,
    /// Specification version, low byte of "version made by".
    pub version: u8,
    pub version_needed: u16,
    pub files_count: u64,
    pub cd_length: u64,
    pub data_length: u64,
    /// Zip64 extensible data sector.
    pub extensible_data: ExtraData,
}

impl Default for Zip64EndOfCentralDirectory {
    fn default() -> Self {
        Self {
            made_by: HOST_UNIX,
            version: VERSION_ZIP64,
            version_needed: VERSION_ZIP64 as u16,
            files_count: 0,
            cd_length: 0,
            data_length: 0,
            extensible_data: ExtraData::new(),
        }
    }
}

impl From<&EndOfCentralDirectory> for Zip64EndOfCentralDirectory {
    fn from(end: &EndOfCentralDirectory) -> Self {
        Self {
            files_count: end.files_count,
            cd_length: end.cd_length,
            data_length: end.data_length,
            ..Default::default()
        }
    }
}

impl Zip64EndOfCentralDirectory {
    pub fn record_len(&self) -> usize {
        ZIP64_END_OF_CENTRAL_DIRECTORY_SIZE + self.extensible_data.encoded_len_wide()
    }

    /// Encoded length, locator included.
    pub fn encoded_len(&self) -> usize {
        self.record_len() + ZIP64_END_OF_CENTRAL_DIRECTORY_LOCATOR_SIZE
    }

    /// The record followed by its locator.
    ///
    /// The record is assumed to start right after the central directory, at
    /// `data_length + cd_length`.
    pub fn encode(&self) -> Vec<u8> {
        let mut descriptor = ArchiveDescriptor::new(self.encoded_len());

        descriptor.write_u32(ZIP64_CENTRAL_DIRECTORY_END_SIGNATURE);
        // size of the record, without the leading 12 bytes
        descriptor.write_u64((self.record_len() - 12) as u64);
        descriptor.write_u8(self.version);
        descriptor.write_u8(self.made_by);
        descriptor.write_u16(self.version_needed);
        descriptor.write_u32(0);
        descriptor.write_u32(0);
        descriptor.write_u64(self.files_count);
        descriptor.write_u64(self.files_count);
        descriptor.write_u64(self.cd_length);
        descriptor.write_u64(self.data_length);
        self.extensible_data.write_wide(&mut descriptor);

        let locator = Zip64Locator {
            offset: self.data_length + self.cd_length,
            ..Default::default()
        };
        descriptor.write_bytes(&locator.encode());

        descriptor.finish()
    }

    /// Length of the whole record as declared by its fixed part.
    pub fn declared_len(fixed: &[u8]) -> Result<usize, ArchiveError> {
        let mut indexer = ArchiveDescriptorReader::new(fixed, "zip64 end of central directory");
        indexer.expect_signature(ZIP64_CENTRAL_DIRECTORY_END_SIGNATURE)?;
        let size = indexer.read_u64()?;

        usize::try_from(size)
            .ok()
            .and_then(|size| size.checked_add(12))
            .ok_or_else(|| {
                ArchiveError::bad_structure(format!(
                    "Invalid zip64 end of central directory size {}",
                    size
                ))
            })
    }

    /// Decodes the record alone (no locator).
    ///
    /// `strict` rejects multi-disk archives and mismatching entry counts.
    pub fn decode(bytes: &[u8], offset: usize, strict: bool) -> Result<(Self, usize), ArchiveError> {
        let stream = bytes.get(offset..).unwrap_or_default();
        let mut indexer = ArchiveDescriptorReader::new(stream, "zip64 end of central directory");

        indexer.expect_signature(ZIP64_CENTRAL_DIRECTORY_END_SIGNATURE)?;
        let size = indexer.read_u64()? as usize;
        let version = indexer.read_u8()?;
        let made_by = indexer.read_u8()?;
        let version_needed = indexer.read_u16()?;
        let disk = indexer.read_u32()?;
        let cd_disk = indexer.read_u32()?;
        let disk_files_count = indexer.read_u64()?;
        let files_count = indexer.read_u64()?;
        let cd_length = indexer.read_u64()?;
        let data_length = indexer.read_u64()?;

        if strict && (disk != 0 || cd_disk != 0) {
            return Err(ArchiveError::bad_structure(
                "Multi-disk zip64 archives are not supported",
            ));
        }
        if strict && disk_files_count != files_count {
            return Err(ArchiveError::bad_structure(format!(
                "Zip64 entry counts disagree: {} on disk, {} in total",
                disk_files_count, files_count
            )));
        }

        let extensible_len = size
            .checked_add(12)
            .and_then(|total| total.checked_sub(ZIP64_END_OF_CENTRAL_DIRECTORY_SIZE))
            .ok_or_else(|| {
                ArchiveError::bad_structure(format!(
                    "Invalid zip64 end of central directory size {}",
                    size
                ))
            })?;
        let extensible_data = ExtraData::decode_wide(&indexer.read_bytes(extensible_len)?)?;

        let record = Zip64EndOfCentralDirectory {
            made_by,
            version,
            version_needed,
            files_count,
            cd_length,
            data_length,
            extensible_data,
        };

        Ok((record, indexer.index()))
    }
}

/// Points at the Zip64 end of central directory record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Zip64Locator {
    pub disk: u32,
    pub offset: u64,
    pub total_disks: u32,
}

impl Default for Zip64Locator {
    fn default() -> Self {
        Self {
            disk: 0,
            offset: 0,
            total_disks: 1,
        }
    }
}

impl Zip64Locator {
    pub fn encode(&self) -> Vec<u8> {
        let mut descriptor = ArchiveDescriptor::new(ZIP64_END_OF_CENTRAL_DIRECTORY_LOCATOR_SIZE);

        descriptor.write_u32(ZIP64_END_OF_CENTRAL_DIR_LOCATOR_SIGNATURE);
        descriptor.write_u32(self.disk);
        descriptor.write_u64(self.offset);
        descriptor.write_u32(self.total_disks);

        descriptor.finish()
    }

    pub fn decode(bytes: &[u8], offset: usize, strict: bool) -> Result<(Self, usize), ArchiveError> {
        let stream = bytes.get(offset..).unwrap_or_default();
        let mut indexer = ArchiveDescriptorReader::new(stream, "zip64 end of central directory locator");

        indexer.expect_signature(ZIP64_END_OF_CENTRAL_DIR_LOCATOR_SIGNATURE)?;
        let locator = Zip64Locator {
            disk: indexer.read_u32()?,
            offset: indexer.read_u64()?,
            total_disks: indexer.read_u32()?,
        };

        if strict && locator.total_disks != 1 {
            return Err(ArchiveError::bad_structure(format!(
                "Zip64 locator declares {} disks, expected 1",
                locator.total_disks
            )));
        }

        Ok((locator, indexer.index()))
    }
}

/// Zip64 extended information extra field (id 0x0001), in its full 28 byte form.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Zip64ExtraField {
    pub size: u64,
    pub compressed_size: u64,
    pub offset: u64,
}

impl Zip64ExtraField {
    pub const HEADER_ID: u16 = ZIP64_EXTRA_FIELD_HEADER_ID;

    /// Payload only, without the id and length prefix.
    pub fn encode(&self) -> Vec<u8> {
        let mut descriptor = ArchiveDescriptor::new(ZIP64_EXTRA_FIELD_SIZE);

        descriptor.write_u64(self.size);
        descriptor.write_u64(self.compressed_size);
        descriptor.write_u64(self.offset);
        descriptor.write_u32(0);

        descriptor.finish()
    }

    /// Zero-filled payload reserved in local headers of entries that may overflow.
    pub fn placeholder() -> Vec<u8> {
        vec![0; ZIP64_EXTRA_FIELD_SIZE]
    }

    /// Needs at least the three 64-bit values; the disk number is ignored.
    pub fn decode(bytes: &[u8]) -> Result<Self, ArchiveError> {
        let mut indexer = ArchiveDescriptorReader::new(bytes, "zip64 extra field");

        Ok(Zip64ExtraField {
            size: indexer.read_u64()?,
            compressed_size: indexer.read_u64()?,
            offset: indexer.read_u64()?,
        })
    }
}
