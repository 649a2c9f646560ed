use crate::archive_common::{ArchiveDescriptor, ArchiveDescriptorReader};
use crate::constants::{
    CENTRAL_DIRECTORY_END_SIGNATURE, END_OF_CENTRAL_DIRECTORY_SIZE, MAX_COMMENT_SIZE,
    ZIP64_BYTES_THR, ZIP64_ENTRY_THR,
};
use crate::error::ArchiveError;

use super::Zip64EndOfCentralDirectory;

/// End of central directory record, with 64-bit counters.
///
/// Values that do not fit the 16/32-bit fields are written as all-ones sentinels and carried
/// by the Zip64 record instead.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EndOfCentralDirectory {
    pub files_count: u64,
    /// Length of the central directory.
    pub cd_length: u64,
    /// Offset of the central directory, i.e. the length of everything before it.
    pub data_length: u64,
    pub comments: Vec<u8>,
}

impl EndOfCentralDirectory {
    /// Set the archive comment, truncated to 0xFFFF bytes.
    pub fn set_archive_comment(&mut self, comment: &[u8]) {
        let len = std::cmp::min(comment.len(), MAX_COMMENT_SIZE);
        self.comments = comment[..len].to_owned();
    }

    pub fn comment_length(&self) -> u16 {
        self.comments.len().min(MAX_COMMENT_SIZE) as u16
    }

    // A field that cannot hold its value must be written as -1 and the archive must carry
    // a Zip64 end of central directory record.
    pub fn needs_zip64_format_extensions(&self) -> bool {
        self.files_count >= ZIP64_ENTRY_THR
            || self.cd_length >= ZIP64_BYTES_THR
            || self.data_length >= ZIP64_BYTES_THR
    }

    /// True when a decoded record defers any value to the Zip64 record.
    pub fn has_zip64_sentinels(&self) -> bool {
        self.files_count == ZIP64_ENTRY_THR
            || self.cd_length == ZIP64_BYTES_THR
            || self.data_length == ZIP64_BYTES_THR
    }

    pub fn merge_zip64(&mut self, record: &Zip64EndOfCentralDirectory) {
        self.files_count = record.files_count;
        self.cd_length = record.cd_length;
        self.data_length = record.data_length;
    }

    pub fn encoded_len(&self) -> usize {
        END_OF_CENTRAL_DIRECTORY_SIZE + self.comment_length() as usize
    }

    pub fn encode(&self) -> Vec<u8> {
        let files_count = self.files_count.min(ZIP64_ENTRY_THR) as u16;
        let mut descriptor = ArchiveDescriptor::new(self.encoded_len());

        descriptor.write_u32(CENTRAL_DIRECTORY_END_SIGNATURE);
        descriptor.write_u16(0);
        descriptor.write_u16(0);
        descriptor.write_u16(files_count);
        descriptor.write_u16(files_count);
        descriptor.write_u32(self.cd_length.min(ZIP64_BYTES_THR) as u32);
        descriptor.write_u32(self.data_length.min(ZIP64_BYTES_THR) as u32);
        descriptor.write_u16(self.comment_length());
        descriptor.write_bytes(&self.comments[..self.comment_length() as usize]);

        descriptor.finish()
    }

    /// Decodes the 32-bit record; sentinel values are returned as read.
    pub fn decode(bytes: &[u8], offset: usize) -> Result<(Self, usize), ArchiveError> {
        let stream = bytes.get(offset..).unwrap_or_default();
        let mut indexer = ArchiveDescriptorReader::new(stream, "end of central directory");

        indexer.expect_signature(CENTRAL_DIRECTORY_END_SIGNATURE)?;
        let _disk = indexer.read_u16()?;
        let _cd_disk = indexer.read_u16()?;
        let _disk_files_count = indexer.read_u16()?;
        let files_count = indexer.read_u16()? as u64;
        let cd_length = indexer.read_u32()? as u64;
        let data_length = indexer.read_u32()? as u64;
        let comment_length = indexer.read_u16()? as usize;
        let comments = indexer.read_bytes(comment_length)?;

        let end = EndOfCentralDirectory {
            files_count,
            cd_length,
            data_length,
            comments,
        };

        Ok((end, indexer.index()))
    }
}

/// Finds the end of central directory record by scanning `buffer` backwards.
///
/// `length` is the number of bytes from the start of `buffer` to the end of the file, which may
/// exceed the buffer when only a prefix of the tail is at hand. A candidate only matches when its
/// comment length accounts exactly for the bytes that follow it, which rejects a signature that
/// happens to appear inside the comment.
pub fn find_eocd_index(buffer: &[u8], length: u64) -> Option<usize> {
    let signature = CENTRAL_DIRECTORY_END_SIGNATURE.to_le_bytes();
    let end = (buffer.len() as u64).min(length) as usize;
    let last = end.checked_sub(END_OF_CENTRAL_DIRECTORY_SIZE)?;

    (0..=last).rev().find(|&index| {
        if buffer[index..index + 4] != signature {
            return false;
        }
        let comment_length = u16::from_le_bytes([buffer[index + 20], buffer[index + 21]]) as u64;
        comment_length == length - index as u64 - END_OF_CENTRAL_DIRECTORY_SIZE as u64
    })
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn empty_archive_record() {
        let end = EndOfCentralDirectory::default();

        assert_eq!(
            end.encode(),
            [0x50, 0x4b, 0x05, 0x06, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0]
        );
        assert!(!end.needs_zip64_format_extensions());
    }

    #[test]
    fn overflowing_values_become_sentinels() {
        let end = EndOfCentralDirectory {
            files_count: 70_000,
            cd_length: 12,
            data_length: 0x1_2345_6789,
            comments: Vec::new(),
        };
        assert!(end.needs_zip64_format_extensions());

        let (decoded, _) = EndOfCentralDirectory::decode(&end.encode(), 0).unwrap();
        assert_eq!(decoded.files_count, 0xFFFF);
        assert_eq!(decoded.cd_length, 12);
        assert_eq!(decoded.data_length, 0xFFFF_FFFF);
        assert!(decoded.has_zip64_sentinels());
    }

    #[test]
    fn threshold_values_need_zip64() {
        let end = EndOfCentralDirectory {
            files_count: 0xFFFF,
            ..Default::default()
        };
        assert!(end.needs_zip64_format_extensions());

        let end = EndOfCentralDirectory {
            files_count: 0xFFFE,
            data_length: 0xFFFF_FFFE,
            ..Default::default()
        };
        assert!(!end.needs_zip64_format_extensions());
    }

    #[test]
    fn comment_round_trip() {
        let mut end = EndOfCentralDirectory::default();
        end.set_archive_comment(b"hello");
        let bytes = end.encode();

        assert_eq!(bytes.len(), 27);
        assert_eq!(EndOfCentralDirectory::decode(&bytes, 0).unwrap(), (end, 27));
    }

    #[test]
    fn comment_is_truncated() {
        let mut end = EndOfCentralDirectory::default();
        end.set_archive_comment(&vec![b'a'; 70_000]);

        assert_eq!(end.comments.len(), 0xFFFF);
        assert_eq!(end.encode().len(), 22 + 0xFFFF);
    }

    #[test]
    fn scan_finds_record() {
        let mut buffer = vec![0xAB; 100];
        buffer.extend(EndOfCentralDirectory::default().encode());

        assert_eq!(find_eocd_index(&buffer, buffer.len() as u64), Some(100));
    }

    #[test]
    fn scan_skips_signature_inside_comment() {
        let mut inner = EndOfCentralDirectory::default();
        inner.set_archive_comment(b"xx");
        let mut comment = inner.encode();
        comment.extend(b"zz");
        let mut outer = EndOfCentralDirectory::default();
        outer.set_archive_comment(&comment);

        let mut buffer = vec![0; 10];
        buffer.extend(outer.encode());

        assert_eq!(find_eocd_index(&buffer, buffer.len() as u64), Some(10));
    }

    #[test]
    fn scan_with_partial_tail() {
        let mut end = EndOfCentralDirectory::default();
        end.set_archive_comment(&[b'c'; 40]);
        let bytes = end.encode();

        // only the fixed part and a piece of the comment were fetched
        let partial = &bytes[..30];
        assert_eq!(find_eocd_index(partial, bytes.len() as u64), Some(0));
    }

    #[test]
    fn scan_fails() {
        assert_eq!(find_eocd_index(&[0; 10], 10), None);
        assert_eq!(find_eocd_index(&[0x50; 100], 100), None);
    }
}
