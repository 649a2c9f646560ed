use crate::constants::{
    END_OF_CENTRAL_DIRECTORY_SIZE, MAX_COMMENT_SIZE, ZIP64_END_OF_CENTRAL_DIRECTORY_LOCATOR_SIZE,
    ZIP64_END_OF_CENTRAL_DIRECTORY_SIZE,
};
use crate::error::ArchiveError;
use crate::spec::{find_eocd_index, EndOfCentralDirectory, Zip64EndOfCentralDirectory, Zip64Locator};

use super::read_at::{read_fully_at, ReadAt};

/// The end record with the longest possible comment.
pub const EOCD_SEARCH_LENGTH: u64 = (END_OF_CENTRAL_DIRECTORY_SIZE + MAX_COMMENT_SIZE) as u64;

/// Finds the end of central directory record, resolved through the Zip64 record when any of its
/// values is a sentinel.
pub async fn find_end_of_central_directory<R: ReadAt + ?Sized>(
    reader: &R,
    strict: bool,
) -> Result<EndOfCentralDirectory, ArchiveError> {
    let file_size = reader.size();
    let tail_length = file_size.min(EOCD_SEARCH_LENGTH);
    let tail_start = file_size - tail_length;
    let tail = read_fully_at(reader, tail_start, tail_length as usize).await?;

    let index = find_eocd_index(&tail, tail_length)
        .ok_or_else(|| ArchiveError::bad_structure("Could not find end of central directory record"))?;
    let (mut end, _) = EndOfCentralDirectory::decode(&tail, index)?;
    let eocd_offset = tail_start + index as u64;

    log::debug!(
        "end of central directory at {}: {} entries, directory of {} bytes at {}",
        eocd_offset,
        end.files_count,
        end.cd_length,
        end.data_length
    );

    if !end.has_zip64_sentinels() {
        return Ok(end);
    }

    let locator_offset = eocd_offset
        .checked_sub(ZIP64_END_OF_CENTRAL_DIRECTORY_LOCATOR_SIZE as u64)
        .ok_or_else(|| ArchiveError::bad_structure("No room for a zip64 end of central directory locator"))?;
    let locator_bytes = read_fully_at(
        reader,
        locator_offset,
        ZIP64_END_OF_CENTRAL_DIRECTORY_LOCATOR_SIZE,
    )
    .await?;
    let (locator, _) = Zip64Locator::decode(&locator_bytes, 0, strict)?;

    let fixed = read_fully_at(reader, locator.offset, ZIP64_END_OF_CENTRAL_DIRECTORY_SIZE).await?;
    let record_length = Zip64EndOfCentralDirectory::declared_len(&fixed)?;

    // the record sits between the central directory and the locator
    if locator.offset.saturating_add(record_length as u64) > locator_offset {
        return Err(ArchiveError::bad_structure(format!(
            "Zip64 end of central directory at {} ({} bytes) overlaps its locator at {}",
            locator.offset, record_length, locator_offset
        )));
    }

    let record_bytes = if record_length > fixed.len() {
        read_fully_at(reader, locator.offset, record_length).await?
    } else {
        fixed
    };
    let (record, _) = Zip64EndOfCentralDirectory::decode(&record_bytes, 0, strict)?;

    log::debug!(
        "zip64 end of central directory at {}: {} entries, directory of {} bytes at {}",
        locator.offset,
        record.files_count,
        record.cd_length,
        record.data_length
    );
    end.merge_zip64(&record);

    Ok(end)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::uncompress::MemoryReader;

    #[tokio::test]
    async fn too_small_or_random() {
        let reader = MemoryReader::new(vec![0u8; 10]);
        let error = find_end_of_central_directory(&reader, true).await.unwrap_err();
        assert_eq!(error.to_string(), "Could not find end of central directory record");

        let noise: Vec<u8> = (0..5000u32).map(|i| (i * 7919 % 251) as u8).collect();
        let reader = MemoryReader::new(noise);
        assert!(find_end_of_central_directory(&reader, true).await.is_err());
    }

    #[tokio::test]
    async fn long_comment_is_searched() {
        let mut end = EndOfCentralDirectory {
            files_count: 3,
            cd_length: 10,
            data_length: 20,
            comments: Vec::new(),
        };
        end.set_archive_comment(&vec![b'#'; MAX_COMMENT_SIZE]);

        let mut bytes = vec![0u8; 100];
        bytes.extend(end.encode());

        let found = find_end_of_central_directory(&MemoryReader::new(bytes), true)
            .await
            .unwrap();
        assert_eq!(found, end);
    }

    #[tokio::test]
    async fn zip64_values_are_merged() {
        let end = EndOfCentralDirectory {
            files_count: 0x1_0000_0005,
            cd_length: 0,
            data_length: 0,
            comments: b"c".to_vec(),
        };
        let mut bytes = Zip64EndOfCentralDirectory::from(&end).encode();
        bytes.extend(end.encode());

        let found = find_end_of_central_directory(&MemoryReader::new(bytes), true)
            .await
            .unwrap();
        assert_eq!(found.files_count, 0x1_0000_0005);
        assert_eq!(found.comments, b"c");
    }

    #[tokio::test]
    async fn sentinels_without_locator() {
        let end = EndOfCentralDirectory {
            files_count: 0xFFFF,
            ..Default::default()
        };
        let mut bytes = vec![0u8; 40];
        bytes.extend(end.encode());

        assert!(matches!(
            find_end_of_central_directory(&MemoryReader::new(bytes), true).await,
            Err(ArchiveError::BadArchiveStructure(_))
        ));
    }
}
