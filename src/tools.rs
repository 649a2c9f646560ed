use crate::constants::{
    CENTRAL_DIRECTORY_ENTRY_BASE_SIZE, DESCRIPTOR_SIZE, END_OF_CENTRAL_DIRECTORY_SIZE,
    EXTRA_FIELD_HEADER_SIZE, FILE_HEADER_BASE_SIZE, MAX_COMMENT_SIZE, ZIP64_BYTES_THR,
    ZIP64_DESCRIPTOR_SIZE, ZIP64_END_OF_CENTRAL_DIRECTORY_LOCATOR_SIZE,
    ZIP64_END_OF_CENTRAL_DIRECTORY_SIZE, ZIP64_ENTRY_THR, ZIP64_EXTRA_FIELD_SIZE,
};

const ZIP64_EXTRA_SIZE: u64 = (EXTRA_FIELD_HEADER_SIZE + ZIP64_EXTRA_FIELD_SIZE) as u64;

/// Calculate the exact size of an archive of stored files with declared sizes.
///
/// Names ending with `/` are directories, their size is ignored. The result matches what
/// [`encode`](crate::compress::encode) produces for the same entries when every file is stored and
/// declared with [`ZipEntry::size`](crate::compress::ZipEntry::size).
///
/// ## Example
///
/// ```
/// use streamzip::tools::archive_size;
///
/// assert_eq!(
///     archive_size(
///         [
///             ("file1.txt", b"hello\n".len() as u64),
///             ("file2.txt", b"world\n".len() as u64),
///         ],
///         0,
///     ),
///     254,
/// );
/// ```
pub fn archive_size<'a, I: IntoIterator<Item = (&'a str, u64)>>(
    files: I,
    comment_length: usize,
) -> u64 {
    let mut data_length: u64 = 0;
    let mut cd_length: u64 = 0;
    let mut files_count: u64 = 0;

    for (name, size) in files {
        let name_length = name.len() as u64;
        let offset = data_length;

        if name.ends_with('/') {
            let zip64 = offset >= ZIP64_BYTES_THR;
            data_length += FILE_HEADER_BASE_SIZE as u64 + name_length;
            cd_length += CENTRAL_DIRECTORY_ENTRY_BASE_SIZE as u64
                + name_length
                + if zip64 { ZIP64_EXTRA_SIZE } else { 0 };
        } else {
            let zip64 = size >= ZIP64_BYTES_THR || offset >= ZIP64_BYTES_THR;
            let (extra, descriptor) = if zip64 {
                (ZIP64_EXTRA_SIZE, ZIP64_DESCRIPTOR_SIZE as u64)
            } else {
                (0, DESCRIPTOR_SIZE as u64)
            };
            data_length += FILE_HEADER_BASE_SIZE as u64 + name_length + extra + size + descriptor;
            cd_length += CENTRAL_DIRECTORY_ENTRY_BASE_SIZE as u64 + name_length + extra;
        }
        files_count += 1;
    }

    let zip64_end = if files_count >= ZIP64_ENTRY_THR
        || cd_length >= ZIP64_BYTES_THR
        || data_length >= ZIP64_BYTES_THR
    {
        (ZIP64_END_OF_CENTRAL_DIRECTORY_SIZE + ZIP64_END_OF_CENTRAL_DIRECTORY_LOCATOR_SIZE) as u64
    } else {
        0
    };

    data_length
        + cd_length
        + zip64_end
        + END_OF_CENTRAL_DIRECTORY_SIZE as u64
        + comment_length.min(MAX_COMMENT_SIZE) as u64
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn empty_archive() {
        let none: [(&str, u64); 0] = [];
        assert_eq!(archive_size(none, 0), 22);
        assert_eq!(archive_size(none, 70_000), 22 + 0xFFFF);
    }

    #[test]
    fn large_file_switches_to_zip64() {
        let small = archive_size([("a", 10)], 0);
        let large = archive_size([("a", 0x1_0000_0000)], 0);

        assert_eq!(small, 30 + 1 + 10 + 16 + 46 + 1 + 22);
        assert_eq!(
            large,
            30 + 1 + 32 + 0x1_0000_0000 + 24 + 46 + 1 + 32 + 56 + 20 + 22
        );
    }

    #[test]
    fn directories() {
        assert_eq!(archive_size([("d/", 1234)], 0), 30 + 2 + 46 + 2 + 22);
    }
}
