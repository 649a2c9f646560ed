use std::mem::size_of;

pub const FILE_HEADER_BASE_SIZE: usize = 7 * size_of::<u16>() + 4 * size_of::<u32>();
pub const DESCRIPTOR_SIZE: usize = 4 * size_of::<u32>();
pub const ZIP64_DESCRIPTOR_SIZE: usize = 2 * size_of::<u32>() + 2 * size_of::<u64>();
pub const CENTRAL_DIRECTORY_ENTRY_BASE_SIZE: usize = 11 * size_of::<u16>() + 6 * size_of::<u32>();
pub const END_OF_CENTRAL_DIRECTORY_SIZE: usize = 5 * size_of::<u16>() + 3 * size_of::<u32>();
pub const ZIP64_END_OF_CENTRAL_DIRECTORY_SIZE: usize =
    2 * size_of::<u16>() + 3 * size_of::<u32>() + 5 * size_of::<u64>();
pub const ZIP64_END_OF_CENTRAL_DIRECTORY_LOCATOR_SIZE: usize =
    3 * size_of::<u32>() + size_of::<u64>();

pub const EXTRA_FIELD_HEADER_SIZE: usize = 2 * size_of::<u16>();
pub const ZIP64_EXTENSIBLE_HEADER_SIZE: usize = size_of::<u16>() + size_of::<u32>();
/// Sizes and offset (3 x u64) followed by the disk start number.
pub const ZIP64_EXTRA_FIELD_SIZE: usize = 3 * size_of::<u64>() + size_of::<u32>();

pub const LOCAL_FILE_HEADER_SIGNATURE: u32 = 0x04034b50;
pub const DATA_DESCRIPTOR_SIGNATURE: u32 = 0x08074b50;
pub const CENTRAL_DIRECTORY_ENTRY_SIGNATURE: u32 = 0x02014b50;
pub const CENTRAL_DIRECTORY_END_SIGNATURE: u32 = 0x06054b50;
pub const ZIP64_CENTRAL_DIRECTORY_END_SIGNATURE: u32 = 0x06064b50;
pub const ZIP64_END_OF_CENTRAL_DIR_LOCATOR_SIGNATURE: u32 = 0x07064b50;

pub const ZIP64_EXTRA_FIELD_HEADER_ID: u16 = 0x0001;

pub const DATA_DESCRIPTOR_FLAG: u16 = 1 << 3;
pub const UTF8_FILENAME_FLAG: u16 = 1 << 11;
pub const DEFAULT_FLAGS: u16 = DATA_DESCRIPTOR_FLAG | UTF8_FILENAME_FLAG;

/// Host system "unix" in the high byte of "version made by".
pub const HOST_UNIX: u8 = 3;
pub const VERSION_DEFAULT: u8 = 20;
pub const VERSION_ZIP64: u8 = 45;
pub const VERSION_MADE_BY: u16 = (HOST_UNIX as u16) << 8 | VERSION_DEFAULT as u16;
pub const VERSION_MADE_BY_ZIP64: u16 = (HOST_UNIX as u16) << 8 | VERSION_ZIP64 as u16;

pub const ZIP64_BYTES_THR: u64 = u32::MAX as u64;
pub const ZIP64_ENTRY_THR: u64 = u16::MAX as u64;

pub const MAX_COMMENT_SIZE: usize = u16::MAX as usize;

pub const DOS_DIRECTORY_ATTRIBUTE: u16 = 0x10;
pub const UNIX_DIRECTORY_MODE: u16 = 0o040755;
pub const UNIX_FILE_MODE: u16 = 0o100644;

/// Chunk size used when pulling entry payloads.
pub const READ_BUFFER_SIZE: usize = 64 * 1024;
