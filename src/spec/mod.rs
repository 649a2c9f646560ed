//! Byte-exact codecs for the records of a Zip archive.
//!
//! All multi-byte integers are little-endian. Decoders take a buffer and the offset where the
//! record starts, check the signature and return the record with the number of bytes it spans.

mod central_directory_header;
mod data_descriptor;
mod end_of_central_directory;
mod local_file_header;
mod zip64;

pub use central_directory_header::CentralDirectoryHeader;
pub use data_descriptor::DataDescriptor;
pub use end_of_central_directory::{find_eocd_index, EndOfCentralDirectory};
pub use local_file_header::LocalFileHeader;
pub use zip64::{Zip64EndOfCentralDirectory, Zip64ExtraField, Zip64Locator};
