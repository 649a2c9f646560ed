use std::fmt::{self, Debug, Display};

use crate::compression::CompressionMethod;

pub enum ArchiveError {
    IoError(std::io::Error),
    UnsupportedCompressionMethod(CompressionMethod),
    BadArchiveStructure(String),
    MissingEntryStream(String),
    EntryIsDirectory(String),
}

impl ArchiveError {
    pub(crate) fn bad_structure<S: Into<String>>(detail: S) -> Self {
        ArchiveError::BadArchiveStructure(detail.into())
    }

    pub(crate) fn truncated(record: &str, needed: usize, available: usize) -> Self {
        ArchiveError::BadArchiveStructure(format!(
            "{} is truncated: needs {} bytes, only {} available",
            record, needed, available
        ))
    }
}

impl Display for ArchiveError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ArchiveError::IoError(e) => {
                write!(f, "Archive error {:}", e)
            }
            ArchiveError::UnsupportedCompressionMethod(compression_method) => {
                write!(f, "Unsupported compression method : {:}", compression_method)
            }
            ArchiveError::BadArchiveStructure(detail) => write!(f, "{}", detail),
            ArchiveError::MissingEntryStream(file_name) => {
                write!(f, "No stream provided for file entry '{}'", file_name)
            }
            ArchiveError::EntryIsDirectory(_) => write!(f, "Entry is a directory"),
        }
    }
}

impl Debug for ArchiveError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ArchiveError::IoError(e) => {
                write!(f, "Archive error {:?}", e)
            }
            ArchiveError::EntryIsDirectory(file_name) => {
                write!(f, "Entry is a directory ({:?})", file_name)
            }
            _ => (self as &dyn Display).fmt(f),
        }
    }
}

impl std::error::Error for ArchiveError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ArchiveError::IoError(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ArchiveError {
    fn from(value: std::io::Error) -> Self {
        ArchiveError::IoError(value)
    }
}
