use std::fmt::Display;
use std::io::Write;

use flate2::write::DeflateEncoder;
use flate2::Compression;

use crate::error::ArchiveError;

pub const STORE: u16 = 0;
pub const DEFLATE: u16 = 8;

/// Registered method identifiers, used to name methods this crate cannot process.
const METHOD_NAMES: &[(u16, &str)] = &[
    (0, "STORE"),
    (1, "SHRINK"),
    (2, "REDUCE_1"),
    (3, "REDUCE_2"),
    (4, "REDUCE_3"),
    (5, "REDUCE_4"),
    (6, "IMPLODE"),
    (8, "DEFLATE"),
    (9, "DEFLATE64"),
    (10, "PKWARE_IMPLODE"),
    (12, "BZIP2"),
    (14, "LZMA"),
    (16, "IBM_ZOS_CMPSC"),
    (18, "IBM_TERSE"),
    (19, "IBM_LZ77"),
    (93, "ZSTD"),
    (94, "MP3"),
    (95, "XZ"),
    (96, "JPEG"),
    (97, "WAVPACK"),
    (98, "PPMD"),
    (99, "AES"),
];

/// Compression method of an entry.
///
/// Only `Store` and `Deflate` can be written or opened. Any other identifier read from an archive
/// is kept as `Other` so entries can still be listed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CompressionMethod {
    #[default]
    Store,
    Deflate,
    Other(u16),
}

impl CompressionMethod {
    pub fn from_code(code: u16) -> Self {
        match code {
            STORE => CompressionMethod::Store,
            DEFLATE => CompressionMethod::Deflate,
            other => CompressionMethod::Other(other),
        }
    }

    pub fn code(&self) -> u16 {
        match self {
            CompressionMethod::Store => STORE,
            CompressionMethod::Deflate => DEFLATE,
            CompressionMethod::Other(code) => *code,
        }
    }

    /// Registered name of the method, if any.
    pub fn name(&self) -> Option<&'static str> {
        let code = self.code();
        METHOD_NAMES
            .iter()
            .find(|(id, _)| *id == code)
            .map(|(_, name)| *name)
    }

    pub fn is_supported(&self) -> bool {
        !matches!(self, CompressionMethod::Other(_))
    }
}

impl From<u16> for CompressionMethod {
    fn from(code: u16) -> Self {
        CompressionMethod::from_code(code)
    }
}

impl Display for CompressionMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.name() {
            Some(name) => write!(f, "{}", name),
            None => write!(f, "{}", self.code()),
        }
    }
}

/// Deflate compression level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Level {
    /// Fastest quality of compression, usually produces bigger size.
    Fastest,
    /// Best quality of compression, usually produces the smallest size.
    Best,
    /// Default quality of compression.
    #[default]
    Default,
    /// Precise quality, clamped to 0..=9.
    Precise(u32),
    /// No compression: deflate entries are written as stored.
    None,
}

impl From<Level> for Compression {
    fn from(level: Level) -> Self {
        match level {
            Level::Fastest => Compression::fast(),
            Level::Best => Compression::best(),
            Level::Default => Compression::default(),
            Level::Precise(val) => Compression::new(val.min(9)),
            Level::None => Compression::none(),
        }
    }
}

/// Incremental payload transform: every input chunk yields the output produced so far.
pub(crate) enum Compressor {
    Store,
    Deflate(DeflateEncoder<Vec<u8>>),
}

impl Compressor {
    pub fn new(method: CompressionMethod, level: Level) -> Result<Self, ArchiveError> {
        match method {
            CompressionMethod::Store => Ok(Compressor::Store),
            CompressionMethod::Deflate => Ok(Compressor::Deflate(DeflateEncoder::new(
                Vec::new(),
                level.into(),
            ))),
            other => Err(ArchiveError::UnsupportedCompressionMethod(other)),
        }
    }

    pub fn compress(&mut self, chunk: &[u8]) -> Result<Vec<u8>, ArchiveError> {
        match self {
            Compressor::Store => Ok(chunk.to_vec()),
            Compressor::Deflate(encoder) => {
                encoder.write_all(chunk)?;
                Ok(std::mem::take(encoder.get_mut()))
            }
        }
    }

    /// Flushes whatever the encoder still holds.
    pub fn finish(self) -> Result<Vec<u8>, ArchiveError> {
        match self {
            Compressor::Store => Ok(Vec::new()),
            Compressor::Deflate(encoder) => Ok(encoder.finish()?),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use flate2::read::DeflateDecoder;
    use std::io::Read;

    #[test]
    fn method_names() {
        assert_eq!(CompressionMethod::from_code(12).to_string(), "BZIP2");
        assert_eq!(CompressionMethod::from_code(253).to_string(), "253");
        assert_eq!(CompressionMethod::Deflate.to_string(), "DEFLATE");
        assert_eq!(CompressionMethod::from(8), CompressionMethod::Deflate);
        assert!(!CompressionMethod::Other(14).is_supported());
    }

    #[test]
    fn unsupported_compressor() {
        let result = Compressor::new(CompressionMethod::Other(12), Level::Default);
        assert!(matches!(
            result,
            Err(ArchiveError::UnsupportedCompressionMethod(CompressionMethod::Other(12)))
        ));
    }

    #[test]
    fn deflate_chunks_concatenate_to_one_stream() {
        let input = b"hello hello hello hello world".repeat(200);
        let mut compressor = Compressor::new(CompressionMethod::Deflate, Level::Best).unwrap();

        let mut output = Vec::new();
        for chunk in input.chunks(700) {
            output.extend(compressor.compress(chunk).unwrap());
        }
        output.extend(compressor.finish().unwrap());

        assert!(output.len() < input.len());

        let mut inflated = Vec::new();
        DeflateDecoder::new(output.as_slice())
            .read_to_end(&mut inflated)
            .unwrap();
        assert_eq!(inflated, input);
    }

    #[test]
    fn store_is_identity() {
        let mut compressor = Compressor::new(CompressionMethod::Store, Level::Default).unwrap();
        assert_eq!(compressor.compress(b"abc").unwrap(), b"abc");
        assert!(compressor.finish().unwrap().is_empty());
    }
}
