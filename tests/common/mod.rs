#![allow(dead_code)]
use std::path::PathBuf;
use std::pin::Pin;
use std::task::{Context, Poll};

use streamzip::{
    compress::ZipStream,
    spec::{find_eocd_index, EndOfCentralDirectory},
    uncompress::{open_entry, ReadAt, ZipExtractEntry},
    EntrySource,
};
use tokio::io::{AsyncRead, AsyncReadExt, ReadBuf};

pub const PACKAGE_NAME: &str = env!("CARGO_PKG_NAME");

pub fn temp_path(file_name: &str) -> PathBuf {
    let out_dir = std::env::temp_dir().join(PACKAGE_NAME);
    std::fs::create_dir_all(&out_dir).unwrap_or_else(|error| {
        panic!("creating dir {:?} failed, because {:?}", out_dir, error);
    });

    let out_path = out_dir.join(file_name);
    if out_path.exists() {
        std::fs::remove_file(&out_path).unwrap_or_else(|error| {
            panic!("deleting file {:?} failed, because {:?}", &out_path, error);
        });
    }
    out_path
}

pub async fn archive_bytes<S: EntrySource>(stream: ZipStream<S>) -> Vec<u8> {
    let (size, bytes) = stream.write_to(Vec::new()).await.unwrap();
    assert_eq!(size, bytes.len() as u64);
    bytes
}

pub async fn read_entry<R: ReadAt>(reader: &R, entry: &ZipExtractEntry) -> Vec<u8> {
    let mut content = Vec::new();
    open_entry(reader, entry)
        .await
        .unwrap()
        .read_to_end(&mut content)
        .await
        .unwrap();
    content
}

/// Compressible but not trivial content.
pub fn sample_content(len: usize) -> Vec<u8> {
    (0..len as u32)
        .flat_map(|i| (i % 251).to_string().into_bytes())
        .take(len)
        .collect()
}

/// Offset of the central directory, read from the end record.
pub fn central_directory_offset(bytes: &[u8]) -> usize {
    let index = find_eocd_index(bytes, bytes.len() as u64).unwrap();
    let (end, _) = EndOfCentralDirectory::decode(bytes, index).unwrap();
    end.data_length as usize
}

/// Rewrites the compression method of the first entry, in its local and central headers.
pub fn patch_first_entry_method(bytes: &mut [u8], method: u16) {
    let cd = central_directory_offset(bytes);
    bytes[cd + 10..cd + 12].copy_from_slice(&method.to_le_bytes());
    bytes[8..10].copy_from_slice(&method.to_le_bytes());
}

/// Produces `mock_size` bytes of `b'0'`.
pub struct MockAsyncReader {
    mock_size: u64,
}

impl MockAsyncReader {
    pub fn new(size: u64) -> Self {
        Self { mock_size: size }
    }
}

impl AsyncRead for MockAsyncReader {
    fn poll_read(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<std::io::Result<()>> {
        let size = (buf.remaining() as u64).min(self.mock_size) as usize;
        buf.initialize_unfilled_to(size).fill(b'0');
        buf.advance(size);

        self.get_mut().mock_size -= size as u64;
        Poll::Ready(Ok(()))
    }
}
