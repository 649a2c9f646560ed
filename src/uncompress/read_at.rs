use std::io::{Cursor, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::fs::File;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncSeekExt};
use tokio::sync::Mutex;

use crate::error::ArchiveError;

/// Decoded payload of an entry.
pub type EntryReader = Box<dyn AsyncRead + Unpin + Send>;

/// Positional access to an archive.
#[async_trait]
pub trait ReadAt: Send + Sync {
    /// Reads up to `buf.len()` bytes at `offset`. Returns 0 at or past the end.
    async fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<usize, ArchiveError>;

    fn size(&self) -> u64;

    /// A stream over `len` bytes starting at `offset`, released when dropped.
    async fn open_range(&self, offset: u64, len: u64) -> Result<EntryReader, ArchiveError>;
}

/// Reads `len` bytes at `offset`, fewer only when the end is reached.
pub async fn read_fully_at<R: ReadAt + ?Sized>(
    reader: &R,
    offset: u64,
    len: usize,
) -> Result<Vec<u8>, ArchiveError> {
    let available = reader.size().saturating_sub(offset).min(len as u64) as usize;
    let mut buf = vec![0; available];
    let mut filled = 0;

    while filled < buf.len() {
        let read = reader.read_at(offset + filled as u64, &mut buf[filled..]).await?;
        if read == 0 {
            break;
        }
        filled += read;
    }
    buf.truncate(filled);

    Ok(buf)
}

/// Archive file on the local file system.
#[derive(Debug)]
pub struct LocalFileReader {
    path: PathBuf,
    file: Mutex<File>,
    size: u64,
}

impl LocalFileReader {
    pub async fn open<P: AsRef<Path>>(path: P) -> Result<Self, ArchiveError> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path).await?;
        let size = file.metadata().await?.len();

        Ok(Self {
            path,
            file: Mutex::new(file),
            size,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl ReadAt for LocalFileReader {
    async fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<usize, ArchiveError> {
        let mut file = self.file.lock().await;
        file.seek(SeekFrom::Start(offset)).await?;

        let mut filled = 0;
        while filled < buf.len() {
            let read = file.read(&mut buf[filled..]).await?;
            if read == 0 {
                break;
            }
            filled += read;
        }

        Ok(filled)
    }

    fn size(&self) -> u64 {
        self.size
    }

    // Each range gets its own handle so several entries can be read at once.
    async fn open_range(&self, offset: u64, len: u64) -> Result<EntryReader, ArchiveError> {
        let mut file = File::open(&self.path).await?;
        file.seek(SeekFrom::Start(offset)).await?;

        Ok(Box::new(AsyncReadExt::take(file, len)))
    }
}

/// Archive held in memory.
#[derive(Debug, Clone)]
pub struct MemoryReader {
    data: Arc<[u8]>,
}

impl MemoryReader {
    pub fn new<B: Into<Arc<[u8]>>>(data: B) -> Self {
        Self { data: data.into() }
    }
}

#[async_trait]
impl ReadAt for MemoryReader {
    async fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<usize, ArchiveError> {
        let start = offset.min(self.size()) as usize;
        let len = buf.len().min(self.data.len() - start);
        buf[..len].copy_from_slice(&self.data[start..start + len]);

        Ok(len)
    }

    fn size(&self) -> u64 {
        self.data.len() as u64
    }

    async fn open_range(&self, offset: u64, len: u64) -> Result<EntryReader, ArchiveError> {
        let mut cursor = Cursor::new(Arc::clone(&self.data));
        cursor.set_position(offset);

        Ok(Box::new(AsyncReadExt::take(cursor, len)))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[tokio::test]
    async fn memory_reader_bounds() {
        let reader = MemoryReader::new(b"0123456789".to_vec());

        assert_eq!(read_fully_at(&reader, 2, 3).await.unwrap(), b"234");
        assert_eq!(read_fully_at(&reader, 8, 10).await.unwrap(), b"89");
        assert!(read_fully_at(&reader, 20, 4).await.unwrap().is_empty());

        let mut range = reader.open_range(4, 3).await.unwrap();
        let mut content = Vec::new();
        range.read_to_end(&mut content).await.unwrap();
        assert_eq!(content, b"456");
    }

    #[tokio::test]
    async fn local_file_reader() {
        let path = std::env::temp_dir().join(format!("streamzip-read-at-{}", std::process::id()));
        tokio::fs::write(&path, b"abcdefghij").await.unwrap();

        let reader = LocalFileReader::open(&path).await.unwrap();
        assert_eq!(reader.size(), 10);
        assert_eq!(read_fully_at(&reader, 7, 5).await.unwrap(), b"hij");

        let mut first = reader.open_range(0, 2).await.unwrap();
        let mut second = reader.open_range(5, 2).await.unwrap();
        let mut content = String::new();
        second.read_to_string(&mut content).await.unwrap();
        first.read_to_string(&mut content).await.unwrap();
        assert_eq!(content, "fgab");

        tokio::fs::remove_file(&path).await.unwrap();
    }
}
