use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::io::AsyncWrite;

/// Counts the bytes accepted by the wrapped sink.
#[derive(Debug)]
pub struct AsyncWriteWrapper<W: AsyncWrite + Unpin> {
    writer: W,
    written_bytes_count: u64,
}

impl<W: AsyncWrite + Unpin> AsyncWriteWrapper<W> {
    pub fn new(writer: W) -> AsyncWriteWrapper<W> {
        Self {
            writer,
            written_bytes_count: 0,
        }
    }

    pub fn written_bytes_count(&self) -> u64 {
        self.written_bytes_count
    }

    pub fn retrieve_writer(self) -> W {
        self.writer
    }
}

impl<W: AsyncWrite + Unpin> AsyncWrite for AsyncWriteWrapper<W> {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<Result<usize, std::io::Error>> {
        let wrapper = self.get_mut();
        let result = Pin::new(&mut wrapper.writer).poll_write(cx, buf);

        if let Poll::Ready(Ok(nb_byte_written)) = result {
            wrapper.written_bytes_count += nb_byte_written as u64;
        }
        result
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Result<(), std::io::Error>> {
        Pin::new(&mut self.get_mut().writer).poll_flush(cx)
    }

    fn poll_shutdown(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Result<(), std::io::Error>> {
        Pin::new(&mut self.get_mut().writer).poll_shutdown(cx)
    }
}
