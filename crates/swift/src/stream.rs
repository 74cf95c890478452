//! Chunked streaming of object content

use std::pin::Pin;
use std::task::{Context, Poll, ready};

use bytes::{Bytes, BytesMut};
use futures::stream::{BoxStream, Stream, StreamExt};
use sc_core::{Error, Result};

/// Default chunk size for streamed downloads (1 MiB)
pub const DEFAULT_CHUNK_SIZE: usize = 1 << 20;

/// Forward-only stream of object content in fixed-size chunks
///
/// Every chunk except the last is exactly `chunk_size` bytes. The stream owns
/// the HTTP response; dropping it at any point releases the connection.
pub struct ObjectStream {
    inner: BoxStream<'static, Result<Bytes>>,
    buffer: BytesMut,
    chunk_size: usize,
    content_length: Option<u64>,
    done: bool,
}

impl ObjectStream {
    pub(crate) fn new(
        inner: BoxStream<'static, Result<Bytes>>,
        chunk_size: usize,
        content_length: Option<u64>,
    ) -> Self {
        Self {
            inner,
            buffer: BytesMut::with_capacity(chunk_size.min(DEFAULT_CHUNK_SIZE)),
            chunk_size,
            content_length,
            done: false,
        }
    }

    pub(crate) fn from_response(response: reqwest::Response, url: String, chunk_size: usize) -> Self {
        let content_length = response.content_length();
        let inner = response
            .bytes_stream()
            .map(move |chunk| {
                chunk.map_err(|e| Error::Network(format!("reading body of {url} failed: {e}")))
            })
            .boxed();
        Self::new(inner, chunk_size, content_length)
    }

    /// Total body length announced by the server, if any
    pub fn content_length(&self) -> Option<u64> {
        self.content_length
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }
}

impl Stream for ObjectStream {
    type Item = Result<Bytes>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        loop {
            if this.buffer.len() >= this.chunk_size {
                return Poll::Ready(Some(Ok(this.buffer.split_to(this.chunk_size).freeze())));
            }
            if this.done {
                if this.buffer.is_empty() {
                    return Poll::Ready(None);
                }
                return Poll::Ready(Some(Ok(this.buffer.split().freeze())));
            }
            match ready!(this.inner.poll_next_unpin(cx)) {
                Some(Ok(bytes)) => this.buffer.extend_from_slice(&bytes),
                Some(Err(e)) => {
                    this.done = true;
                    this.buffer.clear();
                    return Poll::Ready(Some(Err(e)));
                }
                None => this.done = true,
            }
        }
    }
}

impl std::fmt::Debug for ObjectStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectStream")
            .field("chunk_size", &self.chunk_size)
            .field("content_length", &self.content_length)
            .field("buffered", &self.buffer.len())
            .field("done", &self.done)
            .finish_non_exhaustive()
    }
}
