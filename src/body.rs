//! Streaming response bodies.
//!
//! Everything downstream of the transport works on [`Body`], an owned
//! `AsyncRead`. Bodies are never collected into memory: index partitions are
//! decompressed on the fly by [`GunzipReader`] and split into lines by
//! [`read_line`], and filing documents are scanned the same way. Dropping a
//! body releases the underlying connection, so every early return or `?`
//! cleans up on its own.

use futures_util::Stream;
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll, ready};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncRead, ReadBuf};

/// Owned, forward-only byte stream returned by a [`Transport`](crate::Transport).
pub type Body = Pin<Box<dyn AsyncRead + Send>>;

/// Adapts a stream of byte chunks (such as `reqwest::Response::bytes_stream`)
/// into an `AsyncRead`.
pub struct StreamBody<S, B> {
    stream: Pin<Box<S>>,
    chunk: Option<B>,
    pos: usize,
}

impl<S, B, E> StreamBody<S, B>
where
    S: Stream<Item = std::result::Result<B, E>>,
{
    pub fn new(stream: S) -> Self {
        Self {
            stream: Box::pin(stream),
            chunk: None,
            pos: 0,
        }
    }
}

impl<S, B, E> AsyncRead for StreamBody<S, B>
where
    S: Stream<Item = std::result::Result<B, E>>,
    B: AsRef<[u8]> + Unpin,
    E: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = &mut *self;
        loop {
            if let Some(chunk) = &this.chunk {
                let bytes = chunk.as_ref();
                if this.pos < bytes.len() {
                    let n = buf.remaining().min(bytes.len() - this.pos);
                    buf.put_slice(&bytes[this.pos..this.pos + n]);
                    this.pos += n;
                    return Poll::Ready(Ok(()));
                }
                this.chunk = None;
                this.pos = 0;
            }

            match ready!(this.stream.as_mut().poll_next(cx)) {
                Some(Ok(chunk)) => this.chunk = Some(chunk),
                Some(Err(e)) => return Poll::Ready(Err(io::Error::other(e))),
                None => return Poll::Ready(Ok(())),
            }
        }
    }
}

/// Compressed bytes read per poll of the inner reader.
#[cfg(feature = "index")]
const GUNZIP_CHUNK_SIZE: usize = 8 * 1024;

/// Decompresses a gzip stream as it is read.
///
/// Compressed bytes are pushed through a `flate2` write-side decoder, so only
/// one chunk of input and its decompressed output are held at a time.
/// Concatenated gzip members decode as one stream. An input that ends before
/// yielding a single byte is treated as an empty stream rather than a
/// truncated gzip header.
///
/// Errors raised by the decoder itself have kind `InvalidData`; errors from
/// the inner reader are passed through untouched.
#[cfg(feature = "index")]
pub struct GunzipReader<R> {
    inner: R,
    decoder: flate2::write::MultiGzDecoder<Vec<u8>>,
    pos: usize,
    seen_input: bool,
    finished: bool,
}

#[cfg(feature = "index")]
impl<R> GunzipReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            decoder: flate2::write::MultiGzDecoder::new(Vec::new()),
            pos: 0,
            seen_input: false,
            finished: false,
        }
    }
}

#[cfg(feature = "index")]
impl<R: AsyncRead + Unpin> AsyncRead for GunzipReader<R> {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        use std::io::Write;

        let this = &mut *self;
        loop {
            let pending = this.decoder.get_ref();
            if this.pos < pending.len() {
                let n = buf.remaining().min(pending.len() - this.pos);
                buf.put_slice(&pending[this.pos..this.pos + n]);
                this.pos += n;
                if this.pos == this.decoder.get_ref().len() {
                    this.decoder.get_mut().clear();
                    this.pos = 0;
                }
                return Poll::Ready(Ok(()));
            }
            if this.finished {
                return Poll::Ready(Ok(()));
            }

            let mut chunk = [0u8; GUNZIP_CHUNK_SIZE];
            let mut input = ReadBuf::new(&mut chunk);
            ready!(Pin::new(&mut this.inner).poll_read(cx, &mut input))?;
            let filled = input.filled();

            if filled.is_empty() {
                this.finished = true;
                if this.seen_input {
                    this.decoder.try_finish().map_err(invalid_data)?;
                }
            } else {
                this.seen_input = true;
                this.decoder.write_all(filled).map_err(invalid_data)?;
                // decoder holds back output until flushed
                this.decoder.flush().map_err(invalid_data)?;
            }
        }
    }
}

#[cfg(feature = "index")]
fn invalid_data(e: io::Error) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, e)
}

/// Reads the next line into `buf`, stripping the `\n` or `\r\n` terminator.
///
/// Returns `Ok(false)` once the reader is exhausted and nothing was read.
pub(crate) async fn read_line<R>(reader: &mut R, buf: &mut Vec<u8>) -> io::Result<bool>
where
    R: AsyncBufRead + Unpin,
{
    buf.clear();
    if reader.read_until(b'\n', buf).await? == 0 {
        return Ok(false);
    }
    if buf.last() == Some(&b'\n') {
        buf.pop();
        if buf.last() == Some(&b'\r') {
            buf.pop();
        }
    }
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::stream;
    use tokio::io::{AsyncReadExt, BufReader};

    #[tokio::test]
    async fn test_stream_body_concatenates_chunks() {
        let chunks: Vec<io::Result<Vec<u8>>> =
            vec![Ok(b"hello ".to_vec()), Ok(Vec::new()), Ok(b"world".to_vec())];
        let mut body = StreamBody::new(stream::iter(chunks));

        let mut out = String::new();
        body.read_to_string(&mut out).await.unwrap();
        assert_eq!(out, "hello world");
    }

    #[tokio::test]
    async fn test_stream_body_surfaces_errors() {
        let chunks: Vec<io::Result<Vec<u8>>> = vec![
            Ok(b"partial".to_vec()),
            Err(io::Error::new(io::ErrorKind::ConnectionReset, "reset")),
        ];
        let mut body = StreamBody::new(stream::iter(chunks));

        let mut out = Vec::new();
        let err = body.read_to_end(&mut out).await.unwrap_err();
        assert_eq!(err.to_string(), "reset");
    }

    #[cfg(feature = "index")]
    #[tokio::test]
    async fn test_gunzip_reader_roundtrip() {
        use flate2::{Compression, write::GzEncoder};
        use std::io::Write;

        let text = "line one\nline two\n".repeat(2_000);
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(text.as_bytes()).unwrap();
        let compressed = encoder.finish().unwrap();

        let mut reader = GunzipReader::new(&compressed[..]);
        let mut out = String::new();
        reader.read_to_string(&mut out).await.unwrap();
        assert_eq!(out, text);
    }

    #[cfg(feature = "index")]
    #[tokio::test]
    async fn test_gunzip_reader_concatenated_members() {
        use flate2::{Compression, write::GzEncoder};
        use std::io::Write;

        let mut compressed = Vec::new();
        for part in ["first\n", "second\n"] {
            let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
            encoder.write_all(part.as_bytes()).unwrap();
            compressed.extend(encoder.finish().unwrap());
        }

        let mut reader = GunzipReader::new(&compressed[..]);
        let mut out = String::new();
        reader.read_to_string(&mut out).await.unwrap();
        assert_eq!(out, "first\nsecond\n");
    }

    #[cfg(feature = "index")]
    #[tokio::test]
    async fn test_gunzip_reader_truncated_input() {
        use flate2::{Compression, write::GzEncoder};
        use std::io::Write;

        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all("line\n".repeat(100).as_bytes()).unwrap();
        let compressed = encoder.finish().unwrap();

        let mut reader = GunzipReader::new(&compressed[..compressed.len() - 4]);
        let mut out = Vec::new();
        let err = reader.read_to_end(&mut out).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[cfg(feature = "index")]
    #[tokio::test]
    async fn test_gunzip_reader_empty_input() {
        let mut reader = GunzipReader::new(&b""[..]);
        let mut out = Vec::new();
        reader.read_to_end(&mut out).await.unwrap();
        assert!(out.is_empty());
    }

    #[cfg(feature = "index")]
    #[tokio::test]
    async fn test_gunzip_reader_rejects_garbage() {
        let mut reader = GunzipReader::new(&b"definitely not gzip"[..]);
        let mut out = Vec::new();
        let err = reader.read_to_end(&mut out).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[tokio::test]
    async fn test_read_line_strips_terminators() {
        let mut reader = BufReader::new(&b"first\r\nsecond\n\nlast"[..]);
        let mut line = Vec::new();
        let mut lines = Vec::new();
        while read_line(&mut reader, &mut line).await.unwrap() {
            lines.push(String::from_utf8(line.clone()).unwrap());
        }
        assert_eq!(lines, vec!["first", "second", "", "last"]);
    }
}
