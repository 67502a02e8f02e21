//! The incremental-transport seam between provider clients and the wire.
//!
//! Two structurally different transports hide behind one contract:
//! newline-delimited JSON read straight off a byte connection
//! (`NdjsonStream`, here) and an SSE event iterator
//! (`SseStream` in `providers::openai`). The session layer only ever sees
//! `scan`/`bytes`/`close`.

use async_trait::async_trait;
use futures::stream::BoxStream;
use futures::StreamExt;

use crate::llm::types::LlmError;

/// One open, in-flight response stream.
///
/// Contract:
/// - `scan` advances to the next unit; `Ok(false)` means the transport is
///   exhausted. A transport error closes the reader before it is returned.
/// - `bytes` returns the most recently scanned unit's payload. After
///   `close` or an exhausted `scan` it returns an empty slice.
/// - `close` releases the connection and is safe to call repeatedly,
///   including after exhaustion. A closed reader scans `Ok(false)`.
#[async_trait]
pub trait StreamReader: Send {
    async fn scan(&mut self) -> Result<bool, LlmError>;
    fn bytes(&self) -> &[u8];
    fn close(&mut self);
}

/// An open stream for exactly one turn. Never shared across turns or
/// providers; travels by value through the dispatch loop's messages.
pub type StreamHandle = Box<dyn StreamReader>;

/// Scans newline-delimited JSON units off a raw byte stream.
///
/// Chunk boundaries are arbitrary: a unit may span several chunks or a
/// chunk may carry several units, so bytes are buffered until a full line
/// is available. A final unterminated line is still yielded.
pub struct NdjsonStream {
    inner: Option<BoxStream<'static, Result<Vec<u8>, LlmError>>>,
    buffer: Vec<u8>,
    line: Vec<u8>,
}

impl NdjsonStream {
    pub fn new(
        stream: impl futures::Stream<Item = Result<Vec<u8>, LlmError>> + Send + 'static,
    ) -> Self {
        NdjsonStream {
            inner: Some(stream.boxed()),
            buffer: Vec::new(),
            line: Vec::new(),
        }
    }

    fn take_line(&mut self, newline_at: usize) {
        self.line = self.buffer.drain(..=newline_at).collect();
        self.line.pop(); // the \n itself
        if self.line.last() == Some(&b'\r') {
            self.line.pop();
        }
    }
}

#[async_trait]
impl StreamReader for NdjsonStream {
    async fn scan(&mut self) -> Result<bool, LlmError> {
        if self.inner.is_none() {
            self.line.clear();
            return Ok(false);
        }

        loop {
            if let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
                self.take_line(pos);
                return Ok(true);
            }
            let next = match self.inner.as_mut() {
                Some(inner) => inner.next().await,
                None => None,
            };
            match next {
                Some(Ok(chunk)) => self.buffer.extend_from_slice(&chunk),
                Some(Err(err)) => {
                    self.close();
                    return Err(err);
                }
                None => {
                    if self.buffer.is_empty() {
                        self.close();
                        return Ok(false);
                    }
                    // Transport ended without a trailing newline.
                    self.line = std::mem::take(&mut self.buffer);
                    self.inner = None;
                    return Ok(true);
                }
            }
        }
    }

    fn bytes(&self) -> &[u8] {
        &self.line
    }

    fn close(&mut self) {
        self.inner = None;
        self.buffer.clear();
        self.line.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;

    fn chunked(chunks: Vec<&str>) -> NdjsonStream {
        let owned: Vec<Result<Vec<u8>, LlmError>> = chunks
            .into_iter()
            .map(|c| Ok(c.as_bytes().to_vec()))
            .collect();
        NdjsonStream::new(stream::iter(owned))
    }

    async fn scan_line(reader: &mut NdjsonStream) -> Option<String> {
        if reader.scan().await.unwrap() {
            Some(String::from_utf8(reader.bytes().to_vec()).unwrap())
        } else {
            None
        }
    }

    #[tokio::test]
    async fn test_one_line_per_chunk() {
        let mut reader = chunked(vec!["{\"a\":1}\n", "{\"a\":2}\n"]);
        assert_eq!(scan_line(&mut reader).await.as_deref(), Some("{\"a\":1}"));
        assert_eq!(scan_line(&mut reader).await.as_deref(), Some("{\"a\":2}"));
        assert_eq!(scan_line(&mut reader).await, None);
    }

    #[tokio::test]
    async fn test_line_split_across_chunks() {
        let mut reader = chunked(vec!["{\"a\"", ":1}", "\n{\"a\":2}\n"]);
        assert_eq!(scan_line(&mut reader).await.as_deref(), Some("{\"a\":1}"));
        assert_eq!(scan_line(&mut reader).await.as_deref(), Some("{\"a\":2}"));
        assert_eq!(scan_line(&mut reader).await, None);
    }

    #[tokio::test]
    async fn test_final_unterminated_line_is_yielded() {
        let mut reader = chunked(vec!["{\"a\":1}\n{\"a\":2}"]);
        assert_eq!(scan_line(&mut reader).await.as_deref(), Some("{\"a\":1}"));
        assert_eq!(scan_line(&mut reader).await.as_deref(), Some("{\"a\":2}"));
        assert_eq!(scan_line(&mut reader).await, None);
    }

    #[tokio::test]
    async fn test_crlf_is_stripped() {
        let mut reader = chunked(vec!["{\"a\":1}\r\n"]);
        assert_eq!(scan_line(&mut reader).await.as_deref(), Some("{\"a\":1}"));
    }

    #[tokio::test]
    async fn test_exhausted_scan_clears_bytes() {
        let mut reader = chunked(vec!["{\"a\":1}\n"]);
        assert!(reader.scan().await.unwrap());
        assert!(!reader.scan().await.unwrap());
        assert!(reader.bytes().is_empty());
    }

    #[tokio::test]
    async fn test_close_before_done_is_safe_and_makes_reader_inert() {
        let mut reader = chunked(vec!["{\"a\":1}\n{\"a\":2}\n"]);
        assert!(reader.scan().await.unwrap());
        reader.close();
        reader.close(); // idempotent
        assert!(reader.bytes().is_empty());
        assert!(!reader.scan().await.unwrap());
    }

    #[tokio::test]
    async fn test_transport_error_closes_reader() {
        let items: Vec<Result<Vec<u8>, LlmError>> = vec![
            Ok(b"{\"a\":1}\n".to_vec()),
            Err(LlmError::Transport("connection reset".to_string())),
        ];
        let mut reader = NdjsonStream::new(stream::iter(items));
        assert!(reader.scan().await.unwrap());
        let err = reader.scan().await.unwrap_err();
        assert!(matches!(err, LlmError::Transport(_)));
        assert!(!reader.scan().await.unwrap());
        assert!(reader.bytes().is_empty());
    }
}
