//! Bounded in-process byte pipe feeding a streaming request body.
//!
//! The writer end belongs to the producer task, the reader end becomes the
//! upload body. Dropping the writer ends the body; closing it with an error
//! makes the body fail, which aborts the upload.

use std::io;

use bytes::Bytes;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

/// Chunks buffered between producer and upload.
pub const DEFAULT_PIPE_CAPACITY: usize = 16;

type Chunk = io::Result<Bytes>;

/// Create a connected writer/reader pair.
pub fn body_pipe(capacity: usize) -> (PipeWriter, PipeReader) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (PipeWriter { tx }, PipeReader { rx })
}

/// Producer end.
#[derive(Debug)]
pub struct PipeWriter {
    tx: mpsc::Sender<Chunk>,
}

impl PipeWriter {
    /// Send one chunk, waiting while the pipe is full.
    ///
    /// Fails with `BrokenPipe` once the reader is gone.
    pub async fn write(&self, chunk: Bytes) -> io::Result<()> {
        if chunk.is_empty() {
            return Ok(());
        }
        self.tx
            .send(Ok(chunk))
            .await
            .map_err(|_| io::Error::new(io::ErrorKind::BrokenPipe, "upload body reader closed"))
    }

    /// Resolves once the reader is gone.
    pub async fn closed(&self) {
        self.tx.closed().await
    }

    /// End of body.
    pub fn close(self) {}

    /// Terminate the body with `error`; the reader sees it as its last item.
    pub async fn close_with_error(self, error: io::Error) {
        // A reader that is already gone needs no notification.
        let _ = self.tx.send(Err(error)).await;
    }
}

/// Consumer end.
#[derive(Debug)]
pub struct PipeReader {
    rx: mpsc::Receiver<Chunk>,
}

impl PipeReader {
    pub fn into_stream(self) -> ReceiverStream<Chunk> {
        ReceiverStream::new(self.rx)
    }

    /// Streaming request body.
    pub fn into_body(self) -> reqwest::Body {
        reqwest::Body::wrap_stream(self.into_stream())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::StreamExt;

    #[tokio::test]
    async fn test_chunks_in_order_then_end() {
        let (writer, reader) = body_pipe(2);
        let producer = tokio::spawn(async move {
            for chunk in ["a", "b", "c"] {
                writer.write(Bytes::from_static(chunk.as_bytes())).await.unwrap();
            }
            writer.close();
        });

        let chunks: Vec<Bytes> = reader
            .into_stream()
            .map(|c| c.unwrap())
            .collect()
            .await;
        producer.await.unwrap();
        assert_eq!(chunks, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_close_with_error_ends_reader() {
        let (writer, reader) = body_pipe(4);
        writer.write(Bytes::from_static(b"part")).await.unwrap();
        writer
            .close_with_error(io::Error::new(io::ErrorKind::TimedOut, "deadline"))
            .await;

        let mut stream = reader.into_stream();
        assert!(stream.next().await.unwrap().is_ok());
        let err = stream.next().await.unwrap().unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::TimedOut);
        assert!(stream.next().await.is_none());
    }

    #[tokio::test]
    async fn test_write_after_reader_dropped() {
        let (writer, reader) = body_pipe(1);
        drop(reader);
        let err = writer.write(Bytes::from_static(b"x")).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
    }

    #[tokio::test]
    async fn test_closed_resolves_when_reader_dropped() {
        let (writer, reader) = body_pipe(1);
        let waiter = tokio::spawn(async move { writer.closed().await });
        tokio::task::yield_now().await;
        assert!(!waiter.is_finished());

        drop(reader);
        tokio::time::timeout(std::time::Duration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap();
    }
}
