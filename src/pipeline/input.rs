//! Input normalisation: every entry point ends up as one [`DocumentReader`].
//!
//! Readers are taken by value and dropped as soon as the document has been
//! read, so a file handle opened here is closed on success, on error, and
//! when the caller cancels mid-read.

use crate::error::DecodeError;
use bytes::Bytes;
use std::io::Cursor;
use std::path::Path;
use std::pin::Pin;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio_util::sync::CancellationToken;
use tracing::trace;

/// Boxed async byte source accepted by [`crate::ContentDecoder::decode_stream`].
pub type DocumentReader = Pin<Box<dyn AsyncRead + Send>>;

/// Open a file for reading.
pub async fn open_file(path: &Path) -> Result<DocumentReader, DecodeError> {
    let file = tokio::fs::File::open(path).await?;
    trace!("Opened {}", path.display());
    Ok(Box::pin(file))
}

/// Expose an in-memory buffer as a reader.
pub fn from_bytes(data: Bytes) -> DocumentReader {
    Box::pin(Cursor::new(data))
}

/// Read the whole document, giving up as soon as `cancel` fires.
///
/// The reader is consumed; it is dropped before this function returns on
/// every path.
pub async fn read_document(
    mut reader: DocumentReader,
    cancel: &CancellationToken,
) -> Result<Bytes, DecodeError> {
    let mut buf = Vec::new();
    let read = tokio::select! {
        biased;
        _ = cancel.cancelled() => return Err(DecodeError::Cancelled),
        read = reader.read_to_end(&mut buf) => read,
    };
    read?;
    trace!("Read {} document bytes", buf.len());
    Ok(Bytes::from(buf))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::time::Duration;

    #[tokio::test]
    async fn reads_in_memory_bytes() {
        let data = Bytes::from_static(b"%PDF-1.7 hello");
        let out = read_document(from_bytes(data.clone()), &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(out, data);
    }

    #[tokio::test]
    async fn reads_file_contents() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        tmp.write_all(b"%PDF-1.4 file body").unwrap();

        let reader = open_file(tmp.path()).await.unwrap();
        let out = read_document(reader, &CancellationToken::new()).await.unwrap();
        assert_eq!(&out[..], b"%PDF-1.4 file body");
    }

    #[tokio::test]
    async fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = match open_file(&dir.path().join("absent.pdf")).await {
            Ok(_) => panic!("opening a missing file should fail"),
            Err(e) => e,
        };
        assert!(matches!(err, DecodeError::Io { .. }), "got: {err:?}");
    }

    #[tokio::test]
    async fn pre_cancelled_token_wins() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = read_document(from_bytes(Bytes::from_static(b"x")), &cancel)
            .await
            .unwrap_err();
        assert!(err.is_cancelled());
    }

    #[tokio::test]
    async fn cancel_interrupts_a_stalled_read() {
        // The writer half stays alive, so the read never completes on its own.
        let (reader, _writer) = tokio::io::duplex(64);
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            trigger.cancel();
        });

        let err = read_document(Box::pin(reader), &cancel).await.unwrap_err();
        assert!(err.is_cancelled());
    }
}
