use std::io;

use axum::{extract::multipart::MultipartError, http::StatusCode};
use bytes::{Bytes, BytesMut};
use futures_util::{Stream, StreamExt, TryStreamExt};
use thiserror::Error;
use tokio::{
    fs::File,
    io::{AsyncSeekExt, AsyncWriteExt},
};
use tokio_util::io::StreamReader;

#[derive(Debug, Error)]
pub enum ReadLimitError {
    #[error("body exceeds {0} bytes")]
    TooLarge(usize),

    #[error("stream interrupted: {0}")]
    Io(#[from] io::Error),
}

/// Error type of an incoming body stream.
pub trait BodyError: std::error::Error + Send + Sync + 'static {
    /// True when the body was cut off by the configured size limit.
    fn is_too_large(&self) -> bool {
        false
    }
}

impl BodyError for io::Error {}

impl BodyError for MultipartError {
    fn is_too_large(&self) -> bool {
        self.status() == StatusCode::PAYLOAD_TOO_LARGE
    }
}

/// Size-limit failures become [`io::ErrorKind::FileTooLarge`] so callers can
/// tell them apart from a broken connection.
fn into_io_error<E: BodyError>(err: E) -> io::Error {
    if err.is_too_large() {
        io::Error::new(io::ErrorKind::FileTooLarge, err)
    } else {
        io::Error::other(err)
    }
}

/// Copies an incoming body into `file` and rewinds it to the start.
///
/// Returns the number of bytes written.
pub async fn stage_stream<S, E>(body: S, file: &mut File) -> io::Result<u64>
where
    S: Stream<Item = Result<Bytes, E>>,
    E: BodyError,
{
    let reader = StreamReader::new(body.map_err(into_io_error));
    tokio::pin!(reader);

    let written = tokio::io::copy(&mut reader, file).await?;
    file.flush().await?;
    file.rewind().await?;

    Ok(written)
}

/// Buffers a small body in memory, refusing anything larger than `limit`.
pub async fn read_limited<S, E>(body: S, limit: usize) -> Result<Bytes, ReadLimitError>
where
    S: Stream<Item = Result<Bytes, E>>,
    E: BodyError,
{
    let mut body = std::pin::pin!(body);
    let mut buffer = BytesMut::new();

    while let Some(chunk) = body.next().await {
        let chunk = chunk.map_err(into_io_error)?;

        if buffer.len() + chunk.len() > limit {
            return Err(ReadLimitError::TooLarge(limit));
        }

        buffer.extend_from_slice(&chunk);
    }

    Ok(buffer.freeze())
}
