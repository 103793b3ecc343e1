use std::{io, path::Path};

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

pub mod s3;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to open {path} for upload: {source}")]
    Read {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("put of {key} failed: {source}")]
    Put {
        key: String,
        #[source]
        source: BoxError,
    },
}

/// What gets written under a key.
pub enum ObjectBody<'a> {
    /// Streamed from a local file.
    File(&'a Path),
    Bytes(Bytes),
}

/// Blob storage addressed solely by `(bucket, key)`. A `put` is atomic: the
/// object is either fully visible afterwards or not at all.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn put(
        &self,
        bucket: &str,
        key: &str,
        body: ObjectBody<'_>,
        content_type: &str,
    ) -> Result<(), StoreError>;
}
