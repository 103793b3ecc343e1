//! External media tooling, modelled as capabilities so the upload pipeline can
//! run against ffmpeg, a linked codec library, or a remote service alike.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use thiserror::Error;

pub mod command;
pub mod ffmpeg;
pub mod ffprobe;

pub use command::CommandError;

/// Pixel size of a video stream.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("probe command failed: {0}")]
    Command(#[from] CommandError),

    #[error("probe output is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("no video stream found")]
    NoVideoStream,

    #[error("video stream has unusable dimensions {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },
}

#[derive(Debug, Error)]
pub enum RemuxError {
    #[error("remux command failed: {0}")]
    Command(#[from] CommandError),

    #[error("remux produced no output at {0}")]
    MissingOutput(PathBuf),
}

/// Reads the primary video stream's dimensions from a local file.
#[async_trait]
pub trait MediaProbe: Send + Sync {
    async fn dimensions(&self, path: &Path) -> Result<Dimensions, ProbeError>;
}

/// Rewrites a container so its index precedes the sample data.
///
/// Implementations write to `output` and must leave `input` untouched.
#[async_trait]
pub trait Remuxer: Send + Sync {
    async fn remux(&self, input: &Path, output: &Path) -> Result<(), RemuxError>;
}
