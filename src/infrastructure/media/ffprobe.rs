use std::{ffi::OsStr, path::Path, time::Duration};

use async_trait::async_trait;
use serde::Deserialize;

use super::{command, Dimensions, MediaProbe, ProbeError};

#[derive(Debug, Deserialize)]
struct FfProbeOutput {
    #[serde(default)]
    streams: Vec<FfProbeStream>,
}

#[derive(Debug, Deserialize)]
struct FfProbeStream {
    codec_type: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    #[serde(default)]
    disposition: FfProbeDisposition,
}

#[derive(Debug, Default, Deserialize)]
struct FfProbeDisposition {
    #[serde(default)]
    attached_pic: u8,
}

impl FfProbeStream {
    /// Cover art is reported as a video stream with `attached_pic` set.
    fn is_primary_video(&self) -> bool {
        self.codec_type.as_deref() == Some("video") && self.disposition.attached_pic == 0
    }
}

/// `ffprobe` backed [`MediaProbe`].
#[derive(Clone, Debug)]
pub struct FfProbe {
    program: String,
    timeout: Duration,
}

impl FfProbe {
    pub fn new(program: impl Into<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            timeout,
        }
    }
}

#[async_trait]
impl MediaProbe for FfProbe {
    #[tracing::instrument(skip(self))]
    async fn dimensions(&self, path: &Path) -> Result<Dimensions, ProbeError> {
        let args: [&OsStr; 6] = [
            "-v".as_ref(),
            "error".as_ref(),
            "-print_format".as_ref(),
            "json".as_ref(),
            "-show_streams".as_ref(),
            path.as_os_str(),
        ];

        let output = command::run(&self.program, &args, self.timeout).await?;

        parse_dimensions(&output.stdout)
    }
}

/// Picks the first video stream out of `ffprobe -show_streams` JSON, ignoring
/// embedded cover art.
pub fn parse_dimensions(stdout: &[u8]) -> Result<Dimensions, ProbeError> {
    let output: FfProbeOutput = serde_json::from_slice(stdout)?;

    let stream = output
        .streams
        .into_iter()
        .find(FfProbeStream::is_primary_video)
        .ok_or(ProbeError::NoVideoStream)?;

    match (stream.width, stream.height) {
        (Some(width), Some(height)) if width > 0 && height > 0 => Ok(Dimensions { width, height }),
        (width, height) => Err(ProbeError::InvalidDimensions {
            width: width.unwrap_or(0),
            height: height.unwrap_or(0),
        }),
    }
}
