use std::{ffi::OsStr, path::Path, time::Duration};

use async_trait::async_trait;

use super::{command, RemuxError, Remuxer};

/// Moves the `moov` atom to the front with a stream copy; samples are never
/// re-encoded.
#[derive(Clone, Debug)]
pub struct FfmpegRemuxer {
    program: String,
    timeout: Duration,
}

impl FfmpegRemuxer {
    pub fn new(program: impl Into<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            timeout,
        }
    }
}

#[async_trait]
impl Remuxer for FfmpegRemuxer {
    #[tracing::instrument(skip(self))]
    async fn remux(&self, input: &Path, output: &Path) -> Result<(), RemuxError> {
        let args: [&OsStr; 12] = [
            "-nostdin".as_ref(),
            "-v".as_ref(),
            "error".as_ref(),
            "-i".as_ref(),
            input.as_os_str(),
            "-c".as_ref(),
            "copy".as_ref(),
            "-movflags".as_ref(),
            "faststart".as_ref(),
            "-f".as_ref(),
            "mp4".as_ref(),
            output.as_os_str(),
        ];

        command::run(&self.program, &args, self.timeout).await?;

        Ok(())
    }
}
