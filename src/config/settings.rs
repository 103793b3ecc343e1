use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use url::Url;

use crate::config::env::{self, EnvKey};

/// 1 GiB.
const DEFAULT_MAX_UPLOAD_BYTES: usize = 1 << 30;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    #[error("{key} is not a valid absolute URL: {source}")]
    InvalidUrl {
        key: &'static str,
        #[source]
        source: url::ParseError,
    },
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub server_port: u16,
    pub database_url: String,
    pub s3_bucket: String,
    pub s3_region: String,
    pub s3_endpoint: Option<String>,
    pub s3_access_key: String,
    pub s3_secret_key: String,
    pub public_base_url: String,
    pub jwt_secret: String,
    pub upload_tmp_dir: PathBuf,
    pub ffprobe_path: String,
    pub ffmpeg_path: String,
    pub probe_timeout_secs: u64,
    pub remux_timeout_secs: u64,
    pub max_upload_bytes: usize,
}

impl AppConfig {
    pub fn new() -> Result<Self, ConfigError> {
        let public_base_url = required(EnvKey::PublicBaseUrl)?;
        Url::parse(&public_base_url).map_err(|source| ConfigError::InvalidUrl {
            key: EnvKey::PublicBaseUrl.as_str(),
            source,
        })?;

        let upload_tmp_dir = env::get_optional(EnvKey::UploadTmpDir)
            .map(PathBuf::from)
            .unwrap_or_else(std::env::temp_dir);

        Ok(Self {
            server_port: env::get_parsed(EnvKey::ServerPort, 8091),
            database_url: required(EnvKey::DatabaseUrl)?,
            s3_bucket: required(EnvKey::S3Bucket)?,
            s3_region: env::get_or(EnvKey::S3Region, "us-east-1"),
            s3_endpoint: env::get_optional(EnvKey::S3Endpoint),
            s3_access_key: required(EnvKey::S3AccessKey)?,
            s3_secret_key: required(EnvKey::S3SecretKey)?,
            public_base_url,
            jwt_secret: required(EnvKey::JwtSecret)?,
            upload_tmp_dir,
            ffprobe_path: env::get_or(EnvKey::FfprobePath, "ffprobe"),
            ffmpeg_path: env::get_or(EnvKey::FfmpegPath, "ffmpeg"),
            probe_timeout_secs: env::get_parsed(EnvKey::ProbeTimeoutSecs, 30),
            remux_timeout_secs: env::get_parsed(EnvKey::RemuxTimeoutSecs, 300),
            max_upload_bytes: env::get_parsed(EnvKey::MaxUploadBytes, DEFAULT_MAX_UPLOAD_BYTES),
        })
    }

    pub fn upload_config(&self) -> UploadConfig {
        UploadConfig {
            bucket: self.s3_bucket.clone(),
            public_base_url: self.public_base_url.clone(),
            tmp_dir: self.upload_tmp_dir.clone(),
        }
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }

    pub fn remux_timeout(&self) -> Duration {
        Duration::from_secs(self.remux_timeout_secs)
    }
}

/// Immutable settings handed to the upload orchestrator at construction.
#[derive(Clone, Debug)]
pub struct UploadConfig {
    pub bucket: String,
    pub public_base_url: String,
    pub tmp_dir: PathBuf,
}

impl UploadConfig {
    /// Public URL of a committed object. The base is treated as opaque text.
    pub fn object_url(&self, key: &str) -> String {
        format!("{}/{}", self.public_base_url.trim_end_matches('/'), key)
    }
}

fn required(key: EnvKey) -> Result<String, ConfigError> {
    env::get_optional(key).ok_or(ConfigError::Missing(key.as_str()))
}
