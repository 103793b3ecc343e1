use std::env;
use std::str::FromStr;

use tracing::warn;

#[derive(Clone, Copy, Debug)]
pub enum EnvKey {
    ServerPort,
    DatabaseUrl,
    S3Bucket,
    S3Region,
    S3Endpoint,
    S3AccessKey,
    S3SecretKey,
    PublicBaseUrl,
    JwtSecret,
    UploadTmpDir,
    FfprobePath,
    FfmpegPath,
    ProbeTimeoutSecs,
    RemuxTimeoutSecs,
    MaxUploadBytes,
}

impl EnvKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            EnvKey::ServerPort => "APP_PORT",
            EnvKey::DatabaseUrl => "DATABASE_URL",
            EnvKey::S3Bucket => "S3_BUCKET",
            EnvKey::S3Region => "S3_REGION",
            EnvKey::S3Endpoint => "S3_ENDPOINT",
            EnvKey::S3AccessKey => "AWS_ACCESS_KEY_ID",
            EnvKey::S3SecretKey => "AWS_SECRET_ACCESS_KEY",
            EnvKey::PublicBaseUrl => "PUBLIC_BASE_URL",
            EnvKey::JwtSecret => "JWT_SECRET",
            EnvKey::UploadTmpDir => "UPLOAD_TMP_DIR",
            EnvKey::FfprobePath => "FFPROBE_PATH",
            EnvKey::FfmpegPath => "FFMPEG_PATH",
            EnvKey::ProbeTimeoutSecs => "PROBE_TIMEOUT_SECS",
            EnvKey::RemuxTimeoutSecs => "REMUX_TIMEOUT_SECS",
            EnvKey::MaxUploadBytes => "MAX_UPLOAD_BYTES",
        }
    }
}

pub fn get(key: EnvKey) -> Result<String, env::VarError> {
    env::var(key.as_str())
}

pub fn get_optional(key: EnvKey) -> Option<String> {
    env::var(key.as_str()).ok().filter(|v| !v.trim().is_empty())
}

pub fn get_or(key: EnvKey, default: &str) -> String {
    env::var(key.as_str()).unwrap_or_else(|_| default.to_string())
}

/// Unset keys fall back to `default` quietly; malformed values fall back with a
/// warning naming the key.
pub fn get_parsed<T: FromStr>(key: EnvKey, default: T) -> T {
    match get(key) {
        Ok(val) => val.trim().parse::<T>().unwrap_or_else(|_| {
            warn!(key = key.as_str(), value = %val, "⚠️ Invalid value, using default");
            default
        }),
        Err(_) => default,
    }
}
