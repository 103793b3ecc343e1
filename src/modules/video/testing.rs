//! In-memory collaborators for exercising the upload pipeline without
//! Postgres, S3 or ffmpeg.

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::{stream, Stream};
use tempfile::TempDir;
use time::OffsetDateTime;
use uuid::Uuid;

use super::model::Video;
use super::repository::{RepositoryError, VideoStore};
use super::service::UploadOrchestrator;
use crate::config::settings::UploadConfig;
use crate::infrastructure::media::{
    CommandError, Dimensions, MediaProbe, ProbeError, RemuxError, Remuxer,
};
use crate::infrastructure::storage::{ObjectBody, ObjectStore, StoreError};
use crate::modules::auth::{AuthError, TokenValidator};

/// Splits `data` into a multi-chunk body stream.
pub fn body(data: &[u8]) -> impl Stream<Item = Result<Bytes, io::Error>> + Send + 'static {
    let chunks: Vec<Result<Bytes, io::Error>> = data
        .chunks(64 * 1024)
        .map(|chunk| Ok(Bytes::copy_from_slice(chunk)))
        .collect();
    stream::iter(chunks)
}

pub struct StaticTokens(HashMap<String, Uuid>);

impl TokenValidator for StaticTokens {
    fn validate(&self, token: &str) -> Result<Uuid, AuthError> {
        self.0.get(token).copied().ok_or_else(|| {
            AuthError::InvalidToken(jsonwebtoken::errors::ErrorKind::InvalidToken.into())
        })
    }
}

#[derive(Default)]
pub struct MemoryVideos {
    videos: Mutex<HashMap<Uuid, Video>>,
    fail_updates: bool,
    pub gets: AtomicUsize,
    pub updates: AtomicUsize,
}

impl MemoryVideos {
    pub fn stored(&self, id: Uuid) -> Video {
        self.videos.lock().unwrap()[&id].clone()
    }
}

#[async_trait]
impl VideoStore for MemoryVideos {
    async fn get_video(&self, id: Uuid) -> Result<Video, RepositoryError> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        self.videos
            .lock()
            .unwrap()
            .get(&id)
            .cloned()
            .ok_or(RepositoryError::NotFound(id))
    }

    async fn update_video(&self, video: &Video) -> Result<Video, RepositoryError> {
        self.updates.fetch_add(1, Ordering::SeqCst);
        if self.fail_updates {
            return Err(RepositoryError::Database(sqlx::Error::PoolTimedOut));
        }

        let mut updated = video.clone();
        updated.updated_at = OffsetDateTime::now_utc();
        self.videos.lock().unwrap().insert(video.id, updated.clone());
        Ok(updated)
    }
}

#[derive(Clone, Debug)]
pub struct StoredObject {
    pub bucket: String,
    pub key: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

#[derive(Default)]
pub struct MemoryObjects {
    objects: Mutex<Vec<StoredObject>>,
    fail: bool,
    pub attempts: AtomicUsize,
}

impl MemoryObjects {
    pub fn puts(&self) -> Vec<StoredObject> {
        self.objects.lock().unwrap().clone()
    }
}

#[async_trait]
impl ObjectStore for MemoryObjects {
    async fn put(
        &self,
        bucket: &str,
        key: &str,
        body: ObjectBody<'_>,
        content_type: &str,
    ) -> Result<(), StoreError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(StoreError::Put {
                key: key.to_string(),
                source: Box::new(io::Error::new(io::ErrorKind::TimedOut, "bucket unreachable")),
            });
        }

        let data = match body {
            ObjectBody::File(path) => {
                tokio::fs::read(path).await.map_err(|source| StoreError::Read {
                    path: path.display().to_string(),
                    source,
                })?
            }
            ObjectBody::Bytes(bytes) => bytes.to_vec(),
        };

        self.objects.lock().unwrap().push(StoredObject {
            bucket: bucket.to_string(),
            key: key.to_string(),
            content_type: content_type.to_string(),
            data,
        });
        Ok(())
    }
}

/// Answers with fixed dimensions, or "no video stream" when `None`.
pub struct FixedProbe {
    dimensions: Option<Dimensions>,
    pub calls: AtomicUsize,
    pub saw_original_upload: AtomicBool,
}

#[async_trait]
impl MediaProbe for FixedProbe {
    async fn dimensions(&self, path: &Path) -> Result<Dimensions, ProbeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let is_upload = path
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.starts_with("tubely-upload"));
        if is_upload && path.is_file() {
            self.saw_original_upload.store(true, Ordering::SeqCst);
        }

        self.dimensions.ok_or(ProbeError::NoVideoStream)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RemuxMode {
    /// Writes `faststart:` followed by the input bytes.
    Succeed,
    /// Writes half an output file, then reports a tool failure.
    PartialThenFail,
    /// Reports success without writing anything.
    NoOutput,
}

pub struct FakeRemuxer {
    mode: RemuxMode,
    pub calls: AtomicUsize,
}

#[async_trait]
impl Remuxer for FakeRemuxer {
    async fn remux(&self, input: &Path, output: &Path) -> Result<(), RemuxError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        match self.mode {
            RemuxMode::Succeed => {
                let original = tokio::fs::read(input)
                    .await
                    .map_err(|e| RemuxError::Command(CommandError::Other(e)))?;
                tokio::fs::write(output, [b"faststart:".as_slice(), &original].concat())
                    .await
                    .map_err(|e| RemuxError::Command(CommandError::Other(e)))?;
                Ok(())
            }
            RemuxMode::PartialThenFail => {
                tokio::fs::write(output, b"faststart:trunc")
                    .await
                    .map_err(|e| RemuxError::Command(CommandError::Other(e)))?;
                Err(RemuxError::Command(CommandError::Other(io::Error::other(
                    "ffmpeg exited with status 1",
                ))))
            }
            RemuxMode::NoOutput => Ok(()),
        }
    }
}

pub struct HarnessOptions {
    pub dimensions: Option<Dimensions>,
    pub remux: RemuxMode,
    pub fail_puts: bool,
    pub fail_updates: bool,
}

impl Default for HarnessOptions {
    fn default() -> Self {
        Self {
            dimensions: Some(Dimensions {
                width: 1080,
                height: 1920,
            }),
            remux: RemuxMode::Succeed,
            fail_puts: false,
            fail_updates: false,
        }
    }
}

/// One owned video, two known users, and fakes for every collaborator.
pub struct Harness {
    pub orchestrator: Arc<UploadOrchestrator>,
    pub videos: Arc<MemoryVideos>,
    pub objects: Arc<MemoryObjects>,
    pub probe: Arc<FixedProbe>,
    pub remuxer: Arc<FakeRemuxer>,
    pub video_id: Uuid,
    pub owner_id: Uuid,
    scratch: TempDir,
}

impl Harness {
    pub const OWNER_TOKEN: &'static str = "owner-token";
    pub const STRANGER_TOKEN: &'static str = "stranger-token";

    pub fn new(options: HarnessOptions) -> Self {
        let scratch = tempfile::tempdir().unwrap();
        let owner_id = Uuid::new_v4();
        let video_id = Uuid::new_v4();
        let now = OffsetDateTime::now_utc();

        let video = Video {
            id: video_id,
            user_id: owner_id,
            title: "Boots in the snow".to_string(),
            description: "A short clip".to_string(),
            thumbnail_url: None,
            video_url: None,
            created_at: now,
            updated_at: now,
        };

        let videos = Arc::new(MemoryVideos {
            videos: Mutex::new(HashMap::from([(video_id, video)])),
            fail_updates: options.fail_updates,
            ..MemoryVideos::default()
        });
        let objects = Arc::new(MemoryObjects {
            fail: options.fail_puts,
            ..MemoryObjects::default()
        });
        let probe = Arc::new(FixedProbe {
            dimensions: options.dimensions,
            calls: AtomicUsize::new(0),
            saw_original_upload: AtomicBool::new(false),
        });
        let remuxer = Arc::new(FakeRemuxer {
            mode: options.remux,
            calls: AtomicUsize::new(0),
        });
        let tokens = StaticTokens(HashMap::from([
            (Self::OWNER_TOKEN.to_string(), owner_id),
            (Self::STRANGER_TOKEN.to_string(), Uuid::new_v4()),
        ]));

        let config = UploadConfig {
            bucket: "tubely-test".to_string(),
            public_base_url: "https://cdn.example.com".to_string(),
            tmp_dir: scratch.path().to_path_buf(),
        };

        let orchestrator = Arc::new(UploadOrchestrator::new(
            config,
            Arc::new(tokens),
            videos.clone(),
            objects.clone(),
            probe.clone(),
            remuxer.clone(),
        ));

        Self {
            orchestrator,
            videos,
            objects,
            probe,
            remuxer,
            video_id,
            owner_id,
            scratch,
        }
    }

    pub fn owner_header(&self) -> String {
        format!("Bearer {}", Self::OWNER_TOKEN)
    }

    pub fn stranger_header(&self) -> String {
        format!("Bearer {}", Self::STRANGER_TOKEN)
    }

    /// Files still present in the scratch directory.
    pub fn scratch_files(&self) -> Vec<PathBuf> {
        std::fs::read_dir(self.scratch.path())
            .unwrap()
            .map(|entry| entry.unwrap().path())
            .collect()
    }
}
