//! Upload orchestration.
//!
//! An upload moves through
//! `Authenticated → Authorized → Validated → Staged → Classified → Remuxed →
//! Committed → Persisted`. Each state owns what the next step needs, and every
//! transition consumes the previous state, so dropping a state on any error
//! path releases its scratch files through [`TmpFile`].
//!
//! Side effects are ordered: nothing is written to the object store before the
//! remux succeeds, and the metadata record is only touched after the put
//! succeeds. A failed metadata update leaves the committed object in place
//! (orphaned); that is logged and otherwise accepted.

use std::io;
use std::sync::Arc;

use bytes::Bytes;
use futures_util::Stream;
use tokio::fs::File;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::classifier::{self, AspectClass};
use super::error::{UploadError, UploadStage};
use super::model::Video;
use super::naming;
use super::repository::{RepositoryError, VideoStore};
use crate::common::tmp_file::TmpFile;
use crate::common::upload::{read_limited, stage_stream, BodyError, ReadLimitError};
use crate::config::settings::UploadConfig;
use crate::infrastructure::media::{MediaProbe, RemuxError, Remuxer};
use crate::infrastructure::storage::{ObjectBody, ObjectStore};
use crate::modules::auth::{bearer_token, TokenValidator};

pub const VIDEO_CONTENT_TYPE: &str = "video/mp4";
const THUMBNAIL_CONTENT_TYPES: [&str; 2] = ["image/jpeg", "image/png"];
/// Shown when a body runs into the request size limit.
pub const TOO_LARGE: &str = "File too large";
/// 10 MiB.
pub const MAX_THUMBNAIL_BYTES: usize = 10 << 20;

/// A caller whose token is valid and who owns the video.
///
/// Only [`UploadOrchestrator::authorize`] creates one, so no upload step can
/// run before the ownership check.
#[derive(Debug)]
pub struct Authorized {
    user_id: Uuid,
    video: Video,
}

struct Validated {
    video: Video,
}

struct Staged {
    video: Video,
    upload: TmpFile,
}

struct Classified {
    video: Video,
    upload: TmpFile,
    aspect: AspectClass,
}

struct Remuxed {
    video: Video,
    upload: TmpFile,
    processed: TmpFile,
    aspect: AspectClass,
}

struct Committed {
    video: Video,
    key: String,
}

pub struct UploadOrchestrator {
    config: UploadConfig,
    tokens: Arc<dyn TokenValidator>,
    videos: Arc<dyn VideoStore>,
    objects: Arc<dyn ObjectStore>,
    probe: Arc<dyn MediaProbe>,
    remuxer: Arc<dyn Remuxer>,
}

impl UploadOrchestrator {
    pub fn new(
        config: UploadConfig,
        tokens: Arc<dyn TokenValidator>,
        videos: Arc<dyn VideoStore>,
        objects: Arc<dyn ObjectStore>,
        probe: Arc<dyn MediaProbe>,
        remuxer: Arc<dyn Remuxer>,
    ) -> Self {
        Self {
            config,
            tokens,
            videos,
            objects,
            probe,
            remuxer,
        }
    }

    /// `Received → Authenticated → Authorized`.
    ///
    /// `authorization` is the raw `Authorization` header value.
    #[tracing::instrument(skip_all, fields(video_id = %video_id))]
    pub async fn authorize(
        &self,
        video_id: Uuid,
        authorization: Option<&str>,
    ) -> Result<Authorized, UploadError> {
        let result: Result<Authorized, UploadError> = async {
            let token = bearer_token(authorization)?;
            let user_id = self.tokens.validate(token)?;

            let video = self.videos.get_video(video_id).await.map_err(|e| match e {
                RepositoryError::NotFound(id) => UploadError::NotFound(id),
                source => UploadError::Repository {
                    stage: UploadStage::Authorize,
                    source,
                },
            })?;

            if video.user_id != user_id {
                return Err(UploadError::NotOwner { video_id, user_id });
            }

            Ok(Authorized { user_id, video })
        }
        .await;

        result.inspect_err(log_abort)
    }

    /// Runs the video pipeline for an authorized caller and returns the
    /// updated record.
    ///
    /// `content_type` is the declared type of the uploaded part; `body` is its
    /// byte stream.
    #[tracing::instrument(
        skip_all,
        fields(video_id = %authorized.video.id, user_id = %authorized.user_id)
    )]
    pub async fn upload_video<S, E>(
        &self,
        authorized: Authorized,
        content_type: Option<&str>,
        body: S,
    ) -> Result<Video, UploadError>
    where
        S: Stream<Item = Result<Bytes, E>> + Send,
        E: BodyError,
    {
        let result: Result<Video, UploadError> = async {
            let validated = validate_video(authorized, content_type)?;
            let staged = self.stage(validated, body).await?;
            let classified = self.classify(staged).await?;
            let remuxed = self.remux(classified).await?;
            let committed = self.commit(remuxed).await?;
            self.persist(committed).await
        }
        .await;

        match &result {
            Ok(video) => info!(video_url = ?video.video_url, "video upload complete"),
            Err(e) => log_abort(e),
        }

        result
    }

    /// Stores a jpeg or png thumbnail and records its URL.
    #[tracing::instrument(
        skip_all,
        fields(video_id = %authorized.video.id, user_id = %authorized.user_id)
    )]
    pub async fn upload_thumbnail<S, E>(
        &self,
        authorized: Authorized,
        content_type: Option<&str>,
        body: S,
    ) -> Result<Video, UploadError>
    where
        S: Stream<Item = Result<Bytes, E>> + Send,
        E: BodyError,
    {
        let result: Result<Video, UploadError> = async {
            let media_type = parse_media_type(content_type)
                .filter(|m| THUMBNAIL_CONTENT_TYPES.contains(&m.essence_str()))
                .ok_or(UploadError::Invalid("Invalid Media Type"))?;

            let data = read_limited(body, MAX_THUMBNAIL_BYTES)
                .await
                .map_err(|e| match e {
                    ReadLimitError::TooLarge(_) => UploadError::Invalid("Thumbnail too large"),
                    ReadLimitError::Io(source) if source.kind() == io::ErrorKind::FileTooLarge => {
                        UploadError::Invalid("Thumbnail too large")
                    }
                    ReadLimitError::Io(source) => UploadError::Io {
                        stage: UploadStage::Stage,
                        source,
                    },
                })?;

            let key = naming::make_thumbnail_key(media_type.subtype().as_str());
            self.objects
                .put(
                    &self.config.bucket,
                    &key,
                    ObjectBody::Bytes(data),
                    media_type.essence_str(),
                )
                .await
                .map_err(|source| UploadError::Store {
                    stage: UploadStage::Commit,
                    source,
                })?;

            let mut video = authorized.video;
            video.thumbnail_url = Some(self.config.object_url(&key));
            self.update_record(video, &key).await
        }
        .await;

        match &result {
            Ok(video) => info!(thumbnail_url = ?video.thumbnail_url, "thumbnail upload complete"),
            Err(e) => log_abort(e),
        }

        result
    }

    /// `Validated → Staged`: the whole body lands in a private scratch file.
    async fn stage<S, E>(&self, validated: Validated, body: S) -> Result<Staged, UploadError>
    where
        S: Stream<Item = Result<Bytes, E>> + Send,
        E: BodyError,
    {
        let io_error = |source| UploadError::Io {
            stage: UploadStage::Stage,
            source,
        };

        let upload = TmpFile::new_in(&self.config.tmp_dir, "tubely-upload", ".mp4");
        let mut file = File::options()
            .read(true)
            .write(true)
            .create_new(true)
            .open(upload.path())
            .await
            .map_err(io_error)?;

        let size = stage_stream(body, &mut file).await.map_err(|source| {
            if source.kind() == io::ErrorKind::FileTooLarge {
                UploadError::Invalid(TOO_LARGE)
            } else {
                io_error(source)
            }
        })?;
        debug!(bytes = size, path = %upload.display(), "upload staged");

        Ok(Staged {
            video: validated.video,
            upload,
        })
    }

    /// `Staged → Classified`. Reads the original bytes, not the remuxed ones.
    async fn classify(&self, staged: Staged) -> Result<Classified, UploadError> {
        let aspect = classifier::classify(self.probe.as_ref(), staged.upload.path()).await?;
        debug!(%aspect, "upload classified");

        Ok(Classified {
            video: staged.video,
            upload: staged.upload,
            aspect,
        })
    }

    /// `Classified → Remuxed`. The fast-start copy goes to a second scratch
    /// file; the original is left alone.
    async fn remux(&self, classified: Classified) -> Result<Remuxed, UploadError> {
        let processed = TmpFile::new_in(&self.config.tmp_dir, "tubely-processed", ".mp4");

        self.remuxer
            .remux(classified.upload.path(), processed.path())
            .await?;

        match tokio::fs::metadata(processed.path()).await {
            Ok(meta) if meta.is_file() => {}
            _ => return Err(RemuxError::MissingOutput(processed.to_path_buf()).into()),
        }

        Ok(Remuxed {
            video: classified.video,
            upload: classified.upload,
            processed,
            aspect: classified.aspect,
        })
    }

    /// `Remuxed → Committed`. Scratch files are released once the object is
    /// durable.
    async fn commit(&self, remuxed: Remuxed) -> Result<Committed, UploadError> {
        let key = naming::make_key(remuxed.aspect);

        self.objects
            .put(
                &self.config.bucket,
                &key,
                ObjectBody::File(remuxed.processed.path()),
                VIDEO_CONTENT_TYPE,
            )
            .await
            .map_err(|source| UploadError::Store {
                stage: UploadStage::Commit,
                source,
            })?;

        info!(bucket = %self.config.bucket, key = %key, "video committed to object store");

        for file in [remuxed.upload, remuxed.processed] {
            if let Err(e) = file.cleanup().await {
                warn!(error = %e, "failed to remove scratch file");
            }
        }

        Ok(Committed {
            video: remuxed.video,
            key,
        })
    }

    /// `Committed → Persisted`.
    async fn persist(&self, committed: Committed) -> Result<Video, UploadError> {
        let mut video = committed.video;
        video.video_url = Some(self.config.object_url(&committed.key));
        self.update_record(video, &committed.key).await
    }

    async fn update_record(&self, video: Video, key: &str) -> Result<Video, UploadError> {
        self.videos.update_video(&video).await.map_err(|source| {
            warn!(
                bucket = %self.config.bucket,
                key,
                "object committed but the record update failed; object is orphaned"
            );
            UploadError::Repository {
                stage: UploadStage::Persist,
                source,
            }
        })
    }
}

/// `Authorized → Validated`. Exactly one container type is accepted; media
/// type parameters are ignored.
fn validate_video(
    authorized: Authorized,
    content_type: Option<&str>,
) -> Result<Validated, UploadError> {
    match parse_media_type(content_type) {
        Some(media_type) if media_type.essence_str() == VIDEO_CONTENT_TYPE => Ok(Validated {
            video: authorized.video,
        }),
        _ => Err(UploadError::Invalid("Invalid Media Type")),
    }
}

fn parse_media_type(content_type: Option<&str>) -> Option<mime::Mime> {
    content_type?.trim().parse::<mime::Mime>().ok()
}

fn log_abort(err: &UploadError) {
    let stage = err.stage();
    if err.status_code().is_server_error() {
        error!(%stage, error = %err, "upload aborted");
    } else {
        info!(%stage, error = %err, "upload rejected");
    }
}
