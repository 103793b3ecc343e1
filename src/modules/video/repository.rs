use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use super::model::Video;
use crate::infrastructure::db::pool::DbPool;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("video {0} not found")]
    NotFound(Uuid),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Metadata records, keyed by video id.
#[async_trait]
pub trait VideoStore: Send + Sync {
    async fn get_video(&self, id: Uuid) -> Result<Video, RepositoryError>;

    /// Overwrites the mutable columns of `video`. Last write wins.
    async fn update_video(&self, video: &Video) -> Result<Video, RepositoryError>;
}

#[derive(Clone)]
pub struct VideoRepository {
    pool: DbPool,
}

impl VideoRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl VideoStore for VideoRepository {
    async fn get_video(&self, id: Uuid) -> Result<Video, RepositoryError> {
        sqlx::query_as::<_, Video>("SELECT * FROM videos WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(RepositoryError::NotFound(id))
    }

    async fn update_video(&self, video: &Video) -> Result<Video, RepositoryError> {
        sqlx::query_as::<_, Video>(
            r#"
            UPDATE videos
            SET title = $1, description = $2, thumbnail_url = $3, video_url = $4, updated_at = NOW()
            WHERE id = $5
            RETURNING *
            "#,
        )
        .bind(&video.title)
        .bind(&video.description)
        .bind(&video.thumbnail_url)
        .bind(&video.video_url)
        .bind(video.id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(RepositoryError::NotFound(video.id))
    }
}
