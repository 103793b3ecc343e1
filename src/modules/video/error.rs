use std::{fmt, io};

use axum::http::StatusCode;
use thiserror::Error;
use uuid::Uuid;

use super::repository::RepositoryError;
use crate::common::response::ApiError;
use crate::infrastructure::media::{ProbeError, RemuxError};
use crate::infrastructure::storage::StoreError;
use crate::modules::auth::AuthError;

/// Where an upload was when it stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadStage {
    Authenticate,
    Authorize,
    Validate,
    Stage,
    Classify,
    Remux,
    Commit,
    Persist,
}

impl fmt::Display for UploadStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            UploadStage::Authenticate => "authenticate",
            UploadStage::Authorize => "authorize",
            UploadStage::Validate => "validate",
            UploadStage::Stage => "stage",
            UploadStage::Classify => "classify",
            UploadStage::Remux => "remux",
            UploadStage::Commit => "commit",
            UploadStage::Persist => "persist",
        })
    }
}

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("authentication failed: {0}")]
    Unauthenticated(#[from] AuthError),

    #[error("video {0} not found")]
    NotFound(Uuid),

    #[error("user {user_id} does not own video {video_id}")]
    NotOwner { video_id: Uuid, user_id: Uuid },

    /// Client-side mistake. The message is safe to show to the caller.
    #[error("invalid request: {0}")]
    Invalid(&'static str),

    #[error("{stage} failed: {source}")]
    Io {
        stage: UploadStage,
        #[source]
        source: io::Error,
    },

    #[error("classify failed: {0}")]
    Probe(#[from] ProbeError),

    #[error("remux failed: {0}")]
    Remux(#[from] RemuxError),

    #[error("{stage} failed: {source}")]
    Store {
        stage: UploadStage,
        #[source]
        source: StoreError,
    },

    #[error("{stage} failed: {source}")]
    Repository {
        stage: UploadStage,
        #[source]
        source: RepositoryError,
    },
}

impl UploadError {
    pub fn stage(&self) -> UploadStage {
        match self {
            UploadError::Unauthenticated(_) => UploadStage::Authenticate,
            UploadError::NotFound(_) | UploadError::NotOwner { .. } => UploadStage::Authorize,
            UploadError::Invalid(_) => UploadStage::Validate,
            UploadError::Probe(_) => UploadStage::Classify,
            UploadError::Remux(_) => UploadStage::Remux,
            UploadError::Io { stage, .. }
            | UploadError::Store { stage, .. }
            | UploadError::Repository { stage, .. } => *stage,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            UploadError::Invalid(_) | UploadError::NotFound(_) => StatusCode::BAD_REQUEST,
            UploadError::Unauthenticated(_) | UploadError::NotOwner { .. } => {
                StatusCode::UNAUTHORIZED
            }
            UploadError::Io { .. }
            | UploadError::Probe(_)
            | UploadError::Remux(_)
            | UploadError::Store { .. }
            | UploadError::Repository { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Short caller-facing text. Never includes internal error detail or tool
    /// output.
    pub fn public_message(&self) -> &'static str {
        match self {
            UploadError::Unauthenticated(AuthError::MissingToken) => "Couldn't find JWT",
            UploadError::Unauthenticated(AuthError::InvalidToken(_)) => "Couldn't validate JWT",
            UploadError::NotFound(_) => "Video not found",
            UploadError::NotOwner { .. } => "Not your video",
            UploadError::Invalid(message) => *message,
            UploadError::Io { .. } => "Couldn't save the file",
            UploadError::Probe(_) => "Unable to determine video aspect ratio",
            UploadError::Remux(_) => "Unable to process video for fast start",
            UploadError::Store { .. } => "Unable to upload file to storage",
            UploadError::Repository {
                stage: UploadStage::Persist,
                ..
            } => "Unable to update video",
            UploadError::Repository { .. } => "Couldn't load video",
        }
    }
}

impl From<UploadError> for ApiError {
    fn from(err: UploadError) -> Self {
        ApiError(err.public_message().to_string(), err.status_code())
    }
}
