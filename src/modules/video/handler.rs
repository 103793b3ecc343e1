use axum::{
    extract::{
        multipart::{MultipartError, MultipartRejection},
        Multipart, Path, State,
    },
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
};
use tracing::info;
use uuid::Uuid;

use super::error::UploadError;
use super::model::Video;
use super::service::TOO_LARGE;
use crate::common::response::{ApiError, ApiResponse, ApiSuccess};
use crate::common::upload::BodyError;
use crate::state::AppState;

const VIDEO_FIELD: &str = "video";
const THUMBNAIL_FIELD: &str = "thumbnail";

/// Upload Video
/// Stages the file, classifies it, rewrites it for fast start and stores it
#[utoipa::path(
    post,
    path = "/api/v1/videos/{id}/upload",
    params(
        ("id" = Uuid, Path, description = "Video ID")
    ),
    request_body(content = String, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Upload successful", body = ApiResponse<Video>),
        (status = 400, description = "Invalid ID, missing file or unsupported media type"),
        (status = 401, description = "Missing token or not the owner"),
        (status = 500, description = "Processing or storage failure")
    ),
    tag = "Videos",
    security(("bearer_auth" = []))
)]
pub async fn upload_video(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    multipart: Result<Multipart, MultipartRejection>,
) -> impl IntoResponse {
    match upload_video_inner(&state, &id, &headers, multipart).await {
        Ok(video) => ApiSuccess(
            ApiResponse::success(video, "Video uploaded successfully"),
            StatusCode::OK,
        )
        .into_response(),
        Err(e) => ApiError::from(e).into_response(),
    }
}

async fn upload_video_inner(
    state: &AppState,
    id: &str,
    headers: &HeaderMap,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Video, UploadError> {
    let video_id = parse_video_id(id)?;
    let authorized = state
        .uploads
        .authorize(video_id, authorization(headers))
        .await?;

    let mut multipart = multipart.map_err(|_| UploadError::Invalid("Unable to parse form file"))?;

    while let Some(field) = multipart.next_field().await.map_err(form_error)? {
        if field.name() != Some(VIDEO_FIELD) {
            continue;
        }

        let content_type = field.content_type().map(str::to_owned);
        info!(
            video_id = %video_id,
            file_name = field.file_name().unwrap_or("video.mp4"),
            "Starting video upload"
        );

        return state
            .uploads
            .upload_video(authorized, content_type.as_deref(), field)
            .await;
    }

    Err(UploadError::Invalid("No video field found in multipart request"))
}

/// Upload Video Thumbnail
/// Stores a jpeg or png image of at most 10 MiB
#[utoipa::path(
    post,
    path = "/api/v1/videos/{id}/thumbnail",
    params(
        ("id" = Uuid, Path, description = "Video ID")
    ),
    request_body(content = String, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Upload successful", body = ApiResponse<Video>),
        (status = 400, description = "Invalid ID, missing file, unsupported media type or too large"),
        (status = 401, description = "Missing token or not the owner"),
        (status = 500, description = "Storage failure")
    ),
    tag = "Videos",
    security(("bearer_auth" = []))
)]
pub async fn upload_thumbnail(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    multipart: Result<Multipart, MultipartRejection>,
) -> impl IntoResponse {
    match upload_thumbnail_inner(&state, &id, &headers, multipart).await {
        Ok(video) => ApiSuccess(
            ApiResponse::success(video, "Thumbnail uploaded successfully"),
            StatusCode::OK,
        )
        .into_response(),
        Err(e) => ApiError::from(e).into_response(),
    }
}

async fn upload_thumbnail_inner(
    state: &AppState,
    id: &str,
    headers: &HeaderMap,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Video, UploadError> {
    let video_id = parse_video_id(id)?;
    let authorized = state
        .uploads
        .authorize(video_id, authorization(headers))
        .await?;

    let mut multipart = multipart.map_err(|_| UploadError::Invalid("Unable to parse form file"))?;

    while let Some(field) = multipart.next_field().await.map_err(form_error)? {
        if field.name() != Some(THUMBNAIL_FIELD) {
            continue;
        }

        let content_type = field.content_type().map(str::to_owned);
        info!(video_id = %video_id, "Starting thumbnail upload");

        return state
            .uploads
            .upload_thumbnail(authorized, content_type.as_deref(), field)
            .await;
    }

    Err(UploadError::Invalid("No thumbnail field found in multipart request"))
}

fn form_error(err: MultipartError) -> UploadError {
    if err.is_too_large() {
        UploadError::Invalid(TOO_LARGE)
    } else {
        UploadError::Invalid("Unable to parse form file")
    }
}

fn parse_video_id(id: &str) -> Result<Uuid, UploadError> {
    Uuid::parse_str(id).map_err(|_| UploadError::Invalid("Invalid ID"))
}

fn authorization(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
}
