use super::{allowed_media_type, owned_video, parse_video_id, store_error, write_field};
use crate::auth::AuthUser;
use crate::entities::video;
use crate::error::ApiError;
use crate::media::{self, AspectRatio};
use crate::state::AppState;
use crate::storage::random_key;
use axum::{
    extract::{multipart::MultipartRejection, Extension, Multipart, Path},
    Json,
};
use std::io::SeekFrom;
use tokio::fs::File;
use tokio::io::AsyncSeekExt;
use tracing::field::display;

const ALLOWED_TYPES: &[&str] = &["video/mp4"];

/// `GET /videos/:id`
pub async fn get_video(
    Extension(state): Extension<AppState>,
    Path(video_id): Path<String>,
) -> Result<Json<video::Model>, ApiError> {
    let video_id = parse_video_id(&video_id)?;
    tracing::Span::current()
        .record("video_id", display(video_id))
        .record("action", "get_video");

    let video = state.videos.get_video(video_id).await.map_err(store_error)?;
    Ok(Json(video))
}

/// `POST /videos/:id` with an MP4 in the `video` form field.
///
/// The upload is buffered to a temporary file, probed for its aspect ratio, and stored
/// under `{aspect_ratio}/{random}.mp4`. The temporary file is removed on every exit path.
pub async fn upload_video(
    Extension(state): Extension<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    Path(video_id): Path<String>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<video::Model>, ApiError> {
    let video_id = parse_video_id(&video_id)?;
    let span = tracing::Span::current();
    span.record("video_id", display(video_id))
        .record("action", "upload_video");
    tracing::info!(%video_id, %user_id, "Uploading video");

    let mut record = owned_video(&state, video_id, user_id).await?;
    let mut multipart = multipart.map_err(|e| ApiError::InvalidRequest(e.body_text()))?;

    while let Some(mut field) = multipart.next_field().await? {
        if field.name() != Some("video") {
            continue;
        }

        let media_type = allowed_media_type(field.content_type(), ALLOWED_TYPES)?;

        let upload = tempfile::Builder::new()
            .prefix("tubely-upload-")
            .suffix(".mp4")
            .tempfile_in(&state.config.temp_dir)
            .map_err(|e| ApiError::internal("Can't create temp file", e))?;
        let mut file = File::from_std(
            upload
                .reopen()
                .map_err(|e| ApiError::internal("Can't open temp file", e))?,
        );

        let size = write_field(&mut field, &mut file).await?;
        tracing::debug!(bytes = size, path = %upload.path().display(), "Buffered upload");

        let aspect_ratio = probe_aspect_ratio(&state, upload.path()).await?;
        let key = format!("{}/{}", aspect_ratio, random_key(media_type.subtype().as_str()));

        if state.config.fast_start {
            let remuxed = media::processing_output(upload.path(), &state.config.processing_dir)
                .await
                .map_err(|e| ApiError::internal("Can't process video for fast start", e))?;
            state
                .remuxer
                .remux(upload.path(), &remuxed)
                .await
                .map_err(|e| ApiError::internal("Can't process video for fast start", e))?;
            let mut source = File::open(&remuxed)
                .await
                .map_err(|e| ApiError::internal("Can't open processed video", e))?;
            state
                .objects
                .put(&key, media_type.essence_str(), &mut source)
                .await
                .map_err(|e| ApiError::internal("Can't upload video to object storage", e))?;
        } else {
            file.seek(SeekFrom::Start(0))
                .await
                .map_err(|e| ApiError::internal("Can't rewind temp file", e))?;
            state
                .objects
                .put(&key, media_type.essence_str(), &mut file)
                .await
                .map_err(|e| ApiError::internal("Can't upload video to object storage", e))?;
        }

        record.video_url = Some(state.objects.object_url(&key));
        state
            .videos
            .update_video(record)
            .await
            .map_err(store_error)?;

        let updated = state.videos.get_video(video_id).await.map_err(store_error)?;

        span.record("business_event", "Video uploaded");
        metrics::counter!("tubely_videos_uploaded_total", "aspect_ratio" => aspect_ratio.as_str())
            .increment(1);

        return Ok(Json(updated));
    }

    Err(ApiError::InvalidRequest("No video field found".to_string()))
}

async fn probe_aspect_ratio(state: &AppState, path: &std::path::Path) -> Result<AspectRatio, ApiError> {
    let absolute = tokio::fs::canonicalize(path)
        .await
        .map_err(|e| ApiError::internal("Can't resolve temp file path", e))?;

    let report = state
        .prober
        .probe(&absolute)
        .await
        .map_err(|e| ApiError::internal("Can't get video aspect ratio", e))?;
    let aspect_ratio = report
        .aspect_ratio()
        .map_err(|e| ApiError::internal("Can't get video aspect ratio", e))?;

    tracing::info!(%aspect_ratio, "Classified video");
    Ok(aspect_ratio)
}
