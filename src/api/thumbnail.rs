use super::{allowed_media_type, owned_video, parse_video_id, store_error, write_field};
use crate::auth::AuthUser;
use crate::entities::video;
use crate::error::ApiError;
use crate::state::AppState;
use crate::storage::random_key;
use axum::{
    extract::{multipart::MultipartRejection, Extension, Multipart, Path},
    Json,
};
use tracing::field::display;

const ALLOWED_TYPES: &[&str] = &["image/jpeg", "image/png"];

/// `POST /videos/:id/thumbnail` with an image in the `thumbnail` form field.
pub async fn upload_thumbnail(
    Extension(state): Extension<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    Path(video_id): Path<String>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<video::Model>, ApiError> {
    let video_id = parse_video_id(&video_id)?;
    let span = tracing::Span::current();
    span.record("video_id", display(video_id))
        .record("action", "upload_thumbnail");
    tracing::info!(%video_id, %user_id, "Uploading thumbnail");

    let mut record = owned_video(&state, video_id, user_id).await?;
    let mut multipart = multipart.map_err(|e| ApiError::InvalidRequest(e.body_text()))?;

    while let Some(mut field) = multipart.next_field().await? {
        if field.name() != Some("thumbnail") {
            continue;
        }

        let media_type = allowed_media_type(field.content_type(), ALLOWED_TYPES)?;
        let name = random_key(media_type.subtype().as_str());

        state
            .assets
            .ensure_root()
            .await
            .map_err(|e| ApiError::internal("Can't create assets directory", e))?;
        let mut file = state
            .assets
            .create(&name)
            .await
            .map_err(|e| ApiError::internal("Can't create file", e))?;

        if let Err(e) = write_field(&mut field, &mut file).await {
            state.assets.remove(&name).await;
            return Err(e);
        }

        record.thumbnail_url = Some(state.assets.url(&name));
        state
            .videos
            .update_video(record)
            .await
            .map_err(store_error)?;

        let updated = state.videos.get_video(video_id).await.map_err(store_error)?;

        span.record("business_event", "Thumbnail uploaded");
        metrics::counter!("tubely_thumbnails_uploaded_total").increment(1);

        return Ok(Json(updated));
    }

    Err(ApiError::InvalidRequest("No thumbnail field found".to_string()))
}
