pub mod middleware;
pub mod thumbnail;
pub mod video;

use crate::config::{THUMBNAIL_BODY_LIMIT, VIDEO_BODY_LIMIT};
use crate::entities::video::Model as VideoModel;
use crate::error::ApiError;
use crate::state::AppState;
use crate::store::StoreError;
use axum::{
    extract::{multipart::Field, DefaultBodyLimit, Extension},
    routing::{get, post},
    Router,
};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tower_http::services::ServeDir;
use uuid::Uuid;

async fn health_check() -> &'static str {
    "OK"
}

/// Full HTTP surface minus the Prometheus layer, which the binary installs.
pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .route(
            "/videos/:id/thumbnail",
            post(thumbnail::upload_thumbnail).layer(DefaultBodyLimit::max(THUMBNAIL_BODY_LIMIT)),
        )
        .route(
            "/videos/:id",
            get(video::get_video)
                .post(video::upload_video)
                .layer(DefaultBodyLimit::max(VIDEO_BODY_LIMIT)),
        )
        .route_layer(axum::middleware::from_fn(middleware::require_auth));

    Router::new()
        .route("/health", get(health_check))
        .merge(api)
        .nest_service("/assets", ServeDir::new(state.assets.root()))
        .layer(Extension(state))
        .layer(
            tower_http::trace::TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<axum::body::Body>| {
                    let matched_path = request
                        .extensions()
                        .get::<axum::extract::MatchedPath>()
                        .map(|matched| matched.as_str());

                    let span_name = match matched_path {
                        Some(path) => format!("{} {}", request.method(), path),
                        None => format!("{} {}", request.method(), request.uri().path()),
                    };

                    tracing::info_span!(
                        "request",
                        "otel.name" = span_name,
                        method = ?request.method(),
                        uri = ?request.uri(),
                        // filled in by the middleware and handlers
                        video_id = tracing::field::Empty,
                        user_id = tracing::field::Empty,
                        action = tracing::field::Empty,
                        business_event = tracing::field::Empty,
                        error = tracing::field::Empty,
                        status = tracing::field::Empty,
                        latency = tracing::field::Empty,
                    )
                })
                .on_request(|_request: &axum::http::Request<axum::body::Body>, _span: &tracing::Span| {})
                .on_response(
                    |response: &axum::http::Response<_>, latency: std::time::Duration, span: &tracing::Span| {
                        span.record("status", tracing::field::display(response.status()));
                        span.record("latency", tracing::field::debug(latency));
                        tracing::info!("request completed");
                    },
                ),
        )
}

fn parse_video_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::InvalidRequest("Invalid ID".to_string()))
}

fn store_error(err: StoreError) -> ApiError {
    match err {
        StoreError::NotFound(_) => ApiError::NotFound("Couldn't find video".to_string()),
        StoreError::Db(e) => ApiError::internal("Couldn't access video", e),
    }
}

/// Load the record and make sure `user_id` owns it before anything is written.
async fn owned_video(state: &AppState, video_id: Uuid, user_id: Uuid) -> Result<VideoModel, ApiError> {
    let video = state.videos.get_video(video_id).await.map_err(store_error)?;
    if video.user_id != user_id {
        return Err(ApiError::Unauthorized(
            "You don't have rights to this video".to_string(),
        ));
    }
    Ok(video)
}

/// Validate the declared part content type against `allowed` (exact essence match).
fn allowed_media_type(declared: Option<&str>, allowed: &[&str]) -> Result<mime::Mime, ApiError> {
    let media_type: mime::Mime = declared
        .and_then(|raw| raw.parse().ok())
        .ok_or_else(|| ApiError::InvalidRequest("Invalid Content-Type".to_string()))?;

    if !allowed.contains(&media_type.essence_str()) {
        return Err(ApiError::InvalidRequest(format!(
            "Invalid file type {}",
            media_type.essence_str()
        )));
    }
    Ok(media_type)
}

/// Stream a multipart field into `out` chunk by chunk.
async fn write_field<W>(field: &mut Field<'_>, out: &mut W) -> Result<u64, ApiError>
where
    W: AsyncWrite + Unpin,
{
    let mut written = 0u64;
    while let Some(chunk) = field.chunk().await? {
        out.write_all(&chunk)
            .await
            .map_err(|e| ApiError::internal("Couldn't write upload", e))?;
        written += chunk.len() as u64;
    }
    out.flush()
        .await
        .map_err(|e| ApiError::internal("Couldn't write upload", e))?;
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_allowed_types_with_parameters() {
        let mime = allowed_media_type(Some("image/png"), &["image/jpeg", "image/png"]).unwrap();
        assert_eq!(mime.subtype().as_str(), "png");

        let mime = allowed_media_type(Some("video/mp4; codecs=avc1"), &["video/mp4"]).unwrap();
        assert_eq!(mime.subtype().as_str(), "mp4");
    }

    #[test]
    fn rejects_other_types() {
        for declared in [Some("image/gif"), Some("video/quicktime"), Some("garbage"), None] {
            let err = allowed_media_type(declared, &["image/jpeg", "image/png"]).unwrap_err();
            assert!(matches!(err, ApiError::InvalidRequest(_)));
        }
    }

    #[test]
    fn parses_video_ids() {
        let id = Uuid::new_v4();
        assert_eq!(parse_video_id(&id.to_string()).unwrap(), id);
        assert!(matches!(parse_video_id("42"), Err(ApiError::InvalidRequest(_))));
    }
}
