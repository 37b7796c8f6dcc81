use crate::entities::{video, Video};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter};

/// Seed gauges from the database so dashboards are correct straight after a restart.
pub async fn init_metrics(db: &DatabaseConnection) {
    let video_count = Video::find().count(db).await.unwrap_or(0);
    metrics::gauge!("tubely_videos_total").set(video_count as f64);

    let with_thumbnail = Video::find()
        .filter(video::Column::ThumbnailUrl.is_not_null())
        .count(db)
        .await
        .unwrap_or(0);
    metrics::gauge!("tubely_videos_with_asset", "asset" => "thumbnail").set(with_thumbnail as f64);

    let with_video = Video::find()
        .filter(video::Column::VideoUrl.is_not_null())
        .count(db)
        .await
        .unwrap_or(0);
    metrics::gauge!("tubely_videos_with_asset", "asset" => "video").set(with_video as f64);

    tracing::info!(
        "Initialized metrics: Videos={}, WithThumbnail={}, WithVideo={}",
        video_count,
        with_thumbnail,
        with_video
    );
}
