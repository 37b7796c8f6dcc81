use crate::entities::{video, Video};
use crate::migrator::Migrator;
use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ConnectOptions, Database, DatabaseConnection, DbErr, EntityTrait,
    IntoActiveModel, Set,
};
use sea_orm_migration::MigratorTrait;
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("video {0} not found")]
    NotFound(Uuid),
    #[error(transparent)]
    Db(#[from] DbErr),
}

/// Persistence for video records. Writes are last-writer-wins.
#[async_trait]
pub trait VideoStore: Send + Sync {
    async fn get_video(&self, id: Uuid) -> Result<video::Model, StoreError>;

    /// Overwrite every column of the stored record with `video`, bumping `updated_at`.
    async fn update_video(&self, video: video::Model) -> Result<video::Model, StoreError>;
}

#[async_trait]
impl VideoStore for DatabaseConnection {
    async fn get_video(&self, id: Uuid) -> Result<video::Model, StoreError> {
        Video::find_by_id(id)
            .one(self)
            .await?
            .ok_or(StoreError::NotFound(id))
    }

    async fn update_video(&self, video: video::Model) -> Result<video::Model, StoreError> {
        let id = video.id;
        let mut active = video.into_active_model().reset_all();
        active.updated_at = Set(chrono::Utc::now().fixed_offset());

        match active.update(self).await {
            Ok(updated) => Ok(updated),
            Err(DbErr::RecordNotUpdated) => Err(StoreError::NotFound(id)),
            Err(e) => Err(e.into()),
        }
    }
}

/// Open the database and bring the schema up to date.
pub async fn connect(database_url: &str) -> Result<DatabaseConnection, DbErr> {
    let mut options = ConnectOptions::new(database_url.to_owned());
    // every pooled connection to an in-memory sqlite database would see its own empty schema
    if database_url.contains(":memory:") {
        options.max_connections(1).min_connections(1);
    }
    options.sqlx_logging(false);

    let db = Database::connect(options).await?;
    Migrator::up(&db, None).await?;
    Ok(db)
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn seeded() -> (DatabaseConnection, video::Model) {
        let db = connect("sqlite::memory:").await.unwrap();
        let now = chrono::Utc::now().fixed_offset();
        let record = video::ActiveModel {
            id: Set(Uuid::new_v4()),
            created_at: Set(now),
            updated_at: Set(now),
            title: Set("Boot.dev beats".to_string()),
            description: Set("lofi".to_string()),
            thumbnail_url: Set(None),
            video_url: Set(None),
            user_id: Set(Uuid::new_v4()),
        }
        .insert(&db)
        .await
        .unwrap();
        (db, record)
    }

    #[tokio::test]
    async fn get_missing_video_is_not_found() {
        let (db, _) = seeded().await;
        let id = Uuid::new_v4();
        assert!(matches!(db.get_video(id).await, Err(StoreError::NotFound(missing)) if missing == id));
    }

    #[tokio::test]
    async fn update_persists_urls() {
        let (db, mut record) = seeded().await;
        record.thumbnail_url = Some("http://localhost:8091/assets/a.png".to_string());
        record.video_url = Some("https://b.s3.r.amazonaws.com/other/k.mp4".to_string());

        db.update_video(record.clone()).await.unwrap();

        let stored = db.get_video(record.id).await.unwrap();
        assert_eq!(stored.thumbnail_url, record.thumbnail_url);
        assert_eq!(stored.video_url, record.video_url);
        assert_eq!(stored.user_id, record.user_id);
        assert!(stored.updated_at >= record.updated_at);
    }

    #[tokio::test]
    async fn update_of_unknown_record_is_not_found() {
        let (db, mut record) = seeded().await;
        record.id = Uuid::new_v4();
        assert!(matches!(
            db.update_video(record).await,
            Err(StoreError::NotFound(_))
        ));
    }
}
