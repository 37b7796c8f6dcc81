//! Test helpers: build the router against SQLite in memory, an in-memory bucket, a
//! fake prober and a fake remuxer.
#![allow(dead_code)]

use async_trait::async_trait;
use axum::http::{header, HeaderValue};
use axum_test::TestServer;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use object_store::memory::InMemory;
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;
use tubely_server::api;
use tubely_server::auth::{Claims, TOKEN_ISSUER};
use tubely_server::config::Config;
use tubely_server::entities::video;
use tubely_server::media::{FastStart, MediaError, MediaProber, ProbeReport, StreamInfo};
use tubely_server::state::AppState;
use tubely_server::storage::ObjectStorage;
use tubely_server::store;
use uuid::Uuid;

pub const SECRET: &str = "test-secret";
pub const BUCKET: &str = "tubely-test";
pub const REGION: &str = "us-east-2";
pub const PORT: u16 = 8091;

/// Reports a single stream with fixed dimensions, or fails when none are given.
pub struct FakeProber(pub Option<(u32, u32)>);

#[async_trait]
impl MediaProber for FakeProber {
    async fn probe(&self, path: &Path) -> Result<ProbeReport, MediaError> {
        assert!(path.is_absolute(), "prober should get an absolute path");
        assert!(path.exists(), "upload should be buffered before probing");
        match self.0 {
            Some((width, height)) => Ok(ProbeReport {
                streams: vec![StreamInfo { width, height }],
            }),
            None => Err(MediaError::NoStreams),
        }
    }
}

/// Stands in for ffmpeg: writes fixed bytes to the output, then optionally fails.
pub enum FakeRemuxer {
    Writes(&'static [u8]),
    FailsAfterWriting(&'static [u8]),
}

#[async_trait]
impl FastStart for FakeRemuxer {
    async fn remux(&self, input: &Path, output: &Path) -> Result<(), MediaError> {
        assert!(input.exists(), "upload should be buffered before remuxing");
        assert_eq!(input.file_name(), output.file_name());
        match self {
            FakeRemuxer::Writes(bytes) => {
                std::fs::write(output, bytes).unwrap();
                Ok(())
            }
            FakeRemuxer::FailsAfterWriting(bytes) => {
                std::fs::write(output, bytes).unwrap();
                Err(MediaError::Spawn {
                    tool: "ffmpeg",
                    source: std::io::Error::other("ffmpeg crashed"),
                })
            }
        }
    }
}

pub struct TestApp {
    pub server: TestServer,
    pub db: DatabaseConnection,
    pub bucket: Arc<InMemory>,
    pub assets_dir: TempDir,
    pub temp_dir: TempDir,
    pub processing_dir: TempDir,
}

impl TestApp {
    pub fn assets(&self) -> Vec<PathBuf> {
        entries(self.assets_dir.path())
    }

    pub fn temp_files(&self) -> Vec<PathBuf> {
        entries(self.temp_dir.path())
    }

    pub fn processing_files(&self) -> Vec<PathBuf> {
        entries(self.processing_dir.path())
    }
}

fn entries(dir: &Path) -> Vec<PathBuf> {
    std::fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .collect()
}

pub async fn setup_test_app(prober: FakeProber) -> TestApp {
    build_app(prober, None).await
}

/// Same app with `FAST_START` enabled and the given remuxer.
pub async fn setup_fast_start_app(prober: FakeProber, remuxer: FakeRemuxer) -> TestApp {
    build_app(prober, Some(remuxer)).await
}

async fn build_app(prober: FakeProber, remuxer: Option<FakeRemuxer>) -> TestApp {
    let assets_dir = tempfile::tempdir().unwrap();
    let temp_dir = tempfile::tempdir().unwrap();
    let processing_dir = tempfile::tempdir().unwrap();
    let fast_start = remuxer.is_some();

    let config = Config {
        port: PORT,
        jwt_secret: SECRET.to_string(),
        database_url: "sqlite::memory:".to_string(),
        assets_root: assets_dir.path().to_path_buf(),
        temp_dir: temp_dir.path().to_path_buf(),
        processing_dir: processing_dir.path().to_path_buf(),
        s3_bucket: BUCKET.to_string(),
        s3_region: REGION.to_string(),
        s3_endpoint: None,
        fast_start,
    };

    let db = store::connect(&config.database_url).await.unwrap();
    let bucket = Arc::new(InMemory::new());
    let objects = ObjectStorage::new(bucket.clone(), BUCKET, REGION);

    let remuxer = remuxer.unwrap_or(FakeRemuxer::FailsAfterWriting(b""));
    let state = AppState::new(
        config,
        Arc::new(db.clone()),
        objects,
        Arc::new(prober),
        Arc::new(remuxer),
    );
    let server = TestServer::new(api::router(state)).unwrap();

    TestApp {
        server,
        db,
        bucket,
        assets_dir,
        temp_dir,
        processing_dir,
    }
}

pub fn token_for(user_id: Uuid) -> String {
    let now = chrono::Utc::now().timestamp();
    let claims = Claims {
        iss: TOKEN_ISSUER.to_string(),
        sub: user_id.to_string(),
        iat: now,
        exp: now + 3600,
    };
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(SECRET.as_bytes()),
    )
    .unwrap()
}

pub fn bearer(user_id: Uuid) -> (header::HeaderName, HeaderValue) {
    (
        header::AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {}", token_for(user_id))).unwrap(),
    )
}

pub async fn seed_video(db: &DatabaseConnection, owner: Uuid) -> video::Model {
    let now = chrono::Utc::now().fixed_offset();
    video::ActiveModel {
        id: Set(Uuid::new_v4()),
        created_at: Set(now),
        updated_at: Set(now),
        title: Set("Learn file storage".to_string()),
        description: Set("A walkthrough".to_string()),
        thumbnail_url: Set(None),
        video_url: Set(None),
        user_id: Set(owner),
    }
    .insert(db)
    .await
    .unwrap()
}
