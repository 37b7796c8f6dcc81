use anyhow::{anyhow, Context};
use std::path::PathBuf;

/// Thumbnails are parsed with at most this many bytes in the request body.
pub const THUMBNAIL_BODY_LIMIT: usize = 10 << 20;

/// Video uploads may carry at most this many bytes in the request body.
pub const VIDEO_BODY_LIMIT: usize = 1 << 30;

#[derive(Clone, Debug)]
pub struct Config {
    pub port: u16,
    pub jwt_secret: String,
    pub database_url: String,
    pub assets_root: PathBuf,
    pub temp_dir: PathBuf,
    pub processing_dir: PathBuf,
    pub s3_bucket: String,
    pub s3_region: String,
    /// Custom endpoint for S3-compatible providers (MinIO, Spaces, ...).
    pub s3_endpoint: Option<String>,
    pub fast_start: bool,
}

impl Config {
    /// Build the configuration from the process environment, loading `.env` first if present.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let port = match optional("PORT") {
            Some(raw) => raw
                .parse::<u16>()
                .with_context(|| format!("PORT is not a valid port: {raw}"))?,
            None => 8091,
        };

        let fast_start = match optional("FAST_START") {
            Some(raw) => parse_flag(&raw).ok_or_else(|| anyhow!("FAST_START must be a boolean, got {raw}"))?,
            None => false,
        };

        Ok(Self {
            port,
            jwt_secret: required("JWT_SECRET")?,
            database_url: required("DATABASE_URL")?,
            assets_root: optional("ASSETS_ROOT").unwrap_or_else(|| "assets".into()).into(),
            temp_dir: optional("TEMP_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(std::env::temp_dir),
            processing_dir: optional("PROCESSING_DIR")
                .unwrap_or_else(|| ".processing".into())
                .into(),
            s3_bucket: required("S3_BUCKET")?,
            s3_region: required("S3_REGION")?,
            s3_endpoint: optional("S3_ENDPOINT"),
            fast_start,
        })
    }
}

fn required(key: &str) -> anyhow::Result<String> {
    optional(key).ok_or_else(|| anyhow!("{key} must be set"))
}

fn optional(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
