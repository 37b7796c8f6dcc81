use super::MediaError;
use async_trait::async_trait;
use serde::Deserialize;
use std::path::Path;
use tokio::process::Command;

const TOLERANCE: f64 = 0.1;

/// Inspects a local media file and reports its streams.
#[async_trait]
pub trait MediaProber: Send + Sync {
    async fn probe(&self, path: &Path) -> Result<ProbeReport, MediaError>;
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProbeReport {
    #[serde(default)]
    pub streams: Vec<StreamInfo>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StreamInfo {
    #[serde(default)]
    pub width: u32,
    #[serde(default)]
    pub height: u32,
}

impl ProbeReport {
    /// Classify using the first reported stream only.
    pub fn aspect_ratio(&self) -> Result<AspectRatio, MediaError> {
        let first = self.streams.first().ok_or(MediaError::NoStreams)?;
        Ok(AspectRatio::from_dimensions(first.width, first.height))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AspectRatio {
    Landscape,
    Portrait,
    Other,
}

impl AspectRatio {
    pub fn from_dimensions(width: u32, height: u32) -> Self {
        if height == 0 {
            return AspectRatio::Other;
        }
        Self::from_ratio(f64::from(width) / f64::from(height))
    }

    /// Within ±0.1 (exclusive) of 16:9 or 9:16; everything else is `Other`.
    pub fn from_ratio(ratio: f64) -> Self {
        if (ratio - 16.0 / 9.0).abs() < TOLERANCE {
            AspectRatio::Landscape
        } else if (ratio - 9.0 / 16.0).abs() < TOLERANCE {
            AspectRatio::Portrait
        } else {
            AspectRatio::Other
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AspectRatio::Landscape => "landscape",
            AspectRatio::Portrait => "portrait",
            AspectRatio::Other => "other",
        }
    }
}

impl std::fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `ffprobe` from PATH (or an explicit binary).
#[derive(Debug, Clone)]
pub struct Ffprobe {
    program: String,
}

impl Default for Ffprobe {
    fn default() -> Self {
        Self {
            program: "ffprobe".to_string(),
        }
    }
}

impl Ffprobe {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

#[async_trait]
impl MediaProber for Ffprobe {
    #[tracing::instrument(skip(self), fields(process.executable.name = %self.program))]
    async fn probe(&self, path: &Path) -> Result<ProbeReport, MediaError> {
        let output = Command::new(&self.program)
            .args(["-v", "error", "-print_format", "json", "-show_streams"])
            .arg(path)
            .output()
            .await
            .map_err(|source| MediaError::Spawn {
                tool: "ffprobe",
                source,
            })?;

        if !output.status.success() {
            return Err(MediaError::Failed {
                tool: "ffprobe",
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(serde_json::from_slice(&output.stdout)?)
    }
}
