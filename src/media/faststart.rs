use super::MediaError;
use async_trait::async_trait;
use std::ffi::OsString;
use std::path::Path;
use tempfile::TempPath;
use tokio::process::Command;

/// Rewrites an MP4 so the moov atom sits at the front of the file.
#[async_trait]
pub trait FastStart: Send + Sync {
    async fn remux(&self, input: &Path, output: &Path) -> Result<(), MediaError>;
}

/// ffmpeg arguments that remux `input` into `output` with the moov atom moved to the front.
/// Streams are copied, never re-encoded.
pub fn fast_start_args(input: &Path, output: &Path) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec!["-y".into(), "-i".into(), input.into()];
    args.extend(
        ["-c", "copy", "-movflags", "faststart", "-f", "mp4"]
            .into_iter()
            .map(OsString::from),
    );
    args.push(output.into());
    args
}

/// `processing_dir/<input file name>`, created on demand. The path is deleted when dropped.
pub async fn processing_output(input: &Path, processing_dir: &Path) -> Result<TempPath, MediaError> {
    let file_name = input.file_name().ok_or(MediaError::NoFileName)?;
    tokio::fs::create_dir_all(processing_dir)
        .await
        .map_err(|source| MediaError::Spawn {
            tool: "ffmpeg",
            source,
        })?;
    Ok(TempPath::from_path(processing_dir.join(file_name)))
}

/// `ffmpeg` from PATH.
#[derive(Debug, Clone, Default)]
pub struct Ffmpeg;

#[async_trait]
impl FastStart for Ffmpeg {
    #[tracing::instrument(skip_all, fields(input = %input.display()))]
    async fn remux(&self, input: &Path, output: &Path) -> Result<(), MediaError> {
        let result = Command::new("ffmpeg")
            .args(fast_start_args(input, output))
            .output()
            .await
            .map_err(|source| MediaError::Spawn {
                tool: "ffmpeg",
                source,
            })?;

        if !result.status.success() {
            return Err(MediaError::Failed {
                tool: "ffmpeg",
                status: result.status,
                stderr: String::from_utf8_lossy(&result.stderr).trim().to_string(),
            });
        }

        tracing::info!(output = %output.display(), "Remuxed for fast start");
        Ok(())
    }
}
