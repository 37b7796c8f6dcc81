mod faststart;
mod prober;

pub use faststart::{fast_start_args, processing_output, FastStart, Ffmpeg};
pub use prober::{AspectRatio, Ffprobe, MediaProber, ProbeReport, StreamInfo};

#[derive(Debug, thiserror::Error)]
pub enum MediaError {
    #[error("failed to run {tool}: {source}")]
    Spawn {
        tool: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("{tool} exited with {status}: {stderr}")]
    Failed {
        tool: &'static str,
        status: std::process::ExitStatus,
        stderr: String,
    },

    #[error("failed to parse probe output: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("no streams reported")]
    NoStreams,

    #[error("input path has no file name")]
    NoFileName,
}
