use std::path::{Path, PathBuf};
use tokio::fs::File;

/// Thumbnails written to the assets root and served back by this server under `/assets`.
#[derive(Clone, Debug)]
pub struct LocalAssets {
    root: PathBuf,
    base_url: String,
}

impl LocalAssets {
    pub fn new(root: impl Into<PathBuf>, port: u16) -> Self {
        Self {
            root: root.into(),
            base_url: format!("http://localhost:{}/assets", port),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub async fn ensure_root(&self) -> std::io::Result<()> {
        tokio::fs::create_dir_all(&self.root).await
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    pub async fn create(&self, name: &str) -> std::io::Result<File> {
        File::create(self.path(name)).await
    }

    /// Best effort; a missing file is not an error.
    pub async fn remove(&self, name: &str) {
        if let Err(e) = tokio::fs::remove_file(self.path(name)).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!(asset = name, error = %e, "Failed to remove partial asset");
            }
        }
    }

    pub fn url(&self, name: &str) -> String {
        format!("{}/{}", self.base_url, name)
    }
}
