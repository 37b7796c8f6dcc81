use object_store::aws::AmazonS3Builder;
use object_store::buffered::BufWriter;
use object_store::path::Path;
use object_store::{Attribute, Attributes, ObjectStore};
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWriteExt};

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Configuration error: {0}")]
    Config(#[from] object_store::Error),

    #[error("Upload of {key} failed: {source}")]
    Upload {
        key: String,
        #[source]
        source: std::io::Error,
    },
}

/// Bucket-backed storage for uploaded videos.
#[derive(Clone)]
pub struct ObjectStorage {
    store: Arc<dyn ObjectStore>,
    bucket: String,
    region: String,
    endpoint: Option<String>,
}

impl ObjectStorage {
    /// S3 (or S3-compatible, when `endpoint` is given) bucket. Credentials come from the
    /// standard `AWS_*` environment variables.
    pub fn s3(bucket: &str, region: &str, endpoint: Option<&str>) -> Result<Self, StorageError> {
        let mut builder = AmazonS3Builder::from_env()
            .with_bucket_name(bucket)
            .with_region(region);

        if let Some(endpoint) = endpoint {
            builder = builder
                .with_endpoint(endpoint)
                .with_allow_http(endpoint.starts_with("http://"));
        }

        Ok(Self {
            store: Arc::new(builder.build()?),
            bucket: bucket.to_string(),
            region: region.to_string(),
            endpoint: endpoint.map(str::to_string),
        })
    }

    /// Wrap an arbitrary store; URLs are still derived as if it were the named S3 bucket.
    pub fn new(store: Arc<dyn ObjectStore>, bucket: &str, region: &str) -> Self {
        Self {
            store,
            bucket: bucket.to_string(),
            region: region.to_string(),
            endpoint: None,
        }
    }

    /// Stream `body` to `key` and return the number of bytes written. A failed upload is aborted.
    pub async fn put<R>(&self, key: &str, content_type: &str, body: &mut R) -> Result<u64, StorageError>
    where
        R: AsyncRead + Unpin + ?Sized,
    {
        let mut attributes = Attributes::new();
        attributes.insert(Attribute::ContentType, content_type.to_string().into());

        let mut writer =
            BufWriter::new(Arc::clone(&self.store), Path::from(key)).with_attributes(attributes);

        let copied = async {
            let n = tokio::io::copy(body, &mut writer).await?;
            writer.shutdown().await?;
            Ok::<_, std::io::Error>(n)
        }
        .await;

        match copied {
            Ok(n) => {
                tracing::info!(bucket = %self.bucket, key, bytes = n, "Uploaded object");
                Ok(n)
            }
            Err(source) => {
                if let Err(e) = writer.abort().await {
                    tracing::warn!(key, error = %e, "Failed to abort upload");
                }
                Err(StorageError::Upload {
                    key: key.to_string(),
                    source,
                })
            }
        }
    }

    /// Public URL of `key`: virtual-hosted AWS style, or path style behind a custom endpoint.
    pub fn object_url(&self, key: &str) -> String {
        match &self.endpoint {
            Some(endpoint) => format!("{}/{}/{}", endpoint.trim_end_matches('/'), self.bucket, key),
            None => format!("https://{}.s3.{}.amazonaws.com/{}", self.bucket, self.region, key),
        }
    }
}
