use async_trait::async_trait;
use aws_sdk_s3::config::Builder;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::{config::BehaviorVersion, config::Credentials, config::Region, Client};
use tracing::{debug, info};

use super::{ObjectBody, ObjectStore, StoreError};

#[derive(Clone)]
pub struct StorageService {
    pub client: Client,
}

impl StorageService {
    /// `endpoint` is only set for S3-compatible services such as MinIO; AWS
    /// itself resolves the endpoint from the region.
    pub fn new(endpoint: Option<&str>, region: &str, access_key: &str, secret_key: &str) -> Self {
        let credentials = Credentials::new(access_key, secret_key, None, None, "static");

        let mut config = Builder::new()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new(region.to_string()))
            .credentials_provider(credentials);

        if let Some(endpoint) = endpoint {
            config = config.endpoint_url(endpoint).force_path_style(true);
        }

        let client = Client::from_conf(config.build());

        info!(region, endpoint = endpoint.unwrap_or("aws"), "✅ S3 client configured");

        Self { client }
    }
}

#[async_trait]
impl ObjectStore for StorageService {
    async fn put(
        &self,
        bucket: &str,
        key: &str,
        body: ObjectBody<'_>,
        content_type: &str,
    ) -> Result<(), StoreError> {
        let body = match body {
            ObjectBody::File(path) => {
                ByteStream::from_path(path)
                    .await
                    .map_err(|e| StoreError::Read {
                        path: path.display().to_string(),
                        source: std::io::Error::other(e),
                    })?
            }
            ObjectBody::Bytes(bytes) => ByteStream::from(bytes),
        };

        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(body)
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| StoreError::Put {
                key: key.to_string(),
                source: Box::new(aws_sdk_s3::Error::from(e)),
            })?;

        debug!(bucket, key, "object stored");
        Ok(())
    }
}
