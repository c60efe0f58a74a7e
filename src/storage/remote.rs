use async_trait::async_trait;
use aws_sdk_s3::config::Region;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::ObjectCannedAcl;
use aws_sdk_s3::Client;
use url::Url;

use super::{extension_of, unique_stem, ImageStore, ImageUpload, StorageError};
use crate::models::StoredImage;

const PREFIX: &str = "images/";

/// S3-backed image store. Objects are public-read and addressed by their
/// virtual-hosted URL.
pub struct RemoteObjectStore {
    client: Client,
    bucket: String,
    region: String,
}

impl RemoteObjectStore {
    pub async fn connect(bucket: &str, region: &str) -> Self {
        let shared = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(Region::new(region.to_string()))
            .load()
            .await;
        Self::with_client(Client::new(&shared), bucket, region)
    }

    pub fn with_client(client: Client, bucket: &str, region: &str) -> Self {
        RemoteObjectStore {
            client,
            bucket: bucket.to_string(),
            region: region.to_string(),
        }
    }

    fn object(&self, key: &str) -> StoredImage {
        StoredImage {
            filename: key.to_string(),
            url: object_url(&self.bucket, &self.region, key),
        }
    }
}

/// `https://<bucket>.s3.<region>.amazonaws.com/<key>` with the whole key
/// percent-encoded as a single path segment.
pub fn object_url(bucket: &str, region: &str, key: &str) -> String {
    let base = format!("https://{}.s3.{}.amazonaws.com/", bucket, region);
    match Url::parse(&base) {
        Ok(mut url) => {
            if let Ok(mut segments) = url.path_segments_mut() {
                segments.pop_if_empty().push(key);
            }
            url.to_string()
        }
        Err(_) => format!("{}{}", base, key),
    }
}

/// `images/<millis>-<uuid>[.<ext>]`
pub fn object_key(original_name: &str) -> String {
    match extension_of(original_name) {
        Some(ext) => format!("{}{}.{}", PREFIX, unique_stem(), ext),
        None => format!("{}{}", PREFIX, unique_stem()),
    }
}

/// A key `put` could have produced: under `images/`, one segment, no dot-segments.
pub fn is_image_key(key: &str) -> bool {
    match key.strip_prefix(PREFIX) {
        Some(name) => !name.is_empty() && name != "." && name != ".." && !name.contains(['/', '\\']),
        None => false,
    }
}

fn remote_error(err: impl std::fmt::Display) -> StorageError {
    StorageError::Remote(err.to_string())
}

#[async_trait]
impl ImageStore for RemoteObjectStore {
    async fn put(&self, upload: ImageUpload) -> Result<StoredImage, StorageError> {
        let key = object_key(&upload.original_name);
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .body(ByteStream::from(upload.bytes.to_vec()))
            .content_type(upload.content_type)
            .acl(ObjectCannedAcl::PublicRead)
            .send()
            .await
            .map_err(remote_error)?;
        log::debug!("uploaded s3://{}/{}", self.bucket, key);
        Ok(self.object(&key))
    }

    async fn list(&self) -> Result<Vec<StoredImage>, StorageError> {
        let mut images = Vec::new();
        let mut continuation: Option<String> = None;
        loop {
            let page = self
                .client
                .list_objects_v2()
                .bucket(&self.bucket)
                .prefix(PREFIX)
                .set_continuation_token(continuation.take())
                .send()
                .await
                .map_err(remote_error)?;

            images.extend(
                page.contents()
                    .iter()
                    .filter_map(|object| object.key())
                    .map(|key| self.object(key)),
            );

            match page.next_continuation_token() {
                Some(token) => continuation = Some(token.to_string()),
                None => break,
            }
        }
        Ok(images)
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        // only the image namespace is reachable through this store
        if !is_image_key(key) {
            return Err(StorageError::InvalidKey(key.to_string()));
        }

        // S3 deletes are idempotent; a HEAD first reports missing keys like local disk does.
        if let Err(err) = self.client.head_object().bucket(&self.bucket).key(key).send().await {
            let missing = err
                .as_service_error()
                .map(|e| e.is_not_found())
                .unwrap_or(false);
            return Err(if missing {
                StorageError::NotFound(key.to_string())
            } else {
                remote_error(err)
            });
        }

        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(remote_error)?;
        Ok(())
    }
}
