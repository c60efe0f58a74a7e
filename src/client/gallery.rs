use std::future::Future;

use super::{ApiClient, ClientError};
use crate::models::StoredImage;

/// Image list as the gallery panel holds it. Deletes are applied
/// optimistically and rolled back if the server refuses.
#[derive(Debug, Default, Clone)]
pub struct ImageGallery {
    images: Vec<StoredImage>,
}

impl ImageGallery {
    pub fn new(images: Vec<StoredImage>) -> Self {
        ImageGallery { images }
    }

    pub fn images(&self) -> &[StoredImage] {
        &self.images
    }

    pub async fn refresh(&mut self, client: &ApiClient) -> Result<(), ClientError> {
        self.images = client.list_images().await?;
        Ok(())
    }

    pub async fn delete(&mut self, client: &ApiClient, filename: &str) -> Result<(), ClientError> {
        self.delete_with(filename, |name| {
            let client = client.clone();
            async move { client.delete_image(&name).await }
        })
        .await
    }

    /// Removes `filename` immediately, then runs `remove`; on failure the
    /// previous list is restored.
    pub async fn delete_with<F, Fut, E>(&mut self, filename: &str, remove: F) -> Result<(), E>
    where
        F: FnOnce(String) -> Fut,
        Fut: Future<Output = Result<(), E>>,
    {
        let previous = self.images.clone();
        self.images.retain(|image| image.filename != filename);
        match remove(filename.to_string()).await {
            Ok(()) => Ok(()),
            Err(e) => {
                self.images = previous;
                Err(e)
            }
        }
    }
}
