use std::sync::Arc;

use bskydl_engine::parse_identifier;
use bskydl_engine::Affordance;
use camino::Utf8PathBuf;
use tokio::task::JoinHandle;

use crate::blob::BlobClient;
use crate::delivery::Deliver;
use crate::delivery::Download;
use crate::error::DownloadError;

/// Turns a click on a download button into a saved file.
pub struct Downloader {
    client: BlobClient,
    delivery: Arc<dyn Deliver>,
}

impl Downloader {
    pub fn new(client: BlobClient, delivery: Arc<dyn Deliver>) -> Self {
        Self { client, delivery }
    }

    /// Fetch the blob behind `image_url` and save it as `filename`.
    pub async fn download(
        &self,
        image_url: &str,
        filename: &str,
    ) -> Result<Utf8PathBuf, DownloadError> {
        let pair = parse_identifier(image_url)?;
        let blob = self.client.fetch(&pair).await?;

        let download = Download {
            filename: filename.to_string(),
            bytes: blob.bytes,
            content_type: blob.content_type,
        };
        Ok(self.delivery.deliver(download)?)
    }

    /// Start a download for `affordance` without waiting for it.
    ///
    /// Each click runs on its own task with its own copy of the URL and
    /// filename; completions arrive in any order. Failures are logged and
    /// end only this download.
    pub fn click(
        self: &Arc<Self>,
        affordance: &Affordance,
    ) -> JoinHandle<Result<Utf8PathBuf, DownloadError>> {
        let this = Arc::clone(self);
        let image_url = affordance.image_url.clone();
        let filename = affordance.filename.clone();

        tokio::spawn(async move {
            let result = this.download(&image_url, &filename).await;
            match &result {
                Ok(path) => tracing::info!("Saved {image_url} to {path}"),
                Err(err) => tracing::error!("Couldn't download {image_url}: {err}"),
            }
            result
        })
    }
}
