mod config;
mod scan;
mod watch;

use std::sync::Arc;

use anyhow::Context;
use anyhow::Result;
use bskydl_conf::Settings;
use bskydl_dom::Document;
use bskydl_fetch::BlobClient;
use bskydl_fetch::DownloadError;
use bskydl_fetch::Downloader;
use bskydl_fetch::FileDelivery;
use camino::Utf8Path;
use camino::Utf8PathBuf;
use clap::Subcommand;
use tokio::task::JoinHandle;
use url::Url;

use crate::args::GlobalArgs;
use crate::exit::Exit;

pub trait Command {
    async fn execute(&self, args: &GlobalArgs, settings: Settings) -> Result<Exit>;
}

#[derive(Debug, Subcommand)]
pub enum BskydlCommand {
    /// Run one discovery pass over an HTML snapshot of a feed
    Scan(self::scan::Scan),
    /// Keep scanning a snapshot, reloading it whenever the file changes
    Watch(self::watch::Watch),
    /// Print the effective settings as TOML
    Config(self::config::ShowConfig),
}

impl BskydlCommand {
    pub async fn execute(&self, args: &GlobalArgs, settings: Settings) -> Result<Exit> {
        match self {
            Self::Scan(cmd) => cmd.execute(args, settings).await,
            Self::Watch(cmd) => cmd.execute(args, settings).await,
            Self::Config(cmd) => cmd.execute(args, settings).await,
        }
    }
}

/// Path of the page a snapshot was taken from. Accepts a full URL or a
/// bare path; without either, the snapshot is treated as the home feed.
fn page_path(url: Option<&str>) -> String {
    match url {
        None => "/".to_string(),
        Some(url) => match Url::parse(url) {
            Ok(parsed) => parsed.path().to_string(),
            Err(_) => url.to_string(),
        },
    }
}

fn read_snapshot(path: &Utf8Path) -> Result<Document> {
    let source = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read snapshot {path}"))?;
    Ok(bskydl_dom::parse_html(&source))
}

fn downloader(settings: &Settings) -> Result<Arc<Downloader>> {
    let client =
        BlobClient::new(&settings.blob_endpoint).context("Failed to set up the blob client")?;
    let delivery = Arc::new(FileDelivery::new(settings.output_dir.clone()));
    Ok(Arc::new(Downloader::new(client, delivery)))
}

/// Wait for every started download. Returns the saved paths in start order
/// and how many failed; the failures themselves were already logged by the
/// download task.
async fn await_downloads(
    handles: Vec<JoinHandle<Result<Utf8PathBuf, DownloadError>>>,
) -> (Vec<Utf8PathBuf>, usize) {
    let mut saved = Vec::new();
    let mut failed = 0;
    for handle in handles {
        match handle.await {
            Ok(Ok(path)) => saved.push(path),
            Ok(Err(_)) => failed += 1,
            Err(err) => {
                tracing::error!("Download task stopped unexpectedly: {err}");
                failed += 1;
            }
        }
    }
    (saved, failed)
}

fn download_summary(failed: usize, total: usize) -> Exit {
    if failed == 0 {
        Exit::success()
    } else {
        let word = if total == 1 { "download" } else { "downloads" };
        Exit::error().with_message(format!("{failed} of {total} {word} failed."))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_path_defaults_to_feed() {
        assert_eq!(page_path(None), "/");
    }

    #[test]
    fn test_page_path_from_url() {
        assert_eq!(
            page_path(Some("https://bsky.app/profile/oh8.bsky.social/post/3krmccyl4722w")),
            "/profile/oh8.bsky.social/post/3krmccyl4722w"
        );
        assert_eq!(page_path(Some("https://bsky.app")), "/");
    }

    #[test]
    fn test_page_path_bare() {
        assert_eq!(
            page_path(Some("/profile/oh8.bsky.social/post/3krmccyl4722w")),
            "/profile/oh8.bsky.social/post/3krmccyl4722w"
        );
    }

    #[tokio::test]
    async fn test_await_downloads_collects_saved_paths() {
        let handles = vec![
            tokio::spawn(async { Ok(Utf8PathBuf::from("a.jpg")) }),
            tokio::spawn(async {
                Err(DownloadError::Delivery(
                    bskydl_fetch::DeliveryError::NothingToSave,
                ))
            }),
        ];
        let (saved, failed) = await_downloads(handles).await;
        assert_eq!(saved, vec![Utf8PathBuf::from("a.jpg")]);
        assert_eq!(failed, 1);
    }
}
