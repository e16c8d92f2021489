use std::sync::Arc;
use std::sync::Mutex;
use std::sync::PoisonError;
use std::time::SystemTime;

use anyhow::Result;
use bskydl_conf::Settings;
use bskydl_dom::Document;
use bskydl_dom::NodeId;
use bskydl_engine::Affordance;
use bskydl_engine::DiscoveryLoop;
use bskydl_engine::Engine;
use bskydl_engine::EngineOptions;
use camino::Utf8Path;
use camino::Utf8PathBuf;
use clap::Parser;
use rustc_hash::FxHashSet;

use crate::args::GlobalArgs;
use crate::commands::await_downloads;
use crate::commands::download_summary;
use crate::commands::downloader;
use crate::commands::page_path;
use crate::commands::read_snapshot;
use crate::commands::Command;
use crate::exit::Exit;

#[derive(Debug, Parser)]
pub struct Watch {
    /// HTML snapshot of the rendered page. Rewrite it to feed new content
    /// to the running scan.
    snapshot: Utf8PathBuf,

    /// Address of the page the snapshot was taken from.
    #[arg(long, value_name = "URL")]
    url: Option<String>,

    /// Download each image as soon as it gets a button.
    #[arg(long)]
    download: bool,

    /// Directory to save downloads in. Overrides `output_dir`.
    #[arg(long, value_name = "DIR")]
    output: Option<Utf8PathBuf>,

    /// Stop after this many passes instead of waiting for Ctrl-C.
    #[arg(long, value_name = "N")]
    ticks: Option<u64>,
}

impl Command for Watch {
    async fn execute(&self, args: &GlobalArgs, mut settings: Settings) -> Result<Exit> {
        if let Some(output) = &self.output {
            settings.output_dir.clone_from(output);
        }

        let mut snapshot = LiveSnapshot::open(&self.snapshot)?;
        let page_path = page_path(self.url.as_deref());
        let downloader = if self.download {
            Some(downloader(&settings)?)
        } else {
            None
        };

        let mut engine = Engine::new(EngineOptions::from(&settings));
        let mut seen = Seen::default();
        let mut pending = Vec::new();

        let mut discovery = DiscoveryLoop::new(settings.poll_interval());
        if let Some(ticks) = self.ticks {
            discovery = discovery.with_max_ticks(ticks);
        }
        let shutdown = async {
            if tokio::signal::ctrl_c().await.is_err() {
                std::future::pending::<()>().await;
            }
        };

        tracing::info!("Watching {} every {:?}", self.snapshot, settings.poll_interval());
        let ticks = discovery
            .run(
                |_| {
                    if snapshot.refresh() {
                        engine.reset();
                        seen.forget_buttons();
                    }

                    let document = snapshot.document();
                    let mut doc = document.lock().unwrap_or_else(PoisonError::into_inner);
                    engine.tick(&mut doc, &page_path);

                    for (affordance, fresh) in seen.take_new(engine.affordances()) {
                        if !args.quiet {
                            println!("{}\t{}", affordance.filename, affordance.image_url);
                        }
                        if let (Some(downloader), true) = (&downloader, fresh) {
                            pending.push(downloader.click(affordance));
                        }
                    }
                },
                shutdown,
            )
            .await;
        tracing::debug!(ticks, "discovery stopped");

        let total = pending.len();
        let (_, failed) = await_downloads(pending).await;
        Ok(download_summary(failed, total))
    }
}

/// What the watch loop has already handled.
///
/// Buttons belong to one document and are forgotten on reload. Image URLs
/// are kept for the whole run, so a reloaded snapshot does not fetch the
/// same image twice.
#[derive(Debug, Default)]
struct Seen {
    buttons: FxHashSet<NodeId>,
    fetched: FxHashSet<String>,
}

impl Seen {
    fn forget_buttons(&mut self) {
        self.buttons.clear();
    }

    /// Affordances whose button has not been reported yet, each paired
    /// with whether its image still needs downloading.
    fn take_new<'a>(
        &mut self,
        affordances: impl IntoIterator<Item = &'a Affordance>,
    ) -> Vec<(&'a Affordance, bool)> {
        let mut new = Vec::new();
        for affordance in affordances {
            if !self.buttons.insert(affordance.button) {
                continue;
            }
            let fresh = self.fetched.insert(affordance.image_url.clone());
            new.push((affordance, fresh));
        }
        new
    }
}

/// A snapshot file and the document parsed from it, re-read whenever the
/// file's modification time changes.
struct LiveSnapshot {
    path: Utf8PathBuf,
    modified: Option<SystemTime>,
    document: Arc<Mutex<Document>>,
}

impl LiveSnapshot {
    fn open(path: &Utf8Path) -> Result<Self> {
        let modified = modified_time(path);
        let document = read_snapshot(path)?;
        Ok(Self {
            path: path.to_owned(),
            modified,
            document: Arc::new(Mutex::new(document)),
        })
    }

    fn document(&self) -> Arc<Mutex<Document>> {
        Arc::clone(&self.document)
    }

    /// Reload if the file changed. Returns `true` when the document was
    /// replaced; every node from the old one is gone at that point.
    fn refresh(&mut self) -> bool {
        let modified = modified_time(&self.path);
        if modified == self.modified {
            return false;
        }
        self.modified = modified;

        match read_snapshot(&self.path) {
            Ok(document) => {
                *self.document.lock().unwrap_or_else(PoisonError::into_inner) = document;
                tracing::info!("Reloaded {}", self.path);
                true
            }
            Err(err) => {
                tracing::warn!("Keeping previous snapshot: {err:#}");
                false
            }
        }
    }
}

fn modified_time(path: &Utf8Path) -> Option<SystemTime> {
    std::fs::metadata(path).and_then(|meta| meta.modified()).ok()
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn gallery(images: usize) -> String {
        let imgs: String = (0..images)
            .map(|i| {
                format!(
                    r#"<div><div><img src="https://cdn.bsky.app/img/feed_thumbnail/plain/did:plc:a/bafy{i}@jpeg" alt=""></div></div>"#
                )
            })
            .collect();
        format!(
            r#"<div id="root"><div>
                <a href="/profile/oh8.bsky.social/post/3krmccyl4722w" aria-label="3h">3h</a>
                <div>{imgs}</div>
            </div></div>"#
        )
    }

    fn fresh_count(new: &[(&Affordance, bool)]) -> usize {
        new.iter().filter(|(_, fresh)| *fresh).count()
    }

    #[test]
    fn test_seen_reports_each_button_once() {
        let mut engine = Engine::new(EngineOptions::default());
        let mut seen = Seen::default();
        let mut doc = bskydl_dom::parse_html(&gallery(2));

        engine.tick(&mut doc, "/");
        let first = seen.take_new(engine.affordances());
        assert_eq!(first.len(), 2);
        assert_eq!(fresh_count(&first), 2);

        engine.tick(&mut doc, "/");
        assert!(seen.take_new(engine.affordances()).is_empty());
    }

    #[test]
    fn test_seen_after_reload_fetches_only_new_images() {
        let mut engine = Engine::new(EngineOptions::default());
        let mut seen = Seen::default();
        let mut doc = bskydl_dom::parse_html(&gallery(2));
        engine.tick(&mut doc, "/");
        assert_eq!(fresh_count(&seen.take_new(engine.affordances())), 2);

        // Same two images plus one more, as a rewritten snapshot.
        doc = bskydl_dom::parse_html(&gallery(3));
        engine.reset();
        seen.forget_buttons();
        engine.tick(&mut doc, "/");

        let new = seen.take_new(engine.affordances());
        assert_eq!(new.len(), 3);
        let fetched: Vec<_> = new
            .iter()
            .filter(|(_, fresh)| *fresh)
            .map(|(affordance, _)| affordance.image_url.as_str())
            .collect();
        assert_eq!(
            fetched,
            vec!["https://cdn.bsky.app/img/feed_thumbnail/plain/did:plc:a/bafy2@jpeg"]
        );
    }

    fn write_with_mtime(path: &Utf8Path, contents: &str, modified: SystemTime) {
        std::fs::write(path, contents).unwrap();
        std::fs::File::options()
            .write(true)
            .open(path)
            .unwrap()
            .set_modified(modified)
            .unwrap();
    }

    fn ids(snapshot: &LiveSnapshot) -> Vec<String> {
        let document = snapshot.document();
        let doc = document.lock().unwrap();
        doc.elements_by_tag(doc.root(), "p")
            .filter_map(|p| doc.attr(p, "id").map(str::to_string))
            .collect()
    }

    #[test]
    fn test_refresh_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let path = Utf8PathBuf::from_path_buf(dir.path().join("feed.html")).unwrap();
        write_with_mtime(
            &path,
            r#"<p id="one"></p>"#,
            SystemTime::UNIX_EPOCH + Duration::from_secs(1_000),
        );

        let mut snapshot = LiveSnapshot::open(&path).unwrap();
        assert!(!snapshot.refresh());
        assert_eq!(ids(&snapshot), vec!["one"]);
    }

    #[test]
    fn test_refresh_after_rewrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = Utf8PathBuf::from_path_buf(dir.path().join("feed.html")).unwrap();
        let start = SystemTime::UNIX_EPOCH + Duration::from_secs(1_000);
        write_with_mtime(&path, r#"<p id="one"></p>"#, start);
        let mut snapshot = LiveSnapshot::open(&path).unwrap();
        let shared = snapshot.document();

        write_with_mtime(
            &path,
            r#"<p id="two"></p><p id="three"></p>"#,
            start + Duration::from_secs(5),
        );

        assert!(snapshot.refresh());
        assert_eq!(ids(&snapshot), vec!["two", "three"]);
        // Handles taken before the reload see the new tree.
        assert!(Arc::ptr_eq(&shared, &snapshot.document()));
        assert!(!snapshot.refresh());
    }

    #[test]
    fn test_refresh_keeps_document_when_file_disappears() {
        let dir = tempfile::tempdir().unwrap();
        let path = Utf8PathBuf::from_path_buf(dir.path().join("feed.html")).unwrap();
        write_with_mtime(
            &path,
            r#"<p id="one"></p>"#,
            SystemTime::UNIX_EPOCH + Duration::from_secs(1_000),
        );
        let mut snapshot = LiveSnapshot::open(&path).unwrap();

        std::fs::remove_file(&path).unwrap();

        assert!(!snapshot.refresh());
        assert_eq!(ids(&snapshot), vec!["one"]);
    }
}
