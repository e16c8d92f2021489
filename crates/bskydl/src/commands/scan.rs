use anyhow::Result;
use bskydl_conf::Settings;
use bskydl_engine::Engine;
use bskydl_engine::EngineOptions;
use camino::Utf8PathBuf;
use clap::Parser;

use crate::args::GlobalArgs;
use crate::commands::await_downloads;
use crate::commands::download_summary;
use crate::commands::downloader;
use crate::commands::page_path;
use crate::commands::read_snapshot;
use crate::commands::Command;
use crate::exit::Exit;

#[derive(Debug, Parser)]
pub struct Scan {
    /// HTML snapshot of the rendered page.
    snapshot: Utf8PathBuf,

    /// Address of the page the snapshot was taken from. On a post page
    /// every image is credited to that post.
    #[arg(long, value_name = "URL")]
    url: Option<String>,

    /// Download every image that got a button.
    #[arg(long)]
    download: bool,

    /// Directory to save downloads in. Overrides `output_dir`.
    #[arg(long, value_name = "DIR")]
    output: Option<Utf8PathBuf>,

    /// Print the document tree after the pass.
    #[arg(long)]
    dump: bool,
}

impl Command for Scan {
    async fn execute(&self, args: &GlobalArgs, mut settings: Settings) -> Result<Exit> {
        if let Some(output) = &self.output {
            settings.output_dir.clone_from(output);
        }

        let mut doc = read_snapshot(&self.snapshot)?;
        let mut engine = Engine::new(EngineOptions::from(&settings));
        let report = engine.tick(&mut doc, &page_path(self.url.as_deref()));
        tracing::debug!(?report, "scan finished");

        if !args.quiet {
            for affordance in engine.affordances() {
                println!("{}\t{}", affordance.filename, affordance.image_url);
            }
        }

        let exit = if self.download {
            let downloader = downloader(&settings)?;
            let handles: Vec<_> = engine
                .affordances()
                .map(|affordance| downloader.click(affordance))
                .collect();
            let total = handles.len();
            let (saved, failed) = await_downloads(handles).await;

            for path in &saved {
                let name = path.file_name().unwrap_or(path.as_str());
                if let Err(err) = doc.point_download_link(path.as_str(), name) {
                    tracing::debug!("{err}; saved without an in-page link");
                    break;
                }
            }
            download_summary(failed, total)
        } else {
            Exit::success()
        };

        if self.dump {
            print!("{}", doc.outline(doc.root()));
        }
        Ok(exit)
    }
}
