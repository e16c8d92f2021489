use std::process::ExitCode;

use anyhow::Context;
use anyhow::Result;
use clap::Parser;

use crate::args::Args;
use crate::commands::BskydlCommand;
use crate::logging::init_tracing;

/// Find post images in a rendered Bluesky feed and save them under
/// descriptive filenames.
#[derive(Parser)]
#[command(name = "bskydl")]
#[command(version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: BskydlCommand,

    #[command(flatten)]
    pub args: Args,
}

/// Parse CLI arguments and execute the chosen command
pub async fn run(args: Vec<String>) -> Result<ExitCode> {
    let cli = Cli::try_parse_from(args).unwrap_or_else(|e| {
        e.exit();
    });

    let project_root = std::env::current_dir().context("Failed to get current directory")?;
    let settings =
        bskydl_conf::Settings::new(&project_root).context("Failed to load settings")?;

    // Held until the command returns so buffered file logs get flushed.
    let _guard = init_tracing(&cli.args.global, settings.debug)?;
    tracing::debug!(?settings, "loaded settings");

    let exit = cli.command.execute(&cli.args.global, settings).await?;
    Ok(exit.report())
}
