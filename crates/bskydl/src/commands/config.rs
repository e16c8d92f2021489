use anyhow::Context;
use anyhow::Result;
use bskydl_conf::Settings;
use clap::Parser;

use crate::args::GlobalArgs;
use crate::commands::Command;
use crate::exit::Exit;

#[derive(Debug, Parser)]
pub struct ShowConfig {}

impl Command for ShowConfig {
    async fn execute(&self, _args: &GlobalArgs, settings: Settings) -> Result<Exit> {
        let rendered = settings.to_toml().context("Failed to render settings")?;
        print!("{rendered}");
        Ok(Exit::success())
    }
}
