use anyhow::Context;
use anyhow::Result;
use camino::Utf8Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::Registry;

use crate::args::GlobalArgs;

const LOG_FILE_NAME: &str = "bskydl.log";

fn default_directive(args: &GlobalArgs, debug: bool) -> &'static str {
    if args.quiet {
        return "error";
    }
    match (args.verbose, debug) {
        (0, false) => "info",
        (0 | 1, _) => "debug",
        _ => "trace",
    }
}

/// Install the global subscriber: human-readable logs on stderr, plus a
/// daily-rotated file when `--log-file` is given.
///
/// `RUST_LOG` wins over `-v`/`-q` when set. The returned guard must be kept
/// alive for the file writer to flush.
pub fn init_tracing(args: &GlobalArgs, debug: bool) -> Result<Option<WorkerGuard>> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(args, debug)));

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(args.verbose > 0);

    let (file_layer, guard) = match &args.log_file {
        Some(path) => {
            let dir = path
                .parent()
                .filter(|p| !p.as_str().is_empty())
                .unwrap_or_else(|| Utf8Path::new("."));
            let name = path.file_name().unwrap_or(LOG_FILE_NAME);
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create log directory {dir}"))?;

            let file_appender = tracing_appender::rolling::daily(dir, name);
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
            let layer = fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_target(true)
                .with_file(true)
                .with_line_number(true);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    Registry::default()
        .with(env_filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .context("Failed to install log subscriber")?;

    Ok(guard)
}
