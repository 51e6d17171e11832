use std::{fs::File, path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use clap::Parser;
use lifeview_app::{ClientConfig, RestClient, SessionDriver, TerminalHud};
use tokio::runtime::Handle;
use tracing::info;
use tracing_subscriber::EnvFilter;

const HEADLESS_ENV: &str = "LIFEVIEW_HEADLESS";

#[derive(Debug, Parser)]
#[command(name = "lifeview", version, about = "Terminal observer for a remote cellular ecosystem simulation")]
struct Cli {
    #[command(flatten)]
    client: ClientConfig,

    /// Render this many frames off-screen instead of taking over the terminal.
    #[arg(long)]
    headless_frames: Option<usize>,

    /// Write a JSON summary of the headless run to this path.
    #[arg(long, requires = "headless_frames")]
    headless_report: Option<PathBuf>,

    /// Send logs to this file; the HUD owns stdout while it runs.
    #[arg(long, env = "LIFEVIEW_LOG_FILE")]
    log_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let mut cli = Cli::parse();
    init_tracing(cli.log_file.as_deref())?;
    cli.client.validate()?;

    if cli.headless_frames.is_none()
        && let Some(frames) = std::env::var(HEADLESS_ENV)
            .ok()
            .and_then(|raw| raw.parse::<usize>().ok())
    {
        cli.headless_frames = Some(frames);
    }

    let api = Arc::new(RestClient::new(&cli.client)?);
    info!(
        base_url = api.base_url(),
        poll_interval_ms = cli.client.poll_interval_ms,
        "Starting lifeview"
    );

    let runtime = Handle::current();
    let poll_interval = cli.client.poll_interval();
    tokio::task::spawn_blocking(move || -> Result<()> {
        let mut driver = SessionDriver::new(api, runtime, poll_interval);
        let hud = TerminalHud::default();
        match cli.headless_frames {
            Some(frames) => {
                let report = hud.run_headless(&mut driver, frames)?;
                if let Some(path) = cli.headless_report.as_deref() {
                    report.write_json(path)?;
                }
                Ok(())
            }
            None => hud.run(&mut driver),
        }
    })
    .await
    .context("HUD thread panicked")?
}

fn init_tracing(log_file: Option<&std::path::Path>) -> Result<()> {
    match log_file {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("failed to open log file {}", path.display()))?;
            let filter =
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
            let _ = tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Arc::new(file))
                .try_init();
        }
        None => {
            let _ = tracing_subscriber::fmt()
                .with_env_filter(EnvFilter::from_default_env())
                .with_writer(std::io::stderr)
                .try_init();
        }
    }
    Ok(())
}
