use std::io::{self, BufRead, Write};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use lifeview_app::{ClientConfig, RestClient, SimulationApi};
use lifeview_core::{CellVariant, Command, ReportSummary, SimulationSnapshot, SpeedSetting};
use owo_colors::OwoColorize;

#[derive(Parser, Debug)]
#[command(
    name = "lifeview-ctl",
    version,
    about = "Send one-shot commands to a remote cellular ecosystem simulation"
)]
struct Cli {
    #[command(flatten)]
    client: ClientConfig,

    #[command(subcommand)]
    command: CtlCommand,
}

#[derive(Subcommand, Debug)]
enum CtlCommand {
    /// Start (or resume) the simulation.
    Start,
    /// Toggle the paused flag.
    Pause,
    /// Clear the simulation back to an empty arena.
    Reset,
    /// Inject one cell of the given variant.
    AddCell {
        #[arg(value_enum)]
        variant: VariantArg,
    },
    /// Drop a batch of food into the arena.
    AddFood,
    /// Remove every living cell.
    KillAll {
        /// Skip the interactive confirmation.
        #[arg(long)]
        yes: bool,
    },
    /// Change the simulation tick rate.
    Speed {
        #[arg(value_enum)]
        setting: SpeedArg,
    },
    /// Print the current population and resources.
    Status,
    /// Print the post-run analysis.
    Report,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum VariantArg {
    Asexual,
    Sexual,
}

impl From<VariantArg> for CellVariant {
    fn from(arg: VariantArg) -> Self {
        match arg {
            VariantArg::Asexual => CellVariant::Asexual,
            VariantArg::Sexual => CellVariant::Sexual,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum SpeedArg {
    Fast,
    Slow,
    Normal,
}

impl From<SpeedArg> for SpeedSetting {
    fn from(arg: SpeedArg) -> Self {
        match arg {
            SpeedArg::Fast => SpeedSetting::Fast,
            SpeedArg::Slow => SpeedSetting::Slow,
            SpeedArg::Normal => SpeedSetting::Normal,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .try_init();

    let cli = Cli::parse();
    cli.client.validate()?;
    let client = RestClient::new(&cli.client)?;

    let command = match cli.command {
        CtlCommand::Start => Command::Start,
        CtlCommand::Pause => Command::TogglePause,
        CtlCommand::Reset => Command::Reset,
        CtlCommand::AddCell { variant } => Command::AddCell(variant.into()),
        CtlCommand::AddFood => Command::AddFood,
        CtlCommand::KillAll { yes } => {
            if !yes && !confirm("Terminate every living cell?")? {
                println!("{}", "aborted; nothing sent".yellow());
                return Ok(());
            }
            Command::KillAll
        }
        CtlCommand::Speed { setting } => Command::Speed(setting.into()),
        CtlCommand::Status => return status_command(&client).await,
        CtlCommand::Report => return report_command(&client).await,
    };

    client
        .send_command(command)
        .await
        .with_context(|| format!("failed to send {command}"))?;
    println!("{} {}", "sent".green().bold(), command);
    Ok(())
}

async fn status_command(client: &RestClient) -> Result<()> {
    let snapshot = client
        .fetch_status()
        .await
        .context("failed to fetch simulation status")?;
    print_status(&snapshot);
    Ok(())
}

fn print_status(snapshot: &SimulationSnapshot) {
    let state = if !snapshot.running {
        "STOPPED".dimmed().to_string()
    } else if snapshot.paused {
        "PAUSED".yellow().bold().to_string()
    } else {
        "RUNNING".green().bold().to_string()
    };

    println!("{:<14} {}", "STATE".bold().cyan(), state);
    println!("{:<14} {}", "POPULATION".bold().cyan(), snapshot.alive_count);
    println!("{:<14} {}", "RESOURCES".bold().cyan(), snapshot.available_food);
    println!("{}", "-".repeat(32).dimmed());
    println!(
        "{:<14} {}",
        CellVariant::Asexual.label().blue(),
        snapshot.variant_count(CellVariant::Asexual)
    );
    println!(
        "{:<14} {}",
        CellVariant::Sexual.label().magenta(),
        snapshot.variant_count(CellVariant::Sexual)
    );
    println!("{:<14} {}", "hungry".red(), snapshot.hungry_count());
}

async fn report_command(client: &RestClient) -> Result<()> {
    let summary = match client.fetch_report().await {
        Ok(summary) => summary,
        Err(err) => {
            tracing::warn!(error = %err, "report unavailable");
            ReportSummary::unavailable()
        }
    };

    if summary.is_unavailable() {
        println!("{}", summary.analysis.red().bold());
    } else {
        println!("{}", summary.analysis);
    }
    println!("{}", "-".repeat(32).dimmed());
    println!("{:<20} {}", "SURVIVORS".bold().cyan(), summary.alive_count);
    println!("{:<20} {}", "DIVISIONS (A)".bold().cyan(), summary.divisions);
    println!(
        "{:<20} {}",
        "REPRODUCTIONS (S)".bold().cyan(),
        summary.generations
    );
    Ok(())
}

fn confirm(prompt: &str) -> Result<bool> {
    print!("{} [y/N] ", prompt.red().bold());
    io::stdout().flush().context("failed to flush prompt")?;
    let mut answer = String::new();
    io::stdin()
        .lock()
        .read_line(&mut answer)
        .context("failed to read confirmation")?;
    Ok(is_affirmative(&answer))
}

fn is_affirmative(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}
