//! Packetline CLI
//!
//! Replays recorded assistant packet streams into step timelines and
//! inspects branch navigation in stored conversations.

mod cmd_branches;
mod cmd_replay;
mod config;
mod logging;
mod paths;
mod render;
mod turn_actor;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use packetline_protocol::MessageId;
use tracing::info;

use crate::config::OutputFormat;
use crate::logging::LogSettings;

#[derive(Parser)]
#[command(name = "packetline", version, about = "Assistant packet stream timelines")]
struct Cli {
    /// Data directory (logs, config.toml)
    #[arg(long, global = true, env = "PACKETLINE_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Output format
    #[arg(long, global = true, value_enum, env = "PACKETLINE_OUTPUT_FORMAT")]
    format: Option<OutputFormat>,

    /// Log filter directive, e.g. `packetline_timeline=debug`
    #[arg(long, global = true, env = "PACKETLINE_LOG_FILTER")]
    log_filter: Option<String>,

    /// Log file format: json or pretty
    #[arg(long, global = true, env = "PACKETLINE_LOG_FORMAT")]
    log_format: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Fold a JSONL packet stream into a timeline (`-` or no file reads stdin)
    Replay { input: Option<PathBuf> },

    /// Show sibling navigation for a message in a JSON message list
    Branches {
        file: PathBuf,

        #[arg(long)]
        node: MessageId,

        /// Make the node the active response before reporting
        #[arg(long)]
        select: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let data_dir = paths::init_data_dir(cli.data_dir.as_deref());
    paths::ensure_dirs()?;
    let file_config = config::load(&paths::config_path())?;

    let settings = LogSettings {
        filter: cli.log_filter.or(file_config.log.filter),
        format: cli.log_format.or(file_config.log.format),
    };
    let logging = logging::init_logging(&paths::log_dir(), &settings)?;
    let format = cli
        .format
        .or(file_config.output_format)
        .unwrap_or_default();

    info!(
        component = "cli",
        event = "cli.start",
        run_id = %logging.run_id,
        data_dir = %data_dir.display(),
        "Starting packetline"
    );

    let result = match cli.command {
        Command::Replay { input } => cmd_replay::run(input, format).await,
        Command::Branches { file, node, select } => cmd_branches::run(&file, node, select, format),
    };
    if let Err(err) = &result {
        tracing::error!(component = "cli", event = "cli.failed", error = %err, "Command failed");
    }

    drop(logging);
    result
}
