mod analyze_cmd;
mod config_cmd;
mod extract_cmd;
mod scan_cmd;
mod terminal_output;
mod wiring;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use logging::LogOutput;
use tracing::warn;

#[derive(Parser)]
#[command(name = "aqualabel")]
#[command(about = "AquaLabel: read the mineral table off a bottled-water label")]
#[command(version)]
struct Cli {
    /// Config file (default: $AQUALABEL_CONFIG_DIR/config.yaml or ~/.aqualabel/config.yaml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Skip the vision service and answer every request with this text
    #[arg(long, global = true, value_name = "TEXT")]
    mock: Option<String>,

    /// Log level or RUST_LOG-style filter; overrides the config
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive camera screen (default)
    Scan,
    /// Run the full pipeline once over an image file
    Analyze {
        image: PathBuf,
        /// Print machine-readable JSON
        #[arg(long)]
        json: bool,
    },
    /// Pull mineral values out of model text (file or stdin)
    Extract {
        file: Option<PathBuf>,
        #[arg(long)]
        json: bool,
    },
    /// Inspect or create the config file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective config with secrets masked
    Show,
    /// Write a config file with every default filled in
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Print the config file path
    Path,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| aqualabel_config::config_file_path(&aqualabel_config::config_dir()));

    // Config commands must work even when the file does not validate.
    if let Some(Commands::Config { action }) = &cli.command {
        return match action {
            ConfigAction::Show => config_cmd::show(&config_path).await,
            ConfigAction::Init { force } => config_cmd::init(&config_path, *force).await,
            ConfigAction::Path => {
                println!("{}", config_path.display());
                Ok(())
            }
        };
    }

    let config = aqualabel_config::load_and_prepare(&config_path).await?;

    let command = cli.command.unwrap_or(Commands::Scan);
    let output = match command {
        Commands::Scan => LogOutput::FileOnly,
        _ => LogOutput::Console,
    };
    let level = cli
        .log_level
        .as_deref()
        .unwrap_or_else(|| config.logging.level());
    logging::init_logger(config.logging.dir(), level, output)?;
    for warning in aqualabel_config::validate(&config).warnings {
        warn!(path = %warning.path, message = %warning.message, "Config warning");
    }

    let mock = cli.mock.as_deref();
    match command {
        Commands::Scan => scan_cmd::run(&config, mock).await,
        Commands::Analyze { image, json } => analyze_cmd::run(&config, mock, &image, json).await,
        Commands::Extract { file, json } => extract_cmd::run(&config, file.as_deref(), json).await,
        Commands::Config { .. } => Ok(()),
    }
}
