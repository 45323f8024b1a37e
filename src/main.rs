use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, Shell};
use std::io;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod cli;
mod clients;
mod core;
mod daemon;

use crate::core::settings::Settings;

#[derive(Parser)]
#[command(name = "electric-eye")]
#[command(author, version, about = "Electricity price and EV charger poller")]
struct Cli {
    /// Path to the config file
    #[arg(long, global = true, env = "ELECTRIC_EYE_CONFIG")]
    config: Option<PathBuf>,

    /// Log output format
    #[arg(long, global = true, value_enum, default_value = "text")]
    log_format: LogFormat,

    /// Also send logs to the systemd journal
    #[arg(long, global = true)]
    journald: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Run both pollers and the query server
    Daemon,

    /// Show the status ledger of a running daemon
    Status {
        /// Output as JSON
        #[arg(long)]
        json: bool,

        /// Only show one poller (price or charger)
        #[arg(long)]
        poller: Option<String>,

        /// Only show failed entries
        #[arg(long)]
        failures: bool,
    },

    /// Show prices cached by a running daemon
    Prices {
        /// Show tomorrow's prices instead of today's
        #[arg(long)]
        tomorrow: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Validate the configuration and print the effective settings
    CheckConfig,

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn init_logging(format: LogFormat, journald: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let (text, json) = match format {
        LogFormat::Text => (Some(tracing_subscriber::fmt::layer()), None),
        LogFormat::Json => (None, Some(tracing_subscriber::fmt::layer().json())),
    };

    let journald = if journald {
        match tracing_journald::layer() {
            Ok(layer) => Some(layer),
            Err(e) => {
                eprintln!("Failed to connect to journald, continuing without it: {}", e);
                None
            }
        }
    } else {
        None
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(text)
        .with(json)
        .with(journald)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if let Commands::Completions { shell } = cli.command {
        let mut cmd = Cli::command();
        let name = cmd.get_name().to_string();
        generate(shell, &mut cmd, name, &mut io::stdout());
        return Ok(());
    }

    init_logging(cli.log_format, cli.journald);
    let settings = Settings::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Daemon => daemon::run(settings).await,
        Commands::Status {
            json,
            poller,
            failures,
        } => cli::status::run(&settings, json, poller, failures).await,
        Commands::Prices { tomorrow, json } => cli::prices::run(&settings, tomorrow, json).await,
        Commands::CheckConfig => cli::check_config::run(&settings),
        Commands::Completions { .. } => Ok(()),
    }
}
