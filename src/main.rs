mod alert;
mod config;
mod geo;
mod logging;
mod notify;
mod session;
mod stream;
mod telemetry;

use clap::{Parser, Subcommand};
use log::{error, info};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::config::Config;
use crate::session::{Session, SessionError};
use crate::stream::{ReplaySource, SondeHubStream};

#[derive(Parser)]
#[command(name = "sonde-alert")]
#[command(about = "Radiosonde proximity alerting")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a configuration file
    Validate {
        #[arg(short, long, default_value = "config.yaml")]
        config: PathBuf,
    },
    /// Monitor the telemetry stream and send alerts
    Run {
        #[arg(short, long, default_value = "config.yaml")]
        config: PathBuf,
        /// Feed a recorded JSON-lines stream instead of SondeHub
        #[arg(long)]
        replay: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init();

    match cli.command {
        Commands::Validate { config } => validate(&config),
        Commands::Run { config, replay } => run(&config, replay.as_deref()),
    }
}

fn load_config(path: &Path) -> Option<Config> {
    match Config::from_file(path) {
        Ok(config) => {
            info!("Loaded configuration from {}", path.display());
            Some(config)
        }
        Err(e) => {
            error!("Failed to load config from {}: {}", path.display(), e);
            None
        }
    }
}

fn validate(path: &Path) -> ExitCode {
    let Some(config) = load_config(path) else {
        return ExitCode::FAILURE;
    };

    let enabled = config.enabled_criteria().count();
    info!(
        "Configuration is valid ({} criteria, {} enabled, {} notification URLs)",
        config.criteria.len(),
        enabled,
        config.notifications.apprise_urls.len()
    );
    session::log_criteria(&config.criteria);
    ExitCode::SUCCESS
}

fn run(path: &Path, replay: Option<&Path>) -> ExitCode {
    let Some(config) = load_config(path) else {
        return ExitCode::FAILURE;
    };

    // Validated during load.
    if let Ok(level) = config.log_level() {
        logging::apply_level(level);
    }

    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(rt) => rt,
        Err(e) => {
            error!("Failed to start runtime: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(start(config, replay)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

async fn start(config: Config, replay: Option<&Path>) -> Result<(), SessionError> {
    let serials = config.stream.serials.clone();
    let session = Session::new(config)?;
    session.log_summary();

    match replay {
        Some(path) => {
            let source = ReplaySource::open(path).await?;
            session.run(source).await?;
        }
        None => {
            session.run(SondeHubStream::connect(&serials)).await?;
        }
    }
    Ok(())
}
