use anyhow::Context;
use cardio_agent::brain::provider::AnthropicProvider;
use cardio_agent::config::{self, Config};
use cardio_agent::consultation::{ConsultationExecutor, ConsultationProcessor};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Debug, Parser)]
#[command(name = "cardio-agent", version, about = "Interventional cardiology A2A agent")]
struct Cli {
    /// Environment file to load before reading configuration.
    #[arg(long, env = "ENV_FILE")]
    env_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the A2A server (default).
    Serve,
    /// Print the agent card as JSON.
    Card,
    /// Print the configuration summary.
    Config,
}

#[tokio::main]
async fn main() {
    if let Err(err) = run(Cli::parse()).await {
        eprintln!("Error: {:#}", err);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let env_file = config::load_env_file(cli.env_file.as_deref())?;
    let config = Config::load().context("Failed to load configuration")?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(config, env_file).await,
        Command::Card => {
            println!("{}", serde_json::to_string_pretty(&config.agent_card())?);
            Ok(())
        }
        Command::Config => {
            println!("{}", config.summary());
            Ok(())
        }
    }
}

async fn serve(config: Config, env_file: Option<PathBuf>) -> anyhow::Result<()> {
    let _log_guard = cardio_agent::logging::init(&config.server.log_level, config.server.log_json)
        .context("Failed to initialize logging")?;

    tracing::info!("Starting cardio-agent v{}", cardio_agent::VERSION);
    if let Some(path) = env_file {
        tracing::info!("Loaded environment from {}", path.display());
    }
    for line in config.summary().lines() {
        tracing::info!("{}", line);
    }
    if config.security.rate_limit_enabled {
        tracing::warn!(
            "RATE_LIMIT_ENABLED is set ({} rpm) but requests are not throttled",
            config.security.rate_limit_rpm
        );
    }

    let provider = Arc::new(
        AnthropicProvider::from_settings(&config.claude)
            .context("Failed to initialize Claude client")?,
    );
    let processor = ConsultationProcessor::new(&config, provider);
    let executor = Arc::new(ConsultationExecutor::new(processor));

    cardio_agent::a2a::server::start_server(&config, executor)
        .await
        .context("A2A server failed")
}
