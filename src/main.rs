use std::sync::Arc;

use clap::{Parser, Subcommand};

use digo_bot::application::commands::register_defaults;
use digo_bot::application::errors::{BotError, ConfigError};
use digo_bot::application::messaging::{CommandRouter, EventDispatcher};
use digo_bot::application::services::{
    termination_signal, MessageLogger, PersistenceGateway, SessionManager,
};
use digo_bot::domain::entities::{Intents, Session};
use digo_bot::infrastructure::adapters::{DiscordGateway, DiscordResponder};
use digo_bot::infrastructure::config::Config;
use digo_bot::infrastructure::storage::MongoStore;

#[derive(Parser)]
#[command(name = "digo-bot")]
#[command(about = "Discord chat logger and command bot", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path
    #[arg(short, long, default_value = "config.yaml")]
    config: String,

    /// Bot token (overrides config and DISCORD_TOKEN)
    #[arg(short, long)]
    token: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the bot
    Run,
    /// Show version
    Version,
    /// Generate default config
    InitConfig,
}

fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run => {
            if let Err(e) = run_bot(cli.config, cli.token) {
                tracing::error!("Fatal: {}", e);
                std::process::exit(1);
            }
        }
        Commands::Version => {
            println!("digo-bot v{}", env!("CARGO_PKG_VERSION"));
        }
        Commands::InitConfig => {
            init_config(&cli.config);
        }
    }
}

fn load_config(config_path: &str, token_override: Option<String>) -> Result<Config, ConfigError> {
    if let Err(e) = dotenvy::dotenv() {
        tracing::warn!("Error loading .env file: {}", e);
    }

    let mut config = Config::load_or_default(config_path)?;

    config.apply_env();
    if let Some(token) = token_override {
        config.discord.token = Some(token);
    }
    config.validate()?;
    Ok(config)
}

fn run_bot(config_path: String, token_override: Option<String>) -> Result<(), BotError> {
    let config = load_config(&config_path, token_override)?;

    tracing::info!("Starting {}", config.bot.name);

    let token = config.token().unwrap_or_default().to_string();
    let settings = config.session_settings();
    let grace = settings.shutdown_timeout;

    let router = Arc::new(CommandRouter::new(config.bot.prefix));
    register_defaults(&router)?;

    let dispatcher = Arc::new(EventDispatcher::new(
        Arc::new(MessageLogger::new(&config.chat_log.path)),
        router,
        Arc::new(DiscordResponder::new(&token)),
    ));
    let persistence = Arc::new(PersistenceGateway::new(MongoStore::new(), &config.storage.database));

    let manager = SessionManager::new(
        Session::new(token, Intents::chat_logging()),
        DiscordGateway::new(config.connect_timeout()),
        persistence,
        dispatcher,
        settings,
    );

    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| BotError::InvalidState(format!("Failed to start runtime: {}", e)))?;

    let result = rt.block_on(async {
        manager.start().await?;
        manager.await_shutdown(termination_signal()).await?;
        Ok::<(), BotError>(())
    });

    // Handlers still stuck in the blocking pool must not hold the process open
    rt.shutdown_timeout(grace);
    result
}

fn init_config(path: &str) {
    if std::path::Path::new(path).exists() {
        eprintln!("{} already exists, not overwriting", path);
        std::process::exit(1);
    }

    let yaml = match Config::default().to_yaml() {
        Ok(yaml) => yaml,
        Err(e) => {
            eprintln!("Failed to render config: {}", e);
            std::process::exit(1);
        }
    };

    match std::fs::write(path, yaml) {
        Ok(()) => println!("Wrote default config to {}", path),
        Err(e) => {
            eprintln!("Failed to write {}: {}", path, e);
            std::process::exit(1);
        }
    }
}
