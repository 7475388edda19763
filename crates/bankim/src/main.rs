//! bankim - inspect the data-access layer against a running API.

use std::sync::Arc;

use anyhow::{Context, Result};
use bankim::DataLayer;
use bankim::client::Language;
use bankim::config::{BankimConfig, load_config};
use bankim::telemetry::{self, TelemetryOptions};
use bankim::types::MemoryStore;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "bankim")]
#[command(about = "Inspect dropdown content and configuration of the bankim API client")]
#[command(version)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// API base URL (overrides config)
    #[arg(long, global = true, env = "BANKIM_BASE_URL")]
    base_url: Option<String>,

    /// Also write a JSON log file next to the user config
    #[arg(long, global = true)]
    log_file: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch dropdown content for a screen
    Dropdowns {
        /// Screen location, e.g. mortgage_step1
        screen: String,

        /// Language code (he, en, ru)
        #[arg(default_value = "en")]
        language: String,

        /// Only show one field of the screen
        #[arg(long)]
        field: Option<String>,
    },

    /// Print the effective configuration
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut options = TelemetryOptions {
        verbose: cli.verbose,
        log_dir: None,
    };
    if cli.log_file {
        options = options.with_default_log_dir();
    }
    let _guard = telemetry::init(&options)?;

    let loaded = load_config(None)?;
    for warning in &loaded.warnings {
        tracing::warn!("{}", warning);
    }
    let mut config = loaded.config;
    if let Some(url) = cli.base_url {
        let mut client = config.client();
        client.base_url = url;
        config.client = Some(client);
    }

    match cli.command {
        Commands::Dropdowns {
            screen,
            language,
            field,
        } => dropdowns(&config, &screen, &language, field.as_deref()).await,
        Commands::Config => {
            print!("{}", config.to_toml()?);
            Ok(())
        }
    }
}

async fn dropdowns(
    config: &BankimConfig,
    screen: &str,
    language: &str,
    field: Option<&str>,
) -> Result<()> {
    let language: Language = language
        .parse()
        .map_err(|e: String| anyhow::anyhow!(e))?;
    let layer = DataLayer::from_config(config, Arc::new(MemoryStore::new()))?;

    let response = layer
        .dropdowns(screen, language)
        .await
        .with_context(|| format!("failed to fetch dropdowns for {screen}/{language}"))?;

    match field {
        Some(field) => {
            let resolved = response.field(screen, field);
            if let Some(label) = &resolved.label {
                println!("{label}");
            }
            if let Some(placeholder) = &resolved.placeholder {
                println!("  ({placeholder})");
            }
            for option in &resolved.options {
                println!("  {:<24} {}", option.value, option.label);
            }
        }
        None => println!("{}", serde_json::to_string_pretty(&response)?),
    }
    Ok(())
}
