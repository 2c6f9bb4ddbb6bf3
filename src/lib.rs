pub mod cli;
pub mod clients;
pub mod config;
pub mod constants;
pub mod db;
pub mod entities;
pub mod error;
pub mod models;
pub mod parser;
pub mod services;

use clap::Parser;
use cli::{Cli, Commands};
pub use config::Config;
use services::PipelineOptions;
use tracing::info;
use tracing_subscriber::EnvFilter;

pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if let Some(Commands::Init { path }) = &cli.command {
        return cli::commands::cmd_init(path);
    }

    // A missing .env is normal; real environment variables still apply.
    dotenvy::dotenv().ok();

    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(output_dir) = &cli.output_dir {
        config.general.output_dir = output_dir.display().to_string();
    }
    config.validate()?;

    init_tracing(&config.general.log_level);
    info!(output_dir = %config.general.output_dir, "firetrack starting");

    match cli.command {
        Some(Commands::Ratings {
            csv,
            catalog,
            dry_run,
        }) => {
            let catalog =
                catalog.unwrap_or_else(|| config.output_dir().join(constants::files::CATALOG));
            cli::commands::cmd_ratings(&csv, &catalog, dry_run)
        }
        Some(Commands::Init { .. }) => Ok(()),
        Some(Commands::Run) | None => {
            let options = PipelineOptions {
                skip_apis: cli.skip_apis,
                skip_streaming: cli.skip_streaming,
                skip_scraping: cli.skip_scraping,
            };
            cli::commands::cmd_run(config, options).await
        }
    }
}

/// `RUST_LOG` wins over the configured level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    let fmt_layer = tracing_subscriber::fmt::layer().with_target(false);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();
}
