mod cli;
mod commands;

use clap::Parser;
use cli::{CacheAction, Cli, Commands};

fn main() -> anyhow::Result<()> {
    // Credentials may live in a .env file
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = cli.config.as_deref();

    match cli.command {
        Commands::Analyze(args) => commands::analyze::run(&args, config),
        Commands::Fetch { item, output } => commands::fetch::run(item, output.as_deref(), config),
        Commands::Cache { action } => match action {
            CacheAction::Stats => commands::cache::run_stats(config),
            CacheAction::Clear { model } => commands::cache::run_clear(model.as_deref(), config),
        },
        Commands::Version => commands::version::run(),
    }
}
