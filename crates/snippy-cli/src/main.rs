mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;
use snippy_config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing (stderr, so JSON output stays clean)
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = cli::Cli::parse();

    let config = Config::load()?;

    match cli.command {
        cli::Commands::List(args) => commands::list::handle(args, &config).await,
        cli::Commands::Query(query_cmd) => commands::query::handle(query_cmd),
        cli::Commands::Config(config_cmd) => commands::config::handle(config_cmd, &config),
    }
}
