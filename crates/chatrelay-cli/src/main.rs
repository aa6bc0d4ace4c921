//! CLI entry point.

use clap::{CommandFactory, Parser};
use tracing_subscriber::EnvFilter;

use chatrelay_cli::{Cli, Commands, bootstrap, handlers};

fn init_logging(level: Option<&str>) {
    let filter = level
        .and_then(|directive| EnvFilter::try_new(directive).ok())
        .or_else(|| EnvFilter::try_from_default_env().ok())
        .unwrap_or_else(|| EnvFilter::new("info"));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables before clap reads CHATRELAY_* values
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_logging(cli.log_level.as_deref());

    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        return Ok(());
    };

    let ctx = bootstrap(cli.config).await?;

    match command {
        Commands::Serve(args) => handlers::serve::execute(&ctx, args).await?,
        Commands::Config { command } => handlers::config::execute(&ctx, command).await?,
    }

    Ok(())
}
