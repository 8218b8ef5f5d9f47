// Main entry point for testrun-notify

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{debug, warn};

use testrun_notify::cli::{Cli, Commands};
use testrun_notify::commands;
use testrun_notify::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    testrun_notify::logging::init(cli.verbose);
    debug!("Starting testrun-notify v{}", env!("CARGO_PKG_VERSION"));

    if let Some(shell_type) = &cli.completion {
        return commands::handle_completion(shell_type);
    }

    // An explicitly requested file must load; default locations are optional
    let (mut config, source) = match &cli.config_file {
        Some(path) => {
            let config = Config::load_from_file(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?;
            (config, Some(path.clone()))
        }
        None => match Config::load() {
            Some((config, path)) => (config, Some(path)),
            None => (Config::default(), None),
        },
    };
    config.apply_env();

    match &cli.command {
        Some(Commands::Ingest(args)) => commands::handle_ingest(args, config).await,
        Some(Commands::Archive(args)) => commands::handle_archive(args).await,
        Some(Commands::Config) => commands::handle_config(&config, source.as_deref()),
        Some(Commands::InitConfig(args)) => commands::handle_init_config(&args.path),
        None => {
            warn!("No command given. Use 'testrun-notify --help' for usage.");
            Ok(())
        }
    }
}
