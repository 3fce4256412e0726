use anyhow::Context;
use clap::Parser;
use dsacoach::cli::handle_ask;
use dsacoach::cli::handle_config_command;
use dsacoach::cli::handle_index;
use dsacoach::cli::handle_serve_api;
use dsacoach::cli::print_error;
use dsacoach::cli::Cli;
use dsacoach::cli::Commands;
use dsacoach::config::AppConfig;
use tracing::info;

fn load_config(cli: &Cli) -> anyhow::Result<AppConfig> {
    match &cli.config {
        Some(path) => AppConfig::from_file(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display())),
        None => AppConfig::load().context("Failed to load configuration"),
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = load_config(&cli)?;
    dsacoach::logging::apply_backtrace_setting(&config.logging);

    // Initialize logging
    if cli.verbose {
        dsacoach::logging::init_logging_with_level("debug")?;
    } else {
        dsacoach::logging::init_logging_with_config(Some(&config))?;
    }
    info!("Configuration loaded successfully");

    // Execute the requested command
    match cli.command {
        Commands::Serve { host, port, cors } => {
            handle_serve_api(&config, host, port, cors).await?;
        }
        Commands::Ask {
            question,
            batch,
            stream,
        } => {
            handle_ask(&config, question, batch, stream, cli.verbose).await?;
        }
        Commands::Index {
            paths,
            chunk_size,
            chunk_overlap,
            source,
        } => {
            handle_index(&config, paths, chunk_size, chunk_overlap, source).await?;
        }
        Commands::Config => {
            handle_config_command(&config).await?;
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        print_error(&format!("{e:#}"));
        std::process::exit(1);
    }
}
