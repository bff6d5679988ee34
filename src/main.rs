// roitool - ROI metadata import and export for image stores
// Copyright (c) 2025 roitool Contributors
// Licensed under the MIT License

use clap::Parser;
use roitool::cli::commands::{exit_code, load, EXIT_CONFIGURATION, EXIT_FATAL};
use roitool::cli::{Cli, Commands};
use roitool::config::{LoggingConfig, RoiToolConfig};
use roitool::log_error_with_context;
use roitool::logging::init_logging;
use std::process;

fn main() {
    // Optional; a missing .env is ignored
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let config = load(cli.config.as_deref());
    let logging_config = config
        .as_ref()
        .map(|config| config.logging.clone())
        .unwrap_or_else(|_| LoggingConfig::default());
    let guard = match init_logging(cli.effective_log_level(), &logging_config) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {e}");
            process::exit(EXIT_CONFIGURATION);
        }
    };

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        "ROI tool {} started",
        env!("CARGO_PKG_VERSION")
    );

    let exit_code = match config {
        Ok(config) => run(&cli, config),
        Err(e) => {
            log_error_with_context!(&e, "Failed to load configuration");
            eprintln!("Error: {e}");
            exit_code(&e)
        }
    };

    drop(guard);
    process::exit(exit_code);
}

fn run(cli: &Cli, config: RoiToolConfig) -> i32 {
    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            tracing::error!(error = %e, "Failed to start async runtime");
            eprintln!("Error: {e}");
            return EXIT_FATAL;
        }
    };

    match runtime.block_on(execute_command(cli, config)) {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(error = %e, "Command execution failed");
            eprintln!("Error: {e}");
            EXIT_FATAL
        }
    }
}

/// Execute the CLI command
async fn execute_command(cli: &Cli, config: RoiToolConfig) -> anyhow::Result<i32> {
    match &cli.command {
        Commands::Import(args) => args.execute(config).await,
        Commands::Export(args) => args.execute(config).await,
    }
}
