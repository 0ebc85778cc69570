//! Firestore Tools
//!
//! Command-line tools for walking a Firestore database, plus a handful of
//! terminal UI demos.

use anyhow::Result;
use clap::Parser;
use firestore_tools::cli::{
    generate_completion, handle_clear, handle_color, handle_config, handle_copy_file,
    handle_menu, handle_pager, handle_pause, handle_progress, handle_read, handle_write, Cli,
    Commands, OutputFormat,
};
use firestore_tools::config::{CliConfig, ConfigBuilder};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    eprintln!("Firestore Tools");

    let config_path = CliConfig::config_path(cli.config.as_deref());

    // Build configuration using priority chain: defaults → file → env → CLI args
    let config = match build_config(&cli, &config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: Configuration error: {:#}", e);
            if cli.verbose {
                eprintln!("Error details: {:?}", e);
            }
            std::process::exit(1);
        }
    };

    let verbose = config.verbose;
    init_tracing(verbose);
    tracing::debug!(path = %config_path.display(), no_config = cli.no_config, "Configuration loaded");

    let output_format: OutputFormat =
        firestore_tools::format::OutputFormat::from_config(&config.output_format).into();

    // Execute commands
    let result = match cli.command {
        Commands::Read {
            cred,
            output,
            max_depth,
            path,
        } => handle_read(cred, &output, max_depth, &path, &config, &output_format).await,
        Commands::Write { cred, data } => handle_write(&cred, &data),
        Commands::CopyFile { inputs, output } => handle_copy_file(&inputs, &output),
        Commands::Color => handle_color(),
        Commands::Pager => handle_pager(&config),
        Commands::Progress { count } => handle_progress(count).await,
        Commands::Clear => handle_clear(),
        Commands::Pause => handle_pause(),
        Commands::Menu => handle_menu(),
        Commands::Config { command } => {
            handle_config(command, &config, &config_path, &output_format)
        }
        Commands::Completion { shell } => {
            generate_completion(shell);
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        if verbose {
            eprintln!("Error details: {:?}", e);
        }
        std::process::exit(1);
    }
}

fn build_config(cli: &Cli, config_path: &std::path::Path) -> Result<CliConfig> {
    // Env and file only fill unset values, so apply them highest first
    let mut builder = ConfigBuilder::new().with_env_overrides();

    if !cli.no_config {
        builder = builder.with_config_file(config_path)?;
    }

    // Apply CLI argument overrides (highest priority)
    if let Some(format) = cli.format {
        builder = builder.with_output_format(format.as_str())?;
    }
    if cli.verbose {
        builder = builder.with_verbose(true);
    }
    if let Some(ref project) = cli.project {
        builder = builder.with_project(project);
    }
    if let Some(ref host) = cli.emulator_host {
        builder = builder.with_emulator_host(host);
    }
    if let Some(timeout) = cli.timeout {
        builder = builder.with_timeout(timeout)?;
    }

    builder.build()
}

/// Initialize tracing subscriber for logging
///
/// Logs go to stderr so stdout carries only command output.
fn init_tracing(verbose: bool) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = if verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
