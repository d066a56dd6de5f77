//! memsnap-exporter - version 0.1.0
//!
//! Memory snapshot CSV exporter with tracing logging.
//! This is the main entry point that resolves configuration and dispatches subcommands.

mod cli;
mod commands;
mod config;

use clap::{CommandFactory, Parser};
use tracing::info;
use tracing::level_filters::LevelFilter;

use cli::{Args, Commands, LogLevel};
use commands::{command_config, command_export, command_generate_testdata, command_reports};
use config::{parse_log_level, resolve_config, show_config, validate_effective_config, Config};

/// Initializes tracing logging subsystem with configured log level.
///
/// Logs go to stderr so that `export --stdout` output stays clean.
fn setup_logging(config: &Config, args: &Args) {
    let log_level = match args.log_level {
        Some(LogLevel::Off) => LevelFilter::OFF,
        Some(LogLevel::Error) => LevelFilter::ERROR,
        Some(LogLevel::Warn) => LevelFilter::WARN,
        Some(LogLevel::Info) => LevelFilter::INFO,
        Some(LogLevel::Debug) => LevelFilter::DEBUG,
        Some(LogLevel::Trace) => LevelFilter::TRACE,
        None => config
            .log_level
            .as_deref()
            .and_then(parse_log_level)
            .unwrap_or(LevelFilter::INFO),
    };

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");

    info!("Logging initialized with level: {}", log_level);
}

/// Helper function to validate the effective configuration.
/// Exits the process with error code 1 if validation fails.
fn exit_if_invalid(config: &Config) {
    if let Err(e) = validate_effective_config(config) {
        eprintln!("❌ Configuration invalid: {:#}", e);
        std::process::exit(1);
    }
}

/// Main application entry point.
fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Config generation reads neither the user configuration nor the report catalog
    if let Some(Commands::Config {
        output,
        format,
        commented,
    }) = &args.command
    {
        return command_config(output.clone(), *format, *commented);
    }

    let config = resolve_config(&args)?;

    // Must run before the report catalog is first used
    setup_logging(&config, &args);

    if args.check_config {
        exit_if_invalid(&config);
        println!("✅ Configuration is valid");
        return Ok(());
    }
    if args.show_config {
        return show_config(&config, args.config_format);
    }

    let Some(command) = &args.command else {
        Args::command().print_help()?;
        return Ok(());
    };

    match command {
        Commands::Export { snapshot, stdout } => {
            exit_if_invalid(&config);
            command_export(snapshot, *stdout, &config)
        }

        Commands::Reports { verbose } => command_reports(*verbose),

        Commands::GenerateTestdata {
            output,
            objects_per_type,
            invalid_count,
        } => command_generate_testdata(output.clone(), *objects_per_type, *invalid_count),

        Commands::Config { .. } => unreachable!("Config handled above"),
    }
}
