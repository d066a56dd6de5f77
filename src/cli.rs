//! CLI arguments and subcommands for memsnap-exporter.
//!
//! This module defines the command-line interface structure using the clap library,
//! including all flags, options, and subcommands.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Log level options for CLI parsing
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Configuration format options for output
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ConfigFormat {
    Yaml,
    Json,
    Toml,
}

/// Main CLI arguments structure
#[derive(Parser, Debug)]
#[command(
    name = "memsnap-exporter",
    about = "Export memory snapshot breakdowns to CSV",
    long_about = "Export memory snapshot breakdowns to CSV.\n\n\
                  Reads a memory snapshot (managed object table and hierarchical memory \
                  breakdown) and writes per-type, per-category and per-object reports as \
                  flat comma-separated files for spreadsheets and diffing.",
    version = "0.1.0",
    propagate_version = true
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Log level (overrides config file)
    #[arg(long, value_enum)]
    pub log_level: Option<LogLevel>,

    /// Config file (YAML/JSON/TOML)
    #[arg(short = 'c', long)]
    pub config: Option<PathBuf>,

    /// Disable all config file loading
    #[arg(long)]
    pub no_config: bool,

    /// Print effective merged config and exit
    #[arg(long)]
    pub show_config: bool,

    /// Output format for --show-config
    #[arg(long, value_enum, default_value = "yaml")]
    pub config_format: ConfigFormat,

    /// Validate config and exit (return code 1 on error)
    #[arg(long)]
    pub check_config: bool,

    /// Directory the report files are written to
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// Reports to export (comma-separated names, default: all)
    #[arg(short = 'r', long)]
    pub reports: Option<String>,

    /// Omit the title line above each table header
    #[arg(long)]
    pub no_titles: bool,

    /// Drop rows allocating fewer bytes than this
    #[arg(long)]
    pub min_allocated_bytes: Option<u64>,

    /// Drop rows with these keys (comma-separated type/category names)
    #[arg(long)]
    pub exclude_keys: Option<String>,
}

/// Subcommands for additional functionality
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Export reports from a snapshot file
    Export {
        /// Snapshot JSON file
        snapshot: PathBuf,

        /// Print all reports to stdout as one document instead of writing files
        #[arg(long)]
        stdout: bool,
    },

    /// List available reports
    Reports {
        /// Show report definitions in detail
        #[arg(long)]
        verbose: bool,
    },

    /// Generate configuration files
    Config {
        /// Output file path ("-" for stdout)
        #[arg(short = 'o', long)]
        output: Option<PathBuf>,

        /// Output format
        #[arg(long, value_enum, default_value = "yaml")]
        format: ConfigFormat,

        /// Include comments and examples
        #[arg(long)]
        commented: bool,
    },

    /// Generate a synthetic snapshot JSON file
    GenerateTestdata {
        /// Output file path
        #[arg(short = 'o', long, default_value = "snapshot.json")]
        output: PathBuf,

        /// Number of objects generated per managed type
        #[arg(long, default_value_t = 20)]
        objects_per_type: usize,

        /// Number of invalid object records mixed into the object table
        #[arg(long, default_value_t = 5)]
        invalid_count: usize,
    },
}

/// Splits a comma-separated CLI list, dropping empty entries.
pub fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
