//! CLI command implementations for memsnap-exporter.
//!
//! This module provides implementations for all CLI subcommands:
//! - `export`: Report export from a snapshot file
//! - `reports`: Report catalog listing
//! - `config`: Configuration file generation
//! - `generate`: Synthetic snapshot generation

pub mod config;
pub mod export;
pub mod generate;
pub mod reports;

// Re-export command functions
pub use config::command_config;
pub use export::command_export;
pub use generate::command_generate_testdata;
pub use reports::command_reports;
