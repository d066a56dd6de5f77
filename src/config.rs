//! Configuration management for memsnap-exporter.
//!
//! This module handles loading, merging, and validating configuration from files
//! and CLI arguments. It supports YAML, JSON, and TOML formats.

use anyhow::{bail, Context};
use memsnap_exporter::report::{select_reports, RenderOptions, ReportSpec, REPORTS};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::cli::{split_list, Args, ConfigFormat};

// Default configuration constants
pub const DEFAULT_OUTPUT_DIR: &str = ".";
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Exporter configuration. Every field is optional in files; unset fields
/// fall back to the values of `Config::default()`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Directory report files are written to (default: ".")
    #[serde(alias = "output-dir")]
    pub output_dir: Option<PathBuf>,

    /// Report names to export; null exports every catalog report
    pub reports: Option<Vec<String>>,

    /// Write the title line above each table header (default: true)
    #[serde(alias = "include-titles")]
    pub include_titles: Option<bool>,

    /// Rows allocating fewer bytes are dropped (default: 0)
    #[serde(alias = "min-allocated-bytes")]
    pub min_allocated_bytes: Option<u64>,

    /// Row keys (type/category names) that are never exported
    #[serde(alias = "exclude-keys")]
    pub exclude_keys: Option<Vec<String>>,

    // Logging
    #[serde(alias = "log-level")]
    pub log_level: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output_dir: Some(PathBuf::from(DEFAULT_OUTPUT_DIR)),
            reports: None,
            include_titles: Some(true),
            min_allocated_bytes: Some(0),
            exclude_keys: None,
            log_level: Some(DEFAULT_LOG_LEVEL.into()),
        }
    }
}

impl Config {
    pub fn output_dir(&self) -> PathBuf {
        self.output_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR))
    }

    pub fn render_options(&self) -> RenderOptions {
        RenderOptions {
            include_titles: self.include_titles.unwrap_or(true),
            min_allocated_bytes: self.min_allocated_bytes.unwrap_or(0),
            exclude_keys: self.exclude_keys.clone().unwrap_or_default(),
        }
    }

    /// Reports selected by this configuration from the catalog.
    pub fn selected_reports(&self) -> anyhow::Result<Vec<ReportSpec>> {
        Ok(select_reports(&REPORTS, self.reports.as_deref())?)
    }
}

/// Validate effective config (used by --check-config and before exporting)
pub fn validate_effective_config(cfg: &Config) -> anyhow::Result<()> {
    if let Some(names) = &cfg.reports {
        if names.is_empty() {
            bail!("reports is set but empty; remove it to export every report");
        }
    }
    cfg.selected_reports()?;

    let out = cfg.output_dir();
    if out.exists() && !out.is_dir() {
        bail!("output_dir is not a directory: {}", out.display());
    }

    if let Some(level) = cfg.log_level.as_deref() {
        if parse_log_level(level).is_none() {
            bail!(
                "Invalid log_level '{}', expected off, error, warn, info, debug or trace",
                level
            );
        }
    }

    Ok(())
}

/// Parses a log level name from the config file.
pub fn parse_log_level(level: &str) -> Option<tracing::level_filters::LevelFilter> {
    use tracing::level_filters::LevelFilter;
    match level.to_ascii_lowercase().as_str() {
        "off" => Some(LevelFilter::OFF),
        "error" => Some(LevelFilter::ERROR),
        "warn" => Some(LevelFilter::WARN),
        "info" => Some(LevelFilter::INFO),
        "debug" => Some(LevelFilter::DEBUG),
        "trace" => Some(LevelFilter::TRACE),
        _ => None,
    }
}

/// Resolves configuration from CLI args, config file, and defaults.
/// This enforces precedence: CLI (if provided) > config file > default.
pub fn resolve_config(args: &Args) -> anyhow::Result<Config> {
    let mut config = if args.no_config {
        Config::default()
    } else {
        load_config(args.config.as_deref())?
    };

    if let Some(dir) = &args.output_dir {
        config.output_dir = Some(dir.clone());
    }
    if let Some(reports) = &args.reports {
        config.reports = Some(split_list(reports));
    }
    if args.no_titles {
        config.include_titles = Some(false);
    }
    if args.min_allocated_bytes.is_some() {
        config.min_allocated_bytes = args.min_allocated_bytes;
    }
    if let Some(keys) = &args.exclude_keys {
        config.exclude_keys = Some(split_list(keys));
    }

    Ok(config)
}

/// Configuration loading with multiple format support
pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let path = match path {
        Some(p) => {
            if !p.exists() {
                bail!("Config file not found: {}", p.display());
            }
            p.to_path_buf()
        }
        None => {
            // Try default locations
            let defaults = [
                "/etc/memsnap-exporter/config.yaml",
                "/etc/memsnap-exporter/config.yml",
                "/etc/memsnap-exporter/config.json",
                "./memsnap-exporter.yaml",
                "./memsnap-exporter.yml",
                "./memsnap-exporter.json",
            ];

            match defaults.iter().map(Path::new).find(|p| p.exists()) {
                Some(p) => p.to_path_buf(),
                None => return Ok(Config::default()),
            }
        }
    };

    let content = fs::read_to_string(&path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    let config = parse_config(&content, &path)?;
    info!("Loaded configuration from: {}", path.display());
    Ok(config)
}

/// Parses config text, picking the format from the file extension (YAML by default).
fn parse_config(content: &str, path: &Path) -> anyhow::Result<Config> {
    let config = match path.extension().and_then(|s| s.to_str()) {
        Some("json") => serde_json::from_str(content)
            .with_context(|| format!("Invalid JSON config {}", path.display()))?,
        Some("toml") => toml::from_str(content)
            .with_context(|| format!("Invalid TOML config {}", path.display()))?,
        _ => serde_yaml::from_str(content)
            .with_context(|| format!("Invalid YAML config {}", path.display()))?,
    };
    Ok(config)
}

/// Serializes configuration in the requested format.
pub fn render_config(config: &Config, format: ConfigFormat) -> anyhow::Result<String> {
    let output = match format {
        ConfigFormat::Json => serde_json::to_string_pretty(config)?,
        ConfigFormat::Toml => toml::to_string_pretty(config)?,
        ConfigFormat::Yaml => serde_yaml::to_string(config)?,
    };
    Ok(output)
}

/// Shows configuration in requested format
pub fn show_config(config: &Config, format: ConfigFormat) -> anyhow::Result<()> {
    println!("{}", render_config(config, format)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_effective_config(&Config::default()).is_ok());
        let options = Config::default().render_options();
        assert!(options.include_titles);
        assert_eq!(options.min_allocated_bytes, 0);
    }

    #[test]
    fn test_cli_overrides_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(
            &path,
            "output-dir: /tmp/from-file\nmin_allocated_bytes: 1024\ninclude_titles: true\n",
        )
        .unwrap();

        let args = Args::parse_from([
            "memsnap-exporter",
            "-c",
            path.to_str().unwrap(),
            "--no-titles",
            "--output-dir",
            "/tmp/from-cli",
        ]);
        let config = resolve_config(&args).unwrap();

        assert_eq!(config.output_dir(), PathBuf::from("/tmp/from-cli"));
        assert_eq!(config.include_titles, Some(false));
        assert_eq!(config.min_allocated_bytes, Some(1024));
    }

    #[test]
    fn test_parse_json_and_toml() {
        let json = parse_config(
            r#"{"reports": ["graphics"], "exclude_keys": ["Untracked"]}"#,
            Path::new("c.json"),
        )
        .unwrap();
        assert_eq!(json.reports, Some(vec!["graphics".to_string()]));
        assert_eq!(json.render_options().exclude_keys, vec!["Untracked"]);

        let from_toml = parse_config("min_allocated_bytes = 42\n", Path::new("c.toml")).unwrap();
        assert_eq!(from_toml.min_allocated_bytes, Some(42));
        assert!(from_toml.include_titles.is_none());
        assert!(from_toml.render_options().include_titles);
    }

    #[test]
    fn test_validate_rejects_unknown_report_and_bad_level() {
        let config = Config {
            reports: Some(vec!["does-not-exist".into()]),
            ..Config::default()
        };
        assert!(validate_effective_config(&config).is_err());

        let config = Config {
            log_level: Some("loud".into()),
            ..Config::default()
        };
        assert!(validate_effective_config(&config).is_err());

        let config = Config {
            reports: Some(Vec::new()),
            ..Config::default()
        };
        assert!(validate_effective_config(&config).is_err());
    }

    #[test]
    fn test_missing_explicit_config_is_an_error() {
        assert!(load_config(Some(Path::new("/nonexistent/memsnap.yaml"))).is_err());
    }

    #[test]
    fn test_render_config_round_trips_through_yaml() {
        let yaml = render_config(&Config::default(), ConfigFormat::Yaml).unwrap();
        let parsed: Config = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed.output_dir(), PathBuf::from("."));
    }
}
