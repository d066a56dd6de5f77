//! Export command implementation.
//!
//! Loads a snapshot and writes every selected report.

use anyhow::bail;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use memsnap_exporter::{export_all, load_snapshot, render_document, write_report};

use crate::config::Config;

/// Exports the configured reports for the snapshot at `snapshot_path`.
///
/// With `stdout`, all reports are joined into one document and printed.
/// Otherwise each report goes to its own file; every report is attempted
/// before failures are reported.
pub fn command_export(snapshot_path: &Path, stdout: bool, config: &Config) -> anyhow::Result<()> {
    let snapshot = load_snapshot(snapshot_path)?;
    let specs = config.selected_reports()?;
    let options = config.render_options();

    debug!(
        "Exporting {} reports (titles={}, min_allocated_bytes={}, excluded={})",
        specs.len(),
        options.include_titles,
        options.min_allocated_bytes,
        options.exclude_keys.len()
    );

    if stdout {
        let document = render_document(&snapshot, &specs, &options);
        write_report(&PathBuf::from("-"), &document.render())?;
        return Ok(());
    }

    let out_dir = config.output_dir();
    let summary = export_all(&snapshot, &specs, &out_dir, &options);

    println!("📊 Memory Snapshot Exporter - Export");
    println!("====================================");
    for (name, path) in &summary.written {
        println!("   ✅ {:<24} {}", name, path.display());
    }
    for (name, error) in &summary.failed {
        println!("   ❌ {:<24} {}", name, error);
    }
    println!(
        "\n📋 Total: {} written, {} failed",
        summary.written.len(),
        summary.failed.len()
    );

    if !summary.is_success() {
        let names: Vec<&str> = summary.failed.iter().map(|(n, _)| n.as_str()).collect();
        bail!("{} report(s) failed: {}", names.len(), names.join(", "));
    }

    info!("Export finished into {}", out_dir.display());
    Ok(())
}
