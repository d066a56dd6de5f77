//! Writing rendered reports to disk.
//!
//! Reports are rendered completely in memory before any file is touched.
//! Each file is written to a temporary sibling and then moved over the
//! destination, so a failed export leaves either the previous file or
//! nothing, never a truncated table.

use std::fs::{self, Permissions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, error, info};

use crate::report::{build_report, Document, RenderOptions, ReportSpec};
use crate::snapshot::Snapshot;

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("Cannot write {path}: {source}")]
    DestinationUnwritable { path: PathBuf, source: io::Error },
}

/// Permissions for a report file that does not exist yet.
#[cfg(unix)]
fn new_file_permissions() -> Option<Permissions> {
    use std::os::unix::fs::PermissionsExt;
    Some(Permissions::from_mode(0o644))
}

#[cfg(not(unix))]
fn new_file_permissions() -> Option<Permissions> {
    None
}

/// Replaces the file at `path` with `text`.
///
/// A replaced file keeps its permissions; a new file is created readable
/// by everyone, subject to the process umask. A path of `-` writes to
/// stdout instead.
pub fn write_report(path: &Path, text: &str) -> Result<(), ExportError> {
    let unwritable = |source: io::Error| ExportError::DestinationUnwritable {
        path: path.to_path_buf(),
        source,
    };

    if path.as_os_str() == "-" {
        let mut stdout = io::stdout().lock();
        stdout.write_all(text.as_bytes()).map_err(unwritable)?;
        return stdout.flush().map_err(unwritable);
    }

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir).map_err(unwritable)?;

    let existing = fs::metadata(path).ok().map(|meta| meta.permissions());
    let mut builder = tempfile::Builder::new();
    builder.prefix(".memsnap-").suffix(".tmp");
    if existing.is_none() {
        if let Some(permissions) = new_file_permissions() {
            builder.permissions(permissions);
        }
    }
    let mut tmp = builder.tempfile_in(dir).map_err(unwritable)?;
    if let Some(permissions) = existing {
        tmp.as_file()
            .set_permissions(permissions)
            .map_err(unwritable)?;
    }
    tmp.write_all(text.as_bytes()).map_err(unwritable)?;
    tmp.flush().map_err(unwritable)?;
    tmp.persist(path).map_err(|e| unwritable(e.error))?;

    debug!("Wrote {} bytes to {}", text.len(), path.display());
    Ok(())
}

/// Outcome of a multi-report export.
#[derive(Debug, Default)]
pub struct ExportSummary {
    pub written: Vec<(String, PathBuf)>,
    pub failed: Vec<(String, ExportError)>,
}

impl ExportSummary {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Exports every report in `specs` into `out_dir`.
///
/// Reports run one after another and independently; a failing report is
/// recorded and the remaining ones still run.
pub fn export_all(
    snapshot: &Snapshot,
    specs: &[ReportSpec],
    out_dir: &Path,
    options: &RenderOptions,
) -> ExportSummary {
    let mut summary = ExportSummary::default();

    for spec in specs {
        let start = Instant::now();
        let path = out_dir.join(&spec.file_name);
        let text = build_report(spec, snapshot, options);

        match write_report(&path, &text) {
            Ok(()) => {
                info!(
                    "Exported '{}' to {} in {:.2}ms",
                    spec.name,
                    path.display(),
                    start.elapsed().as_secs_f64() * 1000.0
                );
                summary.written.push((spec.name.clone(), path));
            }
            Err(e) => {
                error!("Export '{}' failed: {}", spec.name, e);
                summary.failed.push((spec.name.clone(), e));
            }
        }
    }

    summary
}

/// Renders every report in `specs` into one [`Document`], in order.
pub fn render_document(
    snapshot: &Snapshot,
    specs: &[ReportSpec],
    options: &RenderOptions,
) -> Document {
    let mut document = Document::new();
    for spec in specs {
        document.push(build_report(spec, snapshot, options));
    }
    document
}
