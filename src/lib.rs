//! Memory Snapshot Exporter Library
//!
//! This library turns memory breakdown data captured by a memory profiler
//! into flat CSV reports. It is independent of how the snapshot was
//! captured: callers hand over an object table and/or a breakdown tree and
//! get back deterministic delimited text.
//!
//! # Features
//!
//! - **Keyed aggregation**: Per-type, per-category and per-object totals with exact byte sums
//! - **Inconsistent trees**: Rolled-up category sizes are used when no members are modeled
//! - **Deterministic output**: Stable sorting, fixed three-decimal megabytes, proper quoting
//! - **Isolated exports**: One failing report never stops the others
//!
//! # Usage
//!
//! ```rust
//! use memsnap_exporter::report::{build_report, Metric, RenderOptions, ReportKind, ReportSpec, TreeNode};
//! use memsnap_exporter::Snapshot;
//!
//! let mut snapshot = Snapshot::default();
//! snapshot.breakdown = vec![
//!     TreeNode::leaf("Graphics", Metric::allocated_only(1_572_864)),
//! ]
//! .into();
//!
//! let spec = ReportSpec {
//!     name: "categories".into(),
//!     kind: ReportKind::CategoryBreakdown,
//!     root: None,
//!     group_by: None,
//!     title: None,
//!     order: None,
//!     file_name: "MemoryCategories.csv".into(),
//! };
//!
//! let csv = build_report(&spec, &snapshot, &RenderOptions::default());
//! assert_eq!(csv, "Category,Allocated(MB),Resident(MB)\n\"Graphics\",1.500 MB,\n");
//! ```

pub mod export;
pub mod report;
pub mod snapshot;

// Re-export main types for convenience
pub use export::{export_all, render_document, write_report, ExportError, ExportSummary};
pub use snapshot::{load_snapshot, parse_snapshot, Snapshot, SnapshotError};
