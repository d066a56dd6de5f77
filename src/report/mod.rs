//! Aggregation and tabular projection of memory breakdowns.
//!
//! This module provides:
//! - `metric`: Allocated/resident byte pairs and megabyte formatting
//! - `tree`: The breakdown tree and keyed root lookup
//! - `flatten`: Leaf extraction with first-level group labels
//! - `aggregate`: Keyed reductions over leaves, tree nodes and object tables
//! - `render`: CSV rendering with quoting, sorting and section joining
//! - `catalog`: Report kinds, the report catalog and the export pipeline

pub mod aggregate;
pub mod catalog;
pub mod flatten;
pub mod metric;
pub mod render;
pub mod tree;

// Re-export commonly used types
pub use aggregate::{
    aggregate_by_key, aggregate_children, aggregate_raw, aggregate_tree, AggregateRow,
    ObjectRecord, ObjectTable,
};
pub use catalog::{
    build_report, select_reports, CatalogError, GroupBy, RenderOptions, ReportKind, ReportSpec,
    REPORTS,
};
pub use flatten::{flatten, flatten_root, LeafRecord};
pub use metric::{format_megabytes, Metric, BYTES_PER_MB};
pub use render::{push_quoted, Column, Document, Field, SortOrder, Table};
pub use tree::{MemoryTree, TreeNode};
