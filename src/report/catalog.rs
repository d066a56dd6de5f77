//! Report kinds and the catalog of configured exports.
//!
//! A report is a configuration value (kind, root selector, grouping key,
//! output file) and every report runs through the same pipeline in
//! [`build_report`]: select input, flatten/aggregate, filter, sort, render.

use ahash::AHashSet as HashSet;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

use super::aggregate::{
    aggregate_by_key, aggregate_children, aggregate_raw, aggregate_tree, AggregateRow,
};
use super::flatten::{flatten_root, LeafRecord};
use super::render::{Column, Field, SortOrder, Table};
use crate::snapshot::Snapshot;

/// What a report is computed from and what shape it has.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportKind {
    /// `Type,Count,TotalSize(Mb)` over the raw object table.
    ObjectTypeTotals,
    /// `Category,Allocated(MB),Resident(MB)`, one row per top-level category.
    CategoryBreakdown,
    /// `NameOfObject,Type,Allocated(MB),Resident(MB)`, one row per leaf.
    ItemListing,
    /// Leaves of a root grouped by [`GroupBy`].
    GroupTotals,
    /// One row per immediate child of a root.
    ChildTotals,
}

impl ReportKind {
    pub fn needs_root(self) -> bool {
        matches!(
            self,
            ReportKind::ItemListing | ReportKind::GroupTotals | ReportKind::ChildTotals
        )
    }
}

/// Grouping key for [`ReportKind::GroupTotals`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupBy {
    /// First-level group below the root (the item's type).
    #[default]
    Group,
    /// The item's own name.
    Name,
    /// The label attached by the model builder; unlabelled items share "".
    Label,
}

impl GroupBy {
    pub fn key<'a>(self, record: &LeafRecord<'a>) -> &'a str {
        match self {
            GroupBy::Group => record.group_label,
            GroupBy::Name => record.name,
            GroupBy::Label => record.label.unwrap_or(""),
        }
    }

    fn header(self) -> &'static str {
        match self {
            GroupBy::Group => "Type",
            GroupBy::Name => "Name",
            GroupBy::Label => "Label",
        }
    }
}

/// One configured export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportSpec {
    pub name: String,
    pub kind: ReportKind,
    /// Top-level breakdown category to read from (tree-based kinds only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_by: Option<GroupBy>,
    /// Free-text line written above the header.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Row order by allocated size (default: descending).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<SortOrder>,
    pub file_name: String,
}

impl ReportSpec {
    pub fn validate(&self) -> Result<(), CatalogError> {
        if self.name.trim().is_empty() {
            return Err(CatalogError::EmptyName);
        }
        if self.file_name.trim().is_empty() {
            return Err(CatalogError::EmptyFileName(self.name.clone()));
        }
        if self.kind.needs_root() && self.root.as_deref().map_or(true, |r| r.is_empty()) {
            return Err(CatalogError::MissingRoot(self.name.clone()));
        }
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Report without a name")]
    EmptyName,

    #[error("Report '{0}' has an empty file_name")]
    EmptyFileName(String),

    #[error("Report '{0}' needs a root category")]
    MissingRoot(String),

    #[error("Unknown report '{0}'")]
    UnknownReport(String),

    #[error("Reports '{0}' and '{1}' write the same file '{2}'")]
    DuplicateFileName(String, String, String),
}

/// Filters applied to every report before sorting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOptions {
    /// Write the report title above the header (default: true).
    pub include_titles: bool,
    /// Drop rows allocating fewer bytes than this (default: 0, keep all).
    pub min_allocated_bytes: u64,
    /// Drop rows whose key (type, category or item type) is listed here.
    pub exclude_keys: Vec<String>,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            include_titles: true,
            min_allocated_bytes: 0,
            exclude_keys: Vec::new(),
        }
    }
}

/// Root structure of a report catalog file.
#[derive(Deserialize)]
struct CatalogFile {
    reports: Vec<ReportSpec>,
}

/// Helper: merge reports from a TOML string, replacing entries by name.
///
/// Returns the number of problems logged for `origin` (unparsable file or
/// rejected entries).
fn load_reports_from_str(content: &str, origin: &str, reports: &mut Vec<ReportSpec>) -> usize {
    let parsed: CatalogFile = match toml::from_str(content) {
        Ok(c) => c,
        Err(e) => {
            warn!("Failed to parse report catalog {}: {}", origin, e);
            return 1;
        }
    };

    let mut problems = 0;
    for spec in parsed.reports {
        if let Err(e) = spec.validate() {
            warn!("Ignoring report definition in {}: {}", origin, e);
            problems += 1;
            continue;
        }
        match reports.iter_mut().find(|r| r.name == spec.name) {
            Some(existing) => *existing = spec,
            None => reports.push(spec),
        }
    }
    problems
}

/// Helper: merge reports from a TOML file path (if exists).
fn load_reports_from_file(path: &str, reports: &mut Vec<ReportSpec>) {
    let p = Path::new(path);
    if !p.exists() {
        return;
    }
    match fs::read_to_string(p) {
        Ok(content) => {
            if load_reports_from_str(&content, path, reports) == 0 {
                info!("Loaded additional reports from {}", path);
            }
        }
        Err(e) => {
            warn!("Failed to read report catalog {}: {}", path, e);
        }
    }
}

/// Report catalog: built-in definitions plus optional local overrides.
pub static REPORTS: Lazy<Vec<ReportSpec>> = Lazy::new(|| {
    let mut reports = Vec::new();

    // 1) built-in reports from embedded file
    load_reports_from_str(include_str!("../../data/reports.toml"), "built-in", &mut reports);

    // 2) optional system-wide reports
    load_reports_from_file("/etc/memsnap-exporter/reports.toml", &mut reports);

    // 3) optional reports in current working directory
    load_reports_from_file("./reports.toml", &mut reports);

    reports
});

/// Picks reports from `catalog` by name, or all of them when `names` is `None`.
pub fn select_reports(
    catalog: &[ReportSpec],
    names: Option<&[String]>,
) -> Result<Vec<ReportSpec>, CatalogError> {
    let selected = match names {
        None => catalog.to_vec(),
        Some(names) => names
            .iter()
            .map(|name| {
                catalog
                    .iter()
                    .find(|r| &r.name == name)
                    .cloned()
                    .ok_or_else(|| CatalogError::UnknownReport(name.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?,
    };

    let mut seen: Vec<(&str, &str)> = Vec::new();
    for spec in &selected {
        if let Some((other, _)) = seen.iter().find(|(_, file)| *file == spec.file_name) {
            return Err(CatalogError::DuplicateFileName(
                (*other).to_string(),
                spec.name.clone(),
                spec.file_name.clone(),
            ));
        }
        seen.push((&spec.name, &spec.file_name));
    }

    Ok(selected)
}

fn key_field(row: &AggregateRow) -> Field<'_> {
    Field::Text(&row.key)
}

fn count_field(row: &AggregateRow) -> Field<'_> {
    Field::Count(row.count)
}

fn allocated_field(row: &AggregateRow) -> Field<'_> {
    Field::Megabytes(Some(row.metric.allocated))
}

fn resident_field(row: &AggregateRow) -> Field<'_> {
    Field::Megabytes(row.metric.resident)
}

fn item_name_field<'r>(record: &'r LeafRecord<'_>) -> Field<'r> {
    Field::Text(record.name)
}

fn item_type_field<'r>(record: &'r LeafRecord<'_>) -> Field<'r> {
    Field::Text(record.group_label)
}

fn item_allocated_field<'r>(record: &'r LeafRecord<'_>) -> Field<'r> {
    Field::Megabytes(Some(record.metric.allocated))
}

fn item_resident_field<'r>(record: &'r LeafRecord<'_>) -> Field<'r> {
    Field::Megabytes(record.metric.resident)
}

fn type_total_columns() -> Vec<Column<AggregateRow>> {
    vec![
        Column::new("Type", key_field),
        Column::new("Count", count_field),
        Column::new("TotalSize(Mb)", allocated_field),
    ]
}

fn category_columns() -> Vec<Column<AggregateRow>> {
    vec![
        Column::new("Category", key_field),
        Column::new("Allocated(MB)", allocated_field),
        Column::new("Resident(MB)", resident_field),
    ]
}

fn keyed_columns(key_header: &'static str) -> Vec<Column<AggregateRow>> {
    vec![
        Column::new(key_header, key_field),
        Column::new("Count", count_field),
        Column::new("Allocated(MB)", allocated_field),
        Column::new("Resident(MB)", resident_field),
    ]
}

fn item_columns<'a>() -> Vec<Column<LeafRecord<'a>>> {
    vec![
        Column::new("NameOfObject", item_name_field),
        Column::new("Type", item_type_field),
        Column::new("Allocated(MB)", item_allocated_field),
        Column::new("Resident(MB)", item_resident_field),
    ]
}

fn title_of(spec: &ReportSpec, options: &RenderOptions) -> Option<String> {
    if options.include_titles {
        spec.title.clone()
    } else {
        None
    }
}

/// Runs one report over `snapshot` and returns the complete CSV text.
///
/// Missing inputs (no object table, absent root category) produce a
/// header-only table.
pub fn build_report(spec: &ReportSpec, snapshot: &Snapshot, options: &RenderOptions) -> String {
    let order = spec.order.unwrap_or_default();
    let root = spec.root.as_deref().unwrap_or("");
    let excluded: HashSet<&str> = options.exclude_keys.iter().map(String::as_str).collect();
    let min_bytes = options.min_allocated_bytes;

    if spec.kind.needs_root() && snapshot.breakdown.root(root).is_none() {
        info!(
            "Report '{}': category '{}' not present in snapshot, writing header only",
            spec.name, root
        );
    }

    match spec.kind {
        ReportKind::ItemListing => {
            let records = flatten_root(&snapshot.breakdown, root);
            let table = Table::new(item_columns(), records)
                .with_title(title_of(spec, options))
                .retain(|r| r.metric.allocated >= min_bytes && !excluded.contains(r.group_label))
                .sorted_by(|r| r.metric.allocated, order);
            debug!("Report '{}': {} rows", spec.name, table.rows().len());
            table.render()
        }
        ReportKind::ObjectTypeTotals => render_aggregate(
            spec,
            options,
            type_total_columns(),
            aggregate_raw(&snapshot.objects),
        ),
        ReportKind::CategoryBreakdown => render_aggregate(
            spec,
            options,
            category_columns(),
            aggregate_children(snapshot.breakdown.roots()),
        ),
        ReportKind::GroupTotals => {
            let group_by = spec.group_by.unwrap_or_default();
            let records = flatten_root(&snapshot.breakdown, root);
            let rows = aggregate_by_key(&records, |r| group_by.key(r));
            render_aggregate(spec, options, keyed_columns(group_by.header()), rows)
        }
        ReportKind::ChildTotals => {
            let rows = snapshot
                .breakdown
                .root(root)
                .map(aggregate_tree)
                .unwrap_or_default();
            render_aggregate(spec, options, keyed_columns("Type"), rows)
        }
    }
}

/// Filters, sorts and renders aggregate rows of one report.
fn render_aggregate(
    spec: &ReportSpec,
    options: &RenderOptions,
    columns: Vec<Column<AggregateRow>>,
    rows: Vec<AggregateRow>,
) -> String {
    let excluded: HashSet<&str> = options.exclude_keys.iter().map(String::as_str).collect();
    let min_bytes = options.min_allocated_bytes;

    let inconsistent = rows.iter().filter(|r| r.metric.is_inconsistent()).count();
    if inconsistent > 0 {
        warn!(
            "Report '{}': {} rows report more resident than allocated memory",
            spec.name, inconsistent
        );
    }

    let table = Table::new(columns, rows)
        .with_title(title_of(spec, options))
        .retain(|r| r.metric.allocated >= min_bytes && !excluded.contains(r.key.as_str()))
        .sorted_by(|r| r.metric.allocated, spec.order.unwrap_or_default());
    debug!("Report '{}': {} rows", spec.name, table.rows().len());
    table.render()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(kind: ReportKind, root: Option<&str>) -> ReportSpec {
        ReportSpec {
            name: "test".into(),
            kind,
            root: root.map(String::from),
            group_by: None,
            title: None,
            order: None,
            file_name: "test.csv".into(),
        }
    }

    #[test]
    fn test_builtin_catalog_is_valid() {
        let mut reports = Vec::new();
        let problems =
            load_reports_from_str(include_str!("../../data/reports.toml"), "built-in", &mut reports);

        assert_eq!(problems, 0);
        assert!(reports.len() >= 5);
        assert!(reports.iter().all(|r| r.validate().is_ok()));
        assert!(select_reports(&reports, None).is_ok());
        assert_eq!(reports[0].kind, ReportKind::ObjectTypeTotals);
    }

    #[test]
    fn test_catalog_override_replaces_by_name() {
        let mut reports = Vec::new();
        load_reports_from_str(include_str!("../../data/reports.toml"), "built-in", &mut reports);
        let before = reports.len();

        load_reports_from_str(
            r#"
            [[reports]]
            name = "graphics"
            kind = "child_totals"
            root = "Graphics"
            file_name = "GraphicsByType.csv"
            "#,
            "override",
            &mut reports,
        );

        assert_eq!(reports.len(), before);
        let graphics = reports.iter().find(|r| r.name == "graphics").unwrap();
        assert_eq!(graphics.kind, ReportKind::ChildTotals);
        assert_eq!(graphics.file_name, "GraphicsByType.csv");
    }

    #[test]
    fn test_invalid_definitions_are_skipped() {
        let mut reports = Vec::new();
        let problems = load_reports_from_str(
            r#"
            [[reports]]
            name = "no-root"
            kind = "item_listing"
            file_name = "x.csv"
            "#,
            "local",
            &mut reports,
        );
        assert_eq!(problems, 1);
        assert_eq!(load_reports_from_str("reports = [broken", "local", &mut reports), 1);
        assert!(reports.is_empty());
    }

    #[test]
    fn test_validate() {
        assert!(spec(ReportKind::ObjectTypeTotals, None).validate().is_ok());
        assert!(matches!(
            spec(ReportKind::ChildTotals, None).validate(),
            Err(CatalogError::MissingRoot(_))
        ));
        assert!(matches!(
            spec(ReportKind::GroupTotals, Some("")).validate(),
            Err(CatalogError::MissingRoot(_))
        ));
        let mut s = spec(ReportKind::CategoryBreakdown, None);
        s.file_name = " ".into();
        assert!(matches!(s.validate(), Err(CatalogError::EmptyFileName(_))));
    }

    #[test]
    fn test_select_reports() {
        let mut a = spec(ReportKind::ObjectTypeTotals, None);
        a.name = "a".into();
        a.file_name = "a.csv".into();
        let mut b = spec(ReportKind::CategoryBreakdown, None);
        b.name = "b".into();
        b.file_name = "b.csv".into();
        let catalog = vec![a, b];

        let picked = select_reports(&catalog, Some(&["b".to_string()])).unwrap();
        assert_eq!(picked.len(), 1);
        assert_eq!(picked[0].name, "b");

        assert!(matches!(
            select_reports(&catalog, Some(&["zzz".to_string()])),
            Err(CatalogError::UnknownReport(_))
        ));
    }

    #[test]
    fn test_select_reports_rejects_shared_file() {
        let catalog = vec![
            spec(ReportKind::ObjectTypeTotals, None),
            ReportSpec {
                name: "other".into(),
                ..spec(ReportKind::CategoryBreakdown, None)
            },
        ];
        assert!(matches!(
            select_reports(&catalog, None),
            Err(CatalogError::DuplicateFileName(..))
        ));
    }

    #[test]
    fn test_child_totals_header_ignores_group_by() {
        let mut child_totals = spec(ReportKind::ChildTotals, Some("Managed"));
        child_totals.group_by = Some(GroupBy::Name);
        let mut group_totals = spec(ReportKind::GroupTotals, Some("Managed"));
        group_totals.group_by = Some(GroupBy::Name);
        let snapshot = Snapshot::default();
        let options = RenderOptions::default();

        assert_eq!(
            build_report(&child_totals, &snapshot, &options),
            "Type,Count,Allocated(MB),Resident(MB)\n"
        );
        assert_eq!(
            build_report(&group_totals, &snapshot, &options),
            "Name,Count,Allocated(MB),Resident(MB)\n"
        );
    }

    #[test]
    fn test_group_by_keys() {
        let record = LeafRecord {
            name: "Cube",
            group_label: "Mesh",
            label: None,
            metric: crate::report::Metric::allocated_only(1),
        };
        assert_eq!(GroupBy::Group.key(&record), "Mesh");
        assert_eq!(GroupBy::Name.key(&record), "Cube");
        assert_eq!(GroupBy::Label.key(&record), "");
    }
}
