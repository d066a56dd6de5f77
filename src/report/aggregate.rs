//! Reduction of leaf records, breakdown nodes and raw object tables into
//! keyed aggregate rows.
//!
//! Every reduction here is permissive: missing names, absent roots and
//! out-of-range indices degrade to empty keys or zero rows instead of errors.

use ahash::AHashMap as HashMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::flatten::LeafRecord;
use super::metric::Metric;
use super::tree::TreeNode;

/// One output row: a key with its summed metric and member count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregateRow {
    pub key: String,
    pub metric: Metric,
    pub count: u64,
}

impl AggregateRow {
    fn new(key: String) -> Self {
        Self {
            key,
            metric: Metric::ZERO,
            count: 0,
        }
    }
}

/// Insertion-ordered key → row accumulator.
///
/// Rows come out in first-seen order so that stable sorting downstream
/// yields identical output for identical input.
#[derive(Default)]
struct Accumulator {
    index: HashMap<String, usize>,
    rows: Vec<AggregateRow>,
}

impl Accumulator {
    fn add(&mut self, key: &str, metric: Metric) {
        let position = match self.index.get(key) {
            Some(&position) => position,
            None => {
                self.rows.push(AggregateRow::new(key.to_owned()));
                self.index.insert(key.to_owned(), self.rows.len() - 1);
                self.rows.len() - 1
            }
        };
        let row = &mut self.rows[position];
        row.metric += metric;
        row.count += 1;
    }

    fn into_rows(self) -> Vec<AggregateRow> {
        self.rows
    }
}

/// Groups records by `key_of` and sums each group.
///
/// Keys compare by exact byte equality.
pub fn aggregate_by_key<'a, F>(records: &[LeafRecord<'a>], key_of: F) -> Vec<AggregateRow>
where
    F: Fn(&LeafRecord<'a>) -> &'a str,
{
    let mut acc = Accumulator::default();
    for record in records {
        acc.add(key_of(record), record.metric);
    }
    acc.into_rows()
}

/// One row per immediate child of `node`.
pub fn aggregate_tree(node: &TreeNode) -> Vec<AggregateRow> {
    aggregate_children(&node.children)
}

/// One row per node in `nodes`, summing the allocated leaves beneath each.
///
/// When nothing below a node carried an allocation but the node itself
/// does, the node's own metric is used with a count of zero. The two sources
/// are never combined.
pub fn aggregate_children(nodes: &[TreeNode]) -> Vec<AggregateRow> {
    nodes
        .iter()
        .map(|node| {
            let leaves = sum_leaves(node);
            let mut resident_only = leaves.resident_only;
            let metric = if leaves.count == 0 && node.metric.has_allocation() {
                debug!(
                    "Using rolled-up size of '{}' ({} bytes), no members modeled",
                    node.name, node.metric.allocated
                );
                node.metric
            } else {
                if leaves.count == 0 && node.metric.is_resident_only() {
                    resident_only += 1;
                }
                leaves.metric
            };
            if resident_only > 0 {
                warn!(
                    "'{}': {} items report resident memory without allocation and are not counted",
                    node.name, resident_only
                );
            }
            AggregateRow {
                key: node.name.clone(),
                metric,
                count: leaves.count,
            }
        })
        .collect()
}

/// Totals over the structural leaves strictly below a node.
#[derive(Debug, PartialEq, Eq)]
struct LeafTotals {
    metric: Metric,
    count: u64,
    /// Leaves with resident bytes but no allocation, left out of `metric`.
    resident_only: usize,
}

/// Sums the structural leaves strictly below `node` that carry an allocation.
fn sum_leaves(node: &TreeNode) -> LeafTotals {
    let mut totals = LeafTotals {
        metric: Metric::ZERO,
        count: 0,
        resident_only: 0,
    };
    let mut stack: Vec<&TreeNode> = node.children.iter().collect();

    while let Some(current) = stack.pop() {
        if current.is_structural_leaf() {
            if current.metric.has_allocation() {
                totals.metric += current.metric;
                totals.count += 1;
            } else if current.metric.is_resident_only() {
                totals.resident_only += 1;
            }
        } else {
            stack.extend(current.children.iter());
        }
    }

    totals
}

/// One entry of the raw managed object table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectRecord {
    /// Index into the type name table; negative means unresolved.
    pub type_index: i64,
    /// Object address; zero marks an invalid entry.
    pub address: u64,
    pub size: u64,
}

impl ObjectRecord {
    pub fn is_valid(&self) -> bool {
        self.address != 0 && self.type_index >= 0
    }
}

/// Columnar object source: a type name table plus object records.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectTable {
    #[serde(default)]
    pub type_names: Vec<Option<String>>,
    #[serde(default)]
    pub objects: Vec<ObjectRecord>,
}

impl ObjectTable {
    /// Resolves a type index to its name; unknown indices resolve to "".
    pub fn type_name(&self, type_index: i64) -> &str {
        usize::try_from(type_index)
            .ok()
            .and_then(|idx| self.type_names.get(idx))
            .and_then(|name| name.as_deref())
            .unwrap_or("")
    }
}

/// Per-type totals over the valid records of `table`.
///
/// Rows are keyed by resolved type name, so indices that resolve to the same
/// name (including unresolved ones) share a row. Resident size is not
/// available from this source and stays unmeasured.
pub fn aggregate_raw(table: &ObjectTable) -> Vec<AggregateRow> {
    let mut acc = Accumulator::default();
    let mut skipped = 0usize;
    let mut unresolved = 0usize;

    for object in &table.objects {
        if !object.is_valid() {
            skipped += 1;
            continue;
        }
        let name = table.type_name(object.type_index);
        if name.is_empty() {
            unresolved += 1;
        }
        acc.add(name, Metric::allocated_only(object.size));
    }

    if skipped > 0 {
        debug!("Skipped {} invalid object records", skipped);
    }
    if unresolved > 0 {
        warn!(
            "{} object records have no resolvable type name; reported under an empty type",
            unresolved
        );
    }

    acc.into_rows()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::flatten::flatten;

    fn object(type_index: i64, size: u64) -> ObjectRecord {
        ObjectRecord {
            type_index,
            address: 0x1000,
            size,
        }
    }

    // -------------------------------------------------------------------------
    // aggregate_tree
    // -------------------------------------------------------------------------

    #[test]
    fn test_zero_leaf_fallback() {
        let root = TreeNode::group(
            "Graphics",
            vec![TreeNode::leaf("RenderTextures", Metric::allocated_only(500_000))],
        );
        let rows = aggregate_tree(&root);

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].key, "RenderTextures");
        assert_eq!(rows[0].count, 0);
        assert_eq!(rows[0].metric.allocated, 500_000);
    }

    #[test]
    fn test_fallback_not_applied_when_leaves_contribute() {
        let root = TreeNode::group(
            "Graphics",
            vec![TreeNode::group(
                "RenderTextures",
                vec![TreeNode::leaf("shadow map", Metric::allocated_only(500_000))],
            )
            .with_metric(Metric::allocated_only(500_000))],
        );
        let rows = aggregate_tree(&root);

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].count, 1);
        assert_eq!(rows[0].metric.allocated, 500_000);
    }

    #[test]
    fn test_fallback_applied_per_child() {
        let root = TreeNode::group(
            "Native",
            vec![
                TreeNode::group("Meshes", vec![TreeNode::leaf("Cube", Metric::new(300, 200))]),
                TreeNode::group("Shaders", vec![TreeNode::leaf("unused", Metric::ZERO)])
                    .with_metric(Metric::new(900, 100)),
                TreeNode::group("Empty", vec![]),
            ],
        );
        let rows = aggregate_tree(&root);

        assert_eq!(rows.len(), 3);
        assert_eq!((rows[0].metric, rows[0].count), (Metric::new(300, 200), 1));
        assert_eq!((rows[1].metric, rows[1].count), (Metric::new(900, 100), 0));
        assert_eq!((rows[2].metric, rows[2].count), (Metric::ZERO, 0));
    }

    #[test]
    fn test_sum_conservation() {
        let root = TreeNode::group(
            "Managed",
            vec![
                TreeNode::group(
                    "A",
                    vec![
                        TreeNode::leaf("a1", Metric::new(10, 5)),
                        TreeNode::group("a-inner", vec![TreeNode::leaf("a2", Metric::new(20, 5))])
                            .with_metric(Metric::new(1_000, 1_000)),
                    ],
                ),
                TreeNode::leaf("B", Metric::new(40, 40)),
            ],
        );

        let total: Metric = aggregate_tree(&root).iter().map(|r| r.metric).sum();
        let leaves: Metric = flatten(&root).iter().map(|r| r.metric).sum();

        // B is a first-level structural leaf: it appears once as a fallback
        // contribution and once as a flattened leaf, never twice in either.
        assert_eq!(total, Metric::new(70, 50));
        assert_eq!(leaves, Metric::new(70, 50));
    }

    #[test]
    fn test_resident_only_leaves_are_counted_as_skipped() {
        let node = TreeNode::group(
            "Textures",
            vec![
                TreeNode::leaf("Atlas", Metric::new(300, 200)),
                TreeNode::group("Streaming", vec![TreeNode::leaf("Mip", Metric::new(0, 64))]),
            ],
        );

        let totals = sum_leaves(&node);
        assert_eq!(totals.metric, Metric::new(300, 200));
        assert_eq!(totals.count, 1);
        assert_eq!(totals.resident_only, 1);

        // resident-only rolled-up node contributes nothing
        let rows = aggregate_children(&[TreeNode::leaf("Ghost", Metric::new(0, 4_096))]);
        assert_eq!((rows[0].metric, rows[0].count), (Metric::ZERO, 0));
    }

    #[test]
    fn test_duplicate_child_names_keep_separate_rows() {
        let root = TreeNode::group(
            "Managed",
            vec![
                TreeNode::leaf("Dup", Metric::allocated_only(1)),
                TreeNode::leaf("Dup", Metric::allocated_only(1)),
            ],
        );
        assert_eq!(aggregate_tree(&root).len(), 2);
    }

    // -------------------------------------------------------------------------
    // aggregate_by_key
    // -------------------------------------------------------------------------

    #[test]
    fn test_aggregate_by_key_groups_and_counts() {
        let root = TreeNode::group(
            "Managed",
            vec![
                TreeNode::group(
                    "System.String",
                    vec![
                        TreeNode::leaf("s1", Metric::new(10, 10)),
                        TreeNode::leaf("s2", Metric::new(30, 10)),
                    ],
                ),
                TreeNode::group("System.Byte[]", vec![TreeNode::leaf("b", Metric::new(5, 0))]),
            ],
        );
        let records = flatten(&root);
        let rows = aggregate_by_key(&records, |r| r.group_label);

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].key, "System.String");
        assert_eq!(rows[0].count, 2);
        assert_eq!(rows[0].metric, Metric::new(40, 20));
        assert_eq!(rows[1].key, "System.Byte[]");
        assert_eq!(rows[1].metric.resident, Some(0));
    }

    #[test]
    fn test_aggregate_by_key_is_case_sensitive() {
        let root = TreeNode::group(
            "Managed",
            vec![
                TreeNode::leaf("Texture", Metric::allocated_only(1)),
                TreeNode::leaf("texture", Metric::allocated_only(1)),
            ],
        );
        let records = flatten(&root);
        assert_eq!(aggregate_by_key(&records, |r| r.name).len(), 2);
    }

    #[test]
    fn test_aggregate_by_key_empty_input() {
        assert!(aggregate_by_key(&[], |r| r.name).is_empty());
    }

    // -------------------------------------------------------------------------
    // aggregate_raw
    // -------------------------------------------------------------------------

    #[test]
    fn test_invalid_records_excluded() {
        let table = ObjectTable {
            type_names: vec![Some("System.String".into())],
            objects: vec![
                object(-1, 4_096),
                ObjectRecord {
                    type_index: 0,
                    address: 0,
                    size: 1_024,
                },
                object(0, 2_097_152),
            ],
        };
        let rows = aggregate_raw(&table);

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].key, "System.String");
        assert_eq!(rows[0].count, 1);
        assert_eq!(rows[0].metric, Metric::allocated_only(2_097_152));
    }

    #[test]
    fn test_unresolved_names_become_empty_keys() {
        let table = ObjectTable {
            type_names: vec![None, Some("Foo".into())],
            objects: vec![object(0, 1), object(7, 2), object(1, 4)],
        };
        let rows = aggregate_raw(&table);

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].key, "");
        assert_eq!(rows[0].count, 2);
        assert_eq!(rows[0].metric.allocated, 3);
        assert_eq!(rows[1].key, "Foo");
    }

    #[test]
    fn test_duplicate_type_names_merge() {
        let table = ObjectTable {
            type_names: vec![Some("List`1".into()), Some("List`1".into())],
            objects: vec![object(0, 8), object(1, 8)],
        };
        let rows = aggregate_raw(&table);

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].count, 2);
        assert_eq!(rows[0].metric.resident, None);
    }
}
