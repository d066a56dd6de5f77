//! Flattening of a breakdown subtree into labelled leaf records.

use tracing::warn;

use super::metric::Metric;
use super::tree::{MemoryTree, TreeNode};

/// A structural leaf together with the name of its first-level group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LeafRecord<'a> {
    pub name: &'a str,
    /// Name of the immediate child of the flattened root this leaf lives under.
    pub group_label: &'a str,
    /// The leaf's own label, if the model builder attached one.
    pub label: Option<&'a str>,
    pub metric: Metric,
}

/// Collects every structural leaf below `root` with a nonzero allocation.
///
/// Group labels are fixed at the first level below `root` and carried
/// unchanged through deeper levels. Output order follows a depth-first walk
/// but callers must not rely on it for presentation.
pub fn flatten(root: &TreeNode) -> Vec<LeafRecord<'_>> {
    let (records, resident_only) = collect_leaves(root);
    if resident_only > 0 {
        warn!(
            "'{}': {} items report resident memory without allocation and are not listed",
            root.name, resident_only
        );
    }
    records
}

/// Leaves with an allocation, plus the number of resident-only leaves skipped.
fn collect_leaves(root: &TreeNode) -> (Vec<LeafRecord<'_>>, usize) {
    let mut records = Vec::new();
    let mut resident_only = 0usize;
    let mut stack: Vec<(&TreeNode, &str)> = Vec::new();

    for group in &root.children {
        stack.push((group, group.name.as_str()));

        while let Some((node, group_label)) = stack.pop() {
            if node.is_structural_leaf() {
                if node.metric.has_allocation() {
                    records.push(LeafRecord {
                        name: &node.name,
                        group_label,
                        label: node.label.as_deref(),
                        metric: node.metric,
                    });
                } else if node.metric.is_resident_only() {
                    resident_only += 1;
                }
                continue;
            }
            // Reverse so siblings pop in declaration order
            for child in node.children.iter().rev() {
                stack.push((child, group_label));
            }
        }
    }

    (records, resident_only)
}

/// Flattens the named root, or yields nothing when the tree lacks it.
pub fn flatten_root<'a>(tree: &'a MemoryTree, root: &str) -> Vec<LeafRecord<'a>> {
    tree.root(root).map(flatten).unwrap_or_default()
}
