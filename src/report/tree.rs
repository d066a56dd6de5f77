//! Hierarchical memory breakdown as supplied by the snapshot model builder.

use ahash::AHashMap as HashMap;
use serde::{Deserialize, Serialize};

use super::metric::Metric;

/// One node of the memory breakdown.
///
/// A node without children is a structural leaf. Interior nodes may still
/// carry a rolled-up metric of their own when their members are not modeled
/// individually.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeNode {
    pub name: String,
    /// Optional category/type label attached by the model builder.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default)]
    pub metric: Metric,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<TreeNode>,
}

impl TreeNode {
    pub fn leaf(name: impl Into<String>, metric: Metric) -> Self {
        Self {
            name: name.into(),
            label: None,
            metric,
            children: Vec::new(),
        }
    }

    pub fn group(name: impl Into<String>, children: Vec<TreeNode>) -> Self {
        Self {
            name: name.into(),
            label: None,
            metric: Metric::ZERO,
            children,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_metric(mut self, metric: Metric) -> Self {
        self.metric = metric;
        self
    }

    pub fn is_structural_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

/// Top-level categories of a breakdown with lookup by name.
///
/// Roots are located through a name index built once at construction, never
/// by comparing node values. If two roots share a name, the first one wins.
/// Serialized as the plain list of roots.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "Vec<TreeNode>", into = "Vec<TreeNode>")]
pub struct MemoryTree {
    roots: Vec<TreeNode>,
    index: HashMap<String, usize>,
}

impl MemoryTree {
    pub fn new(roots: Vec<TreeNode>) -> Self {
        let mut index = HashMap::with_capacity(roots.len());
        for (position, root) in roots.iter().enumerate() {
            index.entry(root.name.clone()).or_insert(position);
        }
        Self { roots, index }
    }

    pub fn roots(&self) -> &[TreeNode] {
        &self.roots
    }

    pub fn root(&self, name: &str) -> Option<&TreeNode> {
        self.index.get(name).map(|&position| &self.roots[position])
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }
}

impl From<Vec<TreeNode>> for MemoryTree {
    fn from(roots: Vec<TreeNode>) -> Self {
        Self::new(roots)
    }
}

impl From<MemoryTree> for Vec<TreeNode> {
    fn from(tree: MemoryTree) -> Self {
        tree.roots
    }
}
