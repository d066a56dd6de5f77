//! Generate testdata command implementation.
//!
//! Generates synthetic snapshot JSON files for trying out reports.

use chrono::Utc;
use rand::Rng;
use std::fs;
use std::path::PathBuf;
use tracing::debug;

use memsnap_exporter::report::{Metric, ObjectRecord, ObjectTable, TreeNode};
use memsnap_exporter::snapshot::{Snapshot, SNAPSHOT_VERSION};

// Constants for byte conversions
const KB: u64 = 1024;
const MB: u64 = 1024 * 1024;

/// Managed types used for synthetic objects.
const MANAGED_TYPES: &[&str] = &[
    "System.String",
    "System.Byte[]",
    "System.Int32[]",
    "System.Collections.Generic.List`1",
    "System.Collections.Generic.Dictionary`2",
    "UnityEngine.Vector3[]",
    "System.Action",
    "System.Object[]",
];

/// Native object types with example object names.
const NATIVE_TYPES: &[(&str, &[&str])] = &[
    ("Texture2D", &["Atlas_UI", "Terrain_Albedo", "6\" Logo", "Skybox_Front"]),
    ("Mesh", &["Character_LOD0", "Rock_01", "Tree_Pine"]),
    ("AudioClip", &["Music_Main", "Footstep_Grass"]),
    ("Shader", &["Standard", "UI/Default"]),
];

/// Estimated graphics categories: rolled-up sizes, no individual members.
const GRAPHICS_CATEGORIES: &[&str] = &["RenderTextures", "Meshes (GPU)", "Textures (GPU)"];

/// Generates a synthetic snapshot JSON file for testing purposes.
pub fn command_generate_testdata(
    output: PathBuf,
    objects_per_type: usize,
    invalid_count: usize,
) -> anyhow::Result<()> {
    debug!(
        "Generating test snapshot: objects_per_type={}, invalid_count={}, output={}",
        objects_per_type,
        invalid_count,
        output.display()
    );

    let snapshot = generate_snapshot(&mut rand::thread_rng(), objects_per_type, invalid_count);

    let json_content = serde_json::to_string_pretty(&snapshot)?;
    fs::write(&output, &json_content)?;

    println!(
        "✅ Generated test snapshot: {} objects, {} categories in {}",
        snapshot.objects.objects.len(),
        snapshot.breakdown.roots().len(),
        output.display()
    );

    Ok(())
}

/// Builds a snapshot whose object table and breakdown describe the same objects.
fn generate_snapshot(rng: &mut impl Rng, objects_per_type: usize, invalid_count: usize) -> Snapshot {
    let mut table = ObjectTable {
        type_names: MANAGED_TYPES.iter().map(|t| Some(t.to_string())).collect(),
        objects: Vec::new(),
    };
    // one unnamed type, as seen for compiler-generated types
    table.type_names.push(None);

    let mut address: u64 = 0x1000_0000;
    let mut managed_groups = Vec::new();

    for (type_index, type_name) in MANAGED_TYPES.iter().enumerate() {
        let mut members = Vec::with_capacity(objects_per_type);
        for _ in 0..objects_per_type {
            let size = rng.gen_range(16..64 * KB);
            table.objects.push(ObjectRecord {
                type_index: type_index as i64,
                address,
                size,
            });
            members.push(TreeNode::leaf(
                format!("0x{address:x}"),
                Metric::new(size, size),
            ));
            address += size.next_multiple_of(16);
        }
        managed_groups.push(TreeNode::group(*type_name, members));
    }

    for _ in 0..invalid_count {
        let object = if rng.gen_bool(0.5) {
            ObjectRecord {
                type_index: -1,
                address,
                size: rng.gen_range(16..KB),
            }
        } else {
            ObjectRecord {
                type_index: 0,
                address: 0,
                size: rng.gen_range(16..KB),
            }
        };
        table.objects.push(object);
    }

    let native_groups = NATIVE_TYPES
        .iter()
        .map(|(type_name, names)| {
            let members = names
                .iter()
                .map(|name| {
                    let allocated = rng.gen_range(64 * KB..16 * MB);
                    // resident 50-100% of allocated
                    let resident = allocated / 2 + rng.gen_range(0..=allocated / 2);
                    TreeNode::leaf(*name, Metric::new(allocated, resident)).with_label(*type_name)
                })
                .collect();
            TreeNode::group(*type_name, members)
        })
        .collect();

    let graphics_groups = GRAPHICS_CATEGORIES
        .iter()
        .map(|name| {
            TreeNode::group(*name, Vec::new())
                .with_metric(Metric::allocated_only(rng.gen_range(MB..128 * MB)))
        })
        .collect();

    let untracked = rng.gen_range(MB..64 * MB);

    Snapshot {
        version: SNAPSHOT_VERSION.to_string(),
        captured_at: Some(Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string()),
        objects: table,
        breakdown: vec![
            TreeNode::group("Managed", managed_groups),
            TreeNode::group("Native/Unity Objects", native_groups),
            TreeNode::group("Graphics", graphics_groups),
            TreeNode::leaf("Untracked", Metric::new(untracked, untracked)),
        ]
        .into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use memsnap_exporter::report::{aggregate_raw, flatten_root};

    #[test]
    fn test_generated_snapshot_is_consistent() {
        let snapshot = generate_snapshot(&mut rand::thread_rng(), 3, 4);

        assert_eq!(snapshot.objects.objects.len(), MANAGED_TYPES.len() * 3 + 4);
        let rows = aggregate_raw(&snapshot.objects);
        assert_eq!(rows.len(), MANAGED_TYPES.len());
        assert!(rows.iter().all(|r| r.count == 3));

        let raw_total: u64 = rows.iter().map(|r| r.metric.allocated).sum();
        let tree_total: u64 = flatten_root(&snapshot.breakdown, "Managed")
            .iter()
            .map(|r| r.metric.allocated)
            .sum();
        assert_eq!(raw_total, tree_total);
    }

    #[test]
    fn test_generated_snapshot_round_trips_as_json() {
        let snapshot = generate_snapshot(&mut rand::thread_rng(), 1, 0);
        let json = serde_json::to_string(&snapshot).unwrap();
        let parsed = memsnap_exporter::parse_snapshot(&json).unwrap();

        assert_eq!(parsed.breakdown.roots(), snapshot.breakdown.roots());
        assert_eq!(parsed.objects, snapshot.objects);
    }
}
