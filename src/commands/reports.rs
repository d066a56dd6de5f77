//! Reports command implementation.
//!
//! Lists the report catalog.

use memsnap_exporter::report::{ReportKind, REPORTS};

/// Short description of what a report kind produces.
fn describe(kind: ReportKind) -> &'static str {
    match kind {
        ReportKind::ObjectTypeTotals => "totals per managed type (object table)",
        ReportKind::CategoryBreakdown => "one row per top-level category",
        ReportKind::ItemListing => "one row per item below the root",
        ReportKind::GroupTotals => "items below the root grouped by key",
        ReportKind::ChildTotals => "one row per child of the root",
    }
}

/// Lists available reports (ignores the report selection intentionally).
pub fn command_reports(verbose: bool) -> anyhow::Result<()> {
    println!("📊 Memory Snapshot Exporter - Available Reports");
    println!("===============================================");

    for spec in REPORTS.iter() {
        println!("\n🏷️  Report: {}", spec.name);
        println!("   ├─ 📂 File: {}", spec.file_name);
        if let Some(root) = &spec.root {
            println!("   ├─ 🌳 Root: {}", root);
        }

        if verbose {
            println!("   ├─ Kind: {:?}", spec.kind);
            if let Some(group_by) = spec.group_by {
                println!("   ├─ Group by: {:?}", group_by);
            }
            if let Some(title) = &spec.title {
                println!("   ├─ Title: {}", title);
            }
            println!("   └─ Order: {:?}", spec.order.unwrap_or_default());
        } else {
            println!("   └─ {}", describe(spec.kind));
        }
    }

    println!("\n📋 Total: {} reports", REPORTS.len());

    Ok(())
}
