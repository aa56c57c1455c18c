//! CLI command implementations for medic.

pub mod fixes;
pub mod run;
pub mod status;
pub mod tools;

use anyhow::{Context, Result};
use medic_core::{FixRecord, MedicConfig};
use medic_runtime::Inventory;
use medic_tools::ToolRegistry;
use std::path::Path;

/// Load an inventory and a registry holding its tools.
pub(crate) fn load_inventory(
    config: &MedicConfig,
    path: &Path,
) -> Result<(Inventory, ToolRegistry)> {
    let inventory = Inventory::from_file(path)
        .with_context(|| format!("Failed to load inventory from {:?}", path))?;
    let mut registry = ToolRegistry::new().with_timeout(config.tools.timeout());
    inventory.register_tools(&mut registry);
    Ok((inventory, registry))
}

/// Human-readable rendering of a fix record.
pub(crate) fn render_record(record: &FixRecord) -> String {
    let mut out = String::new();
    let icon = if record.is_success() { "✅" } else { "❌" };
    out.push_str(&format!(
        "\n{} Fix {} - {} after {} attempt(s)\n",
        icon,
        record.id,
        record.final_status,
        record.attempts.len()
    ));
    out.push_str(&format!("   Started: {}\n", record.timestamp.to_rfc3339()));
    if let Some(attempt) = record.resolved_attempt() {
        out.push_str(&format!("   Resolved by attempt {}\n", attempt.attempt_number));
    }

    for attempt in &record.attempts {
        let mark = if attempt.resolved { "resolved" } else { "unresolved" };
        out.push_str(&format!("\n🔁 Attempt {} ({})\n", attempt.attempt_number, mark));
        if let Some(error) = &attempt.error {
            out.push_str(&format!("   Error: {}\n", error));
        }
        if !attempt.plan.root_cause.is_empty() {
            out.push_str(&format!("   Root cause: {}\n", attempt.plan.root_cause));
        }
        for step in &attempt.step_results {
            let ok = if step.result.success { "ok" } else { "failed" };
            out.push_str(&format!(
                "   • {} [{}] {}\n",
                step.step.tool_name, ok, step.result.message
            ));
        }
        for (name, snapshot) in &attempt.after_snapshot {
            let before = attempt
                .before_snapshot
                .get(name)
                .map(|s| s.status.as_str())
                .unwrap_or("-");
            out.push_str(&format!(
                "   {}: {} -> {}\n",
                name,
                before,
                snapshot.status.as_str()
            ));
        }
    }
    out
}
