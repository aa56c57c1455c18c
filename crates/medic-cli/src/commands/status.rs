//! `medic status` - classify an inventory.

use anyhow::Result;
use medic_core::{MedicConfig, ResourceSnapshot, StatusModel};
use medic_runtime::ResourceMonitor;
use std::path::Path;

pub async fn run(config: &MedicConfig, inventory_path: &Path, json: bool) -> Result<()> {
    let (inventory, _) = super::load_inventory(config, inventory_path)?;
    let model = StatusModel::new(config.thresholds.clone());

    let mut snapshots: Vec<ResourceSnapshot> = Vec::new();
    for id in inventory.resource_ids().await? {
        match inventory.observe(&id).await {
            Ok(Some(observation)) => snapshots.push(observation.classify(&model)),
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(resource = %id, error = %e, "Telemetry unavailable");
                if let Some(spec) = inventory.resource(&id).await {
                    snapshots.push(ResourceSnapshot::unavailable(
                        &spec.id,
                        &spec.name,
                        spec.resource_type(),
                    ));
                }
            }
        }
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&snapshots)?);
        return Ok(());
    }

    println!("\n📊 Resources ({}):", snapshots.len());
    for snapshot in &snapshots {
        let icon = if snapshot.status.is_healthy() {
            "🟢"
        } else if snapshot.status.is_unhealthy() {
            "🔴"
        } else {
            "⚪"
        };
        println!(
            "   {} {} ({}, {}): {}",
            icon, snapshot.name, snapshot.id, snapshot.resource_type, snapshot.status
        );
        for (metric, value) in &snapshot.metrics {
            println!("       {} = {:.1}", metric, value);
        }
    }
    Ok(())
}
