//! `medic tools` - show the planner's tool catalog.

use anyhow::Result;
use medic_core::MedicConfig;
use std::path::Path;

pub fn list(config: &MedicConfig, inventory_path: &Path, verbose: bool) -> Result<()> {
    let (_, registry) = super::load_inventory(config, inventory_path)?;
    let catalog = registry.list_for_planner();

    println!("\n🔧 Available Tools ({}):", catalog.len());
    for tool in &catalog {
        println!("   • {}", tool.name);
        if !tool.description.is_empty() {
            println!("     {}", tool.description);
        }
        if verbose {
            for (name, spec) in &tool.parameter_schema {
                let required = if spec.required { "required" } else { "optional" };
                println!(
                    "       - {} ({:?}, {}) {}",
                    name, spec.param_type, required, spec.description
                );
            }
        }
    }
    Ok(())
}
