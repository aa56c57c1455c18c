//! `medic fixes` - stored fix records.

use anyhow::{Context, Result};
use medic_core::MedicConfig;
use medic_evaluation::{EvaluationSink, create_store};
use std::sync::Arc;

fn store(config: &MedicConfig) -> Result<Arc<dyn EvaluationSink>> {
    create_store(&config.evaluation).context("Failed to open evaluation store")
}

pub async fn list(config: &MedicConfig, limit: usize) -> Result<()> {
    let records = store(config)?.list(limit).await?;
    if records.is_empty() {
        println!("No fix records found.");
        return Ok(());
    }

    println!("\n📋 Fix records ({}):", records.len());
    for record in &records {
        println!(
            "   {}  {}  {:<20}  {} attempt(s)",
            record.id,
            record.timestamp.format("%Y-%m-%d %H:%M:%S"),
            record.final_status.to_string(),
            record.attempts.len()
        );
    }
    Ok(())
}

pub async fn show(config: &MedicConfig, id: &str, json: bool) -> Result<()> {
    let record = store(config)?
        .get(id)
        .await?
        .with_context(|| format!("Fix record not found: {}", id))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&record)?);
    } else {
        print!("{}", super::render_record(&record));
    }
    Ok(())
}

pub async fn delete(config: &MedicConfig, id: &str) -> Result<()> {
    if store(config)?.delete(id).await? {
        println!("Deleted {}", id);
        Ok(())
    } else {
        anyhow::bail!("Fix record not found: {}", id)
    }
}

pub async fn clear(config: &MedicConfig) -> Result<()> {
    let removed = store(config)?.delete_all().await?;
    println!("Deleted {} fix record(s)", removed);
    Ok(())
}
