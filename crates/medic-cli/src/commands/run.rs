//! `medic run` - trigger a fix run.

use anyhow::{Context, Result};
use medic_core::{FixScope, MedicConfig, StatusModel};
use medic_evaluation::create_store;
use medic_planner::{NoopPlanner, Planner, ScriptedPlanner};
use medic_runtime::Orchestrator;
use std::path::PathBuf;
use std::sync::Arc;

pub struct RunArgs {
    pub inventory: PathBuf,
    pub plan: Option<PathBuf>,
    pub resources: Vec<String>,
    pub max_retries: Option<u32>,
    pub no_delay: bool,
    pub json: bool,
}

pub async fn run(config: &MedicConfig, args: RunArgs) -> Result<()> {
    let (inventory, registry) = super::load_inventory(config, &args.inventory)?;

    let planner: Arc<dyn Planner> = match &args.plan {
        Some(path) => Arc::new(ScriptedPlanner::from_file(path)?),
        None => {
            tracing::warn!("No plan script given, using the noop planner");
            Arc::new(NoopPlanner)
        }
    };

    let sink = create_store(&config.evaluation).context("Failed to open evaluation store")?;

    let mut orchestrator_config = config.orchestrator.clone();
    if args.no_delay {
        orchestrator_config.settle_delay_ms = 0;
        orchestrator_config.retry_backoff_ms = 0;
    }
    let max_retries = args.max_retries.unwrap_or(orchestrator_config.max_retries);

    let orchestrator = Orchestrator::builder()
        .planner(planner)
        .registry(Arc::new(registry))
        .monitor(Arc::new(inventory.clone()))
        .signals(Arc::new(inventory))
        .sink(sink)
        .status_model(StatusModel::new(config.thresholds.clone()))
        .config(orchestrator_config)
        .build()?;

    let scope = if args.resources.is_empty() {
        FixScope::all()
    } else {
        FixScope::resources(args.resources)
    };

    let record = orchestrator.trigger_fix(&scope, max_retries).await;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&record)?);
    } else {
        print!("{}", super::render_record(&record));
    }

    if !record.is_success() {
        anyhow::bail!("Fix {} ended with {}", record.id, record.final_status);
    }
    Ok(())
}
