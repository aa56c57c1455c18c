use anyhow::Context;
use clap::{Parser, Subcommand};
use medic_core::{LogFormat, LoggingConfig, MedicConfig};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser, Debug)]
#[command(name = "medic", version, about = "Detect, remediate and verify unhealthy infrastructure")]
struct Cli {
    /// Path to medic.yaml. Defaults apply when the file does not exist.
    #[arg(long, short, global = true, env = "MEDIC_CONFIG", default_value = "medic.yaml")]
    config: PathBuf,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Trigger a fix run against an inventory.
    Run {
        /// Inventory file describing resources and tools.
        #[arg(long, short)]
        inventory: PathBuf,

        /// Plan script (a single plan or `plans: [...]`). Without it the noop planner is used.
        #[arg(long, short)]
        plan: Option<PathBuf>,

        /// Resource id or name to fix. Repeatable; defaults to every resource.
        #[arg(long = "resource", short = 'r')]
        resources: Vec<String>,

        /// Override orchestrator.max_retries.
        #[arg(long)]
        max_retries: Option<u32>,

        /// Skip the settle and backoff delays.
        #[arg(long, default_value_t = false)]
        no_delay: bool,

        /// Print the fix record as JSON.
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Classify every resource in an inventory.
    Status {
        #[arg(long, short)]
        inventory: PathBuf,

        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Show the tool catalog handed to the planner.
    Tools {
        #[arg(long, short)]
        inventory: PathBuf,

        /// Include parameter schemas.
        #[arg(long, short, default_value_t = false)]
        verbose: bool,
    },

    /// Inspect stored fix records.
    Fixes {
        #[command(subcommand)]
        cmd: FixesCommand,
    },
}

#[derive(Subcommand, Debug)]
enum FixesCommand {
    /// List fix records, newest first.
    List {
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },

    /// Show one fix record.
    Show {
        id: String,

        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Delete one fix record.
    Delete { id: String },

    /// Delete every fix record.
    Clear,
}

fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(logging.level.as_str()));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    match logging.format {
        LogFormat::Pretty => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = MedicConfig::load_or_default(&cli.config)
        .with_context(|| format!("Failed to load configuration from {:?}", cli.config))?;
    init_tracing(&config.logging);

    match cli.cmd {
        Command::Run {
            inventory,
            plan,
            resources,
            max_retries,
            no_delay,
            json,
        } => {
            commands::run::run(
                &config,
                commands::run::RunArgs {
                    inventory,
                    plan,
                    resources,
                    max_retries,
                    no_delay,
                    json,
                },
            )
            .await?
        }

        Command::Status { inventory, json } => {
            commands::status::run(&config, &inventory, json).await?
        }

        Command::Tools { inventory, verbose } => {
            commands::tools::list(&config, &inventory, verbose)?
        }

        Command::Fixes { cmd } => match cmd {
            FixesCommand::List { limit } => commands::fixes::list(&config, limit).await?,
            FixesCommand::Show { id, json } => commands::fixes::show(&config, &id, json).await?,
            FixesCommand::Delete { id } => commands::fixes::delete(&config, &id).await?,
            FixesCommand::Clear => commands::fixes::clear(&config).await?,
        },
    }

    Ok(())
}
