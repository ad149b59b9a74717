//! # atlasctl
//!
//! Runs Atlas syncs from the command line: assembles configuration from
//! the environment and CLI flags, opens the configured graph store, and
//! executes one orchestrated sync run.
//!
//! Provider modules are compiled in via [`providers`]; a bare checkout
//! ships only the built-in index module, so `atlasctl sync` against
//! `memory://` is mostly useful for smoke-testing a deployment's
//! configuration and store connectivity.

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use atlas_config::{Config, ConfigLoader, validate};
use atlas_core::{
    ModuleOutcome, ModuleSpec, SyncOrchestrator, open_store, registry_with,
    sink_from_settings,
};

#[derive(Parser, Debug)]
#[command(name = "atlasctl")]
#[command(about = "Sync external asset inventories into the Atlas graph")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    #[command(flatten)]
    sync: SyncArgs,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run one sync (the default when no subcommand is given)
    Sync(SyncArgs),
    /// List the registered modules in execution order and exit
    Modules,
}

#[derive(Args, Debug, Clone)]
struct SyncArgs {
    /// Graph store URI (overrides ATLAS_STORE_URI)
    #[arg(long)]
    store_uri: Option<String>,

    /// Fixed update tag instead of the wall-clock default
    #[arg(long)]
    update_tag: Option<i64>,

    /// Log-and-continue past module failures instead of aborting
    #[arg(long)]
    best_effort: bool,

    /// Run only the named module; repeat the flag for a subset
    #[arg(long = "module", value_name = "NAME")]
    modules: Vec<String>,

    /// Batch bound for cleanup deletions
    #[arg(long)]
    cleanup_batch_size: Option<u64>,
}

/// Provider modules compiled into this binary. Deployments embed their
/// own descriptors here; the index module is always prepended by the
/// registry factory.
fn providers() -> Vec<ModuleSpec> {
    Vec::new()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env_file_loaded = dotenvy::dotenv().is_ok();
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if env_file_loaded {
        info!("loaded .env file");
    }

    match cli.command {
        Some(Command::Modules) => {
            for name in registry_with(providers()).names() {
                println!("{name}");
            }
            Ok(())
        }
        Some(Command::Sync(args)) => run_sync(args).await,
        None => run_sync(cli.sync).await,
    }
}

fn assemble_config(args: &SyncArgs) -> anyhow::Result<Config> {
    let mut config = ConfigLoader::default()
        .load()
        .context("failed to load configuration from the environment")?;

    if let Some(uri) = args.store_uri.clone() {
        config.store.uri = uri;
    }
    if let Some(tag) = args.update_tag {
        config.sync.update_tag = Some(tag);
    }
    if args.best_effort {
        config.sync.best_effort = true;
    }
    if !args.modules.is_empty() {
        config.sync.requested_modules = Some(args.modules.clone());
    }
    if let Some(batch) = args.cleanup_batch_size {
        config.sync.cleanup_batch_size = Some(batch);
    }

    let warnings = validate(&config).context("configuration failed validation")?;
    warnings.log();
    Ok(config)
}

async fn run_sync(args: SyncArgs) -> anyhow::Result<()> {
    let config = assemble_config(&args)?;
    let store =
        open_store(&config.store).context("failed to open the graph store")?;

    let cancel = CancellationToken::new();
    let signal_guard = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received, aborting after the current statement");
            signal_guard.cancel();
        }
    });

    let orchestrator = SyncOrchestrator::new(registry_with(providers()))
        .with_metrics(sink_from_settings(&config.metrics))
        .with_cancellation(cancel);

    let summary = orchestrator
        .run(store.as_ref(), &config)
        .await
        .context("sync run failed")?;

    let executed = summary
        .results
        .iter()
        .filter(|result| result.outcome == ModuleOutcome::Success)
        .count();
    info!(
        tag = summary.tag.as_i64(),
        modules = executed,
        "sync run completed"
    );
    Ok(())
}
