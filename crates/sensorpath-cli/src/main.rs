use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use sensorpath_cli::output::{format_path, format_summary, format_tour, OutputFormat};
use sensorpath_cli::sources::{graph_store, DataSource};
use sensorpath_lib::{
    load_or_build, plan_path, plan_tour, GraphStore, GraphSummary, PathRequest, TourRequest,
};

#[derive(Parser, Debug)]
#[command(author, version, about = "Indoor sensor pathfinding utilities")]
struct Cli {
    /// JSON payload file with `rooms` and `sensors` arrays.
    #[arg(long, global = true, env = "SENSORPATH_PAYLOAD", conflicts_with = "base_url")]
    payload: Option<PathBuf>,

    /// Base URL of the rooms/sensors data service.
    #[arg(long, global = true, env = "SENSORPATH_BASE_URL")]
    base_url: Option<String>,

    /// Directory for cached graphs. Defaults to the platform cache directory.
    #[arg(long, global = true, env = "SENSORPATH_CACHE_DIR")]
    cache_dir: Option<PathBuf>,

    /// Always rebuild the graph and never touch the cache.
    #[arg(long, global = true)]
    no_cache: bool,

    /// Output format.
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compute the fastest path between two rooms or sensors.
    Path {
        /// Starting room or sensor id.
        #[arg(long = "from")]
        from: String,
        /// Destination room or sensor id.
        #[arg(long = "to")]
        to: String,
    },
    /// Visit several rooms, always heading to the nearest one next.
    Tour {
        /// Room the tour starts in.
        #[arg(long = "from")]
        from: String,
        /// Rooms to visit.
        #[arg(long = "to", required = true, num_args = 1..)]
        to: Vec<String>,
    },
    /// Print node and edge counts of the sensor graph.
    Graph,
}

struct RunContext {
    source: DataSource,
    cache_dir: Option<PathBuf>,
    no_cache: bool,
    format: OutputFormat,
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let ctx = RunContext {
        source: DataSource::from_args(cli.payload.as_deref(), cli.base_url.as_deref()),
        cache_dir: cli.cache_dir,
        no_cache: cli.no_cache,
        format: cli.format,
    };

    match cli.command {
        Command::Path { from, to } => handle_path(&ctx, &from, &to),
        Command::Tour { from, to } => handle_tour(&ctx, &from, &to),
        Command::Graph => handle_graph(&ctx),
    }
}

impl RunContext {
    fn store(&self) -> Option<sensorpath_lib::FileGraphStore> {
        graph_store(self.cache_dir.as_deref(), self.no_cache)
    }
}

fn handle_path(ctx: &RunContext, from: &str, to: &str) -> Result<()> {
    let floorplan = ctx.source.load()?;
    let store = ctx.store();
    let plan = plan_path(
        &floorplan,
        store.as_ref().map(|s| s as &dyn GraphStore),
        &PathRequest::new(from, to),
    )
    .with_context(|| format!("failed to plan a path from {from} to {to}"))?;

    print!("{}", format_path(&plan, from, to, ctx.format)?);
    Ok(())
}

fn handle_tour(ctx: &RunContext, from: &str, targets: &[String]) -> Result<()> {
    let floorplan = ctx.source.load()?;
    let store = ctx.store();
    let plan = plan_tour(
        &floorplan,
        store.as_ref().map(|s| s as &dyn GraphStore),
        &TourRequest::new(from, targets.iter().cloned()),
    )
    .with_context(|| format!("failed to plan a tour from {from}"))?;

    print!("{}", format_tour(&plan, ctx.format)?);
    Ok(())
}

fn handle_graph(ctx: &RunContext) -> Result<()> {
    let floorplan = ctx.source.load()?;
    let store = ctx.store();
    let graph = load_or_build(store.as_ref().map(|s| s as &dyn GraphStore), &floorplan);

    print!(
        "{}",
        format_summary(&GraphSummary::from_graph(&graph), ctx.format)?
    );
    Ok(())
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .finish();

    let _ = tracing::subscriber::set_global_default(subscriber);
}
