//! Command-line runner for the network graph build

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use trailgraph_core::loading::{GraphBuildConfig, MatchPolicy};
use trailgraph_core::{Error, build_network_graph};

#[derive(Parser, Debug)]
#[command(author, version, about = "Build the routable trail graph from line layers and a DEM", long_about = None)]
struct Cli {
    /// TOML file describing inputs, outputs and tuning
    #[arg(long, conflicts_with = "run_dir")]
    config: Option<PathBuf>,
    /// Run directory with the standard `temp/` layout, used without --config
    #[arg(long, default_value = "out")]
    run_dir: PathBuf,
    #[arg(long)]
    graph_output: Option<PathBuf>,
    #[arg(long, conflicts_with = "no_debug")]
    debug_output: Option<PathBuf>,
    /// Skip the debug GeoJSON document
    #[arg(long)]
    no_debug: bool,
    #[arg(long)]
    snap_decimals: Option<i32>,
    #[arg(long, value_enum)]
    match_policy: Option<PolicyArg>,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum PolicyArg {
    FirstWins,
    LowestCost,
}

impl From<PolicyArg> for MatchPolicy {
    fn from(arg: PolicyArg) -> Self {
        match arg {
            PolicyArg::FirstWins => MatchPolicy::FirstWins,
            PolicyArg::LowestCost => MatchPolicy::LowestCost,
        }
    }
}

/// Config file or run directory, then command-line overrides
fn resolve_config(cli: &Cli) -> Result<GraphBuildConfig, Error> {
    let mut config = match &cli.config {
        Some(path) => GraphBuildConfig::from_toml_file(path)?,
        None => GraphBuildConfig::from_run_dir(&cli.run_dir),
    };

    if let Some(path) = &cli.graph_output {
        config.graph_output.clone_from(path);
    }
    if cli.no_debug {
        config.debug_output = None;
    } else if let Some(path) = &cli.debug_output {
        config.debug_output = Some(path.clone());
    }
    if let Some(decimals) = cli.snap_decimals {
        config.snap_decimals = decimals;
    }
    if let Some(policy) = cli.match_policy {
        config.match_policy = policy.into();
    }
    Ok(config)
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let result = resolve_config(&cli).and_then(|config| build_network_graph(&config));

    match result {
        Ok(outcome) => {
            info!(
                nodes = outcome.report.node_count,
                edges = outcome.report.edge_count,
                components = outcome.report.connected_components,
                bytes = outcome.report.graph_bytes,
                "Graph build finished"
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Graph build failed: {e}");
            ExitCode::FAILURE
        }
    }
}
