use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use depgraph_viz_core::config::VizConfig;
use depgraph_viz_core::pipeline::{self, PipelineReport};
use depgraph_viz_core::render::DEFAULT_OUTPUT;
use depgraph_viz_core::{GraphOrigin, ScoreSource};
use tracing_subscriber::EnvFilter;

/// depviz - render ranked dependency graphs from analysis exports
#[derive(Parser)]
#[command(name = "depviz")]
#[command(version)] // Auto-pull version from Cargo.toml
#[command(about = "Score and draw the dependency graph of an analysis export", long_about = None)]
struct Cli {
    /// Analysis export (JSON); conventional locations are probed when omitted
    input: Option<PathBuf>,

    /// Output image path
    #[arg(short, long, default_value = DEFAULT_OUTPUT)]
    output: PathBuf,

    /// JSON config overriding the built-in defaults
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Also search this directory (gitignore-aware) for *_visualization.json
    #[arg(long, value_name = "DIR")]
    scan: Option<PathBuf>,

    /// More log output (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    match run(&cli) {
        Ok(report) => {
            print_report(&report);
            ExitCode::SUCCESS
        }
        Err(err) => {
            tracing::error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> anyhow::Result<PipelineReport> {
    let config = match &cli.config {
        Some(path) => VizConfig::from_file(path)?,
        None => VizConfig::default(),
    };

    let cwd = std::env::current_dir().context("resolving working directory")?;
    let input = pipeline::load_input(cli.input.as_deref(), &cwd, cli.scan.as_deref(), &config);
    if let Some(path) = &input.path {
        println!("Analysis data: {}", path.display());
    }

    pipeline::run(&input.document, &config, &cli.output)
}

fn init_logging(verbose: u8, quiet: bool) {
    let default = match (quiet, verbose) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "info",
        (false, _) => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn print_report(report: &PipelineReport) {
    println!("Found {} dependency relationships", report.edges_found);
    if report.origin == GraphOrigin::Sample {
        println!("No dependencies in data; rendered the sample graph");
    }
    println!(
        "Graph: {} nodes, {} edges ({:?} layout)",
        report.summary.nodes, report.summary.edges, report.layout
    );
    if let ScoreSource::DegreeCentrality { reason } = &report.score_source {
        println!("Importance: degree centrality ({reason})");
    }
    println!("{}", report.summary);

    if !report.top_nodes.is_empty() {
        println!("Most important:");
        for (id, score) in &report.top_nodes {
            println!("  {score:.3}  {id}");
        }
    }
    println!("Dependency graph saved to {}", report.artifact.display());
}
