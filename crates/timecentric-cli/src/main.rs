//! # Timecentric CLI
//!
//! Builds time-centric co-occurrence graphs and serves them.
//!
//! ## Usage
//!
//! ```bash
//! # Build graphs from annotated documents
//! timecentric build documents.json -o graphs.json --window 2 --top-n 30
//! # (also writes indexed_documents.json for the text endpoints)
//!
//! # Summarize a graphs file
//! timecentric stats graphs.json
//!
//! # Serve the timeline and graph queries
//! timecentric serve graphs.json --documents indexed_documents.json --port 8000
//!
//! # Print the effective configuration
//! timecentric config
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use timecentric_cli::{commands, server};
use timecentric_engine::config::TimecentricConfig;
use timecentric_engine::logging;

// =============================================================================
// Arguments
// =============================================================================

#[derive(Parser)]
#[command(name = "timecentric")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Time-centric co-occurrence graphs from dated documents")]
#[command(propagate_version = true)]
struct Cli {
    /// Configuration file (TOML); TCG__SECTION__KEY variables override it
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build graphs from a documents JSON file
    Build {
        /// Annotated documents
        input: PathBuf,

        /// Graphs output file
        #[arg(short, long, default_value = "graphs.json")]
        output: PathBuf,

        /// Indexed documents output file
        #[arg(long, default_value = "indexed_documents.json")]
        index: PathBuf,

        /// Sentences taken on each side of a dated sentence
        #[arg(long)]
        window: Option<usize>,

        /// Earliest accepted year
        #[arg(long)]
        start_year: Option<i32>,

        /// Latest accepted year
        #[arg(long)]
        end_year: Option<i32>,

        /// Weighting strategy (tf_itf_per_granularity, tf_itf)
        #[arg(long)]
        weighting: Option<String>,

        /// Nodes kept per graph
        #[arg(long)]
        top_n: Option<usize>,

        /// Keep every node
        #[arg(long, conflicts_with = "top_n")]
        no_top_n: bool,

        /// Indent the output
        #[arg(long)]
        pretty: bool,

        /// Hide the progress bar
        #[arg(short, long)]
        quiet: bool,
    },

    /// Print summary statistics of a graphs file
    Stats {
        /// Graphs file written by `build`
        graphs: PathBuf,
    },

    /// Serve a graphs file over HTTP
    Serve {
        /// Graphs file written by `build`
        graphs: PathBuf,

        /// Indexed documents file written by `build`, served under /text
        #[arg(short, long)]
        documents: Option<PathBuf>,

        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Print the effective configuration as TOML
    Config,
}

// =============================================================================
// Main Entry Point
// =============================================================================

fn main() {
    if let Err(e) = run() {
        eprintln!("{}: {:#}", "Error".red(), e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    let mut config = TimecentricConfig::load(cli.config.as_deref().and_then(|p| p.to_str()))?;
    logging::init_from_config(&config.logging);

    match cli.command {
        Commands::Build {
            input,
            output,
            index,
            window,
            start_year,
            end_year,
            weighting,
            top_n,
            no_top_n,
            pretty,
            quiet,
        } => {
            if let Some(window) = window {
                config.extraction.window_size = window;
            }
            if start_year.is_some() {
                config.extraction.start_year = start_year;
            }
            if end_year.is_some() {
                config.extraction.end_year = end_year;
            }
            if let Some(weighting) = weighting {
                config.weighting.strategy = weighting;
            }
            if top_n.is_some() {
                config.reduction.top_n = top_n;
            }
            if no_top_n {
                config.reduction.top_n = None;
            }
            config.validate()?;
            run_build(&input, &output, &index, &config, pretty, quiet)
        }
        Commands::Stats { graphs } => run_stats(&graphs),
        Commands::Serve { graphs, documents, port } => {
            if let Some(port) = port {
                config.server.port = port;
            }
            run_serve(&graphs, documents.as_deref(), &config)
        }
        Commands::Config => {
            print!("{}", config.to_toml()?);
            Ok(())
        }
    }
}

fn run_build(
    input: &std::path::Path,
    output: &std::path::Path,
    index: &std::path::Path,
    config: &TimecentricConfig,
    pretty: bool,
    quiet: bool,
) -> Result<()> {
    println!(
        "{}",
        format!("Building graphs from {}...", input.display()).bold()
    );
    let (report, stats) = commands::build(input, output, index, config, pretty, !quiet)?;

    println!(
        "   {} {} documents, {} pairs in {:.2?}",
        "✓".green(),
        report.documents,
        report.pairs,
        report.extraction_time
    );
    println!(
        "   {} {} graphs assembled in {:.2?}, weighted in {:.2?}",
        "✓".green(),
        report.graphs,
        report.assembly_time,
        report.weighting_time
    );
    println!(
        "   {} removed {} self-loops, {} self-mentions, {} low-weight nodes",
        "✓".green(),
        report.reduction.self_loops,
        report.reduction.self_mentions,
        report.reduction.pruned_nodes
    );
    println!("   {}", stats.summary());
    println!("   Written to {}", output.display().to_string().cyan());
    println!("   Documents indexed in {}", index.display().to_string().cyan());
    Ok(())
}

fn run_stats(graphs: &std::path::Path) -> Result<()> {
    let stats = commands::stats(graphs)?;

    println!("\n{}", "Graph Statistics".bold());
    println!("  Graphs:    {}", stats.graph_count().to_string().green());
    println!("    Day:     {}", stats.graphs_of(timecentric_core::Granularity::Day));
    println!("    Month:   {}", stats.graphs_of(timecentric_core::Granularity::Month));
    println!("    Year:    {}", stats.graphs_of(timecentric_core::Granularity::Year));
    println!("  Nodes:     {}", stats.node_count);
    println!("  Edges:     {}", stats.edge_count);
    println!("  Evidence:  {}", stats.evidence_count);
    println!("  Labels:    {}", stats.distinct_labels);
    if let (Some(first), Some(last)) = (stats.first, stats.last) {
        println!("  Span:      {} .. {}", first, last);
    }
    if let Some((timestamp, nodes)) = stats.largest {
        println!("  Largest:   {} ({} nodes)", timestamp.to_string().cyan(), nodes);
    }
    Ok(())
}

fn run_serve(
    graphs: &std::path::Path,
    documents: Option<&std::path::Path>,
    config: &TimecentricConfig,
) -> Result<()> {
    let catalog = commands::catalog(graphs)?;
    let documents = match documents {
        Some(path) => commands::documents(path)?,
        None => Default::default(),
    };
    println!(
        "{}",
        format!("Starting query service on port {}...", config.server.port).bold()
    );

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(server::run_server(catalog, documents, &config.server))?;
    Ok(())
}
