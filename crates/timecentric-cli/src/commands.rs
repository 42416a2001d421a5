//! File-to-file commands behind the CLI subcommands.

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use timecentric_engine::config::TimecentricConfig;
use timecentric_engine::statistics::IndexStatistics;
use timecentric_engine::{DocumentIndex, GraphCatalog, GraphsExport, Pipeline, RunReport, load_documents_json};

/// Builds graphs from a documents file and writes them as interchange JSON,
/// along with the indexed documents their evidence points to.
pub fn build(
    input: &Path,
    output: &Path,
    index_output: &Path,
    config: &TimecentricConfig,
    pretty: bool,
    show_progress: bool,
) -> Result<(RunReport, IndexStatistics)> {
    let pipeline = Pipeline::from_config(config).context("invalid configuration")?;

    let documents = load_documents_json(input)
        .with_context(|| format!("failed to load documents from {}", input.display()))?;

    let pb = if show_progress {
        let pb = ProgressBar::new(documents.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.cyan} [{bar:40.cyan/blue}] {pos}/{len} documents {msg}")
                .context("invalid progress template")?
                .progress_chars("=> "),
        );
        pb
    } else {
        ProgressBar::hidden()
    };

    pb.set_message("extracting");
    let (manager, report) = pipeline.run_with_progress(&documents, &|| pb.inc(1));
    pb.finish_with_message("done");

    let export = GraphsExport::from_manager(&manager);
    export
        .write_to_path(output, pretty)
        .with_context(|| format!("failed to write graphs to {}", output.display()))?;
    DocumentIndex::from_collection(&documents)
        .write_to_path(index_output, pretty)
        .with_context(|| format!("failed to write indexed documents to {}", index_output.display()))?;

    Ok((report, IndexStatistics::from_manager(&manager)))
}

/// Reads a graphs file back.
pub fn load_graphs(path: &Path) -> Result<GraphsExport> {
    GraphsExport::read_from_path(path).with_context(|| format!("failed to read graphs from {}", path.display()))
}

/// Summary statistics of a graphs file.
pub fn stats(path: &Path) -> Result<IndexStatistics> {
    Ok(IndexStatistics::from_export(&load_graphs(path)?))
}

/// Loads a graphs file into a query catalog.
pub fn catalog(path: &Path) -> Result<GraphCatalog> {
    Ok(GraphCatalog::new(load_graphs(path)?))
}

/// Reads an indexed documents file written by `build`.
pub fn documents(path: &Path) -> Result<DocumentIndex> {
    DocumentIndex::read_from_path(path)
        .with_context(|| format!("failed to read indexed documents from {}", path.display()))
}
