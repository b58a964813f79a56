//! Report command implementation.
//!
//! The report command:
//! 1. Reads and parses the metrics document
//! 2. Optionally builds the dump graph from a snapshot and aggregates it
//! 3. Folds the root sizes into the document
//! 4. Renders the pretty report, or serializes the document as JSON
//! 5. Reports collected warnings after the output

use crate::memory::{build_graph, parse_snapshot, size_summary, Diagnostics};
use crate::report::{parse_document, MetricsDocument, MetricsReportRenderer, ReportLine};
use crate::utils::config::{load_render_config, RenderConfig, MEMORY_SUMMARY_KEY};
use anyhow::{bail, Context, Result};
use log::{debug, info, warn};
use serde_json::Value;
use std::fs;
use std::path::PathBuf;
use std::time::Instant;

/// Arguments for the report command
///
/// **Public** - used by main.rs to construct from CLI args
#[derive(Debug, Clone, Default)]
pub struct ReportArgs {
    /// Analyzed metrics document (JSON)
    pub file: PathBuf,

    /// Print the formatted report instead of JSON
    pub pretty_print: bool,

    /// Dump graph snapshot (JSON) whose sizes are folded in
    pub memory: Option<PathBuf>,

    /// Render configuration (TOML)
    pub config: Option<PathBuf>,

    /// Abort on the first malformed snapshot record instead of skipping it
    pub strict: bool,
}

/// Everything the report command produces, before printing
#[derive(Debug, Clone)]
pub struct ReportOutput {
    /// Document after the memory summary was folded in
    pub document: MetricsDocument,

    /// Rendered lines, when pretty printing
    pub lines: Option<Vec<ReportLine>>,

    /// Warnings collected while aggregating dump sizes
    pub diagnostics: Diagnostics,
}

/// Validate report arguments before doing any work
///
/// # Errors
/// * Empty or missing input file
/// * Missing snapshot or config file
pub fn validate_args(args: &ReportArgs) -> Result<()> {
    if args.file.as_os_str().is_empty() {
        bail!("Trace file path needs to be passed, --file=/path/to/results.json");
    }
    if !args.file.is_file() {
        bail!("Trace file could not be found: {}", args.file.display());
    }

    if let Some(memory) = &args.memory {
        if !memory.is_file() {
            bail!("Memory snapshot could not be found: {}", memory.display());
        }
    }

    if let Some(config) = &args.config {
        if !config.is_file() {
            bail!("Render config could not be found: {}", config.display());
        }
    }

    Ok(())
}

/// Build the report without printing it
///
/// **Public** - the single place where the renderer, the dump graph and
/// the aggregator are wired together
pub fn build_report(args: &ReportArgs) -> Result<ReportOutput> {
    let config = match &args.config {
        Some(path) => load_render_config(path)
            .with_context(|| format!("Failed to load render config {}", path.display()))?,
        None => RenderConfig::default(),
    };

    let raw = fs::read_to_string(&args.file)
        .with_context(|| format!("Failed to read {}", args.file.display()))?;
    let mut document = parse_document(&raw).context("Failed to parse metrics document")?;
    debug!("Parsed metrics document with {} top-level entries", document.len());

    let mut diagnostics = Diagnostics::new();

    if let Some(memory_path) = &args.memory {
        info!("Folding memory sizes from {}", memory_path.display());

        let raw_snapshot = fs::read_to_string(memory_path)
            .with_context(|| format!("Failed to read {}", memory_path.display()))?;
        let snapshot = parse_snapshot(&raw_snapshot).context("Failed to parse dump snapshot")?;
        let mut graph = build_graph(snapshot, args.strict).context("Failed to build dump graph")?;

        graph.aggregate_all(Some(&mut diagnostics));
        let summary = size_summary(&graph, Some(&mut diagnostics));
        if document
            .insert(MEMORY_SUMMARY_KEY.to_string(), Value::Object(summary))
            .is_some()
        {
            warn!(
                "Replaced the document's existing '{}' entry with the memory summary",
                MEMORY_SUMMARY_KEY
            );
        }
    }

    let lines = if args.pretty_print {
        let renderer = MetricsReportRenderer::new(config);
        Some(renderer.render(&document))
    } else {
        None
    };

    Ok(ReportOutput {
        document,
        lines,
        diagnostics,
    })
}

/// Execute the report command
///
/// **Public** - main entry point called from main.rs
pub fn execute_report(args: ReportArgs) -> Result<()> {
    let start_time = Instant::now();
    info!("Generating report for: {}", args.file.display());

    let output = build_report(&args)?;

    match &output.lines {
        Some(lines) => print!("{}", crate::report::render_terminal_report(lines)),
        None => println!(
            "{}",
            serde_json::to_string(&output.document).context("Failed to serialize document")?
        ),
    }

    if !output.diagnostics.is_empty() {
        warn!("{} import warnings:", output.diagnostics.len());
        for warning in output.diagnostics.warnings() {
            warn!("  [{}] {}", warning.kind, warning.message);
        }
    }

    info!("Report completed in {:.2}s", start_time.elapsed().as_secs_f64());
    Ok(())
}
