use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use codeshape::chunk::converter::statistics;
use codeshape::config::Config;
use codeshape::indexer::core::{FileAnalysis, FileProcessor};
use ignore::WalkBuilder;
use rayon::prelude::*;
use tracing::{info, warn};

/// Extract structures, relationships and chunks from source files.
#[derive(Parser)]
#[command(name = "codeshape")]
#[command(about = "Multi-language code structure extraction", long_about = None)]
#[command(version)]
struct Cli {
    /// JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Merge chunks separated by at most this many lines
    #[arg(long)]
    merge_gap: Option<usize>,

    /// Pretty-print JSON output
    #[arg(long)]
    pretty: bool,

    /// Print per-file counts instead of full results
    #[arg(long)]
    summary: bool,

    /// Skip tree-sitter and use text patterns only
    #[arg(long)]
    no_ast: bool,

    /// Files or directories to process
    #[arg(required = true)]
    paths: Vec<PathBuf>,
}

fn init_logging() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Files under `paths` whose language is known. Directory walks respect
/// `.gitignore`.
fn collect_files(processor: &FileProcessor, paths: &[PathBuf]) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for path in paths {
        if path.is_file() {
            files.push(path.clone());
            continue;
        }
        let walker = WalkBuilder::new(path).hidden(false).build();
        for entry in walker.filter_map(|e| e.ok()) {
            let entry_path = entry.path();
            if entry_path.is_file() && processor.detect_language(entry_path) != "unknown" {
                files.push(entry_path.to_path_buf());
            }
        }
    }
    files.sort();
    files
}

fn summarize(analysis: &FileAnalysis) -> serde_json::Value {
    serde_json::json!({
        "file_path": analysis.file_path,
        "language": analysis.language,
        "strategy": analysis.strategy,
        "chunks": statistics(&analysis.chunks),
        "nesting": analysis.relationships.nesting.len(),
        "references": analysis.relationships.references.len(),
        "dependencies": analysis.relationships.dependencies.len(),
    })
}

fn render(value: &impl serde::Serialize, pretty: bool) -> Result<String> {
    let text = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    };
    text.context("failed to serialize output")
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => Config::load(path),
        None => Ok(Config::default()),
    }
}

fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();

    let mut config = load_config(cli.config.as_deref())?;
    if let Some(gap) = cli.merge_gap {
        config.merge_max_gap = Some(gap);
    }
    config.validate().context("invalid configuration")?;

    let processor = if cli.no_ast {
        FileProcessor::new(config, None)
    } else {
        FileProcessor::with_tree_sitter(config)
    };

    let files = collect_files(&processor, &cli.paths);
    info!("Processing {} files", files.len());

    let results: Vec<(PathBuf, Result<FileAnalysis>)> = files
        .par_iter()
        .map(|path| (path.clone(), processor.process_path(path)))
        .collect();

    let mut failed = 0;
    for (path, result) in results {
        match result {
            Ok(analysis) => {
                let line = if cli.summary {
                    render(&summarize(&analysis), cli.pretty)?
                } else {
                    render(&analysis, cli.pretty)?
                };
                println!("{line}");
            }
            Err(e) => {
                failed += 1;
                warn!("Skipping {}: {e:#}", path.display());
            }
        }
    }

    info!("Done: {} processed, {failed} failed", files.len() - failed);
    Ok(())
}
