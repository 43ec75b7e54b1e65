//! Command implementations for the crease CLI.

use std::fs;
use std::path::Path;

use log::{debug, info};

use crate::analysis::AnalysisConfig;
use crate::cli::args::*;
use crate::cli::output::*;
use crate::error::Result;
use crate::pipeline::layout::IndexLayout;
use crate::pipeline::{IndexConfig, IndexReader, build_from_csv};

/// Execute a CLI command.
pub fn execute_command(args: CreaseArgs) -> Result<()> {
    match &args.command {
        Command::Build(build_args) => build_index(build_args, &args),
        Command::Lookup(lookup_args) => lookup_term(lookup_args, &args),
        Command::Stats(stats_args) => show_stats(stats_args, &args),
    }
}

/// Merge a config file and command line overrides.
pub fn resolve_config(args: &BuildArgs) -> Result<IndexConfig> {
    let mut config = match &args.config {
        Some(path) => {
            debug!("Loading build configuration from {}", path.display());
            IndexConfig::from_json_file(path)?
        }
        None => IndexConfig::default(),
    };

    if let Some(capacity) = args.capacity {
        config.barrel_capacity = capacity;
    }
    if args.strict {
        config.strict = true;
    }
    if args.max_records.is_some() {
        config.max_records = args.max_records;
    }
    if args.threads.is_some() {
        config.threads = args.threads;
    }
    if args.stop_words {
        config.analysis = AnalysisConfig {
            min_token_len: config.analysis.min_token_len,
            ..AnalysisConfig::default().with_english_stop_words()
        };
    }
    if let Some(min_token_len) = args.min_token_len {
        config.analysis.min_token_len = min_token_len;
    }

    config.validate()?;
    Ok(config)
}

/// Build an index from a CSV file.
fn build_index(args: &BuildArgs, cli_args: &CreaseArgs) -> Result<()> {
    let config = resolve_config(args)?;

    if args.clean {
        let removed = IndexLayout::new(&args.output).clean_leftovers()?;
        if removed > 0 {
            info!("Removed {removed} leftover build directories");
        }
    }

    info!(
        "Building index from {} into {}",
        args.input.display(),
        args.output.display()
    );
    let report = build_from_csv(&args.input, &args.output, config)?;

    output_result(&BuildSummary::from(&report), cli_args)
}

/// Look up a term's postings.
fn lookup_term(args: &LookupArgs, cli_args: &CreaseArgs) -> Result<()> {
    let reader = IndexReader::open(&args.index)?;

    let mut terms = Vec::new();
    for (term, found) in reader.lookup_text(&args.term)? {
        let lookup = match found {
            Some((entry, postings)) => {
                let mut views = Vec::with_capacity(postings.len().min(args.limit));
                for posting in postings.into_iter().take(args.limit) {
                    let snippet = reader
                        .document(posting.doc_id)?
                        .map(|doc| doc.snippet.clone());
                    views.push(PostingView {
                        doc_id: posting.doc_id,
                        term_frequency: posting.term_frequency,
                        positions: posting.positions,
                        snippet,
                    });
                }
                TermLookup {
                    term,
                    term_id: Some(entry.term_id),
                    doc_frequency: entry.doc_frequency,
                    postings: views,
                }
            }
            None => TermLookup {
                term,
                term_id: None,
                doc_frequency: 0,
                postings: Vec::new(),
            },
        };
        terms.push(lookup);
    }

    output_result(
        &LookupResults {
            query: args.term.clone(),
            terms,
        },
        cli_args,
    )
}

/// Show index statistics.
fn show_stats(args: &StatsArgs, cli_args: &CreaseArgs) -> Result<()> {
    let reader = IndexReader::open(&args.index)?;
    let size = directory_size(reader.dir())?;

    output_result(
        &IndexStats::new(
            reader.dir().display().to_string(),
            reader.manifest(),
            size,
            args.barrels,
        ),
        cli_args,
    )
}

fn directory_size(dir: &Path) -> Result<u64> {
    let mut total = 0;
    for entry in fs::read_dir(dir)? {
        let metadata = entry?.metadata()?;
        if metadata.is_file() {
            total += metadata.len();
        }
    }
    Ok(total)
}
