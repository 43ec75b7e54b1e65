//! Command line argument parsing using clap.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};

/// Crease - batch index builder for ball-by-ball cricket commentary
#[derive(Parser, Debug, Clone)]
#[command(name = "crease")]
#[command(about = "Build and inspect barrel-partitioned inverted indexes over ball-by-ball records")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(long_about = None)]
pub struct CreaseArgs {
    /// Verbosity level (repeat for more: -v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (overrides verbose)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Output format
    #[arg(short = 'f', long = "format", default_value = "human", global = true)]
    pub output_format: OutputFormat,

    /// Pretty-print JSON output
    #[arg(long, global = true)]
    pub pretty: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

impl CreaseArgs {
    /// Get the effective verbosity level
    pub fn verbosity(&self) -> u8 {
        if self.quiet {
            0
        } else {
            self.verbose.saturating_add(1)
        }
    }
}

/// Available CLI commands
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Build an index from a CSV file
    Build(BuildArgs),

    /// Look up the postings of a term
    Lookup(LookupArgs),

    /// Show index statistics
    Stats(StatsArgs),
}

/// Arguments for building an index
#[derive(Parser, Debug, Clone)]
pub struct BuildArgs {
    /// Input CSV file with a header row
    #[arg(value_name = "CSV")]
    pub input: PathBuf,

    /// Output directory; the index is published as OUTPUT/current
    #[arg(value_name = "OUTPUT")]
    pub output: PathBuf,

    /// Build configuration file (JSON)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Terms per barrel
    #[arg(long, value_name = "N")]
    pub capacity: Option<u32>,

    /// Abort on the first malformed record
    #[arg(long)]
    pub strict: bool,

    /// Read at most N records
    #[arg(long, value_name = "N")]
    pub max_records: Option<usize>,

    /// Worker threads (default: one per CPU)
    #[arg(short = 't', long, value_name = "N", env = "CREASE_THREADS")]
    pub threads: Option<usize>,

    /// Drop common English stop words
    #[arg(long)]
    pub stop_words: bool,

    /// Minimum token length in characters
    #[arg(long, value_name = "N")]
    pub min_token_len: Option<usize>,

    /// Remove staging directories left by interrupted builds first
    #[arg(long)]
    pub clean: bool,
}

/// Arguments for looking up a term
#[derive(Parser, Debug, Clone)]
pub struct LookupArgs {
    /// Index directory (the build OUTPUT or its `current` directory)
    #[arg(value_name = "INDEX")]
    pub index: PathBuf,

    /// Term to look up; normalized the same way documents are
    #[arg(value_name = "TERM")]
    pub term: String,

    /// Maximum number of postings to show per term
    #[arg(short, long, default_value = "10")]
    pub limit: usize,
}

/// Arguments for showing statistics
#[derive(Parser, Debug, Clone)]
pub struct StatsArgs {
    /// Index directory (the build OUTPUT or its `current` directory)
    #[arg(value_name = "INDEX")]
    pub index: PathBuf,

    /// Also list every barrel
    #[arg(long)]
    pub barrels: bool,
}

/// Output formats
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable output
    Human,
    /// JSON output
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_args() {
        let args = CreaseArgs::try_parse_from([
            "crease",
            "build",
            "ipl.csv",
            "out",
            "--capacity",
            "100",
            "--strict",
            "--max-records",
            "500",
        ])
        .unwrap();

        let Command::Build(build) = args.command else {
            panic!("expected build");
        };
        assert_eq!(build.input, PathBuf::from("ipl.csv"));
        assert_eq!(build.output, PathBuf::from("out"));
        assert_eq!(build.capacity, Some(100));
        assert!(build.strict);
        assert_eq!(build.max_records, Some(500));
        assert!(build.config.is_none());
    }

    #[test]
    fn test_lookup_args() {
        let args =
            CreaseArgs::try_parse_from(["crease", "-f", "json", "lookup", "out", "Kohli"]).unwrap();

        assert_eq!(args.output_format, OutputFormat::Json);
        let Command::Lookup(lookup) = args.command else {
            panic!("expected lookup");
        };
        assert_eq!(lookup.term, "Kohli");
        assert_eq!(lookup.limit, 10);
    }

    #[test]
    fn test_verbosity() {
        let args = CreaseArgs::try_parse_from(["crease", "stats", "out"]).unwrap();
        assert_eq!(args.verbosity(), 1);

        let args = CreaseArgs::try_parse_from(["crease", "-vv", "stats", "out"]).unwrap();
        assert_eq!(args.verbosity(), 3);

        let args = CreaseArgs::try_parse_from(["crease", "stats", "out", "-q", "-v"]).unwrap();
        assert_eq!(args.verbosity(), 0);
    }

    #[test]
    fn test_missing_arguments() {
        assert!(CreaseArgs::try_parse_from(["crease", "build", "ipl.csv"]).is_err());
        assert!(CreaseArgs::try_parse_from(["crease", "lookup", "out"]).is_err());
    }
}
