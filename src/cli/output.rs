//! Output formatting for CLI commands.

use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

use crate::barrel::manifest::{BarrelEntry, BarrelManifest};
use crate::cli::args::{CreaseArgs, OutputFormat};
use crate::error::Result;
use crate::pipeline::BuildReport;

/// Something a command prints.
pub trait HumanOutput {
    /// Render for a terminal.
    fn to_human(&self, verbosity: u8) -> String;
}

/// Result of the `build` command.
#[derive(Debug, Serialize, Deserialize)]
pub struct BuildSummary {
    pub index_dir: String,
    pub records_read: u64,
    pub documents: u64,
    pub skipped: u64,
    pub terms: u64,
    pub postings: u64,
    pub barrels: u32,
    pub barrel_capacity: u32,
    pub bytes_written: u64,
    pub duration_ms: u64,
    pub skipped_records: Vec<(u64, String)>,
}

impl From<&BuildReport> for BuildSummary {
    fn from(report: &BuildReport) -> Self {
        BuildSummary {
            index_dir: report
                .index_dir
                .as_ref()
                .map(|dir| dir.display().to_string())
                .unwrap_or_default(),
            records_read: report.records_read,
            documents: report.documents,
            skipped: report.skipped.len() as u64,
            terms: report.term_count,
            postings: report.posting_count,
            barrels: report.barrel_count,
            barrel_capacity: report.barrel_capacity,
            bytes_written: report.bytes_written,
            duration_ms: report.total_ms(),
            skipped_records: report
                .skipped
                .iter()
                .map(|s| (s.index, s.reason.clone()))
                .collect(),
        }
    }
}

impl HumanOutput for BuildSummary {
    fn to_human(&self, verbosity: u8) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Index:      {}", self.index_dir);
        let _ = writeln!(
            out,
            "Documents:  {} of {} records ({} skipped)",
            self.documents, self.records_read, self.skipped
        );
        let _ = writeln!(out, "Terms:      {}", self.terms);
        let _ = writeln!(out, "Postings:   {}", self.postings);
        let _ = writeln!(
            out,
            "Barrels:    {} (capacity {})",
            self.barrels, self.barrel_capacity
        );
        let _ = writeln!(out, "Size:       {}", format_bytes(self.bytes_written));
        let _ = writeln!(out, "Time:       {} ms", self.duration_ms);

        if verbosity > 1 {
            for (index, reason) in &self.skipped_records {
                let _ = writeln!(out, "  skipped record {index}: {reason}");
            }
        }
        out
    }
}

/// One posting as shown by `lookup`.
#[derive(Debug, Serialize, Deserialize)]
pub struct PostingView {
    pub doc_id: u64,
    pub term_frequency: u32,
    pub positions: Vec<u32>,
    pub snippet: Option<String>,
}

/// Lookup result of one normalized term.
#[derive(Debug, Serialize, Deserialize)]
pub struct TermLookup {
    pub term: String,
    pub term_id: Option<u32>,
    pub doc_frequency: u32,
    pub postings: Vec<PostingView>,
}

/// Result of the `lookup` command.
#[derive(Debug, Serialize, Deserialize)]
pub struct LookupResults {
    pub query: String,
    pub terms: Vec<TermLookup>,
}

impl HumanOutput for LookupResults {
    fn to_human(&self, verbosity: u8) -> String {
        let mut out = String::new();
        if self.terms.is_empty() {
            let _ = writeln!(out, "`{}` has no indexable terms", self.query);
            return out;
        }

        for lookup in &self.terms {
            match lookup.term_id {
                None => {
                    let _ = writeln!(out, "{}: not found", lookup.term);
                }
                Some(term_id) => {
                    let _ = writeln!(
                        out,
                        "{} (term {term_id}): {} documents",
                        lookup.term, lookup.doc_frequency
                    );
                    for posting in &lookup.postings {
                        let _ = write!(
                            out,
                            "  doc {:>8}  tf {:>3}",
                            posting.doc_id, posting.term_frequency
                        );
                        if verbosity > 1 {
                            let _ = write!(out, "  positions {:?}", posting.positions);
                        }
                        if let Some(snippet) = &posting.snippet {
                            let _ = write!(out, "  {snippet}");
                        }
                        out.push('\n');
                    }
                    let hidden = (lookup.doc_frequency as usize).saturating_sub(lookup.postings.len());
                    if hidden > 0 {
                        let _ = writeln!(out, "  ... {hidden} more");
                    }
                }
            }
        }
        out
    }
}

/// Result of the `stats` command.
#[derive(Debug, Serialize, Deserialize)]
pub struct IndexStats {
    pub index_dir: String,
    pub version: u32,
    pub created_at: String,
    pub documents: u64,
    pub terms: u64,
    pub postings: u64,
    pub skipped_records: u64,
    pub barrel_capacity: u32,
    pub barrel_count: u32,
    pub index_size_bytes: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub barrels: Option<Vec<BarrelEntry>>,
}

impl IndexStats {
    pub fn new(index_dir: String, manifest: &BarrelManifest, index_size_bytes: u64, with_barrels: bool) -> Self {
        IndexStats {
            index_dir,
            version: manifest.version,
            created_at: manifest.created_at.to_rfc3339(),
            documents: manifest.doc_count,
            terms: manifest.term_count,
            postings: manifest.posting_count,
            skipped_records: manifest.skipped_records,
            barrel_capacity: manifest.barrel_capacity,
            barrel_count: manifest.barrel_count,
            index_size_bytes,
            barrels: with_barrels.then(|| manifest.barrels.clone()),
        }
    }
}

impl HumanOutput for IndexStats {
    fn to_human(&self, _verbosity: u8) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Index:      {}", self.index_dir);
        let _ = writeln!(out, "Created:    {}", self.created_at);
        let _ = writeln!(out, "Format:     v{}", self.version);
        let _ = writeln!(
            out,
            "Documents:  {} ({} records skipped)",
            self.documents, self.skipped_records
        );
        let _ = writeln!(out, "Terms:      {}", self.terms);
        let _ = writeln!(out, "Postings:   {}", self.postings);
        let _ = writeln!(
            out,
            "Barrels:    {} (capacity {})",
            self.barrel_count, self.barrel_capacity
        );
        let _ = writeln!(out, "Size:       {}", format_bytes(self.index_size_bytes));

        if let Some(barrels) = &self.barrels {
            for barrel in barrels {
                let _ = writeln!(
                    out,
                    "  {}  terms {:>8}..{:<8}  {:>9} postings  {}",
                    barrel.file,
                    barrel.low,
                    barrel.high,
                    barrel.postings,
                    format_bytes(barrel.bytes)
                );
            }
        }
        out
    }
}

/// Print a result in the selected format.
pub fn output_result<T>(result: &T, args: &CreaseArgs) -> Result<()>
where
    T: Serialize + HumanOutput,
{
    match args.output_format {
        OutputFormat::Human => {
            if args.verbosity() > 0 {
                print!("{}", result.to_human(args.verbosity()));
            }
        }
        OutputFormat::Json => {
            let json = if args.pretty {
                serde_json::to_string_pretty(result)?
            } else {
                serde_json::to_string(result)?
            };
            println!("{json}");
        }
    }
    Ok(())
}

/// Format a byte count with a binary unit.
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KiB", "MiB", "GiB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{value:.1} {}", UNITS[unit])
    }
}
