//! # ClinVar LOF Index
//!
//! Builds a per-gene index of pathogenic loss-of-function variants from a
//! ClinVar `variant_summary.txt.gz` dump, for fast PVS1-style lookups.
//!
//! ## Features
//!
//! - Single streaming pass over gzip, bzip2, xz or plain input
//! - Keyword and pattern heuristics kept as configuration data
//! - Exon histograms and protein positions per gene
//! - Precomputed "variants at or beyond position P" counts for range queries
//! - Atomic binary index artifact, reloadable for queries
//! - JSON build summary and TSV gene table

pub mod analysis;
pub mod builder;
pub mod config;
pub mod error;
pub mod output;
pub mod parsers;
pub mod types;

// Re-export key types
pub use analysis::{truncated_counts, BuildStats, GeneAggregator, GeneSummary};
pub use builder::{BuildOutcome, IndexBuilder};
pub use config::{BuildConfig, LofHeuristics};
pub use error::{IndexError, Result};
pub use output::{default_index_path, write_gene_table, BuildReport, IndexWriter};
pub use parsers::{Classification, FactExtractor, LofClassifier, RecordScanner};
pub use types::*;
