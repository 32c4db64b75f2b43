use indicatif::ProgressBar;
use std::path::Path;
use tracing::{info, trace};

use crate::analysis::{top_genes, BuildStats, GeneAggregator};
use crate::config::BuildConfig;
use crate::error::Result;
use crate::parsers::variant_summary::parse_record;
use crate::parsers::{Classification, FactExtractor, LofClassifier, RecordScanner};
use crate::types::GeneIndex;

/// Finished, finalized index together with the counters of its build
#[derive(Debug)]
pub struct BuildOutcome {
    pub index: GeneIndex,
    pub stats: BuildStats,
}

/// Scan -> classify -> extract -> aggregate -> derive, in one pass
pub struct IndexBuilder {
    config: BuildConfig,
    classifier: LofClassifier,
    extractor: FactExtractor,
    progress: ProgressBar,
}

impl IndexBuilder {
    pub fn new(config: BuildConfig) -> Result<Self> {
        let config = config.validated()?;
        let classifier = LofClassifier::new(&config.heuristics);
        let extractor = FactExtractor::new(&config.heuristics)?;
        Ok(Self {
            config,
            classifier,
            extractor,
            progress: ProgressBar::hidden(),
        })
    }

    /// Report scan progress on `progress` instead of a hidden bar
    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = progress;
        self
    }

    pub fn config(&self) -> &BuildConfig {
        &self.config
    }

    pub fn build(&self, input: &Path) -> Result<BuildOutcome> {
        let scanner = RecordScanner::open(input)?;
        info!("Scanning {}", input.display());
        self.build_from_scanner(scanner)
    }

    pub fn build_from_scanner(&self, scanner: RecordScanner) -> Result<BuildOutcome> {
        let mut aggregator = GeneAggregator::new();
        let mut stats = BuildStats::default();

        for (i, line) in scanner.enumerate() {
            let line = line?;
            let line_number = i as u64 + 1;
            stats.lines_scanned = line_number;

            if line_number % self.config.progress_interval == 0 {
                self.progress.set_message(format!(
                    "{} lines | {} genes | {} variants",
                    line_number,
                    aggregator.gene_count(),
                    stats.qualifying_variants
                ));
                self.progress.tick();
            }

            let record = match parse_record(&line, line_number) {
                Ok(record) => record,
                Err(e) if !e.is_terminal() => {
                    trace!("{}", e);
                    stats.malformed_lines += 1;
                    continue;
                }
                Err(e) => return Err(e),
            };

            match self.classifier.classify(&record) {
                Classification::Qualifies => {}
                Classification::NotPathogenic => {
                    stats.not_pathogenic += 1;
                    continue;
                }
                Classification::NotLossOfFunction => {
                    stats.not_loss_of_function += 1;
                    continue;
                }
            }

            let facts = self.extractor.extract(&record.name);
            aggregator.add(record, facts);
            stats.qualifying_variants += 1;
        }

        info!(
            "Scanned {} lines: {} genes, {} pathogenic LOF variants",
            stats.lines_scanned,
            aggregator.gene_count(),
            stats.qualifying_variants
        );

        stats.positions_recorded = aggregator.positions_recorded();
        stats.exons_recorded = aggregator.exons_recorded();

        let index = aggregator.finalize();
        info!("Calculated truncated region counts for {} genes", index.len());

        stats.total_genes = index.len();
        stats.top_genes = top_genes(&index, self.config.top_genes);

        Ok(BuildOutcome { index, stats })
    }
}
