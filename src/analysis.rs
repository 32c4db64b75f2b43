use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::types::{GeneEntry, GeneIndex, VariantFacts, VariantRecord};

/// Single writer for [`GeneIndex`] during the scan phase
#[derive(Debug, Default)]
pub struct GeneAggregator {
    index: GeneIndex,
    positions_recorded: usize,
    exons_recorded: usize,
}

impl GeneAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one qualifying record into its gene's entry
    pub fn add(&mut self, record: VariantRecord, facts: VariantFacts) {
        let entry = self.index.entry_mut(&record.gene_symbol);

        if let Some(exon) = facts.exon {
            *entry.exon_counts.entry(exon).or_insert(0) += 1;
            self.exons_recorded += 1;
        }
        if let Some(position) = facts.protein_position {
            entry.positions.push(position);
            self.positions_recorded += 1;
        }
        entry.variant_names.push(record.name);
    }

    pub fn gene_count(&self) -> usize {
        self.index.len()
    }

    pub fn positions_recorded(&self) -> usize {
        self.positions_recorded
    }

    pub fn exons_recorded(&self) -> usize {
        self.exons_recorded
    }

    /// Derive range counts for every gene and hand over the finished index
    pub fn finalize(mut self) -> GeneIndex {
        for entry in self.index.entries_mut() {
            entry.truncated_counts = truncated_counts(&entry.positions);
        }
        self.index
    }
}

/// Map each distinct position P to the number of positions >= P.
///
/// Sorts a copy and walks it from the top, so each distinct value is keyed
/// by the suffix length starting at its first occurrence.
pub fn truncated_counts(positions: &[u32]) -> BTreeMap<u32, usize> {
    let mut sorted = positions.to_vec();
    sorted.sort_unstable();

    let n = sorted.len();
    let mut counts = BTreeMap::new();
    for i in (0..n).rev() {
        if i == 0 || sorted[i - 1] != sorted[i] {
            counts.insert(sorted[i], n - i);
        }
    }
    counts
}

/// Per-gene line of the build summary
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GeneSummary {
    pub symbol: String,
    pub variants: usize,
    pub exon_annotated: usize,
}

impl From<&GeneEntry> for GeneSummary {
    fn from(entry: &GeneEntry) -> Self {
        Self {
            symbol: entry.symbol.clone(),
            variants: entry.variant_count(),
            exon_annotated: entry.exon_annotated(),
        }
    }
}

/// Genes with the most qualifying variants; ties keep first-encountered order
pub fn top_genes(index: &GeneIndex, limit: usize) -> Vec<GeneSummary> {
    let mut ranked: Vec<&GeneEntry> = index.iter().collect();
    // stable sort keeps index order among equal counts
    ranked.sort_by(|a, b| b.variant_count().cmp(&a.variant_count()));
    ranked.into_iter().take(limit).map(GeneSummary::from).collect()
}

/// Counters collected over one build
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct BuildStats {
    /// Data lines read, header excluded
    pub lines_scanned: u64,
    pub malformed_lines: u64,
    pub not_pathogenic: u64,
    pub not_loss_of_function: u64,
    pub qualifying_variants: u64,
    pub positions_recorded: usize,
    pub exons_recorded: usize,
    pub total_genes: usize,
    pub top_genes: Vec<GeneSummary>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn brute_force(positions: &[u32]) -> BTreeMap<u32, usize> {
        positions
            .iter()
            .map(|&p| (p, positions.iter().filter(|&&q| q >= p).count()))
            .collect()
    }

    fn record(gene: &str, name: &str) -> VariantRecord {
        VariantRecord {
            gene_symbol: gene.to_string(),
            clinical_significance: "Pathogenic".to_string(),
            name: name.to_string(),
        }
    }

    #[test]
    fn test_truncated_counts_match_brute_force() {
        let cases: Vec<Vec<u32>> = vec![
            vec![],
            vec![7],
            vec![714, 918, 12, 714, 5, 918, 918],
            vec![3, 3, 3, 3],
            (0..500).map(|i| (i * 7919 % 1013) as u32 + 1).collect(),
        ];

        for positions in cases {
            let counts = truncated_counts(&positions);
            assert_eq!(counts, brute_force(&positions));

            if let Some(min) = positions.iter().min() {
                assert_eq!(counts[min], positions.len());
            }
            let values: Vec<usize> = counts.values().copied().collect();
            assert!(values.windows(2).all(|w| w[0] >= w[1]));
        }
    }

    #[test]
    fn test_aggregator_updates_histogram_positions_and_names() {
        let mut aggregator = GeneAggregator::new();
        aggregator.add(
            record("BRCA1", "exon 11 (p.Arg714Ter)"),
            VariantFacts {
                exon: Some(11),
                protein_position: Some(714),
            },
        );
        aggregator.add(
            record("BRCA1", "exon 11 deletion"),
            VariantFacts {
                exon: Some(11),
                protein_position: None,
            },
        );
        aggregator.add(record("ATM", "splice donor"), VariantFacts::default());

        assert_eq!(aggregator.gene_count(), 2);
        assert_eq!(aggregator.positions_recorded(), 1);
        assert_eq!(aggregator.exons_recorded(), 2);

        let index = aggregator.finalize();
        let brca1 = index.get("BRCA1").unwrap();
        assert_eq!(brca1.exon_count(11), 2);
        assert_eq!(brca1.positions, vec![714]);
        assert_eq!(brca1.variant_names.len(), 2);
        assert_eq!(brca1.truncated_counts, BTreeMap::from([(714, 1)]));

        let atm = index.get("ATM").unwrap();
        assert_eq!(atm.variant_names, vec!["splice donor"]);
        assert!(atm.truncated_counts.is_empty());
    }

    #[test]
    fn test_top_genes_ties_keep_first_encountered_order() {
        let mut aggregator = GeneAggregator::new();
        for (gene, n) in [("B", 2), ("A", 3), ("C", 2), ("D", 1)] {
            for _ in 0..n {
                aggregator.add(record(gene, "del"), VariantFacts::default());
            }
        }
        let index = aggregator.finalize();

        let top: Vec<String> = top_genes(&index, 3).into_iter().map(|g| g.symbol).collect();
        assert_eq!(top, vec!["A", "B", "C"]);
        assert_eq!(top_genes(&index, 10).len(), 4);
    }
}
