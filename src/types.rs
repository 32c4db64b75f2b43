use hashbrown::HashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One scanned line of variant_summary, reduced to the fields the index uses.
/// Dropped once its facts have been aggregated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantRecord {
    pub gene_symbol: String,
    pub clinical_significance: String,
    pub name: String,
}

/// Structured facts pulled out of a free-text variant name
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VariantFacts {
    pub exon: Option<u32>,
    pub protein_position: Option<u32>,
}

/// Aggregated pathogenic LOF variants for one gene
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct GeneEntry {
    pub symbol: String,
    /// Exon number -> number of variants annotated with it
    pub exon_counts: BTreeMap<u32, usize>,
    /// Protein positions in scan order, duplicates kept
    pub positions: Vec<u32>,
    pub variant_names: Vec<String>,
    /// Distinct position P -> number of entries in `positions` that are >= P.
    /// Filled in once scanning is finished.
    pub truncated_counts: BTreeMap<u32, usize>,
}

impl GeneEntry {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            ..Default::default()
        }
    }

    /// Number of qualifying variants recorded for this gene
    pub fn variant_count(&self) -> usize {
        self.variant_names.len()
    }

    /// Number of variants that carried an exon annotation
    pub fn exon_annotated(&self) -> usize {
        self.exon_counts.values().sum()
    }

    pub fn exon_count(&self, exon: u32) -> usize {
        self.exon_counts.get(&exon).copied().unwrap_or(0)
    }

    /// Number of recorded positions at or beyond `position`.
    ///
    /// Works for any position, recorded or not: the answer equals the count
    /// stored for the smallest recorded position that is >= `position`.
    pub fn truncated_at_or_beyond(&self, position: u32) -> usize {
        self.truncated_counts
            .range(position..)
            .next()
            .map(|(_, count)| *count)
            .unwrap_or(0)
    }

    pub fn min_position(&self) -> Option<u32> {
        self.truncated_counts.keys().next().copied()
    }

    pub fn max_position(&self) -> Option<u32> {
        self.truncated_counts.keys().next_back().copied()
    }
}

/// Gene symbol -> aggregated entry, kept in first-encountered order so the
/// serialized artifact is deterministic.
#[derive(Debug, Clone, Default)]
pub struct GeneIndex {
    entries: Vec<GeneEntry>,
    lookup: HashMap<String, usize>,
}

impl GeneIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn from_entries(entries: Vec<GeneEntry>) -> Self {
        let lookup = entries
            .iter()
            .enumerate()
            .map(|(i, entry)| (entry.symbol.clone(), i))
            .collect();
        Self { entries, lookup }
    }

    pub fn get(&self, symbol: &str) -> Option<&GeneEntry> {
        self.lookup.get(symbol).map(|&i| &self.entries[i])
    }

    /// Entry for `symbol`, created empty on first use
    pub(crate) fn entry_mut(&mut self, symbol: &str) -> &mut GeneEntry {
        let idx = match self.lookup.get(symbol) {
            Some(&idx) => idx,
            None => {
                let idx = self.entries.len();
                self.entries.push(GeneEntry::new(symbol));
                self.lookup.insert(symbol.to_string(), idx);
                idx
            }
        };
        &mut self.entries[idx]
    }

    pub(crate) fn entries_mut(&mut self) -> impl Iterator<Item = &mut GeneEntry> {
        self.entries.iter_mut()
    }

    pub fn iter(&self) -> impl Iterator<Item = &GeneEntry> {
        self.entries.iter()
    }

    pub fn entries(&self) -> &[GeneEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn total_variants(&self) -> usize {
        self.entries.iter().map(GeneEntry::variant_count).sum()
    }
}
