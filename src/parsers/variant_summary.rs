use crate::config::LofHeuristics;
use crate::error::{IndexError, Result};
use crate::types::VariantRecord;

/// Fixed column positions of the ClinVar variant_summary schema (0-based)
pub struct VariantSummaryColumns;

impl VariantSummaryColumns {
    pub const NAME: usize = 2;
    pub const GENE_SYMBOL: usize = 4;
    pub const CLINICAL_SIGNIFICANCE: usize = 6;
    /// Lines with fewer fields are malformed
    pub const MIN_FIELDS: usize = 35;
}

/// Parse one raw data line into a record.
///
/// Surrounding whitespace (including the line terminator) is trimmed before
/// splitting on tabs.
pub fn parse_record(line: &str, line_number: u64) -> Result<VariantRecord> {
    let fields: Vec<&str> = line.trim().split('\t').collect();
    if fields.len() < VariantSummaryColumns::MIN_FIELDS {
        return Err(IndexError::MalformedRecord {
            line: line_number,
            reason: format!(
                "expected at least {} fields, found {}",
                VariantSummaryColumns::MIN_FIELDS,
                fields.len()
            ),
        });
    }

    Ok(VariantRecord {
        gene_symbol: fields[VariantSummaryColumns::GENE_SYMBOL].to_string(),
        clinical_significance: fields[VariantSummaryColumns::CLINICAL_SIGNIFICANCE].to_string(),
        name: fields[VariantSummaryColumns::NAME].to_string(),
    })
}

/// Outcome of running a record through the classification filter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// Pathogenic loss-of-function variant
    Qualifies,
    /// Not pathogenic, or flagged as conflicting
    NotPathogenic,
    /// Pathogenic, but the name carries no LOF keyword
    NotLossOfFunction,
}

/// Decides whether a record is a pathogenic LOF variant
#[derive(Debug, Clone)]
pub struct LofClassifier {
    required_significance: String,
    excluded_significance: Vec<String>,
    lof_keywords: Vec<String>,
}

impl LofClassifier {
    /// Expects heuristics that went through [`LofHeuristics::normalized`]
    pub fn new(heuristics: &LofHeuristics) -> Self {
        Self {
            required_significance: heuristics.required_significance.clone(),
            excluded_significance: heuristics.excluded_significance.clone(),
            lof_keywords: heuristics.lof_keywords.clone(),
        }
    }

    pub fn classify(&self, record: &VariantRecord) -> Classification {
        if !self.is_pathogenic(&record.clinical_significance) {
            return Classification::NotPathogenic;
        }
        if !self.is_loss_of_function(&record.name) {
            return Classification::NotLossOfFunction;
        }
        Classification::Qualifies
    }

    pub fn is_pathogenic(&self, clinical_significance: &str) -> bool {
        let significance = clinical_significance.to_lowercase();
        significance.contains(&self.required_significance)
            && !self
                .excluded_significance
                .iter()
                .any(|excluded| significance.contains(excluded.as_str()))
    }

    pub fn is_loss_of_function(&self, name: &str) -> bool {
        let name = name.to_lowercase();
        self.lof_keywords
            .iter()
            .any(|keyword| name.contains(keyword.as_str()))
    }
}

impl Default for LofClassifier {
    fn default() -> Self {
        Self::new(&LofHeuristics::default())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Build a 35-column variant_summary line with the load-bearing fields set
    pub(crate) fn summary_line(gene: &str, significance: &str, name: &str) -> String {
        let mut fields = vec!["na".to_string(); VariantSummaryColumns::MIN_FIELDS];
        fields[VariantSummaryColumns::NAME] = name.to_string();
        fields[VariantSummaryColumns::GENE_SYMBOL] = gene.to_string();
        fields[VariantSummaryColumns::CLINICAL_SIGNIFICANCE] = significance.to_string();
        format!("{}\n", fields.join("\t"))
    }

    fn record(significance: &str, name: &str) -> VariantRecord {
        VariantRecord {
            gene_symbol: "BRCA1".to_string(),
            clinical_significance: significance.to_string(),
            name: name.to_string(),
        }
    }

    #[test]
    fn test_parse_record_uses_fixed_columns() {
        let line = summary_line("BRCA1", "Pathogenic", "NM_007294.4(BRCA1):c.68_69del (p.Glu23fs)");
        let record = parse_record(&line, 1).unwrap();
        assert_eq!(record.gene_symbol, "BRCA1");
        assert_eq!(record.clinical_significance, "Pathogenic");
        assert_eq!(record.name, "NM_007294.4(BRCA1):c.68_69del (p.Glu23fs)");
    }

    #[test]
    fn test_short_line_is_malformed() {
        let line = "1\tdeletion\tname\t672\tBRCA1\t-\tPathogenic\n";
        match parse_record(line, 42) {
            Err(IndexError::MalformedRecord { line, reason }) => {
                assert_eq!(line, 42);
                assert!(reason.contains("found 7"));
            }
            other => panic!("expected malformed record, got {:?}", other),
        }
    }

    #[test]
    fn test_trailing_empty_fields_are_trimmed() {
        // 34 real fields plus a trailing tab is still too short after trimming
        let fields = vec!["x"; 34].join("\t");
        assert!(parse_record(&format!("{}\t\n", fields), 1).is_err());
    }

    #[test]
    fn test_pathogenic_frameshift_qualifies() {
        let classifier = LofClassifier::default();
        assert_eq!(
            classifier.classify(&record("Pathogenic", "c.100delA frameshift")),
            Classification::Qualifies
        );
        assert_eq!(
            classifier.classify(&record("Likely pathogenic", "NM_000059.4:c.9097dup (p.Thr3033fs)")),
            Classification::Qualifies
        );
    }

    #[test]
    fn test_conflicting_is_excluded_regardless_of_name() {
        let classifier = LofClassifier::default();
        assert_eq!(
            classifier.classify(&record(
                "Pathogenic/Likely_pathogenic, Conflicting",
                "c.100delA frameshift nonsense"
            )),
            Classification::NotPathogenic
        );
        assert_eq!(
            classifier.classify(&record("Conflicting interpretations of pathogenicity", "p.Arg714Ter")),
            Classification::NotPathogenic
        );
    }

    #[test]
    fn test_benign_and_missense() {
        let classifier = LofClassifier::default();
        assert_eq!(
            classifier.classify(&record("Benign", "p.Arg714Ter")),
            Classification::NotPathogenic
        );
        assert_eq!(
            classifier.classify(&record("Pathogenic", "NM_000546.6:c.743G>A (p.Arg248Gln)")),
            Classification::NotLossOfFunction
        );
    }

    #[test]
    fn test_keyword_match_is_case_insensitive() {
        let classifier = LofClassifier::default();
        assert!(classifier.is_loss_of_function("SPLICE DONOR"));
        assert!(classifier.is_loss_of_function("p.Arg714TER"));
        assert!(!classifier.is_loss_of_function("p.Gly12Asp"));
        assert!(classifier.is_pathogenic("PATHOGENIC"));
    }
}
