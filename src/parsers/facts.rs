use regex::Regex;
use tracing::debug;

use crate::config::{compile_capture_pattern, LofHeuristics};
use crate::error::Result;
use crate::types::VariantFacts;

/// Pulls exon numbers and protein positions out of ClinVar variant names
#[derive(Debug, Clone)]
pub struct FactExtractor {
    exon: Regex,
    protein: Vec<Regex>,
}

impl FactExtractor {
    pub fn new(heuristics: &LofHeuristics) -> Result<Self> {
        let exon = compile_capture_pattern(&heuristics.exon_pattern)?;
        let protein = heuristics
            .protein_patterns
            .iter()
            .map(|p| compile_capture_pattern(p))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { exon, protein })
    }

    pub fn extract(&self, name: &str) -> VariantFacts {
        VariantFacts {
            exon: self.exon_number(name),
            protein_position: self.protein_position(name),
        }
    }

    /// First "exon N" in the name, if any
    pub fn exon_number(&self, name: &str) -> Option<u32> {
        let digits = self.exon.captures(name)?.get(1)?.as_str();
        parse_fact("exon", digits, name)
    }

    /// Position from the first protein pattern that matches
    pub fn protein_position(&self, name: &str) -> Option<u32> {
        let digits = self
            .protein
            .iter()
            .find_map(|re| re.captures(name).and_then(|c| c.get(1)))?
            .as_str();
        parse_fact("protein position", digits, name)
    }
}

fn parse_fact(kind: &str, digits: &str, name: &str) -> Option<u32> {
    match digits.parse::<u32>() {
        Ok(value) => Some(value),
        Err(e) => {
            debug!("Skipping {} {:?} in {:?}: {}", kind, digits, name, e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extractor() -> FactExtractor {
        FactExtractor::new(&LofHeuristics::default()).unwrap()
    }

    #[test]
    fn test_three_letter_protein_position() {
        let facts = extractor().extract("NM_000000.1:c.100G>A (p.Arg714Ter)");
        assert_eq!(facts.protein_position, Some(714));
        assert_eq!(facts.exon, None);
    }

    #[test]
    fn test_single_letter_fallback() {
        let extractor = extractor();
        assert_eq!(extractor.protein_position("p.Q918Tfs*24"), Some(918));
        assert_eq!(extractor.protein_position("c.2140C>T (p.R714*)"), Some(714));
    }

    #[test]
    fn test_three_letter_pattern_wins_over_fallback() {
        // Both patterns can match here; the three-letter one comes first
        let extractor = extractor();
        assert_eq!(
            extractor.protein_position("p.R12* and p.Gln918Ter"),
            Some(918)
        );
    }

    #[test]
    fn test_no_protein_notation() {
        let extractor = extractor();
        assert_eq!(extractor.protein_position("NC_000017.11:g.43045712del"), None);
        assert_eq!(extractor.protein_position("c.5266dupC (P.Q1756fs)"), None);
        assert_eq!(extractor.protein_position("p.?"), None);
    }

    #[test]
    fn test_exon_variants() {
        let extractor = extractor();
        assert_eq!(extractor.exon_number("deletion of exon 5"), Some(5));
        assert_eq!(extractor.exon_number("EXON:12 duplication"), Some(12));
        assert_eq!(extractor.exon_number("exon7del"), Some(7));
        assert_eq!(extractor.exon_number("exons 3-4 del"), None);
        assert_eq!(extractor.exon_number("exon 2 and exon 9"), Some(2));
    }

    #[test]
    fn test_overflowing_capture_is_omitted() {
        let extractor = extractor();
        let facts = extractor.extract("exon 99999999999 (p.Arg99999999999Ter)");
        assert_eq!(facts, VariantFacts::default());
    }

    #[test]
    fn test_both_facts() {
        let facts = extractor().extract("GRCh38 exon 11 c.3756_3759del (p.Ser1253fs)");
        assert_eq!(facts.exon, Some(11));
        assert_eq!(facts.protein_position, Some(1253));
    }
}
