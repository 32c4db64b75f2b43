use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::{IndexError, Result};

pub const DEFAULT_LOF_KEYWORDS: [&str; 10] = [
    "nonsense",
    "frameshift",
    "splice",
    "stop",
    "ter",
    "fs",
    "deletion",
    "truncat",
    "del",
    "dup",
];

pub const DEFAULT_EXON_PATTERN: &str = r"(?i)exon[\s:]*(\d+)";

/// Three-letter amino acid notation (p.Arg714Ter) is tried before the
/// single-letter fallback (p.R714*, p.Q918Tfs*24). Order decides which
/// position is recorded for ambiguous names.
pub const DEFAULT_PROTEIN_PATTERNS: [&str; 2] = [r"p\.[A-Z][a-z]{2}(\d+)", r"p\.[A-Z](\d+)"];

/// Classification and extraction rules, kept as data so they can be
/// overridden from a config file and tested on their own.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LofHeuristics {
    /// Substring the clinical significance must contain (case-insensitive)
    pub required_significance: String,
    /// Substrings that disqualify a clinical significance (case-insensitive)
    pub excluded_significance: Vec<String>,
    /// Any of these in the variant name marks it as loss-of-function
    pub lof_keywords: Vec<String>,
    pub exon_pattern: String,
    /// Tried in order, first match wins
    pub protein_patterns: Vec<String>,
}

impl Default for LofHeuristics {
    fn default() -> Self {
        Self {
            required_significance: "pathogenic".to_string(),
            excluded_significance: vec!["conflicting".to_string()],
            lof_keywords: DEFAULT_LOF_KEYWORDS.iter().map(|k| k.to_string()).collect(),
            exon_pattern: DEFAULT_EXON_PATTERN.to_string(),
            protein_patterns: DEFAULT_PROTEIN_PATTERNS
                .iter()
                .map(|p| p.to_string())
                .collect(),
        }
    }
}

impl LofHeuristics {
    /// Lower-cases the text matchers and checks that every pattern compiles
    /// with a capture group.
    pub fn normalized(mut self) -> Result<Self> {
        self.required_significance = self.required_significance.to_lowercase();
        self.excluded_significance = self
            .excluded_significance
            .iter()
            .map(|s| s.to_lowercase())
            .collect();
        self.lof_keywords = self
            .lof_keywords
            .iter()
            .map(|k| k.trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .collect();

        if self.required_significance.is_empty() {
            return Err(IndexError::InvalidConfig(
                "required_significance must not be empty".to_string(),
            ));
        }
        if self.lof_keywords.is_empty() {
            return Err(IndexError::InvalidConfig(
                "lof_keywords must contain at least one keyword".to_string(),
            ));
        }
        if self.protein_patterns.is_empty() {
            return Err(IndexError::InvalidConfig(
                "protein_patterns must contain at least one pattern".to_string(),
            ));
        }

        compile_capture_pattern(&self.exon_pattern)?;
        for pattern in &self.protein_patterns {
            compile_capture_pattern(pattern)?;
        }

        Ok(self)
    }
}

/// Compile a fact pattern, requiring at least one capture group for the digits
pub(crate) fn compile_capture_pattern(pattern: &str) -> Result<Regex> {
    let regex = Regex::new(pattern)
        .map_err(|e| IndexError::InvalidConfig(format!("bad pattern {:?}: {}", pattern, e)))?;
    if regex.captures_len() < 2 {
        return Err(IndexError::InvalidConfig(format!(
            "pattern {:?} has no capture group",
            pattern
        )));
    }
    Ok(regex)
}

/// Settings for one index build
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BuildConfig {
    pub heuristics: LofHeuristics,
    /// Data lines between progress updates
    pub progress_interval: u64,
    /// Number of genes reported in the build summary
    pub top_genes: usize,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            heuristics: LofHeuristics::default(),
            progress_interval: 500_000,
            top_genes: 10,
        }
    }
}

impl BuildConfig {
    /// Load a config from a TOML file; missing keys fall back to defaults
    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|source| IndexError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: BuildConfig =
            toml::from_str(text).map_err(|e| IndexError::InvalidConfig(e.to_string()))?;
        config.validated()
    }

    pub fn validated(mut self) -> Result<Self> {
        self.heuristics = self.heuristics.normalized()?;
        if self.progress_interval == 0 {
            return Err(IndexError::InvalidConfig(
                "progress_interval must be greater than zero".to_string(),
            ));
        }
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_heuristics_keep_keyword_order() {
        let heuristics = LofHeuristics::default();
        assert_eq!(heuristics.lof_keywords.len(), 10);
        assert_eq!(heuristics.lof_keywords[0], "nonsense");
        assert_eq!(heuristics.lof_keywords[9], "dup");
        assert_eq!(heuristics.protein_patterns[0], r"p\.[A-Z][a-z]{2}(\d+)");
        assert!(heuristics.normalized().is_ok());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = BuildConfig::from_toml_str(
            r#"
top_genes = 3

[heuristics]
lof_keywords = ["Nonsense", " FRAMESHIFT "]
"#,
        )
        .unwrap();

        assert_eq!(config.top_genes, 3);
        assert_eq!(config.progress_interval, 500_000);
        assert_eq!(config.heuristics.lof_keywords, vec!["nonsense", "frameshift"]);
        assert_eq!(config.heuristics.required_significance, "pathogenic");
    }

    #[test]
    fn test_pattern_without_capture_is_rejected() {
        let result = BuildConfig::from_toml_str(
            r#"
[heuristics]
protein_patterns = ['p\.[A-Z]\d+']
"#,
        );
        assert!(matches!(result, Err(IndexError::InvalidConfig(_))));
    }

    #[test]
    fn test_zero_progress_interval_is_rejected() {
        let result = BuildConfig::from_toml_str("progress_interval = 0");
        assert!(matches!(result, Err(IndexError::InvalidConfig(_))));
    }
}
