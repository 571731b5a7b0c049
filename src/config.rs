//! Comparison limits and tolerances.
//!
//! These values bound the combinatorial work done per locus. They are set
//! once per run and passed by reference to every worker.

/// Default cap on transcripts per side before clique enumeration is skipped.
pub const DEFAULT_MAX_TRANSCRIPTS: usize = 32;

/// Default cap on clique pairs per locus before comparison is skipped.
pub const DEFAULT_MAX_CLIQUE_PAIRS: usize = 1024;

/// Default tolerance for treating nucleotide identity as exactly 1.0.
pub const DEFAULT_TOLERANCE: f64 = 1e-6;

/// Configuration consumed by the clustering and comparison core.
#[derive(Debug, Clone, PartialEq)]
pub struct CompareConfig {
    /// Maximum transcripts on either side of a locus before maximal-clique
    /// enumeration is replaced by one clique per transcript (0 = no limit).
    pub max_transcripts_per_locus: usize,
    /// Maximum reference × prediction clique pairs per locus before the
    /// locus is reported as exceeding the comparison limit (0 = no limit).
    pub max_clique_pairs: usize,
    /// Identity within this distance of 1.0 counts as a perfect match.
    pub tolerance: f64,
    /// Keep rendered model vectors on reported pairs.
    pub model_vectors: bool,
}

impl Default for CompareConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl CompareConfig {
    pub fn new() -> Self {
        Self {
            max_transcripts_per_locus: DEFAULT_MAX_TRANSCRIPTS,
            max_clique_pairs: DEFAULT_MAX_CLIQUE_PAIRS,
            tolerance: DEFAULT_TOLERANCE,
            model_vectors: false,
        }
    }

    /// Set the transcript cap for clique enumeration.
    pub fn with_max_transcripts(mut self, n: usize) -> Self {
        self.max_transcripts_per_locus = n;
        self
    }

    /// Set the clique-pair cap per locus.
    pub fn with_max_clique_pairs(mut self, n: usize) -> Self {
        self.max_clique_pairs = n;
        self
    }

    /// Set the perfect-match tolerance.
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Keep model vectors on reported pairs.
    pub fn with_model_vectors(mut self, enabled: bool) -> Self {
        self.model_vectors = enabled;
        self
    }

    /// True if `n` transcripts exceed the enumeration cap.
    #[inline]
    pub fn exceeds_transcript_limit(&self, n: usize) -> bool {
        self.max_transcripts_per_locus != 0 && n > self.max_transcripts_per_locus
    }

    /// True if `n` clique pairs exceed the comparison cap.
    #[inline]
    pub fn exceeds_pair_limit(&self, n: usize) -> bool {
        self.max_clique_pairs != 0 && n > self.max_clique_pairs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CompareConfig::default();
        assert_eq!(config.max_transcripts_per_locus, DEFAULT_MAX_TRANSCRIPTS);
        assert_eq!(config.max_clique_pairs, DEFAULT_MAX_CLIQUE_PAIRS);
        assert!(!config.model_vectors);
    }

    #[test]
    fn test_zero_disables_limits() {
        let config = CompareConfig::new()
            .with_max_transcripts(0)
            .with_max_clique_pairs(0);
        assert!(!config.exceeds_transcript_limit(10_000));
        assert!(!config.exceeds_pair_limit(10_000));
    }

    #[test]
    fn test_pair_limit_is_strict() {
        let config = CompareConfig::new().with_max_clique_pairs(10);
        assert!(!config.exceeds_pair_limit(10));
        assert!(config.exceeds_pair_limit(11));
    }
}
