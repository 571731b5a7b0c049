//! Comparison statistics between a reference and a prediction clique.
//!
//! Every stored value is a non-negative count. Ratios are derived on demand
//! and are [`Ratio::Undefined`] whenever their denominator is zero, so that
//! run-wide figures can be recomputed from summed counts.

use crate::vector::{ModelVector, CODING, FIVE_PRIME_UTR, THREE_PRIME_UTR};
use std::cmp::Ordering;
use std::fmt;

/// A derived ratio, or the marker for a zero denominator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Ratio {
    Value(f64),
    Undefined,
}

impl Ratio {
    pub fn from_counts(numerator: u64, denominator: u64) -> Self {
        if denominator == 0 {
            Ratio::Undefined
        } else {
            Ratio::Value(numerator as f64 / denominator as f64)
        }
    }

    pub fn value(&self) -> Option<f64> {
        match self {
            Ratio::Value(v) => Some(*v),
            Ratio::Undefined => None,
        }
    }

    pub fn is_defined(&self) -> bool {
        matches!(self, Ratio::Value(_))
    }

    /// `1 - self`, clamped to `[0, 1]`.
    pub fn complement(&self) -> Self {
        match self {
            Ratio::Value(v) => Ratio::Value((1.0 - v).clamp(0.0, 1.0)),
            Ratio::Undefined => Ratio::Undefined,
        }
    }

    /// Total order with undefined below every value.
    pub fn total_cmp(&self, other: &Ratio) -> Ordering {
        match (self, other) {
            (Ratio::Value(a), Ratio::Value(b)) => a.total_cmp(b),
            (Ratio::Value(_), Ratio::Undefined) => Ordering::Greater,
            (Ratio::Undefined, Ratio::Value(_)) => Ordering::Less,
            (Ratio::Undefined, Ratio::Undefined) => Ordering::Equal,
        }
    }
}

impl fmt::Display for Ratio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ratio::Value(v) => write!(f, "{:.3}", v),
            Ratio::Undefined => f.write_str("--"),
        }
    }
}

/// Coordinate-exact matching counts for one kind of structural unit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StructureStats {
    /// Reference units with an identical prediction unit.
    pub correct: u64,
    /// Reference units with no identical prediction unit.
    pub missing: u64,
    /// Prediction units with no identical reference unit.
    pub wrong: u64,
}

impl StructureStats {
    /// Match two sorted, deduplicated unit lists.
    pub fn compare<T: Ord>(refr: &[T], pred: &[T]) -> Self {
        let mut stats = Self::default();
        let (mut i, mut j) = (0, 0);
        while i < refr.len() && j < pred.len() {
            match refr[i].cmp(&pred[j]) {
                Ordering::Equal => {
                    stats.correct += 1;
                    i += 1;
                    j += 1;
                }
                Ordering::Less => {
                    stats.missing += 1;
                    i += 1;
                }
                Ordering::Greater => {
                    stats.wrong += 1;
                    j += 1;
                }
            }
        }
        stats.missing += (refr.len() - i) as u64;
        stats.wrong += (pred.len() - j) as u64;
        stats
    }

    pub fn refr_count(&self) -> u64 {
        self.correct + self.missing
    }

    pub fn pred_count(&self) -> u64 {
        self.correct + self.wrong
    }

    /// No missing and no wrong units.
    pub fn is_perfect(&self) -> bool {
        self.missing == 0 && self.wrong == 0
    }

    pub fn sensitivity(&self) -> Ratio {
        Ratio::from_counts(self.correct, self.correct + self.missing)
    }

    pub fn specificity(&self) -> Ratio {
        Ratio::from_counts(self.correct, self.correct + self.wrong)
    }

    /// Harmonic mean of sensitivity and specificity, as `2c / (2c + m + w)`.
    pub fn f1(&self) -> Ratio {
        Ratio::from_counts(2 * self.correct, 2 * self.correct + self.missing + self.wrong)
    }

    /// Annotation edit distance.
    pub fn edit_distance(&self) -> Ratio {
        self.f1().complement()
    }

    pub fn add(&mut self, other: &StructureStats) {
        self.correct += other.correct;
        self.missing += other.missing;
        self.wrong += other.wrong;
    }
}

/// Per-nucleotide confusion counts for one label.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NucleotideStats {
    pub true_positive: u64,
    pub false_positive: u64,
    pub false_negative: u64,
    pub true_negative: u64,
}

impl NucleotideStats {
    /// Count agreement on positions where `is_label` holds, over two
    /// equal-length vectors.
    pub fn compare(refr: &[u8], pred: &[u8], is_label: impl Fn(u8) -> bool) -> Self {
        let mut stats = Self::default();
        for (&r, &p) in refr.iter().zip(pred) {
            match (is_label(r), is_label(p)) {
                (true, true) => stats.true_positive += 1,
                (false, true) => stats.false_positive += 1,
                (true, false) => stats.false_negative += 1,
                (false, false) => stats.true_negative += 1,
            }
        }
        stats
    }

    pub fn total(&self) -> u64 {
        self.true_positive + self.false_positive + self.false_negative + self.true_negative
    }

    /// Fraction of positions on which both sides agree.
    pub fn matching_coefficient(&self) -> Ratio {
        Ratio::from_counts(self.true_positive + self.true_negative, self.total())
    }

    /// Matthews correlation coefficient.
    pub fn correlation(&self) -> Ratio {
        let tp = self.true_positive as f64;
        let fp = self.false_positive as f64;
        let fn_ = self.false_negative as f64;
        let tn = self.true_negative as f64;
        let denominator = ((tp + fp) * (tp + fn_) * (tn + fp) * (tn + fn_)).sqrt();
        if denominator == 0.0 {
            return Ratio::Undefined;
        }
        Ratio::Value(((tp * tn - fp * fn_) / denominator).clamp(-1.0, 1.0))
    }

    pub fn sensitivity(&self) -> Ratio {
        Ratio::from_counts(self.true_positive, self.true_positive + self.false_negative)
    }

    pub fn specificity(&self) -> Ratio {
        Ratio::from_counts(self.true_positive, self.true_positive + self.false_positive)
    }

    pub fn f1(&self) -> Ratio {
        Ratio::from_counts(
            2 * self.true_positive,
            2 * self.true_positive + self.false_positive + self.false_negative,
        )
    }

    pub fn edit_distance(&self) -> Ratio {
        self.f1().complement()
    }

    pub fn add(&mut self, other: &NucleotideStats) {
        self.true_positive += other.true_positive;
        self.false_positive += other.false_positive;
        self.false_negative += other.false_negative;
        self.true_negative += other.true_negative;
    }
}

pub fn is_coding(symbol: u8) -> bool {
    symbol == CODING
}

/// Either UTR orientation.
pub fn is_utr(symbol: u8) -> bool {
    symbol == FIVE_PRIME_UTR || symbol == THREE_PRIME_UTR
}

/// Everything measured for one reference/prediction clique pair.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ComparisonStats {
    pub cds_struc: StructureStats,
    pub exon_struc: StructureStats,
    pub utr_struc: StructureStats,
    pub cds_nuc: NucleotideStats,
    pub utr_nuc: NucleotideStats,
    /// Positions whose reference and prediction symbols are identical.
    pub identical_positions: u64,
    /// Positions compared.
    pub total_positions: u64,
    /// Identity within this distance of 1.0 counts as perfect.
    pub tolerance: f64,
}

impl ComparisonStats {
    pub fn new(tolerance: f64) -> Self {
        Self {
            tolerance,
            ..Self::default()
        }
    }

    /// Fill the nucleotide-level counts from two model vectors.
    pub fn record_vectors(&mut self, refr: &ModelVector, pred: &ModelVector) {
        let (r, p) = (refr.as_bytes(), pred.as_bytes());
        debug_assert_eq!(r.len(), p.len());
        self.cds_nuc = NucleotideStats::compare(r, p, is_coding);
        self.utr_nuc = NucleotideStats::compare(r, p, is_utr);
        self.identical_positions = r.iter().zip(p).filter(|(a, b)| a == b).count() as u64;
        self.total_positions = r.len().min(p.len()) as u64;
    }

    /// Overall nucleotide identity.
    pub fn identity(&self) -> Ratio {
        Ratio::from_counts(self.identical_positions, self.total_positions)
    }

    /// Identity is defined and at least `1 - tolerance`.
    pub fn is_identical(&self) -> bool {
        self.identity()
            .value()
            .is_some_and(|v| v >= 1.0 - self.tolerance)
    }

    /// Sum another record's counts into this one.
    pub fn add(&mut self, other: &ComparisonStats) {
        self.cds_struc.add(&other.cds_struc);
        self.exon_struc.add(&other.exon_struc);
        self.utr_struc.add(&other.utr_struc);
        self.cds_nuc.add(&other.cds_nuc);
        self.utr_nuc.add(&other.utr_nuc);
        self.identical_positions += other.identical_positions;
        self.total_positions += other.total_positions;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interval::Span;

    #[test]
    fn test_ratio_undefined_is_not_zero() {
        assert_eq!(Ratio::from_counts(0, 0), Ratio::Undefined);
        assert_eq!(Ratio::from_counts(0, 4), Ratio::Value(0.0));
        assert_eq!(Ratio::Undefined.to_string(), "--");
        assert_eq!(Ratio::Value(0.5).to_string(), "0.500");
    }

    #[test]
    fn test_structure_compare() {
        let refr = vec![Span::new(0, 10), Span::new(20, 30), Span::new(40, 50)];
        let pred = vec![Span::new(0, 10), Span::new(20, 31), Span::new(40, 50), Span::new(60, 70)];
        let stats = StructureStats::compare(&refr, &pred);

        assert_eq!(stats, StructureStats { correct: 2, missing: 1, wrong: 2 });
        assert_eq!(stats.sensitivity(), Ratio::Value(2.0 / 3.0));
        assert_eq!(stats.specificity(), Ratio::Value(0.5));
        let f1 = stats.f1().value().unwrap();
        assert!((f1 - 4.0 / 7.0).abs() < 1e-12);
        assert!((stats.edit_distance().value().unwrap() - 3.0 / 7.0).abs() < 1e-12);
    }

    #[test]
    fn test_no_units_is_undefined() {
        let stats = StructureStats::compare::<Span>(&[], &[]);
        assert!(stats.is_perfect());
        assert_eq!(stats.sensitivity(), Ratio::Undefined);
        assert_eq!(stats.edit_distance(), Ratio::Undefined);
    }

    #[test]
    fn test_nucleotide_stats() {
        let refr = b"GGCCCCGG";
        let pred = b"GGGCCCCG";
        let stats = NucleotideStats::compare(refr, pred, is_coding);

        assert_eq!(stats.true_positive, 3);
        assert_eq!(stats.false_positive, 1);
        assert_eq!(stats.false_negative, 1);
        assert_eq!(stats.true_negative, 3);
        assert_eq!(stats.matching_coefficient(), Ratio::Value(0.75));
        assert_eq!(stats.correlation(), Ratio::Value(0.5));
    }

    #[test]
    fn test_ratios_stay_in_bounds() {
        for (c, m, w) in [(0, 5, 5), (5, 0, 0), (3, 2, 1), (0, 0, 7)] {
            let stats = StructureStats { correct: c, missing: m, wrong: w };
            let ratios = [
                stats.sensitivity(),
                stats.specificity(),
                stats.f1(),
                stats.edit_distance(),
            ];
            for ratio in ratios {
                if let Some(v) = ratio.value() {
                    assert!((0.0..=1.0).contains(&v), "{:?} out of range", ratio);
                }
            }
        }
    }

    #[test]
    fn test_add_recomputes_from_sums() {
        let mut total = ComparisonStats::new(1e-6);
        let mut a = ComparisonStats::new(1e-6);
        a.identical_positions = 10;
        a.total_positions = 10;
        let mut b = ComparisonStats::new(1e-6);
        b.identical_positions = 0;
        b.total_positions = 90;

        total.add(&a);
        total.add(&b);
        assert_eq!(total.identity(), Ratio::Value(0.1));
    }
}
