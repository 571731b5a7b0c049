//! Run-wide tallies folded from per-locus comparisons.
//!
//! Only integer counts are accumulated. Every ratio in the final summary is
//! recomputed from the sums, so large and small loci weigh the same per
//! nucleotide or per structural unit.

use crate::compare::LocusComparison;
use crate::feature::{AnnotationSet, Source};
use crate::pair::{CliquePair, Classification};
use crate::stats::ComparisonStats;

/// Descriptive totals for the comparisons in one class.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClassDescription {
    pub comparison_count: u64,
    pub total_length: u64,
    pub refr_exon_count: u64,
    pub pred_exon_count: u64,
    pub refr_cds_length: u64,
    pub pred_cds_length: u64,
}

impl ClassDescription {
    pub fn record(&mut self, pair: &CliquePair, refr: &AnnotationSet, pred: &AnnotationSet) {
        self.comparison_count += 1;
        self.total_length += pair.locus.len();
        self.refr_exon_count += pair.refr.exon_count(refr) as u64;
        self.pred_exon_count += pair.pred.exon_count(pred) as u64;
        self.refr_cds_length += pair.refr.cds_length(refr);
        self.pred_cds_length += pair.pred.cds_length(pred);
    }

    pub fn merge(&mut self, other: &ClassDescription) {
        self.comparison_count += other.comparison_count;
        self.total_length += other.total_length;
        self.refr_exon_count += other.refr_exon_count;
        self.pred_exon_count += other.pred_exon_count;
        self.refr_cds_length += other.refr_cds_length;
        self.pred_cds_length += other.pred_cds_length;
    }

    fn mean(&self, total: u64) -> Option<f64> {
        (self.comparison_count > 0).then(|| total as f64 / self.comparison_count as f64)
    }

    /// Mean locus length in bp.
    pub fn mean_length(&self) -> Option<f64> {
        self.mean(self.total_length)
    }

    pub fn mean_refr_exons(&self) -> Option<f64> {
        self.mean(self.refr_exon_count)
    }

    pub fn mean_pred_exons(&self) -> Option<f64> {
        self.mean(self.pred_exon_count)
    }

    /// Mean reference CDS length in amino acids.
    pub fn mean_refr_cds_aa(&self) -> Option<f64> {
        self.mean(self.refr_cds_length).map(|nt| nt / 3.0)
    }

    /// Mean prediction CDS length in amino acids.
    pub fn mean_pred_cds_aa(&self) -> Option<f64> {
        self.mean(self.pred_cds_length).map(|nt| nt / 3.0)
    }
}

/// Locus and feature tallies for a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AggregateCounts {
    pub num_loci: u64,
    pub unique_refr: u64,
    pub unique_pred: u64,
    pub exceeded_limit: u64,
    pub degraded: u64,
    pub refr_genes: u64,
    pub refr_transcripts: u64,
    pub pred_genes: u64,
    pub pred_transcripts: u64,
    /// Indexed by [`Classification::index`].
    pub classes: [u64; 6],
}

impl AggregateCounts {
    pub fn shared_loci(&self) -> u64 {
        self.num_loci - self.unique_refr - self.unique_pred
    }

    pub fn num_comparisons(&self) -> u64 {
        self.classes.iter().sum()
    }

    pub fn class_count(&self, class: Classification) -> u64 {
        self.classes[class.index()]
    }

    pub fn merge(&mut self, other: &AggregateCounts) {
        self.num_loci += other.num_loci;
        self.unique_refr += other.unique_refr;
        self.unique_pred += other.unique_pred;
        self.exceeded_limit += other.exceeded_limit;
        self.degraded += other.degraded;
        self.refr_genes += other.refr_genes;
        self.refr_transcripts += other.refr_transcripts;
        self.pred_genes += other.pred_genes;
        self.pred_transcripts += other.pred_transcripts;
        for (a, b) in self.classes.iter_mut().zip(other.classes.iter()) {
            *a += b;
        }
    }
}

/// Everything the run summary reports.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SummaryData {
    pub counts: AggregateCounts,
    /// Indexed by [`Classification::index`].
    pub descriptions: [ClassDescription; 6],
    pub stats: ComparisonStats,
}

impl SummaryData {
    pub fn new(tolerance: f64) -> Self {
        Self {
            stats: ComparisonStats::new(tolerance),
            ..Self::default()
        }
    }

    /// Fold one analysed locus into the tallies.
    pub fn record_locus(
        &mut self,
        comparison: &LocusComparison,
        refr: &AnnotationSet,
        pred: &AnnotationSet,
    ) {
        let locus = &comparison.locus;
        let counts = &mut self.counts;

        counts.num_loci += 1;
        match (comparison.has_refr(), comparison.has_pred()) {
            (true, false) => counts.unique_refr += 1,
            (false, true) => counts.unique_pred += 1,
            _ => {}
        }
        if comparison.exceeds_limit() {
            counts.exceeded_limit += 1;
        }
        if comparison.is_degraded() {
            counts.degraded += 1;
        }

        counts.refr_genes += locus.refr_genes.len() as u64;
        counts.pred_genes += locus.pred_genes.len() as u64;
        counts.refr_transcripts += locus.transcripts(Source::Reference, refr).len() as u64;
        counts.pred_transcripts += locus.transcripts(Source::Prediction, pred).len() as u64;

        for pair in &comparison.pairs {
            let class = pair.classification.index();
            self.counts.classes[class] += 1;
            self.descriptions[class].record(pair, refr, pred);
            self.stats.add(&pair.stats);
        }
    }

    pub fn merge(&mut self, other: &SummaryData) {
        self.counts.merge(&other.counts);
        for (a, b) in self.descriptions.iter_mut().zip(other.descriptions.iter()) {
            a.merge(b);
        }
        self.stats.add(&other.stats);
    }

    pub fn description(&self, class: Classification) -> &ClassDescription {
        &self.descriptions[class.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compare::LocusComparator;
    use crate::config::CompareConfig;
    use crate::feature::{Gene, GeneId, Transcript};
    use crate::interval::{Interval, Span, Strand};
    use crate::locus::PairwiseLocus;
    use crate::stats::Ratio;

    fn single(gene_id: &str, exons: &[(u64, u64)], cds: &[(u64, u64)]) -> AnnotationSet {
        let (start, end) = (exons[0].0, exons[exons.len() - 1].1);
        let interval = Interval::new("chr1", start, end);
        let t = Transcript::new(format!("{}.1", gene_id), interval.clone(), Strand::Plus)
            .with_exons(exons.iter().map(|(s, e)| Span::new(*s, *e)).collect())
            .with_cds(cds.iter().map(|(s, e)| Span::new(*s, *e)).collect())
            .finalize();
        let gene = Gene::new(gene_id, interval, Strand::Plus).with_transcript(t);
        AnnotationSet::from_genes(vec![gene])
    }

    fn compared(refr: &AnnotationSet, pred: &AnnotationSet) -> LocusComparison {
        let mut locus =
            PairwiseLocus::new(Source::Reference, GeneId(0), &refr.gene(GeneId(0)).interval);
        locus.add(Source::Prediction, GeneId(0), &pred.gene(GeneId(0)).interval);
        let config = CompareConfig::default();
        LocusComparator::new(refr, pred, &config).compare(locus)
    }

    #[test]
    fn test_record_perfect_locus() {
        let refr = single("g1", &[(100, 200), (300, 500)], &[(120, 200), (300, 480)]);
        let pred = single("p1", &[(100, 200), (300, 500)], &[(120, 200), (300, 480)]);
        let mut summary = SummaryData::new(1e-6);
        summary.record_locus(&compared(&refr, &pred), &refr, &pred);

        assert_eq!(summary.counts.num_loci, 1);
        assert_eq!(summary.counts.shared_loci(), 1);
        assert_eq!(summary.counts.class_count(Classification::PerfectMatch), 1);
        let description = summary.description(Classification::PerfectMatch);
        assert_eq!(description.mean_refr_exons(), Some(2.0));
        assert_eq!(description.mean_refr_cds_aa(), Some(260.0 / 3.0));
        assert_eq!(summary.stats.identity(), Ratio::Value(1.0));
    }

    #[test]
    fn test_merge_recomputes_identity_from_sums() {
        let refr = single("g1", &[(100, 200)], &[(100, 200)]);
        let perfect = single("p1", &[(100, 200)], &[(100, 200)]);
        let shifted = single("p2", &[(150, 200)], &[(150, 200)]);

        let mut a = SummaryData::new(1e-6);
        a.record_locus(&compared(&refr, &perfect), &refr, &perfect);
        let mut b = SummaryData::new(1e-6);
        b.record_locus(&compared(&refr, &shifted), &refr, &shifted);

        a.merge(&b);
        assert_eq!(a.counts.num_loci, 2);
        assert_eq!(a.counts.num_comparisons(), 2);
        // 100 + 50 identical positions out of 200
        assert_eq!(a.stats.identity(), Ratio::Value(0.75));
    }

    #[test]
    fn test_unique_reference_locus() {
        let refr = single("g1", &[(100, 200)], &[(100, 200)]);
        let pred = AnnotationSet::new();
        let locus =
            PairwiseLocus::new(Source::Reference, GeneId(0), &refr.gene(GeneId(0)).interval);
        let config = CompareConfig::default();
        let comparison = LocusComparator::new(&refr, &pred, &config).compare(locus);

        let mut summary = SummaryData::new(1e-6);
        summary.record_locus(&comparison, &refr, &pred);
        assert_eq!(summary.counts.unique_refr, 1);
        assert_eq!(summary.counts.shared_loci(), 0);
        assert_eq!(summary.counts.num_comparisons(), 0);
        assert_eq!(summary.counts.refr_transcripts, 1);
    }
}
