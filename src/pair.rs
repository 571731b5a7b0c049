//! Scoring and classification of one reference clique against one
//! prediction clique.

use crate::clique::TranscriptClique;
use crate::feature::AnnotationSet;
use crate::interval::Interval;
use crate::stats::{ComparisonStats, StructureStats};
use crate::vector::{ModelVector, StructureUnits};
use std::cmp::Ordering;
use std::fmt;

/// Match category of a compared clique pair, best first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Classification {
    PerfectMatch,
    Mislabeled,
    CdsMatch,
    ExonMatch,
    UtrMatch,
    NonMatch,
}

impl Classification {
    pub const ALL: [Classification; 6] = [
        Classification::PerfectMatch,
        Classification::Mislabeled,
        Classification::CdsMatch,
        Classification::ExonMatch,
        Classification::UtrMatch,
        Classification::NonMatch,
    ];

    /// Position in [`Classification::ALL`].
    pub fn index(&self) -> usize {
        *self as usize
    }

    /// Plural label used in summaries.
    pub fn label(&self) -> &'static str {
        match self {
            Classification::PerfectMatch => "perfect matches",
            Classification::Mislabeled => "perfect matches with mislabeled UTRs",
            Classification::CdsMatch => "CDS structure matches",
            Classification::ExonMatch => "exon structure matches",
            Classification::UtrMatch => "UTR structure matches",
            Classification::NonMatch => "non-matches",
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let code = match self {
            Classification::PerfectMatch => "PERFECT_MATCH",
            Classification::Mislabeled => "MISLABELED",
            Classification::CdsMatch => "CDS_MATCH",
            Classification::ExonMatch => "EXON_MATCH",
            Classification::UtrMatch => "UTR_MATCH",
            Classification::NonMatch => "NON_MATCH",
        };
        f.write_str(code)
    }
}

/// A reference clique compared against a prediction clique at one locus.
#[derive(Debug, Clone)]
pub struct CliquePair {
    pub locus: Interval,
    pub refr: TranscriptClique,
    pub pred: TranscriptClique,
    pub stats: ComparisonStats,
    pub classification: Classification,
    /// Rendered vectors, kept only when requested.
    pub vectors: Option<(ModelVector, ModelVector)>,
    has_utrs: bool,
    utr_spans_match: bool,
}

impl CliquePair {
    /// Run the comparative analysis of `refr` against `pred` over `locus`.
    pub fn compare(
        locus: &Interval,
        refr: TranscriptClique,
        refr_annotations: &AnnotationSet,
        pred: TranscriptClique,
        pred_annotations: &AnnotationSet,
        tolerance: f64,
        keep_vectors: bool,
    ) -> Self {
        let refr_units = StructureUnits::collect(&refr, refr_annotations);
        let pred_units = StructureUnits::collect(&pred, pred_annotations);

        let mut stats = ComparisonStats::new(tolerance);
        stats.cds_struc = StructureStats::compare(&refr_units.cds, &pred_units.cds);
        stats.exon_struc = StructureStats::compare(&refr_units.exons, &pred_units.exons);
        stats.utr_struc = StructureStats::compare(&refr_units.utrs, &pred_units.utrs);

        let refr_vector = ModelVector::build(&refr, refr_annotations, locus);
        let pred_vector = ModelVector::build(&pred, pred_annotations, locus);
        stats.record_vectors(&refr_vector, &pred_vector);

        let has_utrs = !refr_units.utrs.is_empty() || !pred_units.utrs.is_empty();
        let utr_spans_match = refr_units.utr_spans() == pred_units.utr_spans();

        let mut pair = Self {
            locus: locus.clone(),
            refr,
            pred,
            stats,
            classification: Classification::NonMatch,
            vectors: keep_vectors.then_some((refr_vector, pred_vector)),
            has_utrs,
            utr_spans_match,
        };
        pair.classification = pair.classify();
        pair
    }

    /// Priority-ordered classification, first matching rule wins.
    fn classify(&self) -> Classification {
        let cds = self.stats.cds_struc.is_perfect();
        let exon = self.stats.exon_struc.is_perfect();
        let utr = self.stats.utr_struc.is_perfect();

        if cds && exon && utr && self.stats.is_identical() {
            Classification::PerfectMatch
        } else if cds && exon && !utr && self.utr_spans_match {
            Classification::Mislabeled
        } else if cds {
            Classification::CdsMatch
        } else if exon {
            Classification::ExonMatch
        } else if utr {
            Classification::UtrMatch
        } else {
            Classification::NonMatch
        }
    }

    /// True if either clique annotates any UTR.
    pub fn has_utrs(&self) -> bool {
        self.has_utrs
    }

    pub fn is_simple(&self) -> bool {
        self.refr.len() == 1 && self.pred.len() == 1
    }

    pub fn transcript_count(&self) -> usize {
        self.refr.len() + self.pred.len()
    }

    /// `Greater` if `self` scores better than `other`.
    ///
    /// Identity first, then correct CDS, exon and UTR units, then the pair
    /// with fewer transcripts.
    pub fn compare_scores(&self, other: &CliquePair) -> Ordering {
        self.stats
            .identity()
            .total_cmp(&other.stats.identity())
            .then(self.stats.cds_struc.correct.cmp(&other.stats.cds_struc.correct))
            .then(self.stats.exon_struc.correct.cmp(&other.stats.exon_struc.correct))
            .then(self.stats.utr_struc.correct.cmp(&other.stats.utr_struc.correct))
            .then(other.transcript_count().cmp(&self.transcript_count()))
    }

    /// Inverse of [`compare_scores`](Self::compare_scores), for sorting best first.
    pub fn compare_scores_reverse(&self, other: &CliquePair) -> Ordering {
        other.compare_scores(self)
    }
}
