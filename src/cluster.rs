//! Locus clustering by fixed-point overlap expansion.
//!
//! Two genes end up in the same locus iff they are connected by a chain of
//! pairwise-overlapping ranges. A locus is seeded from one unclaimed gene
//! and then repeatedly widened by querying the index with its current
//! range, claiming anything new, until a query adds nothing.

use crate::error::SequenceError;
use crate::feature::{AnnotationSet, GeneId, Source};
use crate::index::FeatureIndex;
use crate::interval::Interval;
use crate::locus::{Locus, PairwiseLocus};
use rustc_hash::FxHashSet;

/// An annotation arena paired with the index built over it.
#[derive(Clone, Copy)]
pub struct IndexedSource<'a> {
    pub annotations: &'a AnnotationSet,
    pub index: &'a dyn FeatureIndex,
}

impl<'a> IndexedSource<'a> {
    pub fn new(annotations: &'a AnnotationSet, index: &'a dyn FeatureIndex) -> Self {
        Self { annotations, index }
    }
}

/// Partition one sequence's genes into loci.
pub fn cluster_sequence(
    source: IndexedSource<'_>,
    seqid: &str,
) -> Result<Vec<Locus>, SequenceError> {
    let genes = source
        .index
        .features_for_sequence(seqid)
        .map_err(|e| SequenceError {
            seqid: seqid.to_string(),
            source: e,
        })?;

    let mut claimed: FxHashSet<GeneId> = FxHashSet::default();
    let mut loci = Vec::new();

    for gene in genes {
        if !claimed.insert(gene) {
            continue;
        }
        let mut locus = Locus::new(gene, &source.annotations.gene(gene).interval);

        loop {
            let new_genes = claim_overlapping(
                source,
                Source::Reference,
                &locus.interval,
                &mut claimed,
                &mut locus.notes,
            );
            if new_genes.is_empty() {
                break;
            }
            for id in new_genes {
                locus.add(id, &source.annotations.gene(id).interval);
            }
        }
        loci.push(locus);
    }

    loci.sort_by(|a, b| a.interval.cmp(&b.interval));
    Ok(loci)
}

/// Partition one sequence's reference and prediction genes into shared loci.
///
/// Pass 1 seeds from reference genes and widens against both sources.
/// Pass 2 seeds from leftover prediction genes and widens against the
/// prediction source only, since every reference gene is already claimed.
pub fn cluster_sequence_pairwise(
    refr: IndexedSource<'_>,
    pred: IndexedSource<'_>,
    seqid: &str,
) -> Result<Vec<PairwiseLocus>, SequenceError> {
    let has_refr = refr.index.contains_sequence(seqid);
    let has_pred = pred.index.contains_sequence(seqid);
    let fail = |e| SequenceError {
        seqid: seqid.to_string(),
        source: e,
    };

    if !has_refr && !has_pred {
        return Err(fail(crate::error::IndexError::NotFound(seqid.to_string())));
    }
    let refr_genes = if has_refr {
        refr.index.features_for_sequence(seqid).map_err(fail)?
    } else {
        Vec::new()
    };
    let pred_genes = if has_pred {
        pred.index.features_for_sequence(seqid).map_err(fail)?
    } else {
        Vec::new()
    };

    let mut claimed_refr: FxHashSet<GeneId> = FxHashSet::default();
    let mut claimed_pred: FxHashSet<GeneId> = FxHashSet::default();
    let mut loci = Vec::new();

    for gene in refr_genes {
        if !claimed_refr.insert(gene) {
            continue;
        }
        let interval = &refr.annotations.gene(gene).interval;
        let mut locus = PairwiseLocus::new(Source::Reference, gene, interval);

        loop {
            let new_refr = claim_overlapping(
                refr,
                Source::Reference,
                &locus.interval,
                &mut claimed_refr,
                &mut locus.notes,
            );
            for id in &new_refr {
                locus.add(Source::Reference, *id, &refr.annotations.gene(*id).interval);
            }
            let new_pred = if has_pred {
                claim_overlapping(
                    pred,
                    Source::Prediction,
                    &locus.interval,
                    &mut claimed_pred,
                    &mut locus.notes,
                )
            } else {
                Vec::new()
            };
            for id in &new_pred {
                locus.add(Source::Prediction, *id, &pred.annotations.gene(*id).interval);
            }
            if new_refr.is_empty() && new_pred.is_empty() {
                break;
            }
        }
        loci.push(locus);
    }

    for gene in pred_genes {
        if !claimed_pred.insert(gene) {
            continue;
        }
        let interval = &pred.annotations.gene(gene).interval;
        let mut locus = PairwiseLocus::new(Source::Prediction, gene, interval);

        loop {
            let new_pred = claim_overlapping(
                pred,
                Source::Prediction,
                &locus.interval,
                &mut claimed_pred,
                &mut locus.notes,
            );
            if new_pred.is_empty() {
                break;
            }
            for id in new_pred {
                locus.add(Source::Prediction, id, &pred.annotations.gene(id).interval);
            }
        }
        loci.push(locus);
    }

    loci.sort_by(|a, b| a.interval.cmp(&b.interval));
    Ok(loci)
}

/// Query `source` for genes overlapping `range` and claim the unclaimed ones.
///
/// A failed query is logged, noted on the locus and treated as empty.
fn claim_overlapping(
    source: IndexedSource<'_>,
    label: Source,
    range: &Interval,
    claimed: &mut FxHashSet<GeneId>,
    notes: &mut Vec<String>,
) -> Vec<GeneId> {
    match source.index.features_overlapping(&range.seqid, range.span()) {
        Ok(found) => found.into_iter().filter(|id| claimed.insert(*id)).collect(),
        Err(e) => {
            log::warn!(
                "error fetching {} features for range {}[{}, {}): {}",
                label,
                range.seqid,
                range.start,
                range.end,
                e
            );
            notes.push(format!("{} index query failed: {}", label, e));
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::IndexError;
    use crate::feature::Gene;
    use crate::index::IntervalIndex;
    use crate::interval::{Span, Strand};

    fn genes(layout: &[(&str, &str, u64, u64)]) -> AnnotationSet {
        AnnotationSet::from_genes(
            layout.iter()
                .map(|(id, seq, s, e)| Gene::new(*id, Interval::new(*seq, *s, *e), Strand::Plus))
                .collect(),
        )
    }

    fn ids(annotations: &AnnotationSet, genes: &[GeneId]) -> Vec<String> {
        let mut out: Vec<String> = genes.iter().map(|g| annotations.gene(*g).id.clone()).collect();
        out.sort();
        out
    }

    #[test]
    fn test_three_genes_two_loci() {
        let annotations = genes(&[
            ("g1", "chr1", 10, 50),
            ("g2", "chr1", 45, 90),
            ("g3", "chr1", 200, 250),
        ]);
        let index = IntervalIndex::from_annotations(&annotations);
        let loci = cluster_sequence(IndexedSource::new(&annotations, &index), "chr1").unwrap();

        assert_eq!(loci.len(), 2);
        assert_eq!(loci[0].interval, Interval::new("chr1", 10, 90));
        assert_eq!(ids(&annotations, &loci[0].genes), vec!["g1", "g2"]);
        assert_eq!(loci[1].interval, Interval::new("chr1", 200, 250));
        assert_eq!(ids(&annotations, &loci[1].genes), vec!["g3"]);
    }

    #[test]
    fn test_transitive_chain_needs_several_rounds() {
        // g1 only overlaps g4 once g3 and g2 have widened the locus
        let annotations = genes(&[
            ("g1", "chr1", 0, 10),
            ("g4", "chr1", 25, 40),
            ("g2", "chr1", 5, 20),
            ("g3", "chr1", 15, 30),
        ]);
        let index = IntervalIndex::from_annotations(&annotations);
        let loci = cluster_sequence(IndexedSource::new(&annotations, &index), "chr1").unwrap();

        assert_eq!(loci.len(), 1);
        assert_eq!(loci[0].interval, Interval::new("chr1", 0, 40));
        assert_eq!(loci[0].genes.len(), 4);
    }

    #[test]
    fn test_pairwise_prediction_bridges_reference_genes() {
        let refr = genes(&[("r1", "chr1", 0, 100), ("r2", "chr1", 190, 300)]);
        let pred = genes(&[("p1", "chr1", 90, 200), ("p2", "chr1", 500, 600)]);
        let refr_index = IntervalIndex::from_annotations(&refr);
        let pred_index = IntervalIndex::from_annotations(&pred);

        let loci = cluster_sequence_pairwise(
            IndexedSource::new(&refr, &refr_index),
            IndexedSource::new(&pred, &pred_index),
            "chr1",
        )
        .unwrap();

        assert_eq!(loci.len(), 2);
        assert_eq!(loci[0].interval, Interval::new("chr1", 0, 300));
        assert_eq!(ids(&refr, &loci[0].refr_genes), vec!["r1", "r2"]);
        assert_eq!(ids(&pred, &loci[0].pred_genes), vec!["p1"]);

        assert!(loci[1].refr_genes.is_empty());
        assert_eq!(ids(&pred, &loci[1].pred_genes), vec!["p2"]);
    }

    #[test]
    fn test_pairwise_sequence_only_in_prediction() {
        let refr = genes(&[("r1", "chr1", 0, 100)]);
        let pred = genes(&[("p1", "chr2", 0, 100)]);
        let refr_index = IntervalIndex::from_annotations(&refr);
        let pred_index = IntervalIndex::from_annotations(&pred);

        let loci = cluster_sequence_pairwise(
            IndexedSource::new(&refr, &refr_index),
            IndexedSource::new(&pred, &pred_index),
            "chr2",
        )
        .unwrap();
        assert_eq!(loci.len(), 1);
        assert!(loci[0].refr_genes.is_empty());
    }

    #[test]
    fn test_pairwise_unknown_sequence_fails() {
        let refr = genes(&[("r1", "chr1", 0, 100)]);
        let index = IntervalIndex::from_annotations(&refr);
        let source = IndexedSource::new(&refr, &index);

        let err = cluster_sequence_pairwise(source, source, "chrX").unwrap_err();
        assert_eq!(err.seqid, "chrX");
        assert_eq!(err.source, IndexError::NotFound("chrX".to_string()));
    }

    /// Index whose range queries always fail.
    struct BrokenIndex(IntervalIndex);

    impl FeatureIndex for BrokenIndex {
        fn sequence_ids(&self) -> Vec<String> {
            self.0.sequence_ids()
        }
        fn contains_sequence(&self, seqid: &str) -> bool {
            self.0.contains_sequence(seqid)
        }
        fn features_for_sequence(&self, seqid: &str) -> crate::index::Result<Vec<GeneId>> {
            self.0.features_for_sequence(seqid)
        }
        fn features_overlapping(
            &self,
            seqid: &str,
            range: Span,
        ) -> crate::index::Result<Vec<GeneId>> {
            Err(IndexError::QueryError {
                seqid: seqid.to_string(),
                start: range.start,
                end: range.end,
                message: "simulated failure".to_string(),
            })
        }
    }

    #[test]
    fn test_query_errors_degrade_but_do_not_abort() {
        let annotations = genes(&[("g1", "chr1", 10, 50), ("g2", "chr1", 45, 90)]);
        let index = BrokenIndex(IntervalIndex::from_annotations(&annotations));
        let loci = cluster_sequence(IndexedSource::new(&annotations, &index), "chr1").unwrap();

        // Under-merged: every gene still lands in exactly one locus
        assert_eq!(loci.len(), 2);
        assert!(loci.iter().all(|l| l.is_degraded()));
        assert_eq!(loci.iter().map(|l| l.genes.len()).sum::<usize>(), 2);
    }
}
