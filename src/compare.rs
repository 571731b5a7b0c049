//! Per-locus comparative analysis: clique pairing, limits and selection.

use crate::clique::{CliqueBuilder, TranscriptClique};
use crate::config::CompareConfig;
use crate::feature::{AnnotationSet, Source, TranscriptRef};
use crate::locus::PairwiseLocus;
use crate::pair::CliquePair;
use rustc_hash::FxHashSet;

/// What happened to a locus during comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocusStatus {
    /// Clique pairs were compared and selected.
    Compared,
    /// Too many clique pairs; nothing was compared.
    ExceedsLimit { pair_count: usize, limit: usize },
    /// Only one source has transcripts here.
    Unpaired,
}

/// Result of analysing one locus.
#[derive(Debug, Clone)]
pub struct LocusComparison {
    pub locus: PairwiseLocus,
    pub status: LocusStatus,
    /// Selected pairs, best first.
    pub pairs: Vec<CliquePair>,
    /// Reference cliques not used by any selected pair.
    pub unique_refr: Vec<TranscriptClique>,
    /// Prediction cliques not used by any selected pair.
    pub novel_pred: Vec<TranscriptClique>,
}

impl LocusComparison {
    pub fn exceeds_limit(&self) -> bool {
        matches!(self.status, LocusStatus::ExceedsLimit { .. })
    }

    pub fn is_degraded(&self) -> bool {
        self.locus.is_degraded()
    }

    pub fn has_refr(&self) -> bool {
        !self.locus.refr_genes.is_empty()
    }

    pub fn has_pred(&self) -> bool {
        !self.locus.pred_genes.is_empty()
    }
}

/// Compares reference and prediction models locus by locus.
pub struct LocusComparator<'a> {
    refr: &'a AnnotationSet,
    pred: &'a AnnotationSet,
    config: &'a CompareConfig,
}

impl<'a> LocusComparator<'a> {
    pub fn new(
        refr: &'a AnnotationSet,
        pred: &'a AnnotationSet,
        config: &'a CompareConfig,
    ) -> Self {
        Self { refr, pred, config }
    }

    pub fn compare(&self, locus: PairwiseLocus) -> LocusComparison {
        let refr_transcripts = locus.transcripts(Source::Reference, self.refr);
        let pred_transcripts = locus.transcripts(Source::Prediction, self.pred);
        let builder = CliqueBuilder::new(self.config);

        if refr_transcripts.is_empty() || pred_transcripts.is_empty() {
            let (unique_refr, _) = builder.build(self.refr, &refr_transcripts);
            let (novel_pred, _) = builder.build(self.pred, &pred_transcripts);
            return LocusComparison {
                locus,
                status: LocusStatus::Unpaired,
                pairs: Vec::new(),
                unique_refr,
                novel_pred,
            };
        }

        let cliques =
            builder.build_pairwise(self.refr, &refr_transcripts, self.pred, &pred_transcripts);
        let pair_count = cliques.pair_count();
        if self.config.exceeds_pair_limit(pair_count) {
            log::info!(
                "locus {}:{}-{} has {} clique pairs, over the limit of {}; skipping comparison",
                locus.seqid(),
                locus.interval.start,
                locus.interval.end,
                pair_count,
                self.config.max_clique_pairs
            );
            return LocusComparison {
                locus,
                status: LocusStatus::ExceedsLimit {
                    pair_count,
                    limit: self.config.max_clique_pairs,
                },
                pairs: Vec::new(),
                unique_refr: Vec::new(),
                novel_pred: Vec::new(),
            };
        }

        let mut candidates = Vec::with_capacity(pair_count);
        for refr_clique in &cliques.refr {
            for pred_clique in &cliques.pred {
                candidates.push(CliquePair::compare(
                    &locus.interval,
                    refr_clique.clone(),
                    self.refr,
                    pred_clique.clone(),
                    self.pred,
                    self.config.tolerance,
                    self.config.model_vectors,
                ));
            }
        }

        let selection = select_pairs(candidates, cliques.refr, cliques.pred);
        LocusComparison {
            locus,
            status: LocusStatus::Compared,
            pairs: selection.pairs,
            unique_refr: selection.unique_refr,
            novel_pred: selection.novel_pred,
        }
    }
}

/// Outcome of greedy pair selection.
#[derive(Debug, Clone)]
pub struct Selection {
    pub pairs: Vec<CliquePair>,
    pub unique_refr: Vec<TranscriptClique>,
    pub novel_pred: Vec<TranscriptClique>,
}

/// Greedily keep the best pairs whose transcripts are all still unclaimed.
///
/// Leftover cliques are then reported as unmatched, each reduced to the
/// transcripts that neither a pair nor an earlier leftover already holds.
/// Every transcript of the locus thus appears exactly once in the result.
pub fn select_pairs(
    mut candidates: Vec<CliquePair>,
    refr_cliques: Vec<TranscriptClique>,
    pred_cliques: Vec<TranscriptClique>,
) -> Selection {
    candidates.sort_by(|a, b| a.compare_scores_reverse(b));

    let mut claimed_refr: FxHashSet<TranscriptRef> = FxHashSet::default();
    let mut claimed_pred: FxHashSet<TranscriptRef> = FxHashSet::default();
    let mut pairs = Vec::new();

    for pair in candidates {
        let free = pair.refr.transcripts().iter().all(|t| !claimed_refr.contains(t))
            && pair.pred.transcripts().iter().all(|t| !claimed_pred.contains(t));
        if !free {
            continue;
        }
        claimed_refr.extend(pair.refr.transcripts().iter().copied());
        claimed_pred.extend(pair.pred.transcripts().iter().copied());
        pairs.push(pair);
    }

    Selection {
        pairs,
        unique_refr: unclaimed(refr_cliques, &mut claimed_refr),
        novel_pred: unclaimed(pred_cliques, &mut claimed_pred),
    }
}

fn unclaimed(
    cliques: Vec<TranscriptClique>,
    claimed: &mut FxHashSet<TranscriptRef>,
) -> Vec<TranscriptClique> {
    let mut out = Vec::new();
    for clique in cliques {
        let remaining: Vec<TranscriptRef> = clique
            .transcripts()
            .iter()
            .copied()
            .filter(|t| !claimed.contains(t))
            .collect();
        if remaining.is_empty() {
            continue;
        }
        claimed.extend(remaining.iter().copied());
        if remaining.len() == clique.len() {
            out.push(clique);
        } else {
            // Partly claimed by a pair or an earlier leftover
            out.push(TranscriptClique::new(remaining));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feature::{Gene, GeneId, Transcript};
    use crate::interval::{Interval, Span, Strand};
    use crate::pair::Classification;

    fn model(id: &str, exons: &[(u64, u64)], cds: &[(u64, u64)]) -> Transcript {
        let (start, end) = (exons[0].0, exons[exons.len() - 1].1);
        Transcript::new(id, Interval::new("chr1", start, end), Strand::Plus)
            .with_exons(exons.iter().map(|(s, e)| Span::new(*s, *e)).collect())
            .with_cds(cds.iter().map(|(s, e)| Span::new(*s, *e)).collect())
            .finalize()
    }

    fn gene(id: &str, transcripts: Vec<Transcript>) -> Gene {
        let mut g = Gene::new(id, Interval::new("chr1", u64::MAX, 0), Strand::Plus);
        for t in transcripts {
            g.push_transcript(t);
        }
        g
    }

    fn locus_of(refr: &AnnotationSet, pred: &AnnotationSet) -> PairwiseLocus {
        let mut locus: Option<PairwiseLocus> = None;
        for (source, set) in [(Source::Reference, refr), (Source::Prediction, pred)] {
            for (id, g) in set.iter() {
                match locus.as_mut() {
                    Some(l) => l.add(source, id, &g.interval),
                    None => locus = Some(PairwiseLocus::new(source, id, &g.interval)),
                }
            }
        }
        locus.unwrap()
    }

    fn compare_all(
        refr: &AnnotationSet,
        pred: &AnnotationSet,
        config: &CompareConfig,
    ) -> LocusComparison {
        LocusComparator::new(refr, pred, config).compare(locus_of(refr, pred))
    }

    /// One gene with a single two-exon coding transcript `<id>.1`.
    fn two_exon(id: &str) -> AnnotationSet {
        let t = model(&format!("{}.1", id), &[(100, 200), (300, 500)], &[(120, 200), (300, 480)]);
        AnnotationSet::from_genes(vec![gene(id, vec![t])])
    }

    fn five_isoforms(prefix: &str) -> AnnotationSet {
        // Every isoform shares exon [100, 200), so each stands alone
        let transcripts = (0..5)
            .map(|i| {
                model(
                    &format!("{}.{}", prefix, i),
                    &[(100, 200), (300 + i * 10, 500)],
                    &[(150, 200), (300 + i * 10, 450)],
                )
            })
            .collect();
        AnnotationSet::from_genes(vec![gene(prefix, transcripts)])
    }

    #[test]
    fn test_pair_limit_marks_locus() {
        let refr = five_isoforms("r");
        let pred = five_isoforms("p");
        let config = CompareConfig::new().with_max_clique_pairs(10);
        let comparison = compare_all(&refr, &pred, &config);

        assert_eq!(comparison.status, LocusStatus::ExceedsLimit { pair_count: 25, limit: 10 });
        assert!(comparison.exceeds_limit());
        assert!(comparison.pairs.is_empty());
    }

    #[test]
    fn test_selector_claims_each_clique_once() {
        let refr = five_isoforms("r");
        let pred = five_isoforms("p");
        let config = CompareConfig::new().with_max_clique_pairs(0);
        let comparison = compare_all(&refr, &pred, &config);

        assert_eq!(comparison.status, LocusStatus::Compared);
        assert_eq!(comparison.pairs.len(), 5);
        let mut seen_refr = FxHashSet::default();
        let mut seen_pred = FxHashSet::default();
        for pair in &comparison.pairs {
            assert!(seen_refr.insert(pair.refr.transcripts().to_vec()));
            assert!(seen_pred.insert(pair.pred.transcripts().to_vec()));
            // Identical isoform sets pair off perfectly
            assert_eq!(pair.classification, Classification::PerfectMatch);
        }
        assert!(comparison.unique_refr.is_empty());
        assert!(comparison.novel_pred.is_empty());
    }

    #[test]
    fn test_simple_locus() {
        let refr = two_exon("g1");
        let pred = two_exon("p1");
        let config = CompareConfig::default();
        let comparison = compare_all(&refr, &pred, &config);

        assert_eq!(comparison.pairs.len(), 1);
        assert_eq!(comparison.pairs[0].classification, Classification::PerfectMatch);
        assert!(comparison.pairs[0].vectors.is_none());
    }

    #[test]
    fn test_best_isoform_wins_and_other_is_unique() {
        let refr = AnnotationSet::from_genes(vec![gene(
            "g1",
            vec![
                model("g1.1", &[(100, 200), (300, 500)], &[(120, 200), (300, 480)]),
                model("g1.2", &[(100, 500)], &[(120, 480)]),
            ],
        )]);
        let pred = two_exon("p1");
        let config = CompareConfig::default();
        let comparison = compare_all(&refr, &pred, &config);

        assert_eq!(comparison.pairs.len(), 1);
        assert_eq!(comparison.pairs[0].refr.ids(&refr), vec!["g1.1"]);
        assert_eq!(comparison.unique_refr.len(), 1);
        assert_eq!(comparison.unique_refr[0].ids(&refr), vec!["g1.2"]);
        assert!(comparison.novel_pred.is_empty());
    }

    #[test]
    fn test_reference_only_locus() {
        let t = model("g1.1", &[(100, 200)], &[(100, 200)]);
        let refr = AnnotationSet::from_genes(vec![gene("g1", vec![t])]);
        let pred = AnnotationSet::new();
        let locus =
            PairwiseLocus::new(Source::Reference, GeneId(0), &refr.gene(GeneId(0)).interval);
        let config = CompareConfig::default();
        let comparison = LocusComparator::new(&refr, &pred, &config).compare(locus);

        assert_eq!(comparison.status, LocusStatus::Unpaired);
        assert_eq!(comparison.unique_refr.len(), 1);
        assert!(comparison.novel_pred.is_empty());
        assert!(!comparison.has_pred());
    }

    /// Transcript ids of one source across pairs and unmatched cliques.
    fn reported<'a>(
        comparison: &LocusComparison,
        source: Source,
        set: &'a AnnotationSet,
    ) -> Vec<&'a str> {
        let mut ids = Vec::new();
        for pair in &comparison.pairs {
            let clique = match source {
                Source::Reference => &pair.refr,
                Source::Prediction => &pair.pred,
            };
            ids.extend(clique.ids(set));
        }
        let unmatched = match source {
            Source::Reference => &comparison.unique_refr,
            Source::Prediction => &comparison.novel_pred,
        };
        for clique in unmatched {
            ids.extend(clique.ids(set));
        }
        ids.sort_unstable();
        ids
    }

    /// t1 and t2 overlap; t3 is compatible with both, giving cliques {t1,t3} and {t2,t3}.
    fn overlapping_triple(prefix: &str) -> AnnotationSet {
        AnnotationSet::from_genes(vec![gene(
            prefix,
            vec![
                model(&format!("{}1", prefix), &[(100, 200)], &[(100, 200)]),
                model(&format!("{}2", prefix), &[(150, 250)], &[(150, 250)]),
                model(&format!("{}3", prefix), &[(600, 700)], &[(600, 700)]),
            ],
        )])
    }

    fn compatible_pair(prefix: &str) -> AnnotationSet {
        AnnotationSet::from_genes(vec![gene(
            prefix,
            vec![
                model(&format!("{}1", prefix), &[(100, 200)], &[(100, 200)]),
                model(&format!("{}3", prefix), &[(600, 700)], &[(600, 700)]),
            ],
        )])
    }

    #[test]
    fn test_partly_claimed_reference_clique_is_reduced() {
        let refr = overlapping_triple("t");
        let pred = compatible_pair("p");
        let config = CompareConfig::default();
        let comparison = compare_all(&refr, &pred, &config);

        assert_eq!(comparison.pairs.len(), 1);
        assert_eq!(comparison.pairs[0].refr.ids(&refr), vec!["t1", "t3"]);
        assert_eq!(comparison.pairs[0].pred.ids(&pred), vec!["p1", "p3"]);
        assert_eq!(comparison.pairs[0].classification, Classification::PerfectMatch);

        assert_eq!(comparison.unique_refr.len(), 1);
        assert_eq!(comparison.unique_refr[0].ids(&refr), vec!["t2"]);
        assert!(comparison.novel_pred.is_empty());

        assert_eq!(reported(&comparison, Source::Reference, &refr), vec!["t1", "t2", "t3"]);
        assert_eq!(reported(&comparison, Source::Prediction, &pred), vec!["p1", "p3"]);
    }

    #[test]
    fn test_partly_claimed_prediction_clique_is_reduced() {
        let refr = compatible_pair("r");
        let pred = overlapping_triple("p");
        let config = CompareConfig::default();
        let comparison = compare_all(&refr, &pred, &config);

        assert_eq!(comparison.pairs.len(), 1);
        assert_eq!(comparison.pairs[0].pred.ids(&pred), vec!["p1", "p3"]);
        assert!(comparison.unique_refr.is_empty());
        assert_eq!(comparison.novel_pred.len(), 1);
        assert_eq!(comparison.novel_pred[0].ids(&pred), vec!["p2"]);

        assert_eq!(reported(&comparison, Source::Reference, &refr), vec!["r1", "r3"]);
        assert_eq!(reported(&comparison, Source::Prediction, &pred), vec!["p1", "p2", "p3"]);
    }
}
