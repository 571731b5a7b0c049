//! Transcript cliques: maximal sets of mutually compatible transcripts.
//!
//! Two transcripts of one source are compatible when their exons share no
//! nucleotide. A clique is then one consistent reading of that source at a
//! locus, and the builder enumerates all maximal ones with Bron–Kerbosch.

use crate::config::CompareConfig;
use crate::feature::{AnnotationSet, TranscriptRef};
use crate::interval::Span;

/// A non-empty, ordered set of transcripts from one source at one locus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptClique {
    transcripts: Vec<TranscriptRef>,
}

impl TranscriptClique {
    /// Build a clique from transcript handles.
    ///
    /// # Panics
    /// If `transcripts` is empty.
    pub fn new(transcripts: Vec<TranscriptRef>) -> Self {
        assert!(!transcripts.is_empty(), "a transcript clique cannot be empty");
        Self { transcripts }
    }

    pub fn single(transcript: TranscriptRef) -> Self {
        Self {
            transcripts: vec![transcript],
        }
    }

    pub fn transcripts(&self) -> &[TranscriptRef] {
        &self.transcripts
    }

    pub fn len(&self) -> usize {
        self.transcripts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transcripts.is_empty()
    }

    pub fn contains(&self, transcript: TranscriptRef) -> bool {
        self.transcripts.contains(&transcript)
    }

    /// Transcript identifiers, in clique order.
    pub fn ids<'a>(&self, annotations: &'a AnnotationSet) -> Vec<&'a str> {
        self.transcripts
            .iter()
            .map(|t| annotations.transcript(*t).id.as_str())
            .collect()
    }

    /// Smallest span covering every transcript of the clique.
    pub fn span(&self, annotations: &AnnotationSet) -> Span {
        let mut start = u64::MAX;
        let mut end = 0;
        for t in &self.transcripts {
            let interval = &annotations.transcript(*t).interval;
            start = start.min(interval.start);
            end = end.max(interval.end);
        }
        Span::new(start, end)
    }

    pub fn exon_count(&self, annotations: &AnnotationSet) -> usize {
        self.transcripts
            .iter()
            .map(|t| annotations.transcript(*t).exon_count())
            .sum()
    }

    pub fn cds_length(&self, annotations: &AnnotationSet) -> u64 {
        self.transcripts
            .iter()
            .map(|t| annotations.transcript(*t).cds_length())
            .sum()
    }

    pub fn has_utrs(&self, annotations: &AnnotationSet) -> bool {
        self.transcripts
            .iter()
            .any(|t| annotations.transcript(*t).has_utrs())
    }
}

/// How the cliques of one side were obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CliqueMode {
    /// Exactly one transcript: one clique, nothing enumerated.
    Trivial,
    /// Full maximal-clique enumeration.
    Enumerated,
    /// Too many transcripts: one clique per transcript.
    Singletons,
}

/// Cliques for both sides of a locus.
#[derive(Debug, Clone)]
pub struct LocusCliques {
    pub refr: Vec<TranscriptClique>,
    pub pred: Vec<TranscriptClique>,
    pub refr_mode: CliqueMode,
    pub pred_mode: CliqueMode,
}

impl LocusCliques {
    /// Number of reference × prediction combinations.
    pub fn pair_count(&self) -> usize {
        self.refr.len() * self.pred.len()
    }

    /// True if neither side ran the full enumeration.
    pub fn is_simple(&self) -> bool {
        self.refr_mode == CliqueMode::Trivial && self.pred_mode == CliqueMode::Trivial
    }
}

/// Enumerates transcript cliques within the limits of a [`CompareConfig`].
pub struct CliqueBuilder<'a> {
    config: &'a CompareConfig,
}

impl<'a> CliqueBuilder<'a> {
    pub fn new(config: &'a CompareConfig) -> Self {
        Self { config }
    }

    /// Build cliques for both sides of a locus with transcripts on each side.
    pub fn build_pairwise(
        &self,
        refr_annotations: &AnnotationSet,
        refr: &[TranscriptRef],
        pred_annotations: &AnnotationSet,
        pred: &[TranscriptRef],
    ) -> LocusCliques {
        // Simple locus: one transcript each, the overwhelmingly common case
        if refr.len() == 1 && pred.len() == 1 {
            return LocusCliques {
                refr: vec![TranscriptClique::single(refr[0])],
                pred: vec![TranscriptClique::single(pred[0])],
                refr_mode: CliqueMode::Trivial,
                pred_mode: CliqueMode::Trivial,
            };
        }

        let (refr_cliques, refr_mode) = self.build(refr_annotations, refr);
        let (pred_cliques, pred_mode) = self.build(pred_annotations, pred);
        LocusCliques {
            refr: refr_cliques,
            pred: pred_cliques,
            refr_mode,
            pred_mode,
        }
    }

    /// Build the cliques of one source's transcripts at a locus.
    pub fn build(
        &self,
        annotations: &AnnotationSet,
        transcripts: &[TranscriptRef],
    ) -> (Vec<TranscriptClique>, CliqueMode) {
        match transcripts.len() {
            0 => (Vec::new(), CliqueMode::Trivial),
            1 => (vec![TranscriptClique::single(transcripts[0])], CliqueMode::Trivial),
            n if self.config.exceeds_transcript_limit(n) => {
                log::info!(
                    "{} transcripts exceed the enumeration limit of {}; one clique each",
                    n,
                    self.config.max_transcripts_per_locus
                );
                let singletons = transcripts
                    .iter()
                    .copied()
                    .map(TranscriptClique::single)
                    .collect();
                (singletons, CliqueMode::Singletons)
            }
            _ => (enumerate_cliques(annotations, transcripts), CliqueMode::Enumerated),
        }
    }
}

/// All maximal cliques of the compatibility graph over `transcripts`.
fn enumerate_cliques(
    annotations: &AnnotationSet,
    transcripts: &[TranscriptRef],
) -> Vec<TranscriptClique> {
    let n = transcripts.len();
    let mut compatible = vec![vec![false; n]; n];
    for i in 0..n {
        let a = annotations.transcript(transcripts[i]);
        for j in (i + 1)..n {
            let b = annotations.transcript(transcripts[j]);
            let ok = !a.exons_overlap(b);
            compatible[i][j] = ok;
            compatible[j][i] = ok;
        }
    }

    let mut found = Vec::new();
    let mut current = Vec::new();
    bron_kerbosch(&compatible, &mut current, (0..n).collect(), Vec::new(), &mut found);
    found.sort();

    found
        .into_iter()
        .map(|members| TranscriptClique::new(members.into_iter().map(|i| transcripts[i]).collect()))
        .collect()
}

fn bron_kerbosch(
    adj: &[Vec<bool>],
    current: &mut Vec<usize>,
    mut candidates: Vec<usize>,
    mut excluded: Vec<usize>,
    found: &mut Vec<Vec<usize>>,
) {
    if candidates.is_empty() {
        if excluded.is_empty() {
            let mut clique = current.clone();
            clique.sort_unstable();
            found.push(clique);
        }
        return;
    }

    // Pivot on the vertex with the most neighbours among the candidates
    let pivot = candidates
        .iter()
        .chain(excluded.iter())
        .copied()
        .max_by_key(|&u| candidates.iter().filter(|&&v| adj[u][v]).count());
    let branches: Vec<usize> = candidates
        .iter()
        .copied()
        .filter(|&v| pivot.map_or(true, |u| !adj[u][v]))
        .collect();

    for v in branches {
        current.push(v);
        let next_candidates = candidates.iter().copied().filter(|&w| adj[v][w]).collect();
        let next_excluded = excluded.iter().copied().filter(|&w| adj[v][w]).collect();
        bron_kerbosch(adj, current, next_candidates, next_excluded, found);
        current.pop();

        candidates.retain(|&w| w != v);
        excluded.push(v);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feature::{Gene, Transcript};
    use crate::interval::{Interval, Strand};

    fn transcript(id: &str, exons: &[(u64, u64)]) -> Transcript {
        let start = exons.first().map(|e| e.0).unwrap_or(0);
        let end = exons.last().map(|e| e.1).unwrap_or(0);
        Transcript::new(id, Interval::new("chr1", start, end), Strand::Plus)
            .with_exons(exons.iter().map(|(s, e)| Span::new(*s, *e)).collect())
            .finalize()
    }

    fn one_gene(transcripts: Vec<Transcript>) -> (AnnotationSet, Vec<TranscriptRef>) {
        let mut gene = Gene::new("g", Interval::new("chr1", 0, 0), Strand::Plus);
        gene.interval.start = u64::MAX;
        for t in transcripts {
            gene.push_transcript(t);
        }
        let mut set = AnnotationSet::new();
        let id = set.push(gene);
        let refs = set.transcript_refs(id).collect();
        (set, refs)
    }

    fn clique_ids(set: &AnnotationSet, cliques: &[TranscriptClique]) -> Vec<Vec<String>> {
        cliques
            .iter()
            .map(|c| c.ids(set).into_iter().map(String::from).collect())
            .collect()
    }

    #[test]
    fn test_isoforms_and_neighbour() {
        // t1 and t2 are competing isoforms, t3 sits downstream
        let (set, refs) = one_gene(vec![
            transcript("t1", &[(100, 200), (300, 400)]),
            transcript("t2", &[(150, 250)]),
            transcript("t3", &[(600, 700)]),
        ]);
        let config = CompareConfig::default();
        let (cliques, mode) = CliqueBuilder::new(&config).build(&set, &refs);

        assert_eq!(mode, CliqueMode::Enumerated);
        assert_eq!(
            clique_ids(&set, &cliques),
            vec![vec!["t1", "t3"], vec!["t2", "t3"]]
        );
    }

    #[test]
    fn test_intron_nesting_is_compatible() {
        // t2 lies entirely inside t1's intron
        let (set, refs) = one_gene(vec![
            transcript("t1", &[(100, 200), (800, 900)]),
            transcript("t2", &[(400, 500)]),
        ]);
        let config = CompareConfig::default();
        let (cliques, _) = CliqueBuilder::new(&config).build(&set, &refs);
        assert_eq!(clique_ids(&set, &cliques), vec![vec!["t1", "t2"]]);
    }

    #[test]
    fn test_mutually_overlapping_give_singletons() {
        let (set, refs) = one_gene(
            (0..5)
                .map(|i| transcript(&format!("t{}", i), &[(100, 200 + i * 10)]))
                .collect(),
        );
        let config = CompareConfig::default();
        let (cliques, mode) = CliqueBuilder::new(&config).build(&set, &refs);

        assert_eq!(mode, CliqueMode::Enumerated);
        assert_eq!(cliques.len(), 5);
        assert!(cliques.iter().all(|c| c.len() == 1));
    }

    #[test]
    fn test_transcript_cap_falls_back_to_singletons() {
        let (set, refs) = one_gene(vec![
            transcript("t1", &[(100, 200)]),
            transcript("t2", &[(300, 400)]),
            transcript("t3", &[(500, 600)]),
        ]);
        let config = CompareConfig::new().with_max_transcripts(2);
        let (cliques, mode) = CliqueBuilder::new(&config).build(&set, &refs);

        assert_eq!(mode, CliqueMode::Singletons);
        assert_eq!(cliques.len(), 3);
    }

    #[test]
    fn test_simple_locus_fast_path() {
        let (refr, refr_refs) = one_gene(vec![transcript("r1", &[(100, 200)])]);
        let (pred, pred_refs) = one_gene(vec![transcript("p1", &[(120, 220)])]);
        let config = CompareConfig::default();

        let cliques =
            CliqueBuilder::new(&config).build_pairwise(&refr, &refr_refs, &pred, &pred_refs);
        assert!(cliques.is_simple());
        assert_eq!(cliques.pair_count(), 1);
    }

    #[test]
    fn test_clique_summaries() {
        let (set, refs) = one_gene(vec![
            transcript("t1", &[(100, 200), (300, 400)]),
            transcript("t2", &[(600, 700)]),
        ]);
        let clique = TranscriptClique::new(refs.clone());
        assert_eq!(clique.exon_count(&set), 3);
        assert_eq!(clique.span(&set), Span::new(100, 700));
        assert!(clique.contains(refs[1]));
        assert!(!clique.has_utrs(&set));
    }

    #[test]
    #[should_panic]
    fn test_empty_clique_is_rejected() {
        TranscriptClique::new(Vec::new());
    }
}
