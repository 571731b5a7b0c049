//! Loci: maximal groups of overlapping genes on one sequence.

use crate::feature::{AnnotationSet, GeneId, Source, TranscriptRef};
use crate::interval::Interval;

/// A locus built from a single annotation source.
#[derive(Debug, Clone, PartialEq)]
pub struct Locus {
    pub interval: Interval,
    pub genes: Vec<GeneId>,
    /// Index query failures seen while this locus was being expanded.
    pub notes: Vec<String>,
}

impl Locus {
    /// Seed a locus with one gene.
    pub fn new(gene: GeneId, interval: &Interval) -> Self {
        Self {
            interval: interval.clone(),
            genes: vec![gene],
            notes: Vec::new(),
        }
    }

    /// Add a gene, growing the locus range to cover it.
    pub fn add(&mut self, gene: GeneId, interval: &Interval) {
        self.interval.extend(interval);
        self.genes.push(gene);
    }

    pub fn seqid(&self) -> &str {
        &self.interval.seqid
    }

    /// True if an index failure may have caused this locus to under-merge.
    pub fn is_degraded(&self) -> bool {
        !self.notes.is_empty()
    }

    pub fn transcript_count(&self, annotations: &AnnotationSet) -> usize {
        self.genes
            .iter()
            .map(|g| annotations.gene(*g).transcripts.len())
            .sum()
    }
}

/// A locus holding genes from a reference and a prediction source.
#[derive(Debug, Clone, PartialEq)]
pub struct PairwiseLocus {
    pub interval: Interval,
    pub refr_genes: Vec<GeneId>,
    pub pred_genes: Vec<GeneId>,
    pub notes: Vec<String>,
}

impl PairwiseLocus {
    /// Seed a locus with one gene from `source`.
    pub fn new(source: Source, gene: GeneId, interval: &Interval) -> Self {
        let mut locus = Self {
            interval: interval.clone(),
            refr_genes: Vec::new(),
            pred_genes: Vec::new(),
            notes: Vec::new(),
        };
        locus.genes_mut(source).push(gene);
        locus
    }

    /// Add a gene from `source`, growing the locus range to cover it.
    pub fn add(&mut self, source: Source, gene: GeneId, interval: &Interval) {
        self.interval.extend(interval);
        self.genes_mut(source).push(gene);
    }

    pub fn genes(&self, source: Source) -> &[GeneId] {
        match source {
            Source::Reference => &self.refr_genes,
            Source::Prediction => &self.pred_genes,
        }
    }

    fn genes_mut(&mut self, source: Source) -> &mut Vec<GeneId> {
        match source {
            Source::Reference => &mut self.refr_genes,
            Source::Prediction => &mut self.pred_genes,
        }
    }

    pub fn seqid(&self) -> &str {
        &self.interval.seqid
    }

    pub fn is_degraded(&self) -> bool {
        !self.notes.is_empty()
    }

    /// Every transcript of `source` at this locus, gene by gene.
    pub fn transcripts(&self, source: Source, annotations: &AnnotationSet) -> Vec<TranscriptRef> {
        self.genes(source)
            .iter()
            .flat_map(|g| annotations.transcript_refs(*g))
            .collect()
    }

    /// Identifiers of the genes of `source` at this locus.
    pub fn gene_ids<'a>(&self, source: Source, annotations: &'a AnnotationSet) -> Vec<&'a str> {
        self.genes(source)
            .iter()
            .map(|g| annotations.gene(*g).id.as_str())
            .collect()
    }
}
