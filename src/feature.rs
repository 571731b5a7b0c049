//! Immutable gene and transcript annotations, owned once by an [`AnnotationSet`].
//!
//! Loci, cliques and pairs never hold features directly. They hold
//! [`GeneId`] and [`TranscriptRef`] handles into the arena that owns them.

use crate::interval::{Interval, Span, Strand};
use rustc_hash::FxHashSet;
use std::fmt;

/// Which side of a comparison a feature came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Source {
    Reference,
    Prediction,
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Reference => write!(f, "reference"),
            Source::Prediction => write!(f, "prediction"),
        }
    }
}

/// Handle of a gene inside its [`AnnotationSet`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GeneId(pub usize);

/// Handle of a transcript: owning gene plus position among its transcripts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TranscriptRef {
    pub gene: GeneId,
    pub index: usize,
}

/// Orientation of an untranslated segment relative to the coding sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum UtrKind {
    FivePrime,
    ThreePrime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Utr {
    pub span: Span,
    pub kind: UtrKind,
}

impl Utr {
    pub fn new(start: u64, end: u64, kind: UtrKind) -> Self {
        Self {
            span: Span::new(start, end),
            kind,
        }
    }
}

/// A transcript with its exon, CDS and UTR segments, each sorted by start.
#[derive(Debug, Clone, PartialEq)]
pub struct Transcript {
    pub id: String,
    pub interval: Interval,
    pub strand: Strand,
    pub exons: Vec<Span>,
    pub cds: Vec<Span>,
    pub utrs: Vec<Utr>,
}

impl Transcript {
    pub fn new(id: impl Into<String>, interval: Interval, strand: Strand) -> Self {
        Self {
            id: id.into(),
            interval,
            strand,
            exons: Vec::new(),
            cds: Vec::new(),
            utrs: Vec::new(),
        }
    }

    pub fn with_exons(mut self, exons: Vec<Span>) -> Self {
        self.exons = exons;
        self
    }

    pub fn with_cds(mut self, cds: Vec<Span>) -> Self {
        self.cds = cds;
        self
    }

    pub fn with_utrs(mut self, utrs: Vec<Utr>) -> Self {
        self.utrs = utrs;
        self
    }

    /// Sort sub-features and fill in whatever structure can be inferred.
    ///
    /// Missing exons become the merged union of CDS and UTR segments.
    /// Missing UTRs become exon minus CDS, labelled by strand.
    pub fn finalize(mut self) -> Self {
        self.cds.sort();
        self.utrs.sort();

        if self.exons.is_empty() {
            let mut pieces: Vec<Span> = self.cds.clone();
            pieces.extend(self.utrs.iter().map(|u| u.span));
            pieces.sort();
            self.exons = merge_adjacent(pieces);
        } else {
            self.exons.sort();
        }

        if self.utrs.is_empty() && !self.cds.is_empty() {
            self.utrs = self.derive_utrs();
        }

        if let (Some(first), Some(last)) = (self.exons.first(), self.exons.last()) {
            self.interval.start = self.interval.start.min(first.start);
            self.interval.end = self.interval.end.max(last.end);
        }
        self
    }

    fn derive_utrs(&self) -> Vec<Utr> {
        let (cds_start, cds_end) = match (self.cds.first(), self.cds.last()) {
            (Some(first), Some(last)) => (first.start, last.end),
            _ => return Vec::new(),
        };
        let (left, right) = match self.strand {
            Strand::Minus => (UtrKind::ThreePrime, UtrKind::FivePrime),
            _ => (UtrKind::FivePrime, UtrKind::ThreePrime),
        };

        let mut utrs = Vec::new();
        for exon in &self.exons {
            let mut pieces = vec![*exon];
            for cds in &self.cds {
                pieces = pieces.iter().flat_map(|p| p.subtract(cds)).collect();
            }
            for piece in pieces.into_iter().filter(|p| !p.is_empty()) {
                if piece.end <= cds_start {
                    utrs.push(Utr { span: piece, kind: left });
                } else if piece.start >= cds_end {
                    utrs.push(Utr { span: piece, kind: right });
                }
            }
        }
        utrs.sort();
        utrs
    }

    pub fn exon_count(&self) -> usize {
        self.exons.len()
    }

    /// Total coding length in nucleotides.
    pub fn cds_length(&self) -> u64 {
        self.cds.iter().map(Span::len).sum()
    }

    pub fn has_utrs(&self) -> bool {
        !self.utrs.is_empty()
    }

    /// True if any exon of `self` shares a nucleotide with any exon of `other`.
    pub fn exons_overlap(&self, other: &Transcript) -> bool {
        if self.interval.seqid != other.interval.seqid
            || !self.interval.overlaps(&other.interval)
        {
            return false;
        }
        let (mut i, mut j) = (0, 0);
        while i < self.exons.len() && j < other.exons.len() {
            let (a, b) = (&self.exons[i], &other.exons[j]);
            if a.overlaps(b) {
                return true;
            }
            if a.end <= b.end {
                i += 1;
            } else {
                j += 1;
            }
        }
        false
    }
}

fn merge_adjacent(sorted: Vec<Span>) -> Vec<Span> {
    let mut merged: Vec<Span> = Vec::with_capacity(sorted.len());
    for span in sorted {
        match merged.last_mut() {
            Some(cur) if span.start <= cur.end => cur.end = cur.end.max(span.end),
            _ => merged.push(span),
        }
    }
    merged
}

/// A gene with zero or more transcripts.
#[derive(Debug, Clone, PartialEq)]
pub struct Gene {
    pub id: String,
    pub interval: Interval,
    pub strand: Strand,
    pub transcripts: Vec<Transcript>,
}

impl Gene {
    pub fn new(id: impl Into<String>, interval: Interval, strand: Strand) -> Self {
        Self {
            id: id.into(),
            interval,
            strand,
            transcripts: Vec::new(),
        }
    }

    pub fn with_transcript(mut self, transcript: Transcript) -> Self {
        self.push_transcript(transcript);
        self
    }

    /// Attach a transcript, growing the gene range to cover it.
    pub fn push_transcript(&mut self, transcript: Transcript) {
        self.interval.start = self.interval.start.min(transcript.interval.start);
        self.interval.end = self.interval.end.max(transcript.interval.end);
        self.transcripts.push(transcript);
    }
}

/// Arena owning every gene of one annotation source.
#[derive(Debug, Clone, Default)]
pub struct AnnotationSet {
    genes: Vec<Gene>,
}

impl AnnotationSet {
    pub fn new() -> Self {
        Self { genes: Vec::new() }
    }

    pub fn from_genes(genes: Vec<Gene>) -> Self {
        Self { genes }
    }

    /// Add a gene, returning its handle.
    pub fn push(&mut self, gene: Gene) -> GeneId {
        self.genes.push(gene);
        GeneId(self.genes.len() - 1)
    }

    /// Look up a gene. Handles are only ever issued by this set.
    #[inline]
    pub fn gene(&self, id: GeneId) -> &Gene {
        &self.genes[id.0]
    }

    #[inline]
    pub fn transcript(&self, tref: TranscriptRef) -> &Transcript {
        &self.genes[tref.gene.0].transcripts[tref.index]
    }

    pub fn iter(&self) -> impl Iterator<Item = (GeneId, &Gene)> {
        self.genes.iter().enumerate().map(|(i, g)| (GeneId(i), g))
    }

    /// Transcript handles for a gene, in annotation order.
    pub fn transcript_refs(&self, gene: GeneId) -> impl Iterator<Item = TranscriptRef> + '_ {
        (0..self.gene(gene).transcripts.len()).map(move |index| TranscriptRef { gene, index })
    }

    /// Sequence ids in order of first appearance.
    pub fn seqids(&self) -> Vec<String> {
        let mut seen = FxHashSet::default();
        let mut seqids = Vec::new();
        for gene in &self.genes {
            if seen.insert(gene.interval.seqid.as_str()) {
                seqids.push(gene.interval.seqid.clone());
            }
        }
        seqids
    }

    pub fn transcript_count(&self) -> usize {
        self.genes.iter().map(|g| g.transcripts.len()).sum()
    }

    pub fn len(&self) -> usize {
        self.genes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.genes.is_empty()
    }
}
