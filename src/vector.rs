//! Model vectors and structural units of a transcript clique.
//!
//! A model vector holds one symbol per nucleotide of the locus range:
//!
//! | symbol | meaning |
//! |---|---|
//! | `G` | intergenic |
//! | `F` | 5′ UTR |
//! | `T` | 3′ UTR |
//! | `C` | coding sequence |
//! | `I` | intron |
//! | `E` | exon with no coding or UTR label |

use crate::clique::TranscriptClique;
use crate::feature::{AnnotationSet, Utr, UtrKind};
use crate::interval::{Interval, Span};
use std::fmt;

/// Cap on exon-level units (exons and CDS segments) kept per clique.
pub const MAX_EXONS: usize = 512;

/// Cap on UTR units kept per clique.
pub const MAX_UTRS: usize = 64;

pub const INTERGENIC: u8 = b'G';
pub const FIVE_PRIME_UTR: u8 = b'F';
pub const THREE_PRIME_UTR: u8 = b'T';
pub const CODING: u8 = b'C';
pub const INTRON: u8 = b'I';
pub const EXON: u8 = b'E';

/// Per-nucleotide encoding of a clique over a locus range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelVector {
    offset: u64,
    symbols: Vec<u8>,
}

impl ModelVector {
    /// Encode `clique` across `locus`.
    pub fn build(clique: &TranscriptClique, annotations: &AnnotationSet, locus: &Interval) -> Self {
        let mut vector = Self {
            offset: locus.start,
            symbols: vec![INTERGENIC; locus.len() as usize],
        };

        for tref in clique.transcripts() {
            let t = annotations.transcript(*tref);
            if let (Some(first), Some(last)) = (t.exons.first(), t.exons.last()) {
                vector.paint(Span::new(first.start, last.end), INTRON);
            }
            for exon in &t.exons {
                vector.paint(*exon, EXON);
            }
            for utr in &t.utrs {
                let symbol = match utr.kind {
                    UtrKind::FivePrime => FIVE_PRIME_UTR,
                    UtrKind::ThreePrime => THREE_PRIME_UTR,
                };
                vector.paint(utr.span, symbol);
            }
            for cds in &t.cds {
                vector.paint(*cds, CODING);
            }
        }
        vector
    }

    fn paint(&mut self, span: Span, symbol: u8) {
        let len = self.symbols.len() as u64;
        let start = span.start.saturating_sub(self.offset).min(len) as usize;
        let end = span.end.saturating_sub(self.offset).min(len) as usize;
        if start < end {
            self.symbols[start..end].fill(symbol);
        }
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.symbols
    }
}

impl fmt::Display for ModelVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Symbols are always ASCII
        f.write_str(&String::from_utf8_lossy(&self.symbols))
    }
}

/// Distinct, sorted structural units of a clique.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StructureUnits {
    pub cds: Vec<Span>,
    pub exons: Vec<Span>,
    pub utrs: Vec<Utr>,
}

impl StructureUnits {
    /// Collect the units of every transcript in `clique`, capped at
    /// [`MAX_EXONS`] and [`MAX_UTRS`].
    pub fn collect(clique: &TranscriptClique, annotations: &AnnotationSet) -> Self {
        let mut units = Self::default();
        for tref in clique.transcripts() {
            let t = annotations.transcript(*tref);
            units.cds.extend_from_slice(&t.cds);
            units.exons.extend_from_slice(&t.exons);
            units.utrs.extend_from_slice(&t.utrs);
        }
        units.cds.sort_unstable();
        units.cds.dedup();
        units.exons.sort_unstable();
        units.exons.dedup();
        units.utrs.sort_unstable();
        units.utrs.dedup();

        let label = || clique.ids(annotations).join(",");
        if units.exons.len() > MAX_EXONS {
            log::warn!(
                "clique [{}] has {} exons, keeping the first {}",
                label(),
                units.exons.len(),
                MAX_EXONS
            );
            units.exons.truncate(MAX_EXONS);
        }
        if units.cds.len() > MAX_EXONS {
            log::warn!(
                "clique [{}] has {} CDS segments, keeping the first {}",
                label(),
                units.cds.len(),
                MAX_EXONS
            );
            units.cds.truncate(MAX_EXONS);
        }
        if units.utrs.len() > MAX_UTRS {
            log::warn!(
                "clique [{}] has {} UTR segments, keeping the first {}",
                label(),
                units.utrs.len(),
                MAX_UTRS
            );
            units.utrs.truncate(MAX_UTRS);
        }
        units
    }

    /// UTR spans with orientation dropped.
    pub fn utr_spans(&self) -> Vec<Span> {
        let mut spans: Vec<Span> = self.utrs.iter().map(|u| u.span).collect();
        spans.sort_unstable();
        spans.dedup();
        spans
    }
}
