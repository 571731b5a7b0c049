//! Loci command: cluster a single annotation source into loci.

use crate::cluster::IndexedSource;
use crate::error::{Result, SequenceError};
use crate::feature::AnnotationSet;
use crate::gff3::read_annotations;
use crate::index::{FeatureIndex, IntervalIndex};
use crate::locus::Locus;
use crate::parallel::cluster_sequences;
use crate::report::write_locus_listing;
use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;

/// Loci of one source, with the sequences that could not be clustered.
#[derive(Debug, Default)]
pub struct LociListing {
    /// Loci per sequence, each list in coordinate order.
    pub loci: BTreeMap<String, Vec<Locus>>,
    pub failures: Vec<SequenceError>,
}

impl LociListing {
    pub fn locus_count(&self) -> usize {
        self.loci.values().map(Vec::len).sum()
    }
}

/// Loci command configuration.
#[derive(Debug, Clone, Default)]
pub struct LociCommand;

impl LociCommand {
    pub fn new() -> Self {
        Self
    }

    /// Cluster every sequence of `annotations`, keyed by sequence id.
    pub fn cluster(&self, annotations: &AnnotationSet) -> LociListing {
        let index = IntervalIndex::from_annotations(annotations);
        let source = IndexedSource::new(annotations, &index);
        let (loci, failures) = cluster_sequences(source, &index.sequence_ids());
        LociListing { loci, failures }
    }

    /// Load one or more GFF3 files as one source and write the locus listing.
    ///
    /// Sequences that failed are left out of the listing and returned in
    /// [`LociListing::failures`].
    pub fn run<P: AsRef<Path>, W: Write>(
        &self,
        inputs: &[P],
        output: &mut W,
    ) -> Result<LociListing> {
        let annotations = read_annotations(inputs)?;
        let listing = self.cluster(&annotations);

        for locus in listing.loci.values().flatten() {
            write_locus_listing(output, locus, &annotations)?;
        }
        output.flush()?;
        log::info!("{} loci written", listing.locus_count());
        Ok(listing)
    }
}
