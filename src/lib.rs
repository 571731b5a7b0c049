// Clippy allows for the whole crate
#![allow(clippy::too_many_arguments)]
#![allow(clippy::type_complexity)]

//! annocmp: gene annotation comparison
//!
//! Clusters gene models into loci and compares a reference annotation with a
//! prediction locus by locus, pairing up alternative transcript groupings
//! ("cliques") and classifying how well each prediction matches.
//!
//! # Example
//!
//! ```rust,no_run
//! use annocmp::{commands::CompareCommand, gff3::read_annotations};
//!
//! let refr = read_annotations(&["refr.gff3"]).unwrap();
//! let pred = read_annotations(&["pred.gff3"]).unwrap();
//!
//! let run = CompareCommand::new().compare(&refr, &pred);
//! println!("{} loci compared", run.locus_count());
//! ```

pub mod clique;
pub mod cluster;
pub mod commands;
pub mod compare;
pub mod config;
pub mod error;
pub mod feature;
pub mod gff3;
pub mod index;
pub mod interval;
pub mod locus;
pub mod pair;
pub mod parallel;
pub mod report;
pub mod stats;
pub mod summary;
pub mod vector;

// Re-export commonly used types
pub use config::CompareConfig;
pub use feature::{AnnotationSet, Gene, GeneId, Source, Transcript, TranscriptRef};
pub use gff3::{read_annotations, Gff3Reader};
pub use index::{FeatureIndex, IntervalIndex};
pub use interval::{Interval, Span, Strand};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::cluster::{cluster_sequence, cluster_sequence_pairwise, IndexedSource};
    pub use crate::commands::{CompareCommand, LociCommand};
    pub use crate::compare::{LocusComparator, LocusComparison, LocusStatus};
    pub use crate::config::CompareConfig;
    pub use crate::feature::{AnnotationSet, Gene, GeneId, Source, Transcript, TranscriptRef};
    pub use crate::gff3::{read_annotations, Gff3Reader};
    pub use crate::index::{FeatureIndex, IntervalIndex};
    pub use crate::interval::{Interval, Span, Strand};
    pub use crate::pair::{CliquePair, Classification};
}
