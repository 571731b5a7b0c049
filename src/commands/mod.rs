//! Command implementations for annocmp.

pub mod compare;
pub mod loci;

pub use compare::CompareCommand;
pub use loci::{LociCommand, LociListing};
