//! Interval indexing for fast overlap queries over gene features.

use crate::error::IndexError;
use crate::feature::{AnnotationSet, GeneId};
use crate::interval::Span;
use std::collections::HashMap;

pub type Result<T> = std::result::Result<T, IndexError>;

/// Range queries over one annotation source.
///
/// Implementations are read-only once built, so concurrent queries from
/// different workers need no locking.
pub trait FeatureIndex: Send + Sync {
    /// All sequence ids known to this index, in first-appearance order.
    fn sequence_ids(&self) -> Vec<String>;

    fn contains_sequence(&self, seqid: &str) -> bool;

    /// Genes on `seqid` in annotation (file) order.
    fn features_for_sequence(&self, seqid: &str) -> Result<Vec<GeneId>>;

    /// Genes on `seqid` overlapping `range`, possibly empty.
    fn features_overlapping(&self, seqid: &str, range: Span) -> Result<Vec<GeneId>>;
}

/// Per-sequence storage: file order plus a start-sorted list for queries.
#[derive(Debug, Default)]
struct SequenceEntries {
    in_order: Vec<GeneId>,
    by_start: Vec<(Span, GeneId)>,
    max_len: u64,
}

/// An indexed collection of genes organized by sequence id.
/// Uses a sorted list with binary search for efficient queries.
#[derive(Debug, Default)]
pub struct IntervalIndex {
    by_seqid: HashMap<String, SequenceEntries>,
    order: Vec<String>,
}

impl IntervalIndex {
    /// Create a new empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an index over every gene of an annotation set.
    pub fn from_annotations(annotations: &AnnotationSet) -> Self {
        let mut by_seqid: HashMap<String, SequenceEntries> = HashMap::new();
        let mut order = Vec::new();

        for (id, gene) in annotations.iter() {
            let entries = by_seqid
                .entry(gene.interval.seqid.clone())
                .or_insert_with(|| {
                    order.push(gene.interval.seqid.clone());
                    SequenceEntries::default()
                });
            let span = gene.interval.span();
            entries.in_order.push(id);
            entries.by_start.push((span, id));
            entries.max_len = entries.max_len.max(span.len());
        }

        // Sort each sequence's genes by start position
        for entries in by_seqid.values_mut() {
            entries
                .by_start
                .sort_by(|a, b| a.0.start.cmp(&b.0.start).then(a.0.end.cmp(&b.0.end)));
        }

        Self { by_seqid, order }
    }

    /// Total number of indexed genes.
    pub fn len(&self) -> usize {
        self.by_seqid.values().map(|e| e.in_order.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.by_seqid.is_empty()
    }
}

impl FeatureIndex for IntervalIndex {
    fn sequence_ids(&self) -> Vec<String> {
        self.order.clone()
    }

    fn contains_sequence(&self, seqid: &str) -> bool {
        self.by_seqid.contains_key(seqid)
    }

    fn features_for_sequence(&self, seqid: &str) -> Result<Vec<GeneId>> {
        self.by_seqid
            .get(seqid)
            .map(|e| e.in_order.clone())
            .ok_or_else(|| IndexError::NotFound(seqid.to_string()))
    }

    fn features_overlapping(&self, seqid: &str, range: Span) -> Result<Vec<GeneId>> {
        if range.start > range.end {
            return Err(IndexError::QueryError {
                seqid: seqid.to_string(),
                start: range.start,
                end: range.end,
                message: "range start exceeds range end".to_string(),
            });
        }
        let entries = self
            .by_seqid
            .get(seqid)
            .ok_or_else(|| IndexError::NotFound(seqid.to_string()))?;

        // No gene starting before `query.start - max_len` can reach the query
        let first = entries
            .by_start
            .partition_point(|(span, _)| span.start + entries.max_len <= range.start);

        let mut results = Vec::new();
        for (span, id) in &entries.by_start[first..] {
            if span.start >= range.end {
                break;
            }
            if span.overlaps(&range) {
                results.push(*id);
            }
        }
        Ok(results)
    }
}
