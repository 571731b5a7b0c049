//! Parallel processing by sequence id using Rayon.
//!
//! One sequence is one unit of work: its loci are clustered and compared
//! sequentially by a single worker. Workers send finished sequences over a
//! channel and the calling thread folds them into the run result.

use crate::cluster::{cluster_sequence, cluster_sequence_pairwise, IndexedSource};
use crate::compare::{LocusComparator, LocusComparison};
use crate::config::CompareConfig;
use crate::error::SequenceError;
use crate::locus::Locus;
use crate::summary::SummaryData;
use crossbeam_channel::unbounded;
use rayon::prelude::*;
use rustc_hash::FxHashSet;
use std::collections::BTreeMap;

/// Sequence ids of both sources: reference order first, then ids only the
/// prediction knows.
pub fn sequence_union(refr: IndexedSource<'_>, pred: IndexedSource<'_>) -> Vec<String> {
    let mut seen = FxHashSet::default();
    let mut seqids = Vec::new();
    for seqid in refr.index.sequence_ids().into_iter().chain(pred.index.sequence_ids()) {
        if seen.insert(seqid.clone()) {
            seqids.push(seqid);
        }
    }
    seqids
}

/// Finished comparison of one sequence.
#[derive(Debug)]
pub struct SequenceOutcome {
    pub seqid: String,
    pub result: Result<(Vec<LocusComparison>, SummaryData), SequenceError>,
}

/// Everything produced by a comparison run.
#[derive(Debug)]
pub struct RunResult {
    /// Analysed loci per sequence, each list in coordinate order.
    pub loci: BTreeMap<String, Vec<LocusComparison>>,
    /// Sequences whose processing was abandoned.
    pub failures: Vec<SequenceError>,
    pub summary: SummaryData,
}

impl RunResult {
    pub fn sequences(&self) -> impl Iterator<Item = &str> {
        self.loci.keys().map(String::as_str)
    }

    pub fn locus_count(&self) -> usize {
        self.loci.values().map(Vec::len).sum()
    }
}

/// Cluster and compare one sequence.
pub fn compare_sequence(
    refr: IndexedSource<'_>,
    pred: IndexedSource<'_>,
    seqid: &str,
    config: &CompareConfig,
) -> Result<(Vec<LocusComparison>, SummaryData), SequenceError> {
    let loci = cluster_sequence_pairwise(refr, pred, seqid)?;
    let comparator = LocusComparator::new(refr.annotations, pred.annotations, config);
    let mut summary = SummaryData::new(config.tolerance);

    let comparisons: Vec<LocusComparison> = loci
        .into_iter()
        .map(|locus| {
            let comparison = comparator.compare(locus);
            summary.record_locus(&comparison, refr.annotations, pred.annotations);
            comparison
        })
        .collect();
    Ok((comparisons, summary))
}

/// Compare every sequence in `seqids`, one worker task per sequence.
pub fn compare_sequences(
    refr: IndexedSource<'_>,
    pred: IndexedSource<'_>,
    seqids: &[String],
    config: &CompareConfig,
) -> RunResult {
    let (sender, receiver) = unbounded::<SequenceOutcome>();

    let mut run = RunResult {
        loci: BTreeMap::new(),
        failures: Vec::new(),
        summary: SummaryData::new(config.tolerance),
    };

    std::thread::scope(|scope| {
        scope.spawn(move || {
            seqids.par_iter().for_each_with(sender, |tx, seqid| {
                let result = compare_sequence(refr, pred, seqid, config);
                if let Ok((loci, _)) = &result {
                    log::info!(
                        "sequence {}: {} loci compared (worker {:?})",
                        seqid,
                        loci.len(),
                        rayon::current_thread_index()
                    );
                }
                // The receiver outlives every worker
                let _ = tx.send(SequenceOutcome {
                    seqid: seqid.clone(),
                    result,
                });
            });
        });

        for outcome in receiver.iter() {
            match outcome.result {
                Ok((loci, summary)) => {
                    run.summary.merge(&summary);
                    run.loci.insert(outcome.seqid, loci);
                }
                Err(e) => {
                    log::error!("{}", e);
                    run.failures.push(e);
                }
            }
        }
    });

    run.failures.sort_by(|a, b| a.seqid.cmp(&b.seqid));
    run
}

/// Cluster a single source on every sequence, in parallel.
pub fn cluster_sequences(
    source: IndexedSource<'_>,
    seqids: &[String],
) -> (BTreeMap<String, Vec<Locus>>, Vec<SequenceError>) {
    let results: Vec<(String, Result<Vec<Locus>, SequenceError>)> = seqids
        .par_iter()
        .map(|seqid| (seqid.clone(), cluster_sequence(source, seqid)))
        .collect();

    let mut loci = BTreeMap::new();
    let mut failures = Vec::new();
    for (seqid, result) in results {
        match result {
            Ok(found) => {
                loci.insert(seqid, found);
            }
            Err(e) => {
                log::error!("{}", e);
                failures.push(e);
            }
        }
    }
    (loci, failures)
}
