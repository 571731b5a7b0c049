//! Compare command: reference vs. prediction annotation comparison.

use crate::cluster::IndexedSource;
use crate::config::CompareConfig;
use crate::error::Result;
use crate::feature::AnnotationSet;
use crate::gff3::read_annotations;
use crate::index::IntervalIndex;
use crate::parallel::{compare_sequences, sequence_union, RunResult};
use crate::report::{write_summary, LocusReporter, ReportFormat, SummaryLabels};
use std::io::{self, Write};
use std::path::Path;

/// Compare command configuration.
#[derive(Debug, Clone)]
pub struct CompareCommand {
    pub config: CompareConfig,
    /// Layout of the per-locus report
    pub format: ReportFormat,
    /// Skip the per-locus report and print only the run summary
    pub summary_only: bool,
    pub labels: SummaryLabels,
}

impl Default for CompareCommand {
    fn default() -> Self {
        Self::new()
    }
}

impl CompareCommand {
    pub fn new() -> Self {
        Self {
            config: CompareConfig::default(),
            format: ReportFormat::Text,
            summary_only: false,
            labels: SummaryLabels::default(),
        }
    }

    pub fn with_config(mut self, config: CompareConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_format(mut self, format: ReportFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_summary_only(mut self, summary_only: bool) -> Self {
        self.summary_only = summary_only;
        self
    }

    /// Set the names printed for each source in the summary.
    pub fn with_labels(mut self, refr: impl Into<String>, pred: impl Into<String>) -> Self {
        self.labels = SummaryLabels {
            refr: refr.into(),
            pred: pred.into(),
        };
        self
    }

    /// Compare two in-memory annotation sets on every sequence either knows.
    pub fn compare(&self, refr: &AnnotationSet, pred: &AnnotationSet) -> RunResult {
        let refr_index = IntervalIndex::from_annotations(refr);
        let pred_index = IntervalIndex::from_annotations(pred);
        let refr_source = IndexedSource::new(refr, &refr_index);
        let pred_source = IndexedSource::new(pred, &pred_index);

        let seqids = sequence_union(refr_source, pred_source);
        log::info!(
            "comparing {} reference and {} prediction genes on {} sequences",
            refr.len(),
            pred.len(),
            seqids.len()
        );
        compare_sequences(refr_source, pred_source, &seqids, &self.config)
    }

    /// Write the locus reports (in sequence order) and the run summary.
    pub fn write_report<W: Write>(
        &self,
        run: &RunResult,
        refr: &AnnotationSet,
        pred: &AnnotationSet,
        output: &mut W,
    ) -> io::Result<()> {
        if !self.summary_only {
            let reporter =
                LocusReporter::new(refr, pred, self.format).with_vectors(self.config.model_vectors);
            reporter.write_header(output)?;
            for comparisons in run.loci.values() {
                for comparison in comparisons {
                    reporter.write_locus(output, comparison)?;
                }
            }
        }

        if self.summary_only || self.format == ReportFormat::Text {
            write_summary(output, run, &self.labels)?;
        }
        output.flush()
    }

    /// Load both sources from GFF3, compare them and write the report.
    pub fn run<P: AsRef<Path>, W: Write>(
        &self,
        refr_paths: &[P],
        pred_paths: &[P],
        output: &mut W,
    ) -> Result<RunResult> {
        let refr = read_annotations(refr_paths)?;
        let pred = read_annotations(pred_paths)?;

        let run = self.compare(&refr, &pred);
        self.write_report(&run, &refr, &pred, output)?;
        Ok(run)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feature::{Gene, Transcript};
    use crate::interval::{Interval, Span, Strand};
    use crate::pair::Classification;

    fn coding_gene(id: &str, seqid: &str, start: u64, end: u64) -> Gene {
        let t = Transcript::new(format!("{}.1", id), Interval::new(seqid, start, end), Strand::Plus)
            .with_exons(vec![Span::new(start, end)])
            .with_cds(vec![Span::new(start, end)])
            .finalize();
        Gene::new(id, Interval::new(seqid, start, end), Strand::Plus).with_transcript(t)
    }

    #[test]
    fn test_compare_in_memory() {
        let refr = AnnotationSet::from_genes(vec![
            coding_gene("g1", "chr1", 100, 400),
            coding_gene("g2", "chr2", 0, 90),
        ]);
        let pred = AnnotationSet::from_genes(vec![coding_gene("p1", "chr1", 100, 400)]);

        let cmd = CompareCommand::new();
        let run = cmd.compare(&refr, &pred);

        assert!(run.failures.is_empty());
        assert_eq!(run.summary.counts.num_loci, 2);
        assert_eq!(run.summary.counts.unique_refr, 1);
        assert_eq!(run.summary.counts.class_count(Classification::PerfectMatch), 1);
    }

    #[test]
    fn test_summary_only_skips_loci() {
        let refr = AnnotationSet::from_genes(vec![coding_gene("g1", "chr1", 100, 400)]);
        let pred = AnnotationSet::from_genes(vec![coding_gene("p1", "chr1", 100, 400)]);

        let cmd = CompareCommand::new().with_summary_only(true).with_labels("ref", "pred");
        let run = cmd.compare(&refr, &pred);
        let mut out = Vec::new();
        cmd.write_report(&run, &refr, &pred, &mut out).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(!text.contains("Begin Comparison"));
        assert!(text.contains("Reference annotations:  ref"));
    }

    #[test]
    fn test_csv_has_no_summary() {
        let refr = AnnotationSet::from_genes(vec![coding_gene("g1", "chr1", 100, 400)]);
        let pred = AnnotationSet::from_genes(vec![coding_gene("p1", "chr1", 100, 400)]);

        let cmd = CompareCommand::new().with_format(ReportFormat::Csv);
        let run = cmd.compare(&refr, &pred);
        let mut out = Vec::new();
        cmd.write_report(&run, &refr, &pred, &mut out).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.lines().count(), 2);
    }
}
