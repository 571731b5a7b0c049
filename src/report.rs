//! Text and CSV rendering of locus comparisons and the run summary.
//!
//! Locus coordinates are printed 1-based and inclusive, as they appear in
//! the GFF3 input.

use crate::compare::{LocusComparison, LocusStatus};
use crate::feature::{AnnotationSet, Source};
use crate::locus::Locus;
use crate::pair::{CliquePair, Classification};
use crate::parallel::RunResult;
use crate::stats::{NucleotideStats, Ratio, StructureStats};
use crate::summary::{ClassDescription, SummaryData};
use std::fmt::Display;
use std::io::{self, Write};
use std::str::FromStr;

/// Output layout for per-locus results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportFormat {
    #[default]
    Text,
    Csv,
}

impl FromStr for ReportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" => Ok(ReportFormat::Text),
            "csv" => Ok(ReportFormat::Csv),
            other => Err(format!("unknown report format '{}'", other)),
        }
    }
}

const PAIR_INDENT: &str = "     |";

/// Writes per-locus comparison results.
pub struct LocusReporter<'a> {
    refr: &'a AnnotationSet,
    pred: &'a AnnotationSet,
    format: ReportFormat,
    show_vectors: bool,
}

impl<'a> LocusReporter<'a> {
    pub fn new(refr: &'a AnnotationSet, pred: &'a AnnotationSet, format: ReportFormat) -> Self {
        Self {
            refr,
            pred,
            format,
            show_vectors: false,
        }
    }

    /// Print model vectors for pairs that carry them.
    pub fn with_vectors(mut self, show: bool) -> Self {
        self.show_vectors = show;
        self
    }

    /// Write whatever precedes the first locus.
    pub fn write_header<W: Write>(&self, out: &mut W) -> io::Result<()> {
        if self.format == ReportFormat::Csv {
            let mut header =
                vec!["seqid", "start", "end", "refr_transcripts", "pred_transcripts"].join(",");
            for kind in ["cds", "exon", "utr"] {
                let fields = [
                    "refr", "pred", "correct", "missing", "wrong", "sn", "sp", "f1", "aed",
                ];
                for field in fields {
                    header.push_str(&format!(",{}_{}", kind, field));
                }
            }
            header.push_str(",identity");
            for kind in ["cds_nuc", "utr_nuc"] {
                for field in ["mc", "cc", "sn", "sp", "f1", "aed"] {
                    header.push_str(&format!(",{}_{}", kind, field));
                }
            }
            writeln!(out, "{}", header)?;
        }
        Ok(())
    }

    pub fn write_locus<W: Write>(
        &self,
        out: &mut W,
        comparison: &LocusComparison,
    ) -> io::Result<()> {
        match self.format {
            ReportFormat::Text => self.write_text(out, comparison),
            ReportFormat::Csv => self.write_csv(out, comparison),
        }
    }

    fn write_text<W: Write>(&self, out: &mut W, comparison: &LocusComparison) -> io::Result<()> {
        let locus = &comparison.locus;
        writeln!(out, "|-------------------------------------------------")?;
        writeln!(
            out,
            "|---- Locus: sequence '{}' from {} to {}",
            locus.seqid(),
            locus.interval.start + 1,
            locus.interval.end
        )?;
        writeln!(out, "|-------------------------------------------------")?;
        writeln!(out, "|")?;

        for (label, source, annotations) in [
            ("reference", Source::Reference, self.refr),
            ("prediction", Source::Prediction, self.pred),
        ] {
            writeln!(out, "|  {} genes:", label)?;
            let ids = locus.gene_ids(source, annotations);
            if ids.is_empty() {
                writeln!(out, "|    None!")?;
            }
            for id in ids {
                writeln!(out, "|    {}", id)?;
            }
            writeln!(out, "|")?;
        }

        for note in &locus.notes {
            writeln!(out, "|  note: {}", note)?;
        }
        if locus.is_degraded() {
            writeln!(out, "|")?;
        }
        writeln!(out, "|----------")?;

        if let LocusStatus::ExceedsLimit { pair_count, limit } = comparison.status {
            writeln!(out, "{}", PAIR_INDENT)?;
            writeln!(
                out,
                "{}  No comparisons were performed for this locus. \
                 The number of transcript clique pairs ({}) exceeds the limit of {}.",
                PAIR_INDENT, pair_count, limit
            )?;
            writeln!(out, "{}", PAIR_INDENT)?;
        }

        for pair in &comparison.pairs {
            self.write_pair_text(out, pair)?;
        }

        if !comparison.unique_refr.is_empty() {
            writeln!(out, "{}", PAIR_INDENT)?;
            writeln!(
                out,
                "{}  reference transcripts (or transcript sets) without a prediction match",
                PAIR_INDENT
            )?;
            for clique in &comparison.unique_refr {
                writeln!(out, "{}    {}", PAIR_INDENT, clique.ids(self.refr).join(" "))?;
            }
        }
        if !comparison.novel_pred.is_empty() {
            writeln!(out, "{}", PAIR_INDENT)?;
            writeln!(out, "{}  novel prediction transcripts (or transcript sets)", PAIR_INDENT)?;
            for clique in &comparison.novel_pred {
                writeln!(out, "{}    {}", PAIR_INDENT, clique.ids(self.pred).join(" "))?;
            }
        }
        writeln!(out)
    }

    fn write_pair_text<W: Write>(&self, out: &mut W, pair: &CliquePair) -> io::Result<()> {
        writeln!(out, "{}", PAIR_INDENT)?;
        writeln!(out, "{}--------------------------", PAIR_INDENT)?;
        writeln!(out, "{}---- Begin Comparison ----", PAIR_INDENT)?;
        writeln!(out, "{}--------------------------", PAIR_INDENT)?;
        writeln!(out, "{}", PAIR_INDENT)?;
        writeln!(out, "{}  reference transcripts:", PAIR_INDENT)?;
        for id in pair.refr.ids(self.refr) {
            writeln!(out, "{}    {}", PAIR_INDENT, id)?;
        }
        writeln!(out, "{}  prediction transcripts:", PAIR_INDENT)?;
        for id in pair.pred.ids(self.pred) {
            writeln!(out, "{}    {}", PAIR_INDENT, id)?;
        }
        writeln!(out, "{}", PAIR_INDENT)?;
        writeln!(out, "{}  classification: {}", PAIR_INDENT, pair.classification)?;
        writeln!(out, "{}", PAIR_INDENT)?;

        if self.show_vectors {
            if let Some((refr, pred)) = &pair.vectors {
                writeln!(out, "{}  model vectors:", PAIR_INDENT)?;
                writeln!(out, "{}    refr: {}", PAIR_INDENT, refr)?;
                writeln!(out, "{}    pred: {}", PAIR_INDENT, pred)?;
                writeln!(out, "{}", PAIR_INDENT)?;
            }
        }

        let stats = &pair.stats;
        write_structure_text(out, "CDS", "CDS segments", &stats.cds_struc)?;
        writeln!(out, "{}", PAIR_INDENT)?;
        write_structure_text(out, "Exon", "exons", &stats.exon_struc)?;
        writeln!(out, "{}", PAIR_INDENT)?;
        if pair.has_utrs() {
            write_structure_text(out, "UTR", "UTR segments", &stats.utr_struc)?;
        } else {
            writeln!(out, "{}  UTR structure comparison", PAIR_INDENT)?;
            writeln!(out, "{}    No UTRs annotated for this locus.", PAIR_INDENT)?;
        }
        writeln!(out, "{}", PAIR_INDENT)?;

        if stats.is_identical() {
            writeln!(out, "{}  Gene structures match perfectly!", PAIR_INDENT)?;
        } else {
            write_nucleotide_table(
                out,
                PAIR_INDENT,
                &stats.cds_nuc,
                &stats.utr_nuc,
                stats.identity(),
            )?;
        }

        writeln!(out, "{}", PAIR_INDENT)?;
        writeln!(out, "{}--------------------------", PAIR_INDENT)?;
        writeln!(out, "{}----- End Comparison -----", PAIR_INDENT)?;
        writeln!(out, "{}--------------------------", PAIR_INDENT)
    }

    fn write_csv<W: Write>(&self, out: &mut W, comparison: &LocusComparison) -> io::Result<()> {
        let locus = &comparison.locus;
        let mut buf = itoa::Buffer::new();

        for pair in &comparison.pairs {
            out.write_all(locus.seqid().as_bytes())?;
            out.write_all(b",")?;
            out.write_all(buf.format(locus.interval.start + 1).as_bytes())?;
            out.write_all(b",")?;
            out.write_all(buf.format(locus.interval.end).as_bytes())?;
            out.write_all(b",")?;
            out.write_all(pair.refr.ids(self.refr).join("|").as_bytes())?;
            out.write_all(b",")?;
            out.write_all(pair.pred.ids(self.pred).join("|").as_bytes())?;

            for stats in [&pair.stats.cds_struc, &pair.stats.exon_struc, &pair.stats.utr_struc] {
                let counts = [
                    stats.refr_count(),
                    stats.pred_count(),
                    stats.correct,
                    stats.missing,
                    stats.wrong,
                ];
                for count in counts {
                    out.write_all(b",")?;
                    out.write_all(buf.format(count).as_bytes())?;
                }
                let ratios = [
                    stats.sensitivity(),
                    stats.specificity(),
                    stats.f1(),
                    stats.edit_distance(),
                ];
                for ratio in ratios {
                    write!(out, ",{}", ratio)?;
                }
            }

            write!(out, ",{}", pair.stats.identity())?;
            for nuc in [&pair.stats.cds_nuc, &pair.stats.utr_nuc] {
                for ratio in nucleotide_ratios(nuc) {
                    write!(out, ",{}", ratio)?;
                }
            }
            out.write_all(b"\n")?;
        }
        Ok(())
    }
}

fn nucleotide_ratios(stats: &NucleotideStats) -> [Ratio; 6] {
    [
        stats.matching_coefficient(),
        stats.correlation(),
        stats.sensitivity(),
        stats.specificity(),
        stats.f1(),
        stats.edit_distance(),
    ]
}

fn write_structure_text<W: Write>(
    out: &mut W,
    title: &str,
    unit: &str,
    stats: &StructureStats,
) -> io::Result<()> {
    writeln!(out, "{}  {} structure comparison", PAIR_INDENT, title)?;
    if stats.is_perfect() {
        writeln!(out, "{}    {} reference {}", PAIR_INDENT, stats.correct, unit)?;
        writeln!(out, "{}    {} prediction {}", PAIR_INDENT, stats.correct, unit)?;
        return writeln!(out, "{}    {} structures match perfectly!", PAIR_INDENT, title);
    }
    writeln!(out, "{}    {} reference {}", PAIR_INDENT, stats.refr_count(), unit)?;
    writeln!(out, "{}      {} match prediction", PAIR_INDENT, stats.correct)?;
    writeln!(out, "{}      {} don't match prediction", PAIR_INDENT, stats.missing)?;
    writeln!(out, "{}    {} prediction {}", PAIR_INDENT, stats.pred_count(), unit)?;
    writeln!(out, "{}      {} match reference", PAIR_INDENT, stats.correct)?;
    writeln!(out, "{}      {} don't match reference", PAIR_INDENT, stats.wrong)?;
    for (label, ratio) in [
        ("Sensitivity:", stats.sensitivity()),
        ("Specificity:", stats.specificity()),
        ("F1 Score:", stats.f1()),
        ("Annotation edit distance:", stats.edit_distance()),
    ] {
        writeln!(out, "{}    {:<30} {:<10}", PAIR_INDENT, label, ratio.to_string())?;
    }
    Ok(())
}

fn write_nucleotide_table<W: Write>(
    out: &mut W,
    indent: &str,
    cds: &NucleotideStats,
    utr: &NucleotideStats,
    identity: Ratio,
) -> io::Result<()> {
    writeln!(
        out,
        "{}  {:<30}   {:<10}   {:<10}   {:<10}",
        indent, "Nucleotide-level comparison", "CDS", "UTRs", "Overall"
    )?;
    let labels = [
        "Matching coefficient:",
        "Correlation coefficient:",
        "Sensitivity:",
        "Specificity:",
        "F1 Score:",
        "Annotation edit distance:",
    ];
    let (cds, utr) = (nucleotide_ratios(cds), nucleotide_ratios(utr));
    for (i, label) in labels.iter().enumerate() {
        let overall = if i == 0 { identity.to_string() } else { "--".to_string() };
        writeln!(
            out,
            "{}    {:<30} {:<10}   {:<10}   {:<10}",
            indent,
            label,
            cds[i].to_string(),
            utr[i].to_string(),
            overall
        )?;
    }
    Ok(())
}

/// Write one single-source locus as a tab-separated line.
pub fn write_locus_listing<W: Write>(
    out: &mut W,
    locus: &Locus,
    annotations: &AnnotationSet,
) -> io::Result<()> {
    let ids: Vec<&str> = locus
        .genes
        .iter()
        .map(|g| annotations.gene(*g).id.as_str())
        .collect();
    writeln!(
        out,
        "{}\t{}\t{}\t{}",
        locus.interval,
        locus.genes.len(),
        locus.transcript_count(annotations),
        ids.join(",")
    )
}

/// Names shown at the top of the run summary.
#[derive(Debug, Clone, Default)]
pub struct SummaryLabels {
    pub refr: String,
    pub pred: String,
}

fn dotted<W: Write>(out: &mut W, label: &str, value: impl Display) -> io::Result<()> {
    writeln!(out, "{:.<43}{}", label, value)
}

/// A dotted line reading `n (p%)`, with `p` the share of `n` in `total`.
fn dotted_share<W: Write>(out: &mut W, label: &str, n: u64, total: u64) -> io::Result<()> {
    dotted(out, label, format!("{} ({})", n, percent(n, total)))
}

fn percent(n: u64, d: u64) -> String {
    match Ratio::from_counts(n, d) {
        Ratio::Value(v) => format!("{:.1}%", v * 100.0),
        Ratio::Undefined => "--".to_string(),
    }
}

fn mean(value: Option<f64>) -> String {
    value.map_or_else(|| "--".to_string(), |v| format!("{:.2}", v))
}

/// Write the run-wide summary.
pub fn write_summary<W: Write>(
    out: &mut W,
    run: &RunResult,
    labels: &SummaryLabels,
) -> io::Result<()> {
    let summary: &SummaryData = &run.summary;
    let counts = &summary.counts;

    writeln!(out, "============================================================")?;
    writeln!(out, "========== annocmp Summary")?;
    writeln!(out, "============================================================")?;
    writeln!(out, "Reference annotations:  {}", labels.refr)?;
    writeln!(out, "Prediction annotations: {}", labels.pred)?;
    writeln!(out)?;

    writeln!(out, "  Sequences compared")?;
    for seqid in run.sequences() {
        writeln!(out, "    {}", seqid)?;
    }
    if !run.failures.is_empty() {
        writeln!(out, "  Sequences that could not be compared")?;
        for failure in &run.failures {
            writeln!(out, "    {}: {}", failure.seqid, failure.source)?;
        }
    }
    writeln!(out)?;

    dotted(out, "  Gene loci", counts.num_loci)?;
    dotted(out, "    shared", counts.shared_loci())?;
    dotted(out, "    unique to reference", counts.unique_refr)?;
    dotted(out, "    unique to prediction", counts.unique_pred)?;
    dotted(out, "    exceeding comparison limit", counts.exceeded_limit)?;
    dotted(out, "    degraded by index errors", counts.degraded)?;
    writeln!(out)?;

    for (title, genes, transcripts) in [
        ("  Reference annotations", counts.refr_genes, counts.refr_transcripts),
        ("  Prediction annotations", counts.pred_genes, counts.pred_transcripts),
    ] {
        writeln!(out, "{}", title)?;
        dotted(out, "    genes", genes)?;
        dotted(out, "      average per locus", Ratio::from_counts(genes, counts.num_loci))?;
        dotted(out, "    transcripts", transcripts)?;
        dotted(out, "      average per locus", Ratio::from_counts(transcripts, counts.num_loci))?;
        dotted(out, "      average per gene", Ratio::from_counts(transcripts, genes))?;
        writeln!(out)?;
    }

    let comparisons = counts.num_comparisons();
    dotted(out, "  Total comparisons", comparisons)?;
    for class in Classification::ALL {
        let n = counts.class_count(class);
        dotted_share(out, &format!("    {}", class.label()), n, comparisons)?;
        if n > 0 {
            write_class_description(out, summary.description(class))?;
        }
    }
    writeln!(out)?;

    let stats = &summary.stats;
    write_structure_summary(out, "CDS", "CDS segments", &stats.cds_struc)?;
    write_structure_summary(out, "Exon", "exons", &stats.exon_struc)?;
    write_structure_summary(out, "UTR", "UTR segments", &stats.utr_struc)?;
    write_nucleotide_table(out, "", &stats.cds_nuc, &stats.utr_nuc, stats.identity())?;
    writeln!(out)
}

fn write_class_description<W: Write>(
    out: &mut W,
    description: &ClassDescription,
) -> io::Result<()> {
    dotted(out, "      avg. length", format!("{} bp", mean(description.mean_length())))?;
    dotted(out, "      avg. # refr exons", mean(description.mean_refr_exons()))?;
    dotted(out, "      avg. # pred exons", mean(description.mean_pred_exons()))?;
    let refr_aa = mean(description.mean_refr_cds_aa());
    let pred_aa = mean(description.mean_pred_cds_aa());
    dotted(out, "      avg. refr CDS length", format!("{} aa", refr_aa))?;
    dotted(out, "      avg. pred CDS length", format!("{} aa", pred_aa))
}

fn write_structure_summary<W: Write>(
    out: &mut W,
    title: &str,
    unit: &str,
    stats: &StructureStats,
) -> io::Result<()> {
    let (refr, pred) = (stats.refr_count(), stats.pred_count());
    writeln!(out, "  {} structure comparison", title)?;
    dotted(out, &format!("    reference {}", unit), refr)?;
    dotted_share(out, "      match prediction", stats.correct, refr)?;
    dotted_share(out, "      don't match prediction", stats.missing, refr)?;
    dotted(out, &format!("    prediction {}", unit), pred)?;
    dotted_share(out, "      match reference", stats.correct, pred)?;
    dotted_share(out, "      don't match reference", stats.wrong, pred)?;
    dotted(out, "    Sensitivity", stats.sensitivity())?;
    dotted(out, "    Specificity", stats.specificity())?;
    dotted(out, "    F1 Score", stats.f1())?;
    dotted(out, "    Annotation edit distance", stats.edit_distance())?;
    writeln!(out)
}
