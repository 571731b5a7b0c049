//! Streaming GFF3 parser and gene model assembly.
//!
//! Records are read line by line, then resolved through their `Parent`
//! attributes into genes, transcripts and sub-features once the whole
//! input has been seen, so features may appear in any order.

use crate::error::Gff3Error;
use crate::feature::{AnnotationSet, Gene, Transcript, Utr, UtrKind};
use crate::interval::{Interval, Span, Strand};
use memchr::memchr_iter;
use rustc_hash::FxHashMap;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

pub type Result<T> = std::result::Result<T, Gff3Error>;

const TRANSCRIPT_TYPES: &[&str] = &["mRNA", "transcript", "ncRNA", "rRNA", "tRNA"];

/// One GFF3 feature line, converted to 0-based half-open coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct Gff3Record {
    pub seqid: String,
    pub feature_type: String,
    pub start: u64,
    pub end: u64,
    pub strand: Strand,
    pub attributes: String,
}

impl Gff3Record {
    /// Value of attribute `key`, if present.
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.split(';').find_map(|pair| {
            let (k, v) = pair.split_once('=')?;
            (k.trim() == key).then_some(v.trim())
        })
    }

    pub fn id(&self) -> Option<&str> {
        self.attribute("ID")
    }

    /// All parents listed in the `Parent` attribute.
    pub fn parents(&self) -> Vec<&str> {
        self.attribute("Parent")
            .map(|p| p.split(',').filter(|s| !s.is_empty()).collect())
            .unwrap_or_default()
    }

    pub fn span(&self) -> Span {
        Span::new(self.start, self.end)
    }

    pub fn interval(&self) -> Interval {
        Interval::new(self.seqid.clone(), self.start, self.end)
    }
}

/// A streaming GFF3 file reader.
pub struct Gff3Reader<R: Read> {
    reader: BufReader<R>,
    line_number: usize,
    buffer: String,
    done: bool,
}

impl Gff3Reader<File> {
    /// Open a GFF3 file from a path.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        Ok(Self::new(file))
    }
}

impl<R: Read> Gff3Reader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader: BufReader::new(reader),
            line_number: 0,
            buffer: String::with_capacity(1024),
            done: false,
        }
    }

    /// Read the next feature, stopping at end of input or a `##FASTA` section.
    pub fn read_record(&mut self) -> Result<Option<Gff3Record>> {
        while !self.done {
            self.buffer.clear();
            let bytes_read = self.reader.read_line(&mut self.buffer)?;
            if bytes_read == 0 {
                self.done = true;
                break;
            }
            self.line_number += 1;

            let line = self.buffer.trim_end_matches(['\n', '\r']);
            if line.starts_with("##FASTA") {
                self.done = true;
                break;
            }
            if line.trim().is_empty() || line.starts_with('#') {
                continue;
            }
            return self.parse_line(line).map(Some);
        }
        Ok(None)
    }

    fn parse_line(&self, line: &str) -> Result<Gff3Record> {
        let bytes = line.as_bytes();
        let mut fields: Vec<&str> = Vec::with_capacity(9);
        let mut last = 0;
        for tab in memchr_iter(b'\t', bytes) {
            fields.push(&line[last..tab]);
            last = tab + 1;
        }
        fields.push(&line[last..]);

        if fields.len() < 9 {
            return Err(self.error(format!("Expected 9 fields, got {}", fields.len())));
        }

        let start = self.parse_position(fields[3], "start")?;
        let end = self.parse_position(fields[4], "end")?;
        if start == 0 {
            return Err(self.error("GFF3 coordinates are 1-based; start cannot be 0".to_string()));
        }
        if start > end {
            return Err(self.error(format!("Start ({}) > end ({})", start, end)));
        }

        Ok(Gff3Record {
            seqid: fields[0].to_string(),
            feature_type: fields[2].to_string(),
            start: start - 1,
            end,
            strand: fields[6].chars().next().map(Strand::from_char).unwrap_or(Strand::Unknown),
            attributes: fields[8].to_string(),
        })
    }

    fn parse_position(&self, s: &str, name: &str) -> Result<u64> {
        s.parse()
            .map_err(|_| self.error(format!("Invalid {} position: '{}'", name, s)))
    }

    fn error(&self, message: String) -> Gff3Error {
        Gff3Error::Parse {
            line: self.line_number,
            message,
        }
    }

    /// Current line number (1-based).
    pub fn line_number(&self) -> usize {
        self.line_number
    }
}

#[derive(Debug)]
struct PendingTranscript {
    id: String,
    interval: Interval,
    strand: Strand,
    exons: Vec<Span>,
    cds: Vec<Span>,
    utrs: Vec<Utr>,
    untyped_utrs: Vec<Span>,
}

impl PendingTranscript {
    fn into_transcript(self) -> Transcript {
        let mut utrs = self.utrs;
        if !self.untyped_utrs.is_empty() {
            let cds_start = self.cds.iter().map(|c| c.start).min();
            let (left, right) = match self.strand {
                Strand::Minus => (UtrKind::ThreePrime, UtrKind::FivePrime),
                _ => (UtrKind::FivePrime, UtrKind::ThreePrime),
            };
            for span in self.untyped_utrs {
                let kind = match cds_start {
                    Some(start) if span.start >= start => right,
                    _ => left,
                };
                utrs.push(Utr { span, kind });
            }
        }
        Transcript::new(self.id, self.interval, self.strand)
            .with_exons(self.exons)
            .with_cds(self.cds)
            .with_utrs(utrs)
            .finalize()
    }
}

/// Assembles GFF3 records into genes with their transcripts.
#[derive(Debug, Default)]
pub struct AnnotationBuilder {
    genes: Vec<Gene>,
    gene_index: FxHashMap<String, usize>,
    transcripts: Vec<(usize, PendingTranscript)>,
    transcript_index: FxHashMap<String, usize>,
    parts: Vec<Gff3Record>,
}

impl AnnotationBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read every record of `reader` into the builder.
    pub fn read<R: Read>(&mut self, reader: &mut Gff3Reader<R>) -> Result<()> {
        while let Some(record) = reader.read_record()? {
            self.add_record(record);
        }
        Ok(())
    }

    pub fn add_record(&mut self, record: Gff3Record) {
        let ftype = record.feature_type.as_str();
        if ftype == "gene" {
            let Some(id) = record.id().map(str::to_string) else {
                log::warn!("gene at {} has no ID, skipping", record.interval());
                return;
            };
            if self.gene_index.contains_key(&id) {
                log::warn!("duplicate gene ID '{}', skipping", id);
                return;
            }
            self.gene_index.insert(id.clone(), self.genes.len());
            self.genes.push(Gene::new(id, record.interval(), record.strand));
        } else if TRANSCRIPT_TYPES.contains(&ftype) {
            self.parts.push(record);
        } else if matches!(ftype, "exon" | "CDS" | "five_prime_UTR" | "three_prime_UTR" | "UTR") {
            self.parts.push(record);
        } else {
            log::debug!("ignoring feature of type '{}'", ftype);
        }
    }

    /// Resolve parent links and produce the annotation set.
    pub fn finish(mut self) -> AnnotationSet {
        let parts = std::mem::take(&mut self.parts);

        for record in parts.iter().filter(|r| TRANSCRIPT_TYPES.contains(&r.feature_type.as_str())) {
            self.add_transcript(record);
        }
        for record in parts
            .iter()
            .filter(|r| !TRANSCRIPT_TYPES.contains(&r.feature_type.as_str()))
        {
            self.add_part(record);
        }

        let mut genes = self.genes;
        for (gene, pending) in self.transcripts {
            genes[gene].push_transcript(pending.into_transcript());
        }
        AnnotationSet::from_genes(genes)
    }

    fn add_transcript(&mut self, record: &Gff3Record) {
        let Some(id) = record.id() else {
            log::warn!("{} at {} has no ID, skipping", record.feature_type, record.interval());
            return;
        };
        let Some(gene) = record
            .parents()
            .iter()
            .find_map(|p| self.gene_index.get(*p).copied())
        else {
            log::warn!("{} '{}' has no known parent gene, skipping", record.feature_type, id);
            return;
        };
        if self.transcript_index.contains_key(id) {
            log::warn!("duplicate transcript ID '{}', skipping", id);
            return;
        }
        self.transcript_index.insert(id.to_string(), self.transcripts.len());
        self.transcripts.push((
            gene,
            PendingTranscript {
                id: id.to_string(),
                interval: record.interval(),
                strand: record.strand,
                exons: Vec::new(),
                cds: Vec::new(),
                utrs: Vec::new(),
                untyped_utrs: Vec::new(),
            },
        ));
    }

    fn add_part(&mut self, record: &Gff3Record) {
        let parents = record.parents();
        let mut attached = false;
        for parent in &parents {
            let Some(&index) = self.transcript_index.get(*parent) else {
                continue;
            };
            let pending = &mut self.transcripts[index].1;
            let span = record.span();
            match record.feature_type.as_str() {
                "exon" => pending.exons.push(span),
                "CDS" => pending.cds.push(span),
                "five_prime_UTR" => pending.utrs.push(Utr { span, kind: UtrKind::FivePrime }),
                "three_prime_UTR" => pending.utrs.push(Utr { span, kind: UtrKind::ThreePrime }),
                _ => pending.untyped_utrs.push(span),
            }
            attached = true;
        }
        if !attached {
            log::warn!(
                "{} at {} has no known parent transcript ({}), skipping",
                record.feature_type,
                record.interval(),
                parents.join(",")
            );
        }
    }
}

/// Load one or more GFF3 files into a single annotation set.
pub fn read_annotations<P: AsRef<Path>>(paths: &[P]) -> Result<AnnotationSet> {
    let mut builder = AnnotationBuilder::new();
    for path in paths {
        let mut reader = Gff3Reader::from_path(path)?;
        builder.read(&mut reader)?;
    }
    let annotations = builder.finish();
    if annotations.is_empty() {
        log::warn!("no genes found in input");
    }
    Ok(annotations)
}
