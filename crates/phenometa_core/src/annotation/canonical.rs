//! Canonical-transcript filter, join, sort, and TSV output.

use super::AnnotationResult;
use csv::{QuoteStyle, ReaderBuilder, WriterBuilder};
use log::info;
use serde::Deserialize;
use std::collections::HashSet;
use std::fmt::Display;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Autosomes plus the two sex chromosomes; scaffolds and MT are dropped.
pub const STANDARD_CHROMOSOMES: [&str; 24] = [
    "1", "2", "3", "4", "5", "6", "7", "8", "9", "10", "11", "12", "13", "14", "15", "16", "17",
    "18", "19", "20", "21", "22", "X", "Y",
];

pub const CANONICAL_TABLE_FILE: &str = "ensembl_anno_canonical.tsv";
pub const GENE_POSITION_FILE: &str = "ensembl_gene_pos.tsv";

const NULL_MARKER: &str = "NA";
const PROTEIN_CODING: &str = "protein_coding";

const CANONICAL_TABLE_HEADER: [&str; 16] = [
    "#Gene stable ID version",
    "Transcript stable ID version",
    "Chromosome/scaffold name",
    "Gene start (bp)",
    "Gene end (bp)",
    "Transcript start (bp)",
    "Transcript end (bp)",
    "Transcription start site (TSS)",
    "Strand",
    "Gene name",
    "Gene type",
    "Exon region start (bp)",
    "Exon region end (bp)",
    "Exon rank in transcript",
    "Exon stable ID",
    "Ensembl Canonical",
];

const GENE_POSITION_HEADER: [&str; 5] = [
    "#Gene stable ID version",
    "Chromosome/scaffold name",
    "Gene start (bp)",
    "Gene end (bp)",
    "Gene name",
];

/// `(gene stable id version, transcript stable id version)`.
pub type TranscriptKey = (String, String);

/// One exon line of the BioMart annotation export.
///
/// Empty cells deserialize to `None`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AnnotationRow {
    #[serde(rename = "Gene stable ID version")]
    pub gene_id: String,
    #[serde(rename = "Transcript stable ID version")]
    pub transcript_id: String,
    #[serde(rename = "Chromosome/scaffold name")]
    pub chromosome: String,
    #[serde(rename = "Gene start (bp)")]
    pub gene_start: u64,
    #[serde(rename = "Gene end (bp)")]
    pub gene_end: u64,
    #[serde(rename = "Transcript start (bp)")]
    pub transcript_start: Option<u64>,
    #[serde(rename = "Transcript end (bp)")]
    pub transcript_end: Option<u64>,
    #[serde(rename = "Transcription start site (TSS)")]
    pub tss: Option<u64>,
    #[serde(rename = "Strand")]
    pub strand: Option<i8>,
    #[serde(rename = "Gene name")]
    pub gene_name: Option<String>,
    #[serde(rename = "Gene type")]
    pub gene_type: Option<String>,
    #[serde(rename = "Exon region start (bp)")]
    pub exon_start: Option<u64>,
    #[serde(rename = "Exon region end (bp)")]
    pub exon_end: Option<u64>,
    #[serde(rename = "Exon rank in transcript")]
    pub exon_rank: Option<u32>,
    #[serde(rename = "Exon stable ID")]
    pub exon_id: Option<String>,
}

impl AnnotationRow {
    /// Standard chromosome, protein coding, and named.
    fn is_candidate(&self) -> bool {
        STANDARD_CHROMOSOMES.contains(&self.chromosome.as_str())
            && self.gene_type.as_deref() == Some(PROTEIN_CODING)
            && self.gene_name.is_some()
    }

    pub fn transcript_key(&self) -> TranscriptKey {
        (self.gene_id.clone(), self.transcript_id.clone())
    }

    fn sort_key(&self) -> (&str, u64, u64, Option<u64>) {
        (
            self.chromosome.as_str(),
            self.gene_start,
            self.gene_end,
            self.exon_start,
        )
    }

    fn to_canonical_record(&self) -> Vec<String> {
        vec![
            self.gene_id.clone(),
            self.transcript_id.clone(),
            self.chromosome.clone(),
            self.gene_start.to_string(),
            self.gene_end.to_string(),
            cell(&self.transcript_start),
            cell(&self.transcript_end),
            cell(&self.tss),
            cell(&self.strand),
            cell(&self.gene_name),
            cell(&self.gene_type),
            cell(&self.exon_start),
            cell(&self.exon_end),
            cell(&self.exon_rank),
            cell(&self.exon_id),
            // Only canonical transcripts survive the join.
            "1".to_string(),
        ]
    }
}

#[derive(Debug, Deserialize)]
struct CanonicalRow {
    #[serde(rename = "Gene stable ID version")]
    gene_id: String,
    #[serde(rename = "Transcript stable ID version")]
    transcript_id: String,
    #[serde(rename = "Ensembl Canonical")]
    canonical: Option<u8>,
}

/// One row of the gene position table.
///
/// Field order is the sort order: chromosome, start, end, then id and name
/// to make ties deterministic.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct GenePosition {
    pub chromosome: String,
    pub gene_start: u64,
    pub gene_end: u64,
    pub gene_id: String,
    pub gene_name: String,
}

/// Outcome of [`build_annotation_tables`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotationSummary {
    pub canonical_rows: usize,
    pub gene_positions: usize,
    pub canonical_table: PathBuf,
    pub gene_position_table: PathBuf,
}

/// Reads the annotation export, keeping only candidate rows.
pub fn read_annotation<R: Read>(reader: R) -> AnnotationResult<Vec<AnnotationRow>> {
    let mut rows = Vec::new();
    for result in tsv_reader(reader).deserialize::<AnnotationRow>() {
        let row = result?;
        if row.is_candidate() {
            rows.push(row);
        }
    }
    Ok(rows)
}

/// Reads the canonical export and returns the transcripts flagged canonical.
pub fn read_canonical_transcripts<R: Read>(reader: R) -> AnnotationResult<HashSet<TranscriptKey>> {
    let mut canonical = HashSet::new();
    for result in tsv_reader(reader).deserialize::<CanonicalRow>() {
        let row = result?;
        if row.canonical == Some(1) {
            canonical.insert((row.gene_id, row.transcript_id));
        }
    }
    Ok(canonical)
}

/// Keeps rows of canonical transcripts and sorts them by chromosome, gene
/// start, gene end, and exon start.
pub fn join_canonical(
    mut rows: Vec<AnnotationRow>,
    canonical: &HashSet<TranscriptKey>,
) -> Vec<AnnotationRow> {
    rows.retain(|row| canonical.contains(&row.transcript_key()));
    rows.sort_by(|left, right| left.sort_key().cmp(&right.sort_key()));
    rows
}

/// Projects joined rows onto sorted, duplicate-free gene positions.
pub fn gene_positions(rows: &[AnnotationRow]) -> Vec<GenePosition> {
    let mut positions: Vec<GenePosition> = rows
        .iter()
        .map(|row| GenePosition {
            chromosome: row.chromosome.clone(),
            gene_start: row.gene_start,
            gene_end: row.gene_end,
            gene_id: row.gene_id.clone(),
            gene_name: cell(&row.gene_name),
        })
        .collect();
    positions.sort();
    positions.dedup();
    positions
}

pub fn write_canonical_table<W: Write>(writer: W, rows: &[AnnotationRow]) -> AnnotationResult<()> {
    let mut out = tsv_writer(writer);
    out.write_record(CANONICAL_TABLE_HEADER)?;
    for row in rows {
        out.write_record(row.to_canonical_record())?;
    }
    out.flush()?;
    Ok(())
}

pub fn write_gene_positions<W: Write>(
    writer: W,
    positions: &[GenePosition],
) -> AnnotationResult<()> {
    let mut out = tsv_writer(writer);
    out.write_record(GENE_POSITION_HEADER)?;
    for position in positions {
        out.write_record([
            position.gene_id.clone(),
            position.chromosome.clone(),
            position.gene_start.to_string(),
            position.gene_end.to_string(),
            position.gene_name.clone(),
        ])?;
    }
    out.flush()?;
    Ok(())
}

/// Runs the whole pipeline from the two exports into `out_dir`.
///
/// Writes [`CANONICAL_TABLE_FILE`] and [`GENE_POSITION_FILE`], creating
/// `out_dir` when needed.
pub fn build_annotation_tables(
    annotation_path: impl AsRef<Path>,
    canonical_path: impl AsRef<Path>,
    out_dir: impl AsRef<Path>,
) -> AnnotationResult<AnnotationSummary> {
    let started_at = Instant::now();
    let annotation_path = annotation_path.as_ref();
    let out_dir = out_dir.as_ref();
    info!(
        "event=annotation_build module=annotation status=start input={}",
        annotation_path.display()
    );

    let candidates = read_annotation(BufReader::new(File::open(annotation_path)?))?;
    let canonical = read_canonical_transcripts(BufReader::new(File::open(canonical_path)?))?;
    let rows = join_canonical(candidates, &canonical);
    let positions = gene_positions(&rows);

    std::fs::create_dir_all(out_dir)?;
    let canonical_table = out_dir.join(CANONICAL_TABLE_FILE);
    let gene_position_table = out_dir.join(GENE_POSITION_FILE);
    write_canonical_table(BufWriter::new(File::create(&canonical_table)?), &rows)?;
    write_gene_positions(BufWriter::new(File::create(&gene_position_table)?), &positions)?;

    info!(
        "event=annotation_build module=annotation status=ok canonical_rows={} gene_positions={} duration_ms={}",
        rows.len(),
        positions.len(),
        started_at.elapsed().as_millis()
    );

    Ok(AnnotationSummary {
        canonical_rows: rows.len(),
        gene_positions: positions.len(),
        canonical_table,
        gene_position_table,
    })
}

fn tsv_reader<R: Read>(reader: R) -> csv::Reader<R> {
    ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(true)
        .quoting(false)
        .from_reader(reader)
}

fn tsv_writer<W: Write>(writer: W) -> csv::Writer<W> {
    WriterBuilder::new()
        .delimiter(b'\t')
        .quote_style(QuoteStyle::Never)
        .from_writer(writer)
}

fn cell<T: Display>(value: &Option<T>) -> String {
    match value {
        Some(value) => value.to_string(),
        None => NULL_MARKER.to_string(),
    }
}
