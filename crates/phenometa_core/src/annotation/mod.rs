//! Canonical gene annotation tables.
//!
//! # Responsibility
//! - Reduce an Ensembl BioMart exon export to canonical protein-coding
//!   transcripts on the 24 standard chromosomes.
//! - Emit the full canonical annotation table and the deduplicated gene
//!   position table that the surrounding system loads.
//!
//! # Invariants
//! - Output files are tab-separated with a header row; nulls are written `NA`.
//! - The first header of both outputs is `#Gene stable ID version`.
//! - Chromosomes sort as text (`1, 10, 11, ..., 2, ..., X, Y`).

use std::error::Error;
use std::fmt::{Display, Formatter};

mod canonical;

pub use canonical::{
    build_annotation_tables, gene_positions, join_canonical, read_annotation,
    read_canonical_transcripts, write_canonical_table, write_gene_positions, AnnotationRow,
    AnnotationSummary, GenePosition, TranscriptKey, CANONICAL_TABLE_FILE, GENE_POSITION_FILE,
    STANDARD_CHROMOSOMES,
};

pub type AnnotationResult<T> = Result<T, AnnotationError>;

#[derive(Debug)]
pub enum AnnotationError {
    Io(std::io::Error),
    Csv(csv::Error),
}

impl Display for AnnotationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "annotation i/o failed: {err}"),
            Self::Csv(err) => write!(f, "annotation table is malformed: {err}"),
        }
    }
}

impl Error for AnnotationError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Csv(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for AnnotationError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<csv::Error> for AnnotationError {
    fn from(value: csv::Error) -> Self {
        Self::Csv(value)
    }
}
