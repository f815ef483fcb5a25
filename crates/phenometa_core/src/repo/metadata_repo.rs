//! Dataset/trait lookup contracts and SQLite implementation.
//!
//! # Responsibility
//! - Run the fixed dataset and trait projections with exact-match filters.
//! - Map each result row onto its typed record explicitly, column by column.
//! - Report cells whose storage class cannot fill their field as
//!   `RepoError::InvalidData` naming `table.column`.
//!
//! # Invariants
//! - Phenotype rows read here always carry `is_na = false`.
//! - Row order for phenotype lookups is the store's scan order; callers
//!   decide how to treat more than one match.

use crate::db::DbError;
use crate::model::dataset::DatasetRecord;
use crate::model::phenotype::PhenotypeRecord;
use rusqlite::types::ValueRef;
use rusqlite::{params, Connection, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};

const DATASET_SELECT_SQL: &str = "SELECT
    resource,
    data_type,
    dataset_id,
    study_id,
    study_label,
    sample_group,
    tissue_id,
    tissue_label,
    condition_label,
    sample_size,
    quant_method
FROM dataset
WHERE dataset_id = ?1;";

const TRAIT_SELECT_SQL: &str = "SELECT
    resource,
    data_type,
    trait_type,
    phenocode,
    phenostring,
    category,
    num_samples,
    num_cases,
    num_controls,
    pub_author,
    pub_date
FROM trait
WHERE resource = ?1 AND phenocode = ?2;";

/// Largest magnitude below which every integral `f64` is exact.
const MAX_EXACT_REAL: f64 = 9_007_199_254_740_992.0;

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for metadata queries and row mapping.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid stored metadata: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Read-only lookups over dataset and trait metadata.
pub trait MetadataRepository {
    /// Returns the dataset with exactly this id, or `None`.
    fn find_dataset(&self, dataset_id: &str) -> RepoResult<Option<DatasetRecord>>;
    /// Returns every trait row matching `(resource, phenocode)` in store order.
    fn find_phenotypes(&self, resource: &str, phenocode: &str)
        -> RepoResult<Vec<PhenotypeRecord>>;
}

/// SQLite-backed metadata repository borrowing one connection.
pub struct SqliteMetadataRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteMetadataRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl MetadataRepository for SqliteMetadataRepository<'_> {
    fn find_dataset(&self, dataset_id: &str) -> RepoResult<Option<DatasetRecord>> {
        let mut stmt = self.conn.prepare_cached(DATASET_SELECT_SQL)?;
        let mut rows = stmt.query(params![dataset_id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_dataset_row(row)?));
        }

        Ok(None)
    }

    fn find_phenotypes(
        &self,
        resource: &str,
        phenocode: &str,
    ) -> RepoResult<Vec<PhenotypeRecord>> {
        let mut stmt = self.conn.prepare_cached(TRAIT_SELECT_SQL)?;
        let mut rows = stmt.query(params![resource, phenocode])?;
        let mut records = Vec::new();

        while let Some(row) = rows.next()? {
            records.push(parse_trait_row(row)?);
        }

        Ok(records)
    }
}

fn parse_dataset_row(row: &Row<'_>) -> RepoResult<DatasetRecord> {
    const TABLE: &str = "dataset";
    Ok(DatasetRecord {
        resource: required(TABLE, "resource", text(row, TABLE, "resource")?)?,
        data_type: required(TABLE, "data_type", text(row, TABLE, "data_type")?)?,
        dataset_id: required(TABLE, "dataset_id", text(row, TABLE, "dataset_id")?)?,
        study_id: required(TABLE, "study_id", text(row, TABLE, "study_id")?)?,
        study_label: text(row, TABLE, "study_label")?,
        sample_group: text(row, TABLE, "sample_group")?,
        tissue_id: text(row, TABLE, "tissue_id")?,
        tissue_label: text(row, TABLE, "tissue_label")?,
        condition_label: text(row, TABLE, "condition_label")?,
        sample_size: count(row, TABLE, "sample_size")?,
        quant_method: text(row, TABLE, "quant_method")?,
    })
}

fn parse_trait_row(row: &Row<'_>) -> RepoResult<PhenotypeRecord> {
    const TABLE: &str = "trait";
    Ok(PhenotypeRecord {
        resource: required(TABLE, "resource", text(row, TABLE, "resource")?)?,
        data_type: required(TABLE, "data_type", text(row, TABLE, "data_type")?)?,
        trait_type: required(TABLE, "trait_type", text(row, TABLE, "trait_type")?)?,
        phenocode: required(TABLE, "phenocode", text(row, TABLE, "phenocode")?)?,
        phenostring: required(TABLE, "phenostring", text(row, TABLE, "phenostring")?)?,
        category: text(row, TABLE, "category")?,
        num_samples: required(TABLE, "num_samples", count(row, TABLE, "num_samples")?)?,
        num_cases: count(row, TABLE, "num_cases")?,
        num_controls: count(row, TABLE, "num_controls")?,
        pub_author: text(row, TABLE, "pub_author")?,
        pub_date: text(row, TABLE, "pub_date")?,
        is_na: false,
    })
}

fn required<T>(table: &str, column: &str, value: Option<T>) -> RepoResult<T> {
    value.ok_or_else(|| {
        RepoError::InvalidData(format!("NULL value in non-nullable column {table}.{column}"))
    })
}

/// Reads a text column; numeric cells are rendered as they print.
fn text(row: &Row<'_>, table: &str, column: &str) -> RepoResult<Option<String>> {
    match row.get_ref(column)? {
        ValueRef::Null => Ok(None),
        ValueRef::Text(bytes) => std::str::from_utf8(bytes)
            .map(|value| Some(value.to_string()))
            .map_err(|_| {
                RepoError::InvalidData(format!("non UTF-8 text in {table}.{column}"))
            }),
        ValueRef::Integer(value) => Ok(Some(value.to_string())),
        ValueRef::Real(value) => Ok(Some(value.to_string())),
        ValueRef::Blob(_) => Err(RepoError::InvalidData(format!(
            "blob value in text column {table}.{column}"
        ))),
    }
}

/// Reads a count column; integral REAL cells (as written by float-typed
/// exports of nullable integers) are accepted.
fn count(row: &Row<'_>, table: &str, column: &str) -> RepoResult<Option<i64>> {
    match row.get_ref(column)? {
        ValueRef::Null => Ok(None),
        ValueRef::Integer(value) => Ok(Some(value)),
        ValueRef::Real(value) if value.fract() == 0.0 && value.abs() <= MAX_EXACT_REAL => {
            Ok(Some(value as i64))
        }
        other => Err(RepoError::InvalidData(format!(
            "{table}.{column} holds {} value `{}` where a count is expected",
            other.data_type(),
            describe(other)
        ))),
    }
}

fn describe(value: ValueRef<'_>) -> String {
    match value {
        ValueRef::Null => "NULL".to_string(),
        ValueRef::Integer(value) => value.to_string(),
        ValueRef::Real(value) => value.to_string(),
        ValueRef::Text(bytes) => String::from_utf8_lossy(bytes).into_owned(),
        ValueRef::Blob(bytes) => format!("<{} bytes>", bytes.len()),
    }
}
