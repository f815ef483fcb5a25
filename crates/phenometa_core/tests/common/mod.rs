#![allow(dead_code)]

use phenometa_core::{MetadataConfig, MetadataService};
use rusqlite::{params, Connection};
use std::path::PathBuf;
use tempfile::TempDir;

const FIXTURE_SCHEMA: &str = "
CREATE TABLE dataset (
    resource TEXT NOT NULL,
    data_type TEXT NOT NULL,
    dataset_id TEXT NOT NULL PRIMARY KEY,
    study_id TEXT NOT NULL,
    study_label TEXT,
    sample_group TEXT,
    tissue_id TEXT,
    tissue_label TEXT,
    condition_label TEXT,
    sample_size INTEGER,
    quant_method TEXT
);
CREATE TABLE trait (
    resource TEXT NOT NULL,
    data_type TEXT NOT NULL,
    trait_type TEXT NOT NULL,
    phenocode TEXT NOT NULL,
    phenostring TEXT NOT NULL,
    category TEXT,
    num_samples INTEGER NOT NULL,
    num_cases INTEGER,
    num_controls INTEGER,
    pub_author TEXT,
    pub_date TEXT
);
";

/// A metadata store written to a temp directory, plus a service over it.
pub struct MetadataFixture {
    _dir: TempDir,
    pub path: PathBuf,
}

impl MetadataFixture {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("metadata.db");
        let conn = Connection::open(&path).unwrap();
        conn.execute_batch(FIXTURE_SCHEMA).unwrap();
        seed(&conn);
        Self { _dir: dir, path }
    }

    pub fn service(&self) -> MetadataService {
        MetadataService::new(self.config()).unwrap()
    }

    pub fn config(&self) -> MetadataConfig {
        MetadataConfig::new(self.path.clone()).unwrap()
    }

    pub fn writer(&self) -> Connection {
        Connection::open(&self.path).unwrap()
    }
}

pub fn dataset_ids() -> Vec<String> {
    (1..=20).map(|n| format!("DS{n:03}")).collect()
}

pub fn phenocodes() -> Vec<String> {
    (1..=20).map(|n| format!("PH{n:03}")).collect()
}

fn seed(conn: &Connection) {
    for (index, dataset_id) in dataset_ids().iter().enumerate() {
        let study_label = if dataset_id == "DS001" {
            "UKB".to_string()
        } else {
            format!("Study {index}")
        };
        conn.execute(
            "INSERT INTO dataset VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11);",
            params![
                "eQTL_Catalogue",
                "eQTL",
                dataset_id,
                format!("QTS{index:06}"),
                study_label,
                "blood",
                if index % 2 == 0 { Some("UBERON_0000178") } else { None },
                "blood",
                "naive",
                100 + index as i64,
                "ge",
            ],
        )
        .unwrap();
    }

    for (index, phenocode) in phenocodes().iter().enumerate() {
        insert_trait(
            conn,
            "FinnGen",
            phenocode,
            &format!("Trait {index}"),
            1000 + index as i64,
        );
    }
}

pub fn insert_trait(
    conn: &Connection,
    resource: &str,
    phenocode: &str,
    phenostring: &str,
    num_samples: i64,
) {
    conn.execute(
        "INSERT INTO trait VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11);",
        params![
            resource,
            "GWAS",
            "disease",
            phenocode,
            phenostring,
            Option::<String>::None,
            num_samples,
            num_samples / 10,
            num_samples - num_samples / 10,
            "FinnGen",
            "2023-12-01",
        ],
    )
    .unwrap();
}

pub fn expected_phenostring(phenocode: &str) -> String {
    let index: usize = phenocode.trim_start_matches("PH").parse::<usize>().unwrap() - 1;
    format!("Trait {index}")
}

pub fn expected_study_label(dataset_id: &str) -> String {
    let index: usize = dataset_id.trim_start_matches("DS").parse::<usize>().unwrap() - 1;
    if index == 0 {
        "UKB".to_string()
    } else {
        format!("Study {index}")
    }
}

