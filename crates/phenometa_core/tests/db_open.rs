mod common;

use common::MetadataFixture;
use phenometa_core::db::{open_metadata_db, DbError, REQUIRED_TABLES};
use rusqlite::Connection;

#[test]
fn open_metadata_db_accepts_store_with_required_tables() {
    let fixture = MetadataFixture::new();
    let conn = open_metadata_db(&fixture.path).unwrap();

    for table in REQUIRED_TABLES {
        let count: i64 = conn
            .query_row(&format!("SELECT COUNT(*) FROM {table};"), [], |row| row.get(0))
            .unwrap();
        assert!(count > 0, "fixture table {table} should have rows");
    }
}

#[test]
fn opened_connection_rejects_writes() {
    let fixture = MetadataFixture::new();
    let conn = open_metadata_db(&fixture.path).unwrap();

    let result = conn.execute("DELETE FROM dataset;", []);
    assert!(result.is_err());

    let remaining: i64 = fixture
        .writer()
        .query_row("SELECT COUNT(*) FROM dataset;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(remaining, 20);
}

#[test]
fn missing_store_file_is_a_sqlite_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = open_metadata_db(dir.path().join("absent.db")).unwrap_err();

    assert!(matches!(err, DbError::Sqlite(_)));
    assert!(!dir.path().join("absent.db").exists());
}

#[test]
fn store_without_trait_table_reports_missing_table() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("partial.db");
    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("CREATE TABLE dataset (dataset_id TEXT);").unwrap();
    drop(conn);

    let err = open_metadata_db(&path).unwrap_err();
    assert!(matches!(err, DbError::MissingTable("trait")));
    assert!(err.to_string().contains("trait"));
}

#[test]
fn uri_style_path_is_a_filename_not_a_uri() {
    let fixture = MetadataFixture::new();
    let uri = format!("file:{}?mode=ro", fixture.path.display());

    let err = open_metadata_db(&uri).unwrap_err();
    assert!(matches!(err, DbError::Sqlite(_)));
}
