//! Metadata service configuration.
//!
//! The surrounding system hands over one configuration document; this
//! component reads only `metadata_db` and ignores every other key.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug)]
pub enum ConfigError {
    /// `metadata_db` is empty or whitespace.
    EmptyMetadataDb,
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse(serde_json::Error),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyMetadataDb => write!(f, "config option `metadata_db` cannot be empty"),
            Self::Io { path, source } => {
                write!(f, "failed to read config `{}`: {source}", path.display())
            }
            Self::Parse(err) => write!(f, "invalid config document: {err}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::EmptyMetadataDb => None,
            Self::Io { source, .. } => Some(source),
            Self::Parse(err) => Some(err),
        }
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(value: serde_json::Error) -> Self {
        Self::Parse(value)
    }
}

/// Location of the metadata store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataConfig {
    /// Path to the SQLite metadata database.
    pub metadata_db: PathBuf,
}

impl MetadataConfig {
    pub fn new(metadata_db: impl Into<PathBuf>) -> ConfigResult<Self> {
        let config = Self {
            metadata_db: metadata_db.into(),
        };
        config.validate()?;
        Ok(config)
    }

    /// Parses a JSON configuration document such as `{"metadata_db": "meta.db"}`.
    pub fn from_json_str(raw: &str) -> ConfigResult<Self> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&raw)
    }

    /// Rejects configurations that cannot name a store.
    ///
    /// Whether the file exists is left to the first read-only open.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.metadata_db.to_string_lossy().trim().is_empty() {
            return Err(ConfigError::EmptyMetadataDb);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, MetadataConfig};
    use std::path::Path;

    #[test]
    fn from_json_str_reads_metadata_db_and_ignores_other_keys() {
        let config = MetadataConfig::from_json_str(
            r#"{"metadata_db": "/data/meta.db", "gene_file": "genes.tsv", "port": 8080}"#,
        )
        .expect("config should parse");

        assert_eq!(config.metadata_db, Path::new("/data/meta.db"));
    }

    #[test]
    fn empty_metadata_db_is_rejected() {
        let err = MetadataConfig::new("  ").expect_err("blank path must be rejected");
        assert!(matches!(err, ConfigError::EmptyMetadataDb));

        let err = MetadataConfig::from_json_str(r#"{"metadata_db": ""}"#)
            .expect_err("empty path must be rejected");
        assert!(matches!(err, ConfigError::EmptyMetadataDb));
    }

    #[test]
    fn missing_metadata_db_key_is_a_parse_error() {
        let err = MetadataConfig::from_json_str(r#"{"other": 1}"#)
            .expect_err("metadata_db is required");
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn from_json_file_reports_unreadable_path() {
        let err = MetadataConfig::from_json_file("/definitely/not/here/config.json")
            .expect_err("missing file must fail");
        assert!(err.to_string().contains("/definitely/not/here/config.json"));
    }
}
