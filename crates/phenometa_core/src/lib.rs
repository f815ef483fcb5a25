//! Read-only genomic study metadata lookups.
//! This crate owns the lookup contracts the query service depends on.

pub mod annotation;
pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use config::{ConfigError, MetadataConfig};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::dataset::DatasetRecord;
pub use model::phenotype::{PhenotypeRecord, NA_PHENOCODE};
pub use repo::metadata_repo::{
    MetadataRepository, RepoError, RepoResult, SqliteMetadataRepository,
};
pub use service::metadata_service::{MetadataError, MetadataResult, MetadataService};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
