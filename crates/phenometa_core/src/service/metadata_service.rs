//! Metadata lookup service.
//!
//! # Responsibility
//! - Give callers on any thread read-only dataset and phenotype lookups.
//! - Own one store connection per calling thread, opened lazily on that
//!   thread's first lookup and released when that thread exits.
//! - Apply the NA fallback for phenotype misses.
//!
//! # Invariants
//! - A connection is only ever used by the thread that opened it.
//! - The connection map lock is held for map reads/inserts/removals only,
//!   never while a query runs.
//! - The map only holds connections of live threads.
//! - `get_phenotype` returns exactly one record or an error; the NA sentinel
//!   is returned only for phenocode `NA` with no stored row.
//! - At most one service is installed process-wide through
//!   [`MetadataService::install_global`], and it is never reconfigured.

use crate::config::{ConfigError, MetadataConfig};
use crate::db::{open_metadata_db, DbError};
use crate::model::dataset::DatasetRecord;
use crate::model::phenotype::{PhenotypeRecord, NA_PHENOCODE};
use crate::repo::metadata_repo::{MetadataRepository, RepoError, SqliteMetadataRepository};
use log::{debug, error, info, warn};
use once_cell::sync::OnceCell;
use rusqlite::Connection;
use std::cell::RefCell;
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::thread::{self, ThreadId};

static GLOBAL_SERVICE: OnceCell<MetadataService> = OnceCell::new();

thread_local! {
    static CONNECTION_LEASES: RefCell<Vec<ConnectionLease>> = const { RefCell::new(Vec::new()) };
}

pub type MetadataResult<T> = Result<T, MetadataError>;

/// Errors surfaced by metadata lookups.
#[derive(Debug)]
pub enum MetadataError {
    Config(ConfigError),
    /// Opening or querying the store failed.
    Db(DbError),
    InvalidData(String),
    /// No trait row exists for a phenocode other than `NA`.
    ///
    /// The store is missing an entry the rest of the system relies on; this
    /// needs a data fix, so callers should not retry.
    PhenotypeNotFound {
        resource: String,
        phenocode: String,
        data_type: String,
        dataset: String,
    },
    /// A thread panicked while holding a lock owned by the service.
    ConnectionPoisoned,
    AlreadyInstalled {
        active: PathBuf,
        requested: PathBuf,
    },
    NotInstalled,
}

impl MetadataError {
    /// Returns whether this error points at missing metadata rather than at
    /// store access or configuration.
    pub fn is_data_integrity(&self) -> bool {
        matches!(self, Self::PhenotypeNotFound { .. } | Self::InvalidData(_))
    }
}

impl Display for MetadataError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "metadata store access failed: {err}"),
            Self::InvalidData(message) => write!(f, "invalid stored metadata: {message}"),
            Self::PhenotypeNotFound {
                resource,
                phenocode,
                data_type,
                dataset,
            } => write!(
                f,
                "no trait name found for resource `{resource}` phenocode `{phenocode}` (data_type `{data_type}`, dataset `{dataset}`)"
            ),
            Self::ConnectionPoisoned => write!(f, "metadata connection lock poisoned"),
            Self::AlreadyInstalled { active, requested } => write!(
                f,
                "metadata service already installed for `{}`; refusing to switch to `{}`",
                active.display(),
                requested.display()
            ),
            Self::NotInstalled => write!(f, "metadata service has not been installed"),
        }
    }
}

impl Error for MetadataError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Config(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ConfigError> for MetadataError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<DbError> for MetadataError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<RepoError> for MetadataError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::Db(err) => Self::Db(err),
            RepoError::InvalidData(message) => Self::InvalidData(message),
        }
    }
}

type SharedConnection = Arc<Mutex<Connection>>;
type ConnectionMap = Mutex<HashMap<ThreadId, SharedConnection>>;

/// Drops one thread's connection from a service map when the thread exits.
struct ConnectionLease {
    thread_id: ThreadId,
    connections: Weak<ConnectionMap>,
}

impl Drop for ConnectionLease {
    fn drop(&mut self) {
        let Some(connections) = self.connections.upgrade() else {
            return;
        };
        if let Ok(mut connections) = connections.lock() {
            connections.remove(&self.thread_id);
        };
    }
}

/// Read-only dataset/phenotype lookups with per-thread connection affinity.
///
/// The service is `Sync`; share it by reference or through an `Arc`.
#[derive(Debug)]
pub struct MetadataService {
    config: MetadataConfig,
    connections: Arc<ConnectionMap>,
}

impl MetadataService {
    /// Creates a service for the store named by `config`.
    ///
    /// No connection is opened until the first lookup.
    pub fn new(config: MetadataConfig) -> MetadataResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            connections: Arc::new(Mutex::new(HashMap::new())),
        })
    }

    /// Installs the process-wide service.
    ///
    /// Repeating the call with an identical config returns the installed
    /// service; a different config is rejected.
    pub fn install_global(config: MetadataConfig) -> MetadataResult<&'static MetadataService> {
        let service = GLOBAL_SERVICE.get_or_try_init(|| {
            let service = MetadataService::new(config.clone())?;
            info!(
                "event=service_install module=service status=ok metadata_db={}",
                config.metadata_db.display()
            );
            Ok::<_, MetadataError>(service)
        })?;

        if service.config != config {
            return Err(MetadataError::AlreadyInstalled {
                active: service.config.metadata_db.clone(),
                requested: config.metadata_db,
            });
        }
        Ok(service)
    }

    /// Returns the process-wide service installed by [`Self::install_global`].
    pub fn global() -> MetadataResult<&'static MetadataService> {
        GLOBAL_SERVICE.get().ok_or(MetadataError::NotInstalled)
    }

    pub fn config(&self) -> &MetadataConfig {
        &self.config
    }

    /// Number of live threads that currently own a connection.
    pub fn open_connection_count(&self) -> MetadataResult<usize> {
        Ok(self.lock_connections()?.len())
    }

    /// Looks up one dataset by exact id.
    ///
    /// An unknown id is `Ok(None)`, never an error.
    pub fn get_dataset(&self, dataset_id: &str) -> MetadataResult<Option<DatasetRecord>> {
        let record = self.with_repository(|repo| repo.find_dataset(dataset_id))?;
        match &record {
            Some(_) => {
                debug!("event=dataset_lookup module=service status=ok dataset_id={dataset_id}")
            }
            None => {
                debug!("event=dataset_lookup module=service status=miss dataset_id={dataset_id}")
            }
        }
        Ok(record)
    }

    /// Looks up one phenotype by `(resource, phenocode)`.
    ///
    /// `data_type` and `dataset` only feed diagnostics.
    ///
    /// # Contract
    /// - Stored row → that row with `is_na = false`. With several rows the
    ///   first in store order wins and a `phenotype_duplicate` warning is logged.
    /// - No row, phenocode `NA` → the NA sentinel for `resource`.
    /// - No row otherwise → `MetadataError::PhenotypeNotFound`.
    pub fn get_phenotype(
        &self,
        resource: &str,
        data_type: &str,
        dataset: &str,
        phenocode: &str,
    ) -> MetadataResult<PhenotypeRecord> {
        let records = self.with_repository(|repo| repo.find_phenotypes(resource, phenocode))?;
        if records.len() > 1 {
            warn!(
                "event=phenotype_duplicate module=service status=ok resource={} phenocode={} matches={}",
                resource,
                phenocode,
                records.len()
            );
        }

        if let Some(record) = records.into_iter().next() {
            debug!("event=phenotype_lookup module=service status=ok resource={resource} phenocode={phenocode}");
            return Ok(record);
        }

        if phenocode == NA_PHENOCODE {
            debug!(
                "event=phenotype_lookup module=service status=synthesized resource={resource} dataset={dataset}"
            );
            return Ok(PhenotypeRecord::na_sentinel(resource));
        }

        error!(
            "event=phenotype_lookup module=service status=error error_code=phenotype_not_found resource={} data_type={} dataset={} phenocode={}",
            resource, data_type, dataset, phenocode
        );
        Err(MetadataError::PhenotypeNotFound {
            resource: resource.to_string(),
            phenocode: phenocode.to_string(),
            data_type: data_type.to_string(),
            dataset: dataset.to_string(),
        })
    }

    fn with_repository<T>(
        &self,
        lookup: impl FnOnce(&SqliteMetadataRepository<'_>) -> Result<T, RepoError>,
    ) -> MetadataResult<T> {
        let handle = self.connection_for_current_thread()?;
        let conn = handle
            .lock()
            .map_err(|_| MetadataError::ConnectionPoisoned)?;
        let repo = SqliteMetadataRepository::new(&conn);
        Ok(lookup(&repo)?)
    }

    fn connection_for_current_thread(&self) -> MetadataResult<SharedConnection> {
        let thread_id = thread::current().id();
        if let Some(handle) = self.lock_connections()?.get(&thread_id) {
            return Ok(Arc::clone(handle));
        }

        // Opened outside the map lock; no other thread inserts under this id.
        let conn = open_metadata_db(&self.config.metadata_db)?;
        debug!("event=connection_open module=service status=ok thread={thread_id:?}");

        let handle = Arc::new(Mutex::new(conn));
        self.lock_connections()?.insert(thread_id, Arc::clone(&handle));
        self.lease_to_current_thread(thread_id);
        Ok(handle)
    }

    fn lease_to_current_thread(&self, thread_id: ThreadId) {
        let lease = ConnectionLease {
            thread_id,
            connections: Arc::downgrade(&self.connections),
        };
        // Unavailable only while this thread is already tearing down its
        // thread-locals; the entry then lives as long as the service.
        let _ = CONNECTION_LEASES.try_with(|leases| {
            let mut leases = leases.borrow_mut();
            leases.retain(|held| held.connections.strong_count() > 0);
            leases.push(lease);
        });
    }

    fn lock_connections(
        &self,
    ) -> MetadataResult<MutexGuard<'_, HashMap<ThreadId, SharedConnection>>> {
        self.connections
            .lock()
            .map_err(|_| MetadataError::ConnectionPoisoned)
    }
}

#[cfg(test)]
mod tests {
    use super::{MetadataError, MetadataService};
    use crate::config::MetadataConfig;

    #[test]
    fn new_service_opens_no_connection() {
        let config = MetadataConfig::new("/nonexistent/meta.db").expect("config should build");
        let service = MetadataService::new(config).expect("service should build lazily");

        assert_eq!(service.open_connection_count().expect("count should read"), 0);
    }

    #[test]
    fn lookup_against_missing_store_is_a_db_error() {
        let config = MetadataConfig::new("/nonexistent/meta.db").expect("config should build");
        let service = MetadataService::new(config).expect("service should build lazily");

        let err = service
            .get_dataset("DS001")
            .expect_err("missing store must fail");
        assert!(matches!(err, MetadataError::Db(_)));
        assert!(!err.is_data_integrity());
        assert_eq!(service.open_connection_count().expect("count should read"), 0);
    }

    #[test]
    fn phenotype_not_found_message_names_resource_and_phenocode() {
        let err = MetadataError::PhenotypeNotFound {
            resource: "GTEx".to_string(),
            phenocode: "XYZ123".to_string(),
            data_type: "expr".to_string(),
            dataset: "anydataset".to_string(),
        };

        let message = err.to_string();
        assert!(message.contains("GTEx"));
        assert!(message.contains("XYZ123"));
        assert!(err.is_data_integrity());
    }
}
