//! Repository layer over the metadata store.
//!
//! # Responsibility
//! - Define the lookup contract the metadata service depends on.
//! - Keep SQL projections and column-to-field mapping in one place.
//!
//! # Invariants
//! - Repositories never write to the store.
//! - A column that cannot be mapped onto its record field is reported as
//!   `RepoError::InvalidData`, not silently defaulted.

pub mod metadata_repo;
