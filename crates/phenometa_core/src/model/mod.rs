//! Metadata records returned to the query service.
//!
//! # Responsibility
//! - Define one statically typed record per metadata query.
//! - Keep the distinction between store-sourced and synthesized phenotypes
//!   visible in the type.
//!
//! # Invariants
//! - Records are immutable snapshots of store rows; no computed fields.
//! - Only the NA sentinel carries `is_na = true`.

pub mod dataset;
pub mod phenotype;
