//! Use-case services exposed to the query layer.
//!
//! # Responsibility
//! - Hide store connection management from callers.
//! - Turn repository results into the lookup contracts callers rely on.

pub mod metadata_service;
