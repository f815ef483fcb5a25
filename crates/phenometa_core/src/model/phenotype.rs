//! Phenotype (trait) metadata record and the NA sentinel.
//!
//! # Invariants
//! - Records built from store rows have `is_na = false`.
//! - [`PhenotypeRecord::na_sentinel`] is the only constructor that sets
//!   `is_na = true`, and it always uses phenocode [`NA_PHENOCODE`].
//! - Code outside this crate can neither build nor modify a `PhenotypeRecord`.

use serde::Serialize;

/// Phenocode denoting "this dataset has no named phenotype".
pub const NA_PHENOCODE: &str = "NA";

/// One trait measured within a resource.
///
/// Fields are read through accessors; only this crate builds records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PhenotypeRecord {
    pub(crate) resource: String,
    pub(crate) data_type: String,
    pub(crate) trait_type: String,
    pub(crate) phenocode: String,
    pub(crate) phenostring: String,
    pub(crate) category: Option<String>,
    pub(crate) num_samples: i64,
    pub(crate) num_cases: Option<i64>,
    pub(crate) num_controls: Option<i64>,
    pub(crate) pub_author: Option<String>,
    pub(crate) pub_date: Option<String>,
    pub(crate) is_na: bool,
}

impl PhenotypeRecord {
    /// Builds the placeholder returned when `resource` has no stored `NA` row.
    ///
    /// Every string field is the literal `NA` except `resource`; `category`
    /// stays null and all sample counts are zero.
    pub(crate) fn na_sentinel(resource: &str) -> Self {
        Self {
            resource: resource.to_string(),
            data_type: NA_PHENOCODE.to_string(),
            trait_type: NA_PHENOCODE.to_string(),
            phenocode: NA_PHENOCODE.to_string(),
            phenostring: NA_PHENOCODE.to_string(),
            category: None,
            num_samples: 0,
            num_cases: Some(0),
            num_controls: Some(0),
            pub_author: Some(NA_PHENOCODE.to_string()),
            pub_date: Some(NA_PHENOCODE.to_string()),
            is_na: true,
        }
    }

    pub fn resource(&self) -> &str {
        &self.resource
    }

    pub fn data_type(&self) -> &str {
        &self.data_type
    }

    pub fn trait_type(&self) -> &str {
        &self.trait_type
    }

    pub fn phenocode(&self) -> &str {
        &self.phenocode
    }

    /// Display name of the trait.
    pub fn phenostring(&self) -> &str {
        &self.phenostring
    }

    pub fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }

    pub fn num_samples(&self) -> i64 {
        self.num_samples
    }

    /// `None` for quantitative traits without a case/control split.
    pub fn num_cases(&self) -> Option<i64> {
        self.num_cases
    }

    pub fn num_controls(&self) -> Option<i64> {
        self.num_controls
    }

    pub fn pub_author(&self) -> Option<&str> {
        self.pub_author.as_deref()
    }

    pub fn pub_date(&self) -> Option<&str> {
        self.pub_date.as_deref()
    }

    /// `true` only for the synthesized placeholder, never for store rows.
    pub fn is_na(&self) -> bool {
        self.is_na
    }
}

#[cfg(test)]
mod tests {
    use super::{PhenotypeRecord, NA_PHENOCODE};

    #[test]
    fn na_sentinel_keeps_resource_and_zeroes_counts() {
        let record = PhenotypeRecord::na_sentinel("GTEx");

        assert_eq!(record.resource(), "GTEx");
        assert_eq!(record.phenocode(), NA_PHENOCODE);
        assert_eq!(record.phenostring(), NA_PHENOCODE);
        assert_eq!(record.data_type(), NA_PHENOCODE);
        assert_eq!(record.trait_type(), NA_PHENOCODE);
        assert_eq!(record.pub_author(), Some(NA_PHENOCODE));
        assert_eq!(record.pub_date(), Some(NA_PHENOCODE));
        assert_eq!(record.category(), None);
        assert_eq!(record.num_samples(), 0);
        assert_eq!(record.num_cases(), Some(0));
        assert_eq!(record.num_controls(), Some(0));
        assert!(record.is_na());
    }

    #[test]
    fn na_sentinel_serializes_fields_in_projection_order() {
        let json = serde_json::to_string(&PhenotypeRecord::na_sentinel("FinnGen"))
            .expect("sentinel should serialize");

        assert!(json.starts_with(r#"{"resource":"FinnGen","data_type":"NA""#));
        assert!(json.contains(r#""category":null"#));
        assert!(json.ends_with(r#""is_na":true}"#));
    }
}
