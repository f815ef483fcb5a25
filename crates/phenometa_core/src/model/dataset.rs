//! Dataset (study) metadata record.

use serde::Serialize;

/// One study/dataset entry from the `dataset` table.
///
/// Field order follows the projection of the dataset query and is preserved
/// when the record is serialized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DatasetRecord {
    /// Source resource, e.g. `eQTL_Catalogue` or `FinnGen`.
    pub resource: String,
    pub data_type: String,
    /// Store-issued identifier, unique within the `dataset` table.
    pub dataset_id: String,
    pub study_id: String,
    pub study_label: Option<String>,
    pub sample_group: Option<String>,
    pub tissue_id: Option<String>,
    pub tissue_label: Option<String>,
    pub condition_label: Option<String>,
    pub sample_size: Option<i64>,
    /// Quantification method, e.g. `ge` or `exon`.
    pub quant_method: Option<String>,
}
