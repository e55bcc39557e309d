//! Material create type.

use serde::{Deserialize, Serialize};

use campus_core::enums::{MaterialStatus, MaterialType};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMaterial {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub file_url: String,
    #[serde(rename = "type")]
    pub material_type: MaterialType,
    pub course_id: String,
    #[serde(default)]
    pub batch_id: Option<String>,
    #[serde(default)]
    pub status: MaterialStatus,
}
