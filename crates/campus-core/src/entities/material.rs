use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::{MaterialStatus, MaterialType};

/// A study material attached to a course, optionally scoped to one batch.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Material {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub file_url: String,
    #[serde(rename = "type")]
    pub material_type: MaterialType,
    pub course_id: String,
    pub batch_id: Option<String>,
    pub uploaded_by: String,
    pub status: MaterialStatus,
    pub downloads: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
