//! Course create and update types.

use serde::{Deserialize, Serialize};

use campus_core::entities::{BatchTypeConfig, BatchTypes, OfflineMaterials, Pricing};
use campus_core::enums::{CourseStatus, Language, Level};

use super::double_option;

fn default_batch_types() -> BatchTypes {
    BatchTypes {
        regular: BatchTypeConfig {
            enabled: true,
            student_count: 0,
        },
        revision: BatchTypeConfig::default(),
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCourse {
    #[serde(default)]
    pub name: Option<String>,
    pub language: Language,
    pub level: Level,
    pub month: u32,
    pub year: i32,
    pub total_capacity: u32,
    pub course_duration: u32,
    pub batch_size_limit: u32,
    /// Only the `enabled` flags are read; seat counts always start at zero.
    #[serde(default = "default_batch_types")]
    pub batch_types: BatchTypes,
    #[serde(default)]
    pub pricing: Pricing,
    #[serde(default)]
    pub offline_materials: OfflineMaterials,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub instructor_id: Option<String>,
    #[serde(default)]
    pub trainer_ids: Vec<String>,
    #[serde(default)]
    pub status: Option<CourseStatus>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseUpdate {
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub name: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<Language>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<Level>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub month: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_capacity: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub course_duration: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch_size_limit: Option<u32>,
    /// Toggles for the two batch types; seat counts are never taken from input.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regular_enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revision_enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pricing: Option<Pricing>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offline_materials: Option<OfflineMaterials>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub instructor_id: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trainer_ids: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<CourseStatus>,
}

pub struct CourseUpdateBuilder(CourseUpdate);

impl CourseUpdateBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self(CourseUpdate::default())
    }

    #[must_use]
    pub fn name(mut self, val: Option<String>) -> Self {
        self.0.name = Some(val);
        self
    }

    #[must_use]
    pub const fn total_capacity(mut self, val: u32) -> Self {
        self.0.total_capacity = Some(val);
        self
    }

    #[must_use]
    pub const fn batch_size_limit(mut self, val: u32) -> Self {
        self.0.batch_size_limit = Some(val);
        self
    }

    #[must_use]
    pub const fn revision_enabled(mut self, val: bool) -> Self {
        self.0.revision_enabled = Some(val);
        self
    }

    #[must_use]
    pub fn pricing(mut self, val: Pricing) -> Self {
        self.0.pricing = Some(val);
        self
    }

    #[must_use]
    pub fn offline_materials(mut self, val: OfflineMaterials) -> Self {
        self.0.offline_materials = Some(val);
        self
    }

    #[must_use]
    pub fn instructor(mut self, val: Option<String>) -> Self {
        self.0.instructor_id = Some(val);
        self
    }

    #[must_use]
    pub const fn status(mut self, val: CourseStatus) -> Self {
        self.0.status = Some(val);
        self
    }

    #[must_use]
    pub fn build(self) -> CourseUpdate {
        self.0
    }
}

impl Default for CourseUpdateBuilder {
    fn default() -> Self {
        Self::new()
    }
}
