//! Batch create and update types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use campus_core::entities::MeetingSchedule;
use campus_core::enums::{BatchStatus, BatchType};
use campus_core::validation::BatchForm;

use super::double_option;

/// A batch created by hand from the admin screen.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub course_id: Option<String>,
    #[serde(default)]
    pub trainer_id: Option<String>,
    #[serde(default)]
    pub batch_type: BatchType,
    #[serde(default)]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub max_students: Option<i64>,
    /// Months; defaults to the course duration.
    #[serde(default)]
    pub duration: Option<u32>,
    #[serde(default)]
    pub meeting_schedule: MeetingSchedule,
    #[serde(default)]
    pub notes: Option<String>,
}

impl NewBatch {
    /// The fields checked by `validate_batch_data`.
    #[must_use]
    pub fn form(&self) -> BatchForm {
        BatchForm {
            name: self.name.clone(),
            course_id: self.course_id.clone(),
            trainer_id: self.trainer_id.clone(),
            start_date: self.start_date,
            end_date: self.end_date,
            max_students: self.max_students,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub trainer_id: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_students: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<BatchStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meeting_schedule: Option<MeetingSchedule>,
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub notes: Option<Option<String>>,
}

pub struct BatchUpdateBuilder(BatchUpdate);

impl BatchUpdateBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self(BatchUpdate::default())
    }

    #[must_use]
    pub fn name(mut self, val: impl Into<String>) -> Self {
        self.0.name = Some(val.into());
        self
    }

    #[must_use]
    pub fn trainer(mut self, val: Option<String>) -> Self {
        self.0.trainer_id = Some(val);
        self
    }

    #[must_use]
    pub const fn max_students(mut self, val: u32) -> Self {
        self.0.max_students = Some(val);
        self
    }

    #[must_use]
    pub const fn status(mut self, val: BatchStatus) -> Self {
        self.0.status = Some(val);
        self
    }

    #[must_use]
    pub fn notes(mut self, val: Option<String>) -> Self {
        self.0.notes = Some(val);
        self
    }

    #[must_use]
    pub fn build(self) -> BatchUpdate {
        self.0
    }
}

impl Default for BatchUpdateBuilder {
    fn default() -> Self {
        Self::new()
    }
}
