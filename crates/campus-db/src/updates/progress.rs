//! Lesson progress input.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressUpdate {
    pub course_id: String,
    pub completed_lessons: u32,
    pub total_lessons: u32,
}
