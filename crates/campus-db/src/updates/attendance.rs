//! Attendance marking input.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use campus_core::enums::AttendanceStatus;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkAttendance {
    pub batch_id: String,
    pub student_id: String,
    pub date: NaiveDate,
    #[serde(default)]
    pub status: AttendanceStatus,
}
