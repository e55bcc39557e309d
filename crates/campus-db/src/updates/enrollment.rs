//! Enrollment create and status-change types.

use serde::{Deserialize, Serialize};

use campus_core::enums::{BatchType, EnrollmentStatus};

/// An enrollment created by an admin on a student's behalf.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewEnrollment {
    #[serde(default)]
    pub student_id: String,
    #[serde(default)]
    pub course_id: String,
    #[serde(default)]
    pub batch_type: BatchType,
    /// Place the student straight into this batch.
    #[serde(default)]
    pub batch_id: Option<String>,
    #[serde(default)]
    pub payment_id: Option<String>,
    /// Rupees.
    #[serde(default)]
    pub payment_amount: u64,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrollmentStatusChange {
    pub status: EnrollmentStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Filters for enrollment listings. All present filters must match.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrollmentFilter {
    pub course_id: Option<String>,
    pub batch_id: Option<String>,
    pub student_id: Option<String>,
    pub status: Option<EnrollmentStatus>,
    pub batch_type: Option<BatchType>,
}
