use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::{BatchType, EnrollmentStatus, PaymentState};

/// Payment block carried on an enrollment. Amount is in whole rupees.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct EnrollmentPayment {
    pub amount: u64,
    pub status: PaymentState,
    pub paid_at: Option<DateTime<Utc>>,
}

impl Default for EnrollmentPayment {
    fn default() -> Self {
        Self {
            amount: 0,
            status: PaymentState::Pending,
            paid_at: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TaskTally {
    pub completed: u32,
    pub total: u32,
}

impl TaskTally {
    fn percentage(self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            f64::from(self.completed) * 100.0 / f64::from(self.total)
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EnrollmentProgress {
    /// Attendance percentage, 0 to 100.
    pub attendance: u32,
    pub assignments: TaskTally,
    pub tests: TaskTally,
    pub overall_grade: Option<f64>,
}

/// One move between batches.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TransferRecord {
    pub from_batch: Option<String>,
    pub to_batch: String,
    pub reason: Option<String>,
    pub transferred_at: DateTime<Utc>,
}

/// Links a student to a course and, once assigned, to a batch.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Enrollment {
    pub id: String,
    pub student_id: String,
    pub course_id: String,
    /// `None` until the student is placed in a batch.
    pub batch_id: Option<String>,
    pub batch_type: BatchType,
    /// Payment order this enrollment was paid through.
    pub payment_id: Option<String>,
    pub status: EnrollmentStatus,
    pub payment: EnrollmentPayment,
    pub enrolled_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub progress: EnrollmentProgress,
    pub notes: Option<String>,
    pub transfer_history: Vec<TransferRecord>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Enrollment {
    /// Mean of attendance, assignment completion, and test completion, rounded.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn progress_percentage(&self) -> u32 {
        let attendance = f64::from(self.progress.attendance.min(100));
        let sum =
            attendance + self.progress.assignments.percentage() + self.progress.tests.percentage();
        (sum / 3.0).round() as u32
    }

    #[must_use]
    pub const fn is_active(&self) -> bool {
        matches!(self.status, EnrollmentStatus::Active)
    }

    /// Whole days since enrollment, up to `now`.
    #[must_use]
    pub fn enrollment_duration_days(&self, now: DateTime<Utc>) -> i64 {
        (now - self.enrolled_at).num_days().max(0)
    }
}
