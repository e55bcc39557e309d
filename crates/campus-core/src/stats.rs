//! Aggregate statistics served by the dashboards.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::entities::Progress;
use crate::enums::EnrollmentStatus;

/// Status breakdown of a set of enrollments.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BatchStats {
    pub total: u32,
    pub active: u32,
    pub completed: u32,
    pub dropped: u32,
    /// `completed / total * 100`, zero for an empty set.
    pub completion_rate: f64,
}

/// Count enrollments by exact status.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn calculate_batch_stats(statuses: &[EnrollmentStatus]) -> BatchStats {
    let count = |wanted: EnrollmentStatus| statuses.iter().filter(|s| **s == wanted).count() as u32;
    let total = statuses.len() as u32;
    let completed = count(EnrollmentStatus::Completed);
    let completion_rate = if total == 0 {
        0.0
    } else {
        f64::from(completed) / f64::from(total) * 100.0
    };
    BatchStats {
        total,
        active: count(EnrollmentStatus::Active),
        completed,
        dropped: count(EnrollmentStatus::Dropped),
        completion_rate,
    }
}

/// Platform-wide totals for the admin dashboard.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AdminStats {
    pub total_users: u64,
    pub total_courses: u64,
    pub total_trainers: u64,
    pub total_batches: u64,
    pub total_enrollments: u64,
    /// Sum of paid orders, in rupees.
    pub total_revenue: u64,
    pub active_students: u64,
    pub completed_courses: u64,
}

/// Order totals grouped by status. Amounts are in rupees.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PaymentStats {
    pub total_amount: u64,
    pub total_payments: u64,
    pub completed_amount: u64,
    pub completed_count: u64,
    pub pending_amount: u64,
    pub pending_count: u64,
    pub failed_amount: u64,
    pub failed_count: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TrainerStats {
    pub total_batches: u64,
    pub total_students: u64,
    pub upcoming_sessions: u64,
    pub completed_sessions: u64,
    /// Hours of completed sessions, rounded.
    pub total_hours: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StudentStats {
    pub enrolled_courses: u64,
    pub completed_courses: u64,
    pub upcoming_sessions: u64,
    pub total_hours: u64,
    pub average_progress: u32,
    pub certificates: u64,
}

/// Minutes of a completed lesson, for learning-hour estimates.
const MINUTES_PER_LESSON: u64 = 30;

impl StudentStats {
    /// Derive the progress-based figures from a student's progress records.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn from_progress(
        enrolled_courses: u64,
        progress: &[Progress],
        upcoming_sessions: u64,
    ) -> Self {
        let completed_courses = progress.iter().filter(|p| p.percentage >= 100).count() as u64;
        let average_progress = if progress.is_empty() {
            0
        } else {
            let sum: u64 = progress.iter().map(|p| u64::from(p.percentage)).sum();
            (sum + progress.len() as u64 / 2) / progress.len() as u64
        };
        let lessons: u64 = progress.iter().map(|p| u64::from(p.completed_lessons)).sum();
        Self {
            enrolled_courses,
            completed_courses,
            upcoming_sessions,
            total_hours: minutes_to_hours(lessons * MINUTES_PER_LESSON),
            average_progress: average_progress as u32,
            certificates: completed_courses,
        }
    }
}

/// Round minutes to the nearest whole hour, halves up.
#[must_use]
pub const fn minutes_to_hours(minutes: u64) -> u64 {
    (minutes + 30) / 60
}
