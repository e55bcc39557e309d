//! JSON response shapes returned by the HTTP API.
//!
//! Entities are serialized as-is; these structs cover the envelopes,
//! summaries, and planner results that wrap them.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::entities::{
    Batch, BlogPost, Course, CourseBatchSummary, Enrollment, Payment, User,
};
use crate::stats::PaymentStats;

// ---------------------------------------------------------------------------
// Envelopes
// ---------------------------------------------------------------------------

/// Pagination block attached to every paged listing.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub pages: u64,
}

impl Pagination {
    #[must_use]
    pub fn new(page: u32, limit: u32, total: u64) -> Self {
        let pages = if limit == 0 {
            0
        } else {
            total.div_ceil(u64::from(limit))
        };
        Self {
            page,
            limit,
            total,
            pages,
        }
    }

    /// Row offset of the first item on this page.
    #[must_use]
    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.limit)
    }
}

/// Body returned for a request that failed validation.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct ValidationFailure {
    pub success: bool,
    pub message: String,
    pub errors: Vec<String>,
}

/// Wrap a list of rule violations into the validation failure body.
#[must_use]
pub fn handle_validation_error(errors: Vec<String>) -> ValidationFailure {
    ValidationFailure {
        success: false,
        message: "Validation failed".to_string(),
        errors,
    }
}

/// Plain `{message}` body used for errors and simple acknowledgements.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Courses and batch planning
// ---------------------------------------------------------------------------

/// Seats used against a course's total capacity.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CapacityUtilization {
    pub total_capacity: u32,
    pub used_capacity: u32,
    pub available_capacity: u32,
    pub utilization_percentage: u32,
}

impl CapacityUtilization {
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn new(total_capacity: u32, used_capacity: u32) -> Self {
        let utilization_percentage = if total_capacity == 0 {
            0
        } else {
            (f64::from(used_capacity) * 100.0 / f64::from(total_capacity)).round() as u32
        };
        Self {
            total_capacity,
            used_capacity,
            available_capacity: total_capacity.saturating_sub(used_capacity),
            utilization_percentage,
        }
    }
}

/// Batches and placed-or-placeable students of one batch type.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TypeDistribution {
    pub batches: Vec<Batch>,
    pub students: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TypeDistributions {
    pub regular: TypeDistribution,
    pub revision: TypeDistribution,
}

/// How a course's students are spread over its batches.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BatchDistributionSummary {
    pub course_id: String,
    pub total_students: u32,
    pub total_batches: u32,
    pub batch_types: TypeDistributions,
    pub leftover_batches: Vec<Batch>,
    pub capacity_utilization: CapacityUtilization,
}

/// A course in a listing, with its display name and seat arithmetic.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CourseWithSummary {
    #[serde(flatten)]
    pub course: Course,
    pub display_name: String,
    pub total_enrolled: u32,
    pub available_slots: u32,
    pub batch_summary: CourseBatchSummary,
}

impl From<Course> for CourseWithSummary {
    fn from(course: Course) -> Self {
        Self {
            display_name: course.display_name(),
            total_enrolled: course.total_enrolled(),
            available_slots: course.available_slots(),
            batch_summary: course.batch_summary(),
            course,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct CourseListResponse {
    pub courses: Vec<CourseWithSummary>,
    pub pagination: Pagination,
}

/// Counts reported by a planner run.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BatchPlanSummary {
    pub total_students: u32,
    pub regular_students: u32,
    pub revision_students: u32,
    pub total_batches: u32,
    pub leftover_students: u32,
}

/// Outcome of creating or recalculating a course's batches.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BatchPlanResult {
    pub course_id: String,
    /// Full batches, plus the single empty batch created for a type with no students.
    pub batches: Vec<Batch>,
    pub leftover_batches: Vec<Batch>,
    pub summary: BatchPlanSummary,
}

/// Outcome of resolving a leftover batch.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LeftoverResult {
    pub success: bool,
    pub message: String,
    pub merged_students: Option<u32>,
    pub target_batch: Option<Batch>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct BatchListResponse {
    pub batches: Vec<Batch>,
    pub pagination: Pagination,
}

// ---------------------------------------------------------------------------
// Enrollments and people
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct EnrollmentListResponse {
    pub enrollments: Vec<Enrollment>,
    pub pagination: Pagination,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct UserListResponse {
    pub users: Vec<User>,
    pub pagination: Pagination,
}

/// A student seen from a trainer's roster.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RosterEntry {
    pub student: User,
    pub enrollment: Enrollment,
    pub batch_name: String,
    pub progress_percentage: u32,
}

/// One of a student's enrollments with the course it belongs to.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StudentCourse {
    pub enrollment: Enrollment,
    pub course: CourseWithSummary,
}

// ---------------------------------------------------------------------------
// Blog
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct BlogListResponse {
    pub posts: Vec<BlogPost>,
    pub pagination: Pagination,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BlogPostResponse {
    pub post: BlogPost,
    pub related_posts: Vec<BlogPost>,
}

// ---------------------------------------------------------------------------
// Payments
// ---------------------------------------------------------------------------

/// Checkout parameters for a newly created order.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct OrderResponse {
    pub order_id: String,
    /// Smallest currency unit.
    pub amount: u64,
    pub currency: String,
    pub receipt: String,
    pub key_id: String,
    pub payment: Payment,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VerifyPaymentResponse {
    pub success: bool,
    pub message: String,
    pub payment: Payment,
    pub enrollment: Enrollment,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct PaymentListResponse {
    pub payments: Vec<Payment>,
    pub pagination: Pagination,
    pub stats: PaymentStats,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn pagination_pages_round_up() {
        let p = Pagination::new(2, 10, 23);
        assert_eq!(p.pages, 3);
        assert_eq!(p.offset(), 10);
        assert_eq!(Pagination::new(1, 10, 0).pages, 0);
        assert_eq!(Pagination::new(1, 10, 10).pages, 1);
    }

    #[test]
    fn validation_failure_shape() {
        let body = handle_validation_error(vec![
            "Title is required".into(),
            "Price must be positive".into(),
        ]);
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["message"], "Validation failed");
        assert_eq!(json["errors"][1], "Price must be positive");
    }

    #[test]
    fn utilization_rounds_and_saturates() {
        let u = CapacityUtilization::new(30, 10);
        assert_eq!(u.utilization_percentage, 33);
        assert_eq!(u.available_capacity, 20);

        let over = CapacityUtilization::new(10, 12);
        assert_eq!(over.available_capacity, 0);
        assert_eq!(over.utilization_percentage, 120);
        assert_eq!(CapacityUtilization::new(0, 0).utilization_percentage, 0);
    }
}
