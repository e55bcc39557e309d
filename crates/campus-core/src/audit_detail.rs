//! Typed audit detail payloads.
//!
//! Each audit action can carry a structured `detail` JSON blob. These types
//! give the common shapes a schema so the audit listing stays predictable.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Detail for `AuditAction::StatusChanged`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StatusChangedDetail {
    pub from: String,
    pub to: String,
    pub reason: Option<String>,
}

/// Detail for `AuditAction::Assigned`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AssignedDetail {
    pub batch_id: String,
}

/// Detail for `AuditAction::Transferred`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TransferDetail {
    pub from_batch: Option<String>,
    pub to_batch: String,
    pub reason: Option<String>,
}

/// Detail for `AuditAction::Merged`, recorded on the target batch.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MergeDetail {
    pub source_batch: String,
    pub moved_students: u32,
}

/// Detail for `AuditAction::Planned`, recorded on the course.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PlanDetail {
    pub batches_created: u32,
    pub students_assigned: u32,
    pub recalculated: bool,
}

/// Detail for `AuditAction::Paid` and `AuditAction::Failed` on a payment.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PaymentDetail {
    pub order_id: String,
    pub amount: u64,
    pub enrollment_id: Option<String>,
    pub reason: Option<String>,
}
