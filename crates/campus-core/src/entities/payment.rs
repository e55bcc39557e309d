use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::{BatchType, OrderStatus};

/// A payment order for one course seat. Amount is in whole rupees.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub id: String,
    pub user_id: String,
    pub course_id: String,
    pub batch_type: BatchType,
    pub amount: u64,
    pub currency: String,
    pub status: OrderStatus,
    /// Gateway order id handed to the checkout widget.
    pub order_id: String,
    pub gateway_payment_id: Option<String>,
    #[serde(skip_serializing)]
    pub signature: Option<String>,
    pub receipt: String,
    pub failure_reason: Option<String>,
    pub paid_at: Option<DateTime<Utc>>,
    pub failed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Payment {
    /// Amount in the smallest currency unit, as gateways expect it.
    #[must_use]
    pub const fn amount_in_paise(&self) -> u64 {
        self.amount * 100
    }
}
