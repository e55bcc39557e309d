use chrono::{DateTime, Duration, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Longest allowed span for a date range.
pub const MAX_DATE_RANGE_DAYS: i64 = 365;

/// Outcome of a capacity or date-range check.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct CapacityCheck {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl CapacityCheck {
    #[must_use]
    pub const fn ok() -> Self {
        Self {
            valid: true,
            message: None,
        }
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            valid: false,
            message: Some(message.into()),
        }
    }
}

/// Whether `additional` more students fit into a batch holding `current` of `max`.
#[must_use]
pub fn validate_batch_capacity(current: u32, max: u32, additional: u32) -> CapacityCheck {
    if u64::from(current) + u64::from(additional) > u64::from(max) {
        let plural = if additional > 1 { "s" } else { "" };
        CapacityCheck::fail(format!(
            "Batch is full. Cannot enroll {additional} more student{plural}."
        ))
    } else {
        CapacityCheck::ok()
    }
}

/// Check a date range against the current time. Stops at the first failure.
#[must_use]
pub fn validate_date_range(start: DateTime<Utc>, end: DateTime<Utc>) -> CapacityCheck {
    validate_date_range_at(start, end, Utc::now())
}

#[must_use]
pub fn validate_date_range_at(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    now: DateTime<Utc>,
) -> CapacityCheck {
    if start < now {
        return CapacityCheck::fail("Start date must be in the future");
    }
    if end <= start {
        return CapacityCheck::fail("End date must be after start date");
    }
    if end - start > Duration::days(MAX_DATE_RANGE_DAYS) {
        return CapacityCheck::fail("Duration cannot exceed 1 year");
    }
    CapacityCheck::ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn capacity_cases() {
        assert_eq!(
            validate_batch_capacity(20, 25, 3),
            CapacityCheck::fail("Batch is full. Cannot enroll 3 more students.")
        );
        assert_eq!(validate_batch_capacity(20, 25, 2), CapacityCheck::ok());
        assert_eq!(
            validate_batch_capacity(25, 25, 1),
            CapacityCheck::fail("Batch is full. Cannot enroll 1 more student.")
        );
    }

    #[test]
    fn capacity_ok_serializes_without_message() {
        let json = serde_json::to_value(validate_batch_capacity(0, 1, 1)).unwrap();
        assert_eq!(json, serde_json::json!({ "valid": true }));
    }

    #[test]
    fn date_range_short_circuits_in_order() {
        let now = Utc::now();
        let future_start = now + Duration::days(7);
        let future_end = now + Duration::days(60);
        let past_start = now - Duration::days(7);

        assert_eq!(
            validate_date_range_at(future_start, future_end, now),
            CapacityCheck::ok()
        );
        assert_eq!(
            validate_date_range_at(past_start, future_end, now).message.as_deref(),
            Some("Start date must be in the future")
        );
        assert_eq!(
            validate_date_range_at(future_end, future_start, now).message.as_deref(),
            Some("End date must be after start date")
        );
        assert_eq!(
            validate_date_range_at(future_start, future_start + Duration::days(366), now)
                .message
                .as_deref(),
            Some("Duration cannot exceed 1 year")
        );
    }
}
