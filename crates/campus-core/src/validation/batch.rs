use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{is_blank, shorter_than};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchForm {
    pub name: Option<String>,
    pub course_id: Option<String>,
    pub trainer_id: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub max_students: Option<i64>,
}

/// Validate a batch form against the current time.
#[must_use]
pub fn validate_batch_data(form: &BatchForm) -> Vec<String> {
    validate_batch_data_at(form, Utc::now())
}

/// Validate a batch form as of `now`.
///
/// The end-after-start rule is checked whenever both dates are present, even
/// if the start date already failed the future check.
#[must_use]
pub fn validate_batch_data_at(form: &BatchForm, now: DateTime<Utc>) -> Vec<String> {
    let mut errors = Vec::new();

    if shorter_than(form.name.as_deref(), 3) {
        errors.push("Batch name must be at least 3 characters".to_string());
    }
    if is_blank(form.course_id.as_deref()) {
        errors.push("Course ID is required".to_string());
    }
    if is_blank(form.trainer_id.as_deref()) {
        errors.push("Trainer ID is required".to_string());
    }
    if form.start_date.is_none_or(|start| start <= now) {
        errors.push("Start date must be in the future".to_string());
    }
    if matches!((form.start_date, form.end_date), (Some(start), Some(end)) if end <= start) {
        errors.push("End date must be after start date".to_string());
    }
    if form.max_students.is_some_and(|max| !(1..=50).contains(&max)) {
        errors.push("Max students must be between 1 and 50".to_string());
    }

    errors
}
