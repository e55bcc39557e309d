use serde::{Deserialize, Serialize};

use super::is_blank;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrollmentForm {
    pub student_id: Option<String>,
    pub batch_id: Option<String>,
    pub payment_id: Option<String>,
}

#[must_use]
pub fn validate_enrollment_data(form: &EnrollmentForm) -> Vec<String> {
    let mut errors = Vec::new();
    if is_blank(form.student_id.as_deref()) {
        errors.push("Student ID is required".to_string());
    }
    if is_blank(form.batch_id.as_deref()) {
        errors.push("Batch ID is required".to_string());
    }
    if is_blank(form.payment_id.as_deref()) {
        errors.push("Payment ID is required".to_string());
    }
    errors
}
