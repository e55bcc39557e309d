//! Stateless validation predicates shared by the HTTP handlers and tests.
//!
//! Form validators take a plain input whose fields are all optional, check
//! every rule independently, and return one message per violated rule. An
//! empty list means the input is valid. Time-sensitive validators come in two
//! forms: one that reads the clock and an `_at` variant that takes `now`.

mod batch;
mod capacity;
mod catalog;
mod course;
mod enrollment;
mod payment;
mod session;
mod user;

pub use batch::{BatchForm, validate_batch_data, validate_batch_data_at};
pub use capacity::{
    CapacityCheck, MAX_DATE_RANGE_DAYS, validate_batch_capacity, validate_date_range,
    validate_date_range_at,
};
pub use catalog::{
    MAX_BLOG_EXCERPT_CHARS, MAX_BLOG_TITLE_CHARS, validate_blog_post, validate_course,
    validate_homepage_ad,
};
pub use course::{CourseForm, validate_course_data};
pub use enrollment::{EnrollmentForm, validate_enrollment_data};
pub use payment::{
    MAX_AMOUNT_PAISE, MIN_AMOUNT_PAISE, OrderNotes, OrderParams, PaymentParams, SUPPORTED_CURRENCY,
    validate_amount, validate_order_params, validate_payment_params,
};
pub use session::{SessionForm, validate_session_data, validate_session_data_at};
pub use user::{UserForm, is_valid_email, validate_user_data};

use crate::errors::CoreError;

/// Turn a list of rule violations into a `Result`.
///
/// # Errors
///
/// Returns [`CoreError::Validation`] carrying every message when the list is
/// non-empty.
pub fn into_result(errors: Vec<String>) -> Result<(), CoreError> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(CoreError::Validation(errors))
    }
}

/// True when the value is missing or only whitespace.
pub(crate) fn is_blank(value: Option<&str>) -> bool {
    value.is_none_or(|v| v.trim().is_empty())
}

/// True when the trimmed value is missing or shorter than `min` characters.
pub(crate) fn shorter_than(value: Option<&str>, min: usize) -> bool {
    value.is_none_or(|v| v.trim().chars().count() < min)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_list_is_ok() {
        assert!(into_result(Vec::new()).is_ok());
    }

    #[test]
    fn messages_survive_conversion() {
        let err = into_result(vec!["Batch ID is required".into()]).unwrap_err();
        match err {
            CoreError::Validation(errors) => assert_eq!(errors, vec!["Batch ID is required"]),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn blank_and_length_helpers() {
        assert!(is_blank(None));
        assert!(is_blank(Some("   ")));
        assert!(!is_blank(Some("x")));
        assert!(shorter_than(Some(" ab "), 3));
        assert!(!shorter_than(Some("abc"), 3));
    }
}
