use serde::{Deserialize, Serialize};

use super::shorter_than;
use crate::enums::CourseCategory;

/// Catalog course form.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseForm {
    pub title: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    /// Weeks.
    pub duration: Option<f64>,
    pub category: Option<String>,
}

#[must_use]
pub fn validate_course_data(form: &CourseForm) -> Vec<String> {
    let mut errors = Vec::new();

    if shorter_than(form.title.as_deref(), 3) {
        errors.push("Course title must be at least 3 characters".to_string());
    }
    if shorter_than(form.description.as_deref(), 10) {
        errors.push("Course description must be at least 10 characters".to_string());
    }
    if form.price.is_none_or(|p| p <= 0.0 || p.is_nan()) {
        errors.push("Course price must be a positive number".to_string());
    }
    if form.duration.is_none_or(|d| d < 1.0 || d.is_nan()) {
        errors.push("Course duration must be at least 1 week".to_string());
    }
    let category_ok = form
        .category
        .as_deref()
        .is_some_and(|c| CourseCategory::ALL.iter().any(|k| k.as_str() == c));
    if !category_ok {
        errors.push("Valid category is required".to_string());
    }

    errors
}
