use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::shorter_than;
use crate::enums::Role;

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern compiles"));

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserForm {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub role: Option<String>,
}

#[must_use]
pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

#[must_use]
pub fn validate_user_data(form: &UserForm) -> Vec<String> {
    let mut errors = Vec::new();
    if shorter_than(form.name.as_deref(), 2) {
        errors.push("Name must be at least 2 characters".to_string());
    }
    if !form.email.as_deref().is_some_and(is_valid_email) {
        errors.push("Valid email is required".to_string());
    }
    if form.password.as_deref().is_none_or(|p| p.chars().count() < 6) {
        errors.push("Password must be at least 6 characters".to_string());
    }
    if form.role.as_deref().is_none_or(|r| r.parse::<Role>().is_err()) {
        errors.push("Valid role is required (admin, trainer, student)".to_string());
    }
    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("john@example.com", true)]
    #[case("a.b+c@mail.co.in", true)]
    #[case("invalid-email", false)]
    #[case("no@tld", false)]
    #[case("spaces in@example.com", false)]
    #[case("", false)]
    fn email_pattern(#[case] email: &str, #[case] ok: bool) {
        assert_eq!(is_valid_email(email), ok);
    }

    #[test]
    fn valid_user_passes() {
        let form = UserForm {
            name: Some("John Doe".into()),
            email: Some("john@example.com".into()),
            password: Some("password123".into()),
            role: Some("student".into()),
        };
        assert!(validate_user_data(&form).is_empty());
    }

    #[test]
    fn invalid_user_reports_all_rules() {
        let form = UserForm {
            name: Some("J".into()),
            email: Some("invalid-email".into()),
            password: Some("123".into()),
            role: Some("invalid_role".into()),
        };
        let errors = validate_user_data(&form);
        assert_eq!(errors.len(), 4);
        assert!(errors.contains(&"Valid role is required (admin, trainer, student)".to_string()));
    }
}
