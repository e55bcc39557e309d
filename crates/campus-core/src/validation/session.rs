use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{is_blank, shorter_than};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionForm {
    pub title: Option<String>,
    pub batch_id: Option<String>,
    pub trainer_id: Option<String>,
    pub scheduled_date: Option<DateTime<Utc>>,
    /// Minutes.
    pub duration: Option<i64>,
}

#[must_use]
pub fn validate_session_data(form: &SessionForm) -> Vec<String> {
    validate_session_data_at(form, Utc::now())
}

#[must_use]
pub fn validate_session_data_at(form: &SessionForm, now: DateTime<Utc>) -> Vec<String> {
    let mut errors = Vec::new();

    if shorter_than(form.title.as_deref(), 3) {
        errors.push("Session title must be at least 3 characters".to_string());
    }
    if is_blank(form.batch_id.as_deref()) {
        errors.push("Batch ID is required".to_string());
    }
    if is_blank(form.trainer_id.as_deref()) {
        errors.push("Trainer ID is required".to_string());
    }
    if form.scheduled_date.is_none_or(|date| date < now) {
        errors.push("Scheduled date must be in the future".to_string());
    }
    if form.duration.is_none_or(|d| !(30..=180).contains(&d)) {
        errors.push("Duration must be between 30 and 180 minutes".to_string());
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use rstest::rstest;

    fn valid(now: DateTime<Utc>) -> SessionForm {
        SessionForm {
            title: Some("JavaScript Fundamentals".into()),
            batch_id: Some("bat-1".into()),
            trainer_id: Some("usr-trainer1".into()),
            scheduled_date: Some(now + Duration::days(2)),
            duration: Some(90),
        }
    }

    #[test]
    fn valid_session_passes() {
        let now = Utc::now();
        assert!(validate_session_data_at(&valid(now), now).is_empty());
    }

    #[rstest]
    #[case(29, false)]
    #[case(30, true)]
    #[case(180, true)]
    #[case(181, false)]
    fn duration_bounds(#[case] minutes: i64, #[case] ok: bool) {
        let now = Utc::now();
        let form = SessionForm {
            duration: Some(minutes),
            ..valid(now)
        };
        assert_eq!(validate_session_data_at(&form, now).is_empty(), ok);
    }

    #[test]
    fn past_schedule_is_rejected() {
        let now = Utc::now();
        let form = SessionForm {
            scheduled_date: Some(now - Duration::hours(1)),
            ..valid(now)
        };
        assert_eq!(
            validate_session_data_at(&form, now),
            vec!["Scheduled date must be in the future".to_string()]
        );
    }
}
