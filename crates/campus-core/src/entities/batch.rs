use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::{BatchStatus, BatchType, Weekday};

pub const DEFAULT_TIMEZONE: &str = "Asia/Kolkata";

fn default_timezone() -> String {
    DEFAULT_TIMEZONE.to_string()
}

/// Weekly meeting pattern of a batch.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MeetingSchedule {
    #[serde(default)]
    pub days: Vec<Weekday>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    #[serde(default = "default_timezone")]
    pub timezone: String,
}

impl Default for MeetingSchedule {
    fn default() -> Self {
        Self {
            days: Vec::new(),
            start_time: None,
            end_time: None,
            timezone: default_timezone(),
        }
    }
}

/// A cohort of one course with its own trainer, dates, and seat limit.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Batch {
    pub id: String,
    pub name: String,
    pub course_id: String,
    pub trainer_id: Option<String>,
    pub batch_number: u32,
    pub batch_type: BatchType,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub max_students: u32,
    pub current_students: u32,
    /// Months.
    pub duration: u32,
    pub status: BatchStatus,
    pub is_leftover: bool,
    pub merged_from: Vec<String>,
    pub meeting_schedule: MeetingSchedule,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Batch {
    #[must_use]
    pub const fn available_slots(&self) -> u32 {
        self.max_students.saturating_sub(self.current_students)
    }

    #[must_use]
    pub const fn is_full(&self) -> bool {
        self.current_students >= self.max_students
    }

    /// Seats taken, as a rounded percentage of the limit.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn capacity_percentage(&self) -> u32 {
        if self.max_students == 0 {
            return 0;
        }
        (f64::from(self.current_students) * 100.0 / f64::from(self.max_students)).round() as u32
    }

    #[must_use]
    pub fn label(&self) -> String {
        format!("{} Batch {}", self.batch_type.title(), self.batch_number)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn batch(current: u32, max: u32) -> Batch {
        let now = Utc::now();
        Batch {
            id: "bat-00000001".into(),
            name: "Regular Batch 2".into(),
            course_id: "crs-00000001".into(),
            trainer_id: None,
            batch_number: 2,
            batch_type: BatchType::Regular,
            start_date: None,
            end_date: None,
            max_students: max,
            current_students: current,
            duration: 3,
            status: BatchStatus::Upcoming,
            is_leftover: false,
            merged_from: Vec::new(),
            meeting_schedule: MeetingSchedule::default(),
            notes: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn seat_arithmetic() {
        let b = batch(7, 10);
        assert_eq!(b.available_slots(), 3);
        assert!(!b.is_full());
        assert_eq!(b.capacity_percentage(), 70);

        let full = batch(10, 10);
        assert!(full.is_full());
        assert_eq!(full.available_slots(), 0);
    }

    #[test]
    fn capacity_percentage_rounds_and_handles_zero_limit() {
        assert_eq!(batch(1, 3).capacity_percentage(), 33);
        assert_eq!(batch(2, 3).capacity_percentage(), 67);
        assert_eq!(batch(0, 0).capacity_percentage(), 0);
    }

    #[test]
    fn label_uses_type_title() {
        assert_eq!(batch(0, 10).label(), "Regular Batch 2");
    }

    #[test]
    fn schedule_timezone_defaults_when_missing() {
        let schedule: MeetingSchedule =
            serde_json::from_str(r#"{"days":["monday","thursday"],"startTime":"18:00"}"#).unwrap();
        assert_eq!(schedule.timezone, "Asia/Kolkata");
        assert_eq!(schedule.days, vec![Weekday::Monday, Weekday::Thursday]);
        assert_eq!(schedule.end_time, None);
    }
}
