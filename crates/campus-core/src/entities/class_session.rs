use chrono::{DateTime, NaiveTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::{SessionStatus, SessionType};

/// A scheduled class of one batch.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ClassSession {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub batch_id: String,
    pub trainer_id: String,
    pub scheduled_date: DateTime<Utc>,
    /// `HH:MM`.
    pub start_time: String,
    /// `HH:MM`.
    pub end_time: String,
    /// Minutes.
    pub duration: u32,
    #[serde(rename = "type")]
    pub session_type: SessionType,
    pub location: Option<String>,
    pub is_online: bool,
    pub meeting_url: Option<String>,
    pub status: SessionStatus,
    pub trainer_notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ClassSession {
    /// Length implied by start and end time, if both parse and end is later.
    #[must_use]
    pub fn duration_from_times(&self) -> Option<u32> {
        minutes_between(&self.start_time, &self.end_time)
    }
}

/// Minutes from `start` to `end`, both `HH:MM`. `None` if either fails to
/// parse or `end` is not after `start`.
#[must_use]
pub fn minutes_between(start: &str, end: &str) -> Option<u32> {
    let start = NaiveTime::parse_from_str(start, "%H:%M").ok()?;
    let end = NaiveTime::parse_from_str(end, "%H:%M").ok()?;
    let minutes = (end - start).num_minutes();
    u32::try_from(minutes).ok().filter(|m| *m > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minutes_between_valid_times() {
        assert_eq!(minutes_between("18:00", "19:30"), Some(90));
        assert_eq!(minutes_between("09:15", "09:45"), Some(30));
    }

    #[test]
    fn minutes_between_rejects_reversed_or_malformed() {
        assert_eq!(minutes_between("19:30", "18:00"), None);
        assert_eq!(minutes_between("10:00", "10:00"), None);
        assert_eq!(minutes_between("6pm", "19:00"), None);
    }
}
