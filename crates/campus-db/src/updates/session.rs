//! Class session create and status-change types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use campus_core::enums::{SessionStatus, SessionType};
use campus_core::validation::SessionForm;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewClassSession {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub batch_id: Option<String>,
    /// Defaults to the caller.
    #[serde(default)]
    pub trainer_id: Option<String>,
    #[serde(default)]
    pub scheduled_date: Option<DateTime<Utc>>,
    /// `HH:MM`.
    pub start_time: String,
    /// `HH:MM`.
    pub end_time: String,
    /// Minutes; derived from the start and end time when absent.
    #[serde(default)]
    pub duration: Option<i64>,
    #[serde(default, rename = "type")]
    pub session_type: SessionType,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default = "default_online")]
    pub is_online: bool,
    #[serde(default)]
    pub meeting_url: Option<String>,
}

const fn default_online() -> bool {
    true
}

impl NewClassSession {
    /// The fields checked by `validate_session_data`, with the duration
    /// filled in from the times when it was left out.
    #[must_use]
    pub fn form(&self) -> SessionForm {
        SessionForm {
            title: self.title.clone(),
            batch_id: self.batch_id.clone(),
            trainer_id: self.trainer_id.clone(),
            scheduled_date: self.scheduled_date,
            duration: self.effective_duration(),
        }
    }

    #[must_use]
    pub fn effective_duration(&self) -> Option<i64> {
        self.duration.or_else(|| {
            campus_core::entities::minutes_between(&self.start_time, &self.end_time)
                .map(i64::from)
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStatusChange {
    pub status: SessionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trainer_notes: Option<String>,
}
