use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::{AdFrequency, AdType, PublishStatus, Role, TargetAudience};

/// A promotional popup, banner, or badge shown on the homepage.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct HomepageAd {
    pub id: String,
    pub course_id: Option<String>,
    pub ad_type: AdType,
    pub special_note: String,
    pub cta_text: String,
    pub cta_link: String,
    /// Auto-dismiss delay, 1 to 300 seconds.
    pub timer_seconds: Option<u32>,
    pub frequency: AdFrequency,
    pub target_audience: TargetAudience,
    pub target_roles: Vec<Role>,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub status: PublishStatus,
    pub impressions: u64,
    pub clicks: u64,
    pub closes: u64,
    /// 1 to 10, higher first.
    pub priority: u32,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl HomepageAd {
    /// Published and inside its display window.
    #[must_use]
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        self.status == PublishStatus::Published && self.start_date <= now && now <= self.end_date
    }

    /// Audience targeting for a caller; `None` is an anonymous visitor.
    #[must_use]
    pub fn should_show_to(&self, role: Option<Role>) -> bool {
        match self.target_audience {
            TargetAudience::All => true,
            TargetAudience::Guest => role.is_none(),
            TargetAudience::LoggedIn => role.is_some(),
            TargetAudience::RoleBased => role.is_some_and(|r| self.target_roles.contains(&r)),
        }
    }
}
