//! Homepage ad create and update types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use campus_core::enums::{AdFrequency, AdType, PublishStatus, Role, TargetAudience};

use super::double_option;

const fn default_priority() -> u32 {
    5
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewHomepageAd {
    #[serde(default)]
    pub course_id: Option<String>,
    pub ad_type: AdType,
    #[serde(default)]
    pub special_note: String,
    #[serde(default)]
    pub cta_text: String,
    #[serde(default)]
    pub cta_link: String,
    #[serde(default)]
    pub timer_seconds: Option<u32>,
    #[serde(default)]
    pub frequency: AdFrequency,
    #[serde(default)]
    pub target_audience: TargetAudience,
    #[serde(default)]
    pub target_roles: Vec<Role>,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    #[serde(default)]
    pub status: PublishStatus,
    #[serde(default = "default_priority")]
    pub priority: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HomepageAdUpdate {
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub course_id: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ad_type: Option<AdType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub special_note: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cta_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cta_link: Option<String>,
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub timer_seconds: Option<Option<u32>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frequency: Option<AdFrequency>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_audience: Option<TargetAudience>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_roles: Option<Vec<Role>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<PublishStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<u32>,
}
