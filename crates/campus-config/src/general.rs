//! General application configuration.

use serde::{Deserialize, Serialize};

/// Default page size for paginated listings.
const fn default_page_size() -> u32 {
    10
}

/// Upper bound a client may request with `?limit=`.
const fn default_max_page_size() -> u32 {
    100
}

fn default_timezone() -> String {
    String::from("Asia/Kolkata")
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GeneralConfig {
    /// Page size used when a listing request omits `limit`.
    #[serde(default = "default_page_size")]
    pub default_page_size: u32,

    #[serde(default = "default_max_page_size")]
    pub max_page_size: u32,

    /// Timezone given to new batch meeting schedules.
    #[serde(default = "default_timezone")]
    pub timezone: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            default_page_size: default_page_size(),
            max_page_size: default_max_page_size(),
            timezone: default_timezone(),
        }
    }
}
