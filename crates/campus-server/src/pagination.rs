//! `page` / `limit` query parameters.

use serde::Deserialize;

use campus_config::GeneralConfig;

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl PageQuery {
    /// Resolve to `(page, limit)`. Page is at least 1; limit falls back to the
    /// configured default and is clamped to `1..=max_page_size`.
    #[must_use]
    pub fn resolve(self, general: &GeneralConfig) -> (u32, u32) {
        let page = self.page.unwrap_or(1).max(1);
        let limit = self
            .limit
            .unwrap_or(general.default_page_size)
            .clamp(1, general.max_page_size.max(1));
        (page, limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn general() -> GeneralConfig {
        GeneralConfig {
            default_page_size: 10,
            max_page_size: 100,
            ..GeneralConfig::default()
        }
    }

    #[test]
    fn defaults_and_bounds() {
        assert_eq!(PageQuery::default().resolve(&general()), (1, 10));
        let q = PageQuery {
            page: Some(0),
            limit: Some(1_000),
        };
        assert_eq!(q.resolve(&general()), (1, 100));
        let q = PageQuery {
            page: Some(3),
            limit: Some(0),
        };
        assert_eq!(q.resolve(&general()), (3, 1));
    }
}
