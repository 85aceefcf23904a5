//! # Configuration State
//!
//! The loaded [`AppConfig`], read-only after startup, so no mutex.

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};

use crate::config::AppConfig;

#[derive(Debug, Clone, Default)]
pub struct ConfigState {
    config: AppConfig,
}

impl ConfigState {
    pub fn new(config: AppConfig) -> Self {
        ConfigState { config }
    }

    pub fn inner(&self) -> &AppConfig {
        &self.config
    }

    pub fn store_name(&self) -> &str {
        &self.config.store.name
    }

    pub fn offset(&self) -> FixedOffset {
        self.config.store_offset()
    }

    /// The shop-local calendar date at `now`.
    pub fn local_date(&self, now: DateTime<Utc>) -> NaiveDate {
        now.with_timezone(&self.offset()).date_naive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_local_date_uses_store_offset() {
        // 20:00 UTC is already the next day in WIB (UTC+7)
        let now = Utc.with_ymd_and_hms(2024, 1, 15, 20, 0, 0).unwrap();

        let wib = ConfigState::default();
        assert_eq!(
            wib.local_date(now),
            NaiveDate::from_ymd_opt(2024, 1, 16).unwrap()
        );

        let mut config = AppConfig::default();
        config.store.utc_offset_minutes = 0;
        let utc = ConfigState::new(config);
        assert_eq!(
            utc.local_date(now),
            NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()
        );
    }
}
