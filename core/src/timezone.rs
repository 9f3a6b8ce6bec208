//! Fixed-offset conversion of repayment timestamps to reference time.
//!
//! London is modelled as GMT all year. Daylight saving is not applied,
//! for the reference zone or for the source abbreviations.

use crate::{
    config::AnalyticsConfig,
    error::{LoanError, LoanResult},
};
use chrono::{Duration, NaiveDateTime, NaiveTime, Timelike};

const TIMESTAMP_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
];

pub fn parse_repayment_date(value: &str) -> LoanResult<NaiveDateTime> {
    let value = value.trim();
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .ok_or_else(|| LoanError::InvalidTimestamp {
            value: value.to_string(),
        })
}

pub struct ReferenceClock<'a> {
    config: &'a AnalyticsConfig,
    window_start: NaiveTime,
    window_end: NaiveTime,
}

impl<'a> ReferenceClock<'a> {
    pub fn new(config: &'a AnalyticsConfig) -> LoanResult<Self> {
        let (window_start, window_end) = config.repayment_window.bounds()?;
        Ok(Self {
            config,
            window_start,
            window_end,
        })
    }

    /// Convert a local timestamp tagged with `tag` to reference time.
    pub fn to_reference(&self, local: &str, tag: &str) -> LoanResult<NaiveDateTime> {
        let local = parse_repayment_date(local)?;
        let shift = self.config.reference_offset_minutes - self.config.offset_for(tag);
        Ok(local + Duration::minutes(i64::from(shift)))
    }

    /// Half-open window check on whole seconds, as SQLite's TIME() sees it.
    pub fn in_window(&self, at: NaiveDateTime) -> bool {
        let t = at.time().with_nanosecond(0).unwrap_or(at.time());
        t >= self.window_start && t < self.window_end
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;

    #[test]
    fn pacific_morning_lands_in_london_afternoon() {
        let config = AnalyticsConfig::default();
        let clock = ReferenceClock::new(&config).unwrap();
        let t = clock.to_reference("2023-03-14 07:15:00", "PST").unwrap();
        assert_eq!(t.to_string(), "2023-03-14 15:15:00");
        assert!(clock.in_window(t));
    }

    #[test]
    fn conversion_can_cross_into_next_month() {
        let config = AnalyticsConfig::default();
        let clock = ReferenceClock::new(&config).unwrap();
        let t = clock.to_reference("2023-01-31 20:00:00", "EST").unwrap();
        assert_eq!(t.month(), 2);
        assert_eq!(t.hour(), 1);
    }

    #[test]
    fn window_is_half_open() {
        let config = AnalyticsConfig::default();
        let clock = ReferenceClock::new(&config).unwrap();
        let at = |s: &str| parse_repayment_date(s).unwrap();
        assert!(clock.in_window(at("2023-05-01 06:00:00")));
        assert!(clock.in_window(at("2023-05-01 17:59:59.900")));
        assert!(!clock.in_window(at("2023-05-01 18:00:00")));
        assert!(!clock.in_window(at("2023-05-01 05:59:59")));
    }

    #[test]
    fn rejects_garbage_timestamps() {
        assert!(matches!(
            parse_repayment_date("yesterday"),
            Err(LoanError::InvalidTimestamp { .. })
        ));
    }
}
