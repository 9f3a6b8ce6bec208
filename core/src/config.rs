//! Analytics configuration: time-zone offsets, the repayment window and the
//! province abbreviation table.
//!
//! Loaded from `<data_dir>/config/analytics.json`.
//! In tests, use AnalyticsConfig::default().

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TimeZoneOffset {
    /// Abbreviation as it appears in `repayments.TimeZone` (matched
    /// case-insensitively after trimming).
    pub abbreviation: String,
    /// Fixed offset from UTC in minutes. No daylight saving.
    pub offset_minutes: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProvinceAbbreviation {
    pub full_name: String,
    pub abbreviation: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RepaymentWindow {
    /// Inclusive lower bound, "HH:MM:SS".
    pub start: String,
    /// Exclusive upper bound, "HH:MM:SS".
    pub end: String,
}

impl RepaymentWindow {
    pub fn bounds(&self) -> anyhow::Result<(NaiveTime, NaiveTime)> {
        let start = NaiveTime::parse_from_str(&self.start, "%H:%M:%S")
            .map_err(|e| anyhow::anyhow!("Bad window start '{}': {e}", self.start))?;
        let end = NaiveTime::parse_from_str(&self.end, "%H:%M:%S")
            .map_err(|e| anyhow::anyhow!("Bad window end '{}': {e}", self.end))?;
        if start >= end {
            anyhow::bail!("Repayment window is empty: {} >= {}", self.start, self.end);
        }
        Ok((start, end))
    }

    /// Bounds as zero-padded "HH:MM:SS", the only form SQLite's TIME()
    /// compares correctly as text. Unparseable bounds pass through.
    pub fn canonical(&self) -> (String, String) {
        let pad = |raw: &str| {
            NaiveTime::parse_from_str(raw, "%H:%M:%S")
                .map(|t| t.format("%H:%M:%S").to_string())
                .unwrap_or_else(|_| raw.to_string())
        };
        (pad(&self.start), pad(&self.end))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnalyticsConfig {
    /// Label only; London is modelled as a fixed offset.
    pub reference_zone: String,
    pub reference_offset_minutes: i32,
    pub time_zones: Vec<TimeZoneOffset>,
    pub repayment_window: RepaymentWindow,
    pub provinces: Vec<ProvinceAbbreviation>,
}

impl AnalyticsConfig {
    /// Load from the data/ directory.
    pub fn load(data_dir: &str) -> anyhow::Result<Self> {
        let path = format!("{data_dir}/config/analytics.json");
        let content = std::fs::read_to_string(&path)
            .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
        let config: AnalyticsConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        self.repayment_window.bounds()?;
        let mut seen = std::collections::HashSet::new();
        for tz in &self.time_zones {
            let abbr = &tz.abbreviation;
            if abbr.is_empty() || !abbr.chars().all(|c| c.is_ascii_alphanumeric()) {
                anyhow::bail!("Time zone abbreviation '{abbr}' must be alphanumeric");
            }
            if !seen.insert(abbr.to_ascii_uppercase()) {
                anyhow::bail!("Time zone abbreviation '{abbr}' listed twice");
            }
            if tz.offset_minutes.abs() > 14 * 60 {
                anyhow::bail!("Offset for '{abbr}' out of range: {}", tz.offset_minutes);
            }
        }
        for p in &self.provinces {
            if p.full_name.contains('\'') || p.abbreviation.contains('\'') {
                anyhow::bail!("Province names may not contain quotes: {}", p.full_name);
            }
        }
        Ok(())
    }

    /// Offset in minutes for a raw `TimeZone` tag. Unknown tags are treated
    /// as already being in reference time.
    pub fn offset_for(&self, tag: &str) -> i32 {
        // TRIM() in SQLite strips spaces only.
        let tag = tag.trim_matches(' ');
        self.time_zones
            .iter()
            .find(|tz| tz.abbreviation.trim_matches(' ').eq_ignore_ascii_case(tag))
            .map(|tz| tz.offset_minutes)
            .unwrap_or(self.reference_offset_minutes)
    }
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        let tz = |abbreviation: &str, offset_minutes: i32| TimeZoneOffset {
            abbreviation: abbreviation.into(),
            offset_minutes,
        };
        let province = |full_name: &str, abbreviation: &str| ProvinceAbbreviation {
            full_name: full_name.into(),
            abbreviation: abbreviation.into(),
        };
        Self {
            reference_zone: "Europe/London".into(),
            reference_offset_minutes: 0,
            time_zones: vec![
                tz("UTC", 0),
                tz("GMT", 0),
                tz("BST", 60),
                tz("CET", 60),
                tz("CEST", 120),
                tz("EET", 120),
                tz("SAST", 120),
                tz("MSK", 180),
                tz("IST", 330),
                tz("SGT", 480),
                tz("JST", 540),
                tz("AEST", 600),
                tz("EST", -300),
                tz("EDT", -240),
                tz("CST", -360),
                tz("CDT", -300),
                tz("MST", -420),
                tz("PST", -480),
                tz("PDT", -420),
            ],
            repayment_window: RepaymentWindow {
                start: "06:00:00".into(),
                end: "18:00:00".into(),
            },
            provinces: vec![
                province("WesternCape", "WC"),
                province("Gauteng", "GT"),
                province("KwaZulu-Natal", "KZN"),
                province("EasternCape", "EC"),
                province("FreeState", "FS"),
                province("Limpopo", "LP"),
                province("NorthWest", "NW"),
                province("NorthernCape", "NC"),
                province("Mpumalanga", "MP"),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        AnalyticsConfig::default().validate().unwrap();
    }

    #[test]
    fn offset_lookup_ignores_case_and_padding() {
        let config = AnalyticsConfig::default();
        assert_eq!(config.offset_for(" pst "), -480);
        assert_eq!(config.offset_for("SAST"), 120);
        assert_eq!(config.offset_for("XYZ"), 0, "unknown tags fall back to reference");
    }

    #[test]
    fn padded_or_repeated_abbreviations_are_rejected() {
        let mut config = AnalyticsConfig::default();
        config.time_zones[0].abbreviation = " PST".into();
        assert!(config.validate().is_err());

        let mut config = AnalyticsConfig::default();
        config.time_zones[0].abbreviation = "pst".into();
        assert!(config.validate().is_err(), "case-insensitive duplicate of PST");
    }

    #[test]
    fn offset_lookup_trims_both_sides() {
        let mut config = AnalyticsConfig::default();
        config.time_zones.retain(|tz| tz.abbreviation != "PST");
        config.time_zones.push(TimeZoneOffset {
            abbreviation: " PST ".into(),
            offset_minutes: -480,
        });
        assert_eq!(config.offset_for("PST"), -480);
    }

    #[test]
    fn window_bounds_are_zero_padded() {
        let window = RepaymentWindow {
            start: "6:00:00".into(),
            end: "18:00:00".into(),
        };
        assert_eq!(window.canonical(), ("06:00:00".to_string(), "18:00:00".to_string()));
    }

    #[test]
    fn empty_window_is_rejected() {
        let mut config = AnalyticsConfig::default();
        config.repayment_window.start = "18:00:00".into();
        assert!(config.validate().is_err());
    }
}
