//! Feature derivation
//!
//! Turns one [`SessionInput`] into the [`FeatureRecord`] the model was trained
//! on. Derivation is pure and never fails:
//!
//! - **Date**: `visit_month` (1–12) and `day_of_week` (Monday=0 … Sunday=6),
//!   both 0 when the date does not parse
//! - **Weekend**: `is_weekend` is 1 for day indices 5 and 6
//! - **Screen**: `screen_width`/`screen_height` from `"<w>x<h>"`, 0 per bad side
//! - **Social**: `is_social` is 1 when `utm_source` is on the allow-list
//!
//! An unparseable date yields the same derived values as a Monday in "month
//! 0". That collision is kept as is; scores on malformed dates depend on it.

mod parse;
mod record;

pub use parse::{parse_screen_resolution, parse_visit_date};
pub use record::{FeatureRecord, FeatureValue};

use chrono::Datelike;
use serde::{Deserialize, Serialize};

use crate::session::SessionInput;

pub const SESSION_ID: &str = "session_id";
pub const VISIT_DATE: &str = "visit_date";
pub const VISIT_NUMBER: &str = "visit_number";
pub const UTM_SOURCE: &str = "utm_source";
pub const UTM_MEDIUM: &str = "utm_medium";
pub const UTM_CAMPAIGN: &str = "utm_campaign";
pub const UTM_ADCONTENT: &str = "utm_adcontent";
pub const UTM_KEYWORD: &str = "utm_keyword";
pub const DEVICE_CATEGORY: &str = "device_category";
pub const DEVICE_BRAND: &str = "device_brand";
pub const DEVICE_SCREEN_RESOLUTION: &str = "device_screen_resolution";
pub const DEVICE_BROWSER: &str = "device_browser";
pub const GEO_COUNTRY: &str = "geo_country";
pub const GEO_CITY: &str = "geo_city";
pub const VISIT_MONTH: &str = "visit_month";
pub const DAY_OF_WEEK: &str = "day_of_week";
pub const IS_WEEKEND: &str = "is_weekend";
pub const SCREEN_WIDTH: &str = "screen_width";
pub const SCREEN_HEIGHT: &str = "screen_height";
pub const IS_SOCIAL: &str = "is_social";

/// utm_source values counted as social-network traffic at training time
pub const DEFAULT_SOCIAL_SOURCES: [&str; 6] = [
    "QxAxdyPLuQMEcrdZWdWb",
    "MvfHsxITijuriZxsqZqt",
    "ISrKoXQCxqqYvAZICvjs",
    "IZEXUFLARCUMynmHNBGo",
    "PlbkrSYoHuZBWfYjYnfw",
    "gVRrcxiDQubJiljoTbGm",
];

/// Derivation settings shipped with the model bundle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureConfig {
    /// Exact utm_source values that set `is_social`
    #[serde(default = "default_social_sources")]
    pub social_sources: Vec<String>,
}

fn default_social_sources() -> Vec<String> {
    DEFAULT_SOCIAL_SOURCES.iter().map(|s| s.to_string()).collect()
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            social_sources: default_social_sources(),
        }
    }
}

impl FeatureConfig {
    /// Case-sensitive, untrimmed membership test
    pub fn is_social(&self, utm_source: &str) -> bool {
        self.social_sources.iter().any(|s| s == utm_source)
    }
}

/// Calendar features of a visit date
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DateFeatures {
    pub visit_month: u32,
    pub day_of_week: u32,
    pub is_weekend: u32,
}

impl DateFeatures {
    pub fn from_raw(raw: &str) -> Self {
        match parse_visit_date(raw) {
            Some(date) => {
                let day_of_week = date.weekday().num_days_from_monday();
                Self {
                    visit_month: date.month(),
                    day_of_week,
                    is_weekend: u32::from(day_of_week >= 5),
                }
            }
            None => Self::default(),
        }
    }
}

/// Build the full feature record for a session
pub fn derive_features(input: &SessionInput, config: &FeatureConfig) -> FeatureRecord {
    let mut record = FeatureRecord::new();

    record.insert(SESSION_ID, input.session_id.as_str());
    record.insert(
        VISIT_DATE,
        parse_visit_date(&input.visit_date)
            .map(|d| d.format("%Y-%m-%d").to_string())
            .as_deref(),
    );
    record.insert(VISIT_NUMBER, input.visit_number);
    record.insert(UTM_SOURCE, input.utm_source.as_str());
    record.insert(UTM_MEDIUM, input.utm_medium.as_str());
    record.insert(UTM_CAMPAIGN, input.utm_campaign.as_str());
    record.insert(UTM_ADCONTENT, input.utm_adcontent.as_deref());
    record.insert(UTM_KEYWORD, input.utm_keyword.as_deref());
    record.insert(DEVICE_CATEGORY, input.device_category.as_str());
    record.insert(DEVICE_BRAND, input.device_brand.as_str());
    record.insert(
        DEVICE_SCREEN_RESOLUTION,
        input.device_screen_resolution.as_str(),
    );
    record.insert(DEVICE_BROWSER, input.device_browser.as_str());
    record.insert(GEO_COUNTRY, input.geo_country.as_str());
    record.insert(GEO_CITY, input.geo_city.as_str());

    let date = DateFeatures::from_raw(&input.visit_date);
    record.insert(VISIT_MONTH, date.visit_month);
    record.insert(DAY_OF_WEEK, date.day_of_week);
    record.insert(IS_WEEKEND, date.is_weekend);

    let (width, height) = parse_screen_resolution(&input.device_screen_resolution);
    record.insert(SCREEN_WIDTH, width);
    record.insert(SCREEN_HEIGHT, height);

    record.insert(IS_SOCIAL, u32::from(config.is_social(&input.utm_source)));

    record
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::tests::sample_session;

    #[test]
    fn test_reference_session() {
        let record = derive_features(&sample_session(), &FeatureConfig::default());

        assert_eq!(record.numeric(VISIT_MONTH), Some(5.0));
        assert_eq!(record.numeric(DAY_OF_WEEK), Some(5.0));
        assert_eq!(record.numeric(IS_WEEKEND), Some(1.0));
        assert_eq!(record.numeric(SCREEN_WIDTH), Some(375.0));
        assert_eq!(record.numeric(SCREEN_HEIGHT), Some(667.0));
        assert_eq!(record.numeric(IS_SOCIAL), Some(1.0));
        assert_eq!(record.numeric(VISIT_NUMBER), Some(1.0));
        assert_eq!(record.category(SESSION_ID), Some("s1"));
        assert_eq!(record.category(VISIT_DATE), Some("2023-05-13"));
        assert_eq!(record.get(UTM_ADCONTENT), Some(&FeatureValue::Missing));
        assert_eq!(record.get(UTM_KEYWORD), Some(&FeatureValue::Missing));
        assert_eq!(record.len(), 20);
    }

    #[test]
    fn test_text_fields_are_categorical() {
        let mut input = sample_session();
        input.utm_keyword = Some("tires".to_string());
        let record = derive_features(&input, &FeatureConfig::default());

        for name in [
            SESSION_ID,
            UTM_SOURCE,
            UTM_MEDIUM,
            UTM_CAMPAIGN,
            UTM_KEYWORD,
            DEVICE_CATEGORY,
            DEVICE_BRAND,
            DEVICE_SCREEN_RESOLUTION,
            DEVICE_BROWSER,
            GEO_COUNTRY,
            GEO_CITY,
        ] {
            assert!(
                matches!(record.get(name), Some(FeatureValue::Categorical(_))),
                "{name} should be categorical"
            );
        }
    }

    #[test]
    fn test_weekend_over_one_week() {
        // 2023-05-08 is a Monday
        for day in 8..=14 {
            let date = DateFeatures::from_raw(&format!("2023-05-{day:02}"));
            let index = day - 8;
            assert_eq!(date.day_of_week, index);
            assert_eq!(date.is_weekend, u32::from(index == 5 || index == 6));
        }
    }

    #[test]
    fn test_unparseable_date_defaults() {
        let mut input = sample_session();
        input.visit_date = "someday".to_string();
        let record = derive_features(&input, &FeatureConfig::default());

        assert_eq!(record.numeric(VISIT_MONTH), Some(0.0));
        assert_eq!(record.numeric(DAY_OF_WEEK), Some(0.0));
        assert_eq!(record.numeric(IS_WEEKEND), Some(0.0));
        assert_eq!(record.get(VISIT_DATE), Some(&FeatureValue::Missing));
    }

    #[test]
    fn test_social_allow_list_is_exact() {
        let config = FeatureConfig::default();
        for source in DEFAULT_SOCIAL_SOURCES {
            assert!(config.is_social(source));
        }

        assert!(!config.is_social("qxaxdypluqmecrdzwdwb"));
        assert!(!config.is_social("QxAxdyPLuQ"));
        assert!(!config.is_social(" QxAxdyPLuQMEcrdZWdWb"));
        assert!(!config.is_social("ZpYIoDJMcFzVoPFsHGJL"));
        assert!(!config.is_social(""));
    }

    #[test]
    fn test_custom_social_sources() {
        let config = FeatureConfig {
            social_sources: vec!["vk".to_string()],
        };
        let mut input = sample_session();
        assert_eq!(
            derive_features(&input, &config).numeric(IS_SOCIAL),
            Some(0.0)
        );

        input.utm_source = "vk".to_string();
        assert_eq!(
            derive_features(&input, &config).numeric(IS_SOCIAL),
            Some(1.0)
        );
    }

    #[test]
    fn test_config_defaults_when_field_absent() {
        let config: FeatureConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, FeatureConfig::default());
        assert_eq!(config.social_sources.len(), 6);
    }

    #[test]
    fn test_derivation_is_deterministic() {
        let config = FeatureConfig::default();
        let input = sample_session();
        assert_eq!(
            derive_features(&input, &config),
            derive_features(&input, &config)
        );
    }
}
