//! Session input and prediction output
//!
//! A [`SessionInput`] describes one recorded web visit: attribution (UTM)
//! parameters, device descriptors and geo descriptors. It is built from the
//! incoming request, consumed once by the predictor and then dropped.

use serde::{Deserialize, Serialize};

/// One web-visit session as submitted for scoring
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionInput {
    /// Opaque identifier, echoed back in the prediction
    pub session_id: String,
    /// Visit date, expected `YYYY-MM-DD`; unparseable values degrade to defaults
    pub visit_date: String,
    /// Sequence number of this visit for the client
    pub visit_number: i64,
    pub utm_source: String,
    pub utm_medium: String,
    pub utm_campaign: String,
    #[serde(default)]
    pub utm_adcontent: Option<String>,
    #[serde(default)]
    pub utm_keyword: Option<String>,
    pub device_category: String,
    pub device_brand: String,
    /// Expected `<width>x<height>`
    pub device_screen_resolution: String,
    pub device_browser: String,
    pub geo_country: String,
    pub geo_city: String,
}

/// Scoring result for one session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prediction {
    pub session_id: String,
    pub prediction: i64,
}
