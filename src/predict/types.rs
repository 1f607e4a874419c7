use chrono::{DateTime, Utc};
use serde::Serialize;

/// A predicted pass above the configured minimum elevation.
#[derive(Debug, Clone, Serialize)]
pub struct Pass {
    pub satellite: String,
    pub norad_id: u64,
    pub rise: DateTime<Utc>,
    pub set: DateTime<Utc>,
    pub culmination: DateTime<Utc>,
    pub max_elevation_deg: f64,
    pub rise_azimuth_deg: f64,
    pub set_azimuth_deg: f64,
    pub duration_seconds: i64,
}
