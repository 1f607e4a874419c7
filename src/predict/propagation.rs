use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::predict::error::PredictError;
use crate::predict::tle_loader::Satellite;
use crate::predict::{Observer, EARTH_ROTATION_RAD_S};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LookAngles {
    pub timestamp: DateTime<Utc>,
    /// Degrees clockwise from north, in [0, 360).
    pub azimuth_deg: f64,
    pub elevation_deg: f64,
    pub range_km: f64,
    pub range_rate_km_s: f64,
}

/// Where the satellite appears from the observer at `timestamp`.
pub fn look_angles(
    observer: &Observer,
    satellite: &Satellite,
    timestamp: DateTime<Utc>,
) -> Result<LookAngles, PredictError> {
    let minutes = satellite
        .elements
        .datetime_to_minutes_since_epoch(&timestamp.naive_utc())
        .map_err(|e| PredictError::Propagation(e.to_string()))?;
    let prediction = satellite.constants.propagate(minutes)?;

    let gmst =
        sgp4::iau_epoch_to_sidereal_time(sgp4::julian_years_since_j2000(&timestamp.naive_utc()));
    let sat_ecef = teme_to_ecef_position(prediction.position, gmst);
    let sat_vel = teme_to_ecef_velocity(prediction.position, prediction.velocity, gmst);

    let sta_ecef = observer.position_ecef_km();
    let sta_vel = observer.velocity_ecef_km_s();
    let dr = [
        sat_ecef[0] - sta_ecef[0],
        sat_ecef[1] - sta_ecef[1],
        sat_ecef[2] - sta_ecef[2],
    ];
    let range_km = norm(dr);
    if range_km <= 0.0 {
        return Err(PredictError::Propagation(
            "satellite coincides with observer".to_string(),
        ));
    }

    let [east, north, up] = observer.to_enu(dr);
    let mut azimuth_deg = east.atan2(north).to_degrees().rem_euclid(360.0);
    if azimuth_deg >= 360.0 {
        azimuth_deg = 0.0;
    }
    let elevation_deg = (up / range_km).clamp(-1.0, 1.0).asin().to_degrees();

    let rel_vel = [
        sat_vel[0] - sta_vel[0],
        sat_vel[1] - sta_vel[1],
        sat_vel[2] - sta_vel[2],
    ];
    let range_rate_km_s = (rel_vel[0] * dr[0] + rel_vel[1] * dr[1] + rel_vel[2] * dr[2]) / range_km;

    Ok(LookAngles {
        timestamp,
        azimuth_deg,
        elevation_deg,
        range_km,
        range_rate_km_s,
    })
}

fn norm(v: [f64; 3]) -> f64 {
    (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt()
}

pub fn teme_to_ecef_position(pos_teme: [f64; 3], gmst: f64) -> [f64; 3] {
    let (sin_gmst, cos_gmst) = gmst.sin_cos();
    [
        pos_teme[0] * cos_gmst + pos_teme[1] * sin_gmst,
        -pos_teme[0] * sin_gmst + pos_teme[1] * cos_gmst,
        pos_teme[2],
    ]
}

pub fn teme_to_ecef_velocity(pos_teme: [f64; 3], vel_teme: [f64; 3], gmst: f64) -> [f64; 3] {
    let pos = teme_to_ecef_position(pos_teme, gmst);
    let rotated = teme_to_ecef_position(vel_teme, gmst);
    [
        rotated[0] + EARTH_ROTATION_RAD_S * pos[1],
        rotated[1] - EARTH_ROTATION_RAD_S * pos[0],
        rotated[2],
    ]
}
