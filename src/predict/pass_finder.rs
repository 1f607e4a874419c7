use chrono::{DateTime, Duration, Utc};

use crate::predict::error::PredictError;
use crate::predict::tle_loader::Satellite;
use crate::predict::types::Pass;
use crate::predict::{look_angles, Observer};
use crate::steps::AngleSample;

const COARSE_STEP_SECONDS: i64 = 60;
const FINE_STEP_SECONDS: i64 = 1;
/// How far past the search window a pass that already rose may run.
const MAX_PASS_OVERRUN: Duration = Duration::hours(6);

/// First pass that rises above `min_elevation_deg` after `from`.
/// A pass already in progress at `from` is skipped since its start was missed.
pub fn next_pass(
    observer: &Observer,
    satellite: &Satellite,
    from: DateTime<Utc>,
    window: std::time::Duration,
    min_elevation_deg: f64,
) -> Result<Pass, PredictError> {
    let end = from + to_chrono(window)?;
    let coarse_step = Duration::seconds(COARSE_STEP_SECONDS);

    let mut cursor = from;
    let mut prev_visible =
        look_angles(observer, satellite, cursor)?.elevation_deg >= min_elevation_deg;
    let mut rise: Option<(DateTime<Utc>, f64)> = None;
    let mut culmination = (from, f64::MIN);

    while cursor <= end || (rise.is_some() && cursor <= end + MAX_PASS_OVERRUN) {
        cursor += coarse_step;
        let angles = look_angles(observer, satellite, cursor)?;
        let visible = angles.elevation_deg >= min_elevation_deg;

        match (prev_visible, visible, rise) {
            (false, true, None) => {
                let (t, az) = refine_crossing(
                    observer,
                    satellite,
                    cursor - coarse_step,
                    cursor,
                    true,
                    min_elevation_deg,
                )?;
                rise = Some((t, az));
                culmination = (cursor, angles.elevation_deg);
            }
            (true, true, Some(_)) if angles.elevation_deg > culmination.1 => {
                culmination = (cursor, angles.elevation_deg);
            }
            (true, false, Some((rise_time, rise_az))) => {
                let (set_time, set_az) = refine_crossing(
                    observer,
                    satellite,
                    cursor - coarse_step,
                    cursor,
                    false,
                    min_elevation_deg,
                )?;
                log::debug!(
                    "{}: pass from {} to {}, max elevation {:.1}",
                    satellite.name,
                    rise_time,
                    set_time,
                    culmination.1
                );
                return Ok(Pass {
                    satellite: satellite.name.clone(),
                    norad_id: satellite.norad_id,
                    rise: rise_time,
                    set: set_time,
                    culmination: culmination.0,
                    max_elevation_deg: culmination.1,
                    rise_azimuth_deg: rise_az,
                    set_azimuth_deg: set_az,
                    duration_seconds: (set_time - rise_time).num_seconds(),
                });
            }
            _ => {}
        }

        prev_visible = visible;
    }

    Err(PredictError::NoPass {
        min_elevation_deg,
        window: humantime::format_duration(window).to_string(),
    })
}

/// Samples the pass from rise up to, but excluding, set.
pub fn sample_pass(
    observer: &Observer,
    satellite: &Satellite,
    pass: &Pass,
    interval: std::time::Duration,
) -> Result<Vec<AngleSample>, PredictError> {
    let step = to_chrono(interval)?;
    if step <= Duration::zero() {
        return Err(PredictError::InvalidDuration(
            "sample interval must be positive".to_string(),
        ));
    }

    let mut samples = Vec::new();
    let mut cursor = pass.rise;
    while cursor < pass.set {
        let angles = look_angles(observer, satellite, cursor)?;
        samples.push(AngleSample::new(
            cursor.timestamp_millis() as f64 / 1000.0,
            angles.azimuth_deg,
            angles.elevation_deg,
        ));
        cursor += step;
    }

    log::info!(
        "Sampled {} points for {} every {}",
        samples.len(),
        satellite.name,
        humantime::format_duration(interval)
    );
    Ok(samples)
}

/// Bisects the crossing of `min_elevation_deg` down to one second.
fn refine_crossing(
    observer: &Observer,
    satellite: &Satellite,
    before: DateTime<Utc>,
    after: DateTime<Utc>,
    rising: bool,
    min_elevation_deg: f64,
) -> Result<(DateTime<Utc>, f64), PredictError> {
    let mut low = before;
    let mut high = after;

    while (high - low).num_seconds() > FINE_STEP_SECONDS {
        let mid = low + (high - low) / 2;
        let above = look_angles(observer, satellite, mid)?.elevation_deg >= min_elevation_deg;
        if above == rising {
            high = mid;
        } else {
            low = mid;
        }
    }

    let crossing = look_angles(observer, satellite, high)?;
    Ok((high, crossing.azimuth_deg))
}

fn to_chrono(duration: std::time::Duration) -> Result<Duration, PredictError> {
    Duration::from_std(duration).map_err(|e| PredictError::InvalidDuration(e.to_string()))
}
