use log::debug;

use super::error::StepError;
use super::types::{
    AngleSample, Axis, PassStart, Resolution, StepCommand, StepPlan, MAX_RELATIVE_TIME_MS,
    MAX_STEPS_PER_SAMPLE,
};

/// Larger azimuth jumps between consecutive samples are 0/360 crossings.
const WRAP_THRESHOLD_DEG: f64 = 300.0;
/// Absorbs float error so that e.g. 0.15 / 0.05 still yields 3 steps.
const STEP_EPSILON_DEG: f64 = 1e-9;
/// Same idea for the seconds to milliseconds truncation.
const MILLIS_EPSILON: f64 = 1e-3;

/// Carries the fractional travel that did not yet add up to a full step.
#[derive(Debug, Clone, Copy)]
struct AxisAccumulator {
    resolution: f64,
    remainder: f64,
}

impl AxisAccumulator {
    fn new(resolution: f64) -> Self {
        Self {
            resolution,
            remainder: 0.0,
        }
    }

    fn advance(&mut self, delta_deg: f64) -> u64 {
        self.remainder += delta_deg.abs();
        let steps = ((self.remainder + STEP_EPSILON_DEG) / self.resolution).floor();
        self.remainder = (self.remainder - steps * self.resolution).max(0.0);
        steps as u64
    }
}

#[derive(Debug, Clone, Copy)]
struct Retained {
    index: usize,
    time_s: f64,
    az_steps: u8,
    elev_steps: u8,
}

/// State threaded through the single pass over the samples.
#[derive(Debug)]
struct Fold {
    az: AxisAccumulator,
    elev: AxisAccumulator,
    previous: Option<AngleSample>,
    az_dir: Option<i8>,
    dir_change_time_s: Option<f64>,
    retained: Vec<Retained>,
}

impl Fold {
    fn new(resolution: Resolution) -> Self {
        Self {
            az: AxisAccumulator::new(resolution.azimuth_deg),
            elev: AxisAccumulator::new(resolution.elevation_deg),
            previous: None,
            az_dir: None,
            dir_change_time_s: None,
            retained: Vec::new(),
        }
    }

    fn step(mut self, index: usize, sample: &AngleSample) -> Result<Self, StepError> {
        let (d_az, d_elev) = match self.previous {
            Some(prev) => (
                unwrap_azimuth_delta(sample.azimuth_deg - prev.azimuth_deg),
                sample.elevation_deg - prev.elevation_deg,
            ),
            None => (0.0, 0.0),
        };

        if self.az_dir.is_none() && d_az != 0.0 {
            self.az_dir = Some(if d_az > 0.0 { 1 } else { -1 });
        }
        if self.dir_change_time_s.is_none() && d_elev < 0.0 {
            self.dir_change_time_s = Some(sample.time_s);
        }

        let az_steps = checked_steps(index, Axis::Azimuth, self.az.advance(d_az))?;
        let elev_steps = checked_steps(index, Axis::Elevation, self.elev.advance(d_elev))?;

        if az_steps > 0 || elev_steps > 0 {
            self.retained.push(Retained {
                index,
                time_s: sample.time_s,
                az_steps,
                elev_steps,
            });
        }

        self.previous = Some(*sample);
        Ok(self)
    }
}

/// Converts a pass into per-sample step commands plus the start metadata.
pub fn build_plan(samples: &[AngleSample], resolution: Resolution) -> Result<StepPlan, StepError> {
    validate_resolution(resolution)?;
    validate_samples(samples)?;

    let first = samples[0];
    let fold = samples
        .iter()
        .enumerate()
        .try_fold(Fold::new(resolution), |fold, (index, sample)| {
            fold.step(index, sample)
        })?;

    let origin_s = fold.retained.first().map(|r| r.time_s).unwrap_or(first.time_s);
    let commands = fold
        .retained
        .iter()
        .map(|r| {
            let time_ms = to_millis(r.time_s - origin_s);
            if time_ms >= MAX_RELATIVE_TIME_MS as u64 {
                return Err(StepError::TimeOverflow {
                    index: r.index,
                    time_ms,
                });
            }
            Ok(StepCommand::new(time_ms as u32, r.az_steps, r.elev_steps))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let last_ms = commands.last().map(|c| c.relative_time_ms).unwrap_or(0);
    let elev_dir_change_ms = match fold.dir_change_time_s {
        Some(t) if t > origin_s => to_millis(t - origin_s).min(last_ms as u64) as u32,
        Some(_) => 0,
        None => last_ms,
    };

    let start = PassStart {
        orbit_start_unix: first.time_s.trunc() as i64,
        point_count: commands.len() as u32,
        az_dir: fold.az_dir.unwrap_or(1),
        start_az_steps: (normalize_azimuth(first.azimuth_deg) / resolution.azimuth_deg).trunc()
            as i64,
        start_elev_steps: (first.elevation_deg / resolution.elevation_deg).trunc() as i64,
        elev_dir_change_ms,
    };

    debug!(
        "Built step plan: {} of {} samples retained, az_dir {}, elevation reverses at {} ms",
        start.point_count,
        samples.len(),
        start.az_dir,
        start.elev_dir_change_ms
    );

    Ok(StepPlan { start, commands })
}

/// Maps an azimuth in [0, 360) to (-180, 180].
pub fn normalize_azimuth(azimuth_deg: f64) -> f64 {
    if azimuth_deg > 180.0 {
        azimuth_deg - 360.0
    } else if azimuth_deg <= -180.0 {
        azimuth_deg + 360.0
    } else {
        azimuth_deg
    }
}

fn unwrap_azimuth_delta(delta_deg: f64) -> f64 {
    if delta_deg > WRAP_THRESHOLD_DEG {
        delta_deg - 360.0
    } else if delta_deg < -WRAP_THRESHOLD_DEG {
        delta_deg + 360.0
    } else {
        delta_deg
    }
}

fn checked_steps(index: usize, axis: Axis, steps: u64) -> Result<u8, StepError> {
    if steps > MAX_STEPS_PER_SAMPLE as u64 {
        return Err(StepError::StepOverflow { index, axis, steps });
    }
    Ok(steps as u8)
}

fn to_millis(seconds: f64) -> u64 {
    (seconds * 1000.0 + MILLIS_EPSILON).floor() as u64
}

fn validate_resolution(resolution: Resolution) -> Result<(), StepError> {
    for axis in [Axis::Azimuth, Axis::Elevation] {
        let value = resolution.of(axis);
        if !value.is_finite() || value <= 0.0 {
            return Err(StepError::InvalidResolution { axis, value });
        }
    }
    Ok(())
}

fn validate_samples(samples: &[AngleSample]) -> Result<(), StepError> {
    if samples.is_empty() {
        return Err(StepError::EmptyPass);
    }

    let mut previous_time: Option<f64> = None;
    for (index, s) in samples.iter().enumerate() {
        if !(s.time_s.is_finite() && s.azimuth_deg.is_finite() && s.elevation_deg.is_finite()) {
            return Err(StepError::NonFinite { index });
        }
        if let Some(previous) = previous_time {
            if s.time_s < previous {
                return Err(StepError::NonMonotonicTime {
                    index,
                    previous,
                    current: s.time_s,
                });
            }
        }
        if !(0.0..360.0).contains(&s.azimuth_deg) {
            return Err(StepError::AzimuthOutOfRange {
                index,
                value: s.azimuth_deg,
            });
        }
        if !(-90.0..=90.0).contains(&s.elevation_deg) {
            return Err(StepError::ElevationOutOfRange {
                index,
                value: s.elevation_deg,
            });
        }
        previous_time = Some(s.time_s);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accumulator_carries_remainder() {
        let mut acc = AxisAccumulator::new(0.25);
        assert_eq!(acc.advance(0.125), 0);
        assert_eq!(acc.advance(0.125), 1);
        assert_eq!(acc.advance(-0.625), 2);
        assert!((acc.remainder - 0.125).abs() < 1e-12);
    }

    #[test]
    fn accumulator_tolerates_float_error() {
        let mut acc = AxisAccumulator::new(0.05);
        assert_eq!(acc.advance(0.15), 3);
    }

    #[test]
    fn wrap_correction_in_both_directions() {
        assert_eq!(unwrap_azimuth_delta(-358.0), 2.0);
        assert_eq!(unwrap_azimuth_delta(358.0), -2.0);
        assert_eq!(unwrap_azimuth_delta(300.0), 300.0);
        assert_eq!(unwrap_azimuth_delta(-12.5), -12.5);
    }

    #[test]
    fn millis_truncate_sub_millisecond() {
        assert_eq!(to_millis(1.2345), 1234);
        assert_eq!(to_millis(0.4), 400);
        assert_eq!(to_millis(0.0), 0);
    }
}
