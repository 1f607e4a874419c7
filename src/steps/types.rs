use serde::Serialize;
use strum_macros::Display;

/// Largest step count a single packed record can carry per axis.
pub const MAX_STEPS_PER_SAMPLE: u8 = 15;

/// Exclusive upper bound of the 24-bit relative time field.
pub const MAX_RELATIVE_TIME_MS: u32 = 1 << 24;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Axis {
    Azimuth,
    Elevation,
}

/// One pointing sample of a pass.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AngleSample {
    /// UNIX time in seconds.
    pub time_s: f64,
    pub azimuth_deg: f64,
    pub elevation_deg: f64,
}

impl AngleSample {
    pub fn new(time_s: f64, azimuth_deg: f64, elevation_deg: f64) -> Self {
        Self {
            time_s,
            azimuth_deg,
            elevation_deg,
        }
    }
}

/// Degrees of travel represented by one motor step, per axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Resolution {
    pub azimuth_deg: f64,
    pub elevation_deg: f64,
}

impl Resolution {
    pub fn new(azimuth_deg: f64, elevation_deg: f64) -> Self {
        Self {
            azimuth_deg,
            elevation_deg,
        }
    }

    pub fn of(&self, axis: Axis) -> f64 {
        match axis {
            Axis::Azimuth => self.azimuth_deg,
            Axis::Elevation => self.elevation_deg,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StepCommand {
    pub relative_time_ms: u32,
    pub az_steps: u8,
    pub elev_steps: u8,
}

impl StepCommand {
    pub fn new(relative_time_ms: u32, az_steps: u8, elev_steps: u8) -> Self {
        Self {
            relative_time_ms,
            az_steps,
            elev_steps,
        }
    }

    pub fn is_idle(&self) -> bool {
        self.az_steps == 0 && self.elev_steps == 0
    }
}

/// Metadata the device needs before the first command of a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PassStart {
    pub orbit_start_unix: i64,
    pub point_count: u32,
    /// +1 clockwise, -1 counter-clockwise.
    pub az_dir: i8,
    pub start_az_steps: i64,
    pub start_elev_steps: i64,
    pub elev_dir_change_ms: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepPlan {
    pub start: PassStart,
    pub commands: Vec<StepCommand>,
}

impl StepPlan {
    pub fn total_steps(&self, axis: Axis) -> u64 {
        self.commands
            .iter()
            .map(|c| match axis {
                Axis::Azimuth => c.az_steps as u64,
                Axis::Elevation => c.elev_steps as u64,
            })
            .sum()
    }

    pub fn duration_ms(&self) -> u32 {
        self.commands.last().map(|c| c.relative_time_ms).unwrap_or(0)
    }
}
