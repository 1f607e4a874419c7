use thiserror::Error;

use super::types::Axis;

#[derive(Debug, Error, PartialEq)]
pub enum PackError {
    #[error("{axis} steps {value} exceed the 4-bit field")]
    StepsOutOfRange { axis: Axis, value: u8 },
    #[error("relative time {0} ms exceeds the 24-bit field")]
    TimeOutOfRange(u32),
}

#[derive(Debug, Error, PartialEq)]
pub enum StepError {
    #[error("{axis} resolution must be a positive number of degrees, got {value}")]
    InvalidResolution { axis: Axis, value: f64 },
    #[error("pass contains no samples")]
    EmptyPass,
    #[error("sample {index}: non-finite value")]
    NonFinite { index: usize },
    #[error("sample {index}: time goes backwards ({previous} -> {current})")]
    NonMonotonicTime {
        index: usize,
        previous: f64,
        current: f64,
    },
    #[error("sample {index}: azimuth {value} outside [0, 360)")]
    AzimuthOutOfRange { index: usize, value: f64 },
    #[error("sample {index}: elevation {value} outside [-90, 90]")]
    ElevationOutOfRange { index: usize, value: f64 },
    #[error("sample {index}: {steps} {axis} steps in one sample, resolution too fine for the sampling rate")]
    StepOverflow { index: usize, axis: Axis, steps: u64 },
    #[error("sample {index}: relative time {time_ms} ms exceeds the 24-bit field")]
    TimeOverflow { index: usize, time_ms: u64 },
    #[error("record {index}: {source}")]
    Pack {
        index: usize,
        #[source]
        source: PackError,
    },
}
