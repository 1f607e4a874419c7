mod accumulator;
mod error;
mod packer;
mod types;

pub use accumulator::{build_plan, normalize_azimuth};
pub use error::{PackError, StepError};
pub use packer::{pack, pack_plan, PackedPoint};
pub use types::{
    AngleSample, Axis, PassStart, Resolution, StepCommand, StepPlan, MAX_RELATIVE_TIME_MS,
    MAX_STEPS_PER_SAMPLE,
};
