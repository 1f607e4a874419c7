use serde::Serialize;

use super::error::{PackError, StepError};
use super::types::{Axis, StepCommand, StepPlan, MAX_RELATIVE_TIME_MS, MAX_STEPS_PER_SAMPLE};

const TIME_SHIFT: u32 = 8;
const AZ_SHIFT: u32 = 4;
const NIBBLE: u32 = 0x0F;

/// A step command as sent on the wire:
/// `[31:8]` relative time in ms, `[7:4]` azimuth steps, `[3:0]` elevation steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct PackedPoint(pub u32);

impl PackedPoint {
    pub fn unpack(self) -> StepCommand {
        StepCommand {
            relative_time_ms: self.0 >> TIME_SHIFT,
            az_steps: ((self.0 >> AZ_SHIFT) & NIBBLE) as u8,
            elev_steps: (self.0 & NIBBLE) as u8,
        }
    }

    pub fn to_be_bytes(self) -> [u8; 4] {
        self.0.to_be_bytes()
    }
}

pub fn pack(cmd: &StepCommand) -> Result<PackedPoint, PackError> {
    if cmd.az_steps > MAX_STEPS_PER_SAMPLE {
        return Err(PackError::StepsOutOfRange {
            axis: Axis::Azimuth,
            value: cmd.az_steps,
        });
    }
    if cmd.elev_steps > MAX_STEPS_PER_SAMPLE {
        return Err(PackError::StepsOutOfRange {
            axis: Axis::Elevation,
            value: cmd.elev_steps,
        });
    }
    if cmd.relative_time_ms >= MAX_RELATIVE_TIME_MS {
        return Err(PackError::TimeOutOfRange(cmd.relative_time_ms));
    }

    Ok(PackedPoint(
        cmd.relative_time_ms << TIME_SHIFT | (cmd.az_steps as u32) << AZ_SHIFT | cmd.elev_steps as u32,
    ))
}

/// Packs every command of the plan, aborting on the first record that does not fit.
pub fn pack_plan(plan: &StepPlan) -> Result<Vec<PackedPoint>, StepError> {
    plan.commands
        .iter()
        .enumerate()
        .map(|(index, cmd)| pack(cmd).map_err(|source| StepError::Pack { index, source }))
        .collect()
}
