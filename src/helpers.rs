use core::f32::consts::SQRT_2;
use core::fmt;

use micromath::F32Ext;

use crate::registers::TSTEP_MAX;
use crate::{GANGED_AXIS_BASE, MAX_AXES, TRINAMIC_FCLK};

/// Full scale sense voltage with `vsense` cleared.
pub const VSENSE_LOW_SENSITIVITY: f32 = 0.325;
/// Full scale sense voltage with `vsense` set (TMC2130 only).
pub const VSENSE_HIGH_SENSITIVITY: f32 = 0.180;
/// Internal resistance added to the TMC2130 sense path.
pub const TMC2130_RSENSE_OFFSET: f32 = 0.02;

const AXIS_LETTERS: [char; MAX_AXES as usize] = ['X', 'Y', 'Z', 'A', 'B', 'C'];

/// Printable axis identity, e.g. `X` or `Y2` for the ganged motor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AxisName {
    pub index: u8,
    pub ganged: bool,
}

impl AxisName {
    /// Wraps a raw motor index into an axis and flags the second motor of a ganged pair.
    #[must_use]
    pub const fn from_motor_index(raw: u8) -> Self {
        Self {
            index: raw % MAX_AXES,
            ganged: raw >= GANGED_AXIS_BASE,
        }
    }

    #[must_use]
    pub const fn letter(self) -> char {
        AXIS_LETTERS[(self.index % MAX_AXES) as usize]
    }
}

impl fmt::Display for AxisName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.ganged {
            write!(f, "{}2", self.letter())
        } else {
            write!(f, "{}", self.letter())
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for AxisName {
    fn format(&self, f: defmt::Formatter<'_>) {
        if self.ganged {
            defmt::write!(f, "{}2", self.letter());
        } else {
            defmt::write!(f, "{}", self.letter());
        }
    }
}

/// Converts a feed rate into the chip's TSTEP unit, scaled by `percent`.
///
/// TSTEP counts `TRINAMIC_FCLK` ticks between 1/256 microsteps, so slower moves give larger
/// values. Returns `None` when the inputs cannot describe a moving axis. The result is
/// clamped to the 20-bit threshold registers.
#[must_use]
pub fn calc_tstep(
    speed_mm_per_min: f32,
    percent: f32,
    steps_per_mm: f32,
    microsteps: u16,
) -> Option<u32> {
    if microsteps == 0 || microsteps > 256 {
        return None;
    }
    // integer division, as the chip only knows power-of-two microstep settings
    let interpolation = f64::from(256 / microsteps);
    let rate = f64::from(speed_mm_per_min) / 60.0 * f64::from(steps_per_mm) * interpolation;
    let percent = f64::from(percent);
    if !(rate.is_finite() && rate > 0.0 && percent.is_finite() && percent > 0.0) {
        return None;
    }
    let tstep = f64::from(TRINAMIC_FCLK) / rate * percent / 100.0;

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    {
        Some((tstep as u32).min(TSTEP_MAX))
    }
}

/// Encodes a microstep count as the CHOPCONF `mres` field.
#[must_use]
pub const fn microsteps_to_mres(microsteps: u16) -> Option<u8> {
    match microsteps {
        256 => Some(0),
        128 => Some(1),
        64 => Some(2),
        32 => Some(3),
        16 => Some(4),
        8 => Some(5),
        4 => Some(6),
        2 => Some(7),
        1 => Some(8),
        _ => None,
    }
}

/// Decodes the CHOPCONF `mres` field.
#[must_use]
pub const fn mres_to_microsteps(mres: u8) -> u16 {
    if mres > 8 { 1 } else { 256 >> mres }
}

/// TMC2130 current scale for an RMS current in milliamps.
///
/// Returns `(vsense, cs)`. Small currents switch to the high sensitivity range.
#[must_use]
pub fn tmc2130_current(milliamps: f32, r_sense: f32) -> (bool, u8) {
    let scaled = 32.0 * SQRT_2 * milliamps / 1000.0 * (r_sense + TMC2130_RSENSE_OFFSET);
    let cs = scaled / VSENSE_LOW_SENSITIVITY - 1.0;
    if cs < 16.0 {
        (true, clamp_cs(scaled / VSENSE_HIGH_SENSITIVITY - 1.0))
    } else {
        (false, clamp_cs(cs))
    }
}

/// TMC5160 current scale for an RMS current in milliamps.
///
/// Returns `(global_scaler, cs)` with the scaler in `32..=256`.
#[must_use]
pub fn tmc5160_current(milliamps: f32, r_sense: f32) -> (u16, u8) {
    let fraction = milliamps / 1000.0 * SQRT_2 * r_sense / VSENSE_LOW_SENSITIVITY;
    let scaler = F32Ext::ceil(256.0 * fraction).clamp(32.0, 256.0);
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let global_scaler = scaler as u16;
    (global_scaler, clamp_cs(32.0 * 256.0 * fraction / scaler - 1.0))
}

/// Hold current register value for a run current and hold fraction.
#[must_use]
pub fn hold_current(irun: u8, hold_multiplier: f32) -> u8 {
    clamp_cs(f32::from(irun) * hold_multiplier)
}

fn clamp_cs(value: f32) -> u8 {
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    {
        value.clamp(0.0, 31.0) as u8
    }
}
