use core::fmt;

use crate::Error;

/// Supported Trinamic SPI parts.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u16)]
pub enum PartNumber {
    Tmc2130 = 2130,
    Tmc5160 = 5160,
}

impl PartNumber {
    /// Sense resistor fitted on the common breakout boards, in ohms.
    #[must_use]
    pub const fn default_r_sense(self) -> f32 {
        match self {
            Self::Tmc2130 => 0.11,
            Self::Tmc5160 => 0.075,
        }
    }
}

impl TryFrom<u16> for PartNumber {
    type Error = Error;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            2130 => Ok(Self::Tmc2130),
            5160 => Ok(Self::Tmc5160),
            other => Err(Error::UnsupportedPart(other)),
        }
    }
}

impl fmt::Display for PartNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", *self as u16)
    }
}

/// Chopper configuration the driver runs in.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RunMode {
    /// Voltage PWM chopper, near silent.
    StealthChop,
    /// SpreadCycle chopper with load adaptive current.
    #[default]
    CoolStep,
    /// CoolStep with the stall window armed for sensorless homing.
    StallGuard,
}

impl fmt::Display for RunMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::StealthChop => "StealthChop",
            Self::CoolStep => "CoolStep",
            Self::StallGuard => "StallGuard",
        })
    }
}

/// How an axis finds its home position.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HomingMode {
    /// Limit switches; the run mode is kept while homing.
    #[default]
    Standard,
    /// Sensorless homing through StallGuard.
    StallGuard,
}

impl HomingMode {
    /// Collapses the configured run mode, homing strategy and homing flag into the active mode.
    #[must_use]
    pub const fn resolve(self, run_mode: RunMode, is_homing: bool) -> RunMode {
        match (is_homing, self) {
            (true, Self::StallGuard) => RunMode::StallGuard,
            _ => run_mode,
        }
    }
}

/// Severity attached to operator messages.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum MsgLevel {
    None = 0,
    Error = 1,
    Warning = 2,
    Info = 3,
    Debug = 4,
    Verbose = 5,
}

/// Destination channel for operator messages.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Client {
    Serial = 0x00,
    Bluetooth = 0x01,
    WebUi = 0x02,
    Telnet = 0x03,
    All = 0xFF,
}
