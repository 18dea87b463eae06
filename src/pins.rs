//! Board pin map entries.
//!
//! The configurator never toggles step or direction pins itself; it only needs to know
//! which pins a driver uses to report them and to pick a bus clock for the chip select.

use core::fmt;

/// First pin number routed through the I2S output shift register.
pub const I2S_OUT_PIN_BASE: u8 = 128;
/// Raw pin number meaning "not connected".
pub const UNDEFINED_PIN: u8 = 255;

/// A pin as numbered in the machine definition.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PinId {
    /// Native GPIO.
    Gpio(u8),
    /// Output bit of the serial shift register, numbered from zero.
    ShiftRegister(u8),
    Undefined,
}

impl PinId {
    /// Decodes the firmware's flat pin numbering.
    #[must_use]
    pub const fn from_raw(raw: u8) -> Self {
        match raw {
            UNDEFINED_PIN => Self::Undefined,
            n if n >= I2S_OUT_PIN_BASE => Self::ShiftRegister(n - I2S_OUT_PIN_BASE),
            n => Self::Gpio(n),
        }
    }

    /// Shift-register outputs are slow, so anything clocked through them needs a slower bus.
    #[must_use]
    pub const fn is_shift_register(self) -> bool {
        matches!(self, Self::ShiftRegister(_))
    }
}

impl Default for PinId {
    fn default() -> Self {
        Self::Undefined
    }
}

impl fmt::Display for PinId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Gpio(n) => write!(f, "GPIO({n})"),
            Self::ShiftRegister(n) => write!(f, "I2SO({n})"),
            Self::Undefined => f.write_str("None"),
        }
    }
}

/// Pins wired to one driver chip.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DriverPins {
    pub step: PinId,
    pub dir: PinId,
    pub disable: PinId,
    pub cs: PinId,
}

impl DriverPins {
    #[must_use]
    pub const fn from_raw(step: u8, dir: u8, disable: u8, cs: u8) -> Self {
        Self {
            step: PinId::from_raw(step),
            dir: PinId::from_raw(dir),
            disable: PinId::from_raw(disable),
            cs: PinId::from_raw(cs),
        }
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use std::string::ToString;

    use super::*;

    #[test]
    fn test_from_raw() {
        assert_eq!(PinId::from_raw(17), PinId::Gpio(17));
        assert_eq!(PinId::from_raw(128), PinId::ShiftRegister(0));
        assert_eq!(PinId::from_raw(131), PinId::ShiftRegister(3));
        assert_eq!(PinId::from_raw(255), PinId::Undefined);
    }

    #[test]
    fn test_names() {
        assert_eq!(PinId::Gpio(5).to_string(), "GPIO(5)");
        assert_eq!(PinId::ShiftRegister(2).to_string(), "I2SO(2)");
        assert_eq!(PinId::Undefined.to_string(), "None");
    }

    #[test]
    fn test_shift_register_detection() {
        assert!(PinId::from_raw(140).is_shift_register());
        assert!(!PinId::from_raw(12).is_shift_register());
        assert!(!PinId::Undefined.is_shift_register());
    }
}
