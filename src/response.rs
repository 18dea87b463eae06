use bitfield_struct::bitfield;

/// Status byte clocked out with every SPI datagram.
#[bitfield(u8)]
#[derive(PartialEq, Eq)]
pub struct SpiStatus {
    #[bits(1)]
    pub reset_flag: bool,

    #[bits(1)]
    pub driver_error: bool,

    #[bits(1)]
    pub sg2: bool,

    #[bits(1)]
    pub standstill: bool,

    #[bits(4)]
    __: u8,
}

/// Outcome of the connection self test.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum ConnectionStatus {
    /// The chip answered with plausible status.
    Ok = 0,
    /// Nothing drove MISO; the bus reads all ones.
    NoConnection = 1,
    /// The logic side answered but the motor supply is missing.
    NoMotorPower = 2,
}

impl From<u32> for ConnectionStatus {
    /// Classifies a raw `DRV_STATUS` read.
    fn from(drv_status: u32) -> Self {
        match drv_status {
            u32::MAX => Self::NoConnection,
            0 => Self::NoMotorPower,
            _ => Self::Ok,
        }
    }
}

impl ConnectionStatus {
    #[must_use]
    pub const fn is_ok(self) -> bool {
        matches!(self, Self::Ok)
    }

    /// Operator hint for a failed test.
    #[must_use]
    pub const fn hint(self) -> &'static str {
        match self {
            Self::Ok => "passed",
            Self::NoConnection => "failed. Check connection",
            Self::NoMotorPower => "failed. Check motor power",
        }
    }
}
