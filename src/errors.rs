use core::fmt;

use embedded_hal::{digital, spi};

/// Errors raised while talking to a Trinamic driver chip.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// The SPI bus reported a failure.
    Spi(spi::ErrorKind),
    /// A chip-select or disable pin could not be driven.
    Pin(digital::ErrorKind),
    /// The shared bus is already borrowed by another transfer.
    BusBusy,
    /// The part number has no register protocol in this crate.
    UnsupportedPart(u16),
    /// A register field value is out of range.
    InvalidValue,
}

impl Error {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Spi(_) => "SPI transfer failed",
            Self::Pin(_) => "Pin could not be driven",
            Self::BusBusy => "SPI bus is busy",
            Self::UnsupportedPart(_) => "Unsupported Trinamic part number",
            Self::InvalidValue => "Invalid value",
        }
    }

    pub(crate) fn spi<E: spi::Error>(err: E) -> Self {
        Self::Spi(err.kind())
    }

    pub(crate) fn pin<E: digital::Error>(err: E) -> Self {
        Self::Pin(err.kind())
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Spi(kind) => write!(f, "{}: {kind}", self.as_str()),
            Self::Pin(kind) => write!(f, "{}: {kind:?}", self.as_str()),
            Self::UnsupportedPart(part) => write!(f, "{} {part}", self.as_str()),
            Self::BusBusy | Self::InvalidValue => f.write_str(self.as_str()),
        }
    }
}

impl core::error::Error for Error {}

#[cfg(test)]
mod tests {
    extern crate std;

    use std::string::ToString;

    use super::*;

    #[test]
    fn test_display_includes_part_number() {
        assert_eq!(
            Error::UnsupportedPart(2209).to_string(),
            "Unsupported Trinamic part number 2209"
        );
    }

    #[test]
    fn test_spi_kind_is_kept() {
        let err = Error::spi(spi::ErrorKind::ModeFault);
        assert_eq!(err, Error::Spi(spi::ErrorKind::ModeFault));
        assert_eq!(err.as_str(), "SPI transfer failed");
    }
}
