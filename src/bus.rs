//! SPI plumbing between the configurator and a driver chip.
//!
//! Several chips share one bus. Each chip owns its chip-select line and keeps it high
//! except while its own datagram is on the wire.

use core::cell::RefCell;

use embedded_hal::digital::OutputPin;
use embedded_hal::spi::SpiBus;

use crate::fmt::trace;
use crate::{Error, Result};

/// Clock used for chips behind a native chip-select pin.
pub const DEFAULT_SPI_FREQ: u32 = 2_000_000;
/// Clock used when the chip select goes through the I2S shift register.
pub const TRINAMIC_SPI_FREQ: u32 = 100_000;
/// Bytes per datagram: address plus 32 data bits.
pub const DATAGRAM_LEN: usize = 5;

/// A platform SPI bus that can be started and re-clocked per transaction.
pub trait SpiHost: SpiBus<u8> {
    /// Brings the peripheral up. Every chip calls this, so repeated calls must be harmless.
    fn begin(&mut self) -> core::result::Result<(), Self::Error>;

    /// Clock rate for the following transfers.
    fn set_frequency(&mut self, hz: u32) -> core::result::Result<(), Self::Error>;
}

/// Datagram exchange with exactly one chip.
pub trait Transport {
    /// Starts the underlying bus.
    fn begin(&mut self) -> Result<()>;

    /// Releases chip select so the chip ignores traffic meant for others.
    fn deselect(&mut self) -> Result<()>;

    /// Clock rate for this chip's future transfers.
    fn set_frequency(&mut self, hz: u32);

    /// Clocks one datagram out and returns what the chip shifted back.
    fn transfer(&mut self, frame: [u8; DATAGRAM_LEN]) -> Result<[u8; DATAGRAM_LEN]>;
}

/// Chip-select managed link to one chip on a shared bus.
#[derive(Debug)]
pub struct SpiLink<'a, B, CS> {
    bus: &'a RefCell<B>,
    cs: CS,
    frequency: u32,
}

impl<'a, B, CS> SpiLink<'a, B, CS>
where
    B: SpiHost,
    CS: OutputPin,
{
    /// Takes the chip-select pin and drives it high right away.
    ///
    /// # Errors
    /// Returns `Error::Pin` if chip select cannot be driven.
    pub fn new(bus: &'a RefCell<B>, mut cs: CS) -> Result<Self> {
        cs.set_high().map_err(Error::pin)?;
        Ok(Self {
            bus,
            cs,
            frequency: DEFAULT_SPI_FREQ,
        })
    }

    /// Clock rate used for this chip's transfers.
    #[must_use]
    pub const fn frequency(&self) -> u32 {
        self.frequency
    }

    /// Gives the chip-select pin back.
    pub fn release(self) -> CS {
        self.cs
    }
}

impl<B, CS> Transport for SpiLink<'_, B, CS>
where
    B: SpiHost,
    CS: OutputPin,
{
    fn begin(&mut self) -> Result<()> {
        let mut bus = self.bus.try_borrow_mut().map_err(|_| Error::BusBusy)?;
        bus.begin().map_err(Error::spi)
    }

    fn deselect(&mut self) -> Result<()> {
        self.cs.set_high().map_err(Error::pin)
    }

    fn set_frequency(&mut self, hz: u32) {
        self.frequency = hz;
    }

    fn transfer(&mut self, frame: [u8; DATAGRAM_LEN]) -> Result<[u8; DATAGRAM_LEN]> {
        let mut bus = self.bus.try_borrow_mut().map_err(|_| Error::BusBusy)?;
        bus.set_frequency(self.frequency).map_err(Error::spi)?;

        let mut buffer = frame;
        self.cs.set_low().map_err(Error::pin)?;
        let result = bus
            .transfer_in_place(&mut buffer)
            .and_then(|()| bus.flush());
        // chip select goes high even if the transfer failed
        self.cs.set_high().map_err(Error::pin)?;
        result.map_err(Error::spi)?;

        trace!("spi {:?} -> {:?}", frame, buffer);
        Ok(buffer)
    }
}
