//! A generic, `no_std` configurator for SPI controlled **Trinamic TMC2130/TMC5160** stepper
//! drivers on a CNC motion controller.
//!
//! The crate owns the register protocol (40-bit datagrams and shadow copies of the write-only
//! registers) and picks the chopper configuration for each axis: StealthChop for quiet moves,
//! CoolStep for load adaptive current, and CoolStep with an armed StallGuard window for
//! sensorless homing. Chip select and the bus are platform specific and come in through
//! [`bus::SpiHost`] and [`embedded_hal::digital::OutputPin`].

#![cfg_attr(not(test), no_std)]

mod fmt;

pub mod bus;
pub mod chip;
pub mod enums;
mod errors;
pub mod helpers;
pub mod motor;
pub mod pins;
pub mod registers;
pub mod report;
pub mod response;
pub mod settings;

use embedded_hal::digital::{OutputPin, PinState};

pub use bus::{DEFAULT_SPI_FREQ, SpiHost, SpiLink, TRINAMIC_SPI_FREQ, Transport};
pub use chip::{Chip, ShadowRegisters, Tmc2130, Tmc5160, TmcRegisters};
pub use enums::{Client, HomingMode, MsgLevel, PartNumber, RunMode};
pub use errors::Error;
pub use helpers::AxisName;
pub use motor::{Motor, NullMotor};
pub use pins::{DriverPins, PinId};
pub use report::{MessageSink, RealtimeRate};
pub use response::{ConnectionStatus, SpiStatus};
pub use settings::{AxisConfig, AxisSettings, SettingsTable};

use crate::fmt::{debug, error, info};
use crate::registers::TSTEP_MAX;

/// Crate version, reported by the connection test.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Number of axes a machine can have.
pub const MAX_AXES: u8 = 6;
/// Motor indices from here on drive the second motor of a ganged axis.
pub const GANGED_AXIS_BASE: u8 = 6;

/// Internal clock of the driver chips, in Hz.
pub const TRINAMIC_FCLK: f32 = 12_700_000.0;

/// CoolStep lower velocity threshold outside of StallGuard homing.
pub const NORMAL_TCOOLTHRS: u32 = 0xF_FFFF;
/// CoolStep upper velocity threshold outside of StallGuard homing.
pub const NORMAL_THIGH: u32 = 0;

/// Slow edge of the StallGuard window, as a percentage of the homing feed rate's TSTEP.
pub const STALLGUARD_TCOOLTHRS_PERCENT: f32 = 150.0;
/// Fast edge of the StallGuard window, as a percentage of the homing feed rate's TSTEP.
pub const STALLGUARD_THIGH_PERCENT: f32 = 60.0;

const STEALTHCHOP_TOFF: u8 = 5;
const SPREADCYCLE_TOFF: u8 = 3;
const SPREADCYCLE_TBL: u8 = 1;
const SPREADCYCLE_HSTRT: u8 = 4;
const SPREADCYCLE_HEND: i8 = -2;

type Result<T> = core::result::Result<T, Error>;

/// Static description of one Trinamic driver on the board.
#[derive(Debug, Copy, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TrinamicConfig {
    /// Raw motor index; values from [`GANGED_AXIS_BASE`] on are ganged motors.
    pub axis_index: u8,
    /// Raw part number, e.g. `2130`.
    pub part_number: u16,
    /// Sense resistor in ohms; `None` uses the part's usual value.
    pub r_sense: Option<f32>,
    /// SPI daisy chain index, reported only.
    pub spi_index: i8,
    /// Step, direction, disable and chip-select pins, reported only.
    pub pins: DriverPins,
    /// Chopper mode outside of StallGuard homing.
    pub run_mode: RunMode,
    /// Homing strategy for this axis.
    pub homing_mode: HomingMode,
    /// Also switch the chopper off over SPI when the motor is disabled.
    pub soft_disable: bool,
}

impl Default for TrinamicConfig {
    fn default() -> Self {
        Self {
            axis_index: 0,
            part_number: PartNumber::Tmc2130 as u16,
            r_sense: None,
            spi_index: -1,
            pins: DriverPins::default(),
            run_mode: RunMode::default(),
            homing_mode: HomingMode::default(),
            soft_disable: false,
        }
    }
}

impl TrinamicConfig {
    /// Creates a configuration for a part on a motor index.
    #[must_use]
    pub fn new(axis_index: u8, part_number: u16) -> Self {
        Self {
            axis_index,
            part_number,
            ..Default::default()
        }
    }

    /// Sets the sense resistor in ohms.
    #[must_use]
    pub const fn with_r_sense(mut self, ohms: f32) -> Self {
        self.r_sense = Some(ohms);
        self
    }

    /// Sets the reported SPI daisy chain index.
    #[must_use]
    pub const fn with_spi_index(mut self, spi_index: i8) -> Self {
        self.spi_index = spi_index;
        self
    }

    /// Sets the driver pins.
    #[must_use]
    pub const fn with_pins(mut self, pins: DriverPins) -> Self {
        self.pins = pins;
        self
    }

    /// Sets the chopper mode used outside of StallGuard homing.
    #[must_use]
    pub const fn with_run_mode(mut self, run_mode: RunMode) -> Self {
        self.run_mode = run_mode;
        self
    }

    /// Sets the homing strategy.
    #[must_use]
    pub const fn with_homing_mode(mut self, homing_mode: HomingMode) -> Self {
        self.homing_mode = homing_mode;
        self
    }

    /// Also switches the chopper off over SPI when disabled.
    #[must_use]
    pub const fn with_soft_disable(mut self, soft_disable: bool) -> Self {
        self.soft_disable = soft_disable;
        self
    }
}

/// Configures one Trinamic chip from the axis settings and keeps its chopper mode in step
/// with the homing state.
///
/// Construction only deselects the chip. Register traffic starts with [`Self::init`], which
/// must run after every driver sharing the bus has been constructed.
pub struct TrinamicDriver<'a, L, EN, S: ?Sized, M: ?Sized, R: ?Sized> {
    axis: AxisName,
    config: TrinamicConfig,
    chip: Chip<L>,
    disable_pin: EN,
    settings: &'a S,
    sink: &'a M,
    rate: &'a R,
    is_active: bool,
    is_homing: bool,
}

impl<'a, L, EN, S, M, R> TrinamicDriver<'a, L, EN, S, M, R>
where
    L: Transport,
    EN: OutputPin,
    S: AxisSettings + ?Sized,
    M: MessageSink + ?Sized,
    R: RealtimeRate + ?Sized,
{
    /// Binds the register protocol for the configured part.
    ///
    /// # Errors
    /// Returns `Error::UnsupportedPart` for part numbers other than 2130 and 5160, after
    /// reporting it on the sink. Returns `Error::Pin` if chip select cannot be released.
    pub fn new(
        config: TrinamicConfig,
        mut link: L,
        disable_pin: EN,
        settings: &'a S,
        sink: &'a M,
        rate: &'a R,
    ) -> Result<Self> {
        let part = match PartNumber::try_from(config.part_number) {
            Ok(part) => part,
            Err(err) => {
                error!("unsupported part number {}", config.part_number);
                sink.send(
                    Client::Serial,
                    MsgLevel::Error,
                    format_args!("Trinamic unsupported p/n:{}", config.part_number),
                );
                return Err(err);
            }
        };

        link.deselect()?;
        if config.pins.cs.is_shift_register() {
            link.set_frequency(TRINAMIC_SPI_FREQ);
        }

        let r_sense = config.r_sense.unwrap_or(part.default_r_sense());
        let driver = Self {
            axis: AxisName::from_motor_index(config.axis_index),
            config,
            chip: Chip::new(part, link, r_sense),
            disable_pin,
            settings,
            sink,
            rate,
            is_active: false,
            is_homing: false,
        };
        driver.config_message();
        Ok(driver)
    }

    /// Starts the bus, powers the chip up and applies the settings and run mode.
    ///
    /// A failed connection test is reported but does not stop initialisation.
    ///
    /// # Errors
    /// Returns the first bus or pin error.
    pub fn init(&mut self) -> Result<()> {
        info!("{} init TMC{}", self.axis, self.part());
        self.chip.link_mut().begin()?;
        self.chip.begin()?;
        self.test()?;
        self.read_settings()?;
        self.set_mode()?;

        self.is_homing = false;
        self.is_active = true;
        Ok(())
    }

    /// Sends the startup summary of pins and part.
    pub fn config_message(&self) {
        let pins = self.config.pins;
        self.report(
            MsgLevel::Info,
            format_args!(
                "{} Axis Trinamic TMC{} Step:{} Dir:{} CS:{} Disable:{} Index:{}",
                self.axis,
                self.part(),
                pins.step,
                pins.dir,
                pins.cs,
                pins.disable,
                self.config.spi_index,
            ),
        );
    }

    /// Checks that the chip answers; the result is reported on the sink.
    ///
    /// # Errors
    /// Returns bus errors only. A chip that answers badly gives `Ok(false)`.
    pub fn test(&mut self) -> Result<bool> {
        let status = self.chip.test_connection()?;
        self.report(
            MsgLevel::Info,
            format_args!(
                "{} Trinamic driver test {}. trinamic-spi v{VERSION}",
                self.axis,
                status.hint(),
            ),
        );
        Ok(status.is_ok())
    }

    /// Pushes microsteps, currents and the StallGuard threshold of this axis into the chip.
    ///
    /// An unsupported microstep count is reported and skipped.
    ///
    /// # Errors
    /// Returns bus errors.
    pub fn read_settings(&mut self) -> Result<()> {
        let axis = self.axis.index;
        let microsteps = self.settings.microsteps(axis);
        match self.chip.microsteps(microsteps) {
            Err(Error::InvalidValue) => self.report(
                MsgLevel::Warning,
                format_args!("{} Axis unsupported microsteps:{microsteps}", self.axis),
            ),
            other => other?,
        }

        let run_milliamps = self.settings.run_current(axis) * 1000.0;
        let hold_multiplier = self.settings.hold_current(axis) / 100.0;
        self.chip.rms_current(run_milliamps, hold_multiplier)?;
        self.chip.sgt(self.settings.stallguard(axis))
    }

    /// Records whether the axis is homing and reprograms the chopper accordingly.
    ///
    /// # Errors
    /// Returns bus errors.
    pub fn set_homing_mode(&mut self, is_homing: bool) -> Result<()> {
        self.is_homing = is_homing;
        self.set_mode()
    }

    /// Programs every register that depends on the active mode.
    ///
    /// StealthChop leaves the CoolStep and StallGuard registers as they are.
    ///
    /// # Errors
    /// Returns bus errors.
    pub fn set_mode(&mut self) -> Result<()> {
        let mode = self.active_mode();
        debug!("{} mode {}", self.axis, mode);

        if mode == RunMode::StealthChop {
            self.chip.toff(STEALTHCHOP_TOFF)?;
            self.chip.en_pwm_mode(true)?;
            return self.chip.pwm_autoscale(true);
        }

        self.chip.tbl(SPREADCYCLE_TBL)?;
        self.chip.toff(SPREADCYCLE_TOFF)?;
        self.chip.hysteresis_start(SPREADCYCLE_HSTRT)?;
        self.chip.hysteresis_end(SPREADCYCLE_HEND)?;
        self.chip.sfilt(true)?;
        // DIAG1 is open drain, active low, and fires on stalls only
        self.chip.diag1_pushpull(false)?;
        self.chip.diag1_stall(true)?;

        let (tcoolthrs, thigh) = if mode == RunMode::StallGuard {
            self.stall_window()
        } else {
            (NORMAL_TCOOLTHRS, NORMAL_THIGH)
        };
        self.chip.tcoolthrs(tcoolthrs)?;
        self.chip.thigh(thigh)
    }

    /// TSTEP equivalent of `speed` mm/min for this axis, scaled by `percent`.
    #[must_use]
    pub fn calc_tstep(&self, speed: f32, percent: f32) -> Option<u32> {
        let axis = self.axis.index;
        helpers::calc_tstep(
            speed,
            percent,
            self.settings.steps_per_mm(axis),
            self.settings.microsteps(axis),
        )
    }

    /// Reports the StallGuard reading while the axis moves. Silent at standstill.
    ///
    /// # Errors
    /// Returns bus errors.
    pub fn debug_message(&mut self) -> Result<()> {
        let tstep = self.chip.tstep()?;
        if tstep == TSTEP_MAX || tstep == u32::MAX {
            return Ok(());
        }

        let status = self.chip.drv_status()?;
        let rate = self.rate.realtime_rate();
        let setting = self.settings.stallguard(self.axis.index);
        self.report(
            MsgLevel::Info,
            format_args!(
                "{} Stallguard {}   SG_Val: {:04}   Rate: {rate:05.0} mm/min SG_Setting:{setting}",
                self.axis,
                u8::from(status.stallguard()),
                status.sg_result(),
            ),
        );
        Ok(())
    }

    /// Drives the disable pin, high meaning disabled.
    ///
    /// With soft disable the chopper is also switched off, and enabling reprograms the whole
    /// active mode.
    ///
    /// # Errors
    /// Returns `Error::Pin` or bus errors.
    pub fn set_disable(&mut self, disable: bool) -> Result<()> {
        self.disable_pin
            .set_state(PinState::from(disable))
            .map_err(Error::pin)?;

        if !self.config.soft_disable {
            return Ok(());
        }
        if disable {
            self.chip.toff(0)
        } else {
            self.set_mode()
        }
    }

    /// Mode the chip is programmed for, from the run mode, homing mode and homing flag.
    #[must_use]
    pub fn active_mode(&self) -> RunMode {
        self.config
            .homing_mode
            .resolve(self.config.run_mode, self.is_homing)
    }

    /// Axis this driver serves.
    #[must_use]
    pub const fn axis_name(&self) -> AxisName {
        self.axis
    }

    /// Bound part.
    #[must_use]
    pub fn part(&self) -> PartNumber {
        self.chip.part()
    }

    /// Configuration given at construction.
    #[must_use]
    pub const fn config(&self) -> &TrinamicConfig {
        &self.config
    }

    /// Whether a homing cycle is in progress.
    #[must_use]
    pub const fn is_homing(&self) -> bool {
        self.is_homing
    }

    /// Whether `init` has run.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.is_active
    }

    /// Register level access, e.g. to read the shadow registers.
    #[must_use]
    pub const fn chip(&self) -> &Chip<L> {
        &self.chip
    }

    fn stall_window(&self) -> (u32, u32) {
        let feed_rate = self.settings.homing_feed_rate();
        let window = (
            self.calc_tstep(feed_rate, STALLGUARD_TCOOLTHRS_PERCENT),
            self.calc_tstep(feed_rate, STALLGUARD_THIGH_PERCENT),
        );
        if let (Some(tcoolthrs), Some(thigh)) = window {
            return (tcoolthrs, thigh);
        }

        self.report(
            MsgLevel::Warning,
            format_args!(
                "{} Axis StallGuard window undefined for {feed_rate} mm/min, using CoolStep thresholds",
                self.axis,
            ),
        );
        (NORMAL_TCOOLTHRS, NORMAL_THIGH)
    }

    fn report(&self, level: MsgLevel, args: core::fmt::Arguments<'_>) {
        self.sink.send(Client::Serial, level, args);
    }
}

impl<L, EN, S, M, R> core::fmt::Debug for TrinamicDriver<'_, L, EN, S, M, R>
where
    L: Transport,
    S: ?Sized,
    M: ?Sized,
    R: ?Sized,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TrinamicDriver")
            .field("axis", &self.axis)
            .field("config", &self.config)
            .field("part", &self.chip.part())
            .field("is_active", &self.is_active)
            .field("is_homing", &self.is_homing)
            .finish_non_exhaustive()
    }
}

impl<L, EN, S, M, R> Motor for TrinamicDriver<'_, L, EN, S, M, R>
where
    L: Transport,
    EN: OutputPin,
    S: AxisSettings + ?Sized,
    M: MessageSink + ?Sized,
    R: RealtimeRate + ?Sized,
{
    fn init(&mut self) -> Result<()> {
        Self::init(self)
    }

    fn config_message(&mut self) {
        Self::config_message(self);
    }

    fn test(&mut self) -> Result<bool> {
        Self::test(self)
    }

    fn read_settings(&mut self) -> Result<()> {
        Self::read_settings(self)
    }

    fn set_homing_mode(&mut self, is_homing: bool) -> Result<()> {
        Self::set_homing_mode(self, is_homing)
    }

    fn set_disable(&mut self, disable: bool) -> Result<()> {
        Self::set_disable(self, disable)
    }

    fn debug_message(&mut self) -> Result<()> {
        Self::debug_message(self)
    }

    fn is_active(&self) -> bool {
        self.is_active
    }
}
