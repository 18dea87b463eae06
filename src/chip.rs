//! Register protocol for the supported Trinamic parts.
//!
//! Configuration registers are write-only, so every part keeps a shadow copy and field
//! setters rewrite the whole register from it.

use crate::bus::{DATAGRAM_LEN, Transport};
use crate::enums::PartNumber;
use crate::fmt::{debug, trace};
use crate::helpers::{
    hold_current, microsteps_to_mres, mres_to_microsteps, tmc2130_current, tmc5160_current,
};
use crate::registers::{
    ChopConf, CoolConf, DrvStatus, GConf, IHoldIRun, IoIn, PwmConf, Register, TSTEP_MAX,
    WRITE_FLAG, addr,
};
use crate::response::{ConnectionStatus, SpiStatus};
use crate::{Error, Result};

/// Off time programmed by the power-up sequence.
const POWER_UP_TOFF: u8 = 8;
/// Blank time programmed by the power-up sequence.
const POWER_UP_TBL: u8 = 1;

/// Last values written to the write-only registers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShadowRegisters {
    pub gconf: GConf,
    pub ihold_irun: IHoldIRun,
    pub chopconf: ChopConf,
    pub coolconf: CoolConf,
    pub pwmconf: PwmConf,
    pub tcoolthrs: u32,
    pub thigh: u32,
    /// TMC5160 only; 0 means full scale (256).
    pub global_scaler: u8,
}

impl ShadowRegisters {
    /// Power-on values for a part.
    #[must_use]
    pub fn reset(part: PartNumber) -> Self {
        let (chopconf, pwmconf) = match part {
            PartNumber::Tmc2130 => (0, 0x0005_0480),
            PartNumber::Tmc5160 => (0x1041_0150, 0xC40C_001E),
        };
        Self {
            gconf: GConf::new(),
            ihold_irun: IHoldIRun::new(),
            chopconf: ChopConf::from(chopconf),
            coolconf: CoolConf::new(),
            pwmconf: PwmConf::from(pwmconf),
            tcoolthrs: 0,
            thigh: 0,
            global_scaler: 0,
        }
    }
}

/// Datagram level access to one chip.
#[derive(Debug)]
pub struct TmcSpi<L> {
    link: L,
    shadow: ShadowRegisters,
    r_sense: f32,
    status: SpiStatus,
}

impl<L: Transport> TmcSpi<L> {
    fn new(link: L, part: PartNumber, r_sense: f32) -> Self {
        Self {
            link,
            shadow: ShadowRegisters::reset(part),
            r_sense,
            status: SpiStatus::new(),
        }
    }

    fn exchange(&mut self, frame: [u8; DATAGRAM_LEN]) -> Result<u32> {
        let response = self.link.transfer(frame)?;
        self.status = SpiStatus::from(response[0]);
        Ok(u32::from_be_bytes([
            response[1],
            response[2],
            response[3],
            response[4],
        ]))
    }

    fn write_register(&mut self, address: u8, value: u32) -> Result<()> {
        let [b0, b1, b2, b3] = value.to_be_bytes();
        trace!("write {:?} = {:?}", address, value);
        self.exchange([address | WRITE_FLAG, b0, b1, b2, b3])
            .map(|_| ())
    }

    /// The reply to a datagram arrives with the next one, so the address is sent twice.
    fn read_register(&mut self, address: u8) -> Result<u32> {
        let frame = [address & !WRITE_FLAG, 0, 0, 0, 0];
        self.exchange(frame)?;
        let value = self.exchange(frame)?;
        trace!("read {:?} = {:?}", address, value);
        Ok(value)
    }
}

/// Register capabilities shared by every supported part.
pub trait TmcRegisters {
    type Link: Transport;

    /// Part this register set belongs to.
    fn part(&self) -> PartNumber;

    /// Datagram layer of the chip.
    fn spi(&self) -> &TmcSpi<Self::Link>;

    /// Mutable datagram layer of the chip.
    fn spi_mut(&mut self) -> &mut TmcSpi<Self::Link>;

    /// Power-up register sequence.
    fn begin(&mut self) -> Result<()>;

    /// Programs run and hold current from an RMS current in milliamps.
    fn rms_current(&mut self, milliamps: f32, hold_multiplier: f32) -> Result<()>;

    /// Transport the chip talks through.
    fn link_mut(&mut self) -> &mut Self::Link {
        &mut self.spi_mut().link
    }

    /// Last values written to the configuration registers.
    fn shadow(&self) -> &ShadowRegisters {
        &self.spi().shadow
    }

    /// Sense resistor in ohms.
    fn r_sense(&self) -> f32 {
        self.spi().r_sense
    }

    /// Status byte of the most recent datagram.
    fn status(&self) -> SpiStatus {
        self.spi().status
    }

    /// Writes a whole register without touching the shadow copy.
    fn write<R: Register>(&mut self, register: R) -> Result<()> {
        self.spi_mut().write_register(R::ADDRESS, register.into())
    }

    /// Reads a register, paying the one-datagram reply delay.
    fn read<R: Register>(&mut self) -> Result<R> {
        self.spi_mut().read_register(R::ADDRESS).map(R::from)
    }

    /// Writes every shadowed configuration register.
    fn push_shadow(&mut self) -> Result<()> {
        let shadow = *self.shadow();
        self.write(shadow.gconf)?;
        self.write(shadow.chopconf)?;
        self.write(shadow.coolconf)?;
        self.write(shadow.pwmconf)?;
        self.write(shadow.ihold_irun)
    }

    /// Edits GCONF from its shadow and writes it.
    fn update_gconf(&mut self, f: impl FnOnce(&mut GConf)) -> Result<()> {
        let mut register = self.shadow().gconf;
        f(&mut register);
        self.write(register)?;
        self.spi_mut().shadow.gconf = register;
        Ok(())
    }

    /// Edits CHOPCONF from its shadow and writes it.
    fn update_chopconf(&mut self, f: impl FnOnce(&mut ChopConf)) -> Result<()> {
        let mut register = self.shadow().chopconf;
        f(&mut register);
        self.write(register)?;
        self.spi_mut().shadow.chopconf = register;
        Ok(())
    }

    /// Edits COOLCONF from its shadow and writes it.
    fn update_coolconf(&mut self, f: impl FnOnce(&mut CoolConf)) -> Result<()> {
        let mut register = self.shadow().coolconf;
        f(&mut register);
        self.write(register)?;
        self.spi_mut().shadow.coolconf = register;
        Ok(())
    }

    /// Edits PWMCONF from its shadow and writes it.
    fn update_pwmconf(&mut self, f: impl FnOnce(&mut PwmConf)) -> Result<()> {
        let mut register = self.shadow().pwmconf;
        f(&mut register);
        self.write(register)?;
        self.spi_mut().shadow.pwmconf = register;
        Ok(())
    }

    /// Edits IHOLD_IRUN from its shadow and writes it.
    fn update_ihold_irun(&mut self, f: impl FnOnce(&mut IHoldIRun)) -> Result<()> {
        let mut register = self.shadow().ihold_irun;
        f(&mut register);
        self.write(register)?;
        self.spi_mut().shadow.ihold_irun = register;
        Ok(())
    }

    /// Microstep resolution per full step.
    ///
    /// # Errors
    /// Returns `Error::InvalidValue` for counts other than powers of two up to 256.
    fn microsteps(&mut self, microsteps: u16) -> Result<()> {
        let mres = microsteps_to_mres(microsteps).ok_or(Error::InvalidValue)?;
        self.update_chopconf(|r| r.set_mres(mres))
    }

    /// Microstep resolution currently programmed.
    fn microsteps_setting(&self) -> u16 {
        mres_to_microsteps(self.shadow().chopconf.mres())
    }

    /// Chopper off time, 0 disables the driver stage.
    fn toff(&mut self, toff: u8) -> Result<()> {
        if toff > 15 {
            return Err(Error::InvalidValue);
        }
        self.update_chopconf(|r| r.set_toff(toff))
    }

    /// Comparator blank time, 0..=3.
    fn tbl(&mut self, tbl: u8) -> Result<()> {
        if tbl > 3 {
            return Err(Error::InvalidValue);
        }
        self.update_chopconf(|r| r.set_tbl(tbl))
    }

    /// Hysteresis start, 1..=8.
    fn hysteresis_start(&mut self, value: u8) -> Result<()> {
        if !(1..=8).contains(&value) {
            return Err(Error::InvalidValue);
        }
        self.update_chopconf(|r| r.set_hstrt(value - 1))
    }

    /// Hysteresis end, -3..=12.
    fn hysteresis_end(&mut self, value: i8) -> Result<()> {
        if !(-3..=12).contains(&value) {
            return Err(Error::InvalidValue);
        }
        #[allow(clippy::cast_sign_loss)]
        let hend = (value + 3) as u8;
        self.update_chopconf(|r| r.set_hend(hend))
    }

    /// Enables StealthChop voltage PWM mode.
    fn en_pwm_mode(&mut self, enable: bool) -> Result<()> {
        self.update_gconf(|r| r.set_en_pwm_mode(enable))
    }

    /// Enables automatic PWM amplitude scaling.
    fn pwm_autoscale(&mut self, enable: bool) -> Result<()> {
        self.update_pwmconf(|r| r.set_pwm_autoscale(enable))
    }

    /// Enables the StallGuard filter.
    fn sfilt(&mut self, enable: bool) -> Result<()> {
        self.update_coolconf(|r| r.set_sfilt(enable))
    }

    /// StallGuard threshold, clamped to -64..=63.
    fn sgt(&mut self, threshold: i8) -> Result<()> {
        let threshold = threshold.clamp(-64, 63);
        self.update_coolconf(|r| r.set_sgt(threshold))
    }

    /// Drives DIAG1 push-pull instead of open drain.
    fn diag1_pushpull(&mut self, push_pull: bool) -> Result<()> {
        self.update_gconf(|r| r.set_diag1_pushpull(push_pull))
    }

    /// Signals stalls on DIAG1.
    fn diag1_stall(&mut self, enable: bool) -> Result<()> {
        self.update_gconf(|r| r.set_diag1_stall(enable))
    }

    /// Lower velocity threshold for CoolStep and StallGuard, limited to 20 bits.
    fn tcoolthrs(&mut self, value: u32) -> Result<()> {
        let value = value.min(TSTEP_MAX);
        self.spi_mut().write_register(addr::TCOOLTHRS, value)?;
        self.spi_mut().shadow.tcoolthrs = value;
        Ok(())
    }

    /// Upper velocity threshold for CoolStep and StallGuard, limited to 20 bits.
    fn thigh(&mut self, value: u32) -> Result<()> {
        let value = value.min(TSTEP_MAX);
        self.spi_mut().write_register(addr::THIGH, value)?;
        self.spi_mut().shadow.thigh = value;
        Ok(())
    }

    /// Measured time between 1/256 microsteps; `0xFFFFF` at standstill.
    fn tstep(&mut self) -> Result<u32> {
        self.spi_mut().read_register(addr::TSTEP)
    }

    /// Driver status with StallGuard result and error flags.
    fn drv_status(&mut self) -> Result<DrvStatus> {
        self.read::<DrvStatus>()
    }

    /// Silicon version from IOIN, 0x11 on the TMC2130 and 0x30 on the TMC5160.
    fn version(&mut self) -> Result<u8> {
        self.read::<IoIn>().map(|ioin| ioin.version())
    }

    /// Reads DRV_STATUS and classifies the link.
    fn test_connection(&mut self) -> Result<ConnectionStatus> {
        self.spi_mut()
            .read_register(addr::DRV_STATUS)
            .map(ConnectionStatus::from)
    }
}

/// TMC2130 with internal current sense scaling.
#[derive(Debug)]
pub struct Tmc2130<L> {
    spi: TmcSpi<L>,
}

impl<L: Transport> Tmc2130<L> {
    /// Wraps a link to a TMC2130.
    pub fn new(link: L, r_sense: f32) -> Self {
        Self {
            spi: TmcSpi::new(link, PartNumber::Tmc2130, r_sense),
        }
    }
}

impl<L: Transport> TmcRegisters for Tmc2130<L> {
    type Link = L;

    fn part(&self) -> PartNumber {
        PartNumber::Tmc2130
    }

    fn spi(&self) -> &TmcSpi<L> {
        &self.spi
    }

    fn spi_mut(&mut self) -> &mut TmcSpi<L> {
        &mut self.spi
    }

    fn begin(&mut self) -> Result<()> {
        self.push_shadow()?;
        self.toff(POWER_UP_TOFF)?;
        self.tbl(POWER_UP_TBL)
    }

    fn rms_current(&mut self, milliamps: f32, hold_multiplier: f32) -> Result<()> {
        let (vsense, irun) = tmc2130_current(milliamps, self.r_sense());
        let ihold = hold_current(irun, hold_multiplier);
        debug!("TMC2130 vsense={:?} irun={:?} ihold={:?}", vsense, irun, ihold);
        self.update_chopconf(|r| r.set_vsense(vsense))?;
        self.update_ihold_irun(|r| {
            r.set_irun(irun);
            r.set_ihold(ihold);
        })
    }
}

/// TMC5160 with an external MOSFET stage and a global current scaler.
#[derive(Debug)]
pub struct Tmc5160<L> {
    spi: TmcSpi<L>,
}

impl<L: Transport> Tmc5160<L> {
    /// Wraps a link to a TMC5160.
    pub fn new(link: L, r_sense: f32) -> Self {
        Self {
            spi: TmcSpi::new(link, PartNumber::Tmc5160, r_sense),
        }
    }

    /// Scaler in `32..=256`; 256 is written as 0.
    fn global_scaler(&mut self, scaler: u16) -> Result<()> {
        if !(32..=256).contains(&scaler) {
            return Err(Error::InvalidValue);
        }
        #[allow(clippy::cast_possible_truncation)]
        let raw = (scaler % 256) as u8;
        self.spi.write_register(addr::GLOBAL_SCALER, u32::from(raw))?;
        self.spi.shadow.global_scaler = raw;
        Ok(())
    }
}

impl<L: Transport> TmcRegisters for Tmc5160<L> {
    type Link = L;

    fn part(&self) -> PartNumber {
        PartNumber::Tmc5160
    }

    fn spi(&self) -> &TmcSpi<L> {
        &self.spi
    }

    fn spi_mut(&mut self) -> &mut TmcSpi<L> {
        &mut self.spi
    }

    fn begin(&mut self) -> Result<()> {
        self.push_shadow()?;
        let raw = self.shadow().global_scaler;
        self.spi
            .write_register(addr::GLOBAL_SCALER, u32::from(raw))?;
        self.toff(POWER_UP_TOFF)?;
        self.tbl(POWER_UP_TBL)
    }

    fn rms_current(&mut self, milliamps: f32, hold_multiplier: f32) -> Result<()> {
        let (scaler, irun) = tmc5160_current(milliamps, self.r_sense());
        let ihold = hold_current(irun, hold_multiplier);
        debug!("TMC5160 scaler={:?} irun={:?} ihold={:?}", scaler, irun, ihold);
        self.global_scaler(scaler)?;
        self.update_ihold_irun(|r| {
            r.set_irun(irun);
            r.set_ihold(ihold);
        })
    }
}

/// The register protocol bound to a driver, picked once from the part number.
#[derive(Debug)]
pub enum Chip<L> {
    Tmc2130(Tmc2130<L>),
    Tmc5160(Tmc5160<L>),
}

impl<L: Transport> Chip<L> {
    /// Binds a link to the register set of `part`.
    #[must_use]
    pub fn new(part: PartNumber, link: L, r_sense: f32) -> Self {
        match part {
            PartNumber::Tmc2130 => Self::Tmc2130(Tmc2130::new(link, r_sense)),
            PartNumber::Tmc5160 => Self::Tmc5160(Tmc5160::new(link, r_sense)),
        }
    }
}

impl<L: Transport> TmcRegisters for Chip<L> {
    type Link = L;

    fn part(&self) -> PartNumber {
        match self {
            Self::Tmc2130(chip) => chip.part(),
            Self::Tmc5160(chip) => chip.part(),
        }
    }

    fn spi(&self) -> &TmcSpi<L> {
        match self {
            Self::Tmc2130(chip) => chip.spi(),
            Self::Tmc5160(chip) => chip.spi(),
        }
    }

    fn spi_mut(&mut self) -> &mut TmcSpi<L> {
        match self {
            Self::Tmc2130(chip) => chip.spi_mut(),
            Self::Tmc5160(chip) => chip.spi_mut(),
        }
    }

    fn begin(&mut self) -> Result<()> {
        match self {
            Self::Tmc2130(chip) => chip.begin(),
            Self::Tmc5160(chip) => chip.begin(),
        }
    }

    fn rms_current(&mut self, milliamps: f32, hold_multiplier: f32) -> Result<()> {
        match self {
            Self::Tmc2130(chip) => chip.rms_current(milliamps, hold_multiplier),
            Self::Tmc5160(chip) => chip.rms_current(milliamps, hold_multiplier),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    extern crate std;

    use std::vec::Vec;

    use super::*;

    /// Answers reads from a register file with the one-datagram delay of the real chip.
    struct Loopback {
        registers: [u32; 128],
        pending: u32,
        frames: Vec<[u8; DATAGRAM_LEN]>,
    }

    impl Default for Loopback {
        fn default() -> Self {
            Self {
                registers: [0; 128],
                pending: 0,
                frames: Vec::new(),
            }
        }
    }

    impl Transport for Loopback {
        fn begin(&mut self) -> Result<()> {
            Ok(())
        }

        fn deselect(&mut self) -> Result<()> {
            Ok(())
        }

        fn set_frequency(&mut self, _hz: u32) {}

        fn transfer(&mut self, frame: [u8; DATAGRAM_LEN]) -> Result<[u8; DATAGRAM_LEN]> {
            self.frames.push(frame);
            let [b0, b1, b2, b3] = self.pending.to_be_bytes();
            let address = usize::from(frame[0] & !WRITE_FLAG);
            let value = u32::from_be_bytes([frame[1], frame[2], frame[3], frame[4]]);
            if frame[0] & WRITE_FLAG != 0 {
                self.registers[address] = value;
            }
            self.pending = self.registers[address];
            Ok([0x08, b0, b1, b2, b3])
        }
    }

    fn written(chip: &mut Chip<Loopback>) -> Vec<(u8, u32)> {
        chip.link_mut()
            .frames
            .iter()
            .filter(|f| f[0] & WRITE_FLAG != 0)
            .map(|f| (f[0] & !WRITE_FLAG, u32::from_be_bytes([f[1], f[2], f[3], f[4]])))
            .collect()
    }

    #[test]
    fn test_write_datagram_layout() {
        let mut chip = Chip::new(PartNumber::Tmc2130, Loopback::default(), 0.11);
        chip.tcoolthrs(0x0001_2345).unwrap();
        assert_eq!(
            chip.link_mut().frames,
            vec![[0x94, 0x00, 0x01, 0x23, 0x45]]
        );
        assert_eq!(chip.shadow().tcoolthrs, 0x0001_2345);
    }

    #[test]
    fn test_read_sends_address_twice() {
        let mut link = Loopback::default();
        link.registers[usize::from(addr::TSTEP)] = 0x0F_FFFF;
        let mut chip = Chip::new(PartNumber::Tmc5160, link, 0.075);

        assert_eq!(chip.tstep().unwrap(), 0x0F_FFFF);
        assert_eq!(chip.link_mut().frames, vec![[0x12, 0, 0, 0, 0]; 2]);
        assert!(chip.status().standstill());
    }

    #[test]
    fn test_tmc2130_power_up_sequence() {
        let mut chip = Chip::new(PartNumber::Tmc2130, Loopback::default(), 0.11);
        chip.begin().unwrap();

        let writes = written(&mut chip);
        let addresses: Vec<u8> = writes.iter().map(|(a, _)| *a).collect();
        assert_eq!(
            addresses,
            vec![
                addr::GCONF,
                addr::CHOPCONF,
                addr::COOLCONF,
                addr::PWMCONF,
                addr::IHOLD_IRUN,
                addr::CHOPCONF,
                addr::CHOPCONF,
            ]
        );
        assert_eq!(writes[3].1, 0x0005_0480);
        assert_eq!(chip.shadow().chopconf.toff(), 8);
        assert_eq!(chip.shadow().chopconf.tbl(), 1);
    }

    #[test]
    fn test_tmc5160_power_up_writes_global_scaler() {
        let mut chip = Chip::new(PartNumber::Tmc5160, Loopback::default(), 0.075);
        chip.begin().unwrap();

        let writes = written(&mut chip);
        assert!(writes.contains(&(addr::GLOBAL_SCALER, 0)));
        assert_eq!(writes[1], (addr::CHOPCONF, 0x1041_0150));
        assert_eq!(writes[3], (addr::PWMCONF, 0xC40C_001E));
    }

    #[test]
    fn test_field_setters_validate() {
        let mut chip = Chip::new(PartNumber::Tmc2130, Loopback::default(), 0.11);
        assert_eq!(chip.toff(16), Err(Error::InvalidValue));
        assert_eq!(chip.tbl(4), Err(Error::InvalidValue));
        assert_eq!(chip.hysteresis_start(0), Err(Error::InvalidValue));
        assert_eq!(chip.hysteresis_end(13), Err(Error::InvalidValue));
        assert_eq!(chip.microsteps(3), Err(Error::InvalidValue));
        assert!(chip.link_mut().frames.is_empty());
    }

    #[test]
    fn test_hysteresis_encoding() {
        let mut chip = Chip::new(PartNumber::Tmc2130, Loopback::default(), 0.11);
        chip.hysteresis_start(4).unwrap();
        chip.hysteresis_end(-2).unwrap();
        assert_eq!(chip.shadow().chopconf.hstrt(), 3);
        assert_eq!(chip.shadow().chopconf.hend(), 1);
    }

    #[test]
    fn test_sgt_is_clamped() {
        let mut chip = Chip::new(PartNumber::Tmc2130, Loopback::default(), 0.11);
        chip.sgt(100).unwrap();
        assert_eq!(chip.shadow().coolconf.sgt(), 63);
        chip.sgt(-100).unwrap();
        assert_eq!(chip.shadow().coolconf.sgt(), -64);
    }

    #[test]
    fn test_threshold_is_limited_to_20_bits() {
        let mut chip = Chip::new(PartNumber::Tmc2130, Loopback::default(), 0.11);
        chip.thigh(u32::MAX).unwrap();
        assert_eq!(chip.shadow().thigh, TSTEP_MAX);
    }

    #[test]
    fn test_tmc2130_rms_current() {
        let mut chip = Chip::new(PartNumber::Tmc2130, Loopback::default(), 0.11);
        chip.rms_current(1000.0, 0.5).unwrap();
        let ihold_irun = chip.shadow().ihold_irun;
        assert_eq!(ihold_irun.irun(), 17);
        assert_eq!(ihold_irun.ihold(), 8);
        assert!(!chip.shadow().chopconf.vsense());
    }

    #[test]
    fn test_tmc5160_rms_current() {
        let mut chip = Chip::new(PartNumber::Tmc5160, Loopback::default(), 0.075);
        chip.rms_current(1000.0, 1.0).unwrap();
        assert_eq!(chip.shadow().global_scaler, 84);
        assert_eq!(chip.shadow().ihold_irun.irun(), 30);
        assert_eq!(chip.shadow().ihold_irun.ihold(), 30);
    }

    #[test]
    fn test_connection_status_reads_drv_status() {
        let mut link = Loopback::default();
        link.registers[usize::from(addr::DRV_STATUS)] = u32::MAX;
        let mut chip = Chip::new(PartNumber::Tmc2130, link, 0.11);
        assert_eq!(
            chip.test_connection().unwrap(),
            ConnectionStatus::NoConnection
        );
    }

    #[test]
    fn test_version_reads_ioin() {
        let mut link = Loopback::default();
        link.registers[usize::from(addr::IOIN)] = 0x3000_0051;
        let mut chip = Chip::new(PartNumber::Tmc5160, link, 0.075);

        assert_eq!(chip.version().unwrap(), 0x30);
        assert_eq!(chip.link_mut().frames, vec![[addr::IOIN, 0, 0, 0, 0]; 2]);
    }

    #[test]
    fn test_shadow_unchanged_when_write_fails() {
        struct Broken;

        impl Transport for Broken {
            fn begin(&mut self) -> Result<()> {
                Ok(())
            }

            fn deselect(&mut self) -> Result<()> {
                Ok(())
            }

            fn set_frequency(&mut self, _hz: u32) {}

            fn transfer(&mut self, _frame: [u8; DATAGRAM_LEN]) -> Result<[u8; DATAGRAM_LEN]> {
                Err(Error::BusBusy)
            }
        }

        let mut chip = Chip::new(PartNumber::Tmc2130, Broken, 0.11);
        assert_eq!(chip.toff(3), Err(Error::BusBusy));
        assert_eq!(chip.shadow().chopconf.toff(), 0);
    }
}
