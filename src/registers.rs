//! Register layouts shared by the TMC2130 and TMC5160.
//!
//! Bits whose meaning differs between the two parts are named after the TMC2130 and
//! left untouched by the configurator.

use bitfield_struct::bitfield;

/// Largest value of the 20-bit velocity threshold registers.
pub const TSTEP_MAX: u32 = 0xF_FFFF;

/// Register addresses.
pub mod addr {
    pub const GCONF: u8 = 0x00;
    pub const IOIN: u8 = 0x04;
    pub const GLOBAL_SCALER: u8 = 0x0B;
    pub const IHOLD_IRUN: u8 = 0x10;
    pub const TSTEP: u8 = 0x12;
    pub const TCOOLTHRS: u8 = 0x14;
    pub const THIGH: u8 = 0x15;
    pub const CHOPCONF: u8 = 0x6C;
    pub const COOLCONF: u8 = 0x6D;
    pub const DRV_STATUS: u8 = 0x6F;
    pub const PWMCONF: u8 = 0x70;
}

/// Write flag in the address byte of a datagram.
pub const WRITE_FLAG: u8 = 0x80;

pub trait Register: From<u32> + Into<u32> + Copy {
    const ADDRESS: u8;
}

macro_rules! register {
    ($name:ident, $addr:expr) => {
        impl Register for $name {
            const ADDRESS: u8 = $addr;
        }
    };
}

#[bitfield(u32)]
#[derive(PartialEq, Eq)]
pub struct GConf {
    #[bits(2)]
    __: u8,

    #[bits(1)]
    pub en_pwm_mode: bool,

    #[bits(1)]
    __: u8,

    #[bits(1)]
    pub shaft: bool,

    #[bits(1)]
    pub diag0_error: bool,

    #[bits(1)]
    pub diag0_otpw: bool,

    #[bits(1)]
    pub diag0_stall: bool,

    #[bits(1)]
    pub diag1_stall: bool,

    #[bits(1)]
    pub diag1_index: bool,

    #[bits(1)]
    pub diag1_onstate: bool,

    #[bits(1)]
    pub diag1_steps_skipped: bool,

    #[bits(1)]
    pub diag0_int_pushpull: bool,

    #[bits(1)]
    pub diag1_pushpull: bool,

    #[bits(1)]
    pub small_hysteresis: bool,

    #[bits(1)]
    pub stop_enable: bool,

    #[bits(1)]
    pub direct_mode: bool,

    #[bits(15)]
    __: u16,
}

register!(GConf, addr::GCONF);

#[bitfield(u32)]
#[derive(PartialEq, Eq)]
pub struct IHoldIRun {
    #[bits(5)]
    pub ihold: u8,

    #[bits(3)]
    __: u8,

    #[bits(5)]
    pub irun: u8,

    #[bits(3)]
    __: u8,

    #[bits(4)]
    pub ihold_delay: u8,

    #[bits(12)]
    __: u16,
}

register!(IHoldIRun, addr::IHOLD_IRUN);

#[bitfield(u32)]
#[derive(PartialEq, Eq)]
pub struct ChopConf {
    #[bits(4)]
    pub toff: u8,

    #[bits(3)]
    pub hstrt: u8,

    #[bits(4)]
    pub hend: u8,

    #[bits(1)]
    pub fd3: bool,

    #[bits(1)]
    pub disfdcc: bool,

    #[bits(1)]
    pub rndtf: bool,

    #[bits(1)]
    pub chm: bool,

    #[bits(2)]
    pub tbl: u8,

    /// TMC2130 only; reserved on the TMC5160.
    #[bits(1)]
    pub vsense: bool,

    #[bits(1)]
    pub vhighfs: bool,

    #[bits(1)]
    pub vhighchm: bool,

    #[bits(4)]
    pub sync: u8,

    #[bits(4)]
    pub mres: u8,

    #[bits(1)]
    pub intpol: bool,

    #[bits(1)]
    pub dedge: bool,

    #[bits(1)]
    pub diss2g: bool,

    #[bits(1)]
    pub diss2vs: bool,
}

register!(ChopConf, addr::CHOPCONF);

#[bitfield(u32)]
#[derive(PartialEq, Eq)]
pub struct CoolConf {
    #[bits(4)]
    pub semin: u8,

    #[bits(1)]
    __: u8,

    #[bits(2)]
    pub seup: u8,

    #[bits(1)]
    __: u8,

    #[bits(4)]
    pub semax: u8,

    #[bits(1)]
    __: u8,

    #[bits(2)]
    pub sedn: u8,

    #[bits(1)]
    pub seimin: bool,

    #[bits(7)]
    pub sgt: i8,

    #[bits(1)]
    __: u8,

    #[bits(1)]
    pub sfilt: bool,

    #[bits(7)]
    __: u8,
}

register!(CoolConf, addr::COOLCONF);

#[bitfield(u32)]
#[derive(PartialEq, Eq)]
pub struct PwmConf {
    #[bits(8)]
    pub pwm_ofs: u8,

    #[bits(8)]
    pub pwm_grad: u8,

    #[bits(2)]
    pub pwm_freq: u8,

    #[bits(1)]
    pub pwm_autoscale: bool,

    #[bits(1)]
    pub pwm_autograd: bool,

    #[bits(2)]
    pub freewheel: u8,

    #[bits(2)]
    __: u8,

    #[bits(4)]
    pub pwm_reg: u8,

    #[bits(4)]
    pub pwm_lim: u8,
}

register!(PwmConf, addr::PWMCONF);

#[bitfield(u32)]
#[derive(PartialEq, Eq)]
pub struct DrvStatus {
    #[bits(10)]
    pub sg_result: u16,

    #[bits(5)]
    __: u8,

    #[bits(1)]
    pub fsactive: bool,

    #[bits(5)]
    pub cs_actual: u8,

    #[bits(3)]
    __: u8,

    #[bits(1)]
    pub stallguard: bool,

    #[bits(1)]
    pub ot: bool,

    #[bits(1)]
    pub otpw: bool,

    #[bits(1)]
    pub s2ga: bool,

    #[bits(1)]
    pub s2gb: bool,

    #[bits(1)]
    pub ola: bool,

    #[bits(1)]
    pub olb: bool,

    #[bits(1)]
    pub stst: bool,
}

register!(DrvStatus, addr::DRV_STATUS);

#[bitfield(u32)]
#[derive(PartialEq, Eq)]
pub struct IoIn {
    #[bits(24)]
    pub pins: u32,

    #[bits(8)]
    pub version: u8,
}

register!(IoIn, addr::IOIN);
