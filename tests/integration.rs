//! Integration tests for the Trinamic driver lifecycle
//!
//! The chip is simulated by `test_utils::FakeChip`; assertions are made on the register
//! traffic and on the operator messages.


use test_utils::{TestContext, TestResult};
use trinamic_spi::chip::TmcRegisters;
use trinamic_spi::registers::{ChopConf, addr};
use trinamic_spi::{
    AxisConfig, Client, DEFAULT_SPI_FREQ, DriverPins, Error, Motor, MsgLevel, NullMotor,
    PartNumber, TRINAMIC_SPI_FREQ, VERSION,
};

#[test]
fn test_construct_reports_configuration() -> TestResult<()> {
    let ctx = TestContext::new();
    let driver = ctx.driver()?;

    assert_eq!(driver.part(), PartNumber::Tmc2130);
    assert!(!driver.is_active());
    assert_eq!(
        ctx.sink.texts(),
        vec!["X Axis Trinamic TMC2130 Step:GPIO(12) Dir:GPIO(14) CS:GPIO(17) Disable:GPIO(13) Index:-1"]
    );
    let message = ctx.sink.last().unwrap();
    assert_eq!((message.client, message.level), (Client::Serial, MsgLevel::Info));

    // chip select released, nothing on the wire yet
    assert_eq!(ctx.chip.state().deselected, 1);
    assert_eq!(ctx.chip.state().begun, 0);
    assert!(ctx.chip.writes().is_empty());
    assert_eq!(ctx.chip.state().frequency, DEFAULT_SPI_FREQ);
    Ok(())
}

#[test]
fn test_shift_register_chip_select_lowers_clock() -> TestResult<()> {
    let ctx = TestContext::new().with_config(|c| c.with_pins(DriverPins::from_raw(12, 14, 13, 130)));
    let _driver = ctx.driver()?;

    assert_eq!(ctx.chip.state().frequency, TRINAMIC_SPI_FREQ);
    assert!(ctx.sink.texts()[0].contains("CS:I2SO(2)"));
    Ok(())
}

#[test]
fn test_unsupported_part_is_rejected() {
    let mut ctx = TestContext::new();
    ctx.config.part_number = 2209;

    let result = ctx.driver();
    assert_eq!(result.err(), Some(Error::UnsupportedPart(2209)));

    let message = ctx.sink.last().unwrap();
    assert_eq!(message.level, MsgLevel::Error);
    assert_eq!(message.text, "Trinamic unsupported p/n:2209");
    assert_eq!(ctx.sink.len(), 1);
    assert_eq!(ctx.chip.state().deselected, 0);
}

#[test]
fn test_supported_parts_bind() -> TestResult<()> {
    for (raw, part) in [(2130, PartNumber::Tmc2130), (5160, PartNumber::Tmc5160)] {
        let mut ctx = TestContext::new();
        ctx.config.part_number = raw;
        assert_eq!(ctx.driver()?.part(), part);
    }
    Ok(())
}

#[test]
fn test_ganged_axis_name_and_settings() -> TestResult<()> {
    let ctx = TestContext::new()
        .with_config(|c| {
            let mut c = c.with_pins(DriverPins::default());
            c.axis_index = 7;
            c
        })
        .with_axis(1, AxisConfig::DEFAULT.with_microsteps(32));
    let mut driver = ctx.driver()?;

    assert_eq!(driver.axis_name().to_string(), "Y2");
    assert_eq!(
        ctx.sink.texts()[0],
        "Y2 Axis Trinamic TMC2130 Step:None Dir:None CS:None Disable:None Index:-1"
    );

    driver.init()?;
    assert_eq!(driver.chip().microsteps_setting(), 32);
    Ok(())
}

#[test]
fn test_init_lifecycle() -> TestResult<()> {
    let ctx = TestContext::new();
    let mut driver = ctx.driver()?;
    driver.init()?;

    assert!(driver.is_active());
    assert!(!driver.is_homing());
    assert_eq!(ctx.chip.state().begun, 1);

    let writes = ctx.chip.writes();
    let power_up: Vec<u8> = writes.iter().take(5).map(|(a, _)| *a).collect();
    assert_eq!(
        power_up,
        vec![
            addr::GCONF,
            addr::CHOPCONF,
            addr::COOLCONF,
            addr::PWMCONF,
            addr::IHOLD_IRUN
        ]
    );
    assert_eq!(writes[3].1, 0x0005_0480);

    assert!(
        ctx.sink
            .texts()
            .contains(&format!("X Trinamic driver test passed. trinamic-spi v{VERSION}"))
    );
    Ok(())
}

#[test]
fn test_init_continues_when_connection_fails() -> TestResult<()> {
    for (drv_status, hint) in [
        (0xFFFF_FFFF, "failed. Check connection."),
        (0x0000_0000, "failed. Check motor power."),
    ] {
        let ctx = TestContext::new();
        ctx.chip.set_register(addr::DRV_STATUS, drv_status);
        let mut driver = ctx.driver()?;

        assert!(!driver.test()?);
        driver.init()?;
        assert!(driver.is_active());
        assert!(
            ctx.sink
                .texts()
                .contains(&format!("X Trinamic driver test {hint} trinamic-spi v{VERSION}"))
        );
        // settings and mode are still programmed
        assert!(ctx.chip.last_write(addr::TCOOLTHRS).is_some());
    }
    Ok(())
}

#[test]
fn test_read_settings_programs_chip() -> TestResult<()> {
    let ctx = TestContext::new().with_axis(
        0,
        AxisConfig::DEFAULT
            .with_microsteps(16)
            .with_run_current(1.0)
            .with_hold_current(50.0)
            .with_stallguard(5),
    );
    let mut driver = ctx.ready_driver()?;
    driver.read_settings()?;

    let shadow = driver.chip().shadow();
    assert_eq!(shadow.chopconf.mres(), 4);
    assert_eq!(shadow.ihold_irun.irun(), 17);
    assert_eq!(shadow.ihold_irun.ihold(), 8);
    assert_eq!(shadow.coolconf.sgt(), 5);
    assert_eq!(
        ctx.chip.last_write(addr::IHOLD_IRUN),
        Some(u32::from(shadow.ihold_irun))
    );
    Ok(())
}

#[test]
fn test_read_settings_is_repeatable() -> TestResult<()> {
    let ctx = TestContext::new();
    let mut driver = ctx.ready_driver()?;

    driver.read_settings()?;
    let first = ctx.chip.writes();
    ctx.chip.clear_writes();
    driver.read_settings()?;

    assert_eq!(ctx.chip.writes(), first);
    Ok(())
}

#[test]
fn test_bad_microsteps_warns_and_continues() -> TestResult<()> {
    let ctx = TestContext::new().with_axis(0, AxisConfig::DEFAULT.with_microsteps(3));
    let mut driver = ctx.ready_driver()?;
    driver.read_settings()?;

    let warning = ctx.sink.last().unwrap();
    assert_eq!(warning.level, MsgLevel::Warning);
    assert_eq!(warning.text, "X Axis unsupported microsteps:3");
    assert!(ctx.chip.last_write(addr::IHOLD_IRUN).is_some());
    assert!(ctx.chip.last_write(addr::COOLCONF).is_some());
    Ok(())
}

#[test]
fn test_tmc5160_init_programs_global_scaler() -> TestResult<()> {
    let mut ctx = TestContext::new();
    ctx.config.part_number = 5160;
    let mut driver = ctx.driver()?;
    driver.init()?;

    assert_eq!(ctx.chip.writes_to(addr::GLOBAL_SCALER), vec![0, 84]);
    assert_eq!(driver.chip().shadow().ihold_irun.irun(), 30);
    assert_eq!(
        ctx.chip.writes()[1],
        (addr::CHOPCONF, 0x1041_0150),
        "reset CHOPCONF is written first"
    );
    Ok(())
}

#[test]
fn test_disable_pin_without_soft_disable() -> TestResult<()> {
    let ctx = TestContext::new();
    let mut driver = ctx.ready_driver()?;

    driver.set_disable(true)?;
    assert_eq!(ctx.disable.is_high(), Some(true));
    driver.set_disable(false)?;
    assert_eq!(ctx.disable.is_high(), Some(false));

    assert_eq!(ctx.disable.levels(), vec![true, false]);
    assert!(ctx.chip.writes().is_empty());
    Ok(())
}

#[test]
fn test_soft_disable_switches_chopper() -> TestResult<()> {
    let ctx = TestContext::new().with_config(|c| c.with_soft_disable(true));
    let mut driver = ctx.ready_driver()?;

    driver.set_disable(true)?;
    assert_eq!(ctx.disable.is_high(), Some(true));
    let writes = ctx.chip.writes();
    assert_eq!(writes.len(), 1);
    assert_eq!(writes[0].0, addr::CHOPCONF);
    assert_eq!(ChopConf::from(writes[0].1).toff(), 0);

    ctx.chip.clear_writes();
    driver.set_disable(false)?;
    assert_eq!(ctx.disable.is_high(), Some(false));
    let enable_writes = ctx.chip.writes();

    ctx.chip.clear_writes();
    driver.set_mode()?;
    let addresses = |writes: &[(u8, u32)]| writes.iter().map(|(a, _)| *a).collect::<Vec<_>>();
    assert_eq!(addresses(&enable_writes), addresses(&ctx.chip.writes()));
    assert_eq!(driver.chip().shadow().chopconf.toff(), 3);
    Ok(())
}

#[test]
fn test_motor_slots() -> TestResult<()> {
    let ctx = TestContext::new();
    let mut driver = ctx.driver()?;
    let mut empty = NullMotor;

    let mut motors: [&mut dyn Motor; 2] = [&mut driver, &mut empty];
    for motor in &mut motors {
        motor.init()?;
        motor.set_homing_mode(false)?;
        motor.debug_message()?;
    }

    assert!(motors[0].is_active());
    assert!(!motors[1].is_active());
    Ok(())
}
