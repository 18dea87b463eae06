//! Lifecycle hooks called by the motor management layer.

use crate::Result;

/// A motor slot on the machine.
///
/// Every hook has a no-op default so unused axes can be filled with [`NullMotor`].
pub trait Motor {
    /// Starts communication and programs the driver. Called once, after every
    /// motor has been constructed.
    fn init(&mut self) -> Result<()> {
        Ok(())
    }

    /// Reports the pin and part assignment.
    fn config_message(&mut self) {}

    /// Connection self test; `Ok(false)` means the driver answered badly.
    fn test(&mut self) -> Result<bool> {
        Ok(true)
    }

    /// Pulls the axis settings into the driver again.
    fn read_settings(&mut self) -> Result<()> {
        Ok(())
    }

    fn set_homing_mode(&mut self, _is_homing: bool) -> Result<()> {
        Ok(())
    }

    /// `true` disables the motor.
    fn set_disable(&mut self, _disable: bool) -> Result<()> {
        Ok(())
    }

    /// Periodic tuning report.
    fn debug_message(&mut self) -> Result<()> {
        Ok(())
    }

    fn is_active(&self) -> bool {
        false
    }
}

/// Placeholder for an axis without a motor.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct NullMotor;

impl Motor for NullMotor {}
