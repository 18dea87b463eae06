//! Per-axis motor settings the configurator reads but never writes.

use crate::MAX_AXES;

/// Read-only view of the machine settings store.
pub trait AxisSettings {
    /// Microsteps per full step.
    fn microsteps(&self, axis: u8) -> u16;

    /// RMS run current in amps.
    fn run_current(&self, axis: u8) -> f32;

    /// Hold current as a percentage of the run current.
    fn hold_current(&self, axis: u8) -> f32;

    /// StallGuard threshold.
    fn stallguard(&self, axis: u8) -> i8;

    fn steps_per_mm(&self, axis: u8) -> f32;

    /// Feed rate used while homing, in mm/min.
    fn homing_feed_rate(&self) -> f32;
}

/// Settings of one axis.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AxisConfig {
    pub microsteps: u16,
    pub run_current: f32,
    pub hold_current: f32,
    pub stallguard: i8,
    pub steps_per_mm: f32,
}

impl AxisConfig {
    pub const DEFAULT: Self = Self {
        microsteps: 16,
        run_current: 0.25,
        hold_current: 25.0,
        stallguard: 16,
        steps_per_mm: 100.0,
    };

    #[must_use]
    pub const fn with_microsteps(mut self, microsteps: u16) -> Self {
        self.microsteps = microsteps;
        self
    }

    #[must_use]
    pub const fn with_run_current(mut self, amps: f32) -> Self {
        self.run_current = amps;
        self
    }

    #[must_use]
    pub const fn with_hold_current(mut self, percent: f32) -> Self {
        self.hold_current = percent;
        self
    }

    #[must_use]
    pub const fn with_stallguard(mut self, threshold: i8) -> Self {
        self.stallguard = threshold;
        self
    }

    #[must_use]
    pub const fn with_steps_per_mm(mut self, steps_per_mm: f32) -> Self {
        self.steps_per_mm = steps_per_mm;
        self
    }
}

impl Default for AxisConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Fixed-size settings store, one entry per axis.
///
/// Axes past the end of the table read as [`AxisConfig::DEFAULT`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SettingsTable<const N: usize = { MAX_AXES as usize }> {
    pub axes: [AxisConfig; N],
    pub homing_feed_rate: f32,
}

impl<const N: usize> SettingsTable<N> {
    pub const DEFAULT_HOMING_FEED_RATE: f32 = 200.0;

    #[must_use]
    pub const fn new() -> Self {
        Self {
            axes: [AxisConfig::DEFAULT; N],
            homing_feed_rate: Self::DEFAULT_HOMING_FEED_RATE,
        }
    }

    #[must_use]
    pub const fn with_homing_feed_rate(mut self, mm_per_min: f32) -> Self {
        self.homing_feed_rate = mm_per_min;
        self
    }

    /// Replaces the entry of `axis`; out of range axes are ignored.
    #[must_use]
    pub fn with_axis(mut self, axis: u8, config: AxisConfig) -> Self {
        if let Some(slot) = self.axes.get_mut(usize::from(axis)) {
            *slot = config;
        }
        self
    }

    #[must_use]
    pub fn axis(&self, axis: u8) -> AxisConfig {
        self.axes
            .get(usize::from(axis))
            .copied()
            .unwrap_or(AxisConfig::DEFAULT)
    }
}

impl<const N: usize> Default for SettingsTable<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> AxisSettings for SettingsTable<N> {
    fn microsteps(&self, axis: u8) -> u16 {
        self.axis(axis).microsteps
    }

    fn run_current(&self, axis: u8) -> f32 {
        self.axis(axis).run_current
    }

    fn hold_current(&self, axis: u8) -> f32 {
        self.axis(axis).hold_current
    }

    fn stallguard(&self, axis: u8) -> i8 {
        self.axis(axis).stallguard
    }

    fn steps_per_mm(&self, axis: u8) -> f32 {
        self.axis(axis).steps_per_mm
    }

    fn homing_feed_rate(&self) -> f32 {
        self.homing_feed_rate
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let table = SettingsTable::<6>::default();
        assert_eq!(table.microsteps(0), 16);
        assert_eq!(table.run_current(3), 0.25);
        assert_eq!(table.hold_current(5), 25.0);
        assert_eq!(table.homing_feed_rate(), 200.0);
    }

    #[test]
    fn test_per_axis_override() {
        let table = SettingsTable::<6>::new()
            .with_axis(
                1,
                AxisConfig::DEFAULT
                    .with_microsteps(32)
                    .with_steps_per_mm(80.0),
            )
            .with_homing_feed_rate(600.0);

        assert_eq!(table.microsteps(1), 32);
        assert_eq!(table.steps_per_mm(1), 80.0);
        assert_eq!(table.microsteps(0), 16);
        assert_eq!(table.homing_feed_rate(), 600.0);
    }

    #[test]
    fn test_out_of_range_axis_reads_defaults() {
        let table = SettingsTable::<2>::new().with_axis(5, AxisConfig::DEFAULT.with_stallguard(-5));
        assert_eq!(table.stallguard(5), AxisConfig::DEFAULT.stallguard);
        assert_eq!(table.axis(9), AxisConfig::DEFAULT);
    }
}
