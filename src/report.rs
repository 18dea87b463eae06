//! Operator-facing report channel.

use core::fmt;

use crate::enums::{Client, MsgLevel};

/// Receives formatted operator messages. Delivery is fire-and-forget.
pub trait MessageSink {
    fn send(&self, client: Client, level: MsgLevel, args: fmt::Arguments<'_>);
}

/// A sink that drops everything.
impl MessageSink for () {
    fn send(&self, _client: Client, _level: MsgLevel, _args: fmt::Arguments<'_>) {}
}

/// Source of the current machine feed rate, in mm/min.
pub trait RealtimeRate {
    fn realtime_rate(&self) -> f32;
}

impl<F> RealtimeRate for F
where
    F: Fn() -> f32,
{
    fn realtime_rate(&self) -> f32 {
        self()
    }
}
