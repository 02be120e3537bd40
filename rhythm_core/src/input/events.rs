use crate::Millis;

use super::LaneBindings;

/// A key-down already resolved to a lane.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputEvent {
    pub lane: u8,
    /// Song time at which the press was observed.
    pub time_ms: Millis,
}

impl InputEvent {
    pub fn new(lane: u8, time_ms: Millis) -> Self {
        Self { lane, time_ms }
    }

    /// None for keys that are not bound to a lane.
    pub fn from_key(bindings: &LaneBindings, key: char, time_ms: Millis) -> Option<Self> {
        Some(Self {
            lane: bindings.lane_for(key)?,
            time_ms,
        })
    }
}
