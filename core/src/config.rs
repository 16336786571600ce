/// Number of sensing channels wired to the unit.
pub const NUM_CHANNELS: usize = 6;

/// Free-running counter ticks per microsecond (0.5 µs per tick).
pub const TICKS_PER_US: u32 = 2;
/// Round-trip travel time of sound, in microseconds per centimeter.
pub const US_PER_CM: u32 = 58;

/// Shortest distance the sensors resolve reliably, in centimeters.
pub const MIN_DISTANCE_CM: u16 = 2;
/// Longest distance the sensors resolve reliably, in centimeters.
pub const MAX_DISTANCE_CM: u16 = 400;

/// A slot reading at or below this distance counts as a car.
pub const DETECTION_THRESHOLD_CM: u16 = 10;
/// Consecutive agreeing cycles required before a slot changes state.
pub const CONFIDENCE_THRESHOLD: u8 = 3;

/// Width of the activation pulse on a trigger line, in microseconds.
pub const TRIGGER_PULSE_US: u32 = 10;

/// Poll rounds (1 µs apart) before the shared all-channel wait gives up.
pub const SHARED_TIMEOUT_POLLS: u32 = 10_000;
/// Pause between poll rounds in the shared wait, in microseconds.
pub const SHARED_POLL_PAUSE_US: u32 = 1;

/// Poll rounds (10 µs apart) before a single channel's wait gives up.
pub const CHANNEL_TIMEOUT_POLLS: u32 = 3_000;
/// Pause between poll rounds in a per-channel wait, in microseconds.
pub const CHANNEL_POLL_PAUSE_US: u32 = 10;

/// Pause after each channel in sequential mode, letting residual echoes
/// decay before the next channel fires.
pub const SETTLE_DELAY_US: u32 = 15_000;

/// Pause between measurement cycles, in milliseconds.
pub const CYCLE_PERIOD_MS: u32 = 150;

/// Cycles between unconditional display repaints (~10 s at the cycle period).
pub const FORCED_REFRESH_CYCLES: u8 = 67;
