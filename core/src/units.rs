use crate::config::{MAX_DISTANCE_CM, MIN_DISTANCE_CM, TICKS_PER_US, US_PER_CM};

/// A validated range reading, in centimeters.
///
/// `Invalid` covers every way a cycle can fail to produce a usable echo:
/// timeout, a reading outside the sensor's band, or a dead line. It is never
/// forwarded downstream as a real distance.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt_print", derive(defmt::Format))]
pub enum Distance {
    #[default]
    Invalid,
    Valid(u16),
}

impl Distance {
    pub fn cm(self) -> Option<u16> {
        match self {
            Distance::Valid(cm) => Some(cm),
            Distance::Invalid => None,
        }
    }

    pub fn is_valid(self) -> bool {
        matches!(self, Distance::Valid(_))
    }

    /// Raw-signal check: a valid echo at or inside `threshold_cm`.
    pub fn within(self, threshold_cm: u16) -> bool {
        matches!(self, Distance::Valid(cm) if cm <= threshold_cm)
    }
}

/// Width of a latched pulse in counter ticks.
///
/// The counter free-runs and wraps; a pulse spanning at most one wrap is
/// recovered as `(max - start) + end`. Pulses long enough to wrap twice are
/// caught by the timeout path before they get here.
pub fn pulse_ticks(start: u16, end: u16) -> u32 {
    if end >= start {
        (end - start) as u32
    } else {
        (u16::MAX - start) as u32 + end as u32
    }
}

pub fn ticks_to_us(ticks: u32) -> u32 {
    ticks / TICKS_PER_US
}

/// Converts a latched pulse to a distance, rejecting readings outside the
/// sensor's usable band as artifacts.
pub fn distance_from_pulse(start: u16, end: u16) -> Distance {
    let us = ticks_to_us(pulse_ticks(start, end));
    let cm = us / US_PER_CM;
    if cm < MIN_DISTANCE_CM as u32 || cm > MAX_DISTANCE_CM as u32 {
        Distance::Invalid
    } else {
        Distance::Valid(cm as u16)
    }
}
