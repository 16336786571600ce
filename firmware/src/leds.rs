use embedded_hal::blocking::delay::DelayMs;
use embedded_hal::digital::v2::OutputPin;
use nrf52840_hal::gpio::{Output, Pin, PushPull};

use smartpark_core::{
    config::{DETECTION_THRESHOLD_CM, NUM_CHANNELS},
    units::Distance,
};

/// One indicator LED per bay, driven from the raw readings before any
/// debouncing. The panel shows the debounced truth; these show the live
/// signal.
pub struct LedBank {
    pins: [Pin<Output<PushPull>>; NUM_CHANNELS],
}

impl LedBank {
    pub fn new(pins: [Pin<Output<PushPull>>; NUM_CHANNELS]) -> Self {
        Self { pins }
    }

    pub fn show(&mut self, readings: &[Distance; NUM_CHANNELS]) {
        for (pin, reading) in self.pins.iter_mut().zip(readings) {
            if reading.within(DETECTION_THRESHOLD_CM) {
                pin.set_high().ok();
            } else {
                pin.set_low().ok();
            }
        }
    }

    /// Power-on blink so a dead LED is obvious before the unit starts.
    pub fn test_pattern(&mut self, delay: &mut impl DelayMs<u16>) {
        for _ in 0..2 {
            for pin in &mut self.pins {
                pin.set_high().ok();
            }
            delay.delay_ms(300);
            for pin in &mut self.pins {
                pin.set_low().ok();
            }
            delay.delay_ms(150);
        }
    }
}
