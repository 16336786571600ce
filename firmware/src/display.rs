use core::fmt::Write as _;

use embedded_hal::blocking::delay::{DelayMs, DelayUs};
use hd44780_driver::{
    bus::I2CBus, error::Error as LcdError, Cursor, CursorBlink, Display, DisplayMode, HD44780,
};
use heapless::String;
use nrf52840_hal::{
    twim::{Frequency, Instance, Pins},
    Twim,
};
use smartpark_core::{config::NUM_CHANNELS, LotSummary, SlotState};

/// Start of the second panel line in DDRAM.
const LINE_2: u8 = 0x40;

/// 16x2 character panel behind a PCF8574 I2C backpack.
pub struct LotDisplay<T: Instance, D> {
    lcd: HD44780<I2CBus<Twim<T>>>,
    delay: D,
}

impl<T, D> LotDisplay<T, D>
where
    T: Instance,
    D: DelayUs<u16> + DelayMs<u8>,
{
    pub fn new(twim: T, pins: Pins, address: u8, mut delay: D) -> Result<Self, LcdError> {
        let twim = Twim::new(twim, pins, Frequency::K100);
        let mut lcd = HD44780::new_i2c(twim, address, &mut delay)?;
        lcd.reset(&mut delay)?;
        lcd.clear(&mut delay)?;
        lcd.set_display_mode(
            DisplayMode {
                display: Display::On,
                cursor_visibility: Cursor::Invisible,
                cursor_blink: CursorBlink::Off,
            },
            &mut delay,
        )?;
        Ok(Self { lcd, delay })
    }

    pub fn splash(&mut self) -> Result<(), LcdError> {
        self.lcd.clear(&mut self.delay)?;
        self.lcd.set_cursor_pos(0, &mut self.delay)?;
        self.lcd.write_str("SmartPark System", &mut self.delay)?;
        self.lcd.set_cursor_pos(LINE_2, &mut self.delay)?;
        self.lcd.write_str("6 Sensors Active", &mut self.delay)
    }

    /// Repaints the panel from the current classifications: the full-lot
    /// banner, or one cell per slot spread across the two lines.
    pub fn render(
        &mut self,
        states: &[SlotState; NUM_CHANNELS],
        summary: &LotSummary<NUM_CHANNELS>,
    ) -> Result<(), LcdError> {
        self.lcd.clear(&mut self.delay)?;
        if summary.full {
            self.lcd.set_cursor_pos(2, &mut self.delay)?;
            self.lcd.write_str("FULL PARKING", &mut self.delay)?;
            self.lcd.set_cursor_pos(LINE_2 + 3, &mut self.delay)?;
            self.lcd.write_str("NO SPACES", &mut self.delay)?;
            return Ok(());
        }

        self.lcd.set_cursor_pos(0, &mut self.delay)?;
        self.lcd
            .write_str(&slot_cells(&states[..3], 0), &mut self.delay)?;
        self.lcd.set_cursor_pos(LINE_2, &mut self.delay)?;
        self.lcd
            .write_str(&slot_cells(&states[3..], 3), &mut self.delay)
    }
}

fn slot_glyph(state: SlotState) -> char {
    match state {
        SlotState::Empty => '0',
        SlotState::Occupied => '1',
        SlotState::Error => 'E',
    }
}

/// One panel line, e.g. `P3:0 P4:1 P5:E`.
fn slot_cells(states: &[SlotState], first_slot: usize) -> String<16> {
    let mut line = String::new();
    for (offset, state) in states.iter().enumerate() {
        if offset > 0 {
            let _ = line.push(' ');
        }
        let _ = write!(line, "P{}:{}", first_slot + offset, slot_glyph(*state));
    }
    line
}
