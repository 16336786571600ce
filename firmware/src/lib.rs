#![no_std]

use core::sync::atomic::{AtomicUsize, Ordering};

use defmt_rtt as _; // global logger

use panic_probe as _;

pub mod consts {
    use smartpark_core::config::CYCLE_PERIOD_MS;
    use smartpark_core::TriggerPolicy;

    /// CPU clock, which also drives the cycle-count monotonic.
    pub const CPU_FREQ_HZ: u32 = 64_000_000;

    /// Pause between measurement cycles, in monotonic clock cycles.
    pub const CYCLE_PERIOD_CYCLES: u32 = (CPU_FREQ_HZ / 1_000) * CYCLE_PERIOD_MS;

    /// TIMER prescaler for the echo tick counter: 16 MHz / 2^3 = 2 MHz,
    /// one tick every 0.5 µs.
    pub const TICK_PRESCALER: u8 = 3;

    /// I2C address of the PCF8574 backpack behind the character panel.
    pub const LCD_ADDR: u8 = 0x27;

    /// Triggering mode baked in at build time.
    pub const TRIGGER_POLICY: TriggerPolicy = if cfg!(feature = "simultaneous") {
        TriggerPolicy::Simultaneous
    } else {
        TriggerPolicy::Sequential
    };
}

#[cfg(feature = "display")]
pub mod display;
#[cfg(feature = "leds")]
pub mod leds;
pub mod sonar_array;

/// Workaround for RTIC not being able to
/// conditionally compile resources
pub mod stubs {
    use core::marker::PhantomData;

    use smartpark_core::{config::NUM_CHANNELS, Distance, LotSummary, SlotState};

    pub struct LotDisplay<T, D>(PhantomData<(T, D)>);

    impl<T, D> LotDisplay<T, D> {
        pub fn disconnected() -> Self {
            Self(PhantomData)
        }

        pub fn splash(&mut self) -> Result<(), ()> {
            Ok(())
        }

        pub fn render(
            &mut self,
            _states: &[SlotState; NUM_CHANNELS],
            _summary: &LotSummary<NUM_CHANNELS>,
        ) -> Result<(), ()> {
            Ok(())
        }
    }

    pub struct LedBank;

    impl LedBank {
        pub fn show(&mut self, _readings: &[Distance; NUM_CHANNELS]) {}
    }
}

// same panicking *behavior* as `panic-probe` but doesn't print a panic message
// this prevents the panic message being printed *twice* when `defmt::panic` is invoked
#[defmt::panic_handler]
fn panic() -> ! {
    cortex_m::asm::udf()
}

static COUNT: AtomicUsize = AtomicUsize::new(0);
defmt::timestamp!("{=usize}", {
    // NOTE(no-CAS) `timestamps` runs with interrupts disabled
    let n = COUNT.load(Ordering::Relaxed);
    COUNT.store(n + 1, Ordering::Relaxed);
    n
});

/// Terminates the application and makes `probe-run` exit with exit-code = 0
pub fn exit() -> ! {
    loop {
        cortex_m::asm::bkpt();
    }
}
