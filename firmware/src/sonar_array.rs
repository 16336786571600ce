use embedded_hal::digital::v2::{InputPin, OutputPin};
use embedded_hal::timer::CountDown;
use nrf52840_hal::{
    gpio::{Floating, Input, Output, Pin, PushPull},
    gpiote::Gpiote,
    timer::{Instance, OneShot, Periodic},
    Timer,
};
use rtic::Mutex;

use smartpark_core::{
    config::{NUM_CHANNELS, TRIGGER_PULSE_US},
    cycle::SonarChannels,
    ranging::EchoBank,
    units::Distance,
};

use crate::consts::TICK_PRESCALER;

/// One trigger output and one echo input per bay, in wiring order.
pub struct Pins {
    pub trig1: Pin<Output<PushPull>>,
    pub trig2: Pin<Output<PushPull>>,
    pub trig3: Pin<Output<PushPull>>,
    pub trig4: Pin<Output<PushPull>>,
    pub trig5: Pin<Output<PushPull>>,
    pub trig6: Pin<Output<PushPull>>,
    pub echo1: Pin<Input<Floating>>,
    pub echo2: Pin<Input<Floating>>,
    pub echo3: Pin<Input<Floating>>,
    pub echo4: Pin<Input<Floating>>,
    pub echo5: Pin<Input<Floating>>,
    pub echo6: Pin<Input<Floating>>,
}

impl Pins {
    #[allow(clippy::type_complexity)]
    pub fn split(
        self,
    ) -> (
        [Pin<Output<PushPull>>; NUM_CHANNELS],
        [Pin<Input<Floating>>; NUM_CHANNELS],
    ) {
        (
            [
                self.trig1, self.trig2, self.trig3, self.trig4, self.trig5, self.trig6,
            ],
            [
                self.echo1, self.echo2, self.echo3, self.echo4, self.echo5, self.echo6,
            ],
        )
    }
}

/// The trigger outputs plus the timer used for the activation pulse and the
/// bounded in-cycle pauses. Thread context only.
pub struct TriggerBank<T: Instance> {
    pins: [Pin<Output<PushPull>>; NUM_CHANNELS],
    timer: Timer<T, OneShot>,
}

impl<T: Instance> TriggerBank<T> {
    pub fn new(pins: [Pin<Output<PushPull>>; NUM_CHANNELS], timer: Timer<T, OneShot>) -> Self {
        Self { pins, timer }
    }

    /// 10 µs activation pulse on one trigger line.
    pub fn pulse(&mut self, ch: usize) {
        if let Some(pin) = self.pins.get_mut(ch) {
            pin.set_high().ok();
            wait_us(&mut self.timer, TRIGGER_PULSE_US);
            pin.set_low().ok();
        }
    }

    /// One shared activation pulse across every trigger line.
    pub fn pulse_all(&mut self) {
        for pin in &mut self.pins {
            pin.set_high().ok();
        }
        wait_us(&mut self.timer, TRIGGER_PULSE_US);
        for pin in &mut self.pins {
            pin.set_low().ok();
        }
    }

    pub fn wait_us(&mut self, us: u32) {
        wait_us(&mut self.timer, us);
    }
}

fn wait_us<T: Instance>(timer: &mut Timer<T, OneShot>, us: u32) {
    timer.start(us);
    nb::block!(timer.wait()).ok();
}

/// The echo inputs, their shared edge-event unit and the free-running tick
/// counter the edge interrupt samples.
///
/// All six lines raise the same GPIOTE interrupt; the composite level
/// snapshot read here is what the bank diffs to work out which lines moved.
pub struct EchoLines<T: Instance> {
    pins: [Pin<Input<Floating>>; NUM_CHANNELS],
    gpiote: Gpiote,
    timer: T,
}

impl<T: Instance> EchoLines<T> {
    pub fn new(
        pins: [Pin<Input<Floating>>; NUM_CHANNELS],
        gpiote: Gpiote,
        tick_timer: Timer<T, Periodic>,
    ) -> Self {
        // Every echo line on its own event channel, both edges, one shared
        // interrupt.
        gpiote.channel0().input_pin(&pins[0]).toggle().enable_interrupt();
        gpiote.channel1().input_pin(&pins[1]).toggle().enable_interrupt();
        gpiote.channel2().input_pin(&pins[2]).toggle().enable_interrupt();
        gpiote.channel3().input_pin(&pins[3]).toggle().enable_interrupt();
        gpiote.channel4().input_pin(&pins[4]).toggle().enable_interrupt();
        gpiote.channel5().input_pin(&pins[5]).toggle().enable_interrupt();

        // Reconfigure the HAL timer as the free-running pulse-width counter:
        // 16-bit, 2 MHz (0.5 µs per tick), no compare behavior.
        let timer = tick_timer.free();
        let block = timer.as_timer0();
        block.tasks_stop.write(|w| w.tasks_stop().set_bit());
        block.shorts.reset();
        block.intenclr.write(|w| w.compare0().set_bit());
        block.mode.write(|w| w.mode().timer());
        block.bitmode.write(|w| w.bitmode()._16bit());
        block
            .prescaler
            .write(|w| unsafe { w.prescaler().bits(TICK_PRESCALER) });
        block.tasks_clear.write(|w| w.tasks_clear().set_bit());
        block.tasks_start.write(|w| w.tasks_start().set_bit());

        Self {
            pins,
            gpiote,
            timer,
        }
    }

    /// Latches the composite line levels and the current tick, clearing the
    /// pending edge events first so a line moving mid-read re-raises the
    /// interrupt. Interrupt context.
    pub fn sample(&mut self) -> (u8, u16) {
        self.gpiote.reset_events();
        (self.levels(), self.now())
    }

    /// Current level of every echo line, one bit per channel.
    pub fn levels(&self) -> u8 {
        let mut levels = 0;
        for (ch, pin) in self.pins.iter().enumerate() {
            if pin.is_high().unwrap_or(false) {
                levels |= 1 << ch;
            }
        }
        levels
    }

    /// Captures the free-running 0.5 µs tick counter.
    pub fn now(&self) -> u16 {
        let block = self.timer.as_timer0();
        block.tasks_capture[1].write(|w| w.tasks_capture().set_bit());
        block.cc[1].read().cc().bits() as u16
    }
}

/// Couples the trigger bank to the interrupt-shared echo bank for one
/// measurement cycle. `M` is the RTIC resource proxy, so every bank access
/// is one short critical section and a tick value can never be torn by an
/// edge landing mid-read.
pub struct SonarLink<'a, T: Instance, M> {
    pub triggers: &'a mut TriggerBank<T>,
    pub bank: M,
}

impl<'a, T, M> SonarChannels<NUM_CHANNELS> for SonarLink<'a, T, M>
where
    T: Instance,
    M: Mutex<T = EchoBank<NUM_CHANNELS>>,
{
    fn arm(&mut self, ch: usize) {
        self.bank.lock(|bank| bank.reset(ch));
        self.triggers.pulse(ch);
    }

    fn arm_all(&mut self) {
        self.bank.lock(|bank| bank.reset_all());
        self.triggers.pulse_all();
    }

    fn is_complete(&mut self, ch: usize) -> bool {
        self.bank.lock(|bank| bank.is_complete(ch))
    }

    fn collect(&mut self, ch: usize) -> Distance {
        self.bank.lock(|bank| {
            let reading = bank.distance(ch);
            bank.reset(ch);
            reading
        })
    }

    fn pause_us(&mut self, us: u32) {
        self.triggers.wait_us(us);
    }
}
