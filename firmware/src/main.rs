#![no_std]
#![no_main]

use smartpark_firmware as firmware;

use nrf52840_hal as hal;

#[allow(unused_imports)]
use hal::prelude::*;

use hal::{
    gpio::{p0, Level},
    gpiote::Gpiote,
    pac::{TIMER1, TIMER2, TWIM0},
    Clocks, Delay, Timer,
};

use rtic::cyccnt::U32Ext as _;

#[cfg(feature = "display")]
use firmware::display::LotDisplay;
#[cfg(not(feature = "display"))]
use firmware::stubs::LotDisplay;

#[cfg(feature = "leds")]
use firmware::leds::LedBank;
#[cfg(not(feature = "leds"))]
use firmware::stubs::LedBank;

use firmware::consts::*;
use firmware::sonar_array::{EchoLines, Pins as SonarPins, SonarLink, TriggerBank};

use smartpark_core::{
    config::NUM_CHANNELS, run_cycle, DisplayGate, EchoBank, LotSummary, SlotMonitor, SlotState,
};

#[rtic::app(
    device = nrf52840_hal::pac,
    peripherals = true,
    monotonic = rtic::cyccnt::CYCCNT
)]
const APP: () = {
    struct Resources {
        bank: EchoBank<NUM_CHANNELS>,
        echo: EchoLines<TIMER1>,
        triggers: TriggerBank<TIMER2>,
        slots: [SlotMonitor; NUM_CHANNELS],
        gate: DisplayGate,
        display: Option<LotDisplay<TWIM0, Delay>>,
        leds: LedBank,
    }

    #[init(schedule = [measure])]
    #[cfg_attr(
        not(any(feature = "display", feature = "leds")),
        allow(unused_variables, unused_mut)
    )]
    fn init(ctx: init::Context) -> init::LateResources {
        let mut core = ctx.core;
        core.DCB.enable_trace();
        core.DWT.enable_cycle_counter();

        let clocks = Clocks::new(ctx.device.CLOCK);
        clocks.enable_ext_hfosc();

        let port0 = p0::Parts::new(ctx.device.P0);

        let sonar_pins = SonarPins {
            trig1: port0.p0_02.into_push_pull_output(Level::Low).degrade(),
            trig2: port0.p0_03.into_push_pull_output(Level::Low).degrade(),
            trig3: port0.p0_04.into_push_pull_output(Level::Low).degrade(),
            trig4: port0.p0_28.into_push_pull_output(Level::Low).degrade(),
            trig5: port0.p0_29.into_push_pull_output(Level::Low).degrade(),
            trig6: port0.p0_30.into_push_pull_output(Level::Low).degrade(),
            echo1: port0.p0_11.into_floating_input().degrade(),
            echo2: port0.p0_12.into_floating_input().degrade(),
            echo3: port0.p0_13.into_floating_input().degrade(),
            echo4: port0.p0_14.into_floating_input().degrade(),
            echo5: port0.p0_15.into_floating_input().degrade(),
            echo6: port0.p0_16.into_floating_input().degrade(),
        };
        let (trig_pins, echo_pins) = sonar_pins.split();

        let triggers = TriggerBank::new(trig_pins, Timer::one_shot(ctx.device.TIMER2));
        let echo = EchoLines::new(
            echo_pins,
            Gpiote::new(ctx.device.GPIOTE),
            Timer::periodic(ctx.device.TIMER1),
        );
        // Seed the edge decoder with the lines' idle state.
        let bank = EchoBank::new(echo.levels());

        let mut delay = Delay::new(core.SYST);

        #[cfg(feature = "leds")]
        let leds = {
            let mut leds = LedBank::new([
                port0.p0_19.into_push_pull_output(Level::Low).degrade(),
                port0.p0_20.into_push_pull_output(Level::Low).degrade(),
                port0.p0_21.into_push_pull_output(Level::Low).degrade(),
                port0.p0_22.into_push_pull_output(Level::Low).degrade(),
                port0.p0_23.into_push_pull_output(Level::Low).degrade(),
                port0.p0_24.into_push_pull_output(Level::Low).degrade(),
            ]);
            leds.test_pattern(&mut delay);
            leds
        };
        #[cfg(not(feature = "leds"))]
        let leds = LedBank;

        #[cfg(feature = "display")]
        let display = {
            use hal::twim::Pins as TwimPins;

            let twim_pins = TwimPins {
                scl: port0.p0_27.into_floating_input().degrade(),
                sda: port0.p0_26.into_floating_input().degrade(),
            };
            match LotDisplay::new(ctx.device.TWIM0, twim_pins, LCD_ADDR, delay) {
                Ok(mut display) => {
                    let empty = [SlotState::Empty; NUM_CHANNELS];
                    display.splash().ok();
                    display.render(&empty, &LotSummary::from_states(&empty)).ok();
                    Some(display)
                }
                Err(_) => {
                    defmt::warn!("character panel not responding, running without it");
                    None
                }
            }
        };
        #[cfg(not(feature = "display"))]
        let display = Some(LotDisplay::disconnected());

        ctx.schedule
            .measure(ctx.start + CYCLE_PERIOD_CYCLES.cycles())
            .ok();

        defmt::info!(
            "smartpark up: {=usize} channels, {} triggering",
            NUM_CHANNELS,
            TRIGGER_POLICY
        );

        init::LateResources {
            bank,
            echo,
            triggers,
            slots: [SlotMonitor::new(); NUM_CHANNELS],
            gate: DisplayGate::new(),
            display,
            leds,
        }
    }

    // Defines what happens when there's nothing left to do
    #[idle]
    fn idle(_ctx: idle::Context) -> ! {
        loop {
            // Go to sleep, waiting for an interrupt
            cortex_m::asm::wfi();
        }
    }

    /// All six echo lines share this one interrupt; the bank diffs the level
    /// snapshot to work out which lines moved and in which direction.
    #[task(binds = GPIOTE, priority = 7, resources = [echo, bank])]
    fn on_echo_edge(ctx: on_echo_edge::Context) {
        let (levels, now) = ctx.resources.echo.sample();
        ctx.resources.bank.record_transitions(levels, now);
    }

    #[task(priority = 1, resources = [bank, triggers, slots, gate, display, leds], schedule = [measure])]
    fn measure(mut ctx: measure::Context) {
        let readings = {
            let mut link = SonarLink {
                triggers: ctx.resources.triggers,
                bank: ctx.resources.bank,
            };
            run_cycle(&mut link, TRIGGER_POLICY)
        };

        ctx.resources.leds.show(&readings);

        let mut states = [SlotState::Empty; NUM_CHANNELS];
        let mut changed = false;
        for ((slot, reading), state) in ctx
            .resources
            .slots
            .iter_mut()
            .zip(&readings)
            .zip(&mut states)
        {
            changed |= slot.update(*reading);
            *state = slot.state();
        }

        let summary = LotSummary::from_states(&states);
        defmt::debug!("readings: {}, occupied: {=usize}", readings, summary.occupied_count());
        if changed {
            defmt::info!("occupancy now {=usize}/{=usize}", summary.occupied_count(), NUM_CHANNELS);
        }

        if ctx.resources.gate.should_render(changed, summary.full) {
            if let Some(display) = ctx.resources.display.as_mut() {
                if display.render(&states, &summary).is_err() {
                    defmt::warn!("panel write failed, keeping last contents");
                }
            }
        }

        ctx.schedule
            .measure(ctx.scheduled + CYCLE_PERIOD_CYCLES.cycles())
            .ok();
    }

    extern "C" {
        fn SWI0_EGU0();
        fn SWI1_EGU1();
    }
};
