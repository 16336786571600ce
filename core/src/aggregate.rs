use crate::classify::SlotState;
use crate::config::FORCED_REFRESH_CYCLES;

/// Display-ready reduction of all slot classifications.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt_print", derive(defmt::Format))]
pub struct LotSummary<const N: usize> {
    /// One flag per slot, set when a car is confirmed in it.
    pub occupied: [bool; N],
    /// Every slot taken.
    pub full: bool,
}

impl<const N: usize> LotSummary<N> {
    pub fn from_states(states: &[SlotState; N]) -> Self {
        let mut occupied = [false; N];
        for (flag, state) in occupied.iter_mut().zip(states) {
            *flag = *state == SlotState::Occupied;
        }
        let full = occupied.iter().all(|&taken| taken);
        Self { occupied, full }
    }

    pub fn occupied_count(&self) -> usize {
        self.occupied.iter().filter(|&&taken| taken).count()
    }
}

/// Decides when the display sink actually needs a repaint.
///
/// Repaints whenever a slot changed, plus an unconditional refresh every
/// `FORCED_REFRESH_CYCLES` quiet cycles as a safety net against a glitched
/// panel. A forced refresh is skipped while the unchanged full-lot banner is
/// already showing.
#[derive(Debug, Default)]
pub struct DisplayGate {
    quiet_cycles: u8,
    full_on_screen: bool,
}

impl DisplayGate {
    pub const fn new() -> Self {
        Self {
            quiet_cycles: 0,
            full_on_screen: false,
        }
    }

    pub fn should_render(&mut self, changed: bool, full: bool) -> bool {
        self.quiet_cycles = self.quiet_cycles.saturating_add(1);
        let forced = self.quiet_cycles >= FORCED_REFRESH_CYCLES;
        if forced {
            self.quiet_cycles = 0;
        }

        let render = changed || (forced && !(full && self.full_on_screen));
        if render {
            self.quiet_cycles = 0;
            self.full_on_screen = full;
        }
        render
    }
}
