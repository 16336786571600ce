use crate::units::{self, Distance};

/// Latched timing state for one echo line.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PulseWindow {
    pub start: u16,
    pub end: u16,
    pub active: bool,
    pub complete: bool,
}

impl PulseWindow {
    pub fn reset(&mut self) {
        *self = PulseWindow::default();
    }
}

/// Pulse windows for all channels plus the last observed composite level
/// snapshot of the shared echo lines.
///
/// The edge interrupt is the only writer of the snapshot; the measurement
/// cycle drains and resets the windows. The embedding context must serialize
/// the two sides (interrupt masked, or a resource lock) so a multi-byte tick
/// value is never observed mid-update.
pub struct EchoBank<const N: usize> {
    windows: [PulseWindow; N],
    last_levels: u8,
}

impl<const N: usize> EchoBank<N> {
    /// `initial_levels` seeds the snapshot with the lines' idle state so the
    /// first notification diffs against reality, not against zero.
    pub fn new(initial_levels: u8) -> Self {
        debug_assert!(N <= 8, "snapshot carries one bit per channel");
        Self {
            windows: [PulseWindow::default(); N],
            last_levels: initial_levels,
        }
    }

    /// Decodes one "some lines changed" notification. Interrupt context.
    ///
    /// `levels` carries one bit per channel. Diffing against the previous
    /// snapshot resolves several lines flipping within the same notification;
    /// each changed channel is fully resolved before the next one is touched.
    /// A falling edge on a channel that never saw its rising edge is noise
    /// and is dropped.
    pub fn record_transitions(&mut self, levels: u8, now: u16) {
        let changed = levels ^ self.last_levels;
        for (ch, window) in self.windows.iter_mut().enumerate() {
            let mask = 1u8 << ch;
            if changed & mask == 0 {
                continue;
            }
            if levels & mask != 0 {
                window.start = now;
                window.active = true;
            } else if window.active {
                window.end = now;
                window.active = false;
                window.complete = true;
            }
        }
        self.last_levels = levels;
    }

    /// Clears a channel's window ahead of a new measurement. No-op for an
    /// unknown channel; idempotent on an already-reset one.
    pub fn reset(&mut self, ch: usize) {
        if let Some(window) = self.windows.get_mut(ch) {
            window.reset();
        }
    }

    pub fn reset_all(&mut self) {
        for window in &mut self.windows {
            window.reset();
        }
    }

    /// Non-blocking completion poll.
    pub fn is_complete(&self, ch: usize) -> bool {
        self.windows.get(ch).is_some_and(|w| w.complete)
    }

    /// Distance for a completed channel; `Invalid` when the echo never
    /// finished this cycle or the reading falls outside the usable band.
    pub fn distance(&self, ch: usize) -> Distance {
        match self.windows.get(ch) {
            Some(w) if w.complete => units::distance_from_pulse(w.start, w.end),
            _ => Distance::Invalid,
        }
    }

    pub fn window(&self, ch: usize) -> Option<&PulseWindow> {
        self.windows.get(ch)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn bank() -> EchoBank<6> {
        EchoBank::new(0)
    }

    #[test]
    fn one_channel_pulse() {
        let mut bank = bank();
        bank.record_transitions(0b000001, 100);
        assert!(!bank.is_complete(0));
        assert!(bank.window(0).unwrap().active);

        bank.record_transitions(0b000000, 1260);
        let w = bank.window(0).unwrap();
        assert!(bank.is_complete(0));
        assert!(!w.active);
        assert_eq!((w.start, w.end), (100, 1260));
        assert_eq!(bank.distance(0), Distance::Valid(10));
    }

    #[test]
    fn several_lines_in_one_notification() {
        let mut bank = bank();
        // Channels 1 and 4 rise together, then fall together.
        bank.record_transitions(0b010010, 500);
        bank.record_transitions(0b000000, 1660);
        assert_eq!(bank.distance(1), Distance::Valid(10));
        assert_eq!(bank.distance(4), Distance::Valid(10));
        // Untouched channels stayed idle.
        assert!(!bank.is_complete(0));
        assert_eq!(bank.distance(0), Distance::Invalid);
    }

    #[test]
    fn rising_edge_on_one_line_ends_pulse_on_another() {
        let mut bank = bank();
        bank.record_transitions(0b000001, 10);
        // Channel 0 falls in the same notification that raises channel 2.
        bank.record_transitions(0b000100, 1170);
        assert_eq!(bank.distance(0), Distance::Valid(10));
        assert!(bank.window(2).unwrap().active);
    }

    #[test]
    fn spurious_falling_edge_is_dropped() {
        let mut bank = EchoBank::<6>::new(0b000010);
        // Line 1 falls without a recorded rising edge.
        bank.record_transitions(0b000000, 700);
        let w = bank.window(1).unwrap();
        assert!(!w.complete && !w.active);
        assert_eq!((w.start, w.end), (0, 0));
        // The snapshot still advanced, so the next rising edge is seen.
        bank.record_transitions(0b000010, 800);
        assert!(bank.window(1).unwrap().active);
    }

    #[test]
    fn reset_is_idempotent() {
        let mut bank = bank();
        bank.record_transitions(0b000001, 5);
        bank.record_transitions(0b000000, 1165);
        bank.reset(0);
        assert_eq!(bank.window(0).unwrap(), &PulseWindow::default());
        bank.reset(0);
        assert_eq!(bank.window(0).unwrap(), &PulseWindow::default());
    }

    #[test]
    fn incomplete_window_reads_invalid() {
        let mut bank = bank();
        bank.record_transitions(0b001000, 42);
        assert_eq!(bank.distance(3), Distance::Invalid);
    }

    #[test]
    fn out_of_range_channel_is_harmless() {
        let mut bank = bank();
        bank.reset(17);
        assert!(!bank.is_complete(17));
        assert_eq!(bank.distance(17), Distance::Invalid);
    }
}
