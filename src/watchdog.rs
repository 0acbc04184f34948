//! Signal-loss watchdog *state*. The watchdog policy itself (deciding
//! `RCTimeout` has exceeded some threshold and therefore setting `Overdue`)
//! lives outside this core, as an external collaborator. What belongs here
//! is the state the watchdog reads and the state a successful decode
//! resets, since those are touched from inside the decoders.

/// Watchdog-observable state, reset by any successful frame decode.
#[derive(Clone, Copy, Default, Debug, defmt::Format)]
pub struct WatchdogState {
    /// Set true the instant a frame finishes decoding; the consumer (outer
    /// loop) must clear it after reading the channel vector. Only ever flips
    /// false to true after a frame has fully validated, never mid-frame.
    interrupted: bool,
    /// Set by the external watchdog when `timeout_ticks` exceeds its
    /// threshold with no valid frame in between. Cleared here on the next
    /// valid frame.
    overdue: bool,
    /// Timer seed captured at the moment of the last successful decode, so
    /// an external short-interval timer can measure inter-frame latency.
    servo_tick: u16,
    /// Count of missed servo-output cycles since the last valid frame;
    /// incremented externally, cleared here on a valid frame.
    rc_timeout: u16,
}

impl WatchdogState {
    pub const fn new() -> Self {
        Self {
            interrupted: false,
            overdue: false,
            servo_tick: 0,
            rc_timeout: 0,
        }
    }

    pub fn interrupted(&self) -> bool {
        self.interrupted
    }

    /// Consumer-side clear; the decoding core never clears this itself.
    pub fn clear_interrupted(&mut self) {
        self.interrupted = false;
    }

    pub fn overdue(&self) -> bool {
        self.overdue
    }

    /// Set by the external watchdog on timeout. Never set from inside a
    /// decoder.
    pub fn set_overdue(&mut self) {
        self.overdue = true;
    }

    pub fn servo_tick(&self) -> u16 {
        self.servo_tick
    }

    pub fn rc_timeout(&self) -> u16 {
        self.rc_timeout
    }

    /// Called by the external watchdog each time it increments its own
    /// timeout counter.
    pub fn bump_rc_timeout(&mut self) {
        self.rc_timeout = self.rc_timeout.wrapping_add(1);
    }

    /// Arm: a decoder calls this once a frame is fully validated. Resets
    /// the loss-timer state and raises `interrupted`. `now` is the current
    /// tick, captured via [`crate::timebase::Timebase::atomic_read`].
    pub fn mark_frame_complete(&mut self, now: u16) {
        self.interrupted = true;
        self.servo_tick = now;
        self.rc_timeout = 0;
        self.overdue = false;
    }

    /// PPM's auto-detection recalibration: when the watchdog has declared
    /// the signal overdue, the next frame must re-learn the channel count
    /// from scratch once the watchdog has declared the signal overdue.
    pub fn take_overdue(&mut self) -> bool {
        let was = self.overdue;
        self.overdue = false;
        was
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mark_frame_complete_resets_loss_state() {
        let mut wd = WatchdogState::new();
        wd.set_overdue();
        wd.bump_rc_timeout();
        wd.bump_rc_timeout();

        wd.mark_frame_complete(4242);

        assert!(wd.interrupted());
        assert!(!wd.overdue());
        assert_eq!(wd.rc_timeout(), 0);
        assert_eq!(wd.servo_tick(), 4242);
    }

    #[test]
    fn interrupted_only_cleared_by_consumer() {
        let mut wd = WatchdogState::new();
        wd.mark_frame_complete(0);
        assert!(wd.interrupted());
        wd.clear_interrupted();
        assert!(!wd.interrupted());
    }

    #[test]
    fn take_overdue_is_a_one_shot_read() {
        let mut wd = WatchdogState::new();
        assert!(!wd.take_overdue());
        wd.set_overdue();
        assert!(wd.take_overdue());
        assert!(!wd.take_overdue());
    }
}
