//! Edge Capture (parallel PWM and combined PPM).
//!
//! Four parallel-PWM channels are mapped to four edge-sensitive pins;
//! combined PPM shares one pin (the same pin as the rudder, when not in PPM
//! mode) carrying all channels as sequential pulses. The two modes are
//! mutually exclusive (enforced by [`crate::mode_switch`]) but share the
//! channel-start bookkeeping, so both live in one state struct.

use crate::{
    config::{ChannelOrder, PwmSync},
    state::{ChannelVector, AILERON, ELEVATOR, GEAR, RUDDER, THROTTLE},
    timebase::ticks_since,
    watchdog::WatchdogState,
};

/// CPPM sync pulse must be longer than this to be recognized as the frame
/// boundary (2.7 ms at 2.5 MHz).
pub const SYNC_PULSE_WIDTH: u16 = 6_750;
/// Minimum valid CPPM inter-channel pulse (300 µs at 2.5 MHz); anything
/// shorter is a glitch.
pub const MIN_PULSE_WIDTH: u16 = 750;
/// PPM only decodes this many channels; channel 9+ pulses are ignored.
pub const MAX_CPPM_CHANNELS: usize = 8;

/// Rising/falling transition, as delivered by the GPIO EXTI handler.
#[derive(Clone, Copy, PartialEq, Eq, Debug, defmt::Format)]
pub enum Edge {
    Rising,
    Falling,
}

/// One of the five edge-sensitive pins used in parallel-PWM mode. `Rudder`
/// shares its pin with combined PPM (the same physical interrupt line
/// carries the rudder pulse in PWM mode or the whole PPM stream in CPPM
/// mode); when `RxMode == Cppm` the same pin's edges are routed to
/// [`EdgeCaptureState::handle_ppm_edge`] instead of
/// [`EdgeCaptureState::handle_pwm_edge`].
#[derive(Clone, Copy, PartialEq, Eq, Debug, defmt::Format)]
pub enum PwmPin {
    Aileron,
    Elevator,
    Throttle,
    Gear,
    Rudder,
}

impl PwmPin {
    fn logical_index(self) -> usize {
        match self {
            PwmPin::Aileron => AILERON,
            PwmPin::Elevator => ELEVATOR,
            PwmPin::Throttle => THROTTLE,
            PwmPin::Gear => GEAR,
            PwmPin::Rudder => RUDDER,
        }
    }

    fn matches_sync(self, sync: PwmSync) -> bool {
        matches!(
            (self, sync),
            (PwmPin::Aileron, PwmSync::Aileron)
                | (PwmPin::Elevator, PwmSync::Elevator)
                | (PwmPin::Throttle, PwmSync::Throttle)
                | (PwmPin::Gear, PwmSync::Gear)
                | (PwmPin::Rudder, PwmSync::Rudder)
        )
    }
}

/// Channel-start timestamps and PPM bookkeeping.
#[derive(Clone, Copy, Debug, defmt::Format)]
pub struct EdgeCaptureState {
    channel_start: ChannelVector,
    /// Current PPM channel index within the frame.
    ppm_index: usize,
    /// Highest channel index observed so far this calibration; PPM's
    /// auto-detected frame length.
    max_chan: usize,
    /// Timestamp of the previous PPM falling edge.
    last_edge: u16,
}

impl EdgeCaptureState {
    pub const fn new() -> Self {
        Self {
            channel_start: [0; crate::state::MAX_CHANNELS],
            ppm_index: 0,
            max_chan: 0,
            last_edge: 0,
        }
    }

    pub fn max_chan(&self) -> usize {
        self.max_chan
    }

    /// Handle one edge from a dedicated parallel-PWM pin. Returns `true` if
    /// this edge completed the sync channel's pulse, i.e. the frame should
    /// be published.
    pub fn handle_pwm_edge(
        &mut self,
        pin: PwmPin,
        edge: Edge,
        now: u16,
        sync: PwmSync,
        channels: &mut ChannelVector,
        watchdog: &mut WatchdogState,
    ) -> bool {
        let idx = pin.logical_index();
        match edge {
            Edge::Rising => {
                self.channel_start[idx] = now;
                false
            }
            Edge::Falling => {
                channels[idx] = ticks_since(self.channel_start[idx], now);
                if pin.matches_sync(sync) {
                    watchdog.mark_frame_complete(now);
                    true
                } else {
                    false
                }
            }
        }
    }

    /// Handle a falling edge on the combined PPM input.
    /// Rising edges are ignored ("Acts only on falling edges").
    ///
    /// Returns `true` if this pulse completed the frame (`idx == max_chan`),
    /// meaning the caller should publish the channel vector.
    pub fn handle_ppm_edge(
        &mut self,
        now: u16,
        order: &ChannelOrder,
        channels: &mut ChannelVector,
        watchdog: &mut WatchdogState,
    ) -> bool {
        let gap = ticks_since(self.last_edge, now);
        if gap > SYNC_PULSE_WIDTH || gap < MIN_PULSE_WIDTH {
            self.ppm_index = 0;
        }
        self.last_edge = now;

        let cur_logical = order[self.ppm_index] as usize;
        if self.ppm_index < MAX_CPPM_CHANNELS {
            self.channel_start[cur_logical] = now;
        }

        if self.ppm_index > 0 && self.ppm_index <= MAX_CPPM_CHANNELS {
            let prev_logical = order[self.ppm_index - 1] as usize;
            channels[prev_logical] = ticks_since(self.channel_start[prev_logical], now);
        }

        self.ppm_index += 1;

        let mut completed = false;
        if self.ppm_index > self.max_chan {
            self.max_chan = self.ppm_index;
        } else if self.ppm_index == self.max_chan {
            watchdog.mark_frame_complete(now);
            completed = true;
        }

        if watchdog.take_overdue() {
            self.max_chan = 0;
        }

        completed
    }
}
