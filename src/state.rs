//! The channel vector and the single owned aggregate that ties every
//! component together, modeled as one struct behind a critical-section
//! primitive so the whole thing can live in a single RTIC resource.

use crate::{
    decoders::DecoderState, edge_capture::EdgeCaptureState, jitter::JitterState,
    serial_framer::SerialFramer, timebase::Timebase, watchdog::WatchdogState,
};

/// Maximum number of logical channels this core will ever publish.
pub const MAX_CHANNELS: usize = 16;

/// Internal unit: 400 ns/count. Midpoint of a centered channel.
pub const CHANNEL_CENTER: u16 = 3750;

/// The channel vector: one value per logical channel, in internal units
/// (400 ns/count; 1 ms pulse ≈ 2500, 2 ms pulse ≈ 5000).
pub type ChannelVector = [u16; MAX_CHANNELS];

/// Fixed logical-channel indices for the channels parallel-PWM and PPM
/// address directly: throttle, aileron, elevator, rudder, gear, aux1-aux3.
pub const THROTTLE: usize = 0;
pub const AILERON: usize = 1;
pub const ELEVATOR: usize = 2;
pub const RUDDER: usize = 3;
pub const GEAR: usize = 4;
pub const AUX1: usize = 5;
pub const AUX2: usize = 6;
pub const AUX3: usize = 7;

/// The single process-global, statically-lived aggregate. Owned by the
/// binary (typically inside an RTIC `#[shared]` or `#[local]` resource);
/// every interrupt handler takes `&mut RcCore` and every foreground read
/// goes through [`crate::publisher::Publisher`].
#[derive(Clone, Copy, Debug, defmt::Format)]
pub struct RcCore {
    pub timebase: Timebase,
    pub watchdog: WatchdogState,
    pub jitter: JitterState,
    pub channels: ChannelVector,
    pub edge_capture: EdgeCaptureState,
    pub framer: SerialFramer,
    pub decoder: DecoderState,
}

impl RcCore {
    pub const fn new() -> Self {
        Self {
            timebase: Timebase::new(),
            watchdog: WatchdogState::new(),
            jitter: JitterState::new(),
            channels: [0; MAX_CHANNELS],
            edge_capture: EdgeCaptureState::new(),
            framer: SerialFramer::new(),
            decoder: DecoderState::new(),
        }
    }

    /// Re-initialize everything touched by a mode transition: edge-capture
    /// bookkeeping, the packet buffer, and decoder diagnostics. Does not
    /// reset the timebase (it's free-running hardware) or `channels`
    /// (last-known values are harmless to keep across a mode change; the
    /// watchdog will mark them overdue if no new frame arrives).
    pub fn reset_for_mode_change(&mut self) {
        self.edge_capture = EdgeCaptureState::new();
        self.framer = SerialFramer::new();
        self.decoder = DecoderState::new();
    }
}

impl Default for RcCore {
    fn default() -> Self {
        Self::new()
    }
}
