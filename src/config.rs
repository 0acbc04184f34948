//! Configuration snapshot read by the decoding core. Owned elsewhere (EEPROM
//! / config UI, neither of which are this crate's concern); the core only
//! ever reads a `Copy` snapshot of it between frames.

use num_enum::TryFromPrimitive;

use crate::state::MAX_CHANNELS;

/// Which transport the core is currently decoding. Mutually exclusive with
/// respect to which interrupt sources are live — see [`crate::mode_switch`].
#[repr(u8)]
#[derive(Clone, Copy, PartialEq, Eq, Debug, defmt::Format, TryFromPrimitive)]
pub enum RxMode {
    Pwm = 0,
    Cppm = 1,
    Xtreme = 2,
    Sbus = 3,
    Spektrum = 4,
    ModeB = 5,
    Sumd = 6,
}

/// Which parallel-PWM channel's falling edge delimits a frame and arms the
/// watchdog / publisher. Only meaningful in [`RxMode::Pwm`].
#[repr(u8)]
#[derive(Clone, Copy, PartialEq, Eq, Debug, defmt::Format, TryFromPrimitive)]
pub enum PwmSync {
    Aileron = 0,
    Elevator = 1,
    Throttle = 2,
    Gear = 3,
    Rudder = 4,
}

/// Maps stream position (the order channels arrive in over the wire) to
/// logical channel index. `order[i]` is the logical index that receives the
/// `i`th channel decoded from the stream. The identity permutation
/// (`[0, 1, 2, ..., 15]`) yields raw stream order.
pub type ChannelOrder = [u8; MAX_CHANNELS];

/// Identity channel order: logical channel `i` receives stream position `i`.
pub const IDENTITY_ORDER: ChannelOrder = {
    let mut order = [0u8; MAX_CHANNELS];
    let mut i = 0;
    while i < MAX_CHANNELS {
        order[i] = i as u8;
        i += 1;
    }
    order
};

/// Read-only snapshot the core consumes. May change between frames; the
/// core never mutates it.
#[derive(Clone, Copy, Debug, defmt::Format)]
pub struct RxConfig {
    pub rx_mode: RxMode,
    pub channel_order: ChannelOrder,
    pub pwm_sync: PwmSync,
}

impl Default for RxConfig {
    fn default() -> Self {
        Self {
            rx_mode: RxMode::Sbus,
            channel_order: IDENTITY_ORDER,
            pwm_sync: PwmSync::Throttle,
        }
    }
}
