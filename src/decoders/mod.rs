//! Protocol decoders: six format-specific parsers (XTREME, S-BUS, Spektrum,
//! Mode-B, SUMD) that turn packet bytes into channel words.
//!
//! Each decoder is a pure function of the framer's packet-buffer prefix and
//! the index of the byte that just arrived; decoders hold no state of their
//! own between frames, only the shared buffer does. `dispatch` is the single
//! entry point the serial receive handler calls; it owns applying the
//! channel-order permutation and arming the watchdog once a decoder
//! succeeds.

pub mod crc_ccitt;
pub mod modeb;
pub mod sbus;
pub mod spektrum;
pub mod sumd;
pub mod xtreme;

use crate::{
    config::{ChannelOrder, RxMode},
    error::RcError,
    publisher,
    state::ChannelVector,
    watchdog::WatchdogState,
};

/// One decoder's output: up to sixteen stream-position values with a
/// presence bitmask (bit `i` set means `values[i]` is a valid update for
/// stream position `i`). Not every decoder fills every position on every
/// frame — Spektrum and XTREME both publish a subset per frame — so
/// [`publisher::apply_channel_order`] only touches positions the mask
/// marks present.
#[derive(Clone, Copy, Debug, defmt::Format)]
pub struct DecodedChannels {
    pub values: [u16; 16],
    pub presence: u16,
}

/// Decoder-side bookkeeping beyond the shared packet buffer: just the most
/// recent rejection reason, kept for diagnostics.
#[derive(Clone, Copy, Debug, defmt::Format)]
pub struct DecoderState {
    last_error: Option<RcError>,
}

impl DecoderState {
    pub const fn new() -> Self {
        Self { last_error: None }
    }

    pub fn last_error(&self) -> Option<RcError> {
        self.last_error
    }

    /// Record a rejection reason that arose outside the decoders
    /// themselves — a line error or buffer overrun caught by the framer /
    /// serial ISR before a decoder ever ran.
    pub fn record_error(&mut self, e: RcError) {
        self.last_error = Some(e);
    }
}

impl Default for DecoderState {
    fn default() -> Self {
        Self::new()
    }
}

/// Route one newly-framed byte to the decoder for `mode`. On success,
/// applies the channel-order permutation and arms the watchdog; on
/// failure, records the reason and leaves the channel vector and watchdog
/// untouched. Returns `true` if a frame was published this call.
#[allow(clippy::too_many_arguments)]
pub fn dispatch(
    mode: RxMode,
    packet: &[u8],
    byte_index: usize,
    order: &ChannelOrder,
    channels: &mut ChannelVector,
    watchdog: &mut WatchdogState,
    decoder: &mut DecoderState,
    now: u16,
) -> bool {
    let result = match mode {
        RxMode::Xtreme => xtreme::try_decode(packet, byte_index),
        RxMode::Sbus => sbus::try_decode(packet, byte_index),
        RxMode::Spektrum => spektrum::try_decode(packet, byte_index),
        RxMode::ModeB => modeb::try_decode(packet, byte_index),
        RxMode::Sumd => sumd::try_decode(packet, byte_index),
        RxMode::Pwm | RxMode::Cppm => None,
    };

    match result {
        Some(Ok(decoded)) => {
            decoder.last_error = None;
            publisher::apply_channel_order(&decoded.values, decoded.presence, order, channels);
            watchdog.mark_frame_complete(now);
            true
        }
        Some(Err(e)) => {
            decoder.last_error = Some(e);
            defmt::debug!("RC frame dropped: {}", e);
            false
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::IDENTITY_ORDER;

    /// Mid-stick S-BUS, driven through the shared `dispatch` entry point rather
    /// than the decoder directly, to exercise the publish/watchdog wiring.
    #[test]
    fn sbus_mid_stick_through_dispatch() {
        let mut frame = [0u8; 25];
        frame[0] = 0x0F;
        // All-1024 packs to the same bit pattern used in sbus::tests, but
        // simplest here is to reuse zero bits at 1024 = 0b10000000000;
        // every 11-bit slot has only bit 10 set. Build it directly.
        let mut bit_pos = 0usize;
        for _ in 0..16 {
            for bit in 0..11u32 {
                if (1024u16 >> bit) & 1 != 0 {
                    let byte_ofs = bit_pos / 8;
                    let bit_ofs = bit_pos % 8;
                    frame[1 + byte_ofs] |= 1 << bit_ofs;
                }
                bit_pos += 1;
            }
        }

        let mut channels = [0u16; 16];
        let mut watchdog = WatchdogState::new();
        let mut decoder = DecoderState::new();

        let published = dispatch(
            RxMode::Sbus,
            &frame,
            24,
            &IDENTITY_ORDER,
            &mut channels,
            &mut watchdog,
            &mut decoder,
            1000,
        );

        assert!(published);
        assert!(watchdog.interrupted());
        assert_eq!(watchdog.servo_tick(), 1000);
        for &v in &channels {
            assert_eq!(v, 3750);
        }
        assert!(decoder.last_error().is_none());
    }

    /// A rejected frame leaves the channel vector and watchdog
    /// completely untouched.
    #[test]
    fn rejected_frame_leaves_state_untouched() {
        let mut frame = [0u8; 16];
        frame[0] = 0xE0; // top 3 bits set
        frame[2..4].copy_from_slice(&0x0001u16.to_be_bytes());
        frame[4..6].copy_from_slice(&2500u16.to_be_bytes());
        frame[6] = 0x00; // checksum, irrelevant once flagged

        let mut channels = [9999u16; 16];
        let before = channels;
        let mut watchdog = WatchdogState::new();
        let mut decoder = DecoderState::new();

        let published = dispatch(
            RxMode::Xtreme,
            &frame,
            6,
            &IDENTITY_ORDER,
            &mut channels,
            &mut watchdog,
            &mut decoder,
            500,
        );

        assert!(!published);
        assert_eq!(channels, before);
        assert!(!watchdog.interrupted());
        assert_eq!(decoder.last_error(), Some(RcError::RejectedByFlagBits));
    }
}
