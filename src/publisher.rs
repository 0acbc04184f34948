//! Channel Publisher.
//!
//! Two responsibilities, kept apart deliberately: [`apply_channel_order`] is
//! the pure write-side lookup every decoder calls once it has validated a
//! frame; [`Publisher`] is the read-side helper the foreground uses to take
//! a torn-free snapshot of the channel vector.

use crate::{
    config::ChannelOrder,
    state::{ChannelVector, MAX_CHANNELS},
};

/// `out[ChannelOrder[i]] = decoded_stream[i]` for every `i` the presence
/// bitmask marks valid. A pure lookup, independent of which decoder
/// produced `decoded_stream` — this is what makes re-permuting with the
/// identity order yield raw stream order.
pub fn apply_channel_order(
    decoded_stream: &[u16; MAX_CHANNELS],
    presence: u16,
    order: &ChannelOrder,
    out: &mut ChannelVector,
) {
    for stream_pos in 0..MAX_CHANNELS {
        if presence & (1 << stream_pos) != 0 {
            let logical = order[stream_pos] as usize;
            if logical < out.len() {
                out[logical] = decoded_stream[stream_pos];
            }
        }
    }
}

/// Foreground-side reader. Takes a snapshot of the channel vector inside a
/// critical section so a torn read (an interrupt landing mid-copy) can
/// never be observed: readers may see either the old or the new channel
/// vector, but never a torn mix of both.
pub struct Publisher;

impl Publisher {
    /// `read` must do nothing but copy the current channel vector out of
    /// whatever the caller's shared resource is (e.g. an RTIC `#[shared]`
    /// field) — it runs inside a critical section, so it must be quick.
    pub fn snapshot(read: impl FnOnce() -> ChannelVector) -> ChannelVector {
        critical_section::with(|_| read())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::IDENTITY_ORDER;

    #[test]
    fn identity_order_yields_raw_stream_order() {
        let mut decoded = [0u16; MAX_CHANNELS];
        for (i, v) in decoded.iter_mut().enumerate() {
            *v = (i as u16 + 1) * 100;
        }
        let mut out = [0u16; MAX_CHANNELS];
        apply_channel_order(&decoded, 0xFFFF, &IDENTITY_ORDER, &mut out);
        assert_eq!(out, decoded);
    }

    #[test]
    fn presence_mask_limits_which_positions_are_written() {
        let decoded = [111u16; MAX_CHANNELS];
        let mut out = [0u16; MAX_CHANNELS];
        apply_channel_order(&decoded, 0b0000_0101, &IDENTITY_ORDER, &mut out);
        assert_eq!(out[0], 111);
        assert_eq!(out[2], 111);
        assert_eq!(out[1], 0);
    }

    #[test]
    fn reordering_permutes_by_configured_order() {
        let mut order: ChannelOrder = IDENTITY_ORDER;
        order.swap(0, 1);
        let mut decoded = [0u16; MAX_CHANNELS];
        decoded[0] = 4242;
        let mut out = [0u16; MAX_CHANNELS];
        apply_channel_order(&decoded, 0x0001, &order, &mut out);
        assert_eq!(out[1], 4242);
        assert_eq!(out[0], 0);
    }

    #[test]
    fn snapshot_returns_read_result() {
        let vec = [7u16; MAX_CHANNELS];
        let snap = Publisher::snapshot(|| vec);
        assert_eq!(snap, vec);
    }
}
