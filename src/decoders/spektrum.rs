//! Spektrum Satellite decoder.
//!
//! Fixed 16-byte frame, seven channel slots. A multi-frame transmitter
//! alternates which channels it sends; this decoder doesn't special-case
//! that, it just overwrites by channel id, so the published vector becomes
//! the union of whatever's arrived across successive frames.

use super::DecodedChannels;
use crate::error::RcError;

const FRAME_LEN: usize = 16;
const LAST_BYTE_INDEX: usize = FRAME_LEN - 1;
const SLOT_COUNT: usize = 7;

pub fn try_decode(packet: &[u8], byte_index: usize) -> Option<Result<DecodedChannels, RcError>> {
    if byte_index != LAST_BYTE_INDEX {
        return None;
    }
    if packet.len() < FRAME_LEN {
        return None;
    }

    let is_11bit = packet[1] & 0xF0 != 0;
    let (data_mask, chan_shift, id_mask, center): (u8, u8, u8, i32) = if is_11bit {
        (0x07, 3, 0x78, 1024)
    } else {
        (0x03, 2, 0x3C, 512)
    };

    let mut values = [0u16; 16];
    let mut presence = 0u16;

    for slot in 0..SLOT_COUNT {
        let offset = 2 + slot * 2;
        let hi = packet[offset];
        let lo = packet[offset + 1];
        let chan_id = ((hi & id_mask) >> chan_shift) as usize;
        if chan_id >= 16 {
            // Empty-slot marker; unreachable with the 4-bit id masks above,
            // kept for parity with the documented contract.
            continue;
        }

        let raw = (((hi & data_mask) as u16) << 8) | lo as u16;
        let centered = raw as i32 - center;
        let mut scaled = (centered << 1) + (centered >> 1) + (centered >> 2) + (centered >> 3);
        if is_11bit {
            scaled /= 2;
        }

        values[chan_id] = (scaled + 3750) as u16;
        presence |= 1 << chan_id;
    }

    Some(Ok(DecodedChannels { values, presence }))
}
