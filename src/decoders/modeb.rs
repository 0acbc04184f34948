//! XBUS Mode-B / UDI decoder.
//!
//! The vendor-ID byte picks between the 12-channel (27-byte) and 16-channel
//! (35-byte) packet sizes; there's no explicit check for a second vendor ID,
//! anything that isn't `0xA1` is treated as the larger packet.

use super::DecodedChannels;
use crate::decoders::crc_ccitt::crc_ccitt;
use crate::error::RcError;

const VENDOR_12CH: u8 = 0xA1;
const PACKET_SIZE_12CH: usize = 27;
const PACKET_SIZE_16CH: usize = 35;

fn packet_size(vendor_id: u8) -> usize {
    if vendor_id == VENDOR_12CH {
        PACKET_SIZE_12CH
    } else {
        PACKET_SIZE_16CH
    }
}

pub fn try_decode(packet: &[u8], byte_index: usize) -> Option<Result<DecodedChannels, RcError>> {
    if packet.is_empty() {
        return None;
    }
    let size = packet_size(packet[0]);
    if byte_index != size - 1 {
        return None;
    }
    if packet.len() < size {
        return None;
    }

    let crc_computed = crc_ccitt(&packet[0..size - 2]);
    let crc_received = u16::from_be_bytes([packet[size - 2], packet[size - 1]]);
    if crc_computed != crc_received {
        return Some(Err(RcError::CrcMismatch));
    }

    let channel_count = ((size - 3) / 2).min(16);
    let mut values = [0u16; 16];
    let mut presence = 0u16;
    for i in 0..channel_count {
        let offset = 1 + i * 2;
        let raw = u16::from_be_bytes([packet[offset], packet[offset + 1]]);
        let centered = raw as i32 - 2048;
        let scaled =
            (centered >> 1) + (centered >> 2) + (centered >> 4) + (centered >> 5) + (centered >> 7) + (centered >> 8);
        values[i] = (scaled + 3750) as u16;
        presence |= 1 << i;
    }

    Some(Ok(DecodedChannels { values, presence }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build_12ch_frame(words: [u16; 12]) -> [u8; PACKET_SIZE_12CH] {
        let mut frame = [0u8; PACKET_SIZE_12CH];
        frame[0] = VENDOR_12CH;
        for (i, &w) in words.iter().enumerate() {
            frame[1 + i * 2..3 + i * 2].copy_from_slice(&w.to_be_bytes());
        }
        let crc = crc_ccitt(&frame[0..PACKET_SIZE_12CH - 2]);
        frame[PACKET_SIZE_12CH - 2..].copy_from_slice(&crc.to_be_bytes());
        frame
    }

    /// 12 channels at 0x0800 (2048, dead center) all
    /// normalize to 3750.
    #[test]
    fn twelve_channel_center_frame() {
        let frame = build_12ch_frame([0x0800; 12]);
        let decoded = try_decode(&frame, PACKET_SIZE_12CH - 1).unwrap().unwrap();
        assert_eq!(decoded.presence, 0x0FFF);
        for &v in &decoded.values[0..12] {
            assert_eq!(v, 3750);
        }
    }

    #[test]
    fn corrupted_crc_is_rejected() {
        let mut frame = build_12ch_frame([0x0800; 12]);
        frame[PACKET_SIZE_12CH - 1] ^= 0xFF;
        assert_eq!(
            try_decode(&frame, PACKET_SIZE_12CH - 1),
            Some(Err(RcError::CrcMismatch))
        );
    }

    #[test]
    fn non_a1_vendor_id_uses_35_byte_size() {
        let mut frame = [0u8; PACKET_SIZE_16CH];
        frame[0] = 0x00; // anything other than 0xA1
        for i in 0..16usize {
            let offset = 1 + i * 2;
            frame[offset..offset + 2].copy_from_slice(&0x0800u16.to_be_bytes());
        }
        let crc = crc_ccitt(&frame[0..PACKET_SIZE_16CH - 2]);
        frame[PACKET_SIZE_16CH - 2..].copy_from_slice(&crc.to_be_bytes());

        let decoded = try_decode(&frame, PACKET_SIZE_16CH - 1).unwrap().unwrap();
        assert_eq!(decoded.presence, 0xFFFF);
    }
}
