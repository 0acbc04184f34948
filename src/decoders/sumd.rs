//! HoTT SUMD decoder.

use super::DecodedChannels;
use crate::decoders::crc_ccitt::crc_ccitt;
use crate::error::RcError;

const SYNC_BYTE: u8 = 0xA8;
const MAX_SUMD_PACKET: usize = 69;

fn packet_size(channel_count_byte: u8) -> usize {
    let size = 2 * channel_count_byte as usize + 5;
    size.min(MAX_SUMD_PACKET)
}

pub fn try_decode(packet: &[u8], byte_index: usize) -> Option<Result<DecodedChannels, RcError>> {
    if packet.len() < 3 {
        return None;
    }
    if packet[0] != SYNC_BYTE {
        return None;
    }

    let size = packet_size(packet[2]);
    if size == 0 || byte_index != size - 1 {
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

    let channel_count = size.saturating_sub(5) / 2;
    let channel_count = channel_count.min(16);
    let mut values = [0u16; 16];
    let mut presence = 0u16;
    for i in 0..channel_count {
        let offset = 3 + i * 2;
        let raw = u16::from_be_bytes([packet[offset], packet[offset + 1]]);
        let centered = raw as i32 - 12_000;
        let scaled = (centered >> 2) + (centered >> 4);
        values[i] = (scaled + 3750) as u16;
        presence |= 1 << i;
    }

    Some(Ok(DecodedChannels { values, presence }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build_frame(channels: &[u16]) -> ([u8; MAX_SUMD_PACKET], usize) {
        let size = packet_size(channels.len() as u8);
        let mut frame = [0u8; MAX_SUMD_PACKET];
        frame[0] = SYNC_BYTE;
        frame[1] = 0x01; // status, unused
        frame[2] = channels.len() as u8;
        for (i, &ch) in channels.iter().enumerate() {
            let offset = 3 + i * 2;
            frame[offset..offset + 2].copy_from_slice(&ch.to_be_bytes());
        }
        let crc = crc_ccitt(&frame[0..size - 2]);
        frame[size - 2..size].copy_from_slice(&crc.to_be_bytes());
        (frame, size)
    }

    #[test]
    fn eight_channel_center_frame() {
        let (frame, size) = build_frame(&[12_000; 8]);
        let decoded = try_decode(&frame[..size], size - 1).unwrap().unwrap();
        assert_eq!(decoded.presence, 0xFF);
        for &v in &decoded.values[0..8] {
            assert_eq!(v, 3750);
        }
    }

    #[test]
    fn corrupted_crc_is_rejected() {
        let (mut frame, size) = build_frame(&[12_000; 4]);
        frame[size - 1] ^= 0xFF;
        assert_eq!(
            try_decode(&frame[..size], size - 1),
            Some(Err(RcError::CrcMismatch))
        );
    }

    #[test]
    fn oversized_channel_count_clamps_to_max_packet() {
        assert_eq!(packet_size(200), MAX_SUMD_PACKET);
    }

    #[test]
    fn wrong_sync_byte_is_ignored() {
        let (mut frame, size) = build_frame(&[12_000; 4]);
        frame[0] = 0x00;
        assert_eq!(try_decode(&frame[..size], size - 1), None);
    }
}
