//! Error types for the RC input decoding core.
//!
//! None of these are ever surfaced to a user. A decoder returning `Err`
//! just means the in-progress frame is dropped and prior state is left
//! untouched; the next valid frame recovers. They're a typed enum, rather
//! than a bare bool, purely so the framer can log *why* a frame was
//! dropped.

/// Reasons a frame failed to decode. Never propagated past the decoder /
/// framer boundary — only logged.
#[derive(Clone, Copy, PartialEq, Eq, Debug, defmt::Format)]
pub enum RcError {
    /// Trailing checksum byte didn't match the running accumulator (XTREME).
    ChecksumMismatch,
    /// Trailing CRC-CCITT word didn't match the computed one (MODE-B, SUMD).
    CrcMismatch,
    /// A flag/status byte indicated the frame isn't meant for us (XTREME
    /// top-3 bits of byte 0). Distinct from `ChecksumMismatch` so callers
    /// can tell "not addressed to us" apart from "corrupted".
    RejectedByFlagBits,
    /// The packet buffer filled before the frame did; trailing bytes were
    /// dropped. The frame may still decode successfully if its fixed-size
    /// prefix fit.
    BufferOverrun,
    /// A UART framing, parity, or overrun condition was reported by the
    /// hardware for this byte.
    LineError,
}
