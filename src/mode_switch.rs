//! Mode Switch.
//!
//! Disables both edge sources and the serial receiver, clears whatever
//! interrupt flags that left pending, then enables precisely the set the
//! new mode needs — in that order, so a stale pending flag from the old
//! mode can't fire the instant the new source goes live.

use crate::config::RxMode;

/// The hardware interrupt sources Mode Switch arbitrates between.
/// Implemented by the binary against real peripherals; a test double
/// implements it on host to verify the enable/disable table leaves
/// exactly one source active.
pub trait InterruptSources {
    fn set_pwm_edges_enabled(&mut self, enabled: bool);
    fn set_ppm_edge_enabled(&mut self, enabled: bool);
    fn set_serial_rx_enabled(&mut self, enabled: bool);
    /// Clear any interrupt flags left pending from before the reconfigure.
    fn clear_pending_flags(&mut self);
}

/// Reconfigure which sources are live for `mode`. Mode Switch and Hard
/// Mode Switch and Hard Disable both run with interrupts globally masked;
/// that's the caller's responsibility, not this function's.
pub fn apply_mode<S: InterruptSources>(sources: &mut S, mode: RxMode) {
    disable_all(sources);
    sources.clear_pending_flags();

    match mode {
        RxMode::Pwm => sources.set_pwm_edges_enabled(true),
        RxMode::Cppm => sources.set_ppm_edge_enabled(true),
        RxMode::Xtreme | RxMode::Sbus | RxMode::Spektrum | RxMode::ModeB | RxMode::Sumd => {
            sources.set_serial_rx_enabled(true)
        }
    }
}

/// Mute everything, regardless of the configured mode — used when the
/// device must be silenced (e.g. during configuration).
pub fn hard_disable<S: InterruptSources>(sources: &mut S) {
    disable_all(sources);
    sources.clear_pending_flags();
}

fn disable_all<S: InterruptSources>(sources: &mut S) {
    sources.set_pwm_edges_enabled(false);
    sources.set_ppm_edge_enabled(false);
    sources.set_serial_rx_enabled(false);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct FakeSources {
        pwm: bool,
        ppm: bool,
        serial: bool,
        pending_cleared: bool,
    }

    impl InterruptSources for FakeSources {
        fn set_pwm_edges_enabled(&mut self, enabled: bool) {
            self.pwm = enabled;
        }
        fn set_ppm_edge_enabled(&mut self, enabled: bool) {
            self.ppm = enabled;
        }
        fn set_serial_rx_enabled(&mut self, enabled: bool) {
            self.serial = enabled;
        }
        fn clear_pending_flags(&mut self) {
            self.pending_cleared = true;
        }
    }

    impl FakeSources {
        fn active_count(&self) -> usize {
            [self.pwm, self.ppm, self.serial]
                .iter()
                .filter(|&&x| x)
                .count()
        }
    }

    #[test]
    fn pwm_mode_enables_only_pwm() {
        let mut s = FakeSources::default();
        apply_mode(&mut s, RxMode::Pwm);
        assert_eq!(s.active_count(), 1);
        assert!(s.pwm);
        assert!(s.pending_cleared);
    }

    #[test]
    fn cppm_mode_enables_only_ppm() {
        let mut s = FakeSources::default();
        apply_mode(&mut s, RxMode::Cppm);
        assert_eq!(s.active_count(), 1);
        assert!(s.ppm);
    }

    #[test]
    fn every_serial_mode_enables_only_the_serial_receiver() {
        for mode in [
            RxMode::Xtreme,
            RxMode::Sbus,
            RxMode::Spektrum,
            RxMode::ModeB,
            RxMode::Sumd,
        ] {
            let mut s = FakeSources::default();
            apply_mode(&mut s, mode);
            assert_eq!(s.active_count(), 1, "{:?}", mode);
            assert!(s.serial, "{:?}", mode);
        }
    }

    #[test]
    fn switching_modes_leaves_the_old_source_disabled() {
        let mut s = FakeSources::default();
        apply_mode(&mut s, RxMode::Pwm);
        assert!(s.pwm);
        apply_mode(&mut s, RxMode::Sbus);
        assert!(!s.pwm);
        assert!(s.serial);
    }

    #[test]
    fn hard_disable_silences_everything() {
        let mut s = FakeSources::default();
        apply_mode(&mut s, RxMode::Sbus);
        hard_disable(&mut s);
        assert_eq!(s.active_count(), 0);
    }
}
