#![no_main]
#![no_std]

//! RTIC application binding [`rc_link_core`] to STM32 interrupt vectors.
//!
//! This binary is the only place `unsafe`, `stm32-hal2` register access, and
//! RTIC resources appear (SPEC_FULL §0). Everything it does is hand the
//! library pure inputs — an edge, a received byte, a timer overflow — and
//! read back the decoded state; all protocol logic lives in `rc_link_core`.

use cfg_if::cfg_if;
use defmt::debug;
use defmt_rtt as _;
use panic_probe as _;

use rc_link_core::{
    edge_capture::{Edge as RcEdge, PwmPin},
    mode_switch::{self, InterruptSources},
    RcCore, RcError, RxConfig, RxMode,
};

use stm32_hal2::{
    clocks::{Clocks, InputSrc, PllSrc},
    gpio::{self, Edge as HalEdge, Pin, PinMode, Port},
    pac,
    timer::{Timer, TimerInterrupt},
    usart::{Usart, UsartConfig, UsartInterrupt},
};

use stm32_hal2::pac::{TIM2, USART1};

/// EXTI line numbers the four dedicated PWM pins and the shared PPM/rudder
/// pin sit on, in this board's pin mapping (PA0..PA4).
const EXTI_AILERON: u32 = 0;
const EXTI_ELEVATOR: u32 = 1;
const EXTI_THROTTLE: u32 = 2;
const EXTI_GEAR: u32 = 3;
const EXTI_RUDDER_PPM: u32 = 4;

/// Wraps the four dedicated parallel-PWM pins plus the shared PPM/rudder
/// pin so `InterruptSources` has somewhere concrete to enable/disable.
struct RcPins {
    aileron: Pin,
    elevator: Pin,
    throttle: Pin,
    gear: Pin,
    /// Shared: carries the rudder pulse in PWM mode, or the whole CPPM
    /// stream in CPPM mode (§4.B).
    rudder_ppm: Pin,
}

impl InterruptSources for RcPins {
    fn set_pwm_edges_enabled(&mut self, enabled: bool) {
        for pin in [
            &mut self.aileron,
            &mut self.elevator,
            &mut self.throttle,
            &mut self.gear,
        ] {
            if enabled {
                pin.enable_interrupt(HalEdge::Both);
            } else {
                pin.disable_interrupt();
            }
        }
    }

    fn set_ppm_edge_enabled(&mut self, enabled: bool) {
        if enabled {
            self.rudder_ppm.enable_interrupt(HalEdge::Falling);
        } else {
            self.rudder_ppm.disable_interrupt();
        }
    }

    fn set_serial_rx_enabled(&mut self, enabled: bool) {
        // The serial receiver itself lives in `Shared::serial_rx`; this flag
        // only gates whether its RX interrupt is unmasked, toggled from the
        // `reconfigure_mode` task where the USART resource is locked.
        SERIAL_RX_ENABLED.store(enabled, core::sync::atomic::Ordering::Relaxed);
    }

    fn clear_pending_flags(&mut self) {
        for line in [
            EXTI_AILERON,
            EXTI_ELEVATOR,
            EXTI_THROTTLE,
            EXTI_GEAR,
            EXTI_RUDDER_PPM,
        ] {
            gpio::clear_exti_interrupt(line);
        }
    }
}

/// Set by [`mode_switch`] while the USART's own enable bit is toggled under
/// lock in `reconfigure_mode`; read by the USART RX ISR to decide whether a
/// stray interrupt (e.g. one in flight during a mode change) should still be
/// serviced.
static SERIAL_RX_ENABLED: core::sync::atomic::AtomicBool =
    core::sync::atomic::AtomicBool::new(false);

#[rtic::app(device = pac, peripherals = true)]
mod app {
    use super::*;

    #[shared]
    struct Shared {
        core: RcCore,
        config: RxConfig,
        pins: RcPins,
        serial_rx: Usart<USART1>,
    }

    #[local]
    struct Local {
        rc_timer: Timer<TIM2>,
    }

    #[init]
    fn init(cx: init::Context) -> (Shared, Local, init::Monotonics) {
        let dp = cx.device;

        let clock_cfg = Clocks {
            input_src: InputSrc::Pll(PllSrc::Hse(16_000_000)),
            ..Default::default()
        };
        clock_cfg.setup().unwrap();

        // Timebase: a free-running 16-bit counter at 2.5MHz (400ns/tick),
        // per §4.A. `Timer::new_tim2` is configured for a period matching a
        // 16-bit rollover at that rate; `on_overflow` below advances the
        // library's extension counter on each wrap.
        let mut rc_timer = Timer::new_tim2(dp.TIM2, 2_500_000., Default::default(), &clock_cfg);
        rc_timer.enable_interrupt(TimerInterrupt::Update);
        rc_timer.enable();

        // Pin mapping differs slightly between board revisions; the G4-based
        // boards route the parallel-PWM bank to GPIO port B instead of A.
        cfg_if! {
            if #[cfg(feature = "h7")] {
                const RC_PORT: Port = Port::A;
            } else {
                const RC_PORT: Port = Port::B;
            }
        }
        let aileron = Pin::new(RC_PORT, 0, PinMode::Input);
        let elevator = Pin::new(RC_PORT, 1, PinMode::Input);
        let throttle = Pin::new(RC_PORT, 2, PinMode::Input);
        let gear = Pin::new(RC_PORT, 3, PinMode::Input);
        let rudder_ppm = Pin::new(RC_PORT, 4, PinMode::Input);

        let config = RxConfig::default();
        let mut pins = RcPins {
            aileron,
            elevator,
            throttle,
            gear,
            rudder_ppm,
        };

        let serial_rx = Usart::new(dp.USART1, 100_000, UsartConfig::default(), &clock_cfg);

        // Mode Switch (§4.F) arbitrates which of the above is actually live;
        // everything starts disabled until this call picks the configured
        // mode. Global interrupts are masked for the duration of `init`, so
        // no extra critical section is needed here.
        mode_switch::apply_mode(&mut pins, config.rx_mode);

        (
            Shared {
                core: RcCore::new(),
                config,
                pins,
                serial_rx,
            },
            Local { rc_timer },
            init::Monotonics(),
        )
    }

    /// Timer-overflow vector (§4.A): advances the timebase's extension
    /// counter. Runs at the highest priority among RC-related tasks since
    /// every other handler's pulse-width math depends on it not being
    /// starved.
    #[task(binds = TIM2, shared = [core], local = [rc_timer], priority = 3)]
    fn rc_timer_overflow(mut cx: rc_timer_overflow::Context) {
        cx.local.rc_timer.clear_interrupt(TimerInterrupt::Update);
        cx.shared.core.lock(|core| core.timebase.on_overflow());
    }

    /// Shared parallel-PWM + CPPM edge vector (§4.B). All four PWM pins and
    /// the PPM/rudder pin are wired to the same EXTI line group on this
    /// board's pin mapping; the handler reads which pin fired and the
    /// current level to classify rising vs. falling, then dispatches to the
    /// matching [`rc_link_core::edge_capture`] entry point.
    #[task(binds = EXTI0, shared = [core, config, pins], priority = 4)]
    fn rc_edge_isr(cx: rc_edge_isr::Context) {
        (cx.shared.core, cx.shared.config, cx.shared.pins).lock(|core, config, pins| {
            let now = rc_link_core::timebase::Timebase::atomic_read(read_tick_register);

            for (line, pin, rc_pin) in [
                (EXTI_AILERON, &mut pins.aileron, PwmPin::Aileron),
                (EXTI_ELEVATOR, &mut pins.elevator, PwmPin::Elevator),
                (EXTI_THROTTLE, &mut pins.throttle, PwmPin::Throttle),
                (EXTI_GEAR, &mut pins.gear, PwmPin::Gear),
            ] {
                if gpio::exti_interrupt_pending(line) {
                    gpio::clear_exti_interrupt(line);
                    let edge = if pin.is_high() {
                        RcEdge::Rising
                    } else {
                        RcEdge::Falling
                    };

                    if config.rx_mode == RxMode::Pwm {
                        core.edge_capture.handle_pwm_edge(
                            rc_pin,
                            edge,
                            now,
                            config.pwm_sync,
                            &mut core.channels,
                            &mut core.watchdog,
                        );
                    }
                }
            }

            if gpio::exti_interrupt_pending(EXTI_RUDDER_PPM) {
                gpio::clear_exti_interrupt(EXTI_RUDDER_PPM);
                if config.rx_mode == RxMode::Cppm && !pins.rudder_ppm.is_high() {
                    core.edge_capture.handle_ppm_edge(
                        now,
                        &config.channel_order,
                        &mut core.channels,
                        &mut core.watchdog,
                    );
                } else if config.rx_mode == RxMode::Pwm && pins.rudder_ppm.is_high() {
                    core.edge_capture.handle_pwm_edge(
                        rc_link_core::edge_capture::PwmPin::Rudder,
                        RcEdge::Rising,
                        now,
                        config.pwm_sync,
                        &mut core.channels,
                        &mut core.watchdog,
                    );
                } else if config.rx_mode == RxMode::Pwm {
                    core.edge_capture.handle_pwm_edge(
                        rc_link_core::edge_capture::PwmPin::Rudder,
                        RcEdge::Falling,
                        now,
                        config.pwm_sync,
                        &mut core.channels,
                        &mut core.watchdog,
                    );
                }
            }
        });
    }

    /// Serial receive vector, shared by every serial mode (§4.C). Reads one
    /// byte (or the line-error flags, if the hardware reported one), feeds
    /// it through the framer, then dispatches the newest byte to the active
    /// decoder.
    #[task(binds = USART1, shared = [core, config, serial_rx], priority = 4)]
    fn rc_serial_isr(cx: rc_serial_isr::Context) {
        (cx.shared.core, cx.shared.config, cx.shared.serial_rx).lock(|core, config, uart| {
            if !SERIAL_RX_ENABLED.load(core::sync::atomic::Ordering::Relaxed) {
                uart.clear_interrupt(UsartInterrupt::ReadNotEmpty);
                return;
            }

            match uart.read_one() {
                Err(_line_error) => {
                    // Line-level framing/parity/overrun: discard without
                    // advancing any state (§4.C step 1, §7 "Line-level").
                    core.decoder.record_error(RcError::LineError);
                    debug!("RC serial line error");
                }
                Ok(byte) => {
                    let now = rc_link_core::timebase::Timebase::atomic_read(read_tick_register);
                    let framed = core.framer.on_byte(now, byte);
                    if framed.new_frame {
                        core.decoder = Default::default();
                    }
                    if !framed.stored {
                        // Buffer full: this byte was timestamped and counted
                        // but dropped (§7 "Buffer overrun"). The frame is
                        // still evaluated below against whatever fixed-size
                        // prefix did fit.
                        core.decoder.record_error(RcError::BufferOverrun);
                        debug!("RC packet buffer overrun");
                    }
                    rc_link_core::decoders::dispatch(
                        config.rx_mode,
                        core.framer.packet(),
                        framed.byte_index,
                        &config.channel_order,
                        &mut core.channels,
                        &mut core.watchdog,
                        &mut core.decoder,
                        now,
                    );
                }
            }
        });
    }

    /// Foreground-callable: re-reads `config` and reconfigures which
    /// interrupt sources are live (§4.F). Takes every resource the mode
    /// switch touches so the whole reconfiguration happens under one lock,
    /// matching §5's "Mode Switch and Hard Disable both run with interrupts
    /// globally masked".
    #[task(shared = [core, config, pins, serial_rx], priority = 1)]
    fn reconfigure_mode(cx: reconfigure_mode::Context, new_config: RxConfig) {
        (
            cx.shared.core,
            cx.shared.config,
            cx.shared.pins,
            cx.shared.serial_rx,
        )
            .lock(|core, config, pins, uart| {
                *config = new_config;
                core.reset_for_mode_change();
                mode_switch::apply_mode(pins, config.rx_mode);
                if SERIAL_RX_ENABLED.load(core::sync::atomic::Ordering::Relaxed) {
                    uart.enable_interrupt(UsartInterrupt::ReadNotEmpty);
                } else {
                    uart.disable_interrupt(UsartInterrupt::ReadNotEmpty);
                }
            });
    }

    /// Mutes every RC input source regardless of `config` — used while the
    /// device is being reconfigured elsewhere (§4.F "hard disable").
    #[task(shared = [core, pins, serial_rx], priority = 1)]
    fn hard_disable(cx: hard_disable::Context) {
        (cx.shared.core, cx.shared.pins, cx.shared.serial_rx).lock(|core, pins, uart| {
            mode_switch::hard_disable(pins);
            uart.disable_interrupt(UsartInterrupt::ReadNotEmpty);
            core.reset_for_mode_change();
        });
    }
}

/// Reads the hardware tick register backing [`rc_link_core::timebase`]. On
/// this board TIM2's counter register is the 2.5MHz free-running source;
/// abstracted behind a function so `Timebase::atomic_read` can mask
/// interrupts around the read without this binary needing to know that
/// detail.
fn read_tick_register() -> u16 {
    unsafe { (*pac::TIM2::ptr()).cnt.read().cnt().bits() as u16 }
}
