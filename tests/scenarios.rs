use rs485_autodir::config::{TIMER_RANGE_TICKS, WDT_TIMEOUT_TICKS};
use rs485_autodir::drivers::{Phase, TICK_TABLE};
use rs485_autodir::sim::{Signal, SimConfig, Simulation, Transition};

const LONG: u32 = TIMER_RANGE_TICKS as u32;

fn sample_for(index: u8) -> u16 {
    // middle of the index's band
    ((index as u16) << 7) | 0x40
}

/// Simulation whose trimpot has been read at the first watchdog wake-up.
fn calibrated(index: u8) -> Simulation {
    let mut sim = Simulation::new(SimConfig {
        trimpot: sample_for(index),
        ..SimConfig::default()
    });
    sim.run(WDT_TIMEOUT_TICKS);
    assert_eq!(sim.calibration_index().map(|i| i.value()), Some(index));
    sim
}

/// Ticks until the driver drops, checking the LED stays on meanwhile.
fn driver_on_ticks(sim: &mut Simulation) -> u32 {
    let mut ticks = 0;
    while sim.driver_enabled() {
        assert!(sim.led_lit());
        sim.step();
        ticks += 1;
        assert!(ticks < 1000, "driver stuck on");
    }
    ticks
}

fn on(tick: u32, signal: Signal) -> Transition {
    Transition {
        tick,
        signal,
        asserted: true,
    }
}

fn off(tick: u32, signal: Signal) -> Transition {
    Transition {
        tick,
        signal,
        asserted: false,
    }
}

/// Small deterministic generator for edge spacing
struct Lcg(u32);

impl Lcg {
    fn next(&mut self, bound: u32) -> u32 {
        self.0 = self.0.wrapping_mul(1_103_515_245).wrapping_add(12_345);
        (self.0 >> 16) % bound
    }
}

#[test]
fn every_index_sets_exact_pulse() {
    for index in 0..8u8 {
        let mut sim = calibrated(index);
        let ticks = TICK_TABLE[index as usize];
        assert_eq!(sim.pulse_preload() as u16, 256 - ticks as u16);
        assert_eq!(sim.pulse_ticks(), ticks as u16);

        sim.falling_edge();
        assert_eq!(driver_on_ticks(&mut sim), ticks as u32, "index {}", index);
    }
}

#[test]
fn edge_asserts_driver_from_any_phase() {
    let mut sim = calibrated(7);

    // idle
    sim.falling_edge();
    assert!(sim.driver_enabled() && sim.led_lit());

    // middle of the short phase
    sim.run(40);
    assert_eq!(sim.phase(), Phase::ArmedShort);
    sim.falling_edge();
    assert!(sim.driver_enabled() && sim.led_lit());

    // middle of the long phase
    sim.run(94 + 100);
    assert_eq!(sim.phase(), Phase::ArmedLong);
    assert!(!sim.driver_enabled());
    sim.falling_edge();
    assert!(sim.driver_enabled() && sim.led_lit());
    assert_eq!(sim.phase(), Phase::ArmedShort);
    assert_eq!(driver_on_ticks(&mut sim), 94);
}

#[test]
fn close_edges_keep_driver_on() {
    let mut sim = calibrated(7);
    let mut rng = Lcg(7);

    sim.falling_edge();
    for _ in 0..50 {
        let gap = 1 + rng.next(93);
        for _ in 0..gap {
            sim.step();
            assert!(sim.driver_enabled(), "dropped at tick {}", sim.now());
        }
        sim.falling_edge();
    }

    let drivers_on = sim
        .trace()
        .iter()
        .filter(|t| t.signal == Signal::DriverEnable && t.asserted)
        .count();
    assert_eq!(drivers_on, 1);
    assert_eq!(driver_on_ticks(&mut sim), 94);
}

#[test]
fn led_outlasts_driver_by_one_timer_period() {
    for index in [0u8, 3, 6] {
        let mut sim = calibrated(index);
        let pulse = TICK_TABLE[index as usize] as u32;

        sim.falling_edge();
        sim.run(5);
        sim.falling_edge();
        let last_edge = sim.now();
        sim.run_until_idle(1000);

        let trace = sim.trace();
        assert_eq!(trace[trace.len() - 2], off(last_edge + pulse, Signal::DriverEnable));
        assert_eq!(trace[trace.len() - 1], off(last_edge + pulse + LONG, Signal::Led));
        assert!(!sim.timer().overflow_enabled());
    }
}

#[test]
fn led_always_covers_driver() {
    let mut sim = calibrated(4);
    let mut rng = Lcg(42);

    for round in 0..400 {
        if round % 50 == 0 {
            sim.set_trimpot(sample_for(rng.next(8) as u8));
        }
        if rng.next(3) == 0 {
            sim.falling_edge();
            assert!(sim.driver_enabled());
        }
        for _ in 0..rng.next(400) {
            sim.step();
            assert!(!sim.driver_enabled() || sim.led_lit(), "tick {}", sim.now());
        }
    }
}

#[test]
fn scenario_a_single_edge_at_9600() {
    let mut sim = calibrated(4);
    assert_eq!(sim.pulse_ticks(), 12);

    let t0 = sim.now();
    sim.falling_edge();
    sim.run(12 + LONG + 100);

    assert_eq!(
        sim.trace(),
        [
            on(t0, Signal::DriverEnable),
            on(t0, Signal::Led),
            off(t0 + 12, Signal::DriverEnable),
            off(t0 + 12 + LONG, Signal::Led),
        ]
    );
    assert_eq!(sim.phase(), Phase::Idle);
}

#[test]
fn scenario_b_retrigger_at_1200() {
    let mut sim = calibrated(7);

    let t0 = sim.now();
    sim.falling_edge();
    sim.run(50);
    sim.falling_edge();
    sim.run_until_idle(1000);

    assert_eq!(
        sim.trace(),
        [
            on(t0, Signal::DriverEnable),
            on(t0, Signal::Led),
            off(t0 + 50 + 94, Signal::DriverEnable),
            off(t0 + 50 + 94 + LONG, Signal::Led),
        ]
    );
}

#[test]
fn scenario_c_silent_bus() {
    let mut sim = Simulation::new(SimConfig::default());
    sim.run(5 * WDT_TIMEOUT_TICKS + 10);

    assert!(sim.trace().is_empty());
    assert!(!sim.driver_enabled());
    assert!(!sim.led_lit());
    assert_eq!(sim.wakes(), 5);
    assert_eq!(sim.watchdog_feeds(), 5);
    assert_eq!(sim.resets(), 0);
    assert_eq!(sim.pulse_ticks(), 6);
    assert_eq!(sim.phase(), Phase::Idle);
}

#[test]
fn scenario_d_stuck_conversion() {
    let mut sim = Simulation::new(SimConfig {
        trimpot: sample_for(7),
        adc_stuck: true,
        ..SimConfig::default()
    });
    sim.run(3 * WDT_TIMEOUT_TICKS);
    assert_eq!(sim.calibration_index(), None);
    assert_eq!(sim.pulse_preload(), 256u16.wrapping_sub(6) as u8);

    sim.falling_edge();
    assert_eq!(driver_on_ticks(&mut sim), 6);
    assert_eq!(sim.run_until_idle(1000), LONG);
    assert_eq!(sim.resets(), 0);
}

#[test]
fn hung_main_loop_is_reset_by_watchdog() {
    let mut sim = calibrated(7);
    sim.hang();

    // interrupts keep working without the main loop
    sim.falling_edge();
    assert_eq!(driver_on_ticks(&mut sim), 94);
    sim.run_until_idle(1000);

    sim.run(2 * WDT_TIMEOUT_TICKS);
    assert_eq!(sim.resets(), 1);
    assert_eq!(sim.wakes(), 0);
    assert_eq!(sim.pulse_ticks(), 6);
    assert_eq!(sim.calibration_index(), None);
    assert!(!sim.driver_enabled() && !sim.led_lit());

    // the fresh main loop picks the trimpot up again
    sim.run(WDT_TIMEOUT_TICKS);
    assert_eq!(sim.pulse_ticks(), 94);
    assert_eq!(sim.resets(), 1);
}

#[test]
fn reset_releases_outputs() {
    let mut sim = calibrated(7);
    sim.hang();
    // keep the driver busy right up to the reset
    let mut elapsed = 0;
    while sim.resets() == 0 {
        sim.falling_edge();
        sim.run(50);
        elapsed += 50;
        assert!(elapsed <= 3 * WDT_TIMEOUT_TICKS);
    }
    // fed at the end of calibration, then one interrupt and one reset period
    assert_eq!(sim.now(), 3 * WDT_TIMEOUT_TICKS);
    let reset_at = sim.now();
    assert!(!sim.led_lit());
    let trace = sim.trace();
    assert_eq!(trace[trace.len() - 2], off(reset_at, Signal::DriverEnable));
    assert_eq!(trace[trace.len() - 1], off(reset_at, Signal::Led));
}

#[test]
fn default_pulse_until_first_conversion() {
    let mut sim = Simulation::new(SimConfig {
        trimpot: sample_for(7),
        ..SimConfig::default()
    });

    // the bus starts talking before the first conversion is done
    sim.falling_edge();
    assert_eq!(sim.pulse_ticks(), 6);
    assert_eq!(driver_on_ticks(&mut sim), 6);

    // the overflow woke the main loop, which picked up the finished conversion
    assert_eq!(sim.pulse_ticks(), 94);
    sim.falling_edge();
    assert_eq!(driver_on_ticks(&mut sim), 94);
}

#[test]
fn trimpot_change_applies_after_next_conversion() {
    let mut sim = calibrated(4);
    sim.set_trimpot(sample_for(1));
    assert_eq!(sim.pulse_ticks(), 12);

    // the edge still uses the old setting; its first overflow wakes the loop,
    // which reads the conversion started after the previous read
    sim.falling_edge();
    assert_eq!(driver_on_ticks(&mut sim), 12);
    assert_eq!(sim.pulse_ticks(), 2);

    sim.run_until_idle(1000);
    sim.falling_edge();
    assert_eq!(driver_on_ticks(&mut sim), 2);
}
