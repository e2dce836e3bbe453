#![cfg_attr(target_arch = "avr", no_std, no_main, feature(abi_avr_interrupt))]

#[cfg(target_arch = "avr")]
use panic_halt as _;

#[cfg(target_arch = "avr")]
mod firmware {
    use avr_device::attiny13a::Peripherals;
    use avr_device::interrupt::{self, Mutex};
    use core::cell::RefCell;
    use embedded_hal::watchdog::WatchdogEnable;

    use rs485_autodir::drivers::{Calibration, LineOutputs, PulseTicks, TimingEngine};
    use rs485_autodir::hal::gpio::board;
    use rs485_autodir::hal::{
        exint, Adc, AdcPrescaler, DriverEnable, Power, Prescaler, SleepMode, StatusLed, Timer0,
        TrimPot, Watchdog, WatchdogTimeout,
    };
    use rs485_autodir::os::Supervisor;

    type Engine = TimingEngine<DriverEnable, StatusLed, Timer0>;

    // Written by the main loop only, read by INT0
    static PULSE: PulseTicks = PulseTicks::new();

    // Touched only by the INT0 and TIM0_OVF handlers after init
    static ENGINE: Mutex<RefCell<Option<Engine>>> = Mutex::new(RefCell::new(None));

    #[avr_device::entry]
    fn main() -> ! {
        // SAFETY: first and only use of the peripherals, interrupts are still
        // disabled.
        let dp = unsafe { Peripherals::steal() };

        let mut power = Power::new(dp.CPU);
        power.clear_reset_flags();

        let pins = board::configure(dp.PORTB);

        power.set_sleep_mode(SleepMode::Idle);
        power.enable_sleep();

        let mut watchdog = Watchdog::new(dp.WDT);
        watchdog.start(WatchdogTimeout::Ms4000);

        exint::listen_falling_edge(power.cpu(), dp.EXINT, pins.tx_sense);

        let outputs = LineOutputs::new(pins.driver_enable, pins.led);
        let engine = TimingEngine::new(outputs, Timer0::new(dp.TC0, Prescaler::Div1024));
        interrupt::free(|cs| {
            ENGINE.borrow(cs).replace(Some(engine));
        });

        let mut calibration: Calibration<Adc, _, _> =
            Calibration::new(Adc::new(dp.ADC, AdcPrescaler::Div128), TrimPot);

        let mut supervisor = Supervisor::new(power, watchdog);

        // SAFETY: all shared state is initialized.
        unsafe { interrupt::enable() };

        supervisor.run(&mut calibration, &PULSE)
    }

    #[avr_device::interrupt(attiny13a)]
    fn INT0() {
        interrupt::free(|cs| {
            if let Some(engine) = ENGINE.borrow(cs).borrow_mut().as_mut() {
                engine.on_falling_edge(&PULSE);
            }
        });
    }

    #[avr_device::interrupt(attiny13a)]
    fn TIM0_OVF() {
        interrupt::free(|cs| {
            if let Some(engine) = ENGINE.borrow(cs).borrow_mut().as_mut() {
                engine.on_timer_overflow();
            }
        });
    }

    // Only there to end the sleep so the main loop can feed the watchdog
    #[avr_device::interrupt(attiny13a)]
    fn WDT() {}
}

/// Host build: replay a short burst on the simulator and print the outputs.
#[cfg(not(target_arch = "avr"))]
fn main() -> std::io::Result<()> {
    use rs485_autodir::config::WDT_TIMEOUT_TICKS;
    use rs485_autodir::sim::{SimConfig, Simulation};
    use ufmt::uwriteln;

    let mut out = Console(std::io::stdout().lock());

    // trimpot at 9600 bps, read at the first watchdog wake-up
    let mut sim = Simulation::new(SimConfig {
        trimpot: 4 << 7,
        ..SimConfig::default()
    });
    sim.run(WDT_TIMEOUT_TICKS);
    uwriteln!(&mut out, "pulse: {} ticks", sim.pulse_ticks())?;

    // three back-to-back bytes, ~10 ticks each at 9600 bps
    for _ in 0..3 {
        sim.falling_edge();
        sim.run(10);
    }
    sim.run_until_idle(1000);

    for transition in sim.trace() {
        uwriteln!(&mut out, "{}", transition)?;
    }
    Ok(())
}

#[cfg(not(target_arch = "avr"))]
struct Console<W>(W);

#[cfg(not(target_arch = "avr"))]
impl<W: std::io::Write> ufmt::uWrite for Console<W> {
    type Error = std::io::Error;

    fn write_str(&mut self, s: &str) -> std::io::Result<()> {
        self.0.write_all(s.as_bytes())
    }
}
