use core::convert::Infallible;
use std::cell::RefCell;
use std::f64::consts::PI;
use std::rc::Rc;

use embedded_hal::digital::{ErrorType, OutputPin};

use notch::hardware::{
    design_parameters::{MCLK, SAMPLE_CLOCK_DIVIDER, SAMPLE_RATE, SAMPLE_TICKS},
    BlockingAdc, ClockConfig, Converter, OutputMode, ParallelDac, Port,
    SampleClock, TickSource,
};
use notch::{Engine, Settings};

/// A converter sampling a sum of sinusoids on top of mid-scale.
struct SignalConverter {
    tones: Vec<(f64, f64)>,
    n: u64,
    value: u16,
    busy_polls: u32,
}

impl SignalConverter {
    /// # Args
    /// * `tones` - `(frequency in Hz, amplitude in ADC codes)` pairs.
    fn new(tones: &[(f64, f64)]) -> Self {
        Self {
            tones: tones.to_vec(),
            n: 0,
            value: 0,
            busy_polls: 0,
        }
    }
}

impl Converter for SignalConverter {
    fn start_conversion(&mut self) {
        let t = self.n as f64 / SAMPLE_RATE.raw() as f64;
        let x = self
            .tones
            .iter()
            .fold(8192., |x, (f, a)| x + a * (2. * PI * f * t).sin());
        self.value = x as u16;
        self.n += 1;
        self.busy_polls = 3;
    }

    fn is_busy(&mut self) -> bool {
        self.busy_polls = self.busy_polls.saturating_sub(1);
        self.busy_polls > 0
    }

    fn result(&mut self) -> u16 {
        self.value
    }
}

/// The DAC data latch: assembles the word from the two ports and latches it on /WR low.
#[derive(Default)]
struct Latch {
    high: u8,
    low: u8,
    write_enabled: bool,
    latched: Vec<u16>,
}

#[derive(Clone)]
struct HighPort(Rc<RefCell<Latch>>);
#[derive(Clone)]
struct LowPort(Rc<RefCell<Latch>>);
#[derive(Clone)]
struct WrPin(Rc<RefCell<Latch>>);

impl ErrorType for HighPort {
    type Error = Infallible;
}

impl Port for HighPort {
    fn write(&mut self, value: u8) -> Result<(), Infallible> {
        self.0.borrow_mut().high = value & 0x0f;
        Ok(())
    }
}

impl ErrorType for LowPort {
    type Error = Infallible;
}

impl Port for LowPort {
    fn write(&mut self, value: u8) -> Result<(), Infallible> {
        self.0.borrow_mut().low = value;
        Ok(())
    }
}

impl ErrorType for WrPin {
    type Error = Infallible;
}

impl OutputPin for WrPin {
    fn set_low(&mut self) -> Result<(), Infallible> {
        let mut latch = self.0.borrow_mut();
        if !latch.write_enabled {
            let word = (latch.high as u16) << 8 | latch.low as u16;
            latch.latched.push(word);
        }
        latch.write_enabled = true;
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Infallible> {
        self.0.borrow_mut().write_enabled = false;
        Ok(())
    }
}

/// Run the notch for `seconds` on the given input tones and return the latched DAC codes.
fn run(tones: &[(f64, f64)], seconds: u32) -> Vec<u16> {
    let latch = Rc::new(RefCell::new(Latch::default()));
    let mut engine = Engine::new(
        BlockingAdc::new(SignalConverter::new(tones)),
        ParallelDac::new(
            HighPort(latch.clone()),
            LowPort(latch.clone()),
            WrPin(latch.clone()),
        ),
        Settings {
            output: OutputMode::Saturate,
            log_overruns: true,
        },
    );

    let mut clock = SampleClock::new(
        ClockConfig::new(MCLK, SAMPLE_CLOCK_DIVIDER, SAMPLE_TICKS).unwrap(),
    );
    clock.start();
    for _ in 0..seconds {
        clock.run_for(MCLK.raw(), |ticks| {
            engine.on_tick(ticks).unwrap();
        });
    }
    assert_eq!(clock.pending(), 0);

    let telemetry = *engine.telemetry();
    assert_eq!(telemetry.ticks, seconds * SAMPLE_RATE.raw());
    assert_eq!(telemetry.overruns, 0);
    assert_eq!(telemetry.errors, 0);

    drop(engine);
    let latched = latch.borrow().latched.clone();
    assert_eq!(latched.len(), telemetry.ticks as usize);
    assert_eq!(*latched.last().unwrap(), telemetry.latest_output);
    latched
}

/// Peak-to-peak swing over the last second.
fn swing(codes: &[u16]) -> u16 {
    let tail = &codes[codes.len() - SAMPLE_RATE.raw() as usize..];
    tail.iter().max().unwrap() - tail.iter().min().unwrap()
}

#[test]
fn passes_low_frequencies() {
    // 2000 codes peak-to-peak after rescaling.
    let codes = run(&[(10., 4000.)], 10);
    let s = swing(&codes);
    assert!((1980..=2010).contains(&s), "{s}");
}

#[test]
fn rejects_mains() {
    let codes = run(&[(59.55, 4000.)], 10);
    let s = swing(&codes);
    assert!(s < 40, "{s}");
}

#[test]
fn separates_mains_from_signal() {
    let mixed = run(&[(10., 2000.), (59.55, 2000.)], 10);
    let clean = run(&[(10., 2000.)], 10);
    let tail = mixed.len() - SAMPLE_RATE.raw() as usize;
    let error = mixed[tail..]
        .iter()
        .zip(&clean[tail..])
        .map(|(a, b)| (*a as i32 - *b as i32).abs())
        .max()
        .unwrap();
    assert!(error < 15, "{error}");
}
