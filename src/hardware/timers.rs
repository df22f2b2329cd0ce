//! The sample clock paces the filter: a divided reference clock drives an up-counter that
//! latches a tick every time it reaches the compare count.
use fugit::{HertzU32, MicrosDurationU32};
use num_enum::TryFromPrimitive;

/// Prescalers between the reference clock and the counter.
///
/// Discriminants are the 3-bit divider register field values.
#[derive(Copy, Clone, Debug, PartialEq, Eq, TryFromPrimitive)]
#[repr(u8)]
pub enum Divider {
    Div1 = 0b000,
    Div2 = 0b001,
    Div4 = 0b010,
    Div8 = 0b011,
    Div16 = 0b100,
    Div32 = 0b101,
    Div64 = 0b110,
    Div128 = 0b111,
}

impl Divider {
    /// The division factor.
    pub const fn factor(self) -> u32 {
        1 << self as u8
    }
}

/// Represents the errors that can occur when configuring the sample clock.
#[derive(Copy, Clone, Debug, PartialEq, thiserror::Error)]
pub enum Error {
    /// A compare count of zero never raises a tick.
    #[error("Compare count must be non-zero")]
    ZeroCompare,
    /// The divided reference is not an integer multiple of the requested rate.
    #[error("Sample rate is not an integer division of the reference")]
    Inexact,
    /// The compare count does not fit the compare register.
    #[error("Compare count out of range")]
    Range,
    /// The reference clock is too slow to raise at least one tick per second.
    #[error("Reference clock slower than the tick period")]
    Reference,
}

/// Static configuration of the sample clock.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ClockConfig {
    reference: HertzU32,
    divider: Divider,
    compare: u16,
}

impl ClockConfig {
    /// Construct a configuration from its register-level parameters.
    ///
    /// # Args
    /// * `reference` - The frequency of the clock feeding the divider.
    /// * `divider` - The prescaler between reference and counter.
    /// * `compare` - The counter value at which a tick is raised.
    pub fn new(
        reference: HertzU32,
        divider: Divider,
        compare: u16,
    ) -> Result<Self, Error> {
        if compare == 0 {
            return Err(Error::ZeroCompare);
        }
        let config = Self {
            reference,
            divider,
            compare,
        };
        if reference.raw() < config.cycles_per_tick() {
            return Err(Error::Reference);
        }
        Ok(config)
    }

    /// Derive the compare count for a desired tick rate.
    ///
    /// # Args
    /// * `reference` - The frequency of the clock feeding the divider.
    /// * `divider` - The prescaler between reference and counter.
    /// * `rate` - The desired tick rate.
    pub fn for_rate(
        reference: HertzU32,
        divider: Divider,
        rate: HertzU32,
    ) -> Result<Self, Error> {
        let counter = reference.raw() / divider.factor();
        if rate.raw() == 0 || counter % rate.raw() != 0 {
            return Err(Error::Inexact);
        }
        let compare =
            u16::try_from(counter / rate.raw()).map_err(|_| Error::Range)?;
        Self::new(reference, divider, compare)
    }

    pub fn reference(&self) -> HertzU32 {
        self.reference
    }

    pub fn divider(&self) -> Divider {
        self.divider
    }

    pub fn compare(&self) -> u16 {
        self.compare
    }

    /// The number of reference clock cycles between ticks.
    pub fn cycles_per_tick(&self) -> u32 {
        self.divider.factor() * self.compare as u32
    }

    /// The tick rate.
    pub fn sample_rate(&self) -> HertzU32 {
        HertzU32::from_raw(self.reference.raw() / self.cycles_per_tick())
    }

    /// The time between ticks.
    pub fn period(&self) -> MicrosDurationU32 {
        MicrosDurationU32::from_ticks(
            (self.cycles_per_tick() as u64 * 1_000_000
                / self.reference.raw() as u64) as u32,
        )
    }
}

/// A periodic event source driving the filter.
pub trait TickSource {
    /// The number of ticks raised since the last acknowledge.
    ///
    /// More than one pending tick means the handler did not finish before the next tick
    /// and the extra ticks are lost once acknowledged.
    fn pending(&self) -> u32;

    /// Clear the pending tick condition.
    fn acknowledge(&mut self);
}

/// The sample clock.
///
/// A model of an up-mode timer: every `divider` reference cycles the counter increments, and
/// upon reaching the compare count it latches a tick and restarts from zero.
pub struct SampleClock {
    config: ClockConfig,
    running: bool,
    // Reference cycles accumulated towards the next counter increment.
    prescale: u32,
    counter: u16,
    pending: u32,
}

impl SampleClock {
    /// Construct the sample clock. The clock is stopped until [SampleClock::start].
    pub fn new(config: ClockConfig) -> Self {
        Self {
            config,
            running: false,
            prescale: 0,
            counter: 0,
            pending: 0,
        }
    }

    pub fn config(&self) -> &ClockConfig {
        &self.config
    }

    /// Start the sample clock from a zero count.
    pub fn start(&mut self) {
        self.prescale = 0;
        self.counter = 0;
        self.running = true;
        log::info!(
            "Sample clock started at {} Hz ({} us period)",
            self.config.sample_rate().raw(),
            self.config.period().ticks()
        );
    }

    /// Stop counting. Pending ticks are retained.
    pub fn stop(&mut self) {
        self.running = false;
        log::info!("Sample clock stopped");
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// The current counter value.
    pub fn counter(&self) -> u16 {
        self.counter
    }

    /// Count `cycles` reference clock cycles, latching ticks without servicing them.
    ///
    /// # Returns
    /// The number of ticks raised.
    pub fn advance(&mut self, cycles: u32) -> u32 {
        if !self.running {
            return 0;
        }

        let factor = self.config.divider.factor() as u64;
        let compare = self.config.compare as u64;

        let prescaled = self.prescale as u64 + cycles as u64;
        self.prescale = (prescaled % factor) as u32;

        let counted = self.counter as u64 + prescaled / factor;
        self.counter = (counted % compare) as u16;

        let ticks = (counted / compare) as u32;
        self.pending = self.pending.saturating_add(ticks);
        ticks
    }

    /// Count `cycles` reference clock cycles, invoking `on_tick` for every tick raised.
    ///
    /// The handler runs to completion before counting resumes and is expected to acknowledge
    /// the tick. Time spent in the handler is not modeled; use [SampleClock::advance] to latch
    /// ticks behind the handler's back.
    pub fn run_for<F>(&mut self, mut cycles: u32, mut on_tick: F)
    where
        F: FnMut(&mut Self),
    {
        while self.running {
            let factor = self.config.divider.factor();
            let to_tick = (self.config.compare - self.counter) as u32 * factor
                - self.prescale;
            if cycles < to_tick {
                self.advance(cycles);
                break;
            }
            self.advance(to_tick);
            cycles -= to_tick;
            on_tick(self);
        }
    }
}

impl TickSource for SampleClock {
    fn pending(&self) -> u32 {
        self.pending
    }

    fn acknowledge(&mut self) {
        self.pending = 0;
    }
}
