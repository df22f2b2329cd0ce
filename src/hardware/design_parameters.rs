use fugit::{HertzU32, MicrosDurationU32};

use super::timers::Divider;

/// The master clock (DCO) frequency.
pub const MCLK: HertzU32 = HertzU32::MHz(48);

/// The divider from the master clock down to the sampling timer reference.
pub const SAMPLE_CLOCK_DIVIDER: Divider = Divider::Div64;

/// The sampling timer reference clock. 48 MHz / 64 = 750 kHz.
pub const SAMPLE_CLOCK_REFERENCE: HertzU32 =
    HertzU32::from_raw(MCLK.raw() >> SAMPLE_CLOCK_DIVIDER as u8);

// The number of reference clock cycles between samples.
// 750 kHz / 375 = 2 kHz.
pub const SAMPLE_TICKS: u16 = 375;

/// The sample rate of the filter.
pub const SAMPLE_RATE: HertzU32 =
    HertzU32::from_raw(SAMPLE_CLOCK_REFERENCE.raw() / SAMPLE_TICKS as u32);

/// The time between samples, i.e. the processing deadline of each tick.
pub const SAMPLE_PERIOD: MicrosDurationU32 =
    MicrosDurationU32::from_ticks(1_000_000 / SAMPLE_RATE.raw());

/// Input converter resolution in bits.
pub const ADC_BITS: u32 = 14;

/// Output converter resolution in bits.
pub const DAC_BITS: u32 = 12;

/// The ADC conversion clock: MCLK, predivided by 4 and divided by 8.
pub const ADC_CLOCK: HertzU32 = HertzU32::from_raw(MCLK.raw() / 4 / 8);

// Sample-and-hold of 32 ADC clocks followed by 16 clocks of 14 bit
// conversion.
pub const ADC_CONVERSION_CYCLES: u32 = 32 + 16;

/// Worst-case time from conversion start to a valid result.
pub const ADC_CONVERSION_TIME: MicrosDurationU32 = MicrosDurationU32::from_ticks(
    ADC_CONVERSION_CYCLES * 1_000_000 / ADC_CLOCK.raw(),
);

/// Worst-case MCLK cycles per busy-flag poll: peripheral register read, compare and branch.
pub const ADC_POLL_CYCLES: u32 = 10;

/// The number of busy-flag polls after which a conversion is considered lost.
///
/// At [ADC_POLL_CYCLES] per poll the budget is spent in ~427 us, inside the sample period.
/// At one MCLK cycle per poll it still outlasts a conversion.
pub const ADC_MAX_POLLS: u32 = 2048;

// Acquisition must complete well inside a sample period; leave at least half
// of it for the filter update and the DAC write.
const _: () = assert!(
    2 * ADC_CONVERSION_TIME.ticks() < SAMPLE_PERIOD.ticks(),
    "ADC conversion does not fit the sample period"
);

// A lost conversion must time out before the next tick, and a valid one must not.
const _: () = assert!(
    ADC_MAX_POLLS * ADC_POLL_CYCLES < MCLK.raw() / SAMPLE_RATE.raw(),
    "ADC poll budget exceeds the sample period"
);
const _: () = assert!(
    ADC_MAX_POLLS >= ADC_CONVERSION_CYCLES * (MCLK.raw() / ADC_CLOCK.raw()),
    "ADC poll budget is shorter than a conversion"
);

const _: () = assert!(SAMPLE_RATE.raw() == 2_000);
