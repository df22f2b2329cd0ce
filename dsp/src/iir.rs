use serde::{Deserialize, Serialize};

use super::macc;

/// Feed-forward tap applied to the current input `u0`.
pub const B2: f32 = 1.0;
/// Feed-forward tap applied to the previous input `u1`.
pub const B1: f32 = -1.965;
/// Feed-forward tap applied to the oldest input `u2`.
pub const B0: f32 = 0.9999;
/// Leading feedback tap. The recurrence is normalized to it.
pub const A2: f32 = 1.0;
/// Feedback tap applied to the previous output `y1`.
pub const A1: f32 = -1.955;
/// Feedback tap applied to the oldest output `y2`.
pub const A0: f32 = 0.99;

/// Biquad tap vector.
///
/// Ordered like the samples they multiply: the three inputs (newest first)
/// followed by the two previous outputs. The feedback taps are stored
/// negated so that the update is a plain multiply-accumulate:
///
/// `[B2, B1, B0, -A1, -A0]`
pub type Vec5 = [f32; 5];

/// Filter state.
///
/// Holds the latest rescaled input and output (`u0`, `y0`) and two samples of
/// history for each. After every [Biquad::update] the history satisfies
/// `u1 == u0'`, `u2 == u1'`, `y1 == y0'`, `y2 == y1'` where the primed values
/// are the ones before the update.
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct State {
    pub u0: f32,
    pub u1: f32,
    pub u2: f32,
    pub y0: f32,
    pub y1: f32,
    pub y2: f32,
}

impl State {
    /// Cold-start state: all samples zero.
    pub const fn new() -> Self {
        Self {
            u0: 0.,
            u1: 0.,
            u2: 0.,
            y0: 0.,
            y1: 0.,
            y2: 0.,
        }
    }

    /// Age the history by one sample, discarding the oldest.
    fn shift(&mut self) {
        self.y2 = self.y1;
        self.y1 = self.y0;
        self.u2 = self.u1;
        self.u1 = self.u0;
    }
}

/// Second order IIR filter with fixed taps.
///
/// The output is computed as
///
/// `y0 = -A1*y1 - A0*y2 + B2*u0 + B1*u1 + B0*u2`
///
/// with `A2 = 1` implied.
#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
pub struct Biquad {
    ba: Vec5,
}

/// The 60 Hz notch at a 2 kHz sample rate.
///
/// Zeros sit just inside the unit circle (radius `sqrt(B0)`) at about
/// 59.55 Hz, poles at radius `sqrt(A0)` on the same angle. DC and the bands
/// away from the notch pass with a gain within 0.05 dB of unity.
pub const NOTCH_60HZ: Biquad = Biquad::new([
    B2 / A2,
    B1 / A2,
    B0 / A2,
    -A1 / A2,
    -A0 / A2,
]);

impl Biquad {
    /// A biquad from its taps `[B2, B1, B0, -A1, -A0]`, normalized to `A2 = 1`.
    pub const fn new(ba: Vec5) -> Self {
        Self { ba }
    }

    /// The tap vector `[B2, B1, B0, -A1, -A0]`.
    pub fn ba(&self) -> &Vec5 {
        &self.ba
    }

    /// Overall DC gain, `sum(B) / sum(A)` with the taps normalized to `A2 = 1`.
    pub fn dc_gain(&self) -> f32 {
        let b: f32 = self.ba[..3].iter().sum();
        let a: f32 = 1. - self.ba[3..].iter().sum::<f32>();
        b / a
    }

    /// Feed a new input value into the filter, update the filter state, and
    /// return the new output. Only the state `xy` is modified.
    ///
    /// # Arguments
    /// * `xy` - Current filter state.
    /// * `u0` - New (rescaled) input.
    pub fn update(&self, xy: &mut State, u0: f32) -> f32 {
        xy.shift();
        xy.u0 = u0;
        let y0 = macc(0., &[xy.u0, xy.u1, xy.u2, xy.y1, xy.y2], &self.ba);
        xy.y0 = y0;
        y0
    }
}
