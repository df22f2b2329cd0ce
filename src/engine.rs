//! The filter step engine.
//!
//! # Design
//! One [Engine::on_tick] call is one filter step: acquire a sample, rescale it to the output
//! range, advance the notch recurrence, write the DAC and acknowledge the tick. The engine owns
//! the filter state and both converters and is handed out as `&mut` to the tick handler, so
//! steps cannot overlap or re-enter.
//!
//! # Note
//! Processing time is bounded by the sample period: acquisition, update and output must finish
//! before the sample clock raises the next tick. If this constraint is not met, the extra ticks
//! are counted as overruns in the [Telemetry] and dropped. The filter is not compensated for
//! lost samples.
use dsp::iir;

use crate::hardware::{
    adc::AnalogIn,
    dac::{AnalogOut, DacCode},
    timers::TickSource,
};
use crate::{settings::Settings, telemetry::Telemetry};

/// Errors from a filter step.
#[derive(Copy, Clone, Debug, PartialEq, thiserror::Error)]
pub enum Error<A, D> {
    /// Acquisition failed. The filter state was not advanced.
    #[error("Acquisition failed: {0:?}")]
    Adc(A),
    /// Output failed. The filter state was advanced.
    #[error("Output failed: {0:?}")]
    Dac(D),
}

pub struct Engine<A, D> {
    adc: A,
    dac: D,
    iir: iir::Biquad,
    state: iir::State,
    settings: Settings,
    telemetry: Telemetry,
}

impl<A, D> Engine<A, D>
where
    A: AnalogIn,
    D: AnalogOut,
    A::Error: core::fmt::Debug,
    D::Error: core::fmt::Debug,
{
    /// Construct the engine with the 60 Hz notch and a cold (all-zero) filter state.
    ///
    /// # Args
    /// * `adc` - The analog input.
    /// * `dac` - The analog output.
    /// * `settings` - Output and reporting policy.
    pub fn new(adc: A, dac: D, settings: Settings) -> Self {
        log::info!("Notch engine: {:?}", settings);
        Self {
            adc,
            dac,
            iir: iir::NOTCH_60HZ,
            state: iir::State::new(),
            settings,
            telemetry: Telemetry::default(),
        }
    }

    /// Service one sample tick.
    ///
    /// Runs a [Engine::step] and acknowledges the tick whether or not the step succeeded.
    /// Ticks that were raised while the step was running are counted as overruns.
    ///
    /// # Returns
    /// The DAC code written.
    pub fn on_tick<T: TickSource>(
        &mut self,
        ticks: &mut T,
    ) -> Result<DacCode, Error<A::Error, D::Error>> {
        let result = self.step();

        let lost = ticks.pending().saturating_sub(1);
        if lost > 0 {
            self.telemetry.overruns = self.telemetry.overruns.wrapping_add(lost);
            if self.settings.log_overruns {
                log::warn!("Sample deadline missed, {} tick(s) lost", lost);
            }
        }
        ticks.acknowledge();

        if let Err(e) = &result {
            self.telemetry.errors = self.telemetry.errors.wrapping_add(1);
            log::error!("Filter step failed: {:?}", e);
        }
        result
    }

    /// Run one filter step without tick bookkeeping.
    pub fn step(&mut self) -> Result<DacCode, Error<A::Error, D::Error>> {
        let x = self.adc.read().map_err(Error::Adc)?;
        let y = self.iir.update(&mut self.state, x.into());

        let (code, clipped) = DacCode::from_output(y, self.settings.output);
        if clipped {
            self.telemetry.clipped = self.telemetry.clipped.wrapping_add(1);
        }
        self.telemetry.ticks = self.telemetry.ticks.wrapping_add(1);
        self.telemetry.latest_input = x.0;
        self.telemetry.latest_output = code.value();

        self.dac.write(code).map_err(Error::Dac)?;
        Ok(code)
    }

    /// The filter state after the latest step.
    pub fn state(&self) -> &iir::State {
        &self.state
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn telemetry(&self) -> &Telemetry {
        &self.telemetry
    }

    /// Release the converters.
    pub fn free(self) -> (A, D) {
        (self.adc, self.dac)
    }
}
