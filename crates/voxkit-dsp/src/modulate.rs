//! Waveform modulation: pitch, speed, and energy.
//!
//! Transforms are applied in a fixed order — **pitch, then speed, then
//! energy** — because the windowed implementations do not commute. Pitch
//! runs first so its internal stretch/resample pair sees the unmodified
//! duration; speed then stretches once; energy is a pure gain. Tests and
//! callers rely on this order.
//!
//! Both pitch and speed are built on the phase vocoder in [`crate::stretch`]
//! (tier-two fidelity: duration and pitch are decoupled). Energy is treated
//! as a power ratio, `gain_db = 10 * log10(energy_ratio)`, converted to an
//! amplitude multiplier. After gain the whole buffer is rescaled
//! proportionally if the peak would leave [-1, 1]; per-sample hard clipping
//! is never applied.

use crate::error::{DspError, DspResult};
use crate::resample::resample_by_factor;
use crate::stretch::time_stretch;

/// Resolved modulation parameters for one request.
///
/// All ratios are 1.0 by default (identity transform) and must be strictly
/// positive and finite.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModulationParams {
    /// Playback-speed ratio. > 1.0 shortens the output at constant pitch.
    pub speed_ratio: f64,
    /// Pitch ratio. > 1.0 raises pitch at constant duration.
    pub pitch_ratio: f64,
    /// Perceived-loudness ratio, interpreted as a power ratio.
    pub energy_ratio: f64,
}

impl Default for ModulationParams {
    fn default() -> Self {
        Self {
            speed_ratio: 1.0,
            pitch_ratio: 1.0,
            energy_ratio: 1.0,
        }
    }
}

impl ModulationParams {
    /// Validates that every ratio is strictly positive and finite.
    pub fn validate(&self) -> DspResult<()> {
        for (name, value) in [
            ("speed_ratio", self.speed_ratio),
            ("pitch_ratio", self.pitch_ratio),
            ("energy_ratio", self.energy_ratio),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(DspError::invalid_param(
                    name,
                    format!("must be strictly positive, got {value}"),
                ));
            }
        }
        Ok(())
    }

    /// True when every ratio is 1.0 (the identity transform).
    pub fn is_identity(&self) -> bool {
        self.speed_ratio == 1.0 && self.pitch_ratio == 1.0 && self.energy_ratio == 1.0
    }
}

/// Converts a pitch ratio to semitones.
///
/// Zero exactly when the ratio is 1.0, positive above, negative below.
pub fn pitch_ratio_to_semitones(pitch_ratio: f64) -> f64 {
    12.0 * pitch_ratio.log2()
}

/// Applies pitch, speed, and energy modulation to a waveform.
///
/// The input is mono samples in [-1.0, 1.0]. On any stage failure the
/// partial result is discarded and the stage-tagged error propagates.
pub fn apply(samples: &[f64], _sample_rate: u32, params: &ModulationParams) -> DspResult<Vec<f64>> {
    params.validate()?;
    if samples.is_empty() {
        return Err(DspError::modulation("pitch", "empty input waveform"));
    }
    if params.is_identity() {
        return Ok(samples.to_vec());
    }

    let mut output = apply_pitch(samples, params.pitch_ratio)?;
    output = apply_speed(&output, params.speed_ratio)?;
    apply_energy(&mut output, params.energy_ratio);
    Ok(output)
}

/// Shifts pitch by `pitch_ratio` while preserving duration.
///
/// Implemented as a time stretch by `pitch_ratio` followed by resampling at
/// step `pitch_ratio`, which returns the buffer to its original length with
/// the spectrum scaled.
fn apply_pitch(samples: &[f64], pitch_ratio: f64) -> DspResult<Vec<f64>> {
    if pitch_ratio == 1.0 {
        return Ok(samples.to_vec());
    }

    let stretched = time_stretch(samples, pitch_ratio)
        .map_err(|e| DspError::modulation("pitch", e.to_string()))?;
    Ok(resample_by_factor(&stretched, pitch_ratio, samples.len()))
}

/// Changes duration by `speed_ratio` while preserving pitch.
fn apply_speed(samples: &[f64], speed_ratio: f64) -> DspResult<Vec<f64>> {
    if speed_ratio == 1.0 {
        return Ok(samples.to_vec());
    }

    time_stretch(samples, 1.0 / speed_ratio)
        .map_err(|e| DspError::modulation("speed", e.to_string()))
}

/// Applies the energy gain in place, then rescales if the peak overflows.
fn apply_energy(samples: &mut [f64], energy_ratio: f64) {
    if energy_ratio == 1.0 {
        return;
    }

    let gain_db = 10.0 * energy_ratio.log10();
    let amplitude = 10.0_f64.powf(gain_db / 20.0);
    for sample in samples.iter_mut() {
        *sample *= amplitude;
    }

    let peak = samples.iter().map(|s| s.abs()).fold(0.0_f64, f64::max);
    if peak > 1.0 {
        let rescale = 1.0 / peak;
        for sample in samples.iter_mut() {
            *sample *= rescale;
        }
    }
}
