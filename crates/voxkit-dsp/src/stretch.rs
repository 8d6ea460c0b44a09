//! Phase-vocoder time stretching.
//!
//! Changes the duration of a signal without changing its pitch. Analysis
//! frames are taken at a variable hop, re-phased against a fixed synthesis
//! hop, and overlap-added. This is the primitive under both the speed
//! transform (used directly) and the pitch transform (stretch followed by
//! resampling).

use rustfft::num_complex::Complex;
use rustfft::FftPlanner;

use crate::error::{DspError, DspResult};

/// FFT frame size for stretching.
const FRAME_SIZE: usize = 2048;

/// Fixed synthesis hop (FRAME_SIZE / 4 gives 75% overlap).
const SYNTHESIS_HOP: usize = FRAME_SIZE / 4;

/// Stretches `samples` in time by `factor` without altering pitch.
///
/// `factor` is the output/input duration ratio: 2.0 doubles the duration,
/// 0.5 halves it. The caller validates positivity; this function reports an
/// empty input or a degenerate factor as a stage error.
pub fn time_stretch(samples: &[f64], factor: f64) -> DspResult<Vec<f64>> {
    if samples.is_empty() {
        return Err(DspError::modulation("stretch", "empty input buffer"));
    }
    if !factor.is_finite() || factor <= 0.0 {
        return Err(DspError::modulation(
            "stretch",
            format!("degenerate stretch factor {factor}"),
        ));
    }
    if (factor - 1.0).abs() < 1e-9 {
        return Ok(samples.to_vec());
    }

    let analysis_hop = SYNTHESIS_HOP as f64 / factor;
    let out_len = (samples.len() as f64 * factor).round() as usize;

    let mut planner = FftPlanner::<f64>::new();
    let fft = planner.plan_fft_forward(FRAME_SIZE);
    let ifft = planner.plan_fft_inverse(FRAME_SIZE);
    let window = hann_window(FRAME_SIZE);

    let mut output = vec![0.0f64; out_len + FRAME_SIZE];
    let mut window_sum = vec![0.0f64; out_len + FRAME_SIZE];

    let mut prev_phase = vec![0.0f64; FRAME_SIZE];
    let mut synth_phase = vec![0.0f64; FRAME_SIZE];
    let mut buffer = vec![Complex::new(0.0, 0.0); FRAME_SIZE];

    let mut frame_index = 0usize;
    loop {
        let analysis_pos = (frame_index as f64 * analysis_hop).round() as usize;
        let synthesis_pos = frame_index * SYNTHESIS_HOP;
        if synthesis_pos >= out_len {
            break;
        }

        // Windowed analysis frame, zero-padded past the end of the input.
        for (i, slot) in buffer.iter_mut().enumerate() {
            let sample = samples.get(analysis_pos + i).copied().unwrap_or(0.0);
            *slot = Complex::new(sample * window[i], 0.0);
        }
        fft.process(&mut buffer);

        // Re-phase each bin: estimate the true frequency from the phase
        // advance over the analysis hop, then accumulate it over the
        // synthesis hop.
        for (k, bin) in buffer.iter_mut().enumerate() {
            let magnitude = bin.norm();
            let phase = bin.arg();
            let bin_freq = 2.0 * std::f64::consts::PI * k as f64 / FRAME_SIZE as f64;

            let expected = bin_freq * analysis_hop;
            let deviation = wrap_phase(phase - prev_phase[k] - expected);
            let true_freq = bin_freq + deviation / analysis_hop;

            prev_phase[k] = phase;
            if frame_index == 0 {
                synth_phase[k] = phase;
            } else {
                synth_phase[k] = wrap_phase(synth_phase[k] + true_freq * SYNTHESIS_HOP as f64);
            }

            *bin = Complex::from_polar(magnitude, synth_phase[k]);
        }

        ifft.process(&mut buffer);

        // Overlap-add; rustfft's inverse is unnormalized.
        for (i, value) in buffer.iter().enumerate() {
            let pos = synthesis_pos + i;
            output[pos] += value.re / FRAME_SIZE as f64 * window[i];
            window_sum[pos] += window[i] * window[i];
        }

        frame_index += 1;
    }

    output.truncate(out_len);
    window_sum.truncate(out_len);
    for (sample, w) in output.iter_mut().zip(window_sum.iter()) {
        if *w > 1e-6 {
            *sample /= w;
        }
    }

    Ok(output)
}

/// Wraps a phase value into (-pi, pi].
fn wrap_phase(phase: f64) -> f64 {
    let two_pi = 2.0 * std::f64::consts::PI;
    let wrapped = phase - two_pi * (phase / two_pi).round();
    if wrapped <= -std::f64::consts::PI {
        wrapped + two_pi
    } else {
        wrapped
    }
}

/// Hann window of length `n`.
fn hann_window(n: usize) -> Vec<f64> {
    (0..n)
        .map(|i| {
            let x = std::f64::consts::PI * i as f64 / n as f64;
            x.sin() * x.sin()
        })
        .collect()
}
