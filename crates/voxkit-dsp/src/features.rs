//! Voice feature extraction.
//!
//! A voice sample is summarized as a fixed-length spectral feature vector:
//! 13 cepstral coefficient means followed by a mean fundamental-frequency
//! estimate at [`PITCH_INDEX`], zero-padded to [`FEATURE_DIM`] dimensions.
//! The fixed length is a load-bearing contract: the identity store persists
//! vectors of exactly this size.
//!
//! Synthesis reads element 0 as a base pitch, which is only true for the
//! pretrained default vectors (where it is set explicitly). For extracted
//! vectors element 0 is the first cepstral mean. See DESIGN.md.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use rustfft::num_complex::Complex;
use rustfft::FftPlanner;

use crate::error::{DspError, DspResult};
use crate::resample::resample;

/// Dimensionality of every feature vector. Enforced at this boundary only.
pub const FEATURE_DIM: usize = 256;

/// Fixed analysis sample rate in Hz. Input is resampled here before framing.
pub const ANALYSIS_RATE: u32 = 22_050;

/// Number of cepstral coefficients kept per frame.
pub const CEPSTRAL_ORDER: usize = 13;

/// Index of the mean-pitch element in an extracted feature vector.
pub const PITCH_INDEX: usize = CEPSTRAL_ORDER;

/// Analysis frame length in samples (~93 ms at the analysis rate).
const FRAME_SIZE: usize = 2048;

/// Hop between consecutive analysis frames.
const HOP_SIZE: usize = 512;

/// Minimum FFT peak magnitude for a frame to count as voiced.
const VOICING_FLOOR: f64 = 1.0;

/// Base pitch of the synthetic male default voice, in Hz.
pub const MALE_BASE_PITCH: f64 = 120.0;

/// Base pitch of the synthetic female default voice, in Hz.
pub const FEMALE_BASE_PITCH: f64 = 220.0;

/// Pretrained default voice profiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefaultProfile {
    /// Synthetic male default (base pitch 120 Hz).
    Male,
    /// Synthetic female default (base pitch 220 Hz).
    Female,
}

impl DefaultProfile {
    /// Returns the profile key used for seed derivation.
    pub fn key(&self) -> &'static str {
        match self {
            DefaultProfile::Male => "male",
            DefaultProfile::Female => "female",
        }
    }

    /// Returns the profile's base pitch in Hz.
    pub fn base_pitch(&self) -> f64 {
        match self {
            DefaultProfile::Male => MALE_BASE_PITCH,
            DefaultProfile::Female => FEMALE_BASE_PITCH,
        }
    }
}

/// Extracts a [`FEATURE_DIM`]-dimensional feature vector from audio.
///
/// The input is resampled to [`ANALYSIS_RATE`], cut into Hann-windowed
/// frames, and analyzed per frame: the log-magnitude spectrum yields
/// [`CEPSTRAL_ORDER`] cepstral coefficients, and the maximum-magnitude
/// frequency bin yields a pitch estimate. Cepstral coefficients are averaged
/// over all frames; pitch is averaged only over frames whose spectral peak
/// exceeds the voicing floor.
///
/// # Errors
/// [`DspError::NoVoicedFrames`] when no frame clears the voicing floor —
/// there is then no pitch estimate to average, and downstream synthesis
/// would divide by a zero frame count.
pub fn extract(samples: &[f64], sample_rate: u32) -> DspResult<Vec<f64>> {
    let analyzed = resample(samples, sample_rate, ANALYSIS_RATE);
    let frames = frame_signal(&analyzed);

    let mut planner = FftPlanner::<f64>::new();
    let fft = planner.plan_fft_forward(FRAME_SIZE);
    let window = hann_window(FRAME_SIZE);

    let mut cepstral_sum = [0.0f64; CEPSTRAL_ORDER];
    let mut pitch_sum = 0.0f64;
    let mut voiced_frames = 0usize;
    let frame_count = frames.len();

    let mut buffer = vec![Complex::new(0.0, 0.0); FRAME_SIZE];
    for frame in frames {
        for (i, slot) in buffer.iter_mut().enumerate() {
            *slot = Complex::new(frame[i] * window[i], 0.0);
        }
        fft.process(&mut buffer);

        // Magnitudes over the positive-frequency half, DC excluded from the
        // pitch search.
        let half = FRAME_SIZE / 2;
        let mut peak_mag = 0.0f64;
        let mut peak_bin = 0usize;
        let mut log_mag = Vec::with_capacity(half);
        for (bin, value) in buffer.iter().take(half).enumerate() {
            let mag = value.norm();
            log_mag.push((mag + 1e-10).ln());
            if bin > 0 && mag > peak_mag {
                peak_mag = mag;
                peak_bin = bin;
            }
        }

        let ceps = dct_ii(&log_mag, CEPSTRAL_ORDER);
        for (acc, c) in cepstral_sum.iter_mut().zip(ceps.iter()) {
            *acc += c;
        }

        if peak_mag > VOICING_FLOOR {
            pitch_sum += peak_bin as f64 * ANALYSIS_RATE as f64 / FRAME_SIZE as f64;
            voiced_frames += 1;
        }
    }

    if voiced_frames == 0 {
        return Err(DspError::NoVoicedFrames);
    }

    let mut features = Vec::with_capacity(FEATURE_DIM);
    for acc in cepstral_sum.iter() {
        features.push(acc / frame_count as f64);
    }
    features.push(pitch_sum / voiced_frames as f64);
    Ok(pad_to_dim(features))
}

/// Generates the deterministic feature vector for a pretrained default voice.
///
/// Element 0 is the profile's base pitch; the remainder is drawn from a
/// PCG32 stream seeded by a BLAKE3-derived key, so the vector is stable
/// across restarts and platforms. User-registered vectors never come from
/// this path.
pub fn default_features(profile: DefaultProfile) -> Vec<f64> {
    let mut rng = create_profile_rng(profile.key());
    let mut features = Vec::with_capacity(FEATURE_DIM);
    features.push(profile.base_pitch());
    for _ in 1..FEATURE_DIM {
        features.push(rng.gen::<f64>() * 2.0 - 1.0);
    }
    features
}

/// Normalizes a vector to exactly [`FEATURE_DIM`] elements.
///
/// Shorter vectors are zero-padded; longer ones are truncated. Applied at
/// this boundary so downstream code can rely on the fixed length.
pub fn pad_to_dim(mut features: Vec<f64>) -> Vec<f64> {
    features.resize(FEATURE_DIM, 0.0);
    features
}

/// Creates the seeded RNG for a pretrained profile key.
fn create_profile_rng(key: &str) -> Pcg32 {
    let hash = blake3::hash(format!("voxkit.pretrained.{key}").as_bytes());
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&hash.as_bytes()[0..8]);
    Pcg32::seed_from_u64(u64::from_le_bytes(bytes))
}

/// Cuts a signal into full-length frames at [`HOP_SIZE`] intervals.
///
/// Input shorter than one frame becomes a single zero-padded frame so short
/// clips still produce an analysis rather than an empty frame list.
fn frame_signal(samples: &[f64]) -> Vec<Vec<f64>> {
    if samples.len() < FRAME_SIZE {
        let mut frame = samples.to_vec();
        frame.resize(FRAME_SIZE, 0.0);
        return vec![frame];
    }

    (0..=samples.len() - FRAME_SIZE)
        .step_by(HOP_SIZE)
        .map(|start| samples[start..start + FRAME_SIZE].to_vec())
        .collect()
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

/// DCT-II of `input`, returning the first `order` coefficients.
fn dct_ii(input: &[f64], order: usize) -> Vec<f64> {
    let n = input.len() as f64;
    (0..order)
        .map(|k| {
            input
                .iter()
                .enumerate()
                .map(|(i, &x)| x * (std::f64::consts::PI * k as f64 * (i as f64 + 0.5) / n).cos())
                .sum::<f64>()
                / n
        })
        .collect()
}
