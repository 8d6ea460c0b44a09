//! Base-waveform generation seam.
//!
//! The engine consumes text-to-waveform synthesis through the
//! [`BaseWaveformGenerator`] trait. Production deployments plug a real TTS
//! service in behind it; [`FormantGenerator`] is the built-in deterministic
//! offline stand-in used by the CLI and tests. Generator failures surface
//! to callers as upstream errors, never as silent empty audio.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use thiserror::Error;

/// A raw synthesized speech waveform before modulation.
#[derive(Debug, Clone)]
pub struct BaseWaveform {
    /// Mono samples in [-1.0, 1.0].
    pub samples: Vec<f64>,
    /// Sample rate in Hz.
    pub sample_rate: u32,
}

/// Errors from the base-waveform generator.
#[derive(Debug, Error)]
pub enum GeneratorError {
    /// The generator rejected or failed the request.
    #[error("generation failed: {message}")]
    Failed {
        /// Underlying error message.
        message: String,
    },
}

impl GeneratorError {
    /// Creates a failed-generation error.
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed {
            message: message.into(),
        }
    }
}

/// Turns text into a base speech waveform.
pub trait BaseWaveformGenerator: Send + Sync {
    /// Synthesizes a base waveform for `text` in `language`.
    fn synthesize_base(&self, text: &str, language: &str)
        -> Result<BaseWaveform, GeneratorError>;
}

/// Deterministic offline generator producing vowel-like formant bursts.
///
/// One harmonic burst per whitespace-separated word, with per-word
/// fundamental and formant placement drawn from a PCG32 stream keyed by the
/// word text. Not speech, but spectrally speech-shaped: enough for the
/// modulation pipeline, tests, and CLI demos to run with no external
/// service. The same text always yields the same samples.
#[derive(Debug, Clone)]
pub struct FormantGenerator {
    /// Output sample rate in Hz.
    pub sample_rate: u32,
}

impl Default for FormantGenerator {
    fn default() -> Self {
        Self { sample_rate: 22_050 }
    }
}

impl FormantGenerator {
    /// Creates a generator at the given output rate.
    pub fn new(sample_rate: u32) -> Self {
        Self { sample_rate }
    }

    fn render_word(&self, word: &str, output: &mut Vec<f64>) {
        let mut rng = word_rng(word);
        let f0 = 140.0 + rng.gen::<f64>() * 40.0;
        let formant1 = 300.0 + rng.gen::<f64>() * 500.0;
        let formant2 = 900.0 + rng.gen::<f64>() * 1500.0;

        let duration = 0.12 + 0.025 * word.chars().count().min(8) as f64;
        let num_samples = (duration * self.sample_rate as f64) as usize;
        let nyquist = self.sample_rate as f64 / 2.0;
        let max_harmonic = ((nyquist / f0) as usize).min(40);

        // Harmonic amplitudes: 1/k rolloff boosted near the two formants.
        let amps: Vec<f64> = (1..=max_harmonic)
            .map(|k| {
                let freq = f0 * k as f64;
                let resonance = gaussian_bump(freq, formant1, 120.0)
                    + 0.7 * gaussian_bump(freq, formant2, 180.0);
                (1.0 / k as f64) * (0.15 + resonance)
            })
            .collect();

        let attack = (0.010 * self.sample_rate as f64) as usize;
        let release = num_samples * 3 / 10;

        for i in 0..num_samples {
            let t = i as f64 / self.sample_rate as f64;
            let mut sample = 0.0;
            for (k, amp) in amps.iter().enumerate() {
                let freq = f0 * (k + 1) as f64;
                sample += amp * (2.0 * std::f64::consts::PI * freq * t).sin();
            }

            let envelope = if i < attack {
                i as f64 / attack as f64
            } else if i >= num_samples - release {
                (num_samples - i) as f64 / release as f64
            } else {
                1.0
            };
            output.push(sample * envelope);
        }

        // Inter-word gap.
        let gap = (0.06 * self.sample_rate as f64) as usize;
        output.extend(std::iter::repeat(0.0).take(gap));
    }
}

impl BaseWaveformGenerator for FormantGenerator {
    fn synthesize_base(
        &self,
        text: &str,
        _language: &str,
    ) -> Result<BaseWaveform, GeneratorError> {
        let words: Vec<&str> = text.split_whitespace().collect();
        if words.is_empty() {
            return Err(GeneratorError::failed("text contains no words"));
        }

        let mut samples = Vec::new();
        for word in words {
            self.render_word(word, &mut samples);
        }

        // Scale to a fixed working peak so downstream gain has headroom.
        let peak = samples.iter().map(|s| s.abs()).fold(0.0_f64, f64::max);
        if peak > 0.0 {
            let gain = 0.7 / peak;
            for sample in samples.iter_mut() {
                *sample *= gain;
            }
        }

        Ok(BaseWaveform {
            samples,
            sample_rate: self.sample_rate,
        })
    }
}

/// PCG32 stream keyed by the word text via BLAKE3.
fn word_rng(word: &str) -> Pcg32 {
    let hash = blake3::hash(format!("voxkit.word.{word}").as_bytes());
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&hash.as_bytes()[0..8]);
    Pcg32::seed_from_u64(u64::from_le_bytes(bytes))
}

/// Unnormalized gaussian centered at `center` with width `width`.
fn gaussian_bump(x: f64, center: f64, width: f64) -> f64 {
    let d = (x - center) / width;
    (-0.5 * d * d).exp()
}
