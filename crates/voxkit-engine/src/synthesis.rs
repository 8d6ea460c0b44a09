//! The synthesis orchestrator.
//!
//! Resolves an emotion name, optional per-call overrides, and an optional
//! voice selection into concrete modulation parameters, invokes the base
//! waveform generator, runs the modulation pipeline, and encodes the result
//! as WAV bytes with an optional provenance watermark.

use std::sync::Arc;

use voxkit_dsp::wav::{pcm_hash, samples_to_pcm16, write_wav, WavFormat};
use voxkit_dsp::{modulate, DspError, ModulationParams};
use voxkit_identity::VoiceStore;

use crate::emotion;
use crate::error::EngineResult;
use crate::generator::BaseWaveformGenerator;
use crate::voice::resolve_voice;

/// Provenance marker attached to watermarked output. Carried as WAV
/// metadata only; audible samples are never altered.
pub const WATERMARK_TAG: &str = "AI-Generated by voxkit";

/// One synthesis request.
///
/// Explicit ratio overrides win over the emotion preset's values, which win
/// over the neutral default of 1.0.
#[derive(Debug, Clone)]
pub struct SynthesisRequest {
    /// Text to speak.
    pub text: String,
    /// Emotion preset name. Unknown names fall back to `neutral`.
    pub emotion: Option<String>,
    /// Registered voice id or a pretrained default id.
    pub voice_id: Option<String>,
    /// Explicit speed-ratio override.
    pub speed: Option<f64>,
    /// Explicit pitch-ratio override.
    pub pitch: Option<f64>,
    /// Explicit energy-ratio override.
    pub energy: Option<f64>,
    /// Language tag passed through to the generator. Defaults to `en`.
    pub language: Option<String>,
    /// Whether to stamp the provenance watermark.
    pub watermark: bool,
}

impl SynthesisRequest {
    /// A plain request for `text` with neutral everything and the
    /// watermark on.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            emotion: None,
            voice_id: None,
            speed: None,
            pitch: None,
            energy: None,
            language: None,
            watermark: true,
        }
    }
}

/// Result of a synthesis call.
#[derive(Debug, Clone)]
pub struct SynthesisOutput {
    /// Complete WAV file bytes.
    pub wav_data: Vec<u8>,
    /// Output sample rate in Hz.
    pub sample_rate: u32,
    /// Output duration in seconds.
    pub duration_seconds: f64,
    /// The modulation parameters that were applied (after voice pitch
    /// normalization).
    pub params: ModulationParams,
    /// BLAKE3 hex fingerprint of the PCM payload. Unaffected by the
    /// watermark chunk, so two outputs carry the same audio exactly when
    /// their fingerprints match.
    pub pcm_fingerprint: String,
    /// Whether the provenance watermark was stamped.
    pub watermarked: bool,
}

/// Orchestrates voice resolution, base synthesis, and modulation.
///
/// Explicitly constructed and injected by the embedding service; owns no
/// global state.
pub struct SynthesisEngine {
    store: Arc<VoiceStore>,
    generator: Box<dyn BaseWaveformGenerator>,
}

impl SynthesisEngine {
    /// Creates an engine over a store and a base-waveform generator.
    pub fn new(store: Arc<VoiceStore>, generator: Box<dyn BaseWaveformGenerator>) -> Self {
        Self { store, generator }
    }

    /// The identity store this engine reads voices from.
    pub fn store(&self) -> &Arc<VoiceStore> {
        &self.store
    }

    /// Runs a synthesis request end to end.
    ///
    /// Pipeline: resolve parameters and voice → base waveform → modulation
    /// (pitch → speed → energy) → WAV encode → optional watermark. Any
    /// stage failure propagates; partial audio is never returned.
    pub fn synthesize(&self, request: &SynthesisRequest) -> EngineResult<SynthesisOutput> {
        let mut params = resolve_params(request);

        let voice = resolve_voice(&self.store, request.voice_id.as_deref())?;
        params.pitch_ratio *= voice.pitch_bias();

        // Reject bad ratios before spending generator or DSP time.
        params.validate()?;

        let language = request.language.as_deref().unwrap_or("en");
        let base = self.generator.synthesize_base(&request.text, language)?;

        let modulated = modulate::apply(&base.samples, base.sample_rate, &params)?;

        let comment = request.watermark.then_some(WATERMARK_TAG);
        let pcm = samples_to_pcm16(&modulated);
        let pcm_fingerprint = pcm_hash(&pcm);
        let mut wav_data = Vec::with_capacity(44 + pcm.len());
        write_wav(
            &mut wav_data,
            &WavFormat::mono(base.sample_rate),
            &pcm,
            comment,
        )
        .map_err(DspError::from)?;

        Ok(SynthesisOutput {
            duration_seconds: modulated.len() as f64 / base.sample_rate as f64,
            wav_data,
            sample_rate: base.sample_rate,
            params,
            pcm_fingerprint,
            watermarked: request.watermark,
        })
    }
}

/// Resolves the request's emotion and overrides into modulation parameters.
///
/// Precedence per ratio: explicit override, then preset value, then the
/// neutral default (which the preset table encodes as 1.0).
fn resolve_params(request: &SynthesisRequest) -> ModulationParams {
    let preset = emotion::resolve(request.emotion.as_deref().unwrap_or("neutral"));
    ModulationParams {
        speed_ratio: request.speed.unwrap_or(preset.speed_ratio),
        pitch_ratio: request.pitch.unwrap_or(preset.pitch_ratio),
        energy_ratio: request.energy.unwrap_or(preset.energy_ratio),
    }
}
