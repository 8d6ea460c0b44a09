//! voxkit Engine
//!
//! The synthesis orchestrator for voxkit. Ties the identity registry and
//! the DSP pipeline together:
//!
//! 1. An emotion name and per-call overrides resolve to concrete
//!    speed/pitch/energy ratios (override > preset > neutral).
//! 2. An optional voice selection resolves through the registry (or the
//!    pretrained defaults) to a base pitch, which biases the pitch ratio
//!    against the 220 Hz reference.
//! 3. An external base-waveform generator renders the text; the built-in
//!    [`FormantGenerator`] is a deterministic offline stand-in.
//! 4. The modulation pipeline transforms the waveform, and the result is
//!    encoded as WAV bytes, optionally stamped with a provenance
//!    watermark in metadata.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use voxkit_engine::{FormantGenerator, SynthesisEngine, SynthesisRequest};
//! use voxkit_identity::VoiceStore;
//!
//! let store = Arc::new(VoiceStore::open("voice_projects")?);
//! let engine = SynthesisEngine::new(store, Box::new(FormantGenerator::default()));
//!
//! let mut request = SynthesisRequest::new("hello there");
//! request.emotion = Some("happy".to_string());
//! let output = engine.synthesize(&request)?;
//! std::fs::write("hello.wav", &output.wav_data)?;
//! ```

pub mod emotion;
pub mod error;
pub mod generator;
pub mod synthesis;
pub mod voice;

pub use emotion::{EmotionPreset, EMOTION_PRESETS};
pub use error::{EngineError, EngineResult};
pub use generator::{BaseWaveform, BaseWaveformGenerator, FormantGenerator, GeneratorError};
pub use synthesis::{SynthesisEngine, SynthesisOutput, SynthesisRequest, WATERMARK_TAG};
pub use voice::{ResolvedVoice, FEMALE_DEFAULT_ID, MALE_DEFAULT_ID, REFERENCE_PITCH_HZ};
