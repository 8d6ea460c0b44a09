//! voxkit DSP
//!
//! Audio analysis and modulation primitives for the voxkit voice pipeline:
//!
//! - **Decoding** - WAV input for voice registration samples
//! - **Feature extraction** - fixed-length spectral summaries (cepstral
//!   means + mean pitch), the contract consumed by the identity store
//! - **Modulation** - speed/pitch/energy transforms over mono waveforms,
//!   built on a phase-vocoder time stretch
//! - **Encoding** - deterministic 16-bit PCM WAV output with an optional
//!   provenance comment chunk
//!
//! # Determinism
//!
//! Everything here is a pure function of its inputs. The only randomness is
//! the pretrained default feature vectors, which draw from PCG32 seeded via
//! BLAKE3 key derivation and are therefore stable across runs and platforms.
//!
//! # Crate Structure
//!
//! - [`decode`] - WAV reading and mono downmix
//! - [`features`] - feature extraction and pretrained defaults
//! - [`modulate`] - the modulation engine (pitch → speed → energy)
//! - [`resample`] - linear-interpolation resampling
//! - [`stretch`] - phase-vocoder time stretch
//! - [`wav`] - deterministic WAV writer

pub mod decode;
pub mod error;
pub mod features;
pub mod modulate;
pub mod resample;
pub mod stretch;
pub mod wav;

pub use decode::{decode_wav, decode_wav_file, AudioBuffer};
pub use error::{DspError, DspResult};
pub use features::{default_features, extract, DefaultProfile, FEATURE_DIM, PITCH_INDEX};
pub use modulate::{apply, pitch_ratio_to_semitones, ModulationParams};
pub use wav::{pcm_hash, samples_to_pcm16, write_wav, WavFormat};
