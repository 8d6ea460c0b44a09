//! WAV decoding for registration samples.
//!
//! Registration accepts mono or stereo WAV input in 16/24/32-bit integer or
//! 32-bit float format. Multi-channel input is downmixed to mono by
//! averaging, and integer samples are normalized to [-1.0, 1.0].

use std::io::Read;
use std::path::Path;

use crate::error::{DspError, DspResult};

/// A decoded mono audio buffer.
#[derive(Debug, Clone)]
pub struct AudioBuffer {
    /// Mono samples in [-1.0, 1.0].
    pub samples: Vec<f64>,
    /// Sample rate in Hz.
    pub sample_rate: u32,
}

impl AudioBuffer {
    /// Duration of the buffer in seconds.
    pub fn duration(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate as f64
    }
}

/// Decodes a WAV file from disk into a mono buffer.
pub fn decode_wav_file(path: &Path) -> DspResult<AudioBuffer> {
    let file = std::fs::File::open(path)?;
    decode_wav(file)
}

/// Decodes WAV data from any reader into a mono buffer.
pub fn decode_wav<R: Read>(reader: R) -> DspResult<AudioBuffer> {
    let wav = hound::WavReader::new(reader).map_err(|e| DspError::decode(e.to_string()))?;
    let spec = wav.spec();
    let channels = spec.channels as usize;
    if channels == 0 {
        return Err(DspError::decode("WAV declares zero channels"));
    }

    let interleaved: Vec<f64> = match spec.sample_format {
        hound::SampleFormat::Int => {
            let max_val = (1i64 << (spec.bits_per_sample - 1)) as f64;
            wav.into_samples::<i32>()
                .collect::<Result<Vec<_>, _>>()
                .map_err(|e| DspError::decode(e.to_string()))?
                .into_iter()
                .map(|s| s as f64 / max_val)
                .collect()
        }
        hound::SampleFormat::Float => wav
            .into_samples::<f32>()
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| DspError::decode(e.to_string()))?
            .into_iter()
            .map(|s| s as f64)
            .collect(),
    };

    let samples = downmix(&interleaved, channels);

    Ok(AudioBuffer {
        samples,
        sample_rate: spec.sample_rate,
    })
}

/// Downmixes interleaved multi-channel samples to mono by averaging.
fn downmix(interleaved: &[f64], channels: usize) -> Vec<f64> {
    if channels == 1 {
        return interleaved.to_vec();
    }

    interleaved
        .chunks_exact(channels)
        .map(|frame| frame.iter().sum::<f64>() / channels as f64)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn wav_bytes(spec: hound::WavSpec, samples: &[i16]) -> Vec<u8> {
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
            for &s in samples {
                writer.write_sample(s).unwrap();
            }
            writer.finalize().unwrap();
        }
        cursor.into_inner()
    }

    #[test]
    fn test_decode_mono_int16() {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 44100,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let bytes = wav_bytes(spec, &[0, 16384, -16384, 32767]);
        let buf = decode_wav(Cursor::new(bytes)).unwrap();

        assert_eq!(buf.sample_rate, 44100);
        assert_eq!(buf.samples.len(), 4);
        assert!((buf.samples[0]).abs() < 1e-9);
        assert!((buf.samples[1] - 0.5).abs() < 1e-3);
        assert!((buf.samples[2] + 0.5).abs() < 1e-3);
        assert!(buf.samples[3] <= 1.0);
    }

    #[test]
    fn test_decode_stereo_downmix() {
        let spec = hound::WavSpec {
            channels: 2,
            sample_rate: 22050,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        // L=16384, R=-16384 averages to 0.
        let bytes = wav_bytes(spec, &[16384, -16384, 16384, 16384]);
        let buf = decode_wav(Cursor::new(bytes)).unwrap();

        assert_eq!(buf.samples.len(), 2);
        assert!(buf.samples[0].abs() < 1e-3);
        assert!((buf.samples[1] - 0.5).abs() < 1e-3);
    }

    #[test]
    fn test_decode_garbage_fails() {
        let err = decode_wav(Cursor::new(b"not a wav file".to_vec())).unwrap_err();
        assert!(matches!(err, DspError::Decode { .. }));
    }

    #[test]
    fn test_duration() {
        let buf = AudioBuffer {
            samples: vec![0.0; 22050],
            sample_rate: 22050,
        };
        assert!((buf.duration() - 1.0).abs() < 1e-9);
    }
}
