//! Deterministic WAV encoding.
//!
//! Output is 16-bit PCM mono with no timestamps or variable metadata, so
//! identical samples always produce identical bytes. An optional RIFF
//! `LIST/INFO` comment chunk carries the provenance watermark; it sits after
//! the data chunk and never touches the audible samples.

use std::io::{self, Write};

/// WAV format parameters for the mono writer.
#[derive(Debug, Clone, Copy)]
pub struct WavFormat {
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Bits per sample (always 16 here).
    pub bits_per_sample: u16,
}

impl WavFormat {
    /// Creates a mono 16-bit format.
    pub fn mono(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            bits_per_sample: 16,
        }
    }

    fn block_align(&self) -> u16 {
        self.bits_per_sample / 8
    }

    fn byte_rate(&self) -> u32 {
        self.sample_rate * self.block_align() as u32
    }
}

/// Converts f64 samples to 16-bit little-endian PCM bytes.
///
/// Samples outside [-1.0, 1.0] are clipped.
pub fn samples_to_pcm16(samples: &[f64]) -> Vec<u8> {
    let mut pcm = Vec::with_capacity(samples.len() * 2);
    for &sample in samples {
        let clipped = sample.clamp(-1.0, 1.0);
        let pcm_value = (clipped * 32767.0).round() as i16;
        pcm.extend_from_slice(&pcm_value.to_le_bytes());
    }
    pcm
}

/// Writes a complete mono WAV file to a writer.
///
/// `comment`, when present, is emitted as a `LIST/INFO` chunk with an `ICMT`
/// entry after the data chunk.
pub fn write_wav<W: Write>(
    writer: &mut W,
    format: &WavFormat,
    pcm_data: &[u8],
    comment: Option<&str>,
) -> io::Result<()> {
    let data_size = pcm_data.len() as u32;
    let info_chunk = comment.map(info_chunk_bytes);
    let info_size = info_chunk.as_ref().map(|c| c.len() as u32).unwrap_or(0);
    let file_size = 36 + data_size + info_size;

    // RIFF header
    writer.write_all(b"RIFF")?;
    writer.write_all(&file_size.to_le_bytes())?;
    writer.write_all(b"WAVE")?;

    // fmt chunk
    writer.write_all(b"fmt ")?;
    writer.write_all(&16u32.to_le_bytes())?;
    writer.write_all(&1u16.to_le_bytes())?; // PCM
    writer.write_all(&1u16.to_le_bytes())?; // mono
    writer.write_all(&format.sample_rate.to_le_bytes())?;
    writer.write_all(&format.byte_rate().to_le_bytes())?;
    writer.write_all(&format.block_align().to_le_bytes())?;
    writer.write_all(&format.bits_per_sample.to_le_bytes())?;

    // data chunk
    writer.write_all(b"data")?;
    writer.write_all(&data_size.to_le_bytes())?;
    writer.write_all(pcm_data)?;

    if let Some(chunk) = info_chunk {
        writer.write_all(&chunk)?;
    }

    Ok(())
}

/// BLAKE3 hash of raw PCM bytes, as lowercase hex.
///
/// Hashes the PCM payload rather than the container so metadata chunks do
/// not affect the audio fingerprint.
pub fn pcm_hash(pcm_data: &[u8]) -> String {
    blake3::hash(pcm_data).to_hex().to_string()
}

/// Builds a `LIST/INFO` chunk with a single `ICMT` comment entry.
fn info_chunk_bytes(comment: &str) -> Vec<u8> {
    // ICMT payload is NUL-terminated and word-aligned.
    let mut text = comment.as_bytes().to_vec();
    text.push(0);
    if text.len() % 2 != 0 {
        text.push(0);
    }

    let list_size = 4 + 8 + text.len() as u32; // "INFO" + ICMT header + payload
    let mut chunk = Vec::with_capacity(8 + list_size as usize);
    chunk.extend_from_slice(b"LIST");
    chunk.extend_from_slice(&list_size.to_le_bytes());
    chunk.extend_from_slice(b"INFO");
    chunk.extend_from_slice(b"ICMT");
    chunk.extend_from_slice(&(text.len() as u32).to_le_bytes());
    chunk.extend_from_slice(&text);
    chunk
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn encode(samples: &[f64], sample_rate: u32, comment: Option<&str>) -> Vec<u8> {
        let pcm = samples_to_pcm16(samples);
        let mut buffer = Vec::new();
        write_wav(&mut buffer, &WavFormat::mono(sample_rate), &pcm, comment).unwrap();
        buffer
    }

    #[test]
    fn test_header_fields() {
        let wav = encode(&[0.0, 0.5, -0.5], 22050, None);
        assert_eq!(&wav[0..4], b"RIFF");
        assert_eq!(&wav[8..12], b"WAVE");
        assert_eq!(&wav[12..16], b"fmt ");
        assert_eq!(&wav[36..40], b"data");
        // 3 samples * 2 bytes
        assert_eq!(u32::from_le_bytes(wav[40..44].try_into().unwrap()), 6);
    }

    #[test]
    fn test_pcm16_clipping() {
        let pcm = samples_to_pcm16(&[2.0, -2.0]);
        assert_eq!(i16::from_le_bytes([pcm[0], pcm[1]]), 32767);
        assert_eq!(i16::from_le_bytes([pcm[2], pcm[3]]), -32767);
    }

    #[test]
    fn test_determinism() {
        let samples: Vec<f64> = (0..100).map(|i| (i as f64 * 0.07).sin()).collect();
        assert_eq!(
            encode(&samples, 22050, None),
            encode(&samples, 22050, None)
        );
    }

    #[test]
    fn test_comment_chunk_present_and_samples_untouched() {
        let samples: Vec<f64> = (0..64).map(|i| (i as f64 * 0.2).sin()).collect();
        let plain = encode(&samples, 22050, None);
        let tagged = encode(&samples, 22050, Some("AI-Generated by voxkit"));

        // Everything from the fmt chunk through the data payload is
        // byte-identical; only the RIFF size field and the appended LIST
        // chunk differ.
        assert_eq!(&tagged[8..plain.len()], &plain[8..]);
        assert!(tagged.len() > plain.len());

        let tail = &tagged[plain.len()..];
        assert_eq!(&tail[0..4], b"LIST");
        assert!(tail.windows(4).any(|w| w == b"ICMT"));
    }

    #[test]
    fn test_pcm_hash_ignores_comment() {
        let samples: Vec<f64> = (0..64).map(|i| (i as f64 * 0.2).sin()).collect();
        let pcm = samples_to_pcm16(&samples);
        let hash = pcm_hash(&pcm);
        assert_eq!(hash.len(), 64);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_riff_size_includes_info_chunk() {
        let samples = vec![0.25; 10];
        let tagged = encode(&samples, 22050, Some("tag"));
        let declared = u32::from_le_bytes(tagged[4..8].try_into().unwrap());
        assert_eq!(declared as usize, tagged.len() - 8);
    }
}
