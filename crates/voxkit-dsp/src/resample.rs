//! Linear-interpolation resampling.
//!
//! Used to bring registration audio to the fixed analysis rate and inside
//! the pitch-shift path. Linear interpolation is adequate for speech-band
//! material at the rates involved; no band-limiting filter is applied.

/// Resamples a buffer from `from_rate` to `to_rate` by linear interpolation.
///
/// Returns the input unchanged when the rates already match.
pub fn resample(samples: &[f64], from_rate: u32, to_rate: u32) -> Vec<f64> {
    if from_rate == to_rate || samples.is_empty() {
        return samples.to_vec();
    }

    let ratio = from_rate as f64 / to_rate as f64;
    let out_len = ((samples.len() as f64) / ratio).round() as usize;
    resample_by_factor(samples, ratio, out_len.max(1))
}

/// Resamples a buffer by a raw step factor to a target length.
///
/// A factor > 1.0 reads through the input faster (shorter output); < 1.0
/// reads slower. Positions past the last input sample repeat it.
pub fn resample_by_factor(samples: &[f64], factor: f64, out_len: usize) -> Vec<f64> {
    if samples.is_empty() {
        return Vec::new();
    }

    let mut output = Vec::with_capacity(out_len);
    for i in 0..out_len {
        let pos = i as f64 * factor;
        let idx = pos as usize;
        if idx + 1 < samples.len() {
            let frac = pos - idx as f64;
            output.push(samples[idx] * (1.0 - frac) + samples[idx + 1] * frac);
        } else {
            output.push(samples[samples.len() - 1]);
        }
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_when_rates_match() {
        let input = vec![0.1, 0.2, 0.3];
        assert_eq!(resample(&input, 22050, 22050), input);
    }

    #[test]
    fn test_downsample_halves_length() {
        let input: Vec<f64> = (0..1000).map(|i| (i as f64 * 0.01).sin()).collect();
        let out = resample(&input, 44100, 22050);
        assert!((out.len() as i64 - 500).abs() <= 1);
    }

    #[test]
    fn test_upsample_doubles_length() {
        let input: Vec<f64> = (0..500).map(|i| (i as f64 * 0.01).sin()).collect();
        let out = resample(&input, 22050, 44100);
        assert!((out.len() as i64 - 1000).abs() <= 1);
    }

    #[test]
    fn test_interpolation_between_samples() {
        // Doubling the rate of a ramp should interpolate midpoints.
        let input = vec![0.0, 1.0];
        let out = resample(&input, 1, 2);
        assert_eq!(out.len(), 4);
        assert!((out[1] - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_empty_input() {
        assert!(resample(&[], 44100, 22050).is_empty());
    }
}
