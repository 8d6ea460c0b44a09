//! Emotion presets.
//!
//! A fixed table of eight named speed/pitch/energy triples, loaded once as
//! process-wide constant state and never mutated at runtime.

/// A named triple of modulation ratios used as synthesis defaults.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EmotionPreset {
    /// Preset name (lowercase).
    pub name: &'static str,
    /// Playback-speed ratio.
    pub speed_ratio: f64,
    /// Pitch ratio.
    pub pitch_ratio: f64,
    /// Energy ratio.
    pub energy_ratio: f64,
}

/// The complete preset table.
pub const EMOTION_PRESETS: [EmotionPreset; 8] = [
    EmotionPreset {
        name: "neutral",
        speed_ratio: 1.0,
        pitch_ratio: 1.0,
        energy_ratio: 1.0,
    },
    EmotionPreset {
        name: "happy",
        speed_ratio: 1.2,
        pitch_ratio: 1.1,
        energy_ratio: 1.2,
    },
    EmotionPreset {
        name: "sad",
        speed_ratio: 0.8,
        pitch_ratio: 0.9,
        energy_ratio: 0.7,
    },
    EmotionPreset {
        name: "angry",
        speed_ratio: 1.3,
        pitch_ratio: 1.2,
        energy_ratio: 1.5,
    },
    EmotionPreset {
        name: "calm",
        speed_ratio: 0.9,
        pitch_ratio: 0.95,
        energy_ratio: 0.8,
    },
    EmotionPreset {
        name: "excited",
        speed_ratio: 1.4,
        pitch_ratio: 1.15,
        energy_ratio: 1.4,
    },
    EmotionPreset {
        name: "fearful",
        speed_ratio: 1.1,
        pitch_ratio: 1.3,
        energy_ratio: 0.9,
    },
    EmotionPreset {
        name: "confident",
        speed_ratio: 1.0,
        pitch_ratio: 0.95,
        energy_ratio: 1.1,
    },
];

/// Resolves a preset by name.
///
/// Unrecognized names fall back to `neutral` rather than erroring; see
/// DESIGN.md for the rationale.
pub fn resolve(name: &str) -> &'static EmotionPreset {
    EMOTION_PRESETS
        .iter()
        .find(|p| p.name == name)
        .unwrap_or(&EMOTION_PRESETS[0])
}

/// All presets, in table order.
pub fn all() -> &'static [EmotionPreset] {
    &EMOTION_PRESETS
}
