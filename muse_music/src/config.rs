// Data-driven composer configuration.
//
// Every tunable number the generators use lives in `ComposerConfig`: note
// length weights, velocities, ghost-note odds, hi-hat pattern, section
// length. Generators read from the config and hold no magic numbers of their
// own. The defaults reproduce the stock Muse sound; a JSON file can override
// any subset of fields (missing fields fall back to the defaults).
//
// `validate()` is called by compose.rs before any generation so a malformed
// table fails fast as a configuration error instead of surfacing mid-song.

use crate::error::MuseError;
use crate::track::{SLOT_DURATION, SLOTS_PER_BAR};
use serde::{Deserialize, Serialize};

const MAX_VELOCITY: u8 = 127;

/// A candidate melody note length and its relative weight.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct NoteLength {
    /// Length in bars; must be a whole number of grid slots.
    pub duration: f64,
    /// Relative likelihood; normalized among the lengths that fit.
    pub weight: f64,
}

/// Inclusive velocity range for randomized hits.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VelocityRange {
    pub low: u8,
    pub high: u8,
}

/// All tunables for song generation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComposerConfig {
    /// Chords per section progression (one chord per bar).
    pub progression_bars: usize,
    /// Times each section plays through its progression. Must be even: the
    /// melody is generated for either half or all of the passes.
    pub section_passes: usize,
    /// Octave of the key root that chords and melody are built on.
    pub chord_octave: u8,
    /// Velocity of block chords, rhythm chords, and arpeggios.
    pub chord_velocity: u8,
    pub melody_velocity: u8,
    /// Candidate melody note lengths with relative weights.
    pub note_lengths: Vec<NoteLength>,
    /// Pitch proximity weight is `nearby_range - distance^2`, clipped at 0.
    pub nearby_range: f64,
    /// Higher values make ghost notes rarer: a snare ghost fires with
    /// probability `1 / (penalty + 1)`, a bass ghost with `1 / (2 * penalty + 1)`.
    pub ghost_note_penalty: u32,
    pub snare_ghost_velocity: VelocityRange,
    pub bass_ghost_velocity: VelocityRange,
    pub backbeat_velocity: u8,
    /// Slots within a bar where the snare always hits.
    pub backbeat_slots: Vec<usize>,
    /// Half-open slot range `[start, end)` where the bass drum never plays.
    pub bass_exclusion: (usize, usize),
    /// Length of a bass or snare hit, in bars.
    pub drum_hit_duration: f64,
    /// Alternating accent and off-beat closed hi-hat velocities.
    pub hihat_velocities: (u8, u8),
    pub hihat_duration: f64,
    /// Chance that a section gets a hi-hat line at all.
    pub hihat_probability: f64,
}

impl ComposerConfig {
    /// Parse a config from JSON. Fields not present keep their defaults.
    pub fn from_json(json: &str) -> Result<Self, MuseError> {
        let config: ComposerConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, MuseError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Bars in every track of a section.
    pub fn section_bars(&self) -> usize {
        self.progression_bars * self.section_passes
    }

    pub fn validate(&self) -> Result<(), MuseError> {
        let invalid = |msg: &str| Err(MuseError::InvalidConfig(msg.to_string()));

        if self.progression_bars == 0 {
            return invalid("progression_bars must be at least 1");
        }
        if self.section_passes == 0 || self.section_passes % 2 != 0 {
            return invalid("section_passes must be a positive even number");
        }
        if self.ghost_note_penalty == 0 {
            return invalid("ghost_note_penalty must be at least 1");
        }
        if self.note_lengths.is_empty() {
            return invalid("note_lengths is empty");
        }
        for length in &self.note_lengths {
            let slots = length.duration / SLOT_DURATION;
            if !length.duration.is_finite() || length.duration <= 0.0 || slots.fract() != 0.0 {
                return invalid("note lengths must be positive multiples of 0.125 bars");
            }
            if !length.weight.is_finite() || length.weight < 0.0 {
                return invalid("note length weights must be finite and non-negative");
            }
        }
        if !self.note_lengths.iter().any(|l| l.weight > 0.0) {
            return Err(MuseError::Unnormalizable);
        }
        // The shortest length must always fit, or the melody could stall.
        let shortest = self
            .note_lengths
            .iter()
            .filter(|l| l.weight > 0.0)
            .map(|l| l.duration)
            .fold(f64::INFINITY, f64::min);
        if shortest != SLOT_DURATION {
            return invalid("a one-slot (0.125) note length with positive weight is required");
        }
        for range in [self.snare_ghost_velocity, self.bass_ghost_velocity] {
            if range.low > range.high || range.high > MAX_VELOCITY {
                return invalid("velocity ranges must satisfy low <= high <= 127");
            }
        }
        let (accent, off) = self.hihat_velocities;
        let fixed = [
            self.chord_velocity,
            self.melody_velocity,
            self.backbeat_velocity,
            accent,
            off,
        ];
        if fixed.iter().any(|&v| v > MAX_VELOCITY) {
            return invalid("velocities must be at most 127");
        }
        if !self.nearby_range.is_finite() {
            return invalid("nearby_range must be finite");
        }
        for duration in [self.drum_hit_duration, self.hihat_duration] {
            if !duration.is_finite() || duration <= 0.0 {
                return invalid("drum hit durations must be finite and positive");
            }
        }
        if self.backbeat_slots.iter().any(|&s| s >= SLOTS_PER_BAR) {
            return invalid("backbeat slots must be within a bar");
        }
        let (start, end) = self.bass_exclusion;
        if start > end || end > SLOTS_PER_BAR {
            return invalid("bass_exclusion must be a range within a bar");
        }
        if !(0.0..=1.0).contains(&self.hihat_probability) {
            return invalid("hihat_probability must be within [0, 1]");
        }
        Ok(())
    }
}

impl Default for ComposerConfig {
    fn default() -> Self {
        let note_lengths = [
            (0.125, 2.0),
            (0.25, 4.0),
            (0.375, 2.0),
            (0.5, 2.0),
            (0.75, 1.0),
            (1.0, 1.0),
            (1.25, 0.5),
            (1.5, 0.25),
        ]
        .into_iter()
        .map(|(duration, weight)| NoteLength { duration, weight })
        .collect();

        ComposerConfig {
            progression_bars: 4,
            section_passes: 4,
            chord_octave: 2,
            chord_velocity: 80,
            melody_velocity: 80,
            note_lengths,
            nearby_range: 36.0,
            ghost_note_penalty: 1,
            snare_ghost_velocity: VelocityRange { low: 20, high: 50 },
            bass_ghost_velocity: VelocityRange { low: 30, high: 80 },
            backbeat_velocity: 60,
            backbeat_slots: vec![2, 6],
            bass_exclusion: (2, 6),
            drum_hit_duration: 0.03,
            hihat_velocities: (70, 40),
            hihat_duration: 0.3,
            hihat_probability: 0.5,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = ComposerConfig::default();
        config.validate().unwrap();
        assert_eq!(config.section_bars(), 16);
    }

    #[test]
    fn default_config_serializes() {
        let config = ComposerConfig::default();
        let json = config.to_json().unwrap();
        let back = ComposerConfig::from_json(&json).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config = ComposerConfig::from_json(r#"{"ghost_note_penalty": 3}"#).unwrap();
        assert_eq!(config.ghost_note_penalty, 3);
        assert_eq!(config.progression_bars, 4);
    }

    #[test]
    fn odd_passes_rejected() {
        let config = ComposerConfig {
            section_passes: 3,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(MuseError::InvalidConfig(_))));
    }

    #[test]
    fn all_zero_note_weights_rejected() {
        let mut config = ComposerConfig::default();
        for length in &mut config.note_lengths {
            length.weight = 0.0;
        }
        assert!(matches!(config.validate(), Err(MuseError::Unnormalizable)));
    }

    #[test]
    fn off_grid_note_length_rejected() {
        let mut config = ComposerConfig::default();
        config.note_lengths.push(NoteLength {
            duration: 0.2,
            weight: 1.0,
        });
        assert!(config.validate().is_err());
    }

    #[test]
    fn loud_fixed_velocities_rejected() {
        let configs = [
            ComposerConfig {
                chord_velocity: 128,
                ..Default::default()
            },
            ComposerConfig {
                melody_velocity: 200,
                ..Default::default()
            },
            ComposerConfig {
                backbeat_velocity: 255,
                ..Default::default()
            },
            ComposerConfig {
                hihat_velocities: (70, 128),
                ..Default::default()
            },
        ];
        for config in configs {
            assert!(matches!(config.validate(), Err(MuseError::InvalidConfig(_))));
        }
    }

    #[test]
    fn non_finite_or_empty_durations_rejected() {
        let configs = [
            ComposerConfig {
                nearby_range: f64::NAN,
                ..Default::default()
            },
            ComposerConfig {
                drum_hit_duration: 0.0,
                ..Default::default()
            },
            ComposerConfig {
                hihat_duration: f64::INFINITY,
                ..Default::default()
            },
            ComposerConfig {
                hihat_duration: -0.3,
                ..Default::default()
            },
        ];
        for config in configs {
            assert!(matches!(config.validate(), Err(MuseError::InvalidConfig(_))));
        }
    }

    #[test]
    fn malformed_json_is_a_json_error() {
        assert!(matches!(
            ComposerConfig::from_json("{not json"),
            Err(MuseError::Json(_))
        ));
    }
}
