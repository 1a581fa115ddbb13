// Melody generation over a chord progression.
//
// For each pass over the progression, notes are laid down left to right
// until the running time reaches the end of the current chord's bar. Each
// note:
// - gets a length drawn from the config's weighted note-length table,
//   restricted to lengths that still fit inside the progression (a note may
//   ring past its own chord's bar, never past the last bar);
// - draws its pitch from either the chord tones or the remaining scale tones
//   (a fair coin), each pool spanning two octaves above the key root;
// - within that pool, prefers pitches near the previous note: weight is
//   `nearby_range - distance^2`, clipped at 0. The first note of each chord
//   has no previous note and draws uniformly.
//
// Notes longer than one slot are padded with rest placeholders so the output
// stays aligned to the eighth-note grid. Each pass restarts the clock at 0,
// so the output is exactly `repeats * progression.len()` bars.
//
// See also: progression.rs for the chord walk, sampler.rs for the weighted
// draws, compose.rs for how the repeat count is chosen.

use crate::config::ComposerConfig;
use crate::error::MuseError;
use crate::pitch::{Key, Pitch, chord_pitches, scale_pitches};
use crate::progression::Progression;
use crate::sampler::sample_weighted;
use crate::theory::{ChordSymbol, Mode};
use crate::track::{Note, NoteEvent, Track, Voicing, rests};
use muse_prng::MuseRng;
use tracing::debug;

/// The two pitch pools a melody note is drawn from while `chord` sounds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TonePools {
    /// Chord tones, then the same tones an octave up.
    pub chord_tones: Vec<Pitch>,
    /// Scale tones that are not chord tones, then the same an octave up.
    pub non_chord_tones: Vec<Pitch>,
}

impl TonePools {
    pub fn new(chord: ChordSymbol, key: Key, octave: u8, mode: Mode) -> Self {
        let base = key.root(octave);
        let chord_tones = with_octave_above(chord_pitches(chord, base));

        let scale = scale_pitches(key, octave, mode);
        // The scale's top note is its root an octave up; leave it out.
        let non_chord: Vec<Pitch> = scale[..7]
            .iter()
            .copied()
            .filter(|p| !chord_tones.contains(p))
            .collect();

        TonePools {
            chord_tones,
            non_chord_tones: with_octave_above(non_chord),
        }
    }
}

fn with_octave_above(mut pitches: Vec<Pitch>) -> Vec<Pitch> {
    let raised: Vec<Pitch> = pitches.iter().map(|p| p + 12).collect();
    pitches.extend(raised);
    pitches
}

/// Generate a melody that plays `progression` through `repeats` times.
///
/// Fails with `InvalidConfig` before drawing anything if `config` is malformed.
pub fn generate_melody(
    key: Key,
    progression: &Progression,
    repeats: usize,
    mode: Mode,
    config: &ComposerConfig,
    rng: &mut MuseRng,
) -> Result<Track<Voicing>, MuseError> {
    config.validate()?;
    let total_bars = progression.len() as f64;
    let mut events = Vec::new();

    for pass in 0..repeats {
        let mut time_used = 0.0;
        let mut notes_in_pass = 0usize;

        for (i, &chord) in progression.chords().iter().enumerate() {
            let pools = TonePools::new(chord, key, config.chord_octave, mode);
            let mut last_pitch: Option<Pitch> = None;
            let bar_end = (i + 1) as f64;

            while time_used < bar_end {
                let duration = pick_note_length(time_used, total_bars, config, rng)?;
                let pool = pick_pool(&pools, rng);
                let pitch = pick_pitch(pool, last_pitch, config.nearby_range, rng)?;

                let note = Note::new(Voicing::Single(pitch), config.melody_velocity, duration);
                let slots = note.slots();
                events.push(NoteEvent::Note(note));
                events.extend(rests(slots - 1));

                last_pitch = Some(pitch);
                time_used += duration;
                notes_in_pass += 1;
            }
        }
        debug!(pass, notes = notes_in_pass, "melody pass complete");
    }

    Ok(events.into())
}

/// Draw a note length that does not run past the end of the progression.
fn pick_note_length(
    time_used: f64,
    total_bars: f64,
    config: &ComposerConfig,
    rng: &mut MuseRng,
) -> Result<f64, MuseError> {
    let (durations, weights): (Vec<f64>, Vec<f64>) = config
        .note_lengths
        .iter()
        .filter(|l| time_used + l.duration <= total_bars)
        .map(|l| (l.duration, l.weight))
        .unzip();
    sample_weighted(&durations, &weights, rng).copied()
}

/// Fair coin between chord tones and passing tones. An empty pool defers to
/// the other.
fn pick_pool<'a>(pools: &'a TonePools, rng: &mut MuseRng) -> &'a [Pitch] {
    let (first, second) = if rng.random_bool(0.5) {
        (&pools.chord_tones, &pools.non_chord_tones)
    } else {
        (&pools.non_chord_tones, &pools.chord_tones)
    };
    if first.is_empty() { second } else { first }
}

/// Draw a pitch from `pool`, favoring small steps from `last_pitch`.
fn pick_pitch(
    pool: &[Pitch],
    last_pitch: Option<Pitch>,
    nearby_range: f64,
    rng: &mut MuseRng,
) -> Result<Pitch, MuseError> {
    let mut weights: Vec<f64> = match last_pitch {
        Some(last) => pool
            .iter()
            .map(|&p| {
                let distance = (p - last) as f64;
                (nearby_range - distance * distance).max(0.0)
            })
            .collect(),
        None => vec![1.0; pool.len()],
    };
    // Nothing close enough: fall back to a uniform draw.
    if weights.iter().all(|&w| w == 0.0) {
        weights.fill(1.0);
    }
    sample_weighted(pool, &weights, rng).copied()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progression::generate_progression;
    use crate::track::SLOTS_PER_BAR;
    use ChordSymbol::*;

    fn c_major() -> Key {
        Key::new("C").unwrap()
    }

    #[test]
    fn tonic_pools_in_c_major() {
        let pools = TonePools::new(MajorI, c_major(), 2, Mode::Major);
        assert_eq!(pools.chord_tones, vec![48, 52, 55, 60, 64, 67]);
        assert_eq!(pools.non_chord_tones, vec![50, 53, 57, 59, 62, 65, 69, 71]);
    }

    #[test]
    fn four_note_chord_pools_do_not_overlap() {
        let pools = TonePools::new(DiminishedII, Key::new("A").unwrap(), 2, Mode::Minor);
        assert_eq!(pools.chord_tones.len(), 8);
        assert!(pools.non_chord_tones.iter().all(|p| !pools.chord_tones.contains(p)));
        assert!(!pools.non_chord_tones.is_empty());
    }

    #[test]
    fn melody_fills_exactly_the_requested_bars() {
        let config = ComposerConfig::default();
        let mut rng = MuseRng::new(11);
        for repeats in [1, 2, 4] {
            for mode in [Mode::Major, Mode::Minor] {
                let progression = generate_progression(4, mode, None, &mut rng).unwrap();
                let melody =
                    generate_melody(c_major(), &progression, repeats, mode, &config, &mut rng).unwrap();
                let bars = (repeats * progression.len()) as f64;
                assert_eq!(melody.note_duration_total(), bars);
                assert_eq!(melody.len(), repeats * progression.len() * SLOTS_PER_BAR);
            }
        }
    }

    #[test]
    fn every_pitch_comes_from_a_pool_of_its_bar() {
        let config = ComposerConfig::default();
        let mut rng = MuseRng::new(12);
        let key = Key::new("F#").unwrap();
        let progression = generate_progression(4, Mode::Minor, None, &mut rng).unwrap();
        let melody = generate_melody(key, &progression, 1, Mode::Minor, &config, &mut rng).unwrap();

        let allowed: Vec<Pitch> = progression
            .chords()
            .iter()
            .flat_map(|&c| {
                let pools = TonePools::new(c, key, 2, Mode::Minor);
                pools.chord_tones.into_iter().chain(pools.non_chord_tones)
            })
            .collect();
        for note in melody.notes() {
            let Voicing::Single(p) = note.sound else {
                panic!("melody notes are single pitches");
            };
            assert!(allowed.contains(&p), "{p} not in any pool");
            assert_eq!(note.velocity, 80);
        }
    }

    #[test]
    fn holds_are_padded_with_rests() {
        let config = ComposerConfig::default();
        let mut rng = MuseRng::new(13);
        let progression = generate_progression(4, Mode::Major, None, &mut rng).unwrap();
        let melody = generate_melody(c_major(), &progression, 1, Mode::Major, &config, &mut rng).unwrap();
        let events = melody.events();
        let mut i = 0;
        while i < events.len() {
            let note = events[i].as_note().expect("slot should start a note");
            for pad in &events[i + 1..i + note.slots()] {
                assert!(pad.is_rest());
            }
            i += note.slots();
        }
        assert_eq!(i, events.len());
    }

    #[test]
    fn zero_repeats_is_empty() {
        let config = ComposerConfig::default();
        let mut rng = MuseRng::new(14);
        let progression = generate_progression(4, Mode::Major, None, &mut rng).unwrap();
        let melody = generate_melody(c_major(), &progression, 0, Mode::Major, &config, &mut rng).unwrap();
        assert!(melody.is_empty());
    }

    #[test]
    fn same_seed_same_melody() {
        let config = ComposerConfig::default();
        let progression = Progression::from_chords(vec![MajorI, MajorIV, MajorV, MajorI]);
        let a = generate_melody(c_major(), &progression, 2, Mode::Major, &config, &mut MuseRng::new(5)).unwrap();
        let b = generate_melody(c_major(), &progression, 2, Mode::Major, &config, &mut MuseRng::new(5)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn zero_length_note_is_rejected() {
        let mut config = ComposerConfig::default();
        config.note_lengths[1].duration = 0.0;
        let progression = Progression::from_chords(vec![MajorI, MajorV]);
        let mut rng = MuseRng::new(6);
        let err = generate_melody(c_major(), &progression, 1, Mode::Major, &config, &mut rng).unwrap_err();
        assert!(matches!(err, MuseError::InvalidConfig(_)));
    }

    #[test]
    fn distant_pool_falls_back_to_uniform() {
        let mut rng = MuseRng::new(15);
        for _ in 0..100 {
            let p = pick_pitch(&[10, 90], Some(50), 36.0, &mut rng).unwrap();
            assert!(p == 10 || p == 90);
        }
    }

    #[test]
    fn near_pitches_dominate() {
        let mut rng = MuseRng::new(16);
        for _ in 0..200 {
            // 62 is within range of 60; 70 (distance 10) gets weight 0.
            let p = pick_pitch(&[62, 70], Some(60), 36.0, &mut rng).unwrap();
            assert_eq!(p, 62);
        }
    }

    #[test]
    fn note_length_never_overruns_progression() {
        let config = ComposerConfig::default();
        let mut rng = MuseRng::new(17);
        for _ in 0..200 {
            let d = pick_note_length(3.75, 4.0, &config, &mut rng).unwrap();
            assert!(d <= 0.25, "{d} overruns");
        }
    }
}
