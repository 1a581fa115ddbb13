// Drum-line generation: snare, bass drum, and closed hi-hat.
//
// Snare and bass are built from a one-bar template of 8 slot velocities
// (0 = silent) and then tiled across the section:
// - Snare: each slot independently rolls for a ghost note at a random soft
//   velocity; the backbeat slots are then forced to the backbeat velocity.
// - Bass: each slot rolls for a ghost hit at a random velocity, but never
//   inside the exclusion window around the snare's beats.
// The ghost roll is "draw an integer in [0, n], hit on n", with n set by
// `ghost_note_penalty`, so a higher penalty means sparser ghosts.
//
// The hi-hat either plays a steady accent/off-beat closed pattern for the
// whole section or stays silent, decided once per section.
//
// All numbers come from `ComposerConfig`; see config.rs. `generate_drums`
// validates it first, so the per-bar helpers can index and draw freely.

use crate::config::{ComposerConfig, VelocityRange};
use crate::error::MuseError;
use crate::track::{DrumVoice, NoteEvent, SLOTS_PER_BAR, Track, rests};
use muse_prng::MuseRng;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Velocities for one bar of a drum line; 0 means no hit.
pub type DrumBar = [u8; SLOTS_PER_BAR];

/// The three drum tracks of a section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrumTracks {
    pub bass: Track<DrumVoice>,
    pub snare: Track<DrumVoice>,
    pub hihat: Track<DrumVoice>,
}

/// True with probability `1 / (odds_against + 1)`.
fn ghost_roll(odds_against: u32, rng: &mut MuseRng) -> bool {
    rng.range_u32_inclusive(0, odds_against) == odds_against
}

fn velocity_in(range: VelocityRange, rng: &mut MuseRng) -> u8 {
    rng.range_u8_inclusive(range.low, range.high)
}

/// One bar of snare: random ghost notes plus a fixed backbeat.
pub(crate) fn snare_bar(config: &ComposerConfig, rng: &mut MuseRng) -> DrumBar {
    let mut bar = [0u8; SLOTS_PER_BAR];
    for slot in bar.iter_mut() {
        if ghost_roll(config.ghost_note_penalty, rng) {
            *slot = velocity_in(config.snare_ghost_velocity, rng);
        }
    }
    for &slot in &config.backbeat_slots {
        bar[slot] = config.backbeat_velocity;
    }
    bar
}

/// One bar of bass drum: random hits outside the exclusion window.
pub(crate) fn bass_bar(config: &ComposerConfig, rng: &mut MuseRng) -> DrumBar {
    let (start, end) = config.bass_exclusion;
    let odds_against = config.ghost_note_penalty.saturating_mul(2);
    let mut bar = [0u8; SLOTS_PER_BAR];
    for (i, slot) in bar.iter_mut().enumerate() {
        let hit = ghost_roll(odds_against, rng);
        if hit && !(start..end).contains(&i) {
            *slot = velocity_in(config.bass_ghost_velocity, rng);
        }
    }
    bar
}

/// Repeat a one-bar template `bars` times as a track of short hits.
pub(crate) fn tile_bar(bar: &DrumBar, voice: DrumVoice, bars: usize, config: &ComposerConfig) -> Track<DrumVoice> {
    let mut events = Vec::with_capacity(bars * SLOTS_PER_BAR);
    for _ in 0..bars {
        events.extend(bar.iter().map(|&velocity| {
            if velocity > 0 {
                NoteEvent::note(voice, velocity, config.drum_hit_duration)
            } else {
                NoteEvent::Rest
            }
        }));
    }
    events.into()
}

/// A steady closed hi-hat for `bars` bars, or silence of the same length.
pub(crate) fn hihat_track(bars: usize, config: &ComposerConfig, rng: &mut MuseRng) -> Track<DrumVoice> {
    let slots = bars * SLOTS_PER_BAR;
    if !rng.random_bool(config.hihat_probability) {
        return Track::from_events(rests(slots).collect());
    }
    let (accent, off) = config.hihat_velocities;
    let events = (0..slots)
        .map(|slot| {
            let velocity = if slot % 2 == 0 { accent } else { off };
            NoteEvent::note(DrumVoice::HiHatClosed, velocity, config.hihat_duration)
        })
        .collect();
    Track::from_events(events)
}

/// Generate the snare, bass, and hi-hat tracks for a `bars`-bar section.
pub fn generate_drums(
    bars: usize,
    config: &ComposerConfig,
    rng: &mut MuseRng,
) -> Result<DrumTracks, MuseError> {
    config.validate()?;
    let snare = snare_bar(config, rng);
    let bass = bass_bar(config, rng);
    debug!(?snare, ?bass, "drum templates");
    Ok(DrumTracks {
        bass: tile_bar(&bass, DrumVoice::Bass, bars, config),
        snare: tile_bar(&snare, DrumVoice::Snare, bars, config),
        hihat: hihat_track(bars, config, rng),
    })
}
