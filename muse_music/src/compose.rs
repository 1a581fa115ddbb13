// Section and song assembly.
//
// A section is one progression in one key, played `section_passes` times by
// every track:
// - chords: the chord sounded once per bar, held for the whole bar;
// - rhythm chords (verse only): the chord restruck on every eighth;
// - arpeggio: chord tones as quarter-note-long hits on alternate eighths,
//   with the middle tone doubled when the chord is a plain triad so every bar
//   gets four tones;
// - melody: see melody.rs. It is generated for either half or all of the
//   passes; a half-length melody is played twice;
// - bass, snare, hi-hat: see rhythm.rs.
//
// A song is a verse followed by a chorus in one random key. The chorus's
// progression is seeded with the verse's last chord so the join is a legal
// transition.
//
// Random draws happen in a fixed order (progression, drums, melody length,
// melody) so a seed always reproduces the same song.
//
// See also: playback.rs for turning a `Song` into timed sound events.

use crate::config::ComposerConfig;
use crate::error::MuseError;
use crate::melody::generate_melody;
use crate::pitch::{Key, Pitch, chord_pitches};
use crate::progression::{Progression, generate_progression};
use crate::rhythm::{DrumTracks, generate_drums};
use crate::theory::{CHROMATIC, ChordSymbol, Mode};
use crate::track::{DrumVoice, NoteEvent, SLOT_DURATION, SLOTS_PER_BAR, Track, Voicing, rests};
use muse_prng::MuseRng;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info};

/// Which part of the song a section is. Only verses get rhythm chords.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SectionKind {
    Verse,
    Chorus,
}

impl fmt::Display for SectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SectionKind::Verse => f.write_str("verse"),
            SectionKind::Chorus => f.write_str("chorus"),
        }
    }
}

/// Every track of one section, sharing a key and progression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    pub kind: SectionKind,
    pub key: Key,
    pub mode: Mode,
    pub progression: Progression,
    pub chords: Track<Voicing>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rhythm_chords: Option<Track<Voicing>>,
    pub arpeggio: Track<Voicing>,
    pub melody: Track<Voicing>,
    pub bass: Track<DrumVoice>,
    pub snare: Track<DrumVoice>,
    pub hihat: Track<DrumVoice>,
}

impl Section {
    /// Pitched tracks with their names, in a fixed order.
    pub fn melodic_tracks(&self) -> Vec<(&'static str, &Track<Voicing>)> {
        let mut tracks = vec![("chords", &self.chords)];
        if let Some(rhythm_chords) = &self.rhythm_chords {
            tracks.push(("rhythm_chords", rhythm_chords));
        }
        tracks.push(("arpeggio", &self.arpeggio));
        tracks.push(("melody", &self.melody));
        tracks
    }

    /// Drum tracks with their names, in a fixed order.
    pub fn drum_tracks(&self) -> [(&'static str, &Track<DrumVoice>); 3] {
        [
            ("bass", &self.bass),
            ("snare", &self.snare),
            ("hihat", &self.hihat),
        ]
    }

    /// Length of the longest track, in slots.
    pub fn slot_count(&self) -> usize {
        let melodic = self.melodic_tracks().into_iter().map(|(_, t)| t.len());
        let drums = self.drum_tracks().into_iter().map(|(_, t)| t.len());
        melodic.chain(drums).max().unwrap_or(0)
    }

    /// One line per track, for debugging.
    pub fn summary(&self) -> String {
        let mut out = format!("{} in {} {}: {}\n", self.kind, self.key, self.mode, self.progression);
        for (name, track) in self.melodic_tracks() {
            out.push_str(&format!("{name:>13}: {}\n", track.summary()));
        }
        for (name, track) in self.drum_tracks() {
            out.push_str(&format!("{name:>13}: {}\n", track.summary()));
        }
        out
    }
}

/// A verse and a chorus in one key and mode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Song {
    pub key: Key,
    pub mode: Mode,
    /// Beats per minute; one beat is one eighth-note slot.
    pub tempo: u16,
    pub verse: Section,
    pub chorus: Section,
}

impl Song {
    pub fn from_json(json: &str) -> Result<Self, MuseError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String, MuseError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn sections(&self) -> [&Section; 2] {
        [&self.verse, &self.chorus]
    }
}

// ---------------------------------------------------------------------------
// Accompaniment tracks
// ---------------------------------------------------------------------------

fn chord_voicing(chord: ChordSymbol, key: Key, octave: u8) -> Vec<Pitch> {
    chord_pitches(chord, key.root(octave))
}

/// One held chord per bar.
pub fn chord_track(
    progression: &Progression,
    key: Key,
    passes: usize,
    config: &ComposerConfig,
) -> Track<Voicing> {
    let mut events = Vec::with_capacity(passes * progression.len() * SLOTS_PER_BAR);
    for _ in 0..passes {
        for &chord in progression.chords() {
            let voicing = Voicing::Chord(chord_voicing(chord, key, config.chord_octave));
            events.push(NoteEvent::note(voicing, config.chord_velocity, 1.0));
            events.extend(rests(SLOTS_PER_BAR - 1));
        }
    }
    Track::from_events(events)
}

/// The chord restruck on every slot of every bar.
pub fn rhythm_chord_track(
    progression: &Progression,
    key: Key,
    passes: usize,
    config: &ComposerConfig,
) -> Track<Voicing> {
    let mut events = Vec::with_capacity(passes * progression.len() * SLOTS_PER_BAR);
    for _ in 0..passes {
        for &chord in progression.chords() {
            let voicing = Voicing::Chord(chord_voicing(chord, key, config.chord_octave));
            for _ in 0..SLOTS_PER_BAR {
                events.push(NoteEvent::note(voicing.clone(), config.chord_velocity, SLOT_DURATION));
            }
        }
    }
    Track::from_events(events)
}

/// Chord tones one at a time, a rest between each.
pub fn arpeggio_track(
    progression: &Progression,
    key: Key,
    passes: usize,
    config: &ComposerConfig,
) -> Track<Voicing> {
    let mut events = Vec::with_capacity(passes * progression.len() * SLOTS_PER_BAR);
    for _ in 0..passes {
        for &chord in progression.chords() {
            let mut tones = chord_voicing(chord, key, config.chord_octave);
            if tones.len() == 3 {
                tones.push(tones[1]);
            }
            for tone in tones {
                events.push(NoteEvent::note(
                    Voicing::Single(tone),
                    config.chord_velocity,
                    2.0 * SLOT_DURATION,
                ));
                events.push(NoteEvent::Rest);
            }
        }
    }
    Track::from_events(events)
}

// ---------------------------------------------------------------------------
// Sections and songs
// ---------------------------------------------------------------------------

/// Compose one section. `seed` is the chord the previous section ended on.
pub fn generate_section(
    kind: SectionKind,
    key: Key,
    mode: Mode,
    seed: Option<ChordSymbol>,
    config: &ComposerConfig,
    rng: &mut MuseRng,
) -> Result<Section, MuseError> {
    config.validate()?;
    let passes = config.section_passes;

    let progression = generate_progression(config.progression_bars, mode, seed, rng)?;
    let DrumTracks { bass, snare, hihat } = generate_drums(config.section_bars(), config, rng)?;

    let half = passes / 2;
    let melody_passes = *rng.choose(&[half, passes]).ok_or(MuseError::EmptyOptions)?;
    let mut melody = generate_melody(key, &progression, melody_passes, mode, config, rng)?;
    if melody_passes == half {
        melody = melody.repeated(2);
    }

    let rhythm_chords = match kind {
        SectionKind::Verse => Some(rhythm_chord_track(&progression, key, passes, config)),
        SectionKind::Chorus => None,
    };

    let section = Section {
        kind,
        key,
        mode,
        chords: chord_track(&progression, key, passes, config),
        rhythm_chords,
        arpeggio: arpeggio_track(&progression, key, passes, config),
        melody,
        bass,
        snare,
        hihat,
        progression,
    };
    debug!(%kind, %key, %mode, melody_passes, "composed section\n{}", section.summary());
    Ok(section)
}

/// Compose a verse and chorus in a random key.
pub fn generate_song(
    tempo: u16,
    mode: Mode,
    config: &ComposerConfig,
    rng: &mut MuseRng,
) -> Result<Song, MuseError> {
    let key = Key::from_index(rng.range_usize(0, CHROMATIC.len()));
    let verse = generate_section(SectionKind::Verse, key, mode, None, config, rng)?;
    let chorus = generate_section(
        SectionKind::Chorus,
        key,
        mode,
        verse.progression.last(),
        config,
        rng,
    )?;
    info!(
        %key,
        %mode,
        tempo,
        verse = %verse.progression,
        chorus = %chorus.progression,
        "composed song"
    );
    Ok(Song {
        key,
        mode,
        tempo,
        verse,
        chorus,
    })
}

/// Compose a song from a seed with the default config.
pub fn generate_song_from_seed(seed: u64, tempo: u16, mode: Mode) -> Result<Song, MuseError> {
    let mut rng = MuseRng::new(seed);
    generate_song(tempo, mode, &ComposerConfig::default(), &mut rng)
}
