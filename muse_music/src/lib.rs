// Muse procedural song generator.
//
// Given a mode (major or minor) and a random source, composes a short song:
// a verse and a chorus, each with a chord progression, block chords, an
// arpeggio, a melody that follows the chords, and a drum kit (bass, snare,
// closed hi-hat). The output is plain data: tracks of note/rest events on an
// eighth-note grid, serializable as nested JSON arrays, ready to be handed to
// a playback collaborator.
//
// Architecture (leaf first):
// - theory.rs: Static tables: chromatic names, scales, triads, transition graphs
// - pitch.rs: Note-name parsing, keys, scale and chord pitches, frequencies
// - sampler.rs: Draw from a discrete distribution (with contract checks)
// - track.rs: NoteEvent / Track / DrumVoice and their wire shape
// - config.rs: All tunable numbers, JSON-loadable
// - progression.rs: Random walk over a chord-transition graph
// - melody.rs: Chord-constrained, proximity-weighted melody
// - rhythm.rs: Ghost-note snare and bass, backbeat, hi-hat
// - compose.rs: Sections and songs
// - playback.rs: Drive a `Playback` collaborator from a song
// - error.rs: `MuseError`
//
// Generation is deterministic given a `MuseRng` seed. Nothing is global; run
// concurrent generations on independent streams (`MuseRng::fork`).

pub mod compose;
pub mod config;
pub mod error;
pub mod melody;
pub mod pitch;
pub mod playback;
pub mod progression;
pub mod rhythm;
pub mod sampler;
pub mod theory;
pub mod track;

pub use compose::{Section, SectionKind, Song, generate_section, generate_song, generate_song_from_seed};
pub use config::ComposerConfig;
pub use error::MuseError;
pub use pitch::{Key, Pitch, resolve};
pub use playback::{Playback, perform_song};
pub use theory::{ChordSymbol, Mode};
pub use track::{DrumVoice, Note, NoteEvent, Track, Voicing};
