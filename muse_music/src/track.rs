// Timed note events and the tracks built from them.
//
// Every track is a flat list of eighth-note slots (8 per bar, 0.125 bars
// each). A slot holds either a `Note` or a `Rest`. A note longer than one
// slot is followed by rest placeholders covering the rest of its duration, so
// slot index always equals time position and a track of N bars has exactly
// 8 * N slots.
//
// Tracks are generic over what sounds: `Voicing` (a pitch or a chord) for
// melodic tracks, `DrumVoice` for percussion. The wire form is plain arrays:
// a rest is `[]` and a note is `[sound, velocity, duration]`, where `sound`
// is a number, an array of numbers, or a drum-voice number. That keeps the
// output consumable by a playback layer without depending on this crate.
//
// A `Track` is immutable once built; generators assemble a `Vec` and hand it
// over whole.

use crate::error::MuseError;
use crate::pitch::Pitch;
use serde::de::{self, SeqAccess, Visitor};
use serde::ser::SerializeSeq;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::marker::PhantomData;

/// Grid slots per bar.
pub const SLOTS_PER_BAR: usize = 8;

/// Length of one grid slot, in bars.
pub const SLOT_DURATION: f64 = 0.125;

/// What a melodic note plays: one pitch, or several at once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Voicing {
    Single(Pitch),
    Chord(Vec<Pitch>),
}

impl Voicing {
    pub fn pitches(&self) -> &[Pitch] {
        match self {
            Voicing::Single(p) => std::slice::from_ref(p),
            Voicing::Chord(ps) => ps,
        }
    }
}

impl fmt::Display for Voicing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Voicing::Single(p) => write!(f, "{p}"),
            Voicing::Chord(ps) => {
                let joined: Vec<String> = ps.iter().map(|p| p.to_string()).collect();
                write!(f, "{}", joined.join("+"))
            }
        }
    }
}

/// The five drum sounds a playback layer must provide, with stable numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum DrumVoice {
    Bass = 0,
    HiHatClosed = 1,
    HiHatOpen = 2,
    Snare = 3,
    Ride = 4,
}

impl DrumVoice {
    pub const ALL: [DrumVoice; 5] = [
        DrumVoice::Bass,
        DrumVoice::HiHatClosed,
        DrumVoice::HiHatOpen,
        DrumVoice::Snare,
        DrumVoice::Ride,
    ];

    pub fn number(self) -> u8 {
        self as u8
    }
}

impl From<DrumVoice> for u8 {
    fn from(voice: DrumVoice) -> Self {
        voice.number()
    }
}

impl TryFrom<u8> for DrumVoice {
    type Error = MuseError;

    fn try_from(number: u8) -> Result<Self, Self::Error> {
        DrumVoice::ALL
            .into_iter()
            .find(|v| v.number() == number)
            .ok_or(MuseError::UnknownDrumVoice(number))
    }
}

impl fmt::Display for DrumVoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let short = match self {
            DrumVoice::Bass => "K",
            DrumVoice::HiHatClosed => "h",
            DrumVoice::HiHatOpen => "o",
            DrumVoice::Snare => "S",
            DrumVoice::Ride => "R",
        };
        f.write_str(short)
    }
}

/// A sounding event: what plays, how loud, and for how many bars.
#[derive(Debug, Clone, PartialEq)]
pub struct Note<S> {
    pub sound: S,
    pub velocity: u8,
    pub duration: f64,
}

impl<S> Note<S> {
    pub fn new(sound: S, velocity: u8, duration: f64) -> Self {
        Note {
            sound,
            velocity,
            duration,
        }
    }

    /// Grid slots this note spans, at least one.
    pub fn slots(&self) -> usize {
        ((self.duration / SLOT_DURATION).floor() as usize).max(1)
    }
}

/// One grid slot.
#[derive(Debug, Clone, PartialEq)]
pub enum NoteEvent<S> {
    Rest,
    Note(Note<S>),
}

impl<S> NoteEvent<S> {
    pub fn note(sound: S, velocity: u8, duration: f64) -> Self {
        NoteEvent::Note(Note::new(sound, velocity, duration))
    }

    pub fn as_note(&self) -> Option<&Note<S>> {
        match self {
            NoteEvent::Note(note) => Some(note),
            NoteEvent::Rest => None,
        }
    }

    pub fn is_rest(&self) -> bool {
        matches!(self, NoteEvent::Rest)
    }
}

impl<S: Serialize> Serialize for NoteEvent<S> {
    fn serialize<Se: Serializer>(&self, serializer: Se) -> Result<Se::Ok, Se::Error> {
        match self {
            NoteEvent::Rest => serializer.serialize_seq(Some(0))?.end(),
            NoteEvent::Note(note) => {
                let mut seq = serializer.serialize_seq(Some(3))?;
                seq.serialize_element(&note.sound)?;
                seq.serialize_element(&note.velocity)?;
                seq.serialize_element(&note.duration)?;
                seq.end()
            }
        }
    }
}

impl<'de, S: Deserialize<'de>> Deserialize<'de> for NoteEvent<S> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_seq(EventVisitor(PhantomData))
    }
}

struct EventVisitor<S>(PhantomData<S>);

impl<'de, S: Deserialize<'de>> Visitor<'de> for EventVisitor<S> {
    type Value = NoteEvent<S>;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("an empty array or [sound, velocity, duration]")
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
        let Some(sound) = seq.next_element::<S>()? else {
            return Ok(NoteEvent::Rest);
        };
        let velocity = seq
            .next_element()?
            .ok_or_else(|| de::Error::invalid_length(1, &self))?;
        let duration = seq
            .next_element()?
            .ok_or_else(|| de::Error::invalid_length(2, &self))?;
        if seq.next_element::<de::IgnoredAny>()?.is_some() {
            return Err(de::Error::invalid_length(4, &self));
        }
        Ok(NoteEvent::note(sound, velocity, duration))
    }
}

/// A flat, slot-aligned sequence of events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Track<S> {
    events: Vec<NoteEvent<S>>,
}

impl<S> Track<S> {
    pub fn from_events(events: Vec<NoteEvent<S>>) -> Self {
        Track { events }
    }

    pub fn events(&self) -> &[NoteEvent<S>] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Length in bars, counting slots.
    pub fn bars(&self) -> f64 {
        self.events.len() as f64 * SLOT_DURATION
    }

    /// True if the track ends exactly on a bar line.
    pub fn is_whole_bars(&self) -> bool {
        self.events.len() % SLOTS_PER_BAR == 0
    }

    /// The track cut into bars of `SLOTS_PER_BAR` slots. A trailing partial
    /// bar is yielded short.
    pub fn measures(&self) -> impl Iterator<Item = &[NoteEvent<S>]> {
        self.events.chunks(SLOTS_PER_BAR)
    }

    pub fn notes(&self) -> impl Iterator<Item = &Note<S>> {
        self.events.iter().filter_map(NoteEvent::as_note)
    }

    /// Sum of note durations, ignoring rests.
    pub fn note_duration_total(&self) -> f64 {
        self.notes().map(|n| n.duration).sum()
    }
}

impl<S: Clone> Track<S> {
    /// A new track playing this one `times` times back to back.
    pub fn repeated(&self, times: usize) -> Self {
        let mut events = Vec::with_capacity(self.events.len() * times);
        for _ in 0..times {
            events.extend_from_slice(&self.events);
        }
        Track { events }
    }
}

impl<S: fmt::Display> Track<S> {
    /// Compact text rendering for debugging: bars split by `|`, note sounds
    /// followed by `-` for each held slot, `.` for silent slots.
    pub fn summary(&self) -> String {
        let mut out = String::new();
        let mut held = 0usize;
        for (slot, event) in self.events.iter().enumerate() {
            if slot > 0 && slot % SLOTS_PER_BAR == 0 {
                out.push('|');
            }
            match event {
                NoteEvent::Note(note) => {
                    out.push_str(&note.sound.to_string());
                    held = note.slots() - 1;
                }
                NoteEvent::Rest if held > 0 => {
                    out.push('-');
                    held -= 1;
                }
                NoteEvent::Rest => out.push('.'),
            }
        }
        out
    }
}

impl<S> From<Vec<NoteEvent<S>>> for Track<S> {
    fn from(events: Vec<NoteEvent<S>>) -> Self {
        Track::from_events(events)
    }
}

/// `count` rest placeholders.
pub fn rests<S>(count: usize) -> impl Iterator<Item = NoteEvent<S>> {
    std::iter::repeat_with(|| NoteEvent::Rest).take(count)
}
