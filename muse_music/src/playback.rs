// Turning a composed song into timed sound events.
//
// The engine does not make sound. A playback collaborator implements
// `Playback` and is handed to `perform_song`, which walks every track slot by
// slot and calls the collaborator once per note (rests are skipped). All
// tracks of a section start together; the chorus starts when the verse's
// longest track ends.
//
// Timing: one grid slot lasts `60 / tempo` seconds, so a duration of `d`
// bars lasts `d * 8 * 60 / tempo` seconds.
//
// `Schedule` is a ready-made collaborator that just records the calls, for
// tests and for hosts that want a flat event list to schedule themselves.

use crate::compose::{Section, Song};
use crate::error::MuseError;
use crate::track::{DrumVoice, NoteEvent, SLOTS_PER_BAR, Track, Voicing};
use tracing::debug;

/// A sound generator the engine can drive.
pub trait Playback {
    /// Sound every pitch of `voicing` at once.
    fn play_tone(&mut self, at_seconds: f64, voicing: &Voicing, velocity: u8, duration_seconds: f64);

    /// Trigger a drum sample.
    fn play_drum(&mut self, at_seconds: f64, voice: DrumVoice, velocity: u8, duration_seconds: f64);
}

/// Seconds per grid slot at `tempo` beats per minute.
pub fn slot_seconds(tempo: u16) -> Result<f64, MuseError> {
    if tempo == 0 {
        return Err(MuseError::InvalidConfig("tempo must be positive".to_string()));
    }
    Ok(60.0 / f64::from(tempo))
}

fn bars_to_seconds(bars: f64, slot: f64) -> f64 {
    bars * SLOTS_PER_BAR as f64 * slot
}

fn perform_track<S>(
    track: &Track<S>,
    start: f64,
    slot: f64,
    mut emit: impl FnMut(f64, &S, u8, f64),
) -> usize {
    let mut count = 0;
    for (i, event) in track.events().iter().enumerate() {
        if let NoteEvent::Note(note) = event {
            let at = start + i as f64 * slot;
            emit(at, &note.sound, note.velocity, bars_to_seconds(note.duration, slot));
            count += 1;
        }
    }
    count
}

/// Play every track of `section` starting at `start_seconds`. Returns the
/// time the section's longest track ends.
pub fn perform_section(
    section: &Section,
    tempo: u16,
    start_seconds: f64,
    player: &mut impl Playback,
) -> Result<f64, MuseError> {
    let slot = slot_seconds(tempo)?;
    let mut notes = 0;
    for (_, track) in section.melodic_tracks() {
        notes += perform_track(track, start_seconds, slot, |at, voicing, velocity, duration| {
            player.play_tone(at, voicing, velocity, duration)
        });
    }
    for (_, track) in section.drum_tracks() {
        notes += perform_track(track, start_seconds, slot, |at, &voice, velocity, duration| {
            player.play_drum(at, voice, velocity, duration)
        });
    }
    let end = start_seconds + section.slot_count() as f64 * slot;
    debug!(kind = %section.kind, notes, start_seconds, end, "performed section");
    Ok(end)
}

/// Play the verse, then the chorus. Returns the song's total length in
/// seconds.
pub fn perform_song(song: &Song, player: &mut impl Playback) -> Result<f64, MuseError> {
    let chorus_start = perform_section(&song.verse, song.tempo, 0.0, player)?;
    perform_section(&song.chorus, song.tempo, chorus_start, player)
}

// ---------------------------------------------------------------------------
// Recording collaborator
// ---------------------------------------------------------------------------

/// What a scheduled event plays.
#[derive(Debug, Clone, PartialEq)]
pub enum Sound {
    Tone(Voicing),
    Drum(DrumVoice),
}

/// One call a `Playback` received.
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduledEvent {
    pub at_seconds: f64,
    pub sound: Sound,
    pub velocity: u8,
    pub duration_seconds: f64,
}

/// A `Playback` that records every call in order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Schedule {
    pub events: Vec<ScheduledEvent>,
}

impl Schedule {
    pub fn new() -> Self {
        Self::default()
    }

    /// Events sorted by start time. Ties keep call order.
    pub fn in_time_order(&self) -> Vec<&ScheduledEvent> {
        let mut sorted: Vec<&ScheduledEvent> = self.events.iter().collect();
        sorted.sort_by(|a, b| a.at_seconds.total_cmp(&b.at_seconds));
        sorted
    }

    pub fn drum_hits(&self) -> impl Iterator<Item = &ScheduledEvent> {
        self.events.iter().filter(|e| matches!(e.sound, Sound::Drum(_)))
    }
}

impl Playback for Schedule {
    fn play_tone(&mut self, at_seconds: f64, voicing: &Voicing, velocity: u8, duration_seconds: f64) {
        self.events.push(ScheduledEvent {
            at_seconds,
            sound: Sound::Tone(voicing.clone()),
            velocity,
            duration_seconds,
        });
    }

    fn play_drum(&mut self, at_seconds: f64, voice: DrumVoice, velocity: u8, duration_seconds: f64) {
        self.events.push(ScheduledEvent {
            at_seconds,
            sound: Sound::Drum(voice),
            velocity,
            duration_seconds,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compose::generate_song_from_seed;
    use crate::theory::Mode;

    fn note_count(section: &Section) -> usize {
        let melodic: usize = section.melodic_tracks().iter().map(|(_, t)| t.notes().count()).sum();
        let drums: usize = section.drum_tracks().iter().map(|(_, t)| t.notes().count()).sum();
        melodic + drums
    }

    #[test]
    fn one_call_per_note() {
        let song = generate_song_from_seed(21, 120, Mode::Major).unwrap();
        let mut schedule = Schedule::new();
        perform_song(&song, &mut schedule).unwrap();
        assert_eq!(
            schedule.events.len(),
            note_count(&song.verse) + note_count(&song.chorus)
        );
    }

    #[test]
    fn slots_last_sixty_over_tempo() {
        assert_eq!(slot_seconds(120).unwrap(), 0.5);
        assert!(matches!(slot_seconds(0), Err(MuseError::InvalidConfig(_))));

        let song = generate_song_from_seed(22, 120, Mode::Minor).unwrap();
        let mut schedule = Schedule::new();
        let end = perform_song(&song, &mut schedule).unwrap();
        // Two sections of 128 half-second slots.
        assert_eq!(end, 128.0);

        // Backbeat snare of the first verse bar lands on slots 2 and 6.
        let snare_times: Vec<f64> = schedule
            .drum_hits()
            .filter(|e| e.sound == Sound::Drum(DrumVoice::Snare) && e.velocity == 60)
            .map(|e| e.at_seconds)
            .take(2)
            .collect();
        assert_eq!(snare_times, vec![1.0, 3.0]);
    }

    #[test]
    fn chorus_starts_after_verse() {
        let song = generate_song_from_seed(23, 90, Mode::Major).unwrap();
        let mut schedule = Schedule::new();
        let chorus_start = perform_section(&song.verse, song.tempo, 0.0, &mut schedule).unwrap();
        let verse_calls = schedule.events.len();
        perform_section(&song.chorus, song.tempo, chorus_start, &mut schedule).unwrap();
        assert!(schedule.events[..verse_calls].iter().all(|e| e.at_seconds < chorus_start));
        assert!(schedule.events[verse_calls..].iter().all(|e| e.at_seconds >= chorus_start));
    }

    #[test]
    fn held_chord_duration_scales_with_tempo() {
        let song = generate_song_from_seed(24, 60, Mode::Major).unwrap();
        let mut schedule = Schedule::new();
        perform_section(&song.verse, song.tempo, 0.0, &mut schedule).unwrap();
        // The first call is the verse's opening block chord: one bar of 8 one-second slots.
        let first = &schedule.events[0];
        assert_eq!(first.at_seconds, 0.0);
        assert_eq!(first.duration_seconds, 8.0);
        assert!(matches!(first.sound, Sound::Tone(Voicing::Chord(_))));
        let ordered = schedule.in_time_order();
        assert!(ordered.windows(2).all(|w| w[0].at_seconds <= w[1].at_seconds));
    }
}
